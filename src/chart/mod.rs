//! Auto-chart inference over assistant responses
//!
//! Mines free-form response text for label/value rows (markdown tables,
//! "Label: Value" lines, bold bullet points), classifies the result into a
//! chart shape and keeps a bounded store of user-pinnable chart snapshots.

pub mod extract;
pub mod infer;
pub mod numeric;
pub mod snapshot;
pub mod sources;

pub use extract::extract_rows;
pub use infer::{infer_chart, ChartInference};
pub use numeric::parse_numeric_value;
pub use snapshot::{ChartSnapshot, SnapshotStore, MAX_PINNED_CHARTS};
pub use sources::build_source_chart_data;

/// One extracted label/value pair. Pure value type, no identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDatum {
    pub label: String,
    pub value: f64,
}

/// Chart shape chosen by the inference engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
        }
    }

    /// Parse a user-supplied kind name (for the pinned-chart type override)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "bar" => Some(ChartKind::Bar),
            "line" => Some(ChartKind::Line),
            "pie" => Some(ChartKind::Pie),
            _ => None,
        }
    }
}

/// Display unit attached to an inferred chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartUnit {
    #[default]
    None,
    Rupee,
    Percent,
}

impl ChartUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartUnit::None => "",
            ChartUnit::Rupee => "₹",
            ChartUnit::Percent => "%",
        }
    }
}
