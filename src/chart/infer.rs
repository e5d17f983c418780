//! Chart shape and unit inference
//!
//! Classifies extracted rows into a chart shape:
//! - labels carrying a date hint keep their order and become a line chart
//!   (chronological assumption)
//! - a small set of rows summing to ~100 reads as a percentage share (pie)
//! - everything else sorts descending by value and becomes a bar chart

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

use super::extract::extract_rows;
use super::{ChartDatum, ChartKind, ChartUnit};

/// Result of one inference pass over a single message.
///
/// Recomputed from the source content, never mutated in place. `data` may be
/// empty; callers must check before creating a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartInference {
    pub data: Vec<ChartDatum>,
    pub kind: ChartKind,
    pub unit: ChartUnit,
}

/// Percent-share heuristic bounds: row count and value-sum window
const PIE_ROWS: std::ops::RangeInclusive<usize> = 2..=6;
const PIE_SUM: std::ops::RangeInclusive<f64> = 95.0..=105.0;

struct InferencePatterns {
    /// 4-digit year or month name/abbreviation in a row label
    date_hint: Regex,
    /// `inr` as a standalone token
    inr: Regex,
    /// Indian currency scale words (lakh, crore, LPA, ...)
    scale_word: Regex,
}

static PATTERNS: Lazy<InferencePatterns> = Lazy::new(|| InferencePatterns {
    date_hint: Regex::new(
        r"(?i)\b(?:(?:19|20)\d{2}|jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b",
    )
    .unwrap(),
    inr: Regex::new(r"(?i)\binr\b").unwrap(),
    scale_word: Regex::new(r"(?i)\b(?:lpa|lakhs?|lac|crore|cr)\b").unwrap(),
});

/// Run extraction and classify the result into a renderable chart.
///
/// Always returns a well-formed result; with no chartable rows the shape
/// defaults to `Bar` with empty data.
pub fn infer_chart(content: &str) -> ChartInference {
    let rows = extract_rows(content);

    let date_hint = rows
        .iter()
        .any(|r| PATTERNS.date_hint.is_match(&r.label));

    let (kind, data) = if rows.is_empty() {
        (ChartKind::Bar, rows)
    } else if date_hint {
        (ChartKind::Line, rows)
    } else {
        let sum: f64 = rows.iter().map(|r| r.value).sum();
        if PIE_ROWS.contains(&rows.len()) && PIE_SUM.contains(&sum) {
            (ChartKind::Pie, rows)
        } else {
            let mut sorted = rows;
            sorted.sort_by(|a, b| {
                b.value
                    .partial_cmp(&a.value)
                    .unwrap_or(Ordering::Equal)
            });
            (ChartKind::Bar, sorted)
        }
    };

    let unit = infer_unit(content, kind);

    ChartInference { data, kind, unit }
}

/// Unit cues come from the original content, not the extracted rows.
/// Percent is checked last and wins over currency when both appear.
fn infer_unit(content: &str, kind: ChartKind) -> ChartUnit {
    let mut unit = ChartUnit::None;

    if content.contains('₹')
        || PATTERNS.inr.is_match(content)
        || PATTERNS.scale_word.is_match(content)
    {
        unit = ChartUnit::Rupee;
    }
    if content.contains('%') {
        unit = ChartUnit::Percent;
    }

    if kind == ChartKind::Pie && unit == ChartUnit::None {
        unit = ChartUnit::Percent;
    }

    unit
}
