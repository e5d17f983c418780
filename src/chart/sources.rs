//! Citation-frequency chart view
//!
//! The sources view is computed from the full message list on demand, never
//! stored: it counts how often each citation label backs an assistant
//! response.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::session::{ChatMessage, Role};

use super::ChartDatum;

/// Cap on the number of source rows shown
pub const MAX_SOURCE_ROWS: usize = 8;

/// Count citation-label frequency across assistant messages that carry at
/// least one source. Descending by count (first appearance breaks ties),
/// capped to the top eight, no unit.
pub fn build_source_chart_data(messages: &[ChatMessage]) -> Vec<ChartDatum> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    let cited = messages
        .iter()
        .filter(|m| m.role == Role::Assistant && !m.sources.is_empty());

    for message in cited {
        for source in &message.sources {
            if !counts.contains_key(source) {
                order.push(source.clone());
            }
            *counts.entry(source.clone()).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<ChartDatum> = order
        .into_iter()
        .map(|label| {
            let value = counts[&label] as f64;
            ChartDatum { label, value }
        })
        .collect();

    rows.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    rows.truncate(MAX_SOURCE_ROWS);
    rows
}
