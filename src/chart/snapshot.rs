//! Pinned chart snapshots
//!
//! A snapshot is a detached copy of one inferred chart, keyed by its source
//! message id. The store keeps the newest six; pinning a seventh evicts the
//! oldest. Clearing the chat session does not touch pinned snapshots.

use super::infer::ChartInference;
use super::{ChartDatum, ChartKind, ChartUnit};

/// Maximum number of pinned charts retained at once
pub const MAX_PINNED_CHARTS: usize = 6;

/// Longest derived snapshot title, in characters
const MAX_TITLE_CHARS: usize = 48;

/// An immutable pinned chart. Only the kind can change afterwards, and only
/// through an explicit user override.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSnapshot {
    /// Source message id; at most one snapshot exists per message
    pub id: String,
    pub title: String,
    pub data: Vec<ChartDatum>,
    pub kind: ChartKind,
    pub unit: ChartUnit,
}

impl ChartSnapshot {
    /// Build a snapshot from a settled message and its inference result
    pub fn from_message(message_id: &str, content: &str, inference: ChartInference) -> Self {
        Self {
            id: message_id.to_string(),
            title: derive_title(content),
            data: inference.data,
            kind: inference.kind,
            unit: inference.unit,
        }
    }
}

/// Title comes from the first non-empty content line, stripped of markdown
/// furniture and capped at 48 characters.
fn derive_title(content: &str) -> String {
    let line = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");

    let cleaned = line
        .trim_start_matches(['#', '>', '-', '*', '|', ' '])
        .trim_end_matches(['|', ' '])
        .trim_matches('*')
        .trim();

    if cleaned.is_empty() {
        return "Chart".to_string();
    }

    if cleaned.chars().count() <= MAX_TITLE_CHARS {
        cleaned.to_string()
    } else {
        let mut title: String = cleaned.chars().take(MAX_TITLE_CHARS - 1).collect();
        title.push('…');
        title
    }
}

/// Bounded, order-preserving collection of pinned charts (newest first)
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: Vec<ChartSnapshot>,
    active: Option<String>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a snapshot and make it active.
    ///
    /// A no-op returning `false` if a snapshot with the same source message
    /// id already exists: re-inference never refreshes a pin in place.
    pub fn upsert(&mut self, snapshot: ChartSnapshot) -> bool {
        if self.snapshots.iter().any(|s| s.id == snapshot.id) {
            return false;
        }
        self.active = Some(snapshot.id.clone());
        self.snapshots.insert(0, snapshot);
        self.snapshots.truncate(MAX_PINNED_CHARTS);
        true
    }

    /// Unpin a snapshot. If it was active, the newest remaining pin (or
    /// nothing) becomes active.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.snapshots.len();
        self.snapshots.retain(|s| s.id != id);
        let removed = self.snapshots.len() != before;

        if removed && self.active.as_deref() == Some(id) {
            self.active = self.snapshots.first().map(|s| s.id.clone());
        }
        removed
    }

    /// Pinned snapshots, newest first
    pub fn list(&self) -> &[ChartSnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn active(&self) -> Option<&ChartSnapshot> {
        let id = self.active.as_deref()?;
        self.snapshots.iter().find(|s| s.id == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Select a pinned snapshot for display
    pub fn set_active(&mut self, id: &str) -> bool {
        if self.snapshots.iter().any(|s| s.id == id) {
            self.active = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// User-driven chart type override, the one mutation a pin allows
    pub fn set_kind(&mut self, id: &str, kind: ChartKind) -> bool {
        match self.snapshots.iter_mut().find(|s| s.id == id) {
            Some(snapshot) => {
                snapshot.kind = kind;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str) -> ChartSnapshot {
        ChartSnapshot {
            id: id.into(),
            title: format!("chart {id}"),
            data: vec![ChartDatum {
                label: "A".into(),
                value: 1.0,
            }],
            kind: ChartKind::Bar,
            unit: ChartUnit::None,
        }
    }

    #[test]
    fn test_upsert_prepends_and_activates() {
        let mut store = SnapshotStore::new();
        assert!(store.upsert(snapshot("m1")));
        assert!(store.upsert(snapshot("m2")));

        let ids: Vec<&str> = store.list().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m1"]);
        assert_eq!(store.active_id(), Some("m2"));
    }

    #[test]
    fn test_upsert_same_message_is_noop() {
        let mut store = SnapshotStore::new();
        assert!(store.upsert(snapshot("m1")));
        assert!(store.upsert(snapshot("m2")));
        assert!(!store.upsert(snapshot("m1")));

        // order and active pointer untouched by the no-op
        let ids: Vec<&str> = store.list().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m1"]);
        assert_eq!(store.active_id(), Some("m2"));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = SnapshotStore::new();
        for i in 1..=7 {
            store.upsert(snapshot(&format!("m{i}")));
        }

        assert_eq!(store.len(), MAX_PINNED_CHARTS);
        let ids: Vec<&str> = store.list().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["m7", "m6", "m5", "m4", "m3", "m2"]);
    }

    #[test]
    fn test_remove_active_falls_to_front() {
        let mut store = SnapshotStore::new();
        store.upsert(snapshot("m1"));
        store.upsert(snapshot("m2"));
        store.upsert(snapshot("m3"));

        assert!(store.remove("m3"));
        assert_eq!(store.active_id(), Some("m2"));

        assert!(store.remove("m2"));
        assert!(store.remove("m1"));
        assert_eq!(store.active_id(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_inactive_keeps_active() {
        let mut store = SnapshotStore::new();
        store.upsert(snapshot("m1"));
        store.upsert(snapshot("m2"));

        assert!(store.remove("m1"));
        assert_eq!(store.active_id(), Some("m2"));
        assert!(!store.remove("m1"));
    }

    #[test]
    fn test_set_kind_override() {
        let mut store = SnapshotStore::new();
        store.upsert(snapshot("m1"));

        assert!(store.set_kind("m1", ChartKind::Pie));
        assert_eq!(store.list()[0].kind, ChartKind::Pie);
        assert!(!store.set_kind("missing", ChartKind::Line));
    }

    #[test]
    fn test_title_derivation() {
        assert_eq!(derive_title("## Tax breakdown\nTax: 10"), "Tax breakdown");
        assert_eq!(derive_title("\n\n  **Bold lead**  \nrest"), "Bold lead");
        assert_eq!(derive_title(""), "Chart");

        let long = "x".repeat(80);
        let title = derive_title(&long);
        assert_eq!(title.chars().count(), 48);
        assert!(title.ends_with('…'));
    }
}
