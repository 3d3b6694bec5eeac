// Linear undo history over committed edits.

use chrono::Utc;
use sitewright_common::types::{HistoryEntry, StyleChange};
use uuid::Uuid;

/// Append-only entry list with a cursor. Entries past the cursor are the
/// redo tail; recording a new edit discards them.
#[derive(Debug, Default)]
pub struct EditHistory {
    entries: Vec<HistoryEntry>,
    /// Number of entries currently applied.
    cursor: usize,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly committed edit, truncating any redo tail.
    pub fn record(
        &mut self,
        selector: String,
        file_path: Option<String>,
        changes: Vec<StyleChange>,
    ) -> &HistoryEntry {
        self.entries.truncate(self.cursor);
        self.entries.push(HistoryEntry {
            id: Uuid::new_v4(),
            selector,
            file_path,
            changes,
            timestamp: Utc::now(),
        });
        self.cursor = self.entries.len();
        &self.entries[self.cursor - 1]
    }

    /// Step the cursor back, returning the entry to replay *inverted*.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].inverse())
    }

    /// Step the cursor forward, returning the entry to replay as-is.
    pub fn redo(&mut self) -> Option<HistoryEntry> {
        let entry = self.entries.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(property: &str, old_value: &str, new_value: &str) -> StyleChange {
        StyleChange {
            property: property.to_string(),
            old_value: old_value.to_string(),
            new_value: new_value.to_string(),
        }
    }

    #[test]
    fn undo_returns_inverse_changes() {
        let mut history = EditHistory::new();
        history.record("sw-el-1".to_string(), None, vec![change("color", "#000", "#fff")]);

        let undone = history.undo().expect("one entry to undo");
        assert_eq!(undone.changes[0].old_value, "#fff");
        assert_eq!(undone.changes[0].new_value, "#000");
        assert!(!history.can_undo());
        assert!(history.can_redo());
    }

    #[test]
    fn redo_returns_original_changes() {
        let mut history = EditHistory::new();
        history.record("sw-el-1".to_string(), None, vec![change("color", "#000", "#fff")]);
        history.undo();

        let redone = history.redo().expect("one entry to redo");
        assert_eq!(redone.changes[0].new_value, "#fff");
        assert!(!history.can_redo());
    }

    #[test]
    fn new_edit_truncates_redo_tail() {
        let mut history = EditHistory::new();
        history.record("sw-el-1".to_string(), None, vec![change("color", "a", "b")]);
        history.record("sw-el-1".to_string(), None, vec![change("color", "b", "c")]);
        history.undo();
        assert!(history.can_redo());

        history.record("sw-el-1".to_string(), None, vec![change("padding", "0", "8px")]);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn undo_redo_round_trip_is_stable() {
        let mut history = EditHistory::new();
        history.record("sw-el-2".to_string(), None, vec![change("fontSize", "14px", "18px")]);

        let undone = history.undo().expect("entry");
        let redone = history.redo().expect("entry");
        assert_eq!(undone.changes[0].inverse(), redone.changes[0]);
        assert_eq!(undone.id, redone.id);
    }
}
