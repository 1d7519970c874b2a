//! Undo/redo over whole-mask snapshots.
//!
//! Every mask-changing edit appends a snapshot of the label and user buffers.
//! The history is linear: a new edit after an undo drops the redo branch.

use std::collections::VecDeque;

use crate::constants::DEFAULT_MAX_EPOCHS;
use crate::mask::MaskModel;

/// Immutable copy of the label and user buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mask: Vec<u8>,
    pub user_mask: Vec<u8>,
}

impl HistoryEntry {
    pub fn capture(model: &MaskModel) -> Self {
        Self {
            mask: model.mask.clone(),
            user_mask: model.user_mask.clone(),
        }
    }

    /// Copy the snapshot back into `model`.
    pub fn restore_into(&self, model: &mut MaskModel) {
        model.mask.clone_from(&self.mask);
        model.user_mask.clone_from(&self.user_mask);
    }
}

/// Bounded snapshot list with a cursor on the shown entry.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    current_epoch: usize,
    max_epochs: usize,
}

impl History {
    pub fn new(max_epochs: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            current_epoch: 0,
            max_epochs: max_epochs.max(1),
        }
    }

    /// Drop every entry after the cursor.
    pub fn discard_future(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let keep = self.current_epoch + 1;
        if keep < self.entries.len() {
            log::debug!("🗑️ History: dropped {} redo entries", self.entries.len() - keep);
            self.entries.truncate(keep);
        }
    }

    /// Append a snapshot and move the cursor onto it, evicting the oldest
    /// entry when full.
    pub fn update_history(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.max_epochs {
            self.entries.pop_front();
        }
        self.current_epoch = self.entries.len() - 1;
        log::debug!(
            "📝 History: epoch {} of {}",
            self.current_epoch + 1,
            self.entries.len()
        );
    }

    /// Step back. Returns the entry to restore, or `None` at the oldest one.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.current_epoch == 0 {
            return None;
        }
        self.current_epoch -= 1;
        log::debug!("⏪ Undo: epoch {}", self.current_epoch + 1);
        self.entries.get(self.current_epoch)
    }

    /// Step forward. Returns the entry to restore, or `None` at the newest one.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if self.current_epoch + 1 >= self.entries.len() {
            return None;
        }
        self.current_epoch += 1;
        log::debug!("⏩ Redo: epoch {}", self.current_epoch + 1);
        self.entries.get(self.current_epoch)
    }

    /// Forget everything and start over from `baseline`.
    pub fn reseed(&mut self, baseline: HistoryEntry) {
        self.entries.clear();
        self.entries.push_back(baseline);
        self.current_epoch = 0;
        log::debug!("🗑️ History reseeded");
    }

    pub fn can_undo(&self) -> bool {
        self.current_epoch > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_epoch + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_epoch(&self) -> usize {
        self.current_epoch
    }

    pub fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.current_epoch)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EPOCHS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(value: u8) -> HistoryEntry {
        HistoryEntry {
            mask: vec![value; 4],
            user_mask: vec![1; 4],
        }
    }

    fn edit(history: &mut History, value: u8) {
        history.discard_future();
        history.update_history(entry(value));
    }

    #[test]
    fn test_empty_history_is_noop() {
        let mut history = History::new(3);
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        history.discard_future();
        assert!(history.is_empty());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_redo() {
        let mut history = History::new(5);
        history.reseed(entry(0));
        edit(&mut history, 1);
        edit(&mut history, 2);

        assert_eq!(history.undo(), Some(&entry(1)));
        assert_eq!(history.undo(), Some(&entry(0)));
        assert!(history.undo().is_none());
        assert_eq!(history.current_epoch(), 0);

        assert_eq!(history.redo(), Some(&entry(1)));
        assert_eq!(history.redo(), Some(&entry(2)));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_edit_after_undo_discards_redo() {
        let mut history = History::new(5);
        history.reseed(entry(0));
        edit(&mut history, 1);
        edit(&mut history, 2);
        history.undo();
        history.undo();

        edit(&mut history, 9);
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
        assert_eq!(history.current(), Some(&entry(9)));
    }

    #[test]
    fn test_max_epochs() {
        let mut history = History::new(3);
        history.reseed(entry(0));
        for value in 1..=7 {
            edit(&mut history, value);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.current_epoch(), 2);
        assert_eq!(history.current(), Some(&entry(7)));

        history.undo();
        history.undo();
        assert_eq!(history.current(), Some(&entry(5)));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_capture_and_restore() {
        let mut model = MaskModel::empty(crate::mask::MaskShape::new(2, 1));
        model.mask = vec![3, 4];
        model.user_mask = vec![1, 0];
        let snapshot = HistoryEntry::capture(&model);

        model.mask = vec![0, 0];
        model.user_mask = vec![0, 0];
        snapshot.restore_into(&mut model);
        assert_eq!(model.mask, [3, 4]);
        assert_eq!(model.user_mask, [1, 0]);
    }
}
