//! Run history as shown to the user: newest first, searchable.

use shared::protocol::HistoryEntry;

pub const EMPTY_HISTORY: &str = "기록이 없습니다.";

#[derive(Debug, Clone, Default)]
pub struct HistoryView {
    entries: Vec<HistoryEntry>,
}

impl HistoryView {
    /// `entries` arrive in server order; the view shows the latest first.
    pub fn new(mut entries: Vec<HistoryEntry>) -> Self {
        entries.reverse();
        Self { entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive match on id or filename. A blank term keeps everything.
    pub fn search(&self, term: &str) -> Vec<&HistoryEntry> {
        let term = term.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| {
                entry.id.to_lowercase().contains(&term)
                    || entry.filename.to_lowercase().contains(&term)
            })
            .collect()
    }
}
