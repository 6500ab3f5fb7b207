// Bounded most-recent-first history, owned by whoever holds it (a client
// session in the web server). Pushing past capacity drops the oldest entry.

use std::collections::VecDeque;

use serde::Serialize;

use super::result::DecisionPayload;
use super::severity::{SeverityTier, UiState};

/// How many recent results a session keeps for display.
pub const RECENT_CAPACITY: usize = 5;

/// Fixed-capacity ring buffer, newest first.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// A capacity of zero is bumped to one so the latest entry is always kept.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a new entry, evicting the oldest when full.
    pub fn push(&mut self, entry: T) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Entries from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Default for BoundedHistory<T> {
    fn default() -> Self {
        Self::with_capacity(RECENT_CAPACITY)
    }
}

/// Compact summary of one analysis for the session's recent list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentEntry {
    pub analysis_id: Option<i64>,
    pub toxicity_score: u8,
    pub severity_level: SeverityTier,
    pub ui_state: UiState,
    pub display_labels: Vec<String>,
    pub analyzed_at: String,
}

impl RecentEntry {
    pub fn from_payload(payload: &DecisionPayload, analyzed_at: String) -> Self {
        Self {
            analysis_id: payload.analysis_id,
            toxicity_score: payload.toxicity_score,
            severity_level: payload.severity_level,
            ui_state: payload.ui_state,
            display_labels: payload.display_labels.clone(),
            analyzed_at,
        }
    }
}

pub type RecentResults = BoundedHistory<RecentEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_newest_first() {
        let mut history = BoundedHistory::with_capacity(3);
        for i in 1..=2 {
            history.push(i);
        }
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(history.latest(), Some(&2));
    }

    #[test]
    fn test_evicts_oldest_past_capacity() {
        let mut history: BoundedHistory<u32> = BoundedHistory::default();
        for i in 1..=8 {
            history.push(i);
        }
        assert_eq!(history.len(), RECENT_CAPACITY);
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![8, 7, 6, 5, 4]);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut history = BoundedHistory::with_capacity(0);
        history.push("a");
        history.push("b");
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![&"b"]);
    }
}
