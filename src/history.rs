use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::llm::BackendMode;

#[derive(Clone, Debug, Serialize)]
pub struct HistoryEntry {
    pub query: String,
    pub mode: String,
    pub timestamp: DateTime<Utc>,
}

/// Bounded, newest-first log of past queries, shared by all sessions.
/// Append and trim happen under one lock so the cap holds under
/// concurrent writers.
pub struct SearchHistory {
    max_entries: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl SearchHistory {
    pub fn new(max_entries: usize) -> Self {
        SearchHistory {
            max_entries,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, query: &str, mode: BackendMode) {
        let entry = HistoryEntry {
            query: query.to_string(),
            mode: mode.as_str().to_string(),
            timestamp: Utc::now(),
        };

        let mut entries = self.entries.lock().unwrap();
        entries.push_front(entry);
        entries.truncate(self.max_entries);
    }

    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.lock().unwrap().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_entry_comes_first() {
        let history = SearchHistory::new(10);
        history.push("first", BackendMode::Groq);
        history.push("second", BackendMode::Local);

        let entries = history.snapshot();
        assert_eq!(entries[0].query, "second");
        assert_eq!(entries[0].mode, "local");
        assert_eq!(entries[1].query, "first");
    }

    #[test]
    fn cap_discards_oldest_entries() {
        let max = 10;
        let history = SearchHistory::new(max);

        for i in 0..max + 5 {
            history.push(&format!("query {}", i), BackendMode::Groq);
        }

        let entries = history.snapshot();
        assert_eq!(entries.len(), max);
        assert_eq!(entries[0].query, "query 14");
        assert_eq!(entries[max - 1].query, "query 5");
    }

    #[test]
    fn clear_empties_the_log() {
        let history = SearchHistory::new(10);
        history.push("q", BackendMode::Groq);
        assert_eq!(history.len(), 1);

        history.clear();
        assert!(history.is_empty());
    }
}
