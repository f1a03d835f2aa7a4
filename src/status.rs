//! Bounded log of user-visible status messages.

#[cfg(test)]
#[path = "status_test.rs"]
mod status_test;

use std::collections::VecDeque;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub level: StatusLevel,
    pub message: String,
}

/// Keeps the most recent `capacity` messages, oldest first.
#[derive(Debug, Clone)]
pub struct StatusLog {
    entries: VecDeque<StatusEntry>,
    capacity: usize,
}

impl StatusLog {
    /// A log holding at most `capacity` entries (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(StatusLevel::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(StatusLevel::Warn, message.into());
    }

    fn push(&mut self, level: StatusLevel, message: String) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(StatusEntry { level, message });
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &StatusEntry> {
        self.entries.iter()
    }

    /// The newest entry.
    #[must_use]
    pub fn latest(&self) -> Option<&StatusEntry> {
        self.entries.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
