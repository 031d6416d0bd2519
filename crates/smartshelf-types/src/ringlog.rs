//! Bounded ring buffer for activity logs and transaction history
//!
//! Replaces unbounded grow-forever history lists: capacity is explicit and
//! the oldest entry is evicted when full.

use std::collections::VecDeque;

/// A fixed-capacity, newest-first log
#[derive(Debug, Clone)]
pub struct RingLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> RingLog<T> {
    /// Create a log holding at most `capacity` entries. Capacity must be > 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingLog capacity must be positive");
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push an entry, evicting the oldest when at capacity
    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(entry);
    }

    /// Entries newest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
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

    /// Most recent entry, if any
    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut log = RingLog::new(3);
        for i in 0..5 {
            log.push(i);
        }
        assert_eq!(log.len(), 3);
        let entries: Vec<_> = log.iter().copied().collect();
        assert_eq!(entries, vec![4, 3, 2]);
    }

    #[test]
    fn latest_is_newest() {
        let mut log = RingLog::new(2);
        assert!(log.latest().is_none());
        log.push("a");
        log.push("b");
        assert_eq!(log.latest(), Some(&"b"));
    }
}
