//! Fixed-capacity FIFO retaining only the most recent entries.
//!
//! Diagnostics only, never message delivery: an enqueue under pressure
//! evicts the oldest entry instead of blocking or failing, so the relay
//! pipeline stays back-pressure free at capture rates (>60 Hz per bone).

use std::collections::VecDeque;

/// Bounded ring log. After N enqueues with N > capacity the log holds
/// exactly the last `capacity` items in arrival order.
#[derive(Debug)]
pub struct RingLog<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingLog<T> {
    /// Create a ring log holding at most `capacity` entries.
    ///
    /// A zero capacity is clamped to 1; a log that can hold nothing cannot
    /// honor the eviction contract.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting from the front when full. Never fails,
    /// never blocks, O(1) amortized.
    pub fn enqueue(&mut self, item: T) {
        while self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest entry, if any.
    pub fn newest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Clone> RingLog<T> {
    /// Copy of the current contents in arrival order, for diagnostics
    /// consumers that must not hold the writer's lock.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_last_capacity_items_in_arrival_order() {
        let mut log = RingLog::with_capacity(4);
        for i in 0..10 {
            log.enqueue(i);
        }

        assert_eq!(log.len(), 4);
        assert_eq!(log.snapshot(), vec![6, 7, 8, 9]);
        assert_eq!(log.newest(), Some(&9));
    }

    #[test]
    fn enqueue_below_capacity_keeps_everything() {
        let mut log = RingLog::with_capacity(8);
        for i in 0..3 {
            log.enqueue(i);
        }
        assert_eq!(log.snapshot(), vec![0, 1, 2]);
    }

    #[test]
    fn clear_empties_the_log() {
        let mut log = RingLog::with_capacity(2);
        log.enqueue("a");
        log.enqueue("b");
        log.clear();

        assert!(log.is_empty());
        assert_eq!(log.capacity(), 2);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut log = RingLog::with_capacity(0);
        log.enqueue(1);
        log.enqueue(2);
        assert_eq!(log.snapshot(), vec![2]);
    }
}
