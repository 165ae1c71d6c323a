//! Growable FIFO used for posted buffers, labels and messages.

use std::collections::VecDeque;

/// An ordered queue that doubles its capacity when full.
///
/// Pushing never fails and never blocks; the cost of growth is amortized
/// over the pushes that filled the previous capacity.
#[derive(Debug, Clone)]
pub struct PostQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> PostQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.capacity *= 2;
            self.items.reserve(self.capacity - self.items.len());
            tracing::trace!("Post queue grown to {}", self.capacity);
        }
        self.items.push_back(item);
    }

    /// Current capacity; only grows.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }

    /// Remove every item in FIFO order, keeping the capacity.
    pub fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }
}

impl<T> Default for PostQueue<T> {
    fn default() -> Self {
        Self::with_capacity(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_doubles_when_full() {
        let mut queue = PostQueue::with_capacity(2);
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.capacity(), 2);
        queue.push(3);
        assert_eq!(queue.capacity(), 4);
        queue.push(4);
        queue.push(5);
        assert_eq!(queue.capacity(), 8);
        assert_eq!(queue.len(), 5);
    }

    #[test]
    fn test_zero_capacity_is_promoted() {
        let mut queue = PostQueue::with_capacity(0);
        assert_eq!(queue.capacity(), 1);
        queue.push("a");
        queue.push("b");
        assert_eq!(queue.capacity(), 2);
    }

    #[test]
    fn test_drain_is_fifo_and_keeps_capacity() {
        let mut queue = PostQueue::with_capacity(1);
        for i in 0..5 {
            queue.push(i);
        }
        assert_eq!(queue.front(), Some(&0));
        assert_eq!(queue.drain(), vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 8);
    }
}
