//! Shared activity counter a scheduler polls to notice port changes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic count of externally observable changes on a port.
///
/// The value itself means nothing; a scheduler compares it with the last
/// value it saw and looks at the port again when it moved.
#[derive(Debug, Default)]
pub struct ActivityCounter {
    count: AtomicU64,
}

impl ActivityCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one change. Writes made before the bump are visible to a
    /// thread that reads the new count through [`get`](Self::get).
    #[inline]
    pub fn bump(&self) {
        self.count.fetch_add(1, Ordering::Release);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Whether the counter moved since `seen` was read.
    pub fn changed_since(&self, seen: u64) -> bool {
        self.get() != seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_bump_and_observe() {
        let counter = ActivityCounter::new();
        let seen = counter.get();
        assert!(!counter.changed_since(seen));
        counter.bump();
        assert!(counter.changed_since(seen));
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_bump_publishes_prior_writes() {
        use std::sync::atomic::AtomicUsize;

        let counter = Arc::new(ActivityCounter::new());
        let payload = Arc::new(AtomicUsize::new(0));

        let writer = {
            let counter = Arc::clone(&counter);
            let payload = Arc::clone(&payload);
            thread::spawn(move || {
                payload.store(42, Ordering::Relaxed);
                counter.bump();
            })
        };

        while !counter.changed_since(0) {
            std::hint::spin_loop();
        }
        assert_eq!(payload.load(Ordering::Relaxed), 42);
        writer.join().unwrap();
    }

    #[test]
    fn test_bumps_from_many_threads() {
        let counter = Arc::new(ActivityCounter::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || (0..1000).for_each(|_| counter.bump()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.get(), 4000);
    }
}
