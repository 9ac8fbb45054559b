//! Per-logger acknowledgment sequence counters
//!
//! Every acknowledgment carries a rolling 1-byte sequence value keyed by
//! the logger serial number. Zero is reserved and never issued: the
//! counter cycles 1..=255 and wraps back to 1. State lives for the process
//! lifetime only; after a restart every logger resumes from 1, which the
//! protocol tolerates (the counter is advisory).

use dashmap::DashMap;

/// Process-wide map of logger serial to last-issued sequence value
///
/// The entry guard makes the read-increment-store atomic per key, so the
/// tracker stays correct if connection handling ever becomes concurrent.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    counters: DashMap<u32, u8>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next sequence value for `logger_serial`
    pub fn next(&self, logger_serial: u32) -> u8 {
        let mut entry = self.counters.entry(logger_serial).or_insert(0);
        let mut next = (*entry).wrapping_add(1);
        if next == 0 {
            next = 1;
        }
        *entry = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_full_cycle_skips_zero() {
        let tracker = SequenceTracker::new();
        let values: Vec<u8> = (0..256).map(|_| tracker.next(42)).collect();

        assert!(values.iter().all(|&v| v != 0));
        // 1..=255 then wrap back to 1
        let expected: Vec<u8> = (1..=255).chain(std::iter::once(1)).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_independent_per_serial() {
        let tracker = SequenceTracker::new();
        assert_eq!(tracker.next(1), 1);
        assert_eq!(tracker.next(1), 2);
        assert_eq!(tracker.next(2), 1);
        assert_eq!(tracker.next(1), 3);
        assert_eq!(tracker.next(2), 2);
    }

    #[test]
    fn test_concurrent_increments_never_yield_zero() {
        let tracker = Arc::new(SequenceTracker::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let tracker = Arc::clone(&tracker);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    assert_ne!(tracker.next(7), 0);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        // 800 increments from 0: 800 mod 255 full-cycle steps past three wraps
        assert_eq!(tracker.next(7), 36);
    }
}
