//! Thread-safe looping integer sequence.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::{DataGenError, Result};

/// Integer cursor that cycles through `[start, end)`.
///
/// All callers share a single cursor: concurrent calls to [`CyclicSequence::next`]
/// are serialized at the compare-and-swap, so the values handed out across every
/// thread form exactly the cyclic sequence with nothing skipped or repeated.
#[derive(Debug)]
pub struct CyclicSequence {
    start: i64,
    end: i64,
    last: AtomicI64,
}

impl CyclicSequence {
    /// Creates a sequence over `[start, end)`.
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if end <= start {
            return Err(DataGenError::config(format!(
                "sequence end ({end}) must be greater than start ({start})"
            )));
        }

        Ok(Self {
            start,
            end,
            // Primed so the first call yields `start`; `end - 1` wraps there.
            last: AtomicI64::new(end - 1),
        })
    }

    /// Creates a sequence over `[0, end)`.
    pub fn with_end(end: i64) -> Result<Self> {
        Self::new(0, end)
    }

    /// Returns the next value, wrapping back to `start` after `end - 1`.
    pub fn next(&self) -> i64 {
        let prev = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(self.successor(last))
            })
            .unwrap_or_else(|prev| prev);

        self.successor(prev)
    }

    fn successor(&self, last: i64) -> i64 {
        let next = last + 1;
        if next >= self.end { self.start } else { next }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Number of distinct values in one cycle.
    pub fn cycle_len(&self) -> u64 {
        self.end.abs_diff(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn test_sequential_cycle() {
        let seq = CyclicSequence::new(5, 8).unwrap();
        let values: Vec<i64> = (0..7).map(|_| seq.next()).collect();

        assert_eq!(values, vec![5, 6, 7, 5, 6, 7, 5]);
    }

    #[test]
    fn test_single_value_range() {
        let seq = CyclicSequence::new(3, 4).unwrap();

        assert_eq!(seq.next(), 3);
        assert_eq!(seq.next(), 3);
        assert_eq!(seq.cycle_len(), 1);
    }

    #[test]
    fn test_negative_range() {
        let seq = CyclicSequence::new(-2, 1).unwrap();
        let values: Vec<i64> = (0..4).map(|_| seq.next()).collect();

        assert_eq!(values, vec![-2, -1, 0, -2]);
    }

    #[test]
    fn test_with_end_starts_at_zero() {
        let seq = CyclicSequence::with_end(2).unwrap();

        assert_eq!(seq.start(), 0);
        assert_eq!(seq.end(), 2);
        assert_eq!((seq.next(), seq.next(), seq.next()), (0, 1, 0));
    }

    #[test]
    fn test_invalid_bounds() {
        let err = CyclicSequence::new(10, 10).unwrap_err();
        assert!(err.is_configuration());

        let err = CyclicSequence::new(10, 3).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_concurrent_calls_cover_every_value() {
        const THREADS: usize = 8;
        const CALLS_PER_THREAD: usize = 1_000;
        let seq = Arc::new(CyclicSequence::new(0, 7).unwrap());

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let seq = Arc::clone(&seq);
                std::thread::spawn(move || {
                    (0..CALLS_PER_THREAD).map(|_| seq.next()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                *counts.entry(value).or_default() += 1;
            }
        }

        // 8000 calls over a cycle of 7: every value 1142 times, the first 6 once more.
        let total = THREADS * CALLS_PER_THREAD;
        for value in 0..7 {
            let expected = total / 7 + usize::from((value as usize) < total % 7);
            assert_eq!(counts.get(&value).copied().unwrap_or(0), expected, "value {value}");
        }
        assert_eq!(counts.len(), 7);
    }
}
