//! Bounded ring buffer of raw PRNG words, oldest-first.

use std::collections::VecDeque;

use crate::error::{DerandomError, Result};

/// Fixed-capacity history of raw generator words. Once full, `put` overwrites
/// the oldest entry rather than growing.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    buf: VecDeque<u64>,
}

impl HistoryBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        HistoryBuffer {
            capacity,
            buf: VecDeque::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn length(&self) -> usize {
        self.buf.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resizes the buffer, dropping the oldest entries first if it must
    /// shrink below the current length.
    pub fn set_capacity(&mut self, capacity: i64) -> Result<()> {
        if capacity < 0 {
            return Err(DerandomError::InvalidArgument(format!(
                "history capacity must be non-negative, got {capacity}"
            )));
        }
        let capacity = capacity as usize;
        while self.buf.len() > capacity {
            self.buf.pop_front();
        }
        self.capacity = capacity;
        Ok(())
    }

    /// Appends `words` in order, evicting the oldest entries as needed to
    /// stay within capacity. A capacity of zero silently discards everything.
    pub fn put(&mut self, words: &[u64]) {
        for &w in words {
            if self.capacity == 0 {
                continue;
            }
            if self.buf.len() >= self.capacity {
                self.buf.pop_front();
            }
            self.buf.push_back(w);
        }
    }

    /// The most recently inserted word.
    pub fn last(&self) -> Result<u64> {
        self.buf
            .back()
            .copied()
            .ok_or_else(|| DerandomError::Underflow("history buffer is empty".to_string()))
    }

    /// Contents oldest-to-newest.
    pub fn to_array(&self) -> Vec<u64> {
        self.buf.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_overwrites_oldest_once_full() {
        let mut h = HistoryBuffer::with_capacity(3);
        h.put(&[1, 2, 3, 4]);
        assert_eq!(h.to_array(), vec![2, 3, 4]);
        assert_eq!(h.length(), 3);
    }

    #[test]
    fn last_on_empty_underflows() {
        let h = HistoryBuffer::with_capacity(4);
        assert!(h.last().is_err());
    }

    #[test]
    fn set_capacity_rejects_negative() {
        let mut h = HistoryBuffer::with_capacity(4);
        assert!(h.set_capacity(-1).is_err());
    }

    #[test]
    fn shrinking_capacity_drops_oldest() {
        let mut h = HistoryBuffer::with_capacity(4);
        h.put(&[1, 2, 3, 4]);
        h.set_capacity(2).unwrap();
        assert_eq!(h.to_array(), vec![3, 4]);
    }
}
