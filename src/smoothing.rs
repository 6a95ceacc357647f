//! Bounded position history used to smooth per-frame pupil estimates.

use std::collections::VecDeque;

/// Fixed-capacity FIFO of recent (x, y) positions.
///
/// Pushing at capacity evicts the oldest entry, so the history always holds
/// the most recent positions. The capacity is fixed at construction; no
/// resizing happens afterwards.
#[derive(Debug, Clone)]
pub struct PositionHistory {
    capacity: usize,
    entries: VecDeque<(i32, i32)>,
}

impl PositionHistory {
    /// Create a history holding at most `capacity` positions
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "History capacity must be greater than 0");
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a position, evicting the oldest entry when full
    pub fn push(&mut self, position: (i32, i32)) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(position);
    }

    /// Truncated arithmetic mean of the stored positions, `None` when empty
    #[must_use]
    pub fn mean(&self) -> Option<(i32, i32)> {
        if self.entries.is_empty() {
            return None;
        }
        let len = self.entries.len() as f64;
        let sum_x: i64 = self.entries.iter().map(|p| i64::from(p.0)).sum();
        let sum_y: i64 = self.entries.iter().map(|p| i64::from(p.1)).sum();
        let mean_x = (sum_x as f64 / len) as i32;
        let mean_y = (sum_y as f64 / len) as i32;
        Some((mean_x, mean_y))
    }

    /// Number of stored positions
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no positions are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
