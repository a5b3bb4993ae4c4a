//! Rolling history buffers for sparklines.

use std::collections::VecDeque;

use serde::Serialize;

/// Default number of samples kept per history.
pub const DEFAULT_HISTORY_SIZE: usize = 30;

/// Upper bound on samples kept per history.
pub const MAX_HISTORY_SIZE: usize = 10_000;

/// A bounded FIFO of samples. Pushing at capacity evicts the oldest sample.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RollingHistory<T> {
    #[serde(skip)]
    capacity: usize,
    values: VecDeque<T>,
}

impl<T> Default for RollingHistory<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl<T> RollingHistory<T> {
    /// Create an empty history holding `capacity` samples, clamped to
    /// `1..=MAX_HISTORY_SIZE`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_HISTORY_SIZE);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: T) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<&T> {
        self.values.back()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.values.iter()
    }
}

/// Numeric samples that can be drawn in a sparkline.
pub trait SampleValue: Copy {
    fn as_f64(self) -> f64;
}

impl SampleValue for i64 {
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl SampleValue for i32 {
    fn as_f64(self) -> f64 {
        f64::from(self)
    }
}

impl SampleValue for u32 {
    fn as_f64(self) -> f64 {
        f64::from(self)
    }
}

impl SampleValue for f64 {
    fn as_f64(self) -> f64 {
        self
    }
}

impl<T: SampleValue> RollingHistory<T> {
    /// Sparkline levels (0-7 for 8 bar heights), oldest first.
    ///
    /// Values are scaled against the window's maximum so the tallest bar is
    /// always the worst sample. Negative values clamp to the lowest bar.
    pub fn sparkline(&self) -> Vec<u8> {
        let values: Vec<f64> = self.values.iter().map(|&v| v.as_f64().max(0.0)).collect();
        if values.is_empty() {
            return Vec::new();
        }

        let max = values.iter().copied().fold(0.0_f64, f64::max);
        if max <= 0.0 {
            return vec![0; values.len()];
        }

        values
            .iter()
            .map(|v| ((v / max) * 7.0).round().min(7.0) as u8)
            .collect()
    }

    /// Mean of the samples in the window.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let sum: f64 = self.values.iter().map(|&v| v.as_f64()).sum();
        Some(sum / self.values.len() as f64)
    }
}
