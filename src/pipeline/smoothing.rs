//! Temporal position smoothing
//!
//! Each tracked hand keeps a short ring buffer of raw control-point
//! positions (the index fingertip). The smoothed position drives the
//! cursor; the velocity estimate drives scroll speed and swipe detection.
//! Window length trades latency against jitter and is configuration, not a
//! constant.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct Sample {
    x: f64,
    y: f64,
    timestamp_ms: f64,
}

/// Fixed-length history of raw positions with weighted-average smoothing.
#[derive(Debug, Clone)]
pub struct PositionSmoother {
    window: usize,
    recent_weight: f64,
    samples: VecDeque<Sample>,
}

impl PositionSmoother {
    /// # Arguments
    /// * `window` - number of frames retained (>= 1)
    /// * `recent_weight` - share of the newest sample in the smoothed
    ///   position, within (0, 1]; the rest is the mean of older samples
    pub fn new(window: usize, recent_weight: f64) -> Self {
        Self {
            window: window.max(1),
            recent_weight,
            samples: VecDeque::with_capacity(window.max(1)),
        }
    }

    /// Appends a raw position, evicting the oldest once the window is full.
    pub fn push(&mut self, x: f64, y: f64, timestamp_ms: f64) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample { x, y, timestamp_ms });
    }

    /// Weighted position: newest sample at `recent_weight`, the aggregate
    /// of older samples at the remainder. `None` until a sample arrives.
    pub fn smoothed(&self) -> Option<(f64, f64)> {
        let newest = self.samples.back()?;
        let older = self.samples.len() - 1;
        if older == 0 {
            return Some((newest.x, newest.y));
        }
        let (sx, sy) = self
            .samples
            .iter()
            .take(older)
            .fold((0.0, 0.0), |(sx, sy), s| (sx + s.x, sy + s.y));
        let n = older as f64;
        let w = self.recent_weight;
        Some((newest.x * w + (sx / n) * (1.0 - w), newest.y * w + (sy / n) * (1.0 - w)))
    }

    /// Velocity over the buffered span, in px/s. `None` until two samples
    /// with distinct timestamps are buffered.
    pub fn velocity(&self) -> Option<(f64, f64)> {
        if self.samples.len() < 2 {
            return None;
        }
        let oldest = self.samples.front()?;
        let newest = self.samples.back()?;
        let elapsed_ms = newest.timestamp_ms - oldest.timestamp_ms;
        if elapsed_ms <= 0.0 {
            return None;
        }
        Some((
            (newest.x - oldest.x) / elapsed_ms * 1000.0,
            (newest.y - oldest.y) / elapsed_ms * 1000.0,
        ))
    }

    /// Raw displacement between the two newest samples.
    pub fn last_step(&self) -> Option<(f64, f64)> {
        let len = self.samples.len();
        if len < 2 {
            return None;
        }
        let prev = self.samples[len - 2];
        let newest = self.samples[len - 1];
        Some((newest.x - prev.x, newest.y - prev.y))
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
