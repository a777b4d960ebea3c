// Mutable input-tracking state for the gesture detector.

use std::collections::VecDeque;

/// One pointer movement delta with its wall-clock timestamp (ms).
#[derive(Debug, Clone, Copy)]
pub struct VelocitySample {
    pub dx: f64,
    pub dy: f64,
    pub t: f64,
}

#[derive(Debug, Clone, Default)]
pub struct GestureState {
    pub x: f64,
    pub y: f64,
    pub prev_x: f64,
    pub prev_y: f64,
    pub down: bool,
    pub down_x: f64,
    pub down_y: f64,
    pub down_at: f64,
    /// Cumulative pointer travel since pointer-down.
    pub drag_dist: f64,
    /// Recent movement deltas, pruned to a fixed time window.
    pub samples: VecDeque<VelocitySample>,
    pub shake_accum: f64,
    pub last_tap_at: Option<f64>,
    /// Armed on pointer-up; fires as click-smash once the double-tap
    /// window passes without a second tap.
    pub pending_click: Option<(f64, f64, f64)>,
    pub inside: bool,
    /// One-shot latch: exactly one break per session.
    pub dispatched: bool,
}

impl GestureState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn prune_samples(&mut self, now: f64, window_ms: f64) {
        while let Some(s) = self.samples.front() {
            if now - s.t > window_ms {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Average velocity over the retained samples, px/ms.
    pub fn velocity(&self) -> (f64, f64) {
        if self.samples.is_empty() {
            return (0.0, 0.0);
        }
        let first = self.samples.front().map(|s| s.t).unwrap_or(0.0);
        let last = self.samples.back().map(|s| s.t).unwrap_or(0.0);
        let span = (last - first).max(1.0);
        let (sx, sy) = self
            .samples
            .iter()
            .fold((0.0, 0.0), |(ax, ay), s| (ax + s.dx, ay + s.dy));
        (sx / span, sy / span)
    }
}
