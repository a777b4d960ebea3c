// Shared render signals: written by the gesture detector, read every
// frame by the renderer. Single-threaded, so plain fields suffice.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Hover,
    Breaking,
    Reveal,
}

#[derive(Debug, Clone)]
pub struct RenderState {
    pub phase: Phase,
    /// 1 - dist/radius while the pointer is inside the cookie, else 0.
    pub hover: f64,
    /// Normalized shake accumulator progress.
    pub shake: f64,
    /// Held-down squeeze progress.
    pub squeeze: f64,
    /// Transient crack flash from individual clicks, decays per frame.
    pub click_crack: f64,
    /// Visual displacement while dragging, in logical pixels.
    pub drag_dx: f64,
    pub drag_dy: f64,
    /// Sinusoidal idle oscillation, roughly 0.97..1.03.
    pub breathe_scale: f64,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            hover: 0.0,
            shake: 0.0,
            squeeze: 0.0,
            click_crack: 0.0,
            drag_dx: 0.0,
            drag_dy: 0.0,
            breathe_scale: 1.0,
        }
    }
}

impl RenderState {
    /// Strongest pre-break signal; drives the crack-line preview.
    pub fn crack_level(&self) -> f64 {
        self.hover
            .max(self.shake)
            .max(self.squeeze)
            .max(self.click_crack)
            .clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crack_level_takes_strongest_signal() {
        let mut rs = RenderState::default();
        rs.hover = 0.2;
        rs.squeeze = 0.7;
        rs.shake = 0.4;
        assert!((rs.crack_level() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn reset_matches_fresh_state() {
        let mut rs = RenderState::default();
        rs.phase = Phase::Breaking;
        rs.drag_dx = 12.0;
        rs.shake = 0.9;
        rs.reset();
        assert_eq!(rs.phase, Phase::Idle);
        assert_eq!(rs.drag_dx, 0.0);
        assert_eq!(rs.shake, 0.0);
        assert_eq!(rs.breathe_scale, 1.0);
    }
}
