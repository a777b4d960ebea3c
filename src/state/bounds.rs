// Visual bounds of the cookie, supplied by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectBounds {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

impl ObjectBounds {
    pub fn new(cx: f64, cy: f64, radius: f64) -> Self {
        Self { cx, cy, radius }
    }

    /// A zero or negative radius disables all gesture detection.
    pub fn is_valid(&self) -> bool {
        self.radius > 0.0 && self.radius.is_finite() && self.cx.is_finite() && self.cy.is_finite()
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((x - self.cx).powi(2) + (y - self.cy).powi(2)).sqrt()
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.is_valid() && self.distance_to(x, y) <= self.radius
    }
}

impl Default for ObjectBounds {
    fn default() -> Self {
        Self { cx: 0.0, cy: 0.0, radius: 0.0 }
    }
}
