// Gesture recognition for breaking the cookie.
//
// Consumes normalized pointer/touch positions (canvas logical pixels)
// plus optional device-motion samples, classifies them into one of five
// break gestures, and fires a single `BreakEvent` per session. The
// continuous pre-break signals (hover glow, shake/squeeze progress,
// drag offset, click cracks) are written straight into the shared
// `RenderState` the renderer reads each frame.

use std::cell::RefCell;
use std::rc::Rc;

use crate::state::{GestureState, ObjectBounds, Phase, RenderState, VelocitySample};

/// The five mutually exclusive break gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    /// Press + release over the cookie, no double-tap, no drag.
    ClickSmash,
    /// Second tap inside the double-tap window; beats click-smash.
    DoubleTap,
    /// Cumulative drag past the distance threshold while held.
    DragCrack,
    /// Rapid direction reversals while hovering (or device motion).
    ShakeBreak,
    /// Sustained press with near-zero movement.
    Squeeze,
}

impl GestureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClickSmash => "click_smash",
            Self::DoubleTap => "double_tap",
            Self::DragCrack => "drag_crack",
            Self::ShakeBreak => "shake_break",
            Self::Squeeze => "squeeze",
        }
    }

    /// Normalized break force in [0,1].
    pub fn force(&self) -> f64 {
        match self {
            Self::ClickSmash => 0.6,
            Self::DoubleTap => 0.8,
            Self::DragCrack => 0.7,
            Self::ShakeBreak => 0.9,
            Self::Squeeze => 1.0,
        }
    }
}

/// Produced at most once per play session.
#[derive(Debug, Clone, Copy)]
pub struct BreakEvent {
    pub kind: GestureKind,
    pub x: f64,
    pub y: f64,
    pub force: f64,
    /// Release velocity in px/ms, only for drag-crack.
    pub throw: Option<(f64, f64)>,
}

/// Tuned defaults; treat as configuration, not invariants.
#[derive(Debug, Clone, Copy)]
pub struct GestureConfig {
    /// Second tap inside this window upgrades to double-tap.
    pub double_tap_window_ms: f64,
    /// Drag strictly past this distance fires drag-crack.
    pub drag_threshold_px: f64,
    /// Hold duration for a full squeeze.
    pub squeeze_hold_ms: f64,
    /// Max pointer travel for a press to still count as a squeeze/click.
    pub squeeze_slack_px: f64,
    /// Minimum per-move speed (px) for a shake sample to qualify.
    pub shake_speed_floor: f64,
    /// Accumulator gain per qualifying shake sample.
    pub shake_accum_per_sample: f64,
    /// Accumulated units at which shake-break fires.
    pub shake_threshold: f64,
    /// Accumulator decay per frame tick while still.
    pub shake_decay_per_tick: f64,
    /// Minimum device acceleration (m/s^2) for a motion sample.
    pub motion_accel_floor: f64,
    /// Velocity history window for throw estimation.
    pub velocity_window_ms: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_tap_window_ms: 400.0,
            drag_threshold_px: 80.0,
            squeeze_hold_ms: 2000.0,
            squeeze_slack_px: 12.0,
            shake_speed_floor: 1.0,
            shake_accum_per_sample: 1.5,
            shake_threshold: 40.0,
            shake_decay_per_tick: 0.4,
            motion_accel_floor: 12.0,
            velocity_window_ms: 120.0,
        }
    }
}

pub struct GestureDetector {
    config: GestureConfig,
    bounds: ObjectBounds,
    gs: GestureState,
    render: Rc<RefCell<RenderState>>,
    on_break: Option<Box<dyn FnMut(BreakEvent)>>,
    /// Previous device-motion acceleration, for reversal detection.
    last_accel: Option<(f64, f64)>,
    /// Timestamp of the last qualifying shake sample.
    last_shake_at: f64,
}

impl GestureDetector {
    pub fn new(render: Rc<RefCell<RenderState>>, config: GestureConfig) -> Self {
        Self {
            config,
            bounds: ObjectBounds::default(),
            gs: GestureState::default(),
            render,
            on_break: None,
            last_accel: None,
            last_shake_at: 0.0,
        }
    }

    pub fn set_bounds(&mut self, center: (f64, f64), radius: f64) {
        self.bounds = ObjectBounds::new(center.0, center.1, radius);
    }

    pub fn set_on_break(&mut self, cb: impl FnMut(BreakEvent) + 'static) {
        self.on_break = Some(Box::new(cb));
    }

    pub fn has_dispatched(&self) -> bool {
        self.gs.dispatched
    }

    /// Clears the one-shot latch and all tracked input state.
    pub fn reset(&mut self) {
        self.gs.reset();
        self.last_accel = None;
        self.last_shake_at = 0.0;
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, now: f64) {
        self.track_position(x, y);
        if !self.armed() {
            return;
        }
        self.gs.down = true;
        self.gs.down_x = x;
        self.gs.down_y = y;
        self.gs.down_at = now;
        self.gs.drag_dist = 0.0;
        if !self.bounds.contains(x, y) {
            return;
        }

        // Visible crack flash per press.
        {
            let mut rs = self.render.borrow_mut();
            rs.click_crack = (rs.click_crack + 0.34).min(1.0);
        }

        if let Some(t) = self.gs.last_tap_at {
            if now - t <= self.config.double_tap_window_ms {
                // Upgrade: the pending click-smash becomes a double-tap.
                self.gs.pending_click = None;
                self.gs.last_tap_at = None;
                self.fire(GestureKind::DoubleTap, x, y, None);
                return;
            }
        }
        self.gs.last_tap_at = Some(now);
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, now: f64) {
        let (dx, dy) = (x - self.gs.x, y - self.gs.y);
        let prev = self.gs.samples.back().copied();
        self.track_position(x, y);
        self.gs.samples.push_back(VelocitySample { dx, dy, t: now });
        self.gs.prune_samples(now, self.config.velocity_window_ms);
        if !self.armed() {
            return;
        }

        let inside = self.bounds.contains(x, y);
        self.gs.inside = inside;
        self.update_hover(x, y, inside);

        if self.gs.down {
            let started_inside = self.bounds.contains(self.gs.down_x, self.gs.down_y);
            self.gs.drag_dist += (dx * dx + dy * dy).sqrt();
            if started_inside {
                {
                    let mut rs = self.render.borrow_mut();
                    rs.drag_dx = x - self.gs.down_x;
                    rs.drag_dy = y - self.gs.down_y;
                }
                if self.gs.drag_dist > self.config.drag_threshold_px {
                    let throw = self.gs.velocity();
                    self.fire(GestureKind::DragCrack, x, y, Some(throw));
                }
            }
        } else if inside {
            // Hover shake: frequent sign reversals above the speed floor.
            let speed = (dx * dx + dy * dy).sqrt();
            let reversed = prev
                .map(|p| (dx * p.dx < 0.0) || (dy * p.dy < 0.0))
                .unwrap_or(false);
            if speed >= self.config.shake_speed_floor && reversed {
                self.accumulate_shake(now, x, y);
            }
        }
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, now: f64) {
        let was_down = self.gs.down;
        self.gs.down = false;
        {
            let mut rs = self.render.borrow_mut();
            rs.drag_dx = 0.0;
            rs.drag_dy = 0.0;
            rs.squeeze = 0.0;
        }
        if !was_down || !self.armed() {
            return;
        }
        let started_inside = self.bounds.contains(self.gs.down_x, self.gs.down_y);
        if started_inside
            && self.bounds.contains(x, y)
            && self.gs.drag_dist <= self.config.drag_threshold_px
        {
            // Deferred: resolves to click-smash once the double-tap
            // window passes without a second press.
            self.gs.pending_click = Some((x, y, now));
        }
    }

    /// Device-motion acceleration feed; same accumulator as hover shake.
    pub fn motion_sample(&mut self, ax: f64, ay: f64, now: f64) {
        if !self.armed() {
            return;
        }
        let prev = self.last_accel;
        self.last_accel = Some((ax, ay));
        let mag = (ax * ax + ay * ay).sqrt();
        let reversed = prev
            .map(|(px, py)| (ax * px < 0.0) || (ay * py < 0.0))
            .unwrap_or(false);
        if mag >= self.config.motion_accel_floor && reversed {
            let (cx, cy) = (self.bounds.cx, self.bounds.cy);
            self.accumulate_shake(now, cx, cy);
        }
    }

    /// Per-frame housekeeping: deferred click resolution, squeeze
    /// progress, shake decay, crack-flash fade.
    pub fn tick(&mut self, now: f64) {
        if !self.armed() {
            return;
        }
        self.gs.prune_samples(now, self.config.velocity_window_ms);

        if let Some((x, y, t)) = self.gs.pending_click {
            if now - t > self.config.double_tap_window_ms {
                self.gs.pending_click = None;
                self.fire(GestureKind::ClickSmash, x, y, None);
                return;
            }
        }

        if self.gs.down
            && self.bounds.contains(self.gs.down_x, self.gs.down_y)
            && self.gs.drag_dist <= self.config.squeeze_slack_px
        {
            let progress =
                ((now - self.gs.down_at) / self.config.squeeze_hold_ms).clamp(0.0, 1.0);
            self.render.borrow_mut().squeeze = progress;
            if progress >= 1.0 {
                let (x, y) = (self.gs.x, self.gs.y);
                self.fire(GestureKind::Squeeze, x, y, None);
                return;
            }
        }

        if now - self.last_shake_at > 120.0 && self.gs.shake_accum > 0.0 {
            self.gs.shake_accum =
                (self.gs.shake_accum - self.config.shake_decay_per_tick).max(0.0);
            self.render.borrow_mut().shake =
                (self.gs.shake_accum / self.config.shake_threshold).clamp(0.0, 1.0);
        }

        let mut rs = self.render.borrow_mut();
        rs.click_crack = (rs.click_crack - 0.02).max(0.0);
    }

    // Gestures are live only with valid bounds and before the break.
    fn armed(&self) -> bool {
        self.bounds.is_valid() && !self.gs.dispatched
    }

    fn track_position(&mut self, x: f64, y: f64) {
        self.gs.prev_x = self.gs.x;
        self.gs.prev_y = self.gs.y;
        self.gs.x = x;
        self.gs.y = y;
    }

    fn update_hover(&mut self, x: f64, y: f64, inside: bool) {
        let mut rs = self.render.borrow_mut();
        rs.hover = if inside {
            1.0 - self.bounds.distance_to(x, y) / self.bounds.radius
        } else {
            0.0
        };
        match rs.phase {
            Phase::Idle if rs.hover > 0.0 => rs.phase = Phase::Hover,
            Phase::Hover if rs.hover <= 0.0 => rs.phase = Phase::Idle,
            _ => {}
        }
    }

    fn accumulate_shake(&mut self, now: f64, x: f64, y: f64) {
        self.gs.shake_accum += self.config.shake_accum_per_sample;
        self.last_shake_at = now;
        let progress = (self.gs.shake_accum / self.config.shake_threshold).clamp(0.0, 1.0);
        self.render.borrow_mut().shake = progress;
        if self.gs.shake_accum >= self.config.shake_threshold {
            self.fire(GestureKind::ShakeBreak, x, y, None);
        }
    }

    fn fire(&mut self, kind: GestureKind, x: f64, y: f64, throw: Option<(f64, f64)>) {
        if self.gs.dispatched {
            return;
        }
        self.gs.dispatched = true;
        let event = BreakEvent {
            kind,
            x,
            y,
            force: kind.force(),
            throw,
        };
        if let Some(cb) = self.on_break.as_mut() {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> (GestureDetector, Rc<RefCell<Vec<BreakEvent>>>, Rc<RefCell<RenderState>>) {
        let render = Rc::new(RefCell::new(RenderState::default()));
        let mut det = GestureDetector::new(render.clone(), GestureConfig::default());
        det.set_bounds((300.0, 230.0), 90.0);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        det.set_on_break(move |e| sink.borrow_mut().push(e));
        (det, events, render)
    }

    #[test]
    fn click_smash_fires_after_double_tap_window() {
        let (mut det, events, _) = detector();
        det.pointer_down(300.0, 230.0, 0.0);
        det.pointer_up(300.0, 230.0, 80.0);
        det.tick(200.0);
        assert!(events.borrow().is_empty(), "fired inside the window");
        det.tick(500.0);
        let ev = events.borrow();
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].kind, GestureKind::ClickSmash);
        assert!((ev[0].force - 0.6).abs() < 1e-12);
    }

    #[test]
    fn second_tap_upgrades_to_double_tap() {
        let (mut det, events, _) = detector();
        det.pointer_down(300.0, 230.0, 0.0);
        det.pointer_up(300.0, 230.0, 60.0);
        det.pointer_down(302.0, 231.0, 200.0);
        let ev = events.borrow();
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].kind, GestureKind::DoubleTap);
        assert!((ev[0].force - 0.8).abs() < 1e-12);
        drop(ev);
        // The cancelled click must not fire later.
        det.tick(2000.0);
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn drag_at_threshold_holds_one_past_fires() {
        let cfg = GestureConfig::default();
        let (mut det, events, _) = detector();
        det.pointer_down(300.0, 230.0, 0.0);
        // Cumulative travel of exactly the threshold: 80 wiggles of 1px.
        for i in 0..cfg.drag_threshold_px as usize {
            let t = 10.0 + 2.0 * i as f64;
            det.pointer_move(300.5, 230.0, t);
            det.pointer_move(300.0, 230.0, t + 1.0);
        }
        assert!(events.borrow().is_empty(), "threshold itself must not fire");
        det.pointer_move(301.0, 230.0, 200.0);
        // One more pixel of travel crosses it.
        let ev = events.borrow();
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].kind, GestureKind::DragCrack);
        assert!(ev[0].throw.is_some());
        assert!((ev[0].force - 0.7).abs() < 1e-12);
    }

    #[test]
    fn shake_reversals_fire_before_fortieth_sample() {
        let (mut det, events, render) = detector();
        let mut fired_at = None;
        for i in 0..40 {
            let dir = if i % 2 == 0 { 1.0 } else { -1.0 };
            // Alternate around the center, each move well above the floor.
            det.pointer_move(300.0 + dir * 8.0, 230.0, i as f64 * 16.0);
            if !events.borrow().is_empty() && fired_at.is_none() {
                fired_at = Some(i + 1);
            }
        }
        let ev = events.borrow();
        assert_eq!(ev.len(), 1, "exactly one break despite continued shaking");
        assert_eq!(ev[0].kind, GestureKind::ShakeBreak);
        assert!((ev[0].force - 0.9).abs() < 1e-12);
        assert!(fired_at.unwrap() < 40, "fired at sample {:?}", fired_at);
        assert!((render.borrow().shake - 1.0).abs() < 1e-12);
    }

    #[test]
    fn squeeze_completes_after_hold_duration() {
        let (mut det, events, render) = detector();
        det.pointer_down(300.0, 230.0, 0.0);
        det.tick(1000.0);
        assert!((render.borrow().squeeze - 0.5).abs() < 1e-9);
        assert!(events.borrow().is_empty());
        det.tick(2000.0);
        let ev = events.borrow();
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].kind, GestureKind::Squeeze);
        assert!((ev[0].force - 1.0).abs() < 1e-12);
    }

    #[test]
    fn motion_samples_drive_shake_break() {
        let (mut det, events, _) = detector();
        for i in 0..40 {
            let dir = if i % 2 == 0 { 1.0 } else { -1.0 };
            det.motion_sample(dir * 15.0, -dir * 14.0, i as f64 * 16.0);
        }
        let ev = events.borrow();
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].kind, GestureKind::ShakeBreak);
        // Motion break lands at the object center.
        assert!((ev[0].x - 300.0).abs() < 1e-9);
    }

    #[test]
    fn weak_motion_below_floor_is_ignored() {
        let (mut det, events, _) = detector();
        for i in 0..100 {
            let dir = if i % 2 == 0 { 1.0 } else { -1.0 };
            det.motion_sample(dir * 2.0, 0.0, i as f64 * 16.0);
        }
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn no_second_event_until_reset() {
        let (mut det, events, _) = detector();
        det.pointer_down(300.0, 230.0, 0.0);
        det.pointer_up(300.0, 230.0, 50.0);
        det.pointer_down(300.0, 230.0, 150.0); // double tap
        assert_eq!(events.borrow().len(), 1);
        // Further qualifying input of any kind is a no-op.
        det.pointer_down(300.0, 230.0, 600.0);
        det.pointer_up(300.0, 230.0, 650.0);
        det.tick(2000.0);
        for i in 0..60 {
            let dir = if i % 2 == 0 { 1.0 } else { -1.0 };
            det.pointer_move(300.0 + dir * 8.0, 230.0, 3000.0 + i as f64 * 16.0);
        }
        assert_eq!(events.borrow().len(), 1);

        det.reset();
        det.pointer_down(300.0, 230.0, 9000.0);
        det.pointer_up(300.0, 230.0, 9050.0);
        det.tick(9500.0);
        assert_eq!(events.borrow().len(), 2);
    }

    #[test]
    fn zero_radius_bounds_disable_everything() {
        let render = Rc::new(RefCell::new(RenderState::default()));
        let mut det = GestureDetector::new(render.clone(), GestureConfig::default());
        det.set_bounds((300.0, 230.0), 0.0);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        det.set_on_break(move |e| sink.borrow_mut().push(e));
        det.pointer_down(300.0, 230.0, 0.0);
        det.pointer_up(300.0, 230.0, 50.0);
        det.tick(1000.0);
        for i in 0..60 {
            let dir = if i % 2 == 0 { 1.0 } else { -1.0 };
            det.pointer_move(300.0 + dir * 8.0, 230.0, i as f64 * 16.0);
        }
        assert!(events.borrow().is_empty());
        assert_eq!(render.borrow().hover, 0.0);
    }

    #[test]
    fn hover_intensity_scales_with_distance() {
        let (mut det, _, render) = detector();
        det.pointer_move(300.0, 230.0, 10.0);
        assert!((render.borrow().hover - 1.0).abs() < 1e-9);
        assert_eq!(render.borrow().phase, Phase::Hover);
        det.pointer_move(345.0, 230.0, 20.0); // half a radius out
        assert!((render.borrow().hover - 0.5).abs() < 1e-9);
        det.pointer_move(500.0, 230.0, 30.0); // outside
        assert_eq!(render.borrow().hover, 0.0);
        assert_eq!(render.borrow().phase, Phase::Idle);
    }

    #[test]
    fn drag_offset_tracks_pointer_and_clears_on_release() {
        let (mut det, _, render) = detector();
        det.pointer_down(300.0, 230.0, 0.0);
        det.pointer_move(330.0, 250.0, 16.0);
        assert!((render.borrow().drag_dx - 30.0).abs() < 1e-9);
        assert!((render.borrow().drag_dy - 20.0).abs() < 1e-9);
        det.pointer_up(330.0, 250.0, 32.0);
        assert_eq!(render.borrow().drag_dx, 0.0);
        assert_eq!(render.borrow().drag_dy, 0.0);
    }
}
