// Composition root for the cookie subsystem.
//
// Wires the gesture detector's break decision into the physics world
// (fragment spawn + impulses) and the renderer (phase transitions), and
// runs the per-frame pipeline: physics step -> gesture tick -> render
// update. The host hands in a payload string and receives break /
// reveal / new-cookie callbacks around it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::gesture::{BreakEvent, GestureConfig, GestureDetector, GestureKind};
use crate::physics::PhysicsWorld;
use crate::render::{Renderer, COOKIE_CX, COOKIE_CY, COOKIE_RADIUS};
use crate::state::{Phase, RenderState};
use crate::util::clog;

/// Frames of fragment scatter before the fortune panel starts.
const REVEAL_DELAY_FRAMES: u32 = 50;

type BreakCb = Box<dyn FnMut(GestureKind, f64)>;
type UnitCb = Box<dyn FnMut()>;

pub struct CookieController {
    detector: GestureDetector,
    physics: PhysicsWorld,
    renderer: Renderer,
    state: Rc<RefCell<RenderState>>,
    /// Break decision parked by the detector callback, consumed by the
    /// next frame tick.
    pending: Rc<RefCell<Option<BreakEvent>>>,
    on_break: Rc<RefCell<Option<BreakCb>>>,
    on_fortune_reveal: Rc<RefCell<Option<UnitCb>>>,
    on_new_cookie: Option<UnitCb>,
    payload: String,
    reveal_in: Option<u32>,
}

impl CookieController {
    pub fn new() -> Self {
        let state = Rc::new(RefCell::new(RenderState::default()));
        let mut detector = GestureDetector::new(state.clone(), GestureConfig::default());
        detector.set_bounds((COOKIE_CX, COOKIE_CY), COOKIE_RADIUS);

        let pending: Rc<RefCell<Option<BreakEvent>>> = Rc::new(RefCell::new(None));
        let on_break: Rc<RefCell<Option<BreakCb>>> = Rc::new(RefCell::new(None));
        {
            let pending = pending.clone();
            let on_break = on_break.clone();
            detector.set_on_break(move |event| {
                *pending.borrow_mut() = Some(event);
                // Host hears about the break immediately, before the
                // fragmentation lands next frame.
                if let Some(cb) = on_break.borrow_mut().as_mut() {
                    cb(event.kind, event.force);
                }
            });
        }

        Self {
            detector,
            physics: PhysicsWorld::new(),
            renderer: Renderer::new(state.clone()),
            state,
            pending,
            on_break,
            on_fortune_reveal: Rc::new(RefCell::new(None)),
            on_new_cookie: None,
            payload: String::new(),
            reveal_in: None,
        }
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn set_payload(&mut self, payload: String) {
        self.payload = payload;
    }

    pub fn set_on_break(&mut self, cb: impl FnMut(GestureKind, f64) + 'static) {
        *self.on_break.borrow_mut() = Some(Box::new(cb));
    }

    pub fn set_on_fortune_reveal(&mut self, cb: impl FnMut() + 'static) {
        *self.on_fortune_reveal.borrow_mut() = Some(Box::new(cb));
    }

    pub fn set_on_new_cookie(&mut self, cb: impl FnMut() + 'static) {
        self.on_new_cookie = Some(Box::new(cb));
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    // Input entry points; coordinates are canvas logical pixels and
    // `now` is performance.now() milliseconds.

    pub fn pointer_down(&mut self, x: f64, y: f64, now: f64) {
        self.detector.pointer_down(x, y, now);
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, now: f64) {
        self.detector.pointer_move(x, y, now);
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, now: f64) {
        self.detector.pointer_up(x, y, now);
    }

    pub fn motion_sample(&mut self, ax: f64, ay: f64, now: f64) {
        self.detector.motion_sample(ax, ay, now);
    }

    /// One animation frame: step, tick, resolve a pending break, keep
    /// detector bounds glued to the visual (drag-adjusted) center, then
    /// redraw.
    pub fn frame(&mut self, now: f64) {
        self.physics.step();
        self.detector.tick(now);

        let pending = self.pending.borrow_mut().take();
        if let Some(event) = pending {
            self.handle_break(event);
        }

        let center = self.renderer.effective_center();
        self.detector.set_bounds(center, COOKIE_RADIUS);

        if let Some(frames) = self.reveal_in.as_mut() {
            if *frames == 0 {
                self.reveal_in = None;
                let reveal_cb = self.on_fortune_reveal.clone();
                self.renderer
                    .show_reveal_overlay(self.payload.clone(), move || {
                        if let Some(cb) = reveal_cb.borrow_mut().as_mut() {
                            cb();
                        }
                    });
            } else {
                *frames -= 1;
            }
        }

        self.renderer.update(&self.physics);
    }

    fn handle_break(&mut self, event: BreakEvent) {
        clog(&format!(
            "break: {} force={:.2}",
            event.kind.as_str(),
            event.force
        ));
        let center = self.renderer.effective_center();
        let fragments =
            self.physics
                .create_fragments(center, COOKIE_RADIUS, (event.x, event.y), event.force);
        if let Some(throw) = event.throw {
            self.physics.apply_throw(&fragments, throw);
        }
        self.renderer.set_fragments(fragments);
        self.renderer.trigger_break_effect((event.x, event.y), event.force);
        self.reveal_in = Some(REVEAL_DELAY_FRAMES);
    }

    /// New round: cascaded reset of physics, renderer and detector,
    /// then the host's new-cookie callback.
    pub fn reset(&mut self) {
        self.physics.reset();
        self.renderer.reset();
        self.detector.reset();
        self.detector
            .set_bounds((COOKIE_CX, COOKIE_CY), COOKIE_RADIUS);
        self.pending.borrow_mut().take();
        self.reveal_in = None;
        if let Some(cb) = self.on_new_cookie.as_mut() {
            cb();
        }
    }

    /// Safe to call regardless of how far initialization got.
    pub fn destroy(&mut self) {
        self.physics.reset();
        self.renderer.destroy();
        self.detector.reset();
    }

    #[cfg(test)]
    fn fragment_count(&self) -> usize {
        self.physics.fragment_count()
    }
}

impl Default for CookieController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_frames(c: &mut CookieController, start_ms: f64, n: u32) -> f64 {
        let mut now = start_ms;
        for _ in 0..n {
            now += 16.0;
            c.frame(now);
        }
        now
    }

    #[test]
    fn double_tap_runs_full_break_to_reveal_sequence() {
        let mut c = CookieController::new();
        c.set_payload("You will find what you seek.".into());

        let log = Rc::new(RefCell::new(Vec::<String>::new()));
        {
            let log2 = log.clone();
            c.set_on_break(move |kind, force| {
                log2.borrow_mut().push(format!("break:{}:{:.1}", kind.as_str(), force));
            });
            let log2 = log.clone();
            c.set_on_fortune_reveal(move || log2.borrow_mut().push("reveal".into()));
        }

        c.pointer_down(300.0, 230.0, 0.0);
        c.pointer_up(300.0, 230.0, 60.0);
        c.pointer_down(300.0, 230.0, 200.0);
        assert_eq!(log.borrow().as_slice(), ["break:double_tap:0.8"]);

        let now = run_frames(&mut c, 200.0, 2);
        assert_eq!(c.phase(), Phase::Breaking);
        assert!(c.fragment_count() >= 8);

        // Scatter delay plus the panel animation.
        run_frames(&mut c, now, 110);
        assert_eq!(c.phase(), Phase::Reveal);
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(log.borrow()[1], "reveal");
    }

    #[test]
    fn no_second_break_without_reset() {
        let mut c = CookieController::new();
        c.set_payload("x".into());
        let breaks = Rc::new(RefCell::new(0));
        {
            let b = breaks.clone();
            c.set_on_break(move |_, _| *b.borrow_mut() += 1);
        }
        c.pointer_down(300.0, 230.0, 0.0);
        c.pointer_up(300.0, 230.0, 50.0);
        let now = run_frames(&mut c, 50.0, 40); // click-smash resolves
        assert_eq!(*breaks.borrow(), 1);

        c.pointer_down(300.0, 230.0, now + 10.0);
        c.pointer_up(300.0, 230.0, now + 60.0);
        run_frames(&mut c, now + 60.0, 40);
        assert_eq!(*breaks.borrow(), 1);
    }

    #[test]
    fn reset_round_trip_matches_fresh_instance() {
        let mut c = CookieController::new();
        c.set_payload("x".into());
        let new_cookies = Rc::new(RefCell::new(0));
        {
            let n = new_cookies.clone();
            c.set_on_new_cookie(move || *n.borrow_mut() += 1);
        }
        c.pointer_down(300.0, 230.0, 0.0);
        c.pointer_up(300.0, 230.0, 50.0);
        let now = run_frames(&mut c, 50.0, 120);
        assert_eq!(c.phase(), Phase::Reveal);

        c.reset();
        assert_eq!(*new_cookies.borrow(), 1);
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.fragment_count(), 0);
        assert_eq!(c.renderer.fragment_count(), 0);
        assert_eq!(c.renderer.particle_count(), 0);

        // The latch is re-armed: a new gesture breaks again.
        c.pointer_down(300.0, 230.0, now + 100.0);
        c.pointer_up(300.0, 230.0, now + 150.0);
        run_frames(&mut c, now + 150.0, 40);
        assert_eq!(c.phase(), Phase::Breaking);
    }

    #[test]
    fn drag_break_inherits_throw_velocity() {
        let mut c = CookieController::new();
        c.set_payload("x".into());
        c.pointer_down(300.0, 230.0, 0.0);
        // Fast rightward fling past the 80px threshold.
        for i in 1..=10 {
            c.pointer_move(300.0 + i as f64 * 10.0, 230.0, i as f64 * 8.0);
        }
        c.frame(100.0);
        assert_eq!(c.phase(), Phase::Breaking);
        assert!(c.fragment_count() >= 8);
    }
}
