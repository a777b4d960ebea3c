// Canvas renderer for the cookie: intact body with breathing/jitter,
// crack-line previews, live fragments, particles, and the fortune
// reveal overlay. All drawing is redone from scratch each frame:
// clear first, then layers back to front.
//
// The renderer can be constructed without a 2d context; update logic
// still runs so the state machine is testable off the browser.

use std::cell::RefCell;
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
use web_sys::CanvasRenderingContext2d;

use crate::particles::{EmitParams, ParticleSystem};
use crate::physics::{Fragment, PhysicsWorld};
use crate::state::{Phase, RenderState};
use crate::util::rand_range;

pub const CANVAS_W: f64 = 600.0;
pub const CANVAS_H: f64 = 500.0;
pub const COOKIE_CX: f64 = 300.0;
pub const COOKIE_CY: f64 = 230.0;
pub const COOKIE_RADIUS: f64 = 90.0;

/// Frames between ambient rim motes while idle.
const AMBIENT_CADENCE: u64 = 9;
/// Frames for the reveal panel to fade/slide in.
const REVEAL_FRAMES: f64 = 45.0;

const CRACK_ANGLES: [f64; 8] = [0.31, 1.02, 1.74, 2.45, 3.27, 4.08, 4.79, 5.61];

fn ease_out_cubic(t: f64) -> f64 {
    let u = 1.0 - t.clamp(0.0, 1.0);
    1.0 - u * u * u
}

#[derive(Default)]
struct RevealAnim {
    active: bool,
    progress: f64,
    payload: String,
    on_complete: Option<Box<dyn FnOnce()>>,
    completed: bool,
}

pub struct Renderer {
    ctx: Option<CanvasRenderingContext2d>,
    pub state: Rc<RefCell<RenderState>>,
    particles: ParticleSystem,
    fragments: Vec<Fragment>,
    reveal: RevealAnim,
    frame: u64,
}

impl Renderer {
    pub fn new(state: Rc<RefCell<RenderState>>) -> Self {
        Self {
            ctx: None,
            state,
            particles: ParticleSystem::new(),
            fragments: Vec::new(),
            reveal: RevealAnim::default(),
            frame: 0,
        }
    }

    /// Binds the canvas 2d context. Returns false when the context is
    /// unavailable; callers treat that as init failure.
    #[cfg(target_arch = "wasm32")]
    pub fn attach(&mut self, canvas: &web_sys::HtmlCanvasElement) -> bool {
        canvas.set_width(CANVAS_W as u32);
        canvas.set_height(CANVAS_H as u32);
        match canvas.get_context("2d").ok().flatten() {
            Some(ctx) => match ctx.dyn_into::<CanvasRenderingContext2d>() {
                Ok(ctx) => {
                    self.ctx = Some(ctx);
                    true
                }
                Err(_) => false,
            },
            None => false,
        }
    }

    /// Visual cookie center including any live drag offset; the
    /// detector bounds and fragment spawn must follow this.
    pub fn effective_center(&self) -> (f64, f64) {
        let rs = self.state.borrow();
        (COOKIE_CX + rs.drag_dx, COOKIE_CY + rs.drag_dy)
    }

    pub fn set_fragments(&mut self, fragments: Vec<Fragment>) {
        self.fragments = fragments;
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Impact burst; size scales with force.
    pub fn trigger_break_effect(&mut self, impact: (f64, f64), force: f64) {
        let count = 18 + (force.clamp(0.0, 1.0) * 30.0) as usize;
        self.particles.emit(
            impact,
            count,
            EmitParams {
                speed: (1.5, 3.0 + force * 5.0),
                life: (25, 60),
                size: (1.5, 4.5),
            },
        );
        self.state.borrow_mut().phase = Phase::Breaking;
    }

    /// Starts the payload panel animating in; `on_complete` fires once
    /// when the panel lands.
    pub fn show_reveal_overlay(&mut self, payload: String, on_complete: impl FnOnce() + 'static) {
        self.reveal = RevealAnim {
            active: true,
            progress: 0.0,
            payload,
            on_complete: Some(Box::new(on_complete)),
            completed: false,
        };
        self.state.borrow_mut().phase = Phase::Reveal;
    }

    pub fn reveal_progress(&self) -> f64 {
        self.reveal.progress
    }

    /// Per-frame update + redraw. The caller steps physics first.
    pub fn update(&mut self, physics: &PhysicsWorld) {
        self.frame += 1;

        let phase = self.state.borrow().phase;
        match phase {
            Phase::Idle | Phase::Hover => {
                let mut rs = self.state.borrow_mut();
                rs.breathe_scale = 1.0 + 0.03 * (self.frame as f64 * 0.05).sin();
                drop(rs);
                if self.frame % AMBIENT_CADENCE == 0 {
                    let center = self.effective_center();
                    self.particles.emit_ambient(center, COOKIE_RADIUS);
                }
            }
            Phase::Breaking | Phase::Reveal => {}
        }

        self.particles.update(0.12);

        if self.reveal.active && !self.reveal.completed {
            self.reveal.progress = (self.reveal.progress + 1.0 / REVEAL_FRAMES).min(1.0);
            if self.reveal.progress >= 1.0 {
                self.reveal.completed = true;
                if let Some(cb) = self.reveal.on_complete.take() {
                    cb();
                }
            }
        }

        self.draw(physics);
    }

    /// Back to the idle appearance without touching the context, so
    /// repeated rounds stay cheap.
    pub fn reset(&mut self) {
        self.fragments.clear();
        self.particles.clear();
        self.reveal = RevealAnim::default();
        self.state.borrow_mut().reset();
    }

    pub fn destroy(&mut self) {
        self.reset();
        self.ctx = None;
    }

    fn draw(&mut self, physics: &PhysicsWorld) {
        let Some(ctx) = self.ctx.clone() else {
            return;
        };
        ctx.clear_rect(0.0, 0.0, CANVAS_W, CANVAS_H);

        let rs = self.state.borrow().clone();
        match rs.phase {
            Phase::Idle | Phase::Hover => self.draw_cookie(&ctx, &rs),
            Phase::Breaking | Phase::Reveal => self.draw_fragments(&ctx, physics),
        }
        self.draw_particles(&ctx);
        if self.reveal.active {
            self.draw_reveal(&ctx);
        }
    }

    fn draw_cookie(&self, ctx: &CanvasRenderingContext2d, rs: &RenderState) {
        let jitter = rs.shake * 4.0;
        let cx = COOKIE_CX + rs.drag_dx + rand_range(-jitter, jitter);
        let cy = COOKIE_CY + rs.drag_dy + rand_range(-jitter, jitter);
        let scale = rs.breathe_scale * (1.0 - 0.12 * rs.squeeze) * (1.0 + 0.06 * rs.hover);
        let r = COOKIE_RADIUS * scale;

        // Body.
        ctx.begin_path();
        ctx.set_fill_style_str("#e8b44a");
        ctx.arc(cx, cy, r, 0.0, std::f64::consts::TAU).ok();
        ctx.fill();
        ctx.set_stroke_style_str("#8a6a20");
        ctx.set_line_width(3.0);
        ctx.stroke();

        // Fold line across the middle.
        ctx.begin_path();
        ctx.set_stroke_style_str("#c08f2f");
        ctx.set_line_width(2.0);
        ctx.ellipse(cx, cy, r * 0.9, r * 0.28, 0.0, 0.0, std::f64::consts::PI)
            .ok();
        ctx.stroke();

        // Crack-line preview scaled by the strongest pre-break signal.
        let level = rs.crack_level();
        if level > 0.02 {
            ctx.set_stroke_style_str(&format!("rgba(90,60,10,{:.3})", 0.25 + 0.6 * level));
            ctx.set_line_width(1.5);
            for (i, a) in CRACK_ANGLES.iter().enumerate() {
                let wobble = ((self.frame as f64 * 0.11) + i as f64).sin() * 0.05;
                let len = r * (0.25 + 0.7 * level);
                ctx.begin_path();
                ctx.move_to(cx, cy);
                ctx.line_to(
                    cx + (a + wobble).cos() * len,
                    cy + (a + wobble).sin() * len,
                );
                ctx.stroke();
            }
        }

        // Hover glow ring.
        if rs.hover > 0.0 {
            ctx.begin_path();
            ctx.set_stroke_style_str(&format!("rgba(250,220,140,{:.3})", 0.5 * rs.hover));
            ctx.set_line_width(6.0);
            ctx.arc(cx, cy, r + 8.0, 0.0, std::f64::consts::TAU).ok();
            ctx.stroke();
        }
    }

    fn draw_fragments(&self, ctx: &CanvasRenderingContext2d, physics: &PhysicsWorld) {
        ctx.set_line_width(2.0);
        for frag in &self.fragments {
            let Some((x, y, angle)) = physics.pose(frag.handle) else {
                continue;
            };
            ctx.save();
            ctx.translate(x, y).ok();
            ctx.rotate(angle).ok();
            ctx.begin_path();
            for (i, (vx, vy)) in frag.verts.iter().enumerate() {
                if i == 0 {
                    ctx.move_to(*vx, *vy);
                } else {
                    ctx.line_to(*vx, *vy);
                }
            }
            ctx.close_path();
            ctx.set_fill_style_str(frag.color);
            ctx.fill();
            ctx.set_stroke_style_str("#8a6a20");
            ctx.stroke();
            ctx.restore();
        }
    }

    fn draw_particles(&self, ctx: &CanvasRenderingContext2d) {
        for p in self.particles.iter() {
            ctx.save();
            ctx.set_global_alpha(p.alpha);
            ctx.translate(p.x, p.y).ok();
            ctx.rotate(p.rot).ok();
            ctx.set_fill_style_str(p.color);
            ctx.fill_rect(-p.size * 0.5, -p.size * 0.5, p.size, p.size);
            ctx.restore();
        }
    }

    fn draw_reveal(&self, ctx: &CanvasRenderingContext2d) {
        let p = ease_out_cubic(self.reveal.progress);
        let slide = (1.0 - p) * 40.0;
        let panel_w = 420.0;
        let panel_h = 150.0;
        let px = (CANVAS_W - panel_w) * 0.5;
        let py = (CANVAS_H - panel_h) * 0.5 + slide;

        ctx.save();
        ctx.set_global_alpha(p);
        ctx.set_fill_style_str("rgba(22,27,34,0.95)");
        ctx.fill_rect(px, py, panel_w, panel_h);
        ctx.set_stroke_style_str("#e8b44a");
        ctx.set_line_width(2.0);
        ctx.stroke_rect(px, py, panel_w, panel_h);

        ctx.set_fill_style_str("#f2cc7b");
        ctx.set_font("13px sans-serif");
        ctx.set_text_align("center");
        ctx.fill_text("YOUR FORTUNE", CANVAS_W * 0.5, py + 30.0).ok();

        ctx.set_fill_style_str("#e6edf3");
        ctx.set_font("16px Georgia, serif");
        for (i, line) in wrap_text(&self.reveal.payload, 44).iter().enumerate() {
            ctx.fill_text(line, CANVAS_W * 0.5, py + 62.0 + i as f64 * 24.0)
                .ok();
        }
        ctx.restore();
    }
}

/// Greedy word wrap for the reveal panel.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> (Renderer, Rc<RefCell<RenderState>>) {
        let state = Rc::new(RefCell::new(RenderState::default()));
        (Renderer::new(state.clone()), state)
    }

    #[test]
    fn idle_update_breathes_and_trickles_ambient() {
        let (mut r, state) = renderer();
        let physics = PhysicsWorld::new();
        for _ in 0..30 {
            r.update(&physics);
        }
        let scale = state.borrow().breathe_scale;
        assert!((0.97..=1.03).contains(&scale));
        assert!(r.particle_count() > 0, "no ambient motes emitted");
    }

    #[test]
    fn break_effect_scales_burst_with_force_and_enters_breaking() {
        let (mut weak, _) = renderer();
        weak.trigger_break_effect((300.0, 230.0), 0.0);
        let (mut strong, state) = renderer();
        strong.trigger_break_effect((300.0, 230.0), 1.0);
        assert!(strong.particle_count() > weak.particle_count());
        assert_eq!(state.borrow().phase, Phase::Breaking);
    }

    #[test]
    fn reveal_completes_once_after_animation() {
        let (mut r, state) = renderer();
        let physics = PhysicsWorld::new();
        let done = Rc::new(RefCell::new(0));
        let sink = done.clone();
        r.show_reveal_overlay("Great things await.".into(), move || {
            *sink.borrow_mut() += 1;
        });
        assert_eq!(state.borrow().phase, Phase::Reveal);
        for _ in 0..120 {
            r.update(&physics);
        }
        assert_eq!(*done.borrow(), 1);
        assert!((r.reveal_progress() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn reset_restores_fresh_appearance() {
        let (mut r, state) = renderer();
        let mut physics = PhysicsWorld::new();
        let frags = physics.create_fragments((300.0, 230.0), 90.0, (300.0, 230.0), 1.0);
        r.set_fragments(frags);
        r.trigger_break_effect((300.0, 230.0), 1.0);
        r.show_reveal_overlay("x".into(), || {});
        r.reset();
        assert_eq!(state.borrow().phase, Phase::Idle);
        assert_eq!(r.fragment_count(), 0);
        assert_eq!(r.particle_count(), 0);
        assert_eq!(r.reveal_progress(), 0.0);
    }

    #[test]
    fn effective_center_follows_drag_offset() {
        let (r, state) = renderer();
        state.borrow_mut().drag_dx = 25.0;
        state.borrow_mut().drag_dy = -10.0;
        let (cx, cy) = r.effective_center();
        assert!((cx - 325.0).abs() < 1e-9);
        assert!((cy - 220.0).abs() < 1e-9);
    }

    #[test]
    fn wrap_text_respects_width() {
        let lines = wrap_text("a bb ccc dddd eeeee", 7);
        assert!(lines.iter().all(|l| l.len() <= 7));
        assert_eq!(lines.join(" "), "a bb ccc dddd eeeee");
    }
}
