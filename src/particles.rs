// Transient visual particles: break-burst sparks and the ambient rim
// motes that hint the cookie is interactive.

use crate::util::{rand_range, random};

/// Warm crumb/spark palette.
const PALETTE: [&str; 5] = ["#e8b44a", "#d49a3a", "#f2cc7b", "#c47f2e", "#fae3a8"];

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Remaining life in frames; removed at zero.
    pub life: u32,
    pub max_life: u32,
    pub size: f64,
    pub color: &'static str,
    /// life / max_life, recomputed every update.
    pub alpha: f64,
    pub rot: f64,
    pub rot_speed: f64,
}

/// Emission tuning for a single burst.
#[derive(Debug, Clone, Copy)]
pub struct EmitParams {
    pub speed: (f64, f64),
    pub life: (u32, u32),
    pub size: (f64, f64),
}

impl Default for EmitParams {
    fn default() -> Self {
        Self {
            speed: (1.0, 6.0),
            life: (30, 70),
            size: (2.0, 5.0),
        }
    }
}

#[derive(Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn emit(&mut self, origin: (f64, f64), count: usize, params: EmitParams) {
        self.particles.reserve(count);
        for _ in 0..count {
            let angle = random() * std::f64::consts::TAU;
            let speed = rand_range(params.speed.0, params.speed.1);
            let life = rand_range(params.life.0 as f64, params.life.1 as f64 + 1.0) as u32;
            let life = life.clamp(params.life.0, params.life.1).max(1);
            let color = PALETTE[(random() * PALETTE.len() as f64) as usize % PALETTE.len()];
            self.particles.push(Particle {
                x: origin.0,
                y: origin.1,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                life,
                max_life: life,
                size: rand_range(params.size.0, params.size.1),
                color,
                alpha: 1.0,
                rot: random() * std::f64::consts::TAU,
                rot_speed: rand_range(-0.2, 0.2),
            });
        }
    }

    /// One slow mote drifting off the cookie rim. Callers decide the
    /// cadence; this just places a single particle.
    pub fn emit_ambient(&mut self, center: (f64, f64), radius: f64) {
        let angle = random() * std::f64::consts::TAU;
        let life = rand_range(40.0, 90.0) as u32;
        self.particles.push(Particle {
            x: center.0 + angle.cos() * radius,
            y: center.1 + angle.sin() * radius,
            vx: rand_range(-0.3, 0.3),
            vy: rand_range(-0.6, -0.1),
            life,
            max_life: life,
            size: rand_range(1.0, 2.5),
            color: PALETTE[(random() * PALETTE.len() as f64) as usize % PALETTE.len()],
            alpha: 1.0,
            rot: 0.0,
            rot_speed: rand_range(-0.05, 0.05),
        });
    }

    /// Advance all particles one frame. O(n), compacting in place.
    pub fn update(&mut self, gravity: f64) {
        self.particles.retain_mut(|p| {
            p.x += p.vx;
            p.y += p.vy;
            p.vy += gravity;
            p.vx *= 0.98;
            p.rot += p.rot_speed;
            p.life = p.life.saturating_sub(1);
            p.alpha = p.life as f64 / p.max_life as f64;
            p.life > 0
        });
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_life_particle_dies_after_exact_updates() {
        let mut ps = ParticleSystem::new();
        ps.emit(
            (0.0, 0.0),
            1,
            EmitParams {
                life: (10, 10),
                ..Default::default()
            },
        );
        for i in 0..9 {
            ps.update(0.1);
            assert_eq!(ps.len(), 1, "particle gone early at update {}", i + 1);
        }
        ps.update(0.1);
        assert!(ps.is_empty());
    }

    #[test]
    fn alpha_tracks_life_ratio() {
        let mut ps = ParticleSystem::new();
        ps.emit(
            (0.0, 0.0),
            1,
            EmitParams {
                life: (10, 10),
                ..Default::default()
            },
        );
        ps.update(0.0);
        let p = ps.iter().next().unwrap();
        assert!((p.alpha - 0.9).abs() < 1e-12);
    }

    #[test]
    fn gravity_pulls_vertical_velocity_only() {
        let mut ps = ParticleSystem::new();
        ps.emit(
            (0.0, 0.0),
            5,
            EmitParams {
                speed: (0.0, 0.0),
                ..Default::default()
            },
        );
        ps.update(0.5);
        for p in ps.iter() {
            assert!((p.vy - 0.5).abs() < 1e-9);
            assert!(p.vx.abs() < 1e-9);
        }
    }

    #[test]
    fn ambient_mote_starts_on_rim() {
        let mut ps = ParticleSystem::new();
        ps.emit_ambient((100.0, 100.0), 50.0);
        let p = ps.iter().next().unwrap();
        let d = ((p.x - 100.0).powi(2) + (p.y - 100.0).powi(2)).sqrt();
        assert!((d - 50.0).abs() < 1e-9);
    }

    #[test]
    fn clear_empties_pool() {
        let mut ps = ParticleSystem::new();
        ps.emit((0.0, 0.0), 20, EmitParams::default());
        ps.clear();
        assert!(ps.is_empty());
    }
}
