// Rigid-body world for cookie fragments, built on rapier2d.
//
// The world holds three static boundaries (floor + side walls, sized
// well past the visible canvas) and whatever wedge fragments the last
// break produced. It steps at a fixed 60 Hz; the RAF loop calls
// `step()` once per frame.

use rapier2d::prelude::*;

use crate::util::{rand_range, random};

/// Downward gravity in logical px/s^2 (canvas y grows downward).
const GRAVITY_Y: f32 = 500.0;
/// Fragment fill colors, cycled per wedge.
const FRAGMENT_COLORS: [&str; 4] = ["#e8b44a", "#d9a23c", "#c98f30", "#f0c266"];

/// One shard of the broken cookie.
pub struct Fragment {
    pub handle: RigidBodyHandle,
    /// Polygon vertices relative to the fragment centroid.
    pub verts: Vec<(f64, f64)>,
    pub color: &'static str,
}

pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    gravity: Vector<Real>,
    fragment_handles: Vec<RigidBodyHandle>,
}

impl PhysicsWorld {
    /// Builds the world with static boundaries sized for a 600x500
    /// logical canvas; fragments may settle or exit off-screen without
    /// extra bookkeeping.
    pub fn new() -> Self {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let statics = [
            // floor
            (vector![300.0, 640.0], (1200.0, 60.0)),
            // left wall
            (vector![-200.0, 250.0], (60.0, 2000.0)),
            // right wall
            (vector![800.0, 250.0], (60.0, 2000.0)),
        ];
        for (pos, (hx, hy)) in statics {
            let body = bodies.insert(RigidBodyBuilder::fixed().translation(pos));
            colliders.insert_with_parent(
                ColliderBuilder::cuboid(hx, hy).friction(0.6),
                body,
                &mut bodies,
            );
        }

        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: vector![0.0, GRAVITY_Y],
            fragment_handles: Vec::new(),
        }
    }

    /// Advances the simulation one fixed 1/60 s timestep.
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// Shatters a disc at `center` into 8..=12 irregular wedges and
    /// flings them away from `impact`. Wedges whose hulls rapier
    /// rejects are skipped; the batch never aborts.
    pub fn create_fragments(
        &mut self,
        center: (f64, f64),
        radius: f64,
        impact: (f64, f64),
        force: f64,
    ) -> Vec<Fragment> {
        let count = 8 + (random() * 5.0) as usize; // 8..=12
        let force = force.clamp(0.0, 1.0);

        // Irregular angular sectors covering the full circle.
        let mut weights: Vec<f64> = (0..count).map(|_| rand_range(0.6, 1.4)).collect();
        let total: f64 = weights.iter().sum();
        for w in &mut weights {
            *w *= std::f64::consts::TAU / total;
        }

        let mut fragments = Vec::with_capacity(count);
        let mut angle = random() * std::f64::consts::TAU;
        for (i, span) in weights.into_iter().enumerate() {
            let a0 = angle;
            let a1 = angle + span;
            angle = a1;

            // World-space wedge: one point near the center, three along
            // an uneven outer arc.
            let mid = (a0 + a1) * 0.5;
            let inner = radius * rand_range(0.02, 0.12);
            let mut world: Vec<(f64, f64)> = vec![(
                center.0 + mid.cos() * inner,
                center.1 + mid.sin() * inner,
            )];
            for a in [a0, mid, a1] {
                let r = radius * rand_range(0.72, 1.05);
                world.push((center.0 + a.cos() * r, center.1 + a.sin() * r));
            }

            let n = world.len() as f64;
            let centroid = world
                .iter()
                .fold((0.0, 0.0), |(cx, cy), (x, y)| (cx + x / n, cy + y / n));
            let local: Vec<(f64, f64)> = world
                .iter()
                .map(|(x, y)| (x - centroid.0, y - centroid.1))
                .collect();
            let points: Vec<Point<Real>> = local
                .iter()
                .map(|(x, y)| point![*x as f32, *y as f32])
                .collect();

            // Degenerate hulls (collinear, too small) are skipped.
            let Some(collider) = ColliderBuilder::convex_hull(&points) else {
                continue;
            };

            let handle = self.bodies.insert(
                RigidBodyBuilder::dynamic()
                    .translation(vector![centroid.0 as f32, centroid.1 as f32])
                    .angvel(rand_range(-8.0, 8.0) as f32),
            );
            self.colliders.insert_with_parent(
                collider.density(1.0).friction(0.5).restitution(0.25),
                handle,
                &mut self.bodies,
            );

            // Impulse away from the impact point, scaled by force with
            // per-fragment randomness plus a small upward bias.
            if let Some(body) = self.bodies.get_mut(handle) {
                let (mut dx, mut dy) = (centroid.0 - impact.0, centroid.1 - impact.1);
                let len = (dx * dx + dy * dy).sqrt();
                if len < 1e-6 {
                    let a = random() * std::f64::consts::TAU;
                    dx = a.cos();
                    dy = a.sin();
                } else {
                    dx /= len;
                    dy /= len;
                }
                let mass = body.mass() as f64;
                let speed = force * rand_range(150.0, 320.0);
                let ix = dx * speed * mass;
                let iy = dy * speed * mass - force * rand_range(60.0, 120.0) * mass;
                body.apply_impulse(vector![ix as f32, iy as f32], true);
            }

            self.fragment_handles.push(handle);
            fragments.push(Fragment {
                handle,
                verts: local,
                color: FRAGMENT_COLORS[i % FRAGMENT_COLORS.len()],
            });
        }
        fragments
    }

    /// Extra impulse shared by all fragments, used to carry the drag
    /// gesture's release velocity (px/ms) into the debris.
    pub fn apply_throw(&mut self, fragments: &[Fragment], velocity: (f64, f64)) {
        for frag in fragments {
            if let Some(body) = self.bodies.get_mut(frag.handle) {
                let mass = body.mass() as f64;
                // px/ms -> px/s.
                let ix = velocity.0 * 1000.0 * 0.6 * mass;
                let iy = velocity.1 * 1000.0 * 0.6 * mass;
                body.apply_impulse(vector![ix as f32, iy as f32], true);
            }
        }
    }

    /// World pose (translation + rotation) of a fragment body.
    pub fn pose(&self, handle: RigidBodyHandle) -> Option<(f64, f64, f64)> {
        self.bodies.get(handle).map(|b| {
            let t = b.translation();
            (t.x as f64, t.y as f64, b.rotation().angle() as f64)
        })
    }

    /// Removes all fragment bodies while keeping the static
    /// boundaries, so a new round reuses the same world.
    pub fn reset(&mut self) {
        for handle in self.fragment_handles.drain(..) {
            self.bodies.remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }
    }

    pub fn fragment_count(&self) -> usize {
        self.fragment_handles.len()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shatter_yields_expected_fragment_batch() {
        let mut world = PhysicsWorld::new();
        let frags = world.create_fragments((300.0, 230.0), 90.0, (300.0, 230.0), 1.0);
        assert!(
            (8..=12).contains(&frags.len()),
            "got {} fragments",
            frags.len()
        );
        for f in &frags {
            assert!(f.verts.len() >= 3);
            let (x, y, _) = world.pose(f.handle).unwrap();
            let d = ((x - 300.0).powi(2) + (y - 230.0).powi(2)).sqrt();
            assert!(d <= 90.0 * 1.1, "fragment centroid {} px from center", d);
        }
    }

    #[test]
    fn fragments_fall_under_gravity() {
        let mut world = PhysicsWorld::new();
        let frags = world.create_fragments((300.0, 230.0), 90.0, (300.0, 100.0), 0.0);
        let before: Vec<f64> = frags
            .iter()
            .map(|f| world.pose(f.handle).unwrap().1)
            .collect();
        for _ in 0..30 {
            world.step();
        }
        let moved = frags
            .iter()
            .zip(&before)
            .any(|(f, y0)| world.pose(f.handle).unwrap().1 > *y0 + 1.0);
        assert!(moved, "no fragment fell after 30 steps");
    }

    #[test]
    fn impulse_pushes_fragments_outward() {
        let mut world = PhysicsWorld::new();
        // Impact at the far left: fragments should mostly drift right.
        let frags = world.create_fragments((300.0, 230.0), 90.0, (150.0, 230.0), 1.0);
        for _ in 0..10 {
            world.step();
        }
        let rightward = frags
            .iter()
            .filter(|f| world.pose(f.handle).unwrap().0 > 300.0)
            .count();
        assert!(rightward * 2 > frags.len(), "fragments did not scatter away from impact");
    }

    #[test]
    fn reset_keeps_static_boundaries() {
        let mut world = PhysicsWorld::new();
        let statics = world.body_count();
        world.create_fragments((300.0, 230.0), 90.0, (300.0, 230.0), 0.8);
        assert!(world.body_count() > statics);
        world.reset();
        assert_eq!(world.body_count(), statics);
        assert_eq!(world.fragment_count(), 0);
        // World remains usable for another round.
        let again = world.create_fragments((300.0, 230.0), 90.0, (300.0, 230.0), 0.5);
        assert!((8..=12).contains(&again.len()));
    }
}
