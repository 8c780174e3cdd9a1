//! Physics integrator for the elementary region
//!
//! The world does not own a clock. The host advances it with elapsed time
//! deltas; long deltas are split into substeps of at most `SIM_DT`.

use glam::Vec2;

use super::boundary::RegionBoundary;
use super::collision::{resolve_boundary, resolve_pair};
use super::particle::Particle;
use crate::consts::*;
use crate::sensor::GravityHandle;

/// Speed cap so gain bounces (elasticity > 1) cannot run away
pub const MAX_SPEED: f32 = 4000.0;

/// Listener called with (particle index, new position) after each advance
pub type ParticleMovedFn = Box<dyn FnMut(usize, Vec2)>;

/// Forces and collision shape in effect while the world runs
#[derive(Debug, Clone)]
struct Bindings {
    boundary: RegionBoundary,
    gravity: GravityHandle,
}

/// Particles confined to one region, under gravity, bouncing elastically
pub struct PhysicsWorld {
    particles: Vec<Particle>,
    boundary: Option<RegionBoundary>,
    /// Present only while running
    bindings: Option<Bindings>,
    gravity: GravityHandle,
    elasticity: f32,
    /// Integrated time in seconds
    elapsed: f64,
    ticks: u64,
    listeners: Vec<ParticleMovedFn>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(GravityHandle::default(), 1.0)
    }
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("particles", &self.particles.len())
            .field("boundary", &self.boundary)
            .field("running", &self.is_running())
            .field("elasticity", &self.elasticity)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

impl PhysicsWorld {
    pub fn new(gravity: GravityHandle, elasticity: f32) -> Self {
        Self {
            particles: Vec::new(),
            boundary: None,
            bindings: None,
            gravity,
            elasticity,
            elapsed: 0.0,
            ticks: 0,
            listeners: Vec::new(),
        }
    }

    /// Begin integrating. No-op if already running or no boundary is set.
    pub fn start(&mut self) {
        if self.bindings.is_some() {
            return;
        }
        let Some(boundary) = self.boundary else {
            log::warn!("PhysicsWorld::start ignored: region boundary not set");
            return;
        };
        self.bindings = Some(Bindings {
            boundary,
            gravity: self.gravity.clone(),
        });
        log::debug!("PhysicsWorld started with {} particles", self.particles.len());
    }

    /// Halt integration and drop force/collision bindings. Idempotent.
    pub fn stop(&mut self) {
        if self.bindings.take().is_some() {
            log::debug!("PhysicsWorld stopped after {} ticks", self.ticks);
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.bindings.is_some()
    }

    /// Change the bounce coefficient; takes effect on the next tick
    pub fn set_elasticity(&mut self, elasticity: f32) {
        self.elasticity = elasticity;
    }

    pub fn elasticity(&self) -> f32 {
        self.elasticity
    }

    /// Replace the particles and the boundary as one unit.
    ///
    /// Bindings are released before the swap and rebuilt afterwards when the
    /// world was running, so no tick ever sees old particles with a new
    /// boundary or the other way round.
    pub fn set_particles(&mut self, particles: Vec<Particle>, boundary: Option<RegionBoundary>) {
        let was_running = self.is_running();
        self.stop();
        self.particles = particles;
        self.boundary = boundary;
        if was_running {
            self.start();
        }
    }

    /// Register a listener for particle moves
    pub fn on_particle_moved<F>(&mut self, callback: F)
    where
        F: FnMut(usize, Vec2) + 'static,
    {
        self.listeners.push(Box::new(callback));
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn boundary(&self) -> Option<&RegionBoundary> {
        self.boundary.as_ref()
    }

    /// Handle for writing gravity directions, possibly from another thread
    pub fn gravity_handle(&self) -> GravityHandle {
        self.gravity.clone()
    }

    /// Gravity direction; a unit vector means `GRAVITY_MAGNITUDE` px/s²
    pub fn set_gravity_direction(&self, direction: Vec2) {
        self.gravity.set(direction);
    }

    /// Seconds of simulation integrated so far
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of `advance` calls that integrated anything
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Integrate `dt` seconds. Returns how many particles moved.
    pub fn advance(&mut self, dt: f32) -> usize {
        let Some(bindings) = self.bindings.clone() else {
            return 0;
        };
        if dt.is_nan() || dt <= 0.0 {
            return 0;
        }

        let substeps = ((dt / SIM_DT).ceil() as u32).clamp(1, MAX_SUBSTEPS);
        let h = (dt / substeps as f32).min(SIM_DT);
        let before: Vec<Vec2> = self.particles.iter().map(|p| p.position).collect();

        for _ in 0..substeps {
            self.substep(&bindings, h);
        }

        self.elapsed += f64::from(h) * f64::from(substeps);
        self.ticks += 1;

        let mut moved = 0;
        for (index, (particle, old)) in self.particles.iter().zip(before).enumerate() {
            if particle.position != old {
                moved += 1;
                for listener in self.listeners.iter_mut() {
                    listener(index, particle.position);
                }
            }
        }
        log::trace!("tick {}: {} particles moved", self.ticks, moved);
        moved
    }

    /// One semi-implicit Euler step followed by collision resolution
    fn substep(&mut self, bindings: &Bindings, h: f32) {
        let acceleration = bindings.gravity.get() * GRAVITY_MAGNITUDE;
        let elasticity = self.elasticity;

        for particle in &mut self.particles {
            particle.velocity = (particle.velocity + acceleration * h).clamp_length_max(MAX_SPEED);
            particle.position += particle.velocity * h;
        }

        // Particle-particle contacts
        let count = self.particles.len();
        for i in 0..count {
            let (head, tail) = self.particles.split_at_mut(i + 1);
            let a = &mut head[i];
            for b in tail.iter_mut() {
                let radius = a.collision_radius();
                resolve_pair(
                    &mut a.position,
                    &mut a.velocity,
                    &mut b.position,
                    &mut b.velocity,
                    radius,
                    elasticity,
                );
            }
        }

        // Boundary contacts last so nothing ends the step outside the region
        for particle in &mut self.particles {
            let radius = particle.collision_radius();
            resolve_boundary(
                &mut particle.position,
                &mut particle.velocity,
                radius,
                &bindings.boundary,
                elasticity,
            );
            particle.velocity = particle.velocity.clamp_length_max(MAX_SPEED);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::particle::{Color, ItemSize};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use std::cell::RefCell;
    use std::f32::consts::{FRAC_PI_2, TAU};
    use std::rc::Rc;

    const CENTER: Vec2 = Vec2::new(200.0, 200.0);

    fn quarter_world(count: usize) -> PhysicsWorld {
        let size = ItemSize::new(6.0);
        let particles = (0..count)
            .map(|i| {
                let r = 40.0 + 25.0 * i as f32;
                Particle::new(CENTER, r, FRAC_PI_2 / 2.0, Color::WHITE, size.clone())
            })
            .collect();
        let boundary = RegionBoundary::new(CENTER, 150.0, FRAC_PI_2, 4);
        let mut world = PhysicsWorld::default();
        world.set_particles(particles, Some(boundary));
        world
    }

    #[test]
    fn test_start_without_boundary_is_noop() {
        let mut world = PhysicsWorld::default();
        world.start();
        assert!(!world.is_running());
        assert_eq!(world.advance(0.1), 0);
        assert_eq!(world.elapsed(), 0.0);
    }

    #[test]
    fn test_start_stop_idempotent() {
        let mut world = quarter_world(2);
        world.start();
        world.start();
        assert!(world.is_running());
        world.stop();
        world.stop();
        assert!(!world.is_running());
        assert_eq!(world.advance(1.0 / 60.0), 0);
    }

    #[test]
    fn test_gravity_pulls_down_on_screen() {
        let mut world = quarter_world(1);
        let y0 = world.particles()[0].position.y;
        world.start();
        assert_eq!(world.advance(1.0 / 60.0), 1);
        assert!(world.particles()[0].position.y > y0);
    }

    #[test]
    fn test_gravity_direction_is_live() {
        let mut world = quarter_world(1);
        world.start();
        world.set_gravity_direction(Vec2::new(-1.0, 0.0));
        let x0 = world.particles()[0].position.x;
        world.advance(1.0 / 60.0);
        assert!(world.particles()[0].position.x < x0);
    }

    /// 40 particles scattered inside one region of a `num_regions` disc
    fn packed_world(num_regions: u32, size: f32, elasticity: f32) -> PhysicsWorld {
        let radius = 150.0;
        let angle = TAU / num_regions as f32;
        let size = ItemSize::new(size);
        let mut rng = Pcg32::seed_from_u64(u64::from(num_regions));
        let particles = (0..40)
            .map(|_| {
                let r = rng.random_range(0.25 * radius..0.75 * radius);
                let theta = rng.random_range(0.25 * angle..0.75 * angle);
                Particle::new(CENTER, r, theta, Color::WHITE, size.clone())
            })
            .collect();
        let mut world = PhysicsWorld::default();
        world.set_elasticity(elasticity);
        world.set_particles(
            particles,
            Some(RegionBoundary::new(CENTER, radius, angle, num_regions)),
        );
        world
    }

    #[test]
    fn test_particles_stay_in_region() {
        const EPS: f32 = 1e-3;

        for num_regions in [1, 2, 3, 10, 16] {
            for (size, elasticity) in [(2.0, 0.0), (6.0, 1.2)] {
                let mut world = packed_world(num_regions, size, elasticity);
                let boundary = *world.boundary().unwrap();
                world.start();

                for tick in 0..1500 {
                    world.set_gravity_direction(Vec2::from_angle(tick as f32 * 0.01));
                    world.advance(1.0 / 60.0);

                    for p in world.particles() {
                        let offset = p.position - CENTER;
                        assert!(
                            offset.length() <= boundary.radius() + EPS,
                            "{num_regions} regions, tick {tick}: past the rim at {offset:?}"
                        );
                        for (_, normal) in boundary.edges().into_iter().flatten() {
                            assert!(
                                offset.dot(normal) >= -EPS,
                                "{num_regions} regions, tick {tick}: past an edge at {offset:?}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_zero_elasticity_kills_bounce() {
        let mut world = quarter_world(1);
        world.set_elasticity(0.0);
        world.start();
        for _ in 0..240 {
            world.advance(1.0 / 60.0);
        }
        // Resting on a boundary, velocity into it removed every step
        let v = world.particles()[0].velocity;
        assert!(v.length() < GRAVITY_MAGNITUDE * SIM_DT * 2.0 + 1.0);
    }

    #[test]
    fn test_set_particles_keeps_running_state() {
        let mut world = quarter_world(2);
        world.start();
        let boundary = *world.boundary().unwrap();
        world.set_particles(Vec::new(), Some(boundary));
        assert!(world.is_running());
        assert!(world.particles().is_empty());

        // Swapping to an unset boundary leaves the world quiescent
        world.set_particles(Vec::new(), None);
        assert!(!world.is_running());
    }

    #[test]
    fn test_listeners_see_moves() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut world = quarter_world(3);
        let sink = Rc::clone(&seen);
        world.on_particle_moved(move |index, _| sink.borrow_mut().push(index));
        world.start();
        world.advance(1.0 / 120.0);
        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_long_delta_is_capped() {
        let mut world = quarter_world(1);
        world.start();
        world.advance(10.0);
        let max = f64::from(SIM_DT) * f64::from(MAX_SUBSTEPS);
        assert!(world.elapsed() <= max + 1e-9);
        assert_eq!(world.ticks(), 1);
    }
}
