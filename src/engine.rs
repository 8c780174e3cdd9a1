//! Kaleidoscope engine
//!
//! Owns the configuration, the world geometry and the physics world. The host
//! drives it with `tick(dt)` from its display refresh callback, listens for
//! `EngineEvent`s and pulls a `RenderSnapshot` when notified.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::consts::*;
use crate::error::ConfigError;
use crate::mirror::{DrawInstance, MirrorProjector, region_guide_lines};
use crate::sensor::{GravityHandle, InterfaceOrientation, SensorSource};
use crate::sim::{BoundaryPath, Color, ItemSize, Particle, PhysicsWorld, RegionBoundary};

/// Slack when comparing the integrator clock against the update interval
const CLOCK_EPSILON: f64 = 1e-9;

/// Center and radius of the simulated disc, in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldGeometry {
    pub center: Vec2,
    pub radius: f32,
}

impl WorldGeometry {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Largest disc that comfortably fits a `width` x `height` viewport
    pub fn fit_to_viewport(width: f32, height: f32) -> Self {
        Self {
            center: Vec2::new(width / 2.0, height / 2.0),
            radius: VIEWPORT_FILL * width.min(height) / 2.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.center.is_finite() && self.radius.is_finite() && self.radius > 0.0
    }
}

/// Notifications delivered to engine observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Particles moved; at most one per update interval
    StateUpdated,
    /// The particle set was rebuilt
    Regenerated { particles: usize },
}

/// Frozen copy of one particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleSnapshot {
    pub position: Vec2,
    pub radius: f32,
    pub angle: f32,
    pub color: Color,
}

/// Point-in-time copy of everything a renderer needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub num_regions: u32,
    pub region_angle: f32,
    pub world_center: Vec2,
    pub world_radius: f32,
    /// Particle diameter
    pub item_size: f32,
    pub particles: Vec<ParticleSnapshot>,
}

type Observer = Box<dyn FnMut(&EngineEvent)>;

pub struct Engine {
    config: Configuration,
    geometry: Option<WorldGeometry>,
    world: PhysicsWorld,
    item_size: ItemSize,
    rng: Pcg32,
    observers: Vec<Observer>,
    sensor: Option<Box<dyn SensorSource>>,
    sensor_subscribed: bool,
    orientation: InterfaceOrientation,
    /// Integrator time since the last state notification
    since_notify: f64,
    /// Particle moves reported by the world since the last notification
    pending_moves: Rc<Cell<usize>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("geometry", &self.geometry)
            .field("world", &self.world)
            .field("sensor_subscribed", &self.sensor_subscribed)
            .field("orientation", &self.orientation)
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl Engine {
    pub fn new(config: Configuration) -> Self {
        Self::with_seed(config, DEFAULT_SEED)
    }

    /// Engine whose particle placement and colors are reproducible
    pub fn with_seed(config: Configuration, seed: u64) -> Self {
        let mut world = PhysicsWorld::new(
            GravityHandle::default(),
            config.item_elasticity().current(),
        );

        let pending_moves = Rc::new(Cell::new(0));
        let counter = Rc::clone(&pending_moves);
        world.on_particle_moved(move |_, _| counter.set(counter.get() + 1));

        Self {
            item_size: ItemSize::new(config.item_size().current()),
            config,
            geometry: None,
            world,
            rng: Pcg32::seed_from_u64(seed),
            observers: Vec::new(),
            sensor: None,
            sensor_subscribed: false,
            orientation: InterfaceOrientation::default(),
            since_notify: 0.0,
            pending_moves,
        }
    }

    /// Register an observer for engine events
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    fn emit(&mut self, event: EngineEvent) {
        for observer in self.observers.iter_mut() {
            observer(&event);
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn world_geometry(&self) -> Option<WorldGeometry> {
        self.geometry
    }

    pub fn is_running(&self) -> bool {
        self.world.is_running()
    }

    /// Angle of one region, derived from the current region count
    pub fn region_angle(&self) -> f32 {
        self.config.region_angle()
    }

    /// Set the simulated disc. Always rebuilds the particle set.
    ///
    /// Invalid geometry (non-positive or non-finite) leaves the engine
    /// quiescent, as if no geometry had been set.
    pub fn set_world_geometry(&mut self, center: Vec2, radius: f32) {
        let geometry = WorldGeometry::new(center, radius);
        if geometry.is_valid() {
            self.geometry = Some(geometry);
        } else {
            log::warn!("Ignoring invalid world geometry {geometry:?}");
            self.geometry = None;
        }
        self.regenerate();
    }

    /// Apply a new configuration, doing only the work the change requires
    pub fn set_configuration(&mut self, config: Configuration) {
        let change = self.config.diff(&config);
        self.config = config;
        if change.is_empty() {
            return;
        }
        log::debug!("Configuration change: {change:?}");

        if let Some(elasticity) = change.elasticity {
            self.world.set_elasticity(elasticity);
        }
        if let Some(size) = change.item_size {
            self.item_size.set(size);
        }
        if change.update_interval.is_some() {
            self.since_notify = 0.0;
        }
        if change.regenerate {
            self.regenerate();
        }
    }

    /// Edit a copy of the configuration and apply it if the edit succeeds
    pub fn update_configuration<F>(&mut self, edit: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Configuration) -> Result<(), ConfigError>,
    {
        let mut next = self.config.clone();
        edit(&mut next)?;
        self.set_configuration(next);
        Ok(())
    }

    /// Stop, swap in a fresh particle set and boundary, restart if running
    fn regenerate(&mut self) {
        let Some(geometry) = self.geometry else {
            self.stop();
            self.world.set_particles(Vec::new(), None);
            return;
        };

        let num_regions = self.config.num_regions().current();
        let region_angle = self.config.region_angle();
        let count = self.config.num_items_per_region().current() as usize;

        let min_r = SPAWN_MARGIN * geometry.radius;
        let max_r = (1.0 - SPAWN_MARGIN) * geometry.radius;
        let min_theta = SPAWN_MARGIN * region_angle;
        let max_theta = (1.0 - SPAWN_MARGIN) * region_angle;

        let particles: Vec<Particle> = (0..count)
            .map(|_| {
                let r = open_uniform(&mut self.rng, min_r, max_r);
                let theta = open_uniform(&mut self.rng, min_theta, max_theta);
                let color = Color::random(&mut self.rng);
                Particle::new(geometry.center, r, theta, color, self.item_size.clone())
            })
            .collect();

        let boundary = RegionBoundary::new(geometry.center, geometry.radius, region_angle, num_regions);
        self.world.set_particles(particles, Some(boundary));
        self.pending_moves.set(0);
        self.since_notify = 0.0;

        log::info!(
            "Regenerated {count} particles for {num_regions} regions (radius {})",
            geometry.radius
        );
        self.emit(EngineEvent::Regenerated { particles: count });
    }

    /// Start the simulation and the sensor feed. No-op until geometry is set.
    pub fn start(&mut self) {
        if self.world.is_running() {
            return;
        }
        if self.geometry.is_none() {
            log::warn!("Engine::start ignored: world geometry not set");
            return;
        }
        self.world.start();
        self.subscribe_sensor();
        log::info!("Engine started");
    }

    /// Stop the simulation and the sensor feed. Idempotent.
    pub fn stop(&mut self) {
        if !self.world.is_running() {
            return;
        }
        self.world.stop();
        self.unsubscribe_sensor();
        log::info!("Engine stopped");
    }

    /// Install the gravity sensor, replacing any previous one
    pub fn set_sensor(&mut self, sensor: Box<dyn SensorSource>) {
        self.unsubscribe_sensor();
        self.sensor = Some(sensor);
        if self.world.is_running() {
            self.subscribe_sensor();
        }
    }

    fn subscribe_sensor(&mut self) {
        if self.sensor_subscribed {
            return;
        }
        if let Some(sensor) = self.sensor.as_mut() {
            sensor.subscribe(self.world.gravity_handle(), self.orientation);
            self.sensor_subscribed = true;
        }
    }

    fn unsubscribe_sensor(&mut self) {
        if !self.sensor_subscribed {
            return;
        }
        if let Some(sensor) = self.sensor.as_mut() {
            sensor.unsubscribe();
        }
        self.sensor_subscribed = false;
    }

    pub fn interface_orientation(&self) -> InterfaceOrientation {
        self.orientation
    }

    /// Change how device acceleration maps to screen gravity
    pub fn set_interface_orientation(&mut self, orientation: InterfaceOrientation) {
        if self.orientation == orientation {
            return;
        }
        self.orientation = orientation;
        if self.sensor_subscribed {
            self.unsubscribe_sensor();
            self.subscribe_sensor();
        }
    }

    /// Gravity direction in screen space; unit length is normal gravity
    pub fn set_gravity_direction(&self, direction: Vec2) {
        self.world.set_gravity_direction(direction);
    }

    /// Feed a raw device acceleration through the current orientation
    pub fn apply_device_acceleration(&self, acceleration: Vec2) {
        self.world
            .set_gravity_direction(self.orientation.screen_gravity(acceleration));
    }

    /// Handle for sensor threads
    pub fn gravity_handle(&self) -> GravityHandle {
        self.world.gravity_handle()
    }

    /// Advance by `dt` seconds of host time.
    ///
    /// Returns true if a `StateUpdated` notification was emitted.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.world.is_running() {
            return false;
        }

        let before = self.world.elapsed();
        self.world.advance(dt);
        self.since_notify += self.world.elapsed() - before;

        let interval = self.config.update_interval().as_secs_f64();
        if self.since_notify + CLOCK_EPSILON < interval {
            return false;
        }

        // Anything beyond one interval is dropped rather than owed
        self.since_notify = (self.since_notify - interval).max(0.0) % interval;
        if self.pending_moves.replace(0) == 0 {
            return false;
        }
        self.emit(EngineEvent::StateUpdated);
        true
    }

    /// Copy of the current state, or `None` before geometry is set
    pub fn render_snapshot(&self) -> Option<RenderSnapshot> {
        let geometry = self.geometry?;
        let particles = self
            .world
            .particles()
            .iter()
            .map(|p| ParticleSnapshot {
                position: p.position,
                radius: p.radius(),
                angle: p.angle(),
                color: p.color(),
            })
            .collect();

        Some(RenderSnapshot {
            num_regions: self.config.num_regions().current(),
            region_angle: self.config.region_angle(),
            world_center: geometry.center,
            world_radius: geometry.radius,
            item_size: self.item_size.get(),
            particles,
        })
    }

    /// Outline of the elementary region for debug drawing
    pub fn region_boundary_path(&self) -> Option<BoundaryPath> {
        let geometry = self.geometry?;
        Some(crate::sim::region_boundary_path(
            geometry.center,
            geometry.radius,
            self.config.region_angle(),
            self.config.num_regions().current(),
        ))
    }

    /// Radial lines between regions; empty before geometry is set
    pub fn region_guide_lines(&self) -> Vec<(Vec2, Vec2)> {
        match self.geometry {
            Some(geometry) => region_guide_lines(
                geometry.center,
                geometry.radius,
                self.config.num_regions().current(),
                self.config.region_angle(),
            ),
            None => Vec::new(),
        }
    }

    /// Every draw instance of the full kaleidoscope image
    pub fn projected_instances(&self) -> Vec<DrawInstance> {
        self.render_snapshot()
            .map(|snapshot| MirrorProjector::from_snapshot(&snapshot).project(&snapshot))
            .unwrap_or_default()
    }
}

/// Uniform sample strictly inside (lo, hi)
fn open_uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if lo.partial_cmp(&hi) != Some(std::cmp::Ordering::Less) {
        return lo;
    }
    loop {
        let v = rng.random_range(lo..hi);
        if v > lo {
            return v;
        }
    }
}
