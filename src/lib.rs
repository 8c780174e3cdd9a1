//! Kaleido - kaleidoscope simulation core
//!
//! Particles fall and bounce inside one wedge of a circle; their positions are
//! then mirrored and rotated into every region to produce the kaleidoscope image.
//!
//! Core modules:
//! - `range`: Bounds-checked configuration scalars
//! - `config`: Engine configuration and change diffing
//! - `sim`: Particles, region boundary geometry and the physics integrator
//! - `mirror`: Projection of the canonical wedge into all regions
//! - `engine`: Composition root with lifecycle, throttled notifications and snapshots
//! - `sensor`: Gravity direction input from a device sensor
//!
//! All angles use screen coordinates with y pointing down: angle 0 is the +x
//! axis and angles grow counterclockwise as seen on screen, so a point at
//! `(r, θ)` sits at `(cx + r·cos θ, cy − r·sin θ)`.

pub mod config;
pub mod engine;
pub mod error;
pub mod mirror;
pub mod range;
pub mod sensor;
pub mod sim;

pub use config::{ConfigChange, Configuration};
pub use engine::{Engine, EngineEvent, ParticleSnapshot, RenderSnapshot, WorldGeometry};
pub use error::ConfigError;
pub use mirror::{DrawInstance, MirrorProjector, region_guide_lines};
pub use range::ValueInRange;
pub use sensor::{GravityHandle, InterfaceOrientation, SensorSource};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Largest integration step; longer deltas are split into substeps
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per advance to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Acceleration for a unit gravity direction (pixels/s²)
    pub const GRAVITY_MAGNITUDE: f32 = 1000.0;

    /// Fraction of the region kept free on each side when spawning particles
    pub const SPAWN_MARGIN: f32 = 0.25;

    /// World radius as a fraction of half the shortest viewport side
    pub const VIEWPORT_FILL: f32 = 0.95;

    /// Largest region count a configuration may allow
    pub const MAX_REGIONS: u32 = 1024;

    /// Default seed for particle placement and colors
    pub const DEFAULT_SEED: u64 = 0x6b61_6c65_6964_6f73;
}

/// Wrap an angle into [0, 2π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(std::f32::consts::TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= std::f32::consts::TAU {
        0.0
    } else {
        wrapped
    }
}

/// Convert polar (r, theta) around `center` to a screen point (y-down)
#[inline]
pub fn polar_to_screen(center: Vec2, r: f32, theta: f32) -> Vec2 {
    Vec2::new(center.x + r * theta.cos(), center.y - r * theta.sin())
}

/// Convert a screen point to polar (r, theta) around `center`, theta in [0, 2π)
#[inline]
pub fn screen_to_polar(center: Vec2, point: Vec2) -> (f32, f32) {
    let d = point - center;
    (d.length(), wrap_angle((-d.y).atan2(d.x)))
}
