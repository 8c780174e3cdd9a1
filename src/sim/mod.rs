//! Physics simulation of the elementary region
//!
//! Everything here runs on the host's tick callback:
//! - No internal threads or clocks, time arrives as deltas
//! - No rendering dependencies
//! - Gravity is the only input that may be written from another thread

pub mod boundary;
pub mod collision;
pub mod particle;
pub mod world;

pub use boundary::{BoundaryPath, PathElement, RegionBoundary, region_boundary_path};
pub use collision::{CollisionResult, reflect_velocity, resolve_boundary};
pub use particle::{Color, ItemSize, Particle};
pub use world::PhysicsWorld;
