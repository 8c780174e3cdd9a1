//! Particles and their shared attributes

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{polar_to_screen, screen_to_polar};

/// RGBA color, components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Uniformly random opaque color
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::rgb(rng.random(), rng.random(), rng.random())
    }
}

/// Item size shared by every particle of the engine.
///
/// Cloning shares the cell, so a size change is seen by all holders at once.
#[derive(Debug, Clone)]
pub struct ItemSize(Rc<Cell<f32>>);

impl ItemSize {
    pub fn new(size: f32) -> Self {
        Self(Rc::new(Cell::new(size)))
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.0.get()
    }

    pub fn set(&self, size: f32) {
        self.0.set(size);
    }
}

/// A simulated body inside the elementary region
#[derive(Debug, Clone)]
pub struct Particle {
    world_center: Vec2,
    /// Screen-space position, moved by the integrator
    pub position: Vec2,
    pub velocity: Vec2,
    color: Color,
    size: ItemSize,
}

impl Particle {
    /// Place a particle at polar `(r, theta)` around `world_center`, at rest
    pub fn new(world_center: Vec2, r: f32, theta: f32, color: Color, size: ItemSize) -> Self {
        Self {
            world_center,
            position: polar_to_screen(world_center, r, theta),
            velocity: Vec2::ZERO,
            color,
            size,
        }
    }

    #[inline]
    pub fn world_center(&self) -> Vec2 {
        self.world_center
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Diameter, read from the shared size at call time
    #[inline]
    pub fn size(&self) -> f32 {
        self.size.get()
    }

    /// Collision radius (half the size)
    #[inline]
    pub fn collision_radius(&self) -> f32 {
        self.size() / 2.0
    }

    /// Distance from the world center
    #[inline]
    pub fn radius(&self) -> f32 {
        (self.position - self.world_center).length()
    }

    /// Angle around the world center in [0, 2π), y-down convention
    #[inline]
    pub fn angle(&self) -> f32 {
        screen_to_polar(self.world_center, self.position).1
    }
}
