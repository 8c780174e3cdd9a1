//! Kaleidoscope projection
//!
//! Maps the particles of the elementary region into every region of the
//! circle. For a particle at polar `(r, θ)` and slot `n`, the mirrored copy
//! sits at `2·αₙ − θ` and the rotated copy at `2·αₙ + θ`.
//!
//! With an even region count, `αₙ = n·regionAngle` over `n < numRegions`.
//! An odd count cannot be tiled that way by the mirrored wedge alone, so the
//! slot count doubles and `αₙ = n·regionAngle/2` over `n < 2·numRegions`.
//! A single region has no mirror and one slot.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::engine::RenderSnapshot;
use crate::polar_to_screen;
use crate::sim::particle::Color;

/// How a draw instance relates to its source particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyKind {
    Rotated,
    Mirrored,
}

/// One circle to draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawInstance {
    pub position: Vec2,
    pub color: Color,
    /// Diameter
    pub size: f32,
    pub kind: CopyKind,
}

/// Pure projection from one region to all regions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorProjector {
    num_regions: u32,
    region_angle: f32,
    center: Vec2,
}

impl MirrorProjector {
    pub fn new(num_regions: u32, region_angle: f32, center: Vec2) -> Self {
        Self {
            num_regions,
            region_angle,
            center,
        }
    }

    pub fn from_snapshot(snapshot: &RenderSnapshot) -> Self {
        Self::new(
            snapshot.num_regions,
            snapshot.region_angle,
            snapshot.world_center,
        )
    }

    #[inline]
    fn is_even(&self) -> bool {
        self.num_regions % 2 == 0
    }

    /// Number of reflection slots
    pub fn slot_count(&self) -> u32 {
        match self.num_regions {
            0 | 1 => 1,
            n if n % 2 == 0 => n,
            n => n.saturating_mul(2),
        }
    }

    /// Draw instances produced for each particle
    pub fn copies_per_particle(&self) -> usize {
        let slots = self.slot_count() as usize;
        if self.num_regions > 1 { slots.saturating_mul(2) } else { slots }
    }

    /// Reflection axis angle for slot `n`
    #[inline]
    pub fn alpha(&self, n: u32) -> f32 {
        if self.is_even() {
            n as f32 * self.region_angle
        } else {
            n as f32 * self.region_angle / 2.0
        }
    }

    /// Angles of every copy of a particle at `theta`, as (angle, kind)
    pub fn copy_angles(&self, theta: f32) -> impl Iterator<Item = (f32, CopyKind)> + '_ {
        let mirrored = self.num_regions > 1;
        (0..self.slot_count()).flat_map(move |n| {
            let two_alpha = 2.0 * self.alpha(n);
            let mirror = mirrored.then_some((two_alpha - theta, CopyKind::Mirrored));
            mirror
                .into_iter()
                .chain(std::iter::once((two_alpha + theta, CopyKind::Rotated)))
        })
    }

    /// Project one particle given by its polar coordinates
    pub fn project_one(&self, r: f32, theta: f32, color: Color, size: f32, out: &mut Vec<DrawInstance>) {
        out.extend(self.copy_angles(theta).map(|(angle, kind)| DrawInstance {
            position: polar_to_screen(self.center, r, angle),
            color,
            size,
            kind,
        }));
    }

    /// Project every particle of a snapshot
    pub fn project(&self, snapshot: &RenderSnapshot) -> Vec<DrawInstance> {
        let mut out = Vec::with_capacity(snapshot.particles.len() * self.copies_per_particle());
        for particle in &snapshot.particles {
            self.project_one(
                particle.radius,
                particle.angle,
                particle.color,
                snapshot.item_size,
                &mut out,
            );
        }
        out
    }
}

/// Radial lines separating the regions, as (center, rim point) pairs.
///
/// Empty for a single region.
pub fn region_guide_lines(
    center: Vec2,
    radius: f32,
    num_regions: u32,
    region_angle: f32,
) -> Vec<(Vec2, Vec2)> {
    if num_regions <= 1 {
        return Vec::new();
    }
    (0..num_regions)
        .map(|n| (center, polar_to_screen(center, radius, n as f32 * region_angle)))
        .collect()
}
