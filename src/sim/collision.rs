//! Collision detection and response against the region boundary
//!
//! Particles are discs. The boundary is the outer rim (inward-facing circle)
//! plus, for wedges, two straight edges through the center. Response reflects
//! the normal velocity component scaled by the elasticity; values above 1 add
//! energy on every bounce.

use glam::Vec2;

use super::boundary::RegionBoundary;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Surface normal at collision (pointing back into the region)
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check a disc against the outer rim
pub fn rim_collision(pos: Vec2, radius: f32, center: Vec2, rim_radius: f32) -> CollisionResult {
    let offset = pos - center;
    let r = offset.length();

    if r + radius > rim_radius && r > f32::EPSILON {
        return CollisionResult {
            hit: true,
            normal: -offset / r,
            penetration: r + radius - rim_radius,
        };
    }

    CollisionResult::miss()
}

/// Check a disc against a straight wedge edge given by its inward normal
pub fn edge_collision(pos: Vec2, radius: f32, center: Vec2, inward_normal: Vec2) -> CollisionResult {
    let distance = (pos - center).dot(inward_normal);

    if distance < radius {
        return CollisionResult {
            hit: true,
            normal: inward_normal,
            penetration: radius - distance,
        };
    }

    CollisionResult::miss()
}

/// Correction passes per disc before falling back to clamping its center
const BOUNDARY_PASSES: usize = 4;
/// Penetration below this is rounding noise from a previous correction
const CONTACT_SLOP: f32 = 1e-4;

/// Push a disc back inside the boundary and reflect its velocity.
///
/// Each surface is tested against the position left by the previous
/// correction, so a push out of one edge is seen by the next. If the disc
/// still overlaps after `BOUNDARY_PASSES` (it cannot fit near the apex), its
/// center is clamped into the region. Returns the number of contacts resolved.
pub fn resolve_boundary(
    pos: &mut Vec2,
    vel: &mut Vec2,
    radius: f32,
    boundary: &RegionBoundary,
    elasticity: f32,
) -> usize {
    let center = boundary.center();
    let mut resolved = 0;

    for _ in 0..BOUNDARY_PASSES {
        let before = resolved;

        let rim = rim_collision(*pos, radius, center, boundary.radius());
        if rim.hit && rim.penetration > CONTACT_SLOP {
            *pos += rim.normal * rim.penetration;
            *vel = reflect_velocity(*vel, rim.normal, elasticity);
            resolved += 1;
        }

        if let Some(edges) = boundary.edges() {
            for (_, normal) in edges {
                let edge = edge_collision(*pos, radius, center, normal);
                if edge.hit && edge.penetration > CONTACT_SLOP {
                    *pos += edge.normal * edge.penetration;
                    *vel = reflect_velocity(*vel, edge.normal, elasticity);
                    resolved += 1;
                }
            }
        }

        if resolved == before {
            return resolved;
        }
    }

    *pos = boundary.clamp_point(*pos);
    resolved
}

/// Reflect velocity off a surface: v' = v - (1 + e)(v·n)n.
///
/// Only velocity heading into the surface is changed.
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2, elasticity: f32) -> Vec2 {
    let vn = velocity.dot(normal);
    if vn < 0.0 {
        velocity - (1.0 + elasticity) * vn * normal
    } else {
        velocity
    }
}

/// Resolve a contact between two equal-mass discs in place.
///
/// Returns true if the discs overlapped.
pub fn resolve_pair(
    pos_a: &mut Vec2,
    vel_a: &mut Vec2,
    pos_b: &mut Vec2,
    vel_b: &mut Vec2,
    radius: f32,
    elasticity: f32,
) -> bool {
    let delta = *pos_b - *pos_a;
    let dist = delta.length();
    let min_dist = 2.0 * radius;

    if dist >= min_dist || dist <= f32::EPSILON {
        return false;
    }

    let normal = delta / dist;
    let correction = normal * ((min_dist - dist) / 2.0);
    *pos_a -= correction;
    *pos_b += correction;

    let approaching = (*vel_b - *vel_a).dot(normal);
    if approaching < 0.0 {
        let impulse = -(1.0 + elasticity) * approaching / 2.0;
        *vel_a -= impulse * normal;
        *vel_b += impulse * normal;
    }

    true
}
