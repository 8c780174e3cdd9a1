//! Region boundary geometry
//!
//! The elementary region is either the whole disc (one region) or a wedge
//! between angle 0 and the region angle. The same shape serves as the
//! collision boundary and as a debug overlay path.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::polar_to_screen;

/// One drawing command of a boundary path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathElement {
    MoveTo(Vec2),
    LineTo(Vec2),
    /// Arc around `center`, sweeping with increasing angle (counterclockwise
    /// on screen) from `start_angle` to `end_angle`
    Arc {
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
    },
    Close,
}

/// Closed outline of the elementary region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPath {
    pub elements: Vec<PathElement>,
}

impl BoundaryPath {
    /// Total angle swept by the path's arcs
    pub fn arc_span(&self) -> f32 {
        self.elements
            .iter()
            .map(|e| match e {
                PathElement::Arc {
                    start_angle,
                    end_angle,
                    ..
                } => end_angle - start_angle,
                _ => 0.0,
            })
            .sum()
    }

    /// Whether the path has straight edges to the center
    pub fn is_full_circle(&self) -> bool {
        !self
            .elements
            .iter()
            .any(|e| matches!(e, PathElement::LineTo(_)))
    }

    /// Flatten into a polyline; each arc contributes `arc_points` samples
    pub fn sample_points(&self, arc_points: usize) -> Vec<Vec2> {
        let mut points = Vec::new();
        let mut start = None;

        for element in &self.elements {
            match *element {
                PathElement::MoveTo(p) => {
                    start = Some(p);
                    points.push(p);
                }
                PathElement::LineTo(p) => points.push(p),
                PathElement::Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                } => {
                    let span = end_angle - start_angle;
                    points.extend((0..arc_points).map(|i| {
                        let t = i as f32 / arc_points.saturating_sub(1).max(1) as f32;
                        polar_to_screen(center, radius, start_angle + t * span)
                    }));
                }
                PathElement::Close => {
                    if let Some(p) = start {
                        points.push(p);
                    }
                }
            }
        }
        points
    }
}

/// Collision shape of the elementary region
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionBoundary {
    /// The whole disc (single region)
    Circle { center: Vec2, radius: f32 },
    /// Wedge from angle 0 to `angle`, apex at `center`
    Wedge { center: Vec2, radius: f32, angle: f32 },
}

impl RegionBoundary {
    pub fn new(center: Vec2, radius: f32, region_angle: f32, num_regions: u32) -> Self {
        if num_regions <= 1 {
            RegionBoundary::Circle { center, radius }
        } else {
            RegionBoundary::Wedge {
                center,
                radius,
                angle: region_angle,
            }
        }
    }

    pub fn center(&self) -> Vec2 {
        match *self {
            RegionBoundary::Circle { center, .. } | RegionBoundary::Wedge { center, .. } => center,
        }
    }

    pub fn radius(&self) -> f32 {
        match *self {
            RegionBoundary::Circle { radius, .. } | RegionBoundary::Wedge { radius, .. } => radius,
        }
    }

    /// Straight edges as (unit direction from the center, inward normal)
    pub fn edges(&self) -> Option<[(Vec2, Vec2); 2]> {
        match *self {
            RegionBoundary::Circle { .. } => None,
            RegionBoundary::Wedge { angle, .. } => {
                let (sin, cos) = angle.sin_cos();
                Some([
                    (Vec2::new(1.0, 0.0), Vec2::new(0.0, -1.0)),
                    (Vec2::new(cos, -sin), Vec2::new(sin, cos)),
                ])
            }
        }
    }

    /// Whether `point` lies inside the region (edges included)
    pub fn contains_point(&self, point: Vec2) -> bool {
        let offset = point - self.center();
        if offset.length() > self.radius() {
            return false;
        }
        match self.edges() {
            None => true,
            Some(edges) => edges.iter().all(|(_, normal)| offset.dot(*normal) >= 0.0),
        }
    }

    /// Nearest point of the region to `point`
    pub fn clamp_point(&self, point: Vec2) -> Vec2 {
        let center = self.center();
        let radius = self.radius();
        let offset = point - center;

        let Some(edges) = self.edges() else {
            return center + offset.clamp_length_max(radius);
        };
        if edges.iter().all(|(_, normal)| offset.dot(*normal) >= 0.0) {
            return center + offset.clamp_length_max(radius);
        }

        // Outside the sector: the nearest point lies on one of the edges
        edges
            .iter()
            .map(|(direction, _)| *direction * offset.dot(*direction).clamp(0.0, radius))
            .min_by(|a, b| {
                a.distance_squared(offset)
                    .total_cmp(&b.distance_squared(offset))
            })
            .map_or(point, |nearest| center + nearest)
    }

    /// Outline of this region
    pub fn path(&self) -> BoundaryPath {
        match *self {
            RegionBoundary::Circle { center, radius } => BoundaryPath {
                elements: vec![
                    PathElement::MoveTo(polar_to_screen(center, radius, 0.0)),
                    PathElement::Arc {
                        center,
                        radius,
                        start_angle: 0.0,
                        end_angle: std::f32::consts::TAU,
                    },
                    PathElement::Close,
                ],
            },
            RegionBoundary::Wedge {
                center,
                radius,
                angle,
            } => BoundaryPath {
                elements: vec![
                    PathElement::MoveTo(center),
                    PathElement::LineTo(polar_to_screen(center, radius, 0.0)),
                    PathElement::Arc {
                        center,
                        radius,
                        start_angle: 0.0,
                        end_angle: angle,
                    },
                    PathElement::LineTo(center),
                    PathElement::Close,
                ],
            },
        }
    }
}

/// Boundary path of one elementary region.
///
/// A full circle for a single region, otherwise the wedge
/// center → (radius, 0) → arc to `region_angle` → center.
pub fn region_boundary_path(
    center: Vec2,
    radius: f32,
    region_angle: f32,
    num_regions: u32,
) -> BoundaryPath {
    RegionBoundary::new(center, radius, region_angle, num_regions).path()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, TAU};

    #[test]
    fn test_single_region_is_full_circle() {
        let center = Vec2::new(50.0, 60.0);
        let path = region_boundary_path(center, 40.0, TAU, 1);
        assert!(path.is_full_circle());
        assert!((path.arc_span() - TAU).abs() < 1e-6);
        assert!(path.elements.contains(&PathElement::Arc {
            center,
            radius: 40.0,
            start_angle: 0.0,
            end_angle: TAU,
        }));

        for p in path.sample_points(16) {
            assert!(((p - center).length() - 40.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_quarter_wedge() {
        let center = Vec2::new(100.0, 100.0);
        let path = region_boundary_path(center, 80.0, FRAC_PI_2, 4);
        assert!(!path.is_full_circle());
        assert!((path.arc_span() - FRAC_PI_2).abs() < 1e-6);

        // Both straight edges meet at the center
        assert_eq!(path.elements[0], PathElement::MoveTo(center));
        assert_eq!(path.elements[1], PathElement::LineTo(Vec2::new(180.0, 100.0)));
        assert_eq!(path.elements[3], PathElement::LineTo(center));

        // The arc ends straight above the center on screen
        let points = path.sample_points(9);
        let arc_end = points[points.len() - 3];
        assert!((arc_end - Vec2::new(100.0, 20.0)).length() < 1e-3);
    }

    #[test]
    fn test_wedge_contains() {
        let boundary = RegionBoundary::new(Vec2::ZERO, 100.0, FRAC_PI_2, 4);
        // Up-right quadrant on screen is x > 0, y < 0
        assert!(boundary.contains_point(Vec2::new(30.0, -30.0)));
        assert!(!boundary.contains_point(Vec2::new(30.0, 30.0)));
        assert!(!boundary.contains_point(Vec2::new(-30.0, -30.0)));
        assert!(!boundary.contains_point(Vec2::new(90.0, -90.0)));
    }

    #[test]
    fn test_clamp_point() {
        let boundary = RegionBoundary::new(Vec2::ZERO, 100.0, FRAC_PI_2, 4);

        let inside = Vec2::new(30.0, -30.0);
        assert_eq!(boundary.clamp_point(inside), inside);

        // Below the base edge snaps straight up onto it
        let below = boundary.clamp_point(Vec2::new(40.0, 7.0));
        assert!((below - Vec2::new(40.0, 0.0)).length() < 1e-4);

        // Left of the vertical edge snaps onto it
        let left = boundary.clamp_point(Vec2::new(-5.0, -20.0));
        assert!((left - Vec2::new(0.0, -20.0)).length() < 1e-4);

        // Behind the apex snaps to the apex
        assert!(boundary.clamp_point(Vec2::new(-10.0, 10.0)).length() < 1e-4);

        // Beyond the rim inside the sector
        let far = boundary.clamp_point(Vec2::new(300.0, -400.0));
        assert!((far.length() - 100.0).abs() < 1e-3);

        let circle = RegionBoundary::new(Vec2::ZERO, 50.0, TAU, 1);
        assert!((circle.clamp_point(Vec2::new(0.0, 80.0)) - Vec2::new(0.0, 50.0)).length() < 1e-4);
    }

    #[test]
    fn test_edge_normals_point_inside() {
        let boundary = RegionBoundary::new(Vec2::ZERO, 100.0, TAU / 3.0, 3);
        let inside = crate::polar_to_screen(Vec2::ZERO, 50.0, TAU / 6.0);
        for (direction, normal) in boundary.edges().unwrap() {
            assert!(direction.dot(normal).abs() < 1e-6);
            assert!(inside.dot(normal) > 0.0);
        }
    }
}
