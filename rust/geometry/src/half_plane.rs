// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Half-planes and convex clipping.

use crate::curve::{from_pair, linear_determinant, to_pair};
use crate::tessellation::Tolerance;
use nalgebra::{Matrix3, Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Half extent of the square an unconstrained region is clipped against.
pub const REGION_EXTENT: f64 = 1.0e6;

/// The closed region to the left of a directed line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "HalfPlaneData", into = "HalfPlaneData")]
pub struct HalfPlane {
    pub origin: Point2<f64>,
    pub direction: Vector2<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct HalfPlaneData {
    origin: [f64; 2],
    direction: [f64; 2],
}

impl From<HalfPlaneData> for HalfPlane {
    fn from(d: HalfPlaneData) -> Self {
        HalfPlane::new(from_pair(d.origin), Vector2::new(d.direction[0], d.direction[1]))
    }
}

impl From<HalfPlane> for HalfPlaneData {
    fn from(h: HalfPlane) -> Self {
        HalfPlaneData {
            origin: to_pair(&h.origin),
            direction: [h.direction.x, h.direction.y],
        }
    }
}

impl HalfPlane {
    pub fn new(origin: Point2<f64>, direction: Vector2<f64>) -> Self {
        Self { origin, direction }
    }

    /// Region left of the line running from `a` to `b`.
    pub fn through(a: Point2<f64>, b: Point2<f64>) -> Self {
        Self::new(a, b - a)
    }

    /// Positive inside, negative outside, in model units.
    pub fn signed_distance(&self, p: &Point2<f64>) -> f64 {
        let len = self.direction.norm();
        if len < Tolerance::LENGTH {
            return 0.0;
        }
        let d = p - self.origin;
        (self.direction.x * d.y - self.direction.y * d.x) / len
    }

    #[inline]
    pub fn check(&self, p: &Point2<f64>) -> bool {
        self.signed_distance(p) >= -Tolerance::LENGTH
    }

    /// Maps the boundary line through `m`. A mirroring matrix would move the
    /// region to the right of the mapped direction, so the direction is
    /// flipped to keep the mapped region on the left.
    pub fn transformed(&self, m: &Matrix3<f64>) -> HalfPlane {
        let origin = m.transform_point(&self.origin);
        let mut direction = m.transform_vector(&self.direction);
        if linear_determinant(m) < 0.0 {
            direction = -direction;
        }
        HalfPlane::new(origin, direction)
    }

    /// Where the boundary crosses the segment `a`-`b`.
    fn crossing(&self, a: &Point2<f64>, b: &Point2<f64>) -> Point2<f64> {
        let da = self.signed_distance(a);
        let db = self.signed_distance(b);
        let t = da / (da - db);
        a + (b - a) * t
    }

    /// Sutherland-Hodgman step: keeps the part of `polygon` inside this half-plane.
    pub fn clip_polygon(&self, polygon: &[Point2<f64>]) -> Vec<Point2<f64>> {
        let n = polygon.len();
        let mut out = Vec::with_capacity(n + 2);
        for i in 0..n {
            let current = &polygon[i];
            let next = &polygon[(i + 1) % n];
            let cur_in = self.check(current);
            let next_in = self.check(next);
            if cur_in {
                out.push(*current);
                if !next_in {
                    out.push(self.crossing(current, next));
                }
            } else if next_in {
                out.push(self.crossing(current, next));
            }
        }
        dedup_ring(&mut out);
        out
    }
}

fn dedup_ring(points: &mut Vec<Point2<f64>>) {
    points.dedup_by(|a, b| (*a - *b).norm() <= Tolerance::LENGTH);
    while points.len() > 1 {
        let first = points[0];
        let last = points[points.len() - 1];
        if (first - last).norm() <= Tolerance::LENGTH {
            points.pop();
        } else {
            break;
        }
    }
}

/// Intersection of `half_planes` clipped to the square `[-extent, extent]²`.
///
/// The second value is true when the polygon still touches that square,
/// i.e. the half-planes alone do not bound the region.
pub fn intersect_half_planes(half_planes: &[HalfPlane], extent: f64) -> (Vec<Point2<f64>>, bool) {
    let mut polygon = vec![
        Point2::new(-extent, -extent),
        Point2::new(extent, -extent),
        Point2::new(extent, extent),
        Point2::new(-extent, extent),
    ];
    for hp in half_planes {
        if polygon.len() < 3 {
            break;
        }
        polygon = hp.clip_polygon(&polygon);
    }
    let limit = extent * (1.0 - 1e-9);
    let touches = polygon
        .iter()
        .any(|p| p.x.abs() >= limit || p.y.abs() >= limit);
    (polygon, touches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bool2d::compute_signed_area;
    use approx::assert_relative_eq;

    fn unit_square_hps() -> Vec<HalfPlane> {
        let c = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        (0..4).map(|i| HalfPlane::through(c[i], c[(i + 1) % 4])).collect()
    }

    #[test]
    fn test_check_left_side() {
        let hp = HalfPlane::through(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        assert!(hp.check(&Point2::new(0.5, 1.0)));
        assert!(hp.check(&Point2::new(0.5, 0.0)));
        assert!(!hp.check(&Point2::new(0.5, -0.1)));
    }

    #[test]
    fn test_mirror_keeps_region() {
        let hp = HalfPlane::through(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        let mirror = Matrix3::new(1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0);
        let m = hp.transformed(&mirror);
        // (0.5, 1) was inside; its image (0.5, -1) must be inside the image
        assert!(m.check(&Point2::new(0.5, -1.0)));
        assert!(!m.check(&Point2::new(0.5, 1.0)));
    }

    #[test]
    fn test_intersection_bounded() {
        let (poly, unbounded) = intersect_half_planes(&unit_square_hps(), REGION_EXTENT);
        assert!(!unbounded);
        assert_relative_eq!(compute_signed_area(&poly), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_intersection_unbounded() {
        let hps = &unit_square_hps()[..2];
        let (_, unbounded) = intersect_half_planes(hps, REGION_EXTENT);
        assert!(unbounded);
    }

    #[test]
    fn test_serde_shape() {
        let hp = HalfPlane::through(Point2::new(1.0, 2.0), Point2::new(3.0, 2.0));
        let json = serde_json::to_string(&hp).unwrap();
        assert_eq!(json, r#"{"origin":[1.0,2.0],"direction":[2.0,0.0]}"#);
        let back: HalfPlane = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hp);
    }
}
