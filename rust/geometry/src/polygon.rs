// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D polygon with holes, the exchange format between wires and the
//! polygon booleans.

use crate::bool2d::{compute_signed_area, ensure_ccw, ensure_cw, point_in_contour};
use crate::bounds::Bounds2;
use crate::curve::Line2d;
use crate::tessellation::Tessellation;
use crate::wire::Wire;
use nalgebra::Point2;

/// Polygon with optional holes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon2 {
    /// Outer boundary (counter-clockwise)
    pub outer: Vec<Point2<f64>>,
    /// Holes (clockwise)
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Polygon2 {
    /// Create a polygon, normalizing winding of the outer ring.
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer: ensure_ccw(&outer),
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outer: Vec<Point2<f64>>, holes: Vec<Vec<Point2<f64>>>) -> Self {
        Self {
            outer: ensure_ccw(&outer),
            holes: holes.iter().map(|h| ensure_cw(h)).collect(),
        }
    }

    /// Axis-aligned rectangle from two corners.
    pub fn rectangle(min: Point2<f64>, max: Point2<f64>) -> Self {
        Self::new(vec![
            min,
            Point2::new(max.x, min.y),
            max,
            Point2::new(min.x, max.y),
        ])
    }

    /// Discretizes an outer wire and hole wires.
    pub fn from_wires(outer: &Wire, holes: &[Wire], tessellation: &Tessellation) -> Self {
        Self::with_holes(
            outer.discrete_points(tessellation),
            holes
                .iter()
                .map(|h| h.discrete_points(tessellation))
                .collect(),
        )
    }

    /// Net area: outer minus holes.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| compute_signed_area(h).abs()).sum();
        compute_signed_area(&self.outer).abs() - holes
    }

    /// Inside the outer ring and outside every hole.
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        point_in_contour(p, &self.outer) && !self.holes.iter().any(|h| point_in_contour(p, h))
    }

    pub fn bounds(&self) -> Bounds2 {
        Bounds2::from_points(self.outer.iter())
    }

    pub fn is_valid(&self) -> bool {
        self.outer.len() >= 3 && self.area() > crate::tessellation::Tolerance::AREA
    }

    /// Edges of the outer ring, in ring order.
    pub fn outer_edges(&self) -> impl Iterator<Item = Line2d> + '_ {
        let n = self.outer.len();
        (0..n).map(move |i| Line2d::new(self.outer[i], self.outer[(i + 1) % n]))
    }

    /// Edges of the outer ring and all holes.
    pub fn all_edges(&self) -> Vec<Line2d> {
        let mut edges: Vec<Line2d> = self.outer_edges().collect();
        for hole in &self.holes {
            let n = hole.len();
            edges.extend((0..n).map(|i| Line2d::new(hole[i], hole[(i + 1) % n])));
        }
        edges
    }

    /// Smallest distance from `p` to any boundary edge.
    pub fn boundary_distance(&self, p: &Point2<f64>) -> f64 {
        self.all_edges()
            .iter()
            .map(|e| e.distance_to(p))
            .fold(f64::INFINITY, f64::min)
    }

    /// Area-weighted centroid of the outer ring.
    pub fn centroid(&self) -> Point2<f64> {
        let n = self.outer.len();
        let a = compute_signed_area(&self.outer);
        if n < 3 || a.abs() < crate::tessellation::Tolerance::AREA {
            return self.bounds().center();
        }
        let (mut cx, mut cy) = (0.0, 0.0);
        for i in 0..n {
            let p = self.outer[i];
            let q = self.outer[(i + 1) % n];
            let cross = p.x * q.y - q.x * p.y;
            cx += (p.x + q.x) * cross;
            cy += (p.y + q.y) * cross;
        }
        Point2::new(cx / (6.0 * a), cy / (6.0 * a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_area_with_hole() {
        let poly = Polygon2::with_holes(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 4.0),
                Point2::new(0.0, 4.0),
            ],
            vec![vec![
                Point2::new(1.0, 1.0),
                Point2::new(2.0, 1.0),
                Point2::new(2.0, 2.0),
                Point2::new(1.0, 2.0),
            ]],
        );
        assert_relative_eq!(poly.area(), 15.0);
        assert!(compute_signed_area(&poly.holes[0]) < 0.0);
        assert!(!poly.contains(&Point2::new(1.5, 1.5)));
        assert!(poly.contains(&Point2::new(3.0, 3.0)));
    }

    #[test]
    fn test_centroid() {
        let poly = Polygon2::rectangle(Point2::new(0.0, 0.0), Point2::new(4.0, 2.0));
        let c = poly.centroid();
        assert_relative_eq!(c.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(c.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_boundary_distance() {
        let poly = Polygon2::rectangle(Point2::new(0.0, 0.0), Point2::new(4.0, 2.0));
        assert_relative_eq!(poly.boundary_distance(&Point2::new(1.0, 0.5)), 0.5);
    }
}
