// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Boolean Operations on polygons with holes
//!
//! Thin layer over the i_overlay crate. Unlike a single-profile subtraction,
//! every operation here returns all resulting shapes, because splitting a
//! floor along a wall legitimately yields several pieces.

use crate::polygon::Polygon2;
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

/// Minimum area threshold - polygons smaller than this are considered degenerate
const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Subtract every clip polygon from `subject`.
pub fn difference(subject: &Polygon2, clips: &[Polygon2]) -> Vec<Polygon2> {
    let clip: Vec<Vec<[f64; 2]>> = clips
        .iter()
        .filter(|c| c.outer.len() >= 3)
        .flat_map(polygon_to_paths)
        .collect();
    if clip.is_empty() {
        return if subject.is_valid() {
            vec![subject.clone()]
        } else {
            Vec::new()
        };
    }
    overlay(subject, &clip, OverlayRule::Difference)
}

/// Parts of `a` also covered by `b`.
pub fn intersection(a: &Polygon2, b: &Polygon2) -> Vec<Polygon2> {
    if a.outer.len() < 3 || b.outer.len() < 3 {
        return Vec::new();
    }
    overlay(a, &polygon_to_paths(b), OverlayRule::Intersect)
}

/// Merge all polygons into the smallest set of disjoint shapes.
pub fn union(polygons: &[Polygon2]) -> Vec<Polygon2> {
    let valid: Vec<&Polygon2> = polygons.iter().filter(|p| p.outer.len() >= 3).collect();
    match valid.len() {
        0 => Vec::new(),
        1 => vec![valid[0].clone()],
        _ => {
            let clip: Vec<Vec<[f64; 2]>> =
                valid[1..].iter().flat_map(|p| polygon_to_paths(p)).collect();
            overlay(valid[0], &clip, OverlayRule::Union)
        }
    }
}

/// Area shared by `a` and `b`.
pub fn overlap_area(a: &Polygon2, b: &Polygon2) -> f64 {
    intersection(a, b).iter().map(Polygon2::area).sum()
}

/// Outer rings are counter-clockwise and holes clockwise, so NonZero keeps
/// overlapping clip shapes filled where EvenOdd would cancel them out.
#[allow(clippy::ptr_arg)]
fn overlay(subject: &Polygon2, clip: &Vec<Vec<[f64; 2]>>, rule: OverlayRule) -> Vec<Polygon2> {
    let subject = polygon_to_paths(subject);
    // Result is Vec<Vec<Vec<[f64; 2]>>> - Vec of shapes, each shape is Vec of contours
    let result = subject.overlay(clip, rule, FillRule::NonZero);
    shapes_to_polygons(&result)
}

/// Check if a contour is valid (has area, not degenerate)
pub fn is_valid_contour(contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    let area = compute_signed_area(contour).abs();
    area > MIN_AREA_THRESHOLD
}

/// Compute the signed area of a 2D contour
/// Positive = counter-clockwise, Negative = clockwise
pub fn compute_signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }

    area * 0.5
}

/// Ensure contour has counter-clockwise winding (positive area)
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if compute_signed_area(contour) < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Ensure contour has clockwise winding (for holes)
pub fn ensure_cw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if compute_signed_area(contour) > 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Remove duplicate and collinear vertices.
pub fn simplify_contour(contour: &[Point2<f64>], epsilon: f64) -> Vec<Point2<f64>> {
    let mut points: Vec<Point2<f64>> = contour.to_vec();
    points.dedup_by(|a, b| (*a - *b).norm() <= epsilon);
    while points.len() > 1 && (points[0] - points[points.len() - 1]).norm() <= epsilon {
        points.pop();
    }
    if points.len() <= 3 {
        return points;
    }

    // Collinear removal can expose new collinear runs; repeat until stable
    loop {
        let n = points.len();
        let mut result = Vec::with_capacity(n);
        for i in 0..n {
            let prev = &points[(i + n - 1) % n];
            let curr = &points[i];
            let next = &points[(i + 1) % n];

            let cross =
                (curr.x - prev.x) * (next.y - prev.y) - (curr.y - prev.y) * (next.x - prev.x);
            let span = (next - prev).norm().max(epsilon);

            // Keep the vertex when it deviates from the prev-next chord
            if (cross / span).abs() > epsilon {
                result.push(*curr);
            }
        }
        if result.len() < 3 {
            return points;
        }
        if result.len() == n {
            return result;
        }
        points = result;
    }
}

/// Check if a point is inside a contour using ray casting
pub fn point_in_contour(point: &Point2<f64>, contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = contour.len();

    let mut j = n - 1;
    for i in 0..n {
        let pi = &contour[i];
        let pj = &contour[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

// ============================================================================
// Internal Helper Functions
// ============================================================================

fn polygon_to_paths(polygon: &Polygon2) -> Vec<Vec<[f64; 2]>> {
    let mut paths = Vec::with_capacity(1 + polygon.holes.len());
    paths.push(contour_to_path(&ensure_ccw(&polygon.outer)));
    for hole in &polygon.holes {
        if hole.len() >= 3 {
            paths.push(contour_to_path(&ensure_cw(hole)));
        }
    }
    paths
}

fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

/// i_overlay returns shapes whose first contour is the outer boundary and
/// whose remaining contours are holes.
fn shapes_to_polygons(shapes: &[Vec<Vec<[f64; 2]>>]) -> Vec<Polygon2> {
    let mut out = Vec::with_capacity(shapes.len());
    for shape in shapes {
        let Some(first) = shape.first() else {
            continue;
        };
        let outer: Vec<Point2<f64>> = first.iter().map(|p| Point2::new(p[0], p[1])).collect();
        if !is_valid_contour(&outer) {
            continue;
        }
        let holes: Vec<Vec<Point2<f64>>> = shape
            .iter()
            .skip(1)
            .map(|c| c.iter().map(|p| Point2::new(p[0], p[1])).collect::<Vec<_>>())
            .filter(|h| is_valid_contour(h))
            .collect();
        out.push(Polygon2::with_holes(outer, holes));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon2 {
        Polygon2::rectangle(Point2::new(x0, y0), Point2::new(x0 + size, y0 + size))
    }

    #[test]
    fn test_compute_signed_area_cw() {
        let contour = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
        ];
        assert_relative_eq!(compute_signed_area(&contour), -1.0);
        assert!(compute_signed_area(&ensure_ccw(&contour)) > 0.0);
    }

    #[test]
    fn test_difference_makes_hole() {
        let result = difference(&square(0.0, 0.0, 10.0), &[square(4.0, 4.0, 2.0)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].holes.len(), 1);
        assert_relative_eq!(result[0].area(), 96.0, epsilon = 1e-6);
    }

    #[test]
    fn test_difference_splits() {
        let strip = Polygon2::rectangle(Point2::new(4.9, -1.0), Point2::new(5.1, 11.0));
        let result = difference(&square(0.0, 0.0, 10.0), &[strip]);
        assert_eq!(result.len(), 2);
        let total: f64 = result.iter().map(Polygon2::area).sum();
        assert_relative_eq!(total, 98.0, epsilon = 1e-6);
    }

    #[test]
    fn test_intersection_and_union() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        assert_relative_eq!(overlap_area(&a, &b), 1.0, epsilon = 1e-6);
        let u = union(&[a, b]);
        assert_eq!(u.len(), 1);
        assert_relative_eq!(u[0].area(), 7.0, epsilon = 1e-6);
    }

    #[test]
    fn test_point_in_contour() {
        let poly = square(0.0, 0.0, 10.0);
        assert!(point_in_contour(&Point2::new(5.0, 5.0), &poly.outer));
        assert!(!point_in_contour(&Point2::new(15.0, 5.0), &poly.outer));
    }

    #[test]
    fn test_simplify_contour() {
        let contour = vec![
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        assert_eq!(simplify_contour(&contour, 1e-6).len(), 4);
    }
}
