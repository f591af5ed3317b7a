// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Skeleton splitting with sliver clean-up
//!
//! The first skeleton pass can leave thin leftovers between cuts. Those are
//! merged into the neighbour they share the most boundary with, and the
//! merged cells are split again with sliver-producing cuts forbidden.

use crate::config::ExtractorConfig;
use crate::skeleton::split_polygon;
use plankit_geometry::bool2d::{simplify_contour, union};
use plankit_geometry::{Line2d, Polygon2, Tolerance};

/// Distance under which two edges count as lying on the same line
const SHARED_EDGE_TOLERANCE: f64 = 1e-6;

pub fn split_polygon_multi(polygon: &Polygon2, config: &ExtractorConfig) -> Vec<Polygon2> {
    let first = split_polygon(polygon, config, None);
    let merged = merge_slivers(first, config.sliver_area);
    merged
        .iter()
        .flat_map(|cell| split_polygon(cell, config, Some(config.sliver_area)))
        .collect()
}

/// Repeatedly folds the smallest cell below `sliver_area` into its longest
/// shared-boundary neighbour. Slivers with no neighbour stay as they are.
pub fn merge_slivers(mut cells: Vec<Polygon2>, sliver_area: f64) -> Vec<Polygon2> {
    let mut isolated = vec![false; cells.len()];
    loop {
        let sliver = cells
            .iter()
            .enumerate()
            .filter(|(i, c)| !isolated[*i] && c.area() < sliver_area)
            .min_by(|a, b| a.1.area().total_cmp(&b.1.area()))
            .map(|(i, _)| i);
        let Some(s) = sliver else {
            break;
        };

        let neighbour = cells
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != s)
            .map(|(i, c)| (i, shared_boundary_length(&cells[s], c)))
            .filter(|(_, len)| *len > Tolerance::LENGTH)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);

        let merged = neighbour.and_then(|n| {
            let mut parts = union(&[cells[n].clone(), cells[s].clone()]);
            if parts.len() == 1 {
                parts.pop().map(|p| (n, p))
            } else {
                None
            }
        });

        match merged {
            Some((n, mut joined)) => {
                joined.outer = simplify_contour(&joined.outer, Tolerance::LENGTH);
                tracing::debug!(sliver = s, into = n, "merged sliver cell");
                cells[n] = joined;
                cells.remove(s);
                isolated.remove(s);
            }
            None => isolated[s] = true,
        }
    }
    cells
}

/// Total length over which the boundaries of `a` and `b` run together.
pub fn shared_boundary_length(a: &Polygon2, b: &Polygon2) -> f64 {
    let b_edges = b.all_edges();
    a.all_edges()
        .iter()
        .map(|ea| b_edges.iter().map(|eb| collinear_overlap(ea, eb)).sum::<f64>())
        .sum()
}

fn collinear_overlap(a: &Line2d, b: &Line2d) -> f64 {
    let len = a.length();
    if len <= Tolerance::LENGTH || b.length() <= Tolerance::LENGTH {
        return 0.0;
    }
    let dir = a.direction() / len;
    let off = |p: &nalgebra::Point2<f64>| dir.perp(&(p - a.start)).abs();
    if off(&b.start) > SHARED_EDGE_TOLERANCE || off(&b.end) > SHARED_EDGE_TOLERANCE {
        return 0.0;
    }
    let t0 = (b.start - a.start).dot(&dir);
    let t1 = (b.end - a.start).dot(&dir);
    let lo = t0.min(t1).max(0.0);
    let hi = t0.max(t1).min(len);
    (hi - lo).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon2 {
        Polygon2::rectangle(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    #[test]
    fn test_shared_boundary() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(2.0, 1.0, 4.0, 5.0);
        assert_relative_eq!(shared_boundary_length(&a, &b), 1.0, epsilon = 1e-12);
        assert_relative_eq!(shared_boundary_length(&a, &rect(5.0, 0.0, 6.0, 1.0)), 0.0);
    }

    #[test]
    fn test_sliver_goes_to_longest_neighbour() {
        let cells = vec![
            rect(0.0, 0.0, 4.0, 3.0),
            rect(0.0, 3.0, 4.0, 3.2),
            rect(4.0, 3.0, 6.0, 6.0),
        ];
        let merged = merge_slivers(cells, 1.0);
        assert_eq!(merged.len(), 2);
        assert_relative_eq!(merged[0].area(), 12.8, epsilon = 1e-6);
        assert_eq!(merged[0].outer.len(), 4);
    }

    #[test]
    fn test_isolated_sliver_kept() {
        let cells = vec![rect(0.0, 0.0, 4.0, 3.0), rect(10.0, 10.0, 10.5, 10.5)];
        assert_eq!(merge_slivers(cells, 1.0).len(), 2);
    }

    #[test]
    fn test_multi_avoids_thin_arm() {
        // The shortest cut would leave a 0.4 x 2 arm below the sliver area
        let floor = Polygon2::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(6.0, 0.0),
            Point2::new(6.0, 2.0),
            Point2::new(0.4, 2.0),
            Point2::new(0.4, 4.0),
            Point2::new(0.0, 4.0),
        ]);
        let config = ExtractorConfig::default();
        assert!(split_polygon(&floor, &config, None)
            .iter()
            .any(|c| c.area() < config.sliver_area));

        let cells = split_polygon_multi(&floor, &config);
        assert_eq!(cells.len(), 2);
        let total: f64 = cells.iter().map(Polygon2::area).sum();
        assert_relative_eq!(total, 12.8, epsilon = 1e-6);
        assert!(cells.iter().all(|c| c.area() >= config.sliver_area));
    }
}
