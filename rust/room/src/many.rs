// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cutting a floor along partition lines

use crate::types::segment_strip;
use plankit_geometry::bool2d::difference;
use plankit_geometry::{Line2d, Polygon2};

/// Subtracts a `width` wide strip along every partition line. Lines are
/// extended by `width` at both ends so a line drawn up to the boundary
/// still cuts through it.
pub fn cut_by_partitions(polygon: &Polygon2, partitions: &[Line2d], width: f64) -> Vec<Polygon2> {
    let strips: Vec<Polygon2> = partitions
        .iter()
        .filter_map(|l| segment_strip(l.start, l.end, width, width))
        .collect();
    if strips.is_empty() {
        return vec![polygon.clone()];
    }
    let pieces = difference(polygon, &strips);
    tracing::debug!(partitions = strips.len(), pieces = pieces.len(), "partition cut");
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    #[test]
    fn test_cross_partitions_make_four_pieces() {
        let floor = Polygon2::rectangle(Point2::new(0.0, 0.0), Point2::new(4.0, 4.0));
        let lines = [
            Line2d::new(Point2::new(0.0, 2.0), Point2::new(4.0, 2.0)),
            Line2d::new(Point2::new(2.0, 0.0), Point2::new(2.0, 4.0)),
        ];
        let pieces = cut_by_partitions(&floor, &lines, 1e-3);
        assert_eq!(pieces.len(), 4);
        for piece in &pieces {
            assert_relative_eq!(piece.area(), 4.0, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_short_partition_does_not_split() {
        let floor = Polygon2::rectangle(Point2::new(0.0, 0.0), Point2::new(4.0, 4.0));
        let lines = [Line2d::new(Point2::new(1.0, 2.0), Point2::new(3.0, 2.0))];
        assert_eq!(cut_by_partitions(&floor, &lines, 1e-3).len(), 1);
    }
}
