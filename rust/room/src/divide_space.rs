// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dividing a floor by its structural walls

use plankit_geometry::bool2d::difference;
use plankit_geometry::Polygon2;

/// Subtracts each wall footprint in turn, in the given order, from every
/// cell produced so far. Each enclosed area left over is one cell.
pub fn divide_by_walls(polygon: &Polygon2, walls: &[Vec<Polygon2>]) -> Vec<Polygon2> {
    let mut cells = vec![polygon.clone()];
    for (i, footprint) in walls.iter().enumerate() {
        let before = cells.len();
        cells = cells
            .iter()
            .flat_map(|cell| difference(cell, footprint))
            .collect();
        tracing::debug!(wall = i, before, after = cells.len(), "wall subtracted");
        if cells.is_empty() {
            break;
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Point2D, WallInput};
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn floor() -> Polygon2 {
        Polygon2::rectangle(Point2::new(0.0, 0.0), Point2::new(4.0, 5.0))
    }

    #[test]
    fn test_crossing_wall_makes_two_cells() {
        let wall = WallInput::straight(Point2D::new(2.0, -0.5), Point2D::new(2.0, 5.5), 0.12);
        let cells = divide_by_walls(&floor(), &[wall.footprint(0.12)]);
        assert_eq!(cells.len(), 2);
        for cell in &cells {
            assert_relative_eq!(cell.area(), 1.94 * 5.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_dangling_wall_keeps_one_cell() {
        let wall = WallInput::straight(Point2D::new(2.0, 0.0), Point2D::new(2.0, 3.0), 0.1);
        let cells = divide_by_walls(&floor(), &[wall.footprint(0.1)]);
        assert_eq!(cells.len(), 1);
        assert!(cells[0].area() < 20.0);
    }

    #[test]
    fn test_no_walls() {
        let cells = divide_by_walls(&floor(), &[]);
        assert_eq!(cells, vec![floor()]);
    }
}
