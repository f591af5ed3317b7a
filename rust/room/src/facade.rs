// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Glazed facade detection

use crate::hosting::host_opening;
use crate::types::Opening;
use plankit_geometry::Polygon2;
use smallvec::SmallVec;

/// Glazed width over edge length for every outer edge of `polygon`.
pub fn glazed_ratios<'a>(
    polygon: &Polygon2,
    openings: impl IntoIterator<Item = &'a Opening>,
    host_tolerance: f64,
) -> Vec<f64> {
    let outer_edges = polygon.outer.len();
    let mut widths: SmallVec<[f64; 8]> = SmallVec::from_elem(0.0, outer_edges);
    for opening in openings.into_iter().filter(|o| o.caps.glazed) {
        if let Some(host) = host_opening(opening, polygon, host_tolerance) {
            // Hole edges come after the outer ring and never count.
            if host.host_curve_index < outer_edges {
                widths[host.host_curve_index] += opening.width;
            }
        }
    }
    polygon
        .outer_edges()
        .zip(widths)
        .map(|(edge, width)| {
            let len = edge.length();
            if len > 0.0 {
                width / len
            } else {
                0.0
            }
        })
        .collect()
}

/// Outer edge with the highest glazed ratio, if that ratio reaches
/// `threshold`. Ties go to the lower index.
pub fn glazed_facade_index<'a>(
    polygon: &Polygon2,
    openings: impl IntoIterator<Item = &'a Opening>,
    host_tolerance: f64,
    threshold: f64,
) -> Option<usize> {
    let ratios = glazed_ratios(polygon, openings, host_tolerance);
    let mut best: Option<(usize, f64)> = None;
    for (i, ratio) in ratios.into_iter().enumerate() {
        if best.map_or(true, |(_, r)| ratio > r) {
            best = Some((i, ratio));
        }
    }
    best.filter(|(_, r)| *r >= threshold).map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OpeningInput, OpeningKind, Point2D};
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn opening(kind: OpeningKind, x: f64, y: f64, width: f64, glass: bool) -> Opening {
        Opening::new(
            &OpeningInput::new("o", kind, Point2D::new(x, y), width).with_glass(glass),
            0.12,
        )
    }

    fn room() -> Polygon2 {
        Polygon2::rectangle(Point2::new(0.0, 0.0), Point2::new(4.0, 5.0))
    }

    #[test]
    fn test_ratios_count_glass_doors() {
        let openings = vec![
            opening(OpeningKind::Window, 1.0, 5.0, 1.0, false),
            opening(OpeningKind::Door, 3.0, 5.0, 1.0, true),
            opening(OpeningKind::Door, 2.0, 0.0, 1.0, false),
        ];
        let ratios = glazed_ratios(&room(), &openings, 0.3);
        assert_eq!(ratios.len(), 4);
        assert_relative_eq!(ratios[0], 0.0);
        assert_relative_eq!(ratios[2], 0.5);
        assert_eq!(glazed_facade_index(&room(), &openings, 0.3, 0.5), Some(2));
    }

    #[test]
    fn test_below_threshold_is_none() {
        let openings = vec![opening(OpeningKind::Window, 4.0, 2.5, 1.0, false)];
        assert_eq!(glazed_facade_index(&room(), &openings, 0.3, 0.5), None);
    }
}
