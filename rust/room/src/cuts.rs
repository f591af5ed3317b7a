// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cut masks: door clearances and content footprints inside a room
//!
//! Masks are produced in order (door clearances, then contents) and each
//! one has every earlier mask subtracted, so the final set never overlaps.
//! Whatever the masks leave of the room is the free region.

use crate::config::ExtractorConfig;
use crate::hosting::host_opening;
use crate::result::{HostInfo, PolygonCuts};
use crate::types::{Content, Opening};
use nalgebra::Vector2;
use plankit_geometry::bool2d::{difference, intersection};
use plankit_geometry::Polygon2;

pub fn polygon_cuts(
    polygon: &Polygon2,
    openings: &[&Opening],
    contents: &[&Content],
    config: &ExtractorConfig,
) -> PolygonCuts {
    let forbidden: Vec<Polygon2> = contents
        .iter()
        .map(|c| c.forbidden_area(config.forbidden_area_scale))
        .collect();

    let mut masks: Vec<Polygon2> = Vec::new();

    for opening in openings.iter().filter(|o| o.caps.passable) {
        let Some(host) = host_opening(opening, polygon, config.host_tolerance) else {
            continue;
        };
        let Some(clearance) = door_clearance(polygon, &host, config.door_clearance_depth) else {
            continue;
        };
        for shrunk in difference(&clearance, &forbidden) {
            for piece in intersection(&shrunk, polygon) {
                push_disjoint(&mut masks, piece);
            }
        }
    }

    for content in contents {
        for piece in intersection(&content.footprint, polygon) {
            push_disjoint(&mut masks, piece);
        }
    }

    let region_polygons = difference(polygon, &masks);
    let features: Vec<HostInfo> = openings
        .iter()
        .filter(|o| o.caps.glazed)
        .filter_map(|o| host_opening(o, polygon, config.host_tolerance))
        .collect();

    tracing::debug!(
        cuts = masks.len(),
        regions = region_polygons.len(),
        features = features.len(),
        "polygon cuts"
    );

    PolygonCuts {
        cut_polygons: masks,
        region_polygons,
        features,
    }
}

/// Rectangle over the opening span of the host edge, reaching `depth`
/// into the room. The room lies to the left of every boundary edge.
fn door_clearance(polygon: &Polygon2, host: &HostInfo, depth: f64) -> Option<Polygon2> {
    let edge = polygon.all_edges().get(host.host_curve_index).copied()?;
    let len = edge.length();
    let dir = edge.direction() / len;
    let inward = Vector2::new(-dir.y, dir.x) * depth;
    let a = edge.start + dir * (host.pos_param.start * len);
    let b = edge.start + dir * (host.pos_param.end * len);
    let mask = Polygon2::new(vec![a, b, b + inward, a + inward]);
    mask.is_valid().then_some(mask)
}

fn push_disjoint(masks: &mut Vec<Polygon2>, piece: Polygon2) {
    if masks.is_empty() {
        if piece.is_valid() {
            masks.push(piece);
        }
        return;
    }
    let rest = difference(&piece, masks);
    masks.extend(rest);
}
