// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Attaching openings and contents to room polygons

use crate::result::{HostInfo, OpeningHostSummary, OpeningRecord, PosParam};
use crate::types::{Content, Opening, OpeningKind, Point2D};
use crate::wkt;
use nalgebra::Point2;
use plankit_geometry::{Line2d, Polygon2, Tolerance};

/// Closest boundary edge of a polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeHit {
    /// Index over the outer ring edges followed by the hole edges
    pub index: usize,
    pub edge: Line2d,
    pub distance: f64,
}

pub fn nearest_edge(polygon: &Polygon2, p: &Point2<f64>) -> Option<EdgeHit> {
    polygon
        .all_edges()
        .into_iter()
        .enumerate()
        .filter(|(_, e)| e.length() > Tolerance::LENGTH)
        .map(|(index, edge)| EdgeHit {
            index,
            edge,
            distance: edge.distance_to(p),
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Places a hosted opening on the nearest edge within `tolerance`.
pub fn host_opening(opening: &Opening, polygon: &Polygon2, tolerance: f64) -> Option<HostInfo> {
    if !opening.caps.hosted {
        return None;
    }
    let hit = nearest_edge(polygon, &opening.center)?;
    if hit.distance > tolerance {
        return None;
    }
    let length = hit.edge.length();
    let center = hit.edge.project_param(&opening.center);
    let half = opening.width / 2.0 / length;
    Some(HostInfo {
        opening_id: opening.id.clone(),
        kind: opening.kind,
        host_curve_index: hit.index,
        host_curve_length: length,
        pos_param: PosParam {
            start: center - half,
            end: center + half,
            center,
        },
        z_bottom: opening.z_bottom,
        z_top: opening.z_top,
        center: Point2D::from_nalgebra(&opening.center),
    })
}

pub fn opening_record(opening: &Opening, polygon: &Polygon2, tolerance: f64) -> OpeningRecord {
    OpeningRecord {
        id: opening.id.clone(),
        kind: opening.kind,
        profile: opening.profile.outer.iter().map(Point2D::from_nalgebra).collect(),
        center: Point2D::from_nalgebra(&opening.center),
        host: host_opening(opening, polygon, tolerance),
    }
}

/// Builds the summary over the openings of one room. `records` must be in
/// the same order as `openings`.
pub fn host_summary(openings: &[&Opening], records: &[OpeningRecord]) -> OpeningHostSummary {
    let hosted: Vec<(&Opening, &HostInfo)> = openings
        .iter()
        .zip(records)
        .filter_map(|(o, r)| r.host.as_ref().map(|h| (*o, h)))
        .collect();

    let profiles_of = |kind: OpeningKind| {
        wkt::multi_polygon(
            hosted
                .iter()
                .filter(|(o, _)| o.kind == kind)
                .map(|(o, _)| &o.profile),
        )
    };

    OpeningHostSummary {
        doors_bottom_profiles_wkt: profiles_of(OpeningKind::Door),
        windows_bottom_profiles_wkt: profiles_of(OpeningKind::Window),
        centers_wkt: wkt::multi_point(hosted.iter().map(|(o, _)| &o.center)),
        host_curve_index_str: hosted
            .iter()
            .map(|(_, h)| h.host_curve_index.to_string())
            .collect::<Vec<_>>()
            .join(","),
        count: hosted.len(),
    }
}

/// For every cell, the indices of the openings that belong to it.
///
/// A hosted opening goes to the cell whose boundary is nearest, as long as
/// it is within `tolerance`. Anything else goes to the cell containing its
/// center. Openings matching no cell are left out.
pub fn assign_openings(cells: &[Polygon2], openings: &[Opening], tolerance: f64) -> Vec<Vec<usize>> {
    let mut assigned = vec![Vec::new(); cells.len()];
    for (i, opening) in openings.iter().enumerate() {
        let by_boundary = if opening.caps.hosted {
            cells
                .iter()
                .enumerate()
                .map(|(c, cell)| (c, cell.boundary_distance(&opening.center)))
                .filter(|(_, d)| *d <= tolerance)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(c, _)| c)
        } else {
            None
        };
        let cell = by_boundary.or_else(|| cells.iter().position(|c| c.contains(&opening.center)));
        match cell {
            Some(c) => assigned[c].push(i),
            None => tracing::debug!(opening = %opening.id, "opening lies outside every room"),
        }
    }
    assigned
}

/// For every cell, the indices of the contents whose center it contains.
pub fn assign_contents(cells: &[Polygon2], contents: &[Content]) -> Vec<Vec<usize>> {
    let mut assigned = vec![Vec::new(); cells.len()];
    for (i, content) in contents.iter().enumerate() {
        match cells.iter().position(|c| c.contains(&content.center)) {
            Some(c) => assigned[c].push(i),
            None => tracing::debug!(content = %content.id, "content lies outside every room"),
        }
    }
    assigned
}
