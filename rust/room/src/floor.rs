// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor input and its preparation into a clean polygon

use crate::config::ExtractorConfig;
use crate::error::{Error, Result};
use crate::types::{
    Content, ContentInput, Opening, OpeningInput, PartitionInput, Point2D, WallInput,
};
use plankit_geometry::bool2d::{compute_signed_area, simplify_contour};
use plankit_geometry::{Curve2d, CurveData, Line2d, Polygon2, Tessellation, Tolerance, Wire};
use serde::{Deserialize, Serialize};

/// Everything the extractor needs to know about one floor.
///
/// Boundary loops are curve chains in the wire dump format, so arcs are
/// allowed and are sampled with the configured tessellation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorInput {
    pub id: String,
    pub outer: Vec<CurveData>,
    #[serde(default)]
    pub holes: Vec<Vec<CurveData>>,
    #[serde(default)]
    pub walls: Vec<WallInput>,
    #[serde(default)]
    pub openings: Vec<OpeningInput>,
    #[serde(default)]
    pub contents: Vec<ContentInput>,
    #[serde(default)]
    pub partitions: Vec<PartitionInput>,
}

impl FloorInput {
    /// Floor whose outer loop is the closed polyline through `points`.
    pub fn from_points(id: impl Into<String>, points: &[Point2D]) -> Self {
        Self {
            id: id.into(),
            outer: closed_polyline(points),
            ..Default::default()
        }
    }

    pub fn with_hole(mut self, points: &[Point2D]) -> Self {
        self.holes.push(closed_polyline(points));
        self
    }

    pub fn with_wall(mut self, wall: WallInput) -> Self {
        self.walls.push(wall);
        self
    }

    pub fn with_opening(mut self, opening: OpeningInput) -> Self {
        self.openings.push(opening);
        self
    }

    pub fn with_content(mut self, content: ContentInput) -> Self {
        self.contents.push(content);
        self
    }

    pub fn with_partition(mut self, partition: PartitionInput) -> Self {
        self.partitions.push(partition);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolves the loops into a polygon and the elements into their
    /// geometric form.
    ///
    /// Fails when the outer loop is open or disconnected, or has no area.
    /// Broken hole loops are dropped.
    pub fn prepare(&self, config: &ExtractorConfig) -> Result<PreparedFloor> {
        let outer = prepare_loop(&self.id, &self.outer, &config.tessellation)
            .ok_or_else(|| Error::DegenerateFloor(self.id.clone()))?;

        let mut holes = Vec::with_capacity(self.holes.len());
        for (i, hole) in self.holes.iter().enumerate() {
            match prepare_loop(&format!("{}/hole{}", self.id, i), hole, &config.tessellation) {
                Some(ring) => holes.push(ring),
                None => tracing::warn!(floor = %self.id, hole = i, "dropping degenerate hole loop"),
            }
        }

        let polygon = Polygon2::with_holes(outer, holes);
        if polygon.area() <= config.min_room_area.max(Tolerance::AREA) {
            return Err(Error::DegenerateFloor(self.id.clone()));
        }

        let mut walls: Vec<(f64, Vec<Polygon2>)> = self
            .walls
            .iter()
            .map(|w| (w.length(), w.footprint(config.default_wall_thickness)))
            .filter(|(_, f)| !f.is_empty())
            .collect();
        // Longest first; stable so equal lengths keep input order.
        walls.sort_by(|a, b| b.0.total_cmp(&a.0));

        let default_depth = config.default_wall_thickness;
        Ok(PreparedFloor {
            id: self.id.clone(),
            polygon,
            outer_curve_count: self.outer.len(),
            openings: self
                .openings
                .iter()
                .filter(|o| o.width > 0.0)
                .map(|o| Opening::new(o, default_depth))
                .collect(),
            contents: self
                .contents
                .iter()
                .filter(|c| c.width > 0.0 && c.depth > 0.0)
                .map(Content::new)
                .collect(),
            wall_footprints: walls.into_iter().map(|(_, f)| f).collect(),
            partitions: self.partitions.iter().map(PartitionInput::to_line).collect(),
        })
    }
}

/// A floor ready for splitting.
#[derive(Debug, Clone)]
pub struct PreparedFloor {
    pub id: String,
    /// Counter-clockwise outer ring, clockwise holes, no repeated or
    /// collinear vertices
    pub polygon: Polygon2,
    pub outer_curve_count: usize,
    pub openings: Vec<Opening>,
    pub contents: Vec<Content>,
    /// One entry per wall, longest wall first
    pub wall_footprints: Vec<Vec<Polygon2>>,
    pub partitions: Vec<Line2d>,
}

fn closed_polyline(points: &[Point2D]) -> Vec<CurveData> {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            CurveData::Line {
                start: [a.x, a.y],
                end: [b.x, b.y],
            }
        })
        .collect()
}

/// Builds a wire from the curves, checks it is a closed chain and samples it.
fn prepare_loop(id: &str, curves: &[CurveData], tessellation: &Tessellation) -> Option<Vec<nalgebra::Point2<f64>>> {
    if curves.is_empty() {
        return None;
    }
    let wire = Wire::from_curves(id, curves.iter().map(Curve2d::from).collect());
    if !wire.verify() || !wire.is_closed() {
        tracing::debug!(wire = id, "loop is not a closed chain");
        return None;
    }
    let ring = simplify_contour(&wire.discrete_points(tessellation), Tolerance::LENGTH);
    if ring.len() < 3 || compute_signed_area(&ring).abs() <= Tolerance::AREA {
        return None;
    }
    Some(ring)
}
