// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room extractor: runs one strategy over a supplied floor

use crate::config::ExtractorConfig;
use crate::cuts::polygon_cuts;
use crate::divide_space::divide_by_walls;
use crate::error::{Error, Result};
use crate::facade::glazed_facade_index;
use crate::floor::{FloorInput, PreparedFloor};
use crate::hosting::{assign_contents, assign_openings, host_summary, opening_record};
use crate::many::cut_by_partitions;
use crate::multi_skeleton::split_polygon_multi;
use crate::result::{ContentInfo, PolygonCuts, RoomExtractResult, Strategy};
use crate::skeleton::split_polygon;
use crate::types::{Content, Opening, Point2D};
use crate::wkt;
use plankit_geometry::Polygon2;

/// Where the extractor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorPhase {
    /// Created, nothing extracted yet
    Idle,
    Extracting,
    /// Last run succeeded; results are available
    Done,
    /// Last run had no floor or an unusable outer loop
    Failed,
}

/// Splits a floor into rooms.
///
/// ```
/// use plankit_room::{FloorInput, Point2D, RoomExtractor, ExtractorConfig, ExtractorPhase};
///
/// let floor = FloorInput::from_points("f", &[
///     Point2D::new(0.0, 0.0),
///     Point2D::new(4.0, 0.0),
///     Point2D::new(4.0, 5.0),
///     Point2D::new(0.0, 5.0),
/// ]);
/// let mut extractor = RoomExtractor::new(ExtractorConfig::default());
/// extractor.supply(floor);
/// let rooms = extractor.extract_room_by_skeleton();
/// assert_eq!(rooms.len(), 1);
/// assert_eq!(extractor.phase(), ExtractorPhase::Done);
/// ```
#[derive(Debug, Clone)]
pub struct RoomExtractor {
    config: ExtractorConfig,
    floor: Option<FloorInput>,
    phase: ExtractorPhase,
    results: Vec<RoomExtractResult>,
    last_error: Option<String>,
}

impl RoomExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            floor: None,
            phase: ExtractorPhase::Idle,
            results: Vec::new(),
            last_error: None,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Stores the floor for the next run.
    pub fn supply(&mut self, floor: FloorInput) {
        self.floor = Some(floor);
    }

    pub fn floor(&self) -> Option<&FloorInput> {
        self.floor.as_ref()
    }

    pub fn phase(&self) -> ExtractorPhase {
        self.phase
    }

    /// Results of the last successful run.
    pub fn results(&self) -> &[RoomExtractResult] {
        &self.results
    }

    /// Why the last run failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The whole floor as one room.
    pub fn extract_room(&mut self) -> Vec<RoomExtractResult> {
        self.extract(Strategy::Default)
    }

    pub fn extract_room_by_skeleton(&mut self) -> Vec<RoomExtractResult> {
        self.extract(Strategy::Skeleton)
    }

    pub fn extract_room_by_divide_space(&mut self) -> Vec<RoomExtractResult> {
        self.extract(Strategy::DivideSpace)
    }

    pub fn extract_room_by_multi_skeleton(&mut self) -> Vec<RoomExtractResult> {
        self.extract(Strategy::MultiSkeleton)
    }

    /// One room per piece left after cutting along the partition lines.
    pub fn extract_room_many(&mut self) -> Vec<RoomExtractResult> {
        self.extract(Strategy::Many)
    }

    /// Runs `strategy` and records the outcome in the phase. Failure gives
    /// an empty vector.
    pub fn extract(&mut self, strategy: Strategy) -> Vec<RoomExtractResult> {
        let span = tracing::info_span!("extract_rooms", strategy = %strategy);
        let _enter = span.enter();

        self.phase = ExtractorPhase::Extracting;
        self.results.clear();
        self.last_error = None;

        match self.run(strategy) {
            Ok(results) => {
                tracing::info!(rooms = results.len(), "extraction done");
                self.phase = ExtractorPhase::Done;
                self.results = results.clone();
                results
            }
            Err(e) => {
                tracing::warn!(error = %e, "extraction failed");
                self.phase = ExtractorPhase::Failed;
                self.last_error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    /// Same as [`RoomExtractor::extract`], yielding to the executor before
    /// and after the run.
    #[cfg(feature = "async")]
    pub async fn extract_async(&mut self, strategy: Strategy) -> Vec<RoomExtractResult> {
        tokio::task::yield_now().await;
        let results = self.extract(strategy);
        tokio::task::yield_now().await;
        results
    }

    /// Door clearance and content masks for an arbitrary polygon.
    pub fn extract_polygon_cuts(
        &self,
        polygon: &Polygon2,
        openings: &[Opening],
        contents: &[Content],
    ) -> PolygonCuts {
        let openings: Vec<&Opening> = openings.iter().collect();
        let contents: Vec<&Content> = contents.iter().collect();
        polygon_cuts(polygon, &openings, &contents, &self.config)
    }

    /// Outer floor edge carrying the largest share of glazing, if any edge
    /// reaches the configured ratio.
    pub fn get_glazed_facade_index(&self, floor: &FloorInput) -> Option<usize> {
        match floor.prepare(&self.config) {
            Ok(prepared) => glazed_facade_index(
                &prepared.polygon,
                &prepared.openings,
                self.config.host_tolerance,
                self.config.glazed_ratio_threshold,
            ),
            Err(e) => {
                tracing::debug!(error = %e, "no facade for degenerate floor");
                None
            }
        }
    }

    fn run(&self, strategy: Strategy) -> Result<Vec<RoomExtractResult>> {
        let floor = self.floor.as_ref().ok_or(Error::NoFloor)?;
        let prepared = floor.prepare(&self.config)?;
        let config = &self.config;

        let cells = match strategy {
            Strategy::Default => vec![prepared.polygon.clone()],
            Strategy::Skeleton => split_polygon(&prepared.polygon, config, None),
            Strategy::DivideSpace => divide_by_walls(&prepared.polygon, &prepared.wall_footprints),
            Strategy::MultiSkeleton => split_polygon_multi(&prepared.polygon, config),
            Strategy::Many => {
                cut_by_partitions(&prepared.polygon, &prepared.partitions, config.partition_width)
            }
        };

        let cells: Vec<Polygon2> = cells
            .into_iter()
            .filter(|c| {
                let keep = c.outer.len() >= 3 && c.area() >= config.min_room_area;
                if !keep {
                    tracing::debug!(area = c.area(), "dropping degenerate cell");
                }
                keep
            })
            .collect();

        let opening_cells = assign_openings(&cells, &prepared.openings, config.host_tolerance);
        let content_cells = assign_contents(&cells, &prepared.contents);

        let whole_floor = strategy == Strategy::Default;
        Ok(cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let openings: Vec<&Opening> =
                    opening_cells[i].iter().map(|&o| &prepared.openings[o]).collect();
                let contents: Vec<&Content> =
                    content_cells[i].iter().map(|&c| &prepared.contents[c]).collect();
                let curve_count = if whole_floor {
                    prepared.outer_curve_count
                } else {
                    cell.outer.len()
                };
                build_result(&prepared, i, cell, curve_count, &openings, &contents, strategy, config)
            })
            .collect())
    }
}

#[allow(clippy::too_many_arguments)]
fn build_result(
    floor: &PreparedFloor,
    index: usize,
    cell: &Polygon2,
    curve_count: usize,
    openings: &[&Opening],
    contents: &[&Content],
    strategy: Strategy,
    config: &ExtractorConfig,
) -> RoomExtractResult {
    let records: Vec<_> = openings
        .iter()
        .map(|o| opening_record(o, cell, config.host_tolerance))
        .collect();
    let cuts = polygon_cuts(cell, openings, contents, config);

    let mut loops = Vec::with_capacity(1 + cell.holes.len());
    loops.push(cell.outer.iter().map(Point2D::from_nalgebra).collect());
    loops.extend(
        cell.holes
            .iter()
            .map(|h| h.iter().map(Point2D::from_nalgebra).collect()),
    );

    RoomExtractResult {
        id: format!("{}#{}", floor.id, index),
        wkt: wkt::polygon(cell),
        loops,
        area: cell.area(),
        num_of_outer_curves: curve_count,
        host_summary: host_summary(openings, &records),
        openings: records,
        contents: contents
            .iter()
            .map(|c| ContentInfo {
                id: c.id.clone(),
                kind: c.kind.clone(),
                center: Point2D::from_nalgebra(&c.center),
                footprint_wkt: wkt::polygon(&c.footprint),
                area: c.footprint.area(),
            })
            .collect(),
        cut_polygons: cuts.cut_polygons.iter().map(wkt::polygon).collect(),
        region_polygons: cuts.region_polygons.iter().map(wkt::polygon).collect(),
        features: cuts.features,
        glazed_facade_index: glazed_facade_index(
            cell,
            openings.iter().copied(),
            config.host_tolerance,
            config.glazed_ratio_threshold,
        ),
        strategy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_floor_fails() {
        let mut extractor = RoomExtractor::new(ExtractorConfig::default());
        assert_eq!(extractor.phase(), ExtractorPhase::Idle);
        assert!(extractor.extract_room().is_empty());
        assert_eq!(extractor.phase(), ExtractorPhase::Failed);
        assert!(extractor.last_error().is_some());
    }

    #[test]
    fn test_degenerate_floor_fails_then_recovers() {
        let mut extractor = RoomExtractor::new(ExtractorConfig::default());
        extractor.supply(FloorInput::from_points(
            "line",
            &[Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0)],
        ));
        assert!(extractor.extract_room_by_skeleton().is_empty());
        assert_eq!(extractor.phase(), ExtractorPhase::Failed);

        extractor.supply(FloorInput::from_points(
            "square",
            &[
                Point2D::new(0.0, 0.0),
                Point2D::new(3.0, 0.0),
                Point2D::new(3.0, 3.0),
                Point2D::new(0.0, 3.0),
            ],
        ));
        let rooms = extractor.extract_room();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].id, "square#0");
        assert_eq!(extractor.phase(), ExtractorPhase::Done);
        assert_eq!(extractor.results(), rooms.as_slice());
        assert!(extractor.last_error().is_none());
    }
}
