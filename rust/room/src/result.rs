// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extraction output. Every type here is a plain value with no link back
//! to the floor it came from.

use crate::types::{OpeningKind, Point2D};
use plankit_geometry::Polygon2;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// How a floor was divided into rooms
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Whole floor as one room
    #[default]
    Default,
    Skeleton,
    #[serde(rename = "divide")]
    DivideSpace,
    #[serde(rename = "multi")]
    MultiSkeleton,
    Many,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Default => "default",
            Strategy::Skeleton => "skeleton",
            Strategy::DivideSpace => "divide",
            Strategy::MultiSkeleton => "multi",
            Strategy::Many => "many",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Strategy::Default),
            "skeleton" => Ok(Strategy::Skeleton),
            "divide" => Ok(Strategy::DivideSpace),
            "multi" => Ok(Strategy::MultiSkeleton),
            "many" => Ok(Strategy::Many),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

/// Position of an opening along its host edge, 0 at the edge start and 1
/// at its end. `start`/`end` may fall outside [0, 1] when the opening is
/// wider than the remaining edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PosParam {
    pub start: f64,
    pub end: f64,
    pub center: f64,
}

/// Placement of a hosted opening on a room boundary edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub opening_id: String,
    pub kind: OpeningKind,
    /// Edge index over the outer ring followed by the hole rings
    pub host_curve_index: usize,
    pub host_curve_length: f64,
    pub pos_param: PosParam,
    pub z_bottom: f64,
    pub z_top: f64,
    pub center: Point2D,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpeningRecord {
    pub id: String,
    pub kind: OpeningKind,
    /// Bottom profile ring
    pub profile: Vec<Point2D>,
    pub center: Point2D,
    /// `None` for features and for openings too far from every edge
    pub host: Option<HostInfo>,
}

/// Flattened view of the hosted openings of one room.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OpeningHostSummary {
    #[serde(rename = "doorsBottomProfilesWKT")]
    pub doors_bottom_profiles_wkt: String,
    #[serde(rename = "windowsBottomProfilesWKT")]
    pub windows_bottom_profiles_wkt: String,
    #[serde(rename = "centersWKT")]
    pub centers_wkt: String,
    #[serde(rename = "hostCurveIndexStr")]
    pub host_curve_index_str: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentInfo {
    pub id: String,
    pub kind: String,
    pub center: Point2D,
    pub footprint_wkt: String,
    pub area: f64,
}

/// Masks and remaining free region of one room polygon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonCuts {
    /// Door clearances first, then content footprints. Pairwise disjoint.
    pub cut_polygons: Vec<Polygon2>,
    /// Polygon minus every cut
    pub region_polygons: Vec<Polygon2>,
    /// Glazed openings hosted on the polygon boundary
    pub features: Vec<HostInfo>,
}

/// One extracted room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomExtractResult {
    pub id: String,
    pub wkt: String,
    /// Outer ring first, then holes
    pub loops: Vec<Vec<Point2D>>,
    pub area: f64,
    pub num_of_outer_curves: usize,
    pub openings: Vec<OpeningRecord>,
    pub host_summary: OpeningHostSummary,
    pub contents: Vec<ContentInfo>,
    pub cut_polygons: Vec<String>,
    pub region_polygons: Vec<String>,
    pub features: Vec<HostInfo>,
    /// Serialized as `-1` when the room has no glazed facade
    #[serde(with = "facade_index")]
    pub glazed_facade_index: Option<usize>,
    pub strategy: Strategy,
}

impl RoomExtractResult {
    pub fn door_count(&self) -> usize {
        self.openings.iter().filter(|o| o.kind == OpeningKind::Door).count()
    }
}

mod facade_index {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(i) => serializer.serialize_i64(*i as i64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(usize::try_from(raw).ok())
    }
}
