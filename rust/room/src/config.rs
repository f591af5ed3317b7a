// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extraction thresholds

use plankit_geometry::Tessellation;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tunables for every extraction strategy. Lengths are in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractorConfig {
    /// Sampling of arcs in floor outlines
    pub tessellation: Tessellation,
    /// Cells smaller than this are dropped (m²)
    pub min_room_area: f64,
    /// Area / hull area at which the skeleton stops splitting a cell
    pub convexity_threshold: f64,
    /// Multi-skeleton merges cells below this area into a neighbour (m²)
    pub sliver_area: f64,
    /// Used for walls that carry no thickness
    pub default_wall_thickness: f64,
    /// Maximum distance from an opening center to its host edge
    pub host_tolerance: f64,
    /// Glazed width / edge length needed for a glazed facade
    pub glazed_ratio_threshold: f64,
    /// How far a door clearance mask reaches into the room
    pub door_clearance_depth: f64,
    /// Width of the strip cut along a partition line
    pub partition_width: f64,
    /// Recursion limit for skeleton splits
    pub max_split_depth: usize,
    /// Scale applied to content footprints to get forbidden areas
    pub forbidden_area_scale: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            tessellation: Tessellation::default(),
            min_room_area: 0.1,
            convexity_threshold: 0.9,
            sliver_area: 1.0,
            default_wall_thickness: 0.12,
            host_tolerance: 0.3,
            glazed_ratio_threshold: 0.5,
            door_clearance_depth: 0.6,
            partition_width: 1e-3,
            max_split_depth: 16,
            forbidden_area_scale: 0.99,
        }
    }
}

impl ExtractorConfig {
    /// Defaults overridden by `PLANKIT_*` environment variables.
    ///
    /// A variable that is missing or does not parse keeps the default.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            tessellation: Tessellation {
                chord_tolerance: env_or("PLANKIT_CHORD_TOLERANCE", d.tessellation.chord_tolerance),
                max_angle_step: env_or("PLANKIT_MAX_ANGLE_STEP", d.tessellation.max_angle_step),
                min_arc_segments: env_or("PLANKIT_MIN_ARC_SEGMENTS", d.tessellation.min_arc_segments),
            },
            min_room_area: env_or("PLANKIT_MIN_ROOM_AREA", d.min_room_area),
            convexity_threshold: env_or("PLANKIT_CONVEXITY_THRESHOLD", d.convexity_threshold),
            sliver_area: env_or("PLANKIT_SLIVER_AREA", d.sliver_area),
            default_wall_thickness: env_or("PLANKIT_DEFAULT_WALL_THICKNESS", d.default_wall_thickness),
            host_tolerance: env_or("PLANKIT_HOST_TOLERANCE", d.host_tolerance),
            glazed_ratio_threshold: env_or("PLANKIT_GLAZED_RATIO_THRESHOLD", d.glazed_ratio_threshold),
            door_clearance_depth: env_or("PLANKIT_DOOR_CLEARANCE_DEPTH", d.door_clearance_depth),
            partition_width: env_or("PLANKIT_PARTITION_WIDTH", d.partition_width),
            max_split_depth: env_or("PLANKIT_MAX_SPLIT_DEPTH", d.max_split_depth),
            forbidden_area_scale: env_or("PLANKIT_FORBIDDEN_AREA_SCALE", d.forbidden_area_scale),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(variable = name, value = %raw, "ignoring unparsable setting");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_and_fallback() {
        std::env::set_var("PLANKIT_SLIVER_AREA", "2.5");
        std::env::set_var("PLANKIT_MAX_SPLIT_DEPTH", "deep");
        let config = ExtractorConfig::from_env();
        std::env::remove_var("PLANKIT_SLIVER_AREA");
        std::env::remove_var("PLANKIT_MAX_SPLIT_DEPTH");

        assert_eq!(config.sliver_area, 2.5);
        assert_eq!(config.max_split_depth, 16);
        assert_eq!(config.min_room_area, 0.1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ExtractorConfig = serde_json::from_str(r#"{"hostTolerance": 0.5}"#).unwrap();
        assert_eq!(config.host_tolerance, 0.5);
        assert_eq!(config.door_clearance_depth, 0.6);
    }
}
