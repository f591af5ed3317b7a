// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room extraction from floor outlines
//!
//! This crate turns a floor (outer loop, holes, walls, openings, contents
//! and partition lines) into rooms:
//! 1. The outer loop is cleaned into a counter-clockwise polygon
//! 2. A strategy splits it into cells (skeleton, wall division, partitions)
//! 3. Openings are hosted on cell edges and contents placed in cells
//! 4. Door clearances and content footprints become disjoint cut masks
//!
//! # Usage
//!
//! ```rust,ignore
//! use plankit_room::{extract_rooms, ExtractorConfig, FloorInput, Strategy};
//!
//! let floor = FloorInput::from_json(&json)?;
//! let rooms = extract_rooms(floor, Strategy::Skeleton, &ExtractorConfig::from_env());
//! println!("{}", serde_json::to_string_pretty(&rooms)?);
//! ```

pub mod config;
pub mod cuts;
pub mod divide_space;
pub mod error;
pub mod extractor;
pub mod facade;
pub mod floor;
pub mod hosting;
pub mod many;
pub mod multi_skeleton;
pub mod result;
pub mod skeleton;
pub mod types;
pub mod wkt;

// Re-export commonly used types and functions
pub use config::ExtractorConfig;
pub use error::{Error, Result};
pub use extractor::{ExtractorPhase, RoomExtractor};
pub use floor::{FloorInput, PreparedFloor};
pub use result::{
    ContentInfo, HostInfo, OpeningHostSummary, OpeningRecord, PolygonCuts, PosParam,
    RoomExtractResult, Strategy,
};
pub use types::{
    Capabilities, Content, ContentInput, Opening, OpeningInput, OpeningKind, PartitionInput,
    Point2D, WallInput,
};

/// One-shot extraction with a fresh extractor.
///
/// Returns an empty vector when the floor cannot be prepared.
pub fn extract_rooms(floor: FloorInput, strategy: Strategy, config: &ExtractorConfig) -> Vec<RoomExtractResult> {
    let mut extractor = RoomExtractor::new(*config);
    extractor.supply(floor);
    extractor.extract(strategy)
}
