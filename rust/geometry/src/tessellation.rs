// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sampling density and comparison tolerances for curved geometry.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Length and angle tolerances shared by wire and surface code.
pub struct Tolerance;

impl Tolerance {
    /// Two endpoints closer than this are considered coincident.
    pub const LENGTH: f64 = 1e-6;
    /// Axes whose dot product differs from 1 by less than this are parallel.
    pub const ANGLE: f64 = 1e-9;
    /// Areas below this are treated as zero.
    pub const AREA: f64 = 1e-10;
}

/// Controls how arcs and circles are sampled into polylines.
///
/// The segment count of an arc is the larger of the counts required by
/// `chord_tolerance` and `max_angle_step`, and never below `min_arc_segments`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tessellation {
    /// Maximum distance between the true arc and a chord, in model units.
    pub chord_tolerance: f64,
    /// Maximum angle spanned by one chord, in radians.
    pub max_angle_step: f64,
    /// Lower bound on the number of chords per arc.
    pub min_arc_segments: usize,
}

impl Default for Tessellation {
    fn default() -> Self {
        Self {
            chord_tolerance: 0.01, // 1 cm for metre-based plans
            max_angle_step: PI / 18.0, // 10 degrees
            min_arc_segments: 2,
        }
    }
}

impl Tessellation {
    /// Number of chords needed for an arc of `radius` spanning `sweep` radians.
    pub fn segments_for(&self, radius: f64, sweep: f64) -> usize {
        let sweep = sweep.abs();
        if sweep <= 0.0 || radius <= 0.0 {
            return self.min_arc_segments.max(1);
        }

        let by_angle = if self.max_angle_step > 0.0 {
            (sweep / self.max_angle_step).ceil() as usize
        } else {
            1
        };

        let by_chord = if self.chord_tolerance > 0.0 && self.chord_tolerance < radius {
            let step = 2.0 * (1.0 - self.chord_tolerance / radius).acos();
            if step > 0.0 {
                (sweep / step).ceil() as usize
            } else {
                1
            }
        } else {
            1
        };

        by_angle.max(by_chord).max(self.min_arc_segments).max(1)
    }
}
