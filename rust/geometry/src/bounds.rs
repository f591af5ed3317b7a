// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned 2D bounding box. An empty box has `min > max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Default for Bounds2 {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bounds2 {
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2<f64>>) -> Self {
        let mut b = Self::empty();
        for p in points {
            b.include(p);
        }
        b
    }

    #[inline]
    pub fn include(&mut self, p: &Point2<f64>) {
        self.min[0] = self.min[0].min(p.x);
        self.min[1] = self.min[1].min(p.y);
        self.max[0] = self.max[0].max(p.x);
        self.max[1] = self.max[1].max(p.y);
    }

    pub fn union(&self, other: &Bounds2) -> Bounds2 {
        Bounds2 {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max[0] - self.min[0]
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max[1] - self.min[1]
        }
    }

    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        )
    }

    pub fn contains(&self, p: &Point2<f64>, tolerance: f64) -> bool {
        p.x >= self.min[0] - tolerance
            && p.x <= self.max[0] + tolerance
            && p.y >= self.min[1] - tolerance
            && p.y <= self.max[1] + tolerance
    }
}
