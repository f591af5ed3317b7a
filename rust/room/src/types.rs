// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor elements: openings, walls, contents and partition lines

use nalgebra::{Point2, Vector2};
use plankit_geometry::{Line2d, Polygon2};
use serde::{Deserialize, Serialize};

/// A 2D point (simplified for serialization)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn from_nalgebra(p: &Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Opening type classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OpeningKind {
    Door,
    Window,
    /// Doorless passage cut into a wall
    Hole,
    /// Niche, pillar or other marker that is not hosted by a wall
    Feature,
}

/// What an opening allows, fixed when the opening is resolved.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capabilities {
    /// People walk through it; gets a clearance mask.
    pub passable: bool,
    /// Counts towards the glazed facade ratio.
    pub glazed: bool,
    /// Sits on a boundary edge rather than inside a room.
    pub hosted: bool,
}

impl OpeningKind {
    /// `glass` only matters for doors.
    pub fn capabilities(self, glass: bool) -> Capabilities {
        match self {
            OpeningKind::Door => Capabilities {
                passable: true,
                glazed: glass,
                hosted: true,
            },
            OpeningKind::Window => Capabilities {
                passable: false,
                glazed: true,
                hosted: true,
            },
            OpeningKind::Hole => Capabilities {
                passable: true,
                glazed: false,
                hosted: true,
            },
            OpeningKind::Feature => Capabilities::default(),
        }
    }
}

fn default_top() -> f64 {
    Opening::DEFAULT_TOP
}

/// Door, window, hole or feature as it appears in floor input.
///
/// `width` runs along the host wall and `depth` across it, both rotated by
/// `rotation` radians around `center`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningInput {
    pub id: String,
    pub kind: OpeningKind,
    pub center: Point2D,
    pub width: f64,
    #[serde(default)]
    pub depth: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub z_bottom: f64,
    #[serde(default = "default_top")]
    pub z_top: f64,
    /// Door leaf is glazed
    #[serde(default)]
    pub glass: bool,
}

impl OpeningInput {
    pub fn new(id: impl Into<String>, kind: OpeningKind, center: Point2D, width: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            center,
            width,
            depth: 0.0,
            rotation: 0.0,
            z_bottom: 0.0,
            z_top: Opening::DEFAULT_TOP,
            glass: false,
        }
    }

    pub fn with_depth(mut self, depth: f64) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_elevation(mut self, z_bottom: f64, z_top: f64) -> Self {
        self.z_bottom = z_bottom;
        self.z_top = z_top;
        self
    }

    pub fn with_glass(mut self, glass: bool) -> Self {
        self.glass = glass;
        self
    }
}

/// Opening with its capabilities and bottom profile resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Opening {
    pub id: String,
    pub kind: OpeningKind,
    pub caps: Capabilities,
    pub center: Point2<f64>,
    pub width: f64,
    pub depth: f64,
    pub rotation: f64,
    pub z_bottom: f64,
    pub z_top: f64,
    /// Width x depth rectangle around the center
    pub profile: Polygon2,
}

impl Opening {
    /// Top elevation used when the input carries none
    pub const DEFAULT_TOP: f64 = 2.8;

    /// Resolves an input. A zero depth falls back to `default_depth` so the
    /// profile keeps an area.
    pub fn new(input: &OpeningInput, default_depth: f64) -> Self {
        let depth = if input.depth > 0.0 { input.depth } else { default_depth };
        let center = input.center.to_nalgebra();
        Self {
            id: input.id.clone(),
            kind: input.kind,
            caps: input.kind.capabilities(input.glass),
            center,
            width: input.width,
            depth,
            rotation: input.rotation,
            z_bottom: input.z_bottom,
            z_top: input.z_top,
            profile: rotated_rectangle(center, input.width, depth, input.rotation),
        }
    }
}

/// Straight wall segment chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallInput {
    /// Wall centerline points (typically 2 for straight walls)
    pub centerline: Vec<Point2D>,
    /// Falls back to the configured default when absent
    #[serde(default)]
    pub thickness: Option<f64>,
}

impl WallInput {
    pub fn straight(start: Point2D, end: Point2D, thickness: f64) -> Self {
        Self {
            centerline: vec![start, end],
            thickness: Some(thickness),
        }
    }

    pub fn length(&self) -> f64 {
        self.centerline
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }

    /// One rectangle per centerline segment, extended by half the thickness
    /// at both ends so consecutive segments overlap at corners.
    pub fn footprint(&self, default_thickness: f64) -> Vec<Polygon2> {
        let thickness = self.thickness.filter(|t| *t > 0.0).unwrap_or(default_thickness);
        self.centerline
            .windows(2)
            .filter_map(|w| segment_strip(w[0].to_nalgebra(), w[1].to_nalgebra(), thickness, thickness / 2.0))
            .collect()
    }
}

/// Furniture or fixture occupying floor space.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentInput {
    pub id: String,
    #[serde(default)]
    pub kind: String,
    pub center: Point2D,
    pub width: f64,
    pub depth: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl ContentInput {
    pub fn new(id: impl Into<String>, center: Point2D, width: f64, depth: f64) -> Self {
        Self {
            id: id.into(),
            kind: String::new(),
            center,
            width,
            depth,
            rotation: 0.0,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }
}

/// Content with its footprint resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub id: String,
    pub kind: String,
    pub center: Point2<f64>,
    pub footprint: Polygon2,
}

impl Content {
    pub fn new(input: &ContentInput) -> Self {
        let center = input.center.to_nalgebra();
        Self {
            id: input.id.clone(),
            kind: input.kind.clone(),
            center,
            footprint: rotated_rectangle(center, input.width, input.depth, input.rotation),
        }
    }

    /// Footprint scaled about its center; door clearances must avoid it.
    pub fn forbidden_area(&self, scale: f64) -> Polygon2 {
        let scaled = self
            .footprint
            .outer
            .iter()
            .map(|p| self.center + (p - self.center) * scale)
            .collect();
        Polygon2::new(scaled)
    }
}

/// Line along which `extract_room_many` cuts the floor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PartitionInput {
    pub start: Point2D,
    pub end: Point2D,
}

impl PartitionInput {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    pub fn to_line(&self) -> Line2d {
        Line2d::new(self.start.to_nalgebra(), self.end.to_nalgebra())
    }
}

/// `width` along the rotated x axis and `depth` along the rotated y axis.
pub fn rotated_rectangle(center: Point2<f64>, width: f64, depth: f64, rotation: f64) -> Polygon2 {
    let (sin, cos) = rotation.sin_cos();
    let u = Vector2::new(cos, sin) * (width / 2.0);
    let v = Vector2::new(-sin, cos) * (depth / 2.0);
    Polygon2::new(vec![center - u - v, center + u - v, center + u + v, center - u + v])
}

/// Rectangle of `width` centered on the segment, extended by `extend` past
/// both ends. `None` for a zero-length segment.
pub fn segment_strip(start: Point2<f64>, end: Point2<f64>, width: f64, extend: f64) -> Option<Polygon2> {
    let d = end - start;
    let len = d.norm();
    if len < plankit_geometry::Tolerance::LENGTH {
        return None;
    }
    let dir = d / len;
    let normal = Vector2::new(-dir.y, dir.x) * (width / 2.0);
    let a = start - dir * extend;
    let b = end + dir * extend;
    Some(Polygon2::new(vec![a - normal, b - normal, b + normal, a + normal]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_capabilities() {
        assert!(OpeningKind::Door.capabilities(false).passable);
        assert!(!OpeningKind::Door.capabilities(false).glazed);
        assert!(OpeningKind::Door.capabilities(true).glazed);
        assert!(OpeningKind::Window.capabilities(true).glazed);
        assert!(!OpeningKind::Window.capabilities(false).passable);
        assert!(!OpeningKind::Feature.capabilities(true).hosted);
    }

    #[test]
    fn test_rotated_profile() {
        let input = OpeningInput::new("d1", OpeningKind::Door, Point2D::new(1.0, 1.0), 0.9)
            .with_depth(0.2)
            .with_rotation(FRAC_PI_2);
        let opening = Opening::new(&input, 0.12);
        assert_relative_eq!(opening.profile.area(), 0.18, epsilon = 1e-9);
        let b = opening.profile.bounds();
        assert_relative_eq!(b.height(), 0.9, epsilon = 1e-9);
        assert_relative_eq!(b.width(), 0.2, epsilon = 1e-9);
    }

    #[test]
    fn test_wall_footprint_extends_ends() {
        let wall = WallInput {
            centerline: vec![Point2D::new(0.0, 0.0), Point2D::new(2.0, 0.0)],
            thickness: None,
        };
        let parts = wall.footprint(0.2);
        assert_eq!(parts.len(), 1);
        assert_relative_eq!(parts[0].area(), 2.2 * 0.2, epsilon = 1e-9);
        assert_relative_eq!(wall.length(), 2.0);
    }

    #[test]
    fn test_forbidden_area_is_scaled() {
        let content = Content::new(&ContentInput::new("bed", Point2D::new(2.0, 2.0), 2.0, 1.0));
        assert_relative_eq!(content.forbidden_area(0.5).area(), 0.5, epsilon = 1e-9);
    }
}
