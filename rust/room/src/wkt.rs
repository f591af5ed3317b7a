// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Well-known-text output for polygons and point sets

use nalgebra::Point2;
use plankit_geometry::Polygon2;
use std::fmt::Write;

/// `POLYGON((x y, ...), (hole ...))`, rings closed by repeating the first point.
pub fn polygon(poly: &Polygon2) -> String {
    if poly.outer.len() < 3 {
        return "POLYGON EMPTY".to_string();
    }
    let mut out = String::from("POLYGON");
    write_polygon_body(&mut out, poly);
    out
}

pub fn multi_polygon<'a>(polys: impl IntoIterator<Item = &'a Polygon2>) -> String {
    let mut out = String::from("MULTIPOLYGON(");
    let mut any = false;
    for poly in polys.into_iter().filter(|p| p.outer.len() >= 3) {
        if any {
            out.push(',');
        }
        write_polygon_body(&mut out, poly);
        any = true;
    }
    if !any {
        return "MULTIPOLYGON EMPTY".to_string();
    }
    out.push(')');
    out
}

pub fn multi_point<'a>(points: impl IntoIterator<Item = &'a Point2<f64>>) -> String {
    let mut out = String::from("MULTIPOINT(");
    let mut any = false;
    for p in points {
        if any {
            out.push(',');
        }
        let _ = write!(out, "({} {})", p.x, p.y);
        any = true;
    }
    if !any {
        return "MULTIPOINT EMPTY".to_string();
    }
    out.push(')');
    out
}

fn write_polygon_body(out: &mut String, poly: &Polygon2) {
    out.push('(');
    write_ring(out, &poly.outer);
    for hole in poly.holes.iter().filter(|h| h.len() >= 3) {
        out.push(',');
        write_ring(out, hole);
    }
    out.push(')');
}

fn write_ring(out: &mut String, ring: &[Point2<f64>]) {
    out.push('(');
    for (i, p) in ring.iter().chain(ring.first()).enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{} {}", p.x, p.y);
    }
    out.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_ring_is_closed() {
        let square = Polygon2::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 2.0));
        assert_eq!(polygon(&square), "POLYGON((0 0,1 0,1 2,0 2,0 0))");
    }

    #[test]
    fn test_multi_forms() {
        let a = Polygon2::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let b = Polygon2::rectangle(Point2::new(2.0, 0.0), Point2::new(3.0, 1.0));
        assert_eq!(
            multi_polygon([&a, &b]),
            "MULTIPOLYGON(((0 0,1 0,1 1,0 1,0 0)),((2 0,3 0,3 1,2 1,2 0)))"
        );
        assert_eq!(multi_polygon(std::iter::empty()), "MULTIPOLYGON EMPTY");
        assert_eq!(
            multi_point(&[Point2::new(0.5, 1.5), Point2::new(2.0, 0.0)]),
            "MULTIPOINT((0.5 1.5),(2 0))"
        );
        assert_eq!(multi_point(std::iter::empty()), "MULTIPOINT EMPTY");
    }
}
