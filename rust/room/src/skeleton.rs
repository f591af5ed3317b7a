// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Skeleton splitting: cut a floor outline into roughly convex cells
//!
//! A cell is cut at one of its reflex vertices by continuing an adjacent
//! edge into the interior until it meets the boundary. Of all candidate
//! cuts the shortest one wins. Cells stop splitting once their convexity
//! (area over convex hull area) reaches the threshold.

use crate::config::ExtractorConfig;
use nalgebra::Point2;
use plankit_geometry::bool2d::{compute_signed_area, ensure_ccw, simplify_contour};
use plankit_geometry::{Polygon2, Tolerance};

/// Interior chord from a reflex vertex to the boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cut {
    /// Reflex vertex the cut starts at
    pub vertex: usize,
    /// Edge `edge -> edge + 1` the cut ends on
    pub edge: usize,
    pub hit: Point2<f64>,
    pub length: f64,
}

/// Andrew's monotone chain, counter-clockwise without repeated end point.
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut pts: Vec<Point2<f64>> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let cross = |o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>| {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    };

    let mut lower: Vec<Point2<f64>> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }
    let mut upper: Vec<Point2<f64>> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Area over convex hull area; 1 for a convex ring.
pub fn convexity(ring: &[Point2<f64>]) -> f64 {
    let hull = compute_signed_area(&convex_hull(ring)).abs();
    if hull <= Tolerance::AREA {
        return 0.0;
    }
    (compute_signed_area(ring).abs() / hull).min(1.0)
}

/// Indices of reflex vertices of a counter-clockwise ring.
pub fn reflex_vertices(ring: &[Point2<f64>]) -> Vec<usize> {
    let n = ring.len();
    if n < 4 {
        return Vec::new();
    }
    (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let curr = ring[i];
            let next = ring[(i + 1) % n];
            let turn = (curr - prev).perp(&(next - curr));
            turn < -Tolerance::AREA
        })
        .collect()
}

/// Every cut obtained by extending an edge through a reflex vertex.
pub fn candidate_cuts(ring: &[Point2<f64>]) -> Vec<Cut> {
    let n = ring.len();
    let mut cuts = Vec::new();
    for i in reflex_vertices(ring) {
        let prev = ring[(i + n - 1) % n];
        let curr = ring[i];
        let next = ring[(i + 1) % n];
        for dir in [curr - prev, curr - next] {
            let len = dir.norm();
            if len <= Tolerance::LENGTH {
                continue;
            }
            if let Some(cut) = cast(ring, i, dir / len) {
                cuts.push(cut);
            }
        }
    }
    cuts.sort_by(|a, b| a.length.total_cmp(&b.length));
    cuts
}

/// Nearest boundary crossing of the ray from vertex `from`, skipping the
/// two edges that meet there.
fn cast(ring: &[Point2<f64>], from: usize, dir: nalgebra::Vector2<f64>) -> Option<Cut> {
    let n = ring.len();
    let origin = ring[from];
    let mut best: Option<Cut> = None;
    for j in 0..n {
        if j == from || (j + 1) % n == from {
            continue;
        }
        let a = ring[j];
        let b = ring[(j + 1) % n];
        let e = b - a;
        let denom = dir.perp(&e);
        if denom.abs() <= Tolerance::ANGLE {
            continue;
        }
        let w = a - origin;
        let t = w.perp(&e) / denom;
        let s = w.perp(&dir) / denom;
        if t <= Tolerance::LENGTH || !(-Tolerance::LENGTH..=1.0 + Tolerance::LENGTH).contains(&s) {
            continue;
        }
        if best.map_or(true, |c| t < c.length) {
            best = Some(Cut {
                vertex: from,
                edge: j,
                hit: origin + dir * t,
                length: t,
            });
        }
    }
    best
}

/// Splits a counter-clockwise ring along a cut into two rings.
pub fn split_ring(ring: &[Point2<f64>], cut: &Cut) -> (Vec<Point2<f64>>, Vec<Point2<f64>>) {
    let n = ring.len();
    let mut first = Vec::new();
    let mut i = cut.vertex;
    loop {
        first.push(ring[i]);
        if i == cut.edge {
            break;
        }
        i = (i + 1) % n;
    }
    first.push(cut.hit);

    let mut second = vec![cut.hit];
    let mut i = (cut.edge + 1) % n;
    loop {
        second.push(ring[i]);
        if i == cut.vertex {
            break;
        }
        i = (i + 1) % n;
    }

    (clean(&first), clean(&second))
}

fn clean(ring: &[Point2<f64>]) -> Vec<Point2<f64>> {
    ensure_ccw(&simplify_contour(ring, Tolerance::LENGTH))
}

/// Splits the outer ring of `polygon` into cells, then subtracts the holes
/// from every cell. `min_piece` rejects cuts leaving a piece smaller than
/// it; `None` accepts every cut.
pub fn split_polygon(polygon: &Polygon2, config: &ExtractorConfig, min_piece: Option<f64>) -> Vec<Polygon2> {
    let ring = clean(&polygon.outer);
    let mut rings = Vec::new();
    split_recursive(ring, config, min_piece, 0, &mut rings);
    tracing::debug!(cells = rings.len(), "skeleton split");

    let holes: Vec<Polygon2> = polygon.holes.iter().map(|h| Polygon2::new(h.clone())).collect();
    rings
        .into_iter()
        .flat_map(|ring| {
            let cell = Polygon2::new(ring);
            if holes.is_empty() {
                vec![cell]
            } else {
                plankit_geometry::bool2d::difference(&cell, &holes)
            }
        })
        .collect()
}

fn split_recursive(
    ring: Vec<Point2<f64>>,
    config: &ExtractorConfig,
    min_piece: Option<f64>,
    depth: usize,
    out: &mut Vec<Vec<Point2<f64>>>,
) {
    if ring.len() < 4 || depth >= config.max_split_depth || convexity(&ring) >= config.convexity_threshold {
        out.push(ring);
        return;
    }

    let chosen = candidate_cuts(&ring).into_iter().find_map(|cut| {
        let (a, b) = split_ring(&ring, &cut);
        let area_a = compute_signed_area(&a);
        let area_b = compute_signed_area(&b);
        if a.len() < 3 || b.len() < 3 || area_a <= Tolerance::AREA || area_b <= Tolerance::AREA {
            return None;
        }
        if let Some(min) = min_piece {
            if area_a < min || area_b < min {
                return None;
            }
        }
        Some((a, b))
    });

    match chosen {
        Some((a, b)) => {
            split_recursive(a, config, min_piece, depth + 1, out);
            split_recursive(b, config, min_piece, depth + 1, out);
        }
        None => out.push(ring),
    }
}
