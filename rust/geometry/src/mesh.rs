// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use nalgebra::{Point2, Point3, Vector3};

/// Caller-owned triangle accumulator.
///
/// Surfaces append to it instead of allocating their own buffers, so many
/// faces can be collected into one mesh. Optional channels that are `None`
/// are skipped; without an index buffer triangles are written unindexed.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Option<Vec<f32>>,
    /// Texture coordinates (u, v) in the surface's parameter space
    pub uvs: Option<Vec<f32>>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Option<Vec<u32>>,
}

impl Default for MeshData {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshData {
    /// Accumulator with every channel enabled
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            normals: Some(Vec::new()),
            uvs: Some(Vec::new()),
            indices: Some(Vec::new()),
        }
    }

    /// Accumulator that only records unindexed positions
    pub fn positions_only() -> Self {
        Self {
            vertices: Vec::new(),
            normals: None,
            uvs: None,
            indices: None,
        }
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.vertex_count() / 3,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    fn push_vertex(&mut self, position: &Point3<f64>, normal: &Vector3<f64>, uv: &Point2<f64>) {
        self.vertices.push(position.x as f32);
        self.vertices.push(position.y as f32);
        self.vertices.push(position.z as f32);

        if let Some(normals) = self.normals.as_mut() {
            normals.push(normal.x as f32);
            normals.push(normal.y as f32);
            normals.push(normal.z as f32);
        }
        if let Some(uvs) = self.uvs.as_mut() {
            uvs.push(uv.x as f32);
            uvs.push(uv.y as f32);
        }
    }

    /// Appends a triangulated patch. `triangles` indexes into `positions`,
    /// `normals` and `uvs`, which must have equal length. Returns the number
    /// of triangles written.
    pub fn append(
        &mut self,
        positions: &[Point3<f64>],
        normals: &[Vector3<f64>],
        uvs: &[Point2<f64>],
        triangles: &[usize],
    ) -> usize {
        let count = triangles.len() / 3;
        if count == 0 {
            return 0;
        }

        if self.indices.is_some() {
            let offset = self.vertex_count() as u32;
            self.vertices.reserve(positions.len() * 3);
            for i in 0..positions.len() {
                self.push_vertex(&positions[i], &normals[i], &uvs[i]);
            }
            if let Some(indices) = self.indices.as_mut() {
                indices.extend(triangles[..count * 3].iter().map(|&i| i as u32 + offset));
            }
        } else {
            self.vertices.reserve(count * 9);
            for &i in &triangles[..count * 3] {
                self.push_vertex(&positions[i], &normals[i], &uvs[i]);
            }
        }
        count
    }

    /// Merge another accumulator into this one
    pub fn merge(&mut self, other: &MeshData) {
        if other.is_empty() {
            return;
        }

        let vertex_offset = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        if let (Some(dst), Some(src)) = (self.normals.as_mut(), other.normals.as_ref()) {
            dst.extend_from_slice(src);
        }
        if let (Some(dst), Some(src)) = (self.uvs.as_mut(), other.uvs.as_ref()) {
            dst.extend_from_slice(src);
        }
        match (self.indices.as_mut(), other.indices.as_ref()) {
            (Some(dst), Some(src)) => dst.extend(src.iter().map(|&i| i + vertex_offset)),
            (Some(dst), None) => {
                let n = (other.vertices.len() / 3) as u32;
                dst.extend((0..n).map(|i| i + vertex_offset));
            }
            _ => {}
        }
    }
}
