// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Flat render buffers built from a triangle mesh

use crate::geometry::Mesh;
use ahash::AHashMap;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Positions, normals and indices as flat `f32`/`u32` arrays.
///
/// Normals are per vertex; without welding every triangle owns its three
/// vertices and they all carry the triangle's face normal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffer {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshBuffer {
    /// Unwelded buffer: three vertices per triangle, indices `0..n`.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let vertex_count = mesh.vertex_count();
        let mut buffer = Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(vertex_count),
        };

        for triangle in &mesh.triangles {
            let normal = triangle.normal();
            for p in &triangle.vertices {
                let index = buffer.vertex_count() as u32;
                buffer.indices.push(index);
                buffer.positions.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
                buffer
                    .normals
                    .extend_from_slice(&[normal.x as f32, normal.y as f32, normal.z as f32]);
            }
        }
        buffer
    }

    /// Buffer with positions closer than `epsilon` merged; shared vertices
    /// get the normalized sum of their triangles' area-weighted normals.
    pub fn welded(mesh: &Mesh, epsilon: f64) -> Self {
        let scale = 1.0 / epsilon.max(f64::MIN_POSITIVE);
        let mut lookup: AHashMap<[i64; 3], u32> = AHashMap::new();
        let mut positions: Vec<f32> = Vec::new();
        let mut normal_sums: Vec<Vector3<f64>> = Vec::new();
        let mut indices = Vec::with_capacity(mesh.vertex_count());

        for triangle in &mesh.triangles {
            // Unnormalized cross product weights by area
            let [a, b, c] = &triangle.vertices;
            let weighted = (b - a).cross(&(c - a));
            for p in &triangle.vertices {
                let key = [
                    (p.x * scale).round() as i64,
                    (p.y * scale).round() as i64,
                    (p.z * scale).round() as i64,
                ];
                let index = *lookup.entry(key).or_insert_with(|| {
                    positions.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
                    normal_sums.push(Vector3::zeros());
                    (normal_sums.len() - 1) as u32
                });
                normal_sums[index as usize] += weighted;
                indices.push(index);
            }
        }

        let normals = normal_sums
            .iter()
            .flat_map(|n| {
                let n = n.try_normalize(0.0).unwrap_or_else(Vector3::zeros);
                [n.x as f32, n.y as f32, n.z as f32]
            })
            .collect();

        Self {
            positions,
            normals,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Per-component minimum and maximum of the positions
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        if self.positions.is_empty() {
            return None;
        }
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in self.positions.chunks_exact(3) {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Some((min, max))
    }
}

impl From<&Mesh> for MeshBuffer {
    fn from(mesh: &Mesh) -> Self {
        Self::from_mesh(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use nalgebra::Point3;

    fn quad() -> Mesh {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(1.0, 1.0, 0.0);
        let d = Point3::new(0.0, 1.0, 0.0);
        Mesh::from_triangles(vec![Triangle::new(a, b, c), Triangle::new(a, c, d)])
    }

    #[test]
    fn test_flat_buffer_layout() {
        let buffer = MeshBuffer::from_mesh(&quad());
        assert_eq!(buffer.vertex_count(), 6);
        assert_eq!(buffer.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(buffer.positions.len(), 18);
        for n in buffer.normals.chunks_exact(3) {
            assert_eq!(n, &[0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_degenerate_triangle_has_zero_normal() {
        let p = Point3::new(2.0, 2.0, 2.0);
        let mesh = Mesh::from_triangles(vec![Triangle::new(p, p, Point3::new(3.0, 3.0, 3.0))]);
        let buffer = MeshBuffer::from_mesh(&mesh);
        assert!(buffer.normals.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_weld_merges_shared_corners() {
        let buffer = MeshBuffer::welded(&quad(), 1e-6);
        assert_eq!(buffer.vertex_count(), 4);
        assert_eq!(buffer.triangle_count(), 2);
        assert_eq!(buffer.indices, vec![0, 1, 2, 0, 2, 3]);
        for n in buffer.normals.chunks_exact(3) {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_bounds() {
        let buffer = MeshBuffer::from_mesh(&quad());
        let (min, max) = buffer.bounds().unwrap();
        assert_eq!(min, [0.0, 0.0, 0.0]);
        assert_eq!(max, [1.0, 1.0, 0.0]);
        assert!(MeshBuffer::default().bounds().is_none());
    }
}
