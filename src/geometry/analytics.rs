// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Geometry analytics and statistics

use super::{BoundingBox, Mesh};
use ahash::AHashMap;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Geometry statistics and analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryStats {
    /// Enclosed volume in cubic units
    pub volume: f64,
    /// Total surface area in square units
    pub surface_area: f64,
    pub bbox: BoundingBox,
    /// Area-weighted centroid of the surface
    pub centroid: [f64; 3],
    /// Stored positions, three per triangle
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Every edge is matched by exactly one opposite edge
    pub is_watertight: bool,
}

impl GeometryStats {
    pub fn empty() -> Self {
        Self {
            volume: 0.0,
            surface_area: 0.0,
            bbox: BoundingBox::empty(),
            centroid: [0.0, 0.0, 0.0],
            vertex_count: 0,
            triangle_count: 0,
            is_watertight: false,
        }
    }
}

/// Analyze mesh geometry and compute statistics
pub fn analyze(mesh: &Mesh) -> GeometryStats {
    if mesh.is_empty() {
        return GeometryStats::empty();
    }

    GeometryStats {
        volume: signed_volume(mesh).abs(),
        surface_area: surface_area(mesh),
        bbox: mesh.bounding_box(),
        centroid: surface_centroid(mesh),
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        is_watertight: is_watertight(mesh, 1e-6),
    }
}

/// Sum of origin tetrahedra; positive for an outward-wound closed mesh
pub fn signed_volume(mesh: &Mesh) -> f64 {
    mesh.triangles.iter().map(|t| t.signed_volume()).sum()
}

pub fn surface_area(mesh: &Mesh) -> f64 {
    mesh.triangles.iter().map(|t| t.area()).sum()
}

fn surface_centroid(mesh: &Mesh) -> [f64; 3] {
    let mut weighted = nalgebra::Vector3::zeros();
    let mut total = 0.0;
    for triangle in &mesh.triangles {
        let area = triangle.area();
        let [a, b, c] = &triangle.vertices;
        weighted += (a.coords + b.coords + c.coords) * (area / 3.0);
        total += area;
    }
    if total <= 0.0 {
        return [0.0, 0.0, 0.0];
    }
    let centroid = weighted / total;
    [centroid.x, centroid.y, centroid.z]
}

type PositionKey = (i64, i64, i64);

fn quantize(p: &Point3<f64>, epsilon: f64) -> PositionKey {
    (
        (p.x / epsilon).round() as i64,
        (p.y / epsilon).round() as i64,
        (p.z / epsilon).round() as i64,
    )
}

/// Closed and consistently oriented: positions are compared after snapping
/// to an `epsilon` grid, and each directed edge must cancel one reversed use.
///
/// Boolean results keep T-junctions where clipped faces meet, so this is
/// exact for primitives and conservative for CSG output.
pub fn is_watertight(mesh: &Mesh, epsilon: f64) -> bool {
    if mesh.is_empty() {
        return false;
    }
    let mut balance: AHashMap<(PositionKey, PositionKey), i64> = AHashMap::new();
    for triangle in &mesh.triangles {
        let keys = triangle.vertices.map(|p| quantize(&p, epsilon));
        for i in 0..3 {
            let (a, b) = (keys[i], keys[(i + 1) % 3]);
            if a == b {
                continue;
            }
            if a < b {
                *balance.entry((a, b)).or_insert(0) += 1;
            } else {
                *balance.entry((b, a)).or_insert(0) -= 1;
            }
        }
    }
    balance.values().all(|&count| count == 0)
}
