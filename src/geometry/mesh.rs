// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Triangle soup representation and utilities
//!
//! Triangles carry their own positions; duplicated positions between
//! neighbours are expected. Index sharing is an export-time concern.

use super::BoundingBox;
use crate::utils::math::triangle_normal;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Three positions wound counter-clockwise around the outward normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [Point3<f64>; 3],
}

impl Triangle {
    pub fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self { vertices: [a, b, c] }
    }

    /// Unit normal, or zero for a degenerate triangle
    pub fn normal(&self) -> Vector3<f64> {
        let n = triangle_normal(&self.vertices[0], &self.vertices[1], &self.vertices[2]);
        let len = n.norm();
        if len > 0.0 {
            n / len
        } else {
            Vector3::zeros()
        }
    }

    pub fn area(&self) -> f64 {
        triangle_normal(&self.vertices[0], &self.vertices[1], &self.vertices[2]).norm() * 0.5
    }

    /// Same positions, opposite winding
    pub fn flipped(&self) -> Self {
        Self {
            vertices: [self.vertices[0], self.vertices[2], self.vertices[1]],
        }
    }

    pub fn is_finite(&self) -> bool {
        self.vertices
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
    }

    pub fn is_degenerate(&self, epsilon: f64) -> bool {
        self.area() <= epsilon
    }

    /// Signed volume of the tetrahedron spanned with the origin
    pub fn signed_volume(&self) -> f64 {
        let [a, b, c] = &self.vertices;
        a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
    }
}

/// Triangle mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new()
    }

    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Positions as stored, three per triangle
    pub fn vertex_count(&self) -> usize {
        self.triangles.len() * 3
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_triangles(&self.triangles)
    }

    /// Append another mesh without any clipping
    pub fn merge(&mut self, other: &Mesh) {
        self.triangles.extend_from_slice(&other.triangles);
    }

    /// Reverse every triangle's winding (turns the solid inside out)
    pub fn flip(&mut self) {
        for triangle in &mut self.triangles {
            *triangle = triangle.flipped();
        }
    }

    pub fn is_finite(&self) -> bool {
        self.triangles.iter().all(Triangle::is_finite)
    }
}
