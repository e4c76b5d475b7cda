// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! CSG (Constructive Solid Geometry) operations using BSP trees
//!
//! Each operand must be a closed, outward-wound triangle mesh. A BSP tree is
//! built over one operand and the other operand's triangles are pushed through
//! it: reaching a missing back child means "inside", a missing front child
//! means "outside". Shared (coplanar) faces are resolved by clipping in both
//! orientations so each survives exactly once.

use super::{BoundingBox, Mesh, Triangle};
use crate::error::{KernelError, Result};
use nalgebra::{Point3, Vector3};

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

/// Pieces produced by splitting below this area are discarded
const MIN_PIECE_AREA: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: Vector3<f64>,
    w: f64,
}

impl Plane {
    fn from_triangle(triangle: &Triangle) -> Option<Self> {
        let normal = triangle.normal();
        if normal == Vector3::zeros() {
            return None;
        }
        Some(Self {
            normal,
            w: normal.dot(&triangle.vertices[0].coords),
        })
    }

    fn distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.w
    }

    /// Sort a triangle into the four buckets; spanning triangles are cut
    /// into a front fan and a back fan.
    fn split_triangle(
        &self,
        triangle: &Triangle,
        epsilon: f64,
        coplanar_front: &mut Vec<Triangle>,
        coplanar_back: &mut Vec<Triangle>,
        front: &mut Vec<Triangle>,
        back: &mut Vec<Triangle>,
    ) {
        let distances = triangle.vertices.map(|v| self.distance(&v));
        let types = distances.map(|d| {
            if d > epsilon {
                FRONT
            } else if d < -epsilon {
                BACK
            } else {
                COPLANAR
            }
        });

        match types[0] | types[1] | types[2] {
            COPLANAR => {
                if self.normal.dot(&triangle.normal()) > 0.0 {
                    coplanar_front.push(*triangle);
                } else {
                    coplanar_back.push(*triangle);
                }
            }
            FRONT => front.push(*triangle),
            BACK => back.push(*triangle),
            _ => {
                let mut f: Vec<Point3<f64>> = Vec::with_capacity(4);
                let mut b: Vec<Point3<f64>> = Vec::with_capacity(4);
                for i in 0..3 {
                    let j = (i + 1) % 3;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (triangle.vertices[i], triangle.vertices[j]);
                    if ti != BACK {
                        f.push(vi);
                    }
                    if ti != FRONT {
                        b.push(vi);
                    }
                    if ti | tj == SPANNING {
                        let t = distances[i] / (distances[i] - distances[j]);
                        let v = vi + (vj - vi) * t;
                        f.push(v);
                        b.push(v);
                    }
                }
                fan_into(&f, front);
                fan_into(&b, back);
            }
        }
    }
}

fn fan_into(polygon: &[Point3<f64>], out: &mut Vec<Triangle>) {
    if polygon.len() < 3 {
        return;
    }
    for k in 1..polygon.len() - 1 {
        let triangle = Triangle::new(polygon[0], polygon[k], polygon[k + 1]);
        if !triangle.is_degenerate(MIN_PIECE_AREA) {
            out.push(triangle);
        }
    }
}

/// BSP tree node for CSG operations
#[derive(Debug, Clone)]
struct BSPNode {
    plane: Plane,
    /// Triangles lying in `plane`, either orientation
    triangles: Vec<Triangle>,
    front: Option<Box<BSPNode>>,
    back: Option<Box<BSPNode>>,
}

impl BSPNode {
    /// Build a tree; `None` when no triangle spans a plane.
    fn build(triangles: Vec<Triangle>, epsilon: f64) -> Option<Self> {
        let mut iter = triangles.into_iter();
        let (plane, first) = loop {
            let triangle = iter.next()?;
            if let Some(plane) = Plane::from_triangle(&triangle) {
                break (plane, triangle);
            }
        };

        let mut coplanar = vec![first];
        let mut front = Vec::new();
        let mut back = Vec::new();
        for triangle in iter {
            if triangle.normal() == Vector3::zeros() {
                continue;
            }
            // Coplanar triangles of either orientation stay at this node
            let mut coplanar_back = Vec::new();
            plane.split_triangle(
                &triangle,
                epsilon,
                &mut coplanar,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
            coplanar.append(&mut coplanar_back);
        }

        Some(Self {
            plane,
            triangles: coplanar,
            front: Self::build(front, epsilon).map(Box::new),
            back: Self::build(back, epsilon).map(Box::new),
        })
    }

    /// Keep the parts of `triangles` inside (or outside) the solid this tree bounds.
    fn clip(&self, triangles: Vec<Triangle>, keep_inside: bool, epsilon: f64) -> Vec<Triangle> {
        let mut front = Vec::new();
        let mut back = Vec::new();
        for triangle in &triangles {
            let mut coplanar_front = Vec::new();
            let mut coplanar_back = Vec::new();
            self.plane.split_triangle(
                triangle,
                epsilon,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
            front.append(&mut coplanar_front);
            back.append(&mut coplanar_back);
        }

        let mut kept = match &self.front {
            Some(node) => node.clip(front, keep_inside, epsilon),
            None if keep_inside => Vec::new(),
            None => front,
        };
        let back_kept = match &self.back {
            Some(node) => node.clip(back, keep_inside, epsilon),
            None if keep_inside => back,
            None => Vec::new(),
        };
        kept.extend(back_kept);
        kept
    }

    #[cfg(test)]
    fn triangle_count(&self) -> usize {
        self.triangles.len()
            + self.front.as_ref().map_or(0, |n| n.triangle_count())
            + self.back.as_ref().map_or(0, |n| n.triangle_count())
    }
}

/// Solid bounded by a closed mesh, ready to clip other triangles against
struct ClipSolid {
    tree: Option<BSPNode>,
    bbox: BoundingBox,
    epsilon: f64,
}

impl ClipSolid {
    fn new(mesh: &Mesh, epsilon: f64) -> Self {
        Self {
            tree: BSPNode::build(mesh.triangles.clone(), epsilon),
            bbox: mesh.bounding_box(),
            epsilon,
        }
    }

    /// Triangles whose box misses this solid's box are certainly outside it
    fn is_clear_of(&self, triangle: &Triangle) -> bool {
        let mut tb = BoundingBox::empty();
        for v in &triangle.vertices {
            tb.expand_to_include(v);
        }
        let margin = Vector3::repeat(self.epsilon);
        let grown = BoundingBox::new(self.bbox.min - margin, self.bbox.max + margin);
        !tb.intersects(&grown)
    }

    fn clip(&self, triangles: &[Triangle], keep_inside: bool, flipped: bool) -> Vec<Triangle> {
        let orient = |t: &Triangle| if flipped { t.flipped() } else { *t };

        let Some(tree) = &self.tree else {
            return if keep_inside {
                Vec::new()
            } else {
                triangles.to_vec()
            };
        };

        let (clear, candidates): (Vec<Triangle>, Vec<Triangle>) =
            triangles.iter().partition(|t| self.is_clear_of(t));

        let mut kept: Vec<Triangle> = tree
            .clip(candidates.iter().map(orient).collect(), keep_inside, self.epsilon)
            .iter()
            .map(orient)
            .collect();
        if !keep_inside {
            kept.extend(clear);
        }
        kept
    }

    /// Second-operand clip: a triangle must survive in both orientations,
    /// which drops faces shared with the other solid.
    fn clip_both_ways(&self, triangles: &[Triangle], keep_inside: bool) -> Vec<Triangle> {
        let once = self.clip(triangles, keep_inside, false);
        self.clip(&once, keep_inside, true)
    }
}

fn check_finite(mesh: &Mesh, operand: &str) -> Result<()> {
    if mesh.is_finite() {
        Ok(())
    } else {
        Err(KernelError::degenerate(format!(
            "{operand} operand has non-finite coordinates"
        )))
    }
}

/// A ∪ B
pub fn union(a: &Mesh, b: &Mesh, epsilon: f64) -> Result<Mesh> {
    check_finite(a, "first")?;
    check_finite(b, "second")?;
    if a.is_empty() || b.is_empty() || !a.bounding_box().intersects(&b.bounding_box()) {
        let mut result = a.clone();
        result.merge(b);
        return Ok(result);
    }

    let solid_a = ClipSolid::new(a, epsilon);
    let solid_b = ClipSolid::new(b, epsilon);
    let mut triangles = solid_b.clip(&a.triangles, false, false);
    triangles.extend(solid_a.clip_both_ways(&b.triangles, false));
    Ok(Mesh::from_triangles(triangles))
}

/// A − B
pub fn subtract(a: &Mesh, b: &Mesh, epsilon: f64) -> Result<Mesh> {
    check_finite(a, "first")?;
    check_finite(b, "second")?;
    if a.is_empty() || b.is_empty() || !a.bounding_box().intersects(&b.bounding_box()) {
        return Ok(a.clone());
    }

    let solid_a = ClipSolid::new(a, epsilon);
    let solid_b = ClipSolid::new(b, epsilon);
    let mut triangles = solid_b.clip(&a.triangles, false, true);
    triangles.extend(
        solid_a
            .clip_both_ways(&b.triangles, true)
            .iter()
            .map(Triangle::flipped),
    );
    Ok(Mesh::from_triangles(triangles))
}

/// A ∩ B
pub fn intersect(a: &Mesh, b: &Mesh, epsilon: f64) -> Result<Mesh> {
    check_finite(a, "first")?;
    check_finite(b, "second")?;
    if a.is_empty() || b.is_empty() || !a.bounding_box().intersects(&b.bounding_box()) {
        return Ok(Mesh::empty());
    }

    let solid_a = ClipSolid::new(a, epsilon);
    let solid_b = ClipSolid::new(b, epsilon);
    let mut triangles = solid_b.clip(&a.triangles, true, true);
    triangles.extend(solid_a.clip_both_ways(&b.triangles, true));
    Ok(Mesh::from_triangles(triangles))
}
