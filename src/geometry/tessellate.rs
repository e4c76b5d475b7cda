// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Face tessellation
//!
//! Converts B-Rep faces into triangle lists by dispatching on the backing
//! surface. Output triangles are wound counter-clockwise around the face's
//! outward normal (surface normal flipped when the face's sense is false).

use super::{Mesh, Triangle};
use crate::config::TessellationConfig;
use crate::error::{KernelError, Result};
use crate::topology::{Curve, EntityArena, Handle, OrientedEdge, Surface};
use crate::utils::math::{bspline_domain, bspline_point, Frame, DEGENERATE_LENGTH};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use std::f64::consts::TAU;

/// Triangles below this area are dropped
const MIN_TRIANGLE_AREA: f64 = 1e-14;

/// Tessellates faces of one arena at a fixed resolution
pub struct Tessellator<'a> {
    arena: &'a EntityArena,
    config: &'a TessellationConfig,
}

impl<'a> Tessellator<'a> {
    pub fn new(arena: &'a EntityArena, config: &'a TessellationConfig) -> Self {
        Self { arena, config }
    }

    fn angular_segments(&self) -> usize {
        self.config.angular_segments.max(3)
    }

    /// Triangulate a single face
    pub fn tessellate_face(&self, face: Handle) -> Result<Vec<Triangle>> {
        let face_entity = self.arena.face(face)?;
        let surface = self.arena.surface(face_entity.surface)?;

        let mut triangles = match surface {
            Surface::Plane { placement } => {
                let frame = self.arena.placement_frame(*placement)?;
                let normal = if face_entity.same_sense { frame.z } else { -frame.z };
                return self.planar(face, normal);
            }
            Surface::Cylinder { placement, radius } => {
                let frame = self.arena.placement_frame(*placement)?;
                self.revolved(face, &frame, *radius, 0.0)?
            }
            Surface::Cone {
                placement,
                radius,
                semi_angle,
            } => {
                let frame = self.arena.placement_frame(*placement)?;
                self.revolved(face, &frame, *radius, *semi_angle)?
            }
            Surface::Sphere { placement, radius } => {
                let frame = self.arena.placement_frame(*placement)?;
                self.sphere(&frame, *radius)
            }
            Surface::Torus {
                placement,
                major_radius,
                minor_radius,
            } => {
                let frame = self.arena.placement_frame(*placement)?;
                self.torus(&frame, *major_radius, *minor_radius)
            }
            Surface::BSpline(spline) => self.bspline_surface(spline)?,
        };

        if !face_entity.same_sense {
            for triangle in &mut triangles {
                *triangle = triangle.flipped();
            }
        }
        Ok(triangles)
    }

    /// Triangulate every face of a solid, in face order
    pub fn tessellate_solid(&self, solid: Handle) -> Result<Mesh> {
        let faces = self.arena.solid_faces(solid)?;
        let per_face: Vec<Vec<Triangle>> = if self.config.parallel_faces {
            faces
                .par_iter()
                .map(|&face| self.tessellate_face(face))
                .collect::<Result<_>>()?
        } else {
            faces
                .iter()
                .map(|&face| self.tessellate_face(face))
                .collect::<Result<_>>()?
        };
        Ok(Mesh::from_triangles(per_face.into_iter().flatten().collect()))
    }

    // --- Planar faces ---

    fn planar(&self, face: Handle, normal: Vector3<f64>) -> Result<Vec<Triangle>> {
        let boundary = self.outer_boundary(face)?;
        if boundary.len() < 3 {
            return Err(KernelError::degenerate(format!(
                "planar face {face} has {} boundary points",
                boundary.len()
            )));
        }

        let reverse = newell_normal(&boundary).dot(&normal) < 0.0;
        let p0 = boundary[0];
        let triangles = boundary
            .windows(2)
            .skip(1)
            .map(|pair| {
                if reverse {
                    Triangle::new(p0, pair[1], pair[0])
                } else {
                    Triangle::new(p0, pair[0], pair[1])
                }
            })
            .filter(|t| !t.is_degenerate(MIN_TRIANGLE_AREA))
            .collect();
        Ok(triangles)
    }

    /// Ordered boundary points of the face's outer loop (first bound if none is tagged outer)
    fn outer_boundary(&self, face: Handle) -> Result<Vec<Point3<f64>>> {
        let face_entity = self.arena.face(face)?;
        let mut outer = None;
        for &bound in &face_entity.bounds {
            let b = self.arena.face_bound(bound)?;
            if b.outer || outer.is_none() {
                outer = Some(b);
                if b.outer {
                    break;
                }
            }
        }
        let bound = outer
            .ok_or_else(|| KernelError::degenerate(format!("planar face {face} has no bounds")))?;

        let mut points = Vec::new();
        for oe in self.arena.loop_edges(bound.edge_loop)? {
            let forward = oe.forward == bound.orientation;
            let mut polyline = self.edge_polyline(oe.edge)?;
            if !forward {
                polyline.reverse();
            }
            polyline.pop();
            points.extend(polyline);
        }
        Ok(points)
    }

    /// Sampled points along an edge from its start vertex to its end vertex, inclusive
    fn edge_polyline(&self, edge: Handle) -> Result<Vec<Point3<f64>>> {
        let e = self.arena.edge(edge)?;
        let start = self.arena.vertex_point(e.start)?;
        let end = self.arena.vertex_point(e.end)?;
        let closed = e.is_closed();

        // Sampled in the curve's own sense, then reversed if the edge runs against it
        let (from, to) = if e.same_sense { (start, end) } else { (end, start) };
        let mut points = match self.arena.curve(e.curve)? {
            Curve::Line { .. } => vec![from, to],
            Curve::Circle { placement, radius } => {
                let frame = self.arena.placement_frame(*placement)?;
                self.conic_arc(&frame, *radius, *radius, &from, &to, closed)
            }
            Curve::Ellipse {
                placement,
                semi_major,
                semi_minor,
            } => {
                let frame = self.arena.placement_frame(*placement)?;
                self.conic_arc(&frame, *semi_major, *semi_minor, &from, &to, closed)
            }
            Curve::BSpline(spline) => {
                let control = spline
                    .control_points
                    .iter()
                    .map(|&p| self.arena.point(p))
                    .collect::<Result<Vec<_>>>()?;
                let (t0, t1) = bspline_domain(spline.degree, &spline.knots);
                let samples = self.angular_segments();
                (0..=samples)
                    .map(|i| {
                        let t = t0 + (t1 - t0) * i as f64 / samples as f64;
                        bspline_point(spline.degree, &control, &spline.knots, t).ok_or_else(|| {
                            KernelError::degenerate(format!(
                                "edge {edge} has an invalid knot vector"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?
            }
        };
        if !e.same_sense {
            points.reverse();
        }
        Ok(points)
    }

    /// Counter-clockwise arc of an ellipse (circle when `a == b`) from `from` to `to`.
    fn conic_arc(
        &self,
        frame: &Frame,
        a: f64,
        b: f64,
        from: &Point3<f64>,
        to: &Point3<f64>,
        closed: bool,
    ) -> Vec<Point3<f64>> {
        let angle_of = |p: &Point3<f64>| {
            let local = frame.local(p);
            (local.y / b).atan2(local.x / a)
        };
        let start = angle_of(from);
        let sweep = if closed {
            TAU
        } else {
            let s = (angle_of(to) - start).rem_euclid(TAU);
            if s < 1e-12 {
                TAU
            } else {
                s
            }
        };
        let full = self.angular_segments() as f64;
        let segments = ((full * sweep / TAU).ceil() as usize).max(1);
        let mut points: Vec<Point3<f64>> = (0..segments)
            .map(|i| {
                let t = start + sweep * i as f64 / segments as f64;
                frame.point(a * t.cos(), b * t.sin(), 0.0)
            })
            .collect();
        points.push(*to);
        points
    }

    // --- Surfaces of revolution ---

    /// Cylinder (`semi_angle == 0`) or cone side between its bounding circles.
    fn revolved(
        &self,
        face: Handle,
        frame: &Frame,
        radius: f64,
        semi_angle: f64,
    ) -> Result<Vec<Triangle>> {
        let mut rings = self.bounding_rings(face, frame)?;
        rings.sort_by(|a, b| a.0.total_cmp(&b.0));

        if rings.len() == 1 {
            let slope = semi_angle.tan();
            if slope.abs() < DEGENERATE_LENGTH {
                return Err(KernelError::degenerate(format!(
                    "cylindrical face {face} needs two bounding circles"
                )));
            }
            // r(w) = radius + w·tan(semi_angle) vanishes at the apex
            let apex = -radius / slope;
            rings.push((apex, 0.0));
            rings.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
        if rings.len() != 2 {
            return Err(KernelError::degenerate(format!(
                "revolved face {face} has {} bounding circles",
                rings.len()
            )));
        }

        let (w0, r0) = rings[0];
        let (w1, r1) = rings[1];
        let segments = self.angular_segments();
        let at = |w: f64, r: f64, k: usize| {
            let theta = TAU * k as f64 / segments as f64;
            frame.point(r * theta.cos(), r * theta.sin(), w)
        };

        let mut triangles = Vec::with_capacity(2 * segments);
        for k in 0..segments {
            let a = at(w0, r0, k);
            let b = at(w0, r0, k + 1);
            let c = at(w1, r1, k + 1);
            let d = at(w1, r1, k);
            if r0 <= DEGENERATE_LENGTH {
                triangles.push(Triangle::new(a, c, d));
            } else if r1 <= DEGENERATE_LENGTH {
                triangles.push(Triangle::new(a, b, c));
            } else {
                triangles.push(Triangle::new(a, b, c));
                triangles.push(Triangle::new(a, c, d));
            }
        }
        triangles.retain(|t| !t.is_degenerate(MIN_TRIANGLE_AREA));
        Ok(triangles)
    }

    /// `(height along axis, radius)` of every circular edge bounding the face
    fn bounding_rings(&self, face: Handle, frame: &Frame) -> Result<Vec<(f64, f64)>> {
        let mut rings = Vec::new();
        let edges: Vec<OrientedEdge> = self.arena.face_edges(face)?;
        for oe in edges {
            let edge = self.arena.edge(oe.edge)?;
            if let Curve::Circle { placement, radius } = self.arena.curve(edge.curve)? {
                let center = self.arena.placement_frame(*placement)?.origin;
                rings.push((frame.local(&center).z, *radius));
            }
        }
        Ok(rings)
    }

    // --- Closed analytic surfaces ---

    fn sphere(&self, frame: &Frame, radius: f64) -> Vec<Triangle> {
        let rings = self.config.sphere_rings.max(2);
        let segments = self.config.sphere_segments.max(3);
        let at = |i: usize, j: usize| {
            let phi = std::f64::consts::PI * i as f64 / rings as f64;
            let theta = TAU * j as f64 / segments as f64;
            frame.point(
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            )
        };

        let mut triangles = Vec::with_capacity(2 * rings * segments);
        for i in 0..rings {
            for j in 0..segments {
                let a = at(i, j);
                let b = at(i + 1, j);
                let c = at(i + 1, j + 1);
                let d = at(i, j + 1);
                // The first triangle collapses at the south pole, the second at the north
                if i + 1 < rings {
                    triangles.push(Triangle::new(a, b, c));
                }
                if i > 0 {
                    triangles.push(Triangle::new(a, c, d));
                }
            }
        }
        triangles
    }

    fn torus(&self, frame: &Frame, major_radius: f64, minor_radius: f64) -> Vec<Triangle> {
        let rings = self.config.torus_rings.max(3);
        let segments = self.config.torus_segments.max(3);
        let at = |i: usize, j: usize| {
            let phi = TAU * i as f64 / rings as f64;
            let theta = TAU * j as f64 / segments as f64;
            let reach = major_radius + minor_radius * phi.cos();
            frame.point(reach * theta.cos(), reach * theta.sin(), minor_radius * phi.sin())
        };

        let mut triangles = Vec::with_capacity(2 * rings * segments);
        for i in 0..rings {
            for j in 0..segments {
                let a = at(i, j);
                let b = at(i, j + 1);
                let c = at(i + 1, j + 1);
                let d = at(i + 1, j);
                triangles.push(Triangle::new(a, b, c));
                triangles.push(Triangle::new(a, c, d));
            }
        }
        triangles
    }

    /// Tensor-product B-spline sampled on a regular parameter grid
    fn bspline_surface(&self, spline: &crate::topology::BSplineSurface) -> Result<Vec<Triangle>> {
        let rows = spline
            .control_points
            .iter()
            .map(|row| row.iter().map(|&p| self.arena.point(p)).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        if rows.is_empty() {
            return Err(KernelError::degenerate("B-spline surface without control points"));
        }

        let u_steps = self.config.sphere_rings.max(2);
        let v_steps = self.config.sphere_segments.max(2);
        let (u0, u1) = bspline_domain(spline.u_degree, &spline.u_knots);
        let (v0, v1) = bspline_domain(spline.v_degree, &spline.v_knots);
        let invalid = || {
            KernelError::degenerate("B-spline surface knot vector does not match its control net")
        };

        let mut grid = Vec::with_capacity((u_steps + 1) * (v_steps + 1));
        for i in 0..=u_steps {
            let u = u0 + (u1 - u0) * i as f64 / u_steps as f64;
            for j in 0..=v_steps {
                let v = v0 + (v1 - v0) * j as f64 / v_steps as f64;
                let column = rows
                    .iter()
                    .map(|row| {
                        bspline_point(spline.v_degree, row, &spline.v_knots, v).ok_or_else(invalid)
                    })
                    .collect::<Result<Vec<_>>>()?;
                let point = bspline_point(spline.u_degree, &column, &spline.u_knots, u);
                grid.push(point.ok_or_else(invalid)?);
            }
        }

        let at = |i: usize, j: usize| grid[i * (v_steps + 1) + j];
        let mut triangles = Vec::with_capacity(2 * u_steps * v_steps);
        for i in 0..u_steps {
            for j in 0..v_steps {
                let (a, b, c, d) = (at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1));
                triangles.push(Triangle::new(a, b, c));
                triangles.push(Triangle::new(a, c, d));
            }
        }
        triangles.retain(|t| !t.is_degenerate(MIN_TRIANGLE_AREA));
        Ok(triangles)
    }
}

/// Area-weighted normal of a closed polygon
fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Convenience wrapper over [`Tessellator::tessellate_face`]
pub fn tessellate_face(
    arena: &EntityArena,
    face: Handle,
    config: &TessellationConfig,
) -> Result<Vec<Triangle>> {
    Tessellator::new(arena, config).tessellate_face(face)
}

/// Convenience wrapper over [`Tessellator::tessellate_solid`]
pub fn tessellate_solid(
    arena: &EntityArena,
    solid: Handle,
    config: &TessellationConfig,
) -> Result<Mesh> {
    Tessellator::new(arena, config).tessellate_solid(solid)
}
