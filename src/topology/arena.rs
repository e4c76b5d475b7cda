// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Append-only entity arena
//!
//! Entities reference each other only by [`Handle`]. Handles are issued in
//! creation order and never reused: `reset` advances the arena's base so any
//! handle obtained before the reset resolves to `NotFound`.

use super::entity::*;
use crate::error::{KernelError, Result};
use crate::geometry::BoundingBox;
use crate::utils::math::{normalize_or, Frame};
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};

/// Per-build write-once store of topology and geometry entities
#[derive(Debug, Clone, Default)]
pub struct EntityArena {
    base: u64,
    entities: Vec<Entity>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entity; previously issued handles become invalid.
    pub fn reset(&mut self) {
        self.base += self.entities.len() as u64;
        self.entities.clear();
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in creation order
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Entity)> + '_ {
        let base = self.base;
        self.entities
            .iter()
            .enumerate()
            .map(move |(i, entity)| (Handle::new(base + i as u64), entity))
    }

    fn push(&mut self, entity: Entity) -> Handle {
        let handle = Handle::new(self.base + self.entities.len() as u64);
        self.entities.push(entity);
        handle
    }

    pub fn get(&self, handle: Handle) -> Result<&Entity> {
        handle
            .id()
            .checked_sub(self.base)
            .and_then(|offset| self.entities.get(offset as usize))
            .ok_or(KernelError::NotFound { handle })
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_ok()
    }

    // --- Constructors ---

    pub fn create_point(&mut self, x: f64, y: f64, z: f64) -> Handle {
        self.push(Entity::Point(Point3::new(x, y, z)))
    }

    pub fn create_point_at(&mut self, p: &Point3<f64>) -> Handle {
        self.create_point(p.x, p.y, p.z)
    }

    /// Normalizes the input; a (near) zero vector becomes +Z.
    pub fn create_direction(&mut self, x: f64, y: f64, z: f64) -> Handle {
        let v = normalize_or(Vector3::new(x, y, z), Vector3::z());
        self.push(Entity::Direction(v))
    }

    pub fn create_direction_from(&mut self, v: &Vector3<f64>) -> Handle {
        self.create_direction(v.x, v.y, v.z)
    }

    pub fn create_placement(
        &mut self,
        origin: Handle,
        axis: Handle,
        ref_direction: Handle,
    ) -> Handle {
        self.push(Entity::Placement(Placement {
            origin,
            axis,
            ref_direction,
        }))
    }

    /// Point, axis, reference direction and placement for a frame.
    pub fn create_placement_for(&mut self, frame: &Frame) -> Handle {
        let origin = self.create_point_at(&frame.origin);
        let axis = self.create_direction_from(&frame.z);
        let reference = self.create_direction_from(&frame.x);
        self.create_placement(origin, axis, reference)
    }

    pub fn create_line(&mut self, origin: Handle, direction: Handle) -> Handle {
        self.push(Entity::Curve(Curve::Line { origin, direction }))
    }

    pub fn create_circle(&mut self, placement: Handle, radius: f64) -> Handle {
        self.push(Entity::Curve(Curve::Circle { placement, radius }))
    }

    pub fn create_ellipse(
        &mut self,
        placement: Handle,
        semi_major: f64,
        semi_minor: f64,
    ) -> Handle {
        self.push(Entity::Curve(Curve::Ellipse {
            placement,
            semi_major,
            semi_minor,
        }))
    }

    pub fn create_bspline_curve(
        &mut self,
        degree: usize,
        control_points: Vec<Handle>,
        knots: Vec<f64>,
    ) -> Handle {
        self.push(Entity::Curve(Curve::BSpline(BSplineCurve {
            degree,
            control_points,
            knots,
        })))
    }

    pub fn create_plane(&mut self, placement: Handle) -> Handle {
        self.push(Entity::Surface(Surface::Plane { placement }))
    }

    pub fn create_cylindrical_surface(&mut self, placement: Handle, radius: f64) -> Handle {
        self.push(Entity::Surface(Surface::Cylinder { placement, radius }))
    }

    pub fn create_conical_surface(
        &mut self,
        placement: Handle,
        radius: f64,
        semi_angle: f64,
    ) -> Handle {
        self.push(Entity::Surface(Surface::Cone {
            placement,
            radius,
            semi_angle,
        }))
    }

    pub fn create_spherical_surface(&mut self, placement: Handle, radius: f64) -> Handle {
        self.push(Entity::Surface(Surface::Sphere { placement, radius }))
    }

    pub fn create_toroidal_surface(
        &mut self,
        placement: Handle,
        major_radius: f64,
        minor_radius: f64,
    ) -> Handle {
        self.push(Entity::Surface(Surface::Torus {
            placement,
            major_radius,
            minor_radius,
        }))
    }

    pub fn create_bspline_surface(&mut self, surface: BSplineSurface) -> Handle {
        self.push(Entity::Surface(Surface::BSpline(surface)))
    }

    pub fn create_vertex(&mut self, point: Handle) -> Handle {
        self.push(Entity::Vertex(Vertex { point }))
    }

    pub fn create_edge(
        &mut self,
        start: Handle,
        end: Handle,
        curve: Handle,
        same_sense: bool,
    ) -> Handle {
        self.push(Entity::EdgeCurve(EdgeCurve {
            start,
            end,
            curve,
            same_sense,
        }))
    }

    pub fn create_loop(&mut self, edges: Vec<OrientedEdge>) -> Handle {
        self.push(Entity::Loop(EdgeLoop { edges }))
    }

    pub fn create_face_bound(
        &mut self,
        edge_loop: Handle,
        outer: bool,
        orientation: bool,
    ) -> Handle {
        self.push(Entity::FaceBound(FaceBound {
            edge_loop,
            outer,
            orientation,
        }))
    }

    pub fn create_face(
        &mut self,
        bounds: Vec<Handle>,
        surface: Handle,
        same_sense: bool,
    ) -> Handle {
        self.push(Entity::Face(Face {
            bounds,
            surface,
            same_sense,
        }))
    }

    pub fn create_shell(&mut self, faces: Vec<Handle>) -> Handle {
        self.push(Entity::Shell(Shell { faces }))
    }

    pub fn create_solid(&mut self, outer_shell: Handle) -> Handle {
        self.push(Entity::Solid(Solid { outer_shell }))
    }

    // --- Typed accessors ---

    fn mismatch(&self, handle: Handle, expected: &'static str, found: &Entity) -> KernelError {
        KernelError::KindMismatch {
            handle,
            expected,
            found: found.kind_name(),
        }
    }

    pub fn point(&self, handle: Handle) -> Result<Point3<f64>> {
        match self.get(handle)? {
            Entity::Point(p) => Ok(*p),
            other => Err(self.mismatch(handle, "point", other)),
        }
    }

    pub fn direction(&self, handle: Handle) -> Result<Vector3<f64>> {
        match self.get(handle)? {
            Entity::Direction(d) => Ok(*d),
            other => Err(self.mismatch(handle, "direction", other)),
        }
    }

    pub fn placement(&self, handle: Handle) -> Result<&Placement> {
        match self.get(handle)? {
            Entity::Placement(p) => Ok(p),
            other => Err(self.mismatch(handle, "placement", other)),
        }
    }

    /// Resolve a placement into an orthonormal frame.
    pub fn placement_frame(&self, placement: Handle) -> Result<Frame> {
        let p = self.placement(placement)?;
        let origin = self.point(p.origin)?;
        let axis = self.direction(p.axis)?;
        let reference = self.direction(p.ref_direction)?;
        Ok(Frame::from_axis(origin, axis, reference))
    }

    pub fn curve(&self, handle: Handle) -> Result<&Curve> {
        match self.get(handle)? {
            Entity::Curve(c) => Ok(c),
            other => Err(self.mismatch(handle, "curve", other)),
        }
    }

    pub fn surface(&self, handle: Handle) -> Result<&Surface> {
        match self.get(handle)? {
            Entity::Surface(s) => Ok(s),
            other => Err(self.mismatch(handle, "surface", other)),
        }
    }

    pub fn vertex_point(&self, handle: Handle) -> Result<Point3<f64>> {
        match self.get(handle)? {
            Entity::Vertex(v) => self.point(v.point),
            other => Err(self.mismatch(handle, "vertex", other)),
        }
    }

    pub fn edge(&self, handle: Handle) -> Result<&EdgeCurve> {
        match self.get(handle)? {
            Entity::EdgeCurve(e) => Ok(e),
            other => Err(self.mismatch(handle, "edge_curve", other)),
        }
    }

    pub fn edge_loop(&self, handle: Handle) -> Result<&EdgeLoop> {
        match self.get(handle)? {
            Entity::Loop(l) => Ok(l),
            other => Err(self.mismatch(handle, "edge_loop", other)),
        }
    }

    pub fn loop_edges(&self, handle: Handle) -> Result<&[OrientedEdge]> {
        Ok(&self.edge_loop(handle)?.edges)
    }

    pub fn face_bound(&self, handle: Handle) -> Result<&FaceBound> {
        match self.get(handle)? {
            Entity::FaceBound(b) => Ok(b),
            other => Err(self.mismatch(handle, "face_bound", other)),
        }
    }

    pub fn face(&self, handle: Handle) -> Result<&Face> {
        match self.get(handle)? {
            Entity::Face(f) => Ok(f),
            other => Err(self.mismatch(handle, "face", other)),
        }
    }

    pub fn shell(&self, handle: Handle) -> Result<&Shell> {
        match self.get(handle)? {
            Entity::Shell(s) => Ok(s),
            other => Err(self.mismatch(handle, "shell", other)),
        }
    }

    pub fn shell_faces(&self, handle: Handle) -> Result<&[Handle]> {
        Ok(&self.shell(handle)?.faces)
    }

    pub fn solid(&self, handle: Handle) -> Result<&Solid> {
        match self.get(handle)? {
            Entity::Solid(s) => Ok(s),
            other => Err(self.mismatch(handle, "solid", other)),
        }
    }

    pub fn solid_shell(&self, handle: Handle) -> Result<Handle> {
        Ok(self.solid(handle)?.outer_shell)
    }

    // --- Traversal helpers ---

    pub fn solid_faces(&self, solid: Handle) -> Result<Vec<Handle>> {
        let shell = self.solid_shell(solid)?;
        Ok(self.shell_faces(shell)?.to_vec())
    }

    /// Oriented edges of every bound of a face, bound by bound.
    pub fn face_edges(&self, face: Handle) -> Result<Vec<OrientedEdge>> {
        let mut edges = Vec::new();
        for &bound in &self.face(face)?.bounds {
            let bound = self.face_bound(bound)?;
            edges.extend(self.loop_edges(bound.edge_loop)?.iter().map(|oe| OrientedEdge {
                edge: oe.edge,
                forward: oe.forward == bound.orientation,
            }));
        }
        Ok(edges)
    }

    /// Unique edges of a solid in first-use order
    pub fn solid_edges(&self, solid: Handle) -> Result<Vec<Handle>> {
        let mut edges = Vec::new();
        for face in self.solid_faces(solid)? {
            for oe in self.face_edges(face)? {
                if !edges.contains(&oe.edge) {
                    edges.push(oe.edge);
                }
            }
        }
        Ok(edges)
    }

    /// Unique vertices of a solid in first-use order
    pub fn solid_vertices(&self, solid: Handle) -> Result<Vec<Handle>> {
        let mut vertices = Vec::new();
        for edge in self.solid_edges(solid)? {
            let edge = self.edge(edge)?;
            for v in [edge.start, edge.end] {
                if !vertices.contains(&v) {
                    vertices.push(v);
                }
            }
        }
        Ok(vertices)
    }

    /// Forward and reverse use counts for every edge of a solid.
    pub fn edge_use_counts(&self, solid: Handle) -> Result<AHashMap<Handle, (usize, usize)>> {
        let mut counts: AHashMap<Handle, (usize, usize)> = AHashMap::new();
        for face in self.solid_faces(solid)? {
            let same_sense = self.face(face)?.same_sense;
            for oe in self.face_edges(face)? {
                let entry = counts.entry(oe.edge).or_insert((0, 0));
                if oe.forward == same_sense {
                    entry.0 += 1;
                } else {
                    entry.1 += 1;
                }
            }
        }
        Ok(counts)
    }

    /// Every edge used exactly once in each direction.
    pub fn is_manifold(&self, solid: Handle) -> Result<bool> {
        Ok(self
            .edge_use_counts(solid)?
            .values()
            .all(|&(forward, reverse)| forward == 1 && reverse == 1))
    }

    /// Axis-aligned bounds of a B-Rep solid: its vertices plus the analytic
    /// extents of circles, spheres and tori (which have few or no vertices).
    pub fn solid_bounding_box(&self, solid: Handle) -> Result<BoundingBox> {
        let mut bbox = BoundingBox::empty();
        for vertex in self.solid_vertices(solid)? {
            bbox.expand_to_include(&self.vertex_point(vertex)?);
        }
        for edge in self.solid_edges(solid)? {
            if let Curve::Circle { placement, radius } = self.curve(self.edge(edge)?.curve)? {
                let frame = self.placement_frame(*placement)?;
                bbox.include_circle(&frame.origin, &frame.z, *radius);
            }
        }
        for face in self.solid_faces(solid)? {
            match self.surface(self.face(face)?.surface)? {
                Surface::Sphere { placement, radius } => {
                    let center = self.placement_frame(*placement)?.origin;
                    let r = Vector3::repeat(*radius);
                    bbox.expand_to_include(&(center - r));
                    bbox.expand_to_include(&(center + r));
                }
                Surface::Torus {
                    placement,
                    major_radius,
                    minor_radius,
                } => {
                    let frame = self.placement_frame(*placement)?;
                    for offset in [-*minor_radius, *minor_radius] {
                        let center = frame.origin + frame.z * offset;
                        bbox.include_circle(&center, &frame.z, major_radius + minor_radius);
                    }
                }
                _ => {}
            }
        }
        Ok(bbox)
    }
}
