// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Geometric primitives built directly as topology-graph solids
//!
//! Loops are wound counter-clockwise around the outward normal of their face
//! and every edge is created once, then used by its two faces in opposite
//! directions. Sizes are not validated here.

use crate::topology::{EntityArena, Handle, OrientedEdge};
use crate::utils::math::{Frame, DEGENERATE_LENGTH};
use nalgebra::{Point2, Point3, Vector2, Vector3};

/// Geometric primitives
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Box with one corner at the frame origin, spanning +x, +y, +z
    Cuboid { frame: Frame, size: Vector3<f64> },
    /// Planar profile (frame XY coordinates) extruded `height` along +z
    Prism {
        frame: Frame,
        profile: Vec<Point2<f64>>,
        height: f64,
    },
    /// Base circle centered at the frame origin, extruded along +z
    Cylinder { frame: Frame, radius: f64, height: f64 },
    /// Frustum from `bottom_radius` at the origin to `top_radius` at `height`
    Cone {
        frame: Frame,
        bottom_radius: f64,
        top_radius: f64,
        height: f64,
    },
    Sphere { frame: Frame, radius: f64 },
    Torus {
        frame: Frame,
        major_radius: f64,
        minor_radius: f64,
    },
}

impl Primitive {
    pub fn cuboid(corner: Point3<f64>, size: Vector3<f64>) -> Self {
        Self::Cuboid {
            frame: Frame::at(corner),
            size,
        }
    }

    pub fn prism(frame: Frame, profile: Vec<Point2<f64>>, height: f64) -> Self {
        Self::Prism {
            frame,
            profile,
            height,
        }
    }

    pub fn cylinder(frame: Frame, radius: f64, height: f64) -> Self {
        Self::Cylinder {
            frame,
            radius,
            height,
        }
    }

    pub fn cone(frame: Frame, bottom_radius: f64, top_radius: f64, height: f64) -> Self {
        Self::Cone {
            frame,
            bottom_radius,
            top_radius,
            height,
        }
    }

    pub fn sphere(center: Point3<f64>, radius: f64) -> Self {
        Self::Sphere {
            frame: Frame::at(center),
            radius,
        }
    }

    pub fn torus(frame: Frame, major_radius: f64, minor_radius: f64) -> Self {
        Self::Torus {
            frame,
            major_radius,
            minor_radius,
        }
    }

    /// Create the solid's entities in `arena` and return the solid handle
    pub fn build(&self, arena: &mut EntityArena) -> Handle {
        match self {
            Self::Cuboid { frame, size } => make_box(arena, frame, *size),
            Self::Prism {
                frame,
                profile,
                height,
            } => make_prism(arena, frame, profile, *height),
            Self::Cylinder {
                frame,
                radius,
                height,
            } => make_frustum(arena, frame, *radius, *radius, *height),
            Self::Cone {
                frame,
                bottom_radius,
                top_radius,
                height,
            } => make_frustum(arena, frame, *bottom_radius, *top_radius, *height),
            Self::Sphere { frame, radius } => make_sphere(arena, frame, *radius),
            Self::Torus {
                frame,
                major_radius,
                minor_radius,
            } => make_torus(arena, frame, *major_radius, *minor_radius),
        }
    }
}

pub fn make_box(arena: &mut EntityArena, frame: &Frame, size: Vector3<f64>) -> Handle {
    let profile = vec![
        Point2::new(0.0, 0.0),
        Point2::new(size.x, 0.0),
        Point2::new(size.x, size.y),
        Point2::new(0.0, size.y),
    ];
    make_prism(arena, frame, &profile, size.z)
}

/// Twice the signed area of a closed 2D polygon
fn signed_area2(profile: &[Point2<f64>]) -> f64 {
    let n = profile.len();
    (0..n)
        .map(|i| {
            let a = profile[i];
            let b = profile[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum()
}

/// Vertex with the point entity and position behind it
#[derive(Clone, Copy)]
struct Corner {
    vertex: Handle,
    point: Handle,
    at: Point3<f64>,
}

impl Corner {
    fn create(arena: &mut EntityArena, at: Point3<f64>) -> Self {
        let point = arena.create_point_at(&at);
        let vertex = arena.create_vertex(point);
        Self { vertex, point, at }
    }
}

fn line_edge(arena: &mut EntityArena, from: Corner, to: Corner) -> Handle {
    let direction = arena.create_direction_from(&(to.at - from.at));
    let line = arena.create_line(from.point, direction);
    arena.create_edge(from.vertex, to.vertex, line, true)
}

fn planar_face(
    arena: &mut EntityArena,
    origin: Point3<f64>,
    normal: Vector3<f64>,
    reference: Vector3<f64>,
    edges: Vec<OrientedEdge>,
) -> Handle {
    let placement = arena.create_placement_for(&Frame::from_axis(origin, normal, reference));
    let plane = arena.create_plane(placement);
    let edge_loop = arena.create_loop(edges);
    let bound = arena.create_face_bound(edge_loop, true, true);
    arena.create_face(vec![bound], plane, true)
}

/// Extrude a closed planar profile into a prism solid.
///
/// The profile may be given in either winding; it is normalized to
/// counter-clockwise around the frame's +z axis.
pub fn make_prism(
    arena: &mut EntityArena,
    frame: &Frame,
    profile: &[Point2<f64>],
    height: f64,
) -> Handle {
    let mut profile = profile.to_vec();
    if signed_area2(&profile) < 0.0 {
        profile.reverse();
    }
    let n = profile.len();

    let mut bottom = Vec::with_capacity(n);
    let mut top = Vec::with_capacity(n);
    for p in &profile {
        bottom.push(Corner::create(arena, frame.point(p.x, p.y, 0.0)));
        top.push(Corner::create(arena, frame.point(p.x, p.y, height)));
    }

    let bottom_edges: Vec<Handle> = (0..n)
        .map(|i| line_edge(arena, bottom[i], bottom[(i + 1) % n]))
        .collect();
    let top_edges: Vec<Handle> = (0..n)
        .map(|i| line_edge(arena, top[i], top[(i + 1) % n]))
        .collect();
    let vertical_edges: Vec<Handle> = (0..n).map(|i| line_edge(arena, bottom[i], top[i])).collect();

    let mut faces = Vec::with_capacity(n + 2);

    // Bottom faces -z: walk the bottom ring backwards
    let bottom_loop = (0..n).rev().map(|i| OrientedEdge::reversed(bottom_edges[i])).collect();
    faces.push(planar_face(arena, bottom[0].at, -frame.z, frame.x, bottom_loop));

    let top_loop = top_edges.iter().map(|&e| OrientedEdge::forward(e)).collect();
    faces.push(planar_face(arena, top[0].at, frame.z, frame.x, top_loop));

    for i in 0..n {
        let j = (i + 1) % n;
        let along = bottom[j].at - bottom[i].at;
        let outward = along.cross(&frame.z);
        let side_loop = vec![
            OrientedEdge::forward(bottom_edges[i]),
            OrientedEdge::forward(vertical_edges[j]),
            OrientedEdge::reversed(top_edges[i]),
            OrientedEdge::reversed(vertical_edges[i]),
        ];
        faces.push(planar_face(arena, bottom[i].at, outward, along, side_loop));
    }

    let shell = arena.create_shell(faces);
    arena.create_solid(shell)
}

/// Full circle edge at height `w` with its seam vertex on the frame's +x side
fn circle_edge(arena: &mut EntityArena, frame: &Frame, radius: f64, w: f64) -> Handle {
    let ring = frame.offset_along_axis(w);
    let placement = arena.create_placement_for(&ring);
    let circle = arena.create_circle(placement, radius);
    let seam = Corner::create(arena, ring.point(radius, 0.0, 0.0));
    arena.create_edge(seam.vertex, seam.vertex, circle, true)
}

fn disk_face(
    arena: &mut EntityArena,
    ring: &Frame,
    normal: Vector3<f64>,
    edge: OrientedEdge,
) -> Handle {
    planar_face(arena, ring.origin, normal, ring.x, vec![edge])
}

/// Cylinder or cone frustum around the frame's z axis.
///
/// A zero end radius collapses that end to an apex: no circle, no cap.
pub fn make_frustum(
    arena: &mut EntityArena,
    frame: &Frame,
    bottom_radius: f64,
    top_radius: f64,
    height: f64,
) -> Handle {
    let has_bottom = bottom_radius > DEGENERATE_LENGTH;
    let has_top = top_radius > DEGENERATE_LENGTH;

    let bottom_edge = has_bottom.then(|| circle_edge(arena, frame, bottom_radius, 0.0));
    let top_edge = has_top.then(|| circle_edge(arena, frame, top_radius, height));

    let placement = arena.create_placement_for(frame);
    let side_surface = if (bottom_radius - top_radius).abs() <= DEGENERATE_LENGTH {
        arena.create_cylindrical_surface(placement, bottom_radius)
    } else {
        let semi_angle = (top_radius - bottom_radius).atan2(height);
        arena.create_conical_surface(placement, bottom_radius, semi_angle)
    };

    let mut side_bounds = Vec::with_capacity(2);
    if let Some(edge) = bottom_edge {
        let lp = arena.create_loop(vec![OrientedEdge::forward(edge)]);
        side_bounds.push(arena.create_face_bound(lp, true, true));
    }
    if let Some(edge) = top_edge {
        let lp = arena.create_loop(vec![OrientedEdge::reversed(edge)]);
        let outer = side_bounds.is_empty();
        side_bounds.push(arena.create_face_bound(lp, outer, true));
    }

    let mut faces = Vec::with_capacity(3);
    if let Some(edge) = bottom_edge {
        faces.push(disk_face(arena, frame, -frame.z, OrientedEdge::reversed(edge)));
    }
    faces.push(arena.create_face(side_bounds, side_surface, true));
    if let Some(edge) = top_edge {
        let ring = frame.offset_along_axis(height);
        faces.push(disk_face(arena, &ring, frame.z, OrientedEdge::forward(edge)));
    }

    let shell = arena.create_shell(faces);
    arena.create_solid(shell)
}

/// Sphere: one closed face without bounds
pub fn make_sphere(arena: &mut EntityArena, frame: &Frame, radius: f64) -> Handle {
    let placement = arena.create_placement_for(frame);
    let surface = arena.create_spherical_surface(placement, radius);
    let face = arena.create_face(Vec::new(), surface, true);
    let shell = arena.create_shell(vec![face]);
    arena.create_solid(shell)
}

/// Torus around the frame's z axis: one closed face without bounds
pub fn make_torus(
    arena: &mut EntityArena,
    frame: &Frame,
    major_radius: f64,
    minor_radius: f64,
) -> Handle {
    let placement = arena.create_placement_for(frame);
    let surface = arena.create_toroidal_surface(placement, major_radius, minor_radius);
    let face = arena.create_face(Vec::new(), surface, true);
    let shell = arena.create_shell(vec![face]);
    arena.create_solid(shell)
}

/// Rectangle `length × width` from the origin with `corner_radius` rounded
/// corners, each approximated by `corner_segments` straight segments.
pub fn rounded_rectangle(
    length: f64,
    width: f64,
    corner_radius: f64,
    corner_segments: usize,
) -> Vec<Point2<f64>> {
    let r = corner_radius.min(length / 2.0).min(width / 2.0).max(0.0);
    if r <= DEGENERATE_LENGTH {
        return vec![
            Point2::new(0.0, 0.0),
            Point2::new(length, 0.0),
            Point2::new(length, width),
            Point2::new(0.0, width),
        ];
    }

    let corners = [
        (Point2::new(length - r, r), -std::f64::consts::FRAC_PI_2),
        (Point2::new(length - r, width - r), 0.0),
        (Point2::new(r, width - r), std::f64::consts::FRAC_PI_2),
        (Point2::new(r, r), std::f64::consts::PI),
    ];
    let segments = corner_segments.max(1);
    let mut profile = Vec::with_capacity(4 * (segments + 1));
    for (center, start) in corners {
        for k in 0..=segments {
            let angle = start + std::f64::consts::FRAC_PI_2 * k as f64 / segments as f64;
            let p = center + Vector2::new(angle.cos(), angle.sin()) * r;
            // Adjacent arcs meet at distinct points unless the straight run is empty
            let distinct = profile
                .last()
                .map_or(true, |last: &Point2<f64>| (last - p).norm() > DEGENERATE_LENGTH);
            if distinct {
                profile.push(p);
            }
        }
    }
    if profile.len() > 1 && (profile[0] - profile[profile.len() - 1]).norm() <= DEGENERATE_LENGTH {
        profile.pop();
    }
    profile
}

/// Stadium (obround) profile: `length` overall along x, `width` across,
/// semicircular ends sampled with `end_segments` segments each.
pub fn stadium(length: f64, width: f64, end_segments: usize) -> Vec<Point2<f64>> {
    let r = width / 2.0;
    rounded_rectangle(length.max(width), width, r, end_segments.max(2) / 2)
}
