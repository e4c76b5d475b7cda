// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Entity definitions stored in the arena

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, monotonically increasing entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Handle(u64);

impl Handle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Origin + axis + reference direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub origin: Handle,
    pub axis: Handle,
    pub ref_direction: Handle,
}

/// Bounded, non-rational B-spline curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BSplineCurve {
    pub degree: usize,
    pub control_points: Vec<Handle>,
    pub knots: Vec<f64>,
}

/// Curve geometry backing an edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Curve {
    Line { origin: Handle, direction: Handle },
    Circle { placement: Handle, radius: f64 },
    Ellipse { placement: Handle, semi_major: f64, semi_minor: f64 },
    BSpline(BSplineCurve),
}

/// Bounded, non-rational B-spline surface; control rows run along `u`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BSplineSurface {
    pub u_degree: usize,
    pub v_degree: usize,
    pub control_points: Vec<Vec<Handle>>,
    pub u_knots: Vec<f64>,
    pub v_knots: Vec<f64>,
}

/// Analytic or spline surface backing a face.
///
/// Every analytic surface is positioned by a placement whose axis is the
/// surface normal (plane) or symmetry axis (cylinder, cone, sphere, torus).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Surface {
    Plane { placement: Handle },
    Cylinder { placement: Handle, radius: f64 },
    /// Radius at the placement origin; the radius grows by `tan(semi_angle)`
    /// per unit along the axis (negative angles narrow).
    Cone { placement: Handle, radius: f64, semi_angle: f64 },
    Sphere { placement: Handle, radius: f64 },
    Torus { placement: Handle, major_radius: f64, minor_radius: f64 },
    BSpline(BSplineSurface),
}

impl Surface {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Surface::Plane { .. } => "plane",
            Surface::Cylinder { .. } => "cylindrical_surface",
            Surface::Cone { .. } => "conical_surface",
            Surface::Sphere { .. } => "spherical_surface",
            Surface::Torus { .. } => "toroidal_surface",
            Surface::BSpline(_) => "b_spline_surface",
        }
    }

    pub fn placement(&self) -> Option<Handle> {
        match self {
            Surface::Plane { placement }
            | Surface::Cylinder { placement, .. }
            | Surface::Cone { placement, .. }
            | Surface::Sphere { placement, .. }
            | Surface::Torus { placement, .. } => Some(*placement),
            Surface::BSpline(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub point: Handle,
}

/// Edge between two vertices along a curve; `same_sense` tells whether the
/// start-to-end traversal follows the curve's own parameterization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeCurve {
    pub start: Handle,
    pub end: Handle,
    pub curve: Handle,
    pub same_sense: bool,
}

impl EdgeCurve {
    /// Closed edges (full circles) start and end on the same vertex.
    pub fn is_closed(&self) -> bool {
        self.start == self.end
    }
}

/// One use of an edge inside a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientedEdge {
    pub edge: Handle,
    pub forward: bool,
}

impl OrientedEdge {
    pub fn forward(edge: Handle) -> Self {
        Self { edge, forward: true }
    }

    pub fn reversed(edge: Handle) -> Self {
        Self { edge, forward: false }
    }
}

/// Ordered cyclic sequence of oriented edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeLoop {
    pub edges: Vec<OrientedEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBound {
    pub edge_loop: Handle,
    pub outer: bool,
    pub orientation: bool,
}

/// Face on a surface; `same_sense == false` flips the surface normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub bounds: Vec<Handle>,
    pub surface: Handle,
    pub same_sense: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shell {
    pub faces: Vec<Handle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    pub outer_shell: Handle,
}

/// Any entity in the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Point(Point3<f64>),
    Direction(Vector3<f64>),
    Placement(Placement),
    Curve(Curve),
    Surface(Surface),
    Vertex(Vertex),
    EdgeCurve(EdgeCurve),
    Loop(EdgeLoop),
    FaceBound(FaceBound),
    Face(Face),
    Shell(Shell),
    Solid(Solid),
}

impl Entity {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Entity::Point(_) => "point",
            Entity::Direction(_) => "direction",
            Entity::Placement(_) => "placement",
            Entity::Curve(Curve::Line { .. }) => "line",
            Entity::Curve(Curve::Circle { .. }) => "circle",
            Entity::Curve(Curve::Ellipse { .. }) => "ellipse",
            Entity::Curve(Curve::BSpline(_)) => "b_spline_curve",
            Entity::Surface(surface) => surface.kind_name(),
            Entity::Vertex(_) => "vertex",
            Entity::EdgeCurve(_) => "edge_curve",
            Entity::Loop(_) => "edge_loop",
            Entity::FaceBound(_) => "face_bound",
            Entity::Face(_) => "face",
            Entity::Shell(_) => "shell",
            Entity::Solid(_) => "solid",
        }
    }

    /// Every handle this entity refers to, in field order.
    pub fn references(&self) -> Vec<Handle> {
        match self {
            Entity::Point(_) | Entity::Direction(_) => Vec::new(),
            Entity::Placement(p) => vec![p.origin, p.axis, p.ref_direction],
            Entity::Curve(curve) => match curve {
                Curve::Line { origin, direction } => vec![*origin, *direction],
                Curve::Circle { placement, .. } | Curve::Ellipse { placement, .. } => {
                    vec![*placement]
                }
                Curve::BSpline(spline) => spline.control_points.clone(),
            },
            Entity::Surface(surface) => match surface {
                Surface::BSpline(spline) => {
                    spline.control_points.iter().flatten().copied().collect()
                }
                other => other.placement().into_iter().collect(),
            },
            Entity::Vertex(v) => vec![v.point],
            Entity::EdgeCurve(e) => vec![e.start, e.end, e.curve],
            Entity::Loop(l) => l.edges.iter().map(|oe| oe.edge).collect(),
            Entity::FaceBound(b) => vec![b.edge_loop],
            Entity::Face(f) => {
                let mut refs = f.bounds.clone();
                refs.push(f.surface);
                refs
            }
            Entity::Shell(s) => s.faces.clone(),
            Entity::Solid(s) => vec![s.outer_shell],
        }
    }
}
