// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Math utilities: frames, arcs, helices and B-spline evaluation

use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Vectors shorter than this are treated as zero.
pub const DEGENERATE_LENGTH: f64 = 1e-10;

/// Normalize `v`, or return `fallback` when `v` is (nearly) zero.
pub fn normalize_or(v: Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    let len = v.norm();
    if len < DEGENERATE_LENGTH || !len.is_finite() {
        fallback
    } else {
        v / len
    }
}

/// Unnormalized normal of a triangle (twice its area in magnitude)
pub fn triangle_normal(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Vector3<f64> {
    (p1 - p0).cross(&(p2 - p0))
}

/// Convert degrees to radians
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Right-handed orthonormal frame: `z` is the axis, `x` the reference direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub origin: Point3<f64>,
    pub x: Vector3<f64>,
    pub y: Vector3<f64>,
    pub z: Vector3<f64>,
}

impl Frame {
    pub fn world() -> Self {
        Self {
            origin: Point3::origin(),
            x: Vector3::x(),
            y: Vector3::y(),
            z: Vector3::z(),
        }
    }

    /// Build a frame from an axis and a reference direction.
    ///
    /// The reference is projected onto the plane normal to the axis; if it is
    /// parallel to the axis, an arbitrary perpendicular is chosen instead.
    pub fn from_axis(origin: Point3<f64>, axis: Vector3<f64>, reference: Vector3<f64>) -> Self {
        let z = normalize_or(axis, Vector3::z());
        let projected = reference - z * reference.dot(&z);
        let x = if projected.norm() < 1e-9 {
            any_perpendicular(&z)
        } else {
            projected.normalize()
        };
        let y = z.cross(&x);
        Self { origin, x, y, z }
    }

    pub fn at(origin: Point3<f64>) -> Self {
        Self {
            origin,
            ..Self::world()
        }
    }

    /// Map local coordinates to world space.
    pub fn point(&self, u: f64, v: f64, w: f64) -> Point3<f64> {
        self.origin + self.x * u + self.y * v + self.z * w
    }

    /// Express a world point in local coordinates.
    pub fn local(&self, p: &Point3<f64>) -> Vector3<f64> {
        let d = p - self.origin;
        Vector3::new(d.dot(&self.x), d.dot(&self.y), d.dot(&self.z))
    }

    /// Same orientation, origin moved along the axis.
    pub fn offset_along_axis(&self, distance: f64) -> Self {
        Self {
            origin: self.origin + self.z * distance,
            ..*self
        }
    }
}

/// A unit vector perpendicular to `v` (assumed normalized).
pub fn any_perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let projected = helper - v * helper.dot(v);
    projected.normalize()
}

/// Point on a circle of `radius` in the frame's XY plane at height `w`.
pub fn arc_point(frame: &Frame, radius: f64, angle: f64, w: f64) -> Point3<f64> {
    frame.point(radius * angle.cos(), radius * angle.sin(), w)
}

/// Point on a right-handed helix around the frame axis after `angle` radians.
pub fn helix_point(frame: &Frame, radius: f64, pitch: f64, angle: f64) -> Point3<f64> {
    let w = pitch * angle / (2.0 * PI);
    arc_point(frame, radius, angle, w)
}

/// Samples along a helix: `turns * segments_per_turn` intervals, endpoints included.
pub fn helix_samples(
    frame: &Frame,
    radius: f64,
    pitch: f64,
    turns: f64,
    segments_per_turn: usize,
) -> Vec<Point3<f64>> {
    let intervals = ((turns * segments_per_turn as f64).ceil() as usize).max(1);
    let total_angle = turns * 2.0 * PI;
    (0..=intervals)
        .map(|i| helix_point(frame, radius, pitch, total_angle * i as f64 / intervals as f64))
        .collect()
}

/// Clamped uniform knot vector for `control_count` control points of `degree`.
///
/// Domain is `[0, 1]`; the end knots carry multiplicity `degree + 1`.
pub fn clamped_uniform_knots(control_count: usize, degree: usize) -> Vec<f64> {
    let knot_count = control_count + degree + 1;
    let interior = control_count.saturating_sub(degree + 1);
    let mut knots = Vec::with_capacity(knot_count);
    knots.extend(std::iter::repeat(0.0).take(degree + 1));
    for i in 1..=interior {
        knots.push(i as f64 / (interior + 1) as f64);
    }
    knots.extend(std::iter::repeat(1.0).take(degree + 1));
    knots
}

/// Knot span index `s` with `knots[s] <= t < knots[s + 1]`, clamped to the domain.
fn find_span(last: usize, degree: usize, t: f64, knots: &[f64]) -> usize {
    if t >= knots[last + 1] {
        return last;
    }
    if t <= knots[degree] {
        return degree;
    }
    let mut lo = degree;
    let mut hi = last + 1;
    let mut mid = (lo + hi) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            hi = mid;
        } else {
            lo = mid;
        }
        mid = (lo + hi) / 2;
    }
    mid
}

/// Non-zero Cox-de Boor basis functions at `t`.
fn basis_functions(span: usize, t: f64, degree: usize, knots: &[f64]) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;
    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom.abs() < f64::EPSILON { 0.0 } else { n[r] / denom };
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}

/// Evaluate a non-rational B-spline curve.
///
/// Returns `None` when the knot vector does not match `control.len() + degree + 1`.
pub fn bspline_point(
    degree: usize,
    control: &[Point3<f64>],
    knots: &[f64],
    t: f64,
) -> Option<Point3<f64>> {
    if control.is_empty() || knots.len() != control.len() + degree + 1 {
        return None;
    }
    let last = control.len() - 1;
    let span = find_span(last, degree, t, knots);
    let basis = basis_functions(span, t, degree, knots);
    let mut acc = Vector3::zeros();
    for (i, weight) in basis.iter().enumerate() {
        acc += control[span - degree + i].coords * *weight;
    }
    Some(Point3::from(acc))
}

/// Parameter domain `[knots[degree], knots[len - degree - 1]]`.
pub fn bspline_domain(degree: usize, knots: &[f64]) -> (f64, f64) {
    if knots.len() < 2 * (degree + 1) {
        return (0.0, 1.0);
    }
    (knots[degree], knots[knots.len() - degree - 1])
}
