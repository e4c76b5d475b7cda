// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Set identities of the BSP Boolean engine

use anyhow::Result;
use nalgebra::{Point3, Vector3};
use stockform::config::TessellationConfig;
use stockform::geometry::analytics::signed_volume;
use stockform::geometry::csg::{intersect, subtract, union};
use stockform::geometry::tessellate::tessellate_solid;
use stockform::utils::Frame;
use stockform::{EntityArena, Mesh, Primitive};

const EPS: f64 = 1e-6;

fn mesh_of(primitive: Primitive) -> Result<Mesh> {
    let mut arena = EntityArena::new();
    let solid = primitive.build(&mut arena);
    Ok(tessellate_solid(&arena, solid, &TessellationConfig::default())?)
}

fn assert_close(a: f64, b: f64, rel: f64) {
    assert!((a - b).abs() <= rel * b.abs().max(1e-9), "{a} vs {b}");
}

#[test]
fn test_double_subtract_equals_intersect_boxes() -> Result<()> {
    let a = mesh_of(Primitive::cuboid(Point3::origin(), Vector3::new(10.0, 10.0, 10.0)))?;
    let b = mesh_of(Primitive::cuboid(Point3::new(5.0, 5.0, 5.0), Vector3::new(10.0, 10.0, 10.0)))?;

    let via_subtract = subtract(&a, &subtract(&a, &b, EPS)?, EPS)?;
    let direct = intersect(&a, &b, EPS)?;

    assert_close(signed_volume(&via_subtract), signed_volume(&direct), 0.01);
    assert_close(signed_volume(&direct), 125.0, 1e-9);
    Ok(())
}

#[test]
fn test_double_subtract_equals_intersect_cylinder() -> Result<()> {
    let a = mesh_of(Primitive::cuboid(Point3::origin(), Vector3::new(10.0, 10.0, 10.0)))?;
    let b = mesh_of(Primitive::cylinder(Frame::at(Point3::new(5.0, 5.0, -5.0)), 3.0, 20.0))?;

    let via_subtract = subtract(&a, &subtract(&a, &b, EPS)?, EPS)?;
    let direct = intersect(&a, &b, EPS)?;

    assert_close(signed_volume(&via_subtract), signed_volume(&direct), 0.01);
    assert_close(signed_volume(&direct), std::f64::consts::PI * 9.0 * 10.0, 0.01);
    Ok(())
}

#[test]
fn test_inclusion_exclusion() -> Result<()> {
    let a = mesh_of(Primitive::cuboid(Point3::origin(), Vector3::new(10.0, 10.0, 10.0)))?;
    let b = mesh_of(Primitive::sphere(Point3::new(10.0, 5.0, 5.0), 4.0))?;

    let vu = signed_volume(&union(&a, &b, EPS)?);
    let vi = signed_volume(&intersect(&a, &b, EPS)?);
    let vd = signed_volume(&subtract(&a, &b, EPS)?);
    let (va, vb) = (signed_volume(&a), signed_volume(&b));

    assert_close(vu + vi, va + vb, 0.01);
    assert_close(vd + vi, va, 0.01);
    Ok(())
}

#[test]
fn test_subtract_disjoint_is_identity() -> Result<()> {
    let a = mesh_of(Primitive::cuboid(Point3::origin(), Vector3::new(10.0, 10.0, 10.0)))?;
    let far = mesh_of(Primitive::sphere(Point3::new(50.0, 0.0, 0.0), 2.0))?;
    assert_eq!(subtract(&a, &far, EPS)?, a);
    assert!(intersect(&a, &far, EPS)?.is_empty());
    Ok(())
}
