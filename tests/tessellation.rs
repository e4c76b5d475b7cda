// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Tessellation counts and bounds

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use stockform::config::TessellationConfig;
use stockform::geometry::analytics::analyze;
use stockform::geometry::tessellate::tessellate_solid;
use stockform::utils::Frame;
use stockform::{EntityArena, Primitive};

#[test]
fn test_unit_sphere_counts_and_bounds() -> Result<()> {
    let config = TessellationConfig {
        sphere_rings: 16,
        sphere_segments: 32,
        ..TessellationConfig::default()
    };
    let mut arena = EntityArena::new();
    let sphere = Primitive::sphere(Point3::origin(), 1.0).build(&mut arena);
    let mesh = tessellate_solid(&arena, sphere, &config)?;

    assert_eq!(mesh.triangle_count(), 2 * 16 * 32 - 2 * 32);
    let bbox = mesh.bounding_box();
    for axis in 0..3 {
        assert_relative_eq!(bbox.min[axis], -1.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.max[axis], 1.0, epsilon = 1e-9);
    }
    Ok(())
}

#[test]
fn test_resolution_follows_config() -> Result<()> {
    let mut arena = EntityArena::new();
    let cylinder = Primitive::cylinder(Frame::world(), 5.0, 10.0).build(&mut arena);

    let coarse = TessellationConfig {
        angular_segments: 8,
        ..TessellationConfig::default()
    };
    let fine = TessellationConfig {
        angular_segments: 64,
        ..TessellationConfig::default()
    };
    let coarse_mesh = tessellate_solid(&arena, cylinder, &coarse)?;
    let fine_mesh = tessellate_solid(&arena, cylinder, &fine)?;

    assert!(fine_mesh.triangle_count() > coarse_mesh.triangle_count());
    let exact = std::f64::consts::PI * 25.0 * 10.0;
    let coarse_err = (exact - analyze(&coarse_mesh).volume).abs();
    let fine_err = (exact - analyze(&fine_mesh).volume).abs();
    assert!(fine_err < coarse_err);
    Ok(())
}

#[test]
fn test_closed_primitives_have_positive_volume() -> Result<()> {
    let mut arena = EntityArena::new();
    let solids = [
        Primitive::cuboid(Point3::new(-1.0, -2.0, -3.0), Vector3::new(2.0, 4.0, 6.0))
            .build(&mut arena),
        Primitive::cone(Frame::world(), 4.0, 1.0, 6.0).build(&mut arena),
        Primitive::cone(Frame::world(), 3.0, 0.0, 5.0).build(&mut arena),
        Primitive::torus(Frame::world(), 10.0, 2.0).build(&mut arena),
    ];
    for solid in solids {
        let stats = analyze(&tessellate_solid(&arena, solid, &TessellationConfig::default())?);
        assert!(stats.volume > 0.0);
        assert!(stats.surface_area > 0.0);
    }
    Ok(())
}

#[test]
fn test_box_is_twelve_triangles() -> Result<()> {
    let mut arena = EntityArena::new();
    let cube = Primitive::cuboid(Point3::origin(), Vector3::new(3.0, 3.0, 3.0)).build(&mut arena);
    let stats = analyze(&tessellate_solid(&arena, cube, &TessellationConfig::default())?);
    assert_eq!(stats.triangle_count, 12);
    assert_relative_eq!(stats.volume, 27.0, epsilon = 1e-9);
    assert!(stats.is_watertight);
    Ok(())
}
