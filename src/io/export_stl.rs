// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Binary STL exporter

use crate::geometry::Mesh;
use anyhow::{Context, Result};
use std::io::Write;
use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

/// Write `mesh` as binary STL; facet normals come from the triangle geometry.
pub fn write_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> Result<()> {
    let triangles: Vec<StlTriangle> = mesh
        .triangles
        .iter()
        .map(|tri| {
            let n = tri.normal();
            let [a, b, c] = tri
                .vertices
                .map(|p| StlVertex::new([p.x as f32, p.y as f32, p.z as f32]));
            StlTriangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [a, b, c],
            }
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter()).context("Failed to write STL")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use nalgebra::Point3;
    use std::io::Cursor;

    #[test]
    fn test_binary_layout_and_read_back() -> Result<()> {
        let mesh = Mesh::from_triangles(vec![
            Triangle::new(
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ),
            Triangle::new(
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(0.0, 1.0, 1.0),
                Point3::new(1.0, 0.0, 1.0),
            ),
        ]);
        let mut out = Vec::new();
        write_stl(&mesh, &mut out)?;
        assert_eq!(out.len(), 84 + 50 * 2);

        let indexed = stl_io::read_stl(&mut Cursor::new(out))?;
        assert_eq!(indexed.faces.len(), 2);
        assert_eq!(indexed.faces[1].normal, Normal::new([0.0, 0.0, -1.0]));
        Ok(())
    }
}
