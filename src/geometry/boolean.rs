// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Boolean operations on closed triangle meshes

use super::{csg, Mesh};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanOp {
    Union,
    #[serde(alias = "difference")]
    Subtract,
    #[serde(alias = "intersection")]
    Intersect,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Union => "union",
            Self::Subtract => "subtract",
            Self::Intersect => "intersect",
        };
        f.write_str(name)
    }
}

/// Perform boolean operation between two meshes
pub fn perform_boolean_operation(
    mesh_a: &Mesh,
    mesh_b: &Mesh,
    op: BooleanOp,
    epsilon: f64,
) -> Result<Mesh> {
    let result = match op {
        BooleanOp::Union => csg::union(mesh_a, mesh_b, epsilon)?,
        BooleanOp::Subtract => csg::subtract(mesh_a, mesh_b, epsilon)?,
        BooleanOp::Intersect => csg::intersect(mesh_a, mesh_b, epsilon)?,
    };
    tracing::debug!(
        "{} of {} and {} triangles gave {}",
        op,
        mesh_a.triangle_count(),
        mesh_b.triangle_count(),
        result.triangle_count()
    );
    Ok(result)
}
