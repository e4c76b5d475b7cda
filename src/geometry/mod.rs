// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Geometry module - meshes, primitives, tessellation and Booleans

pub mod analytics;
mod bbox;
mod boolean;
pub mod csg;
mod mesh;
pub mod primitives;
pub mod tessellate;

pub use analytics::{analyze, GeometryStats};
pub use bbox::BoundingBox;
pub use boolean::{perform_boolean_operation, BooleanOp};
pub use mesh::{Mesh, Triangle};
pub use primitives::Primitive;
pub use tessellate::Tessellator;
