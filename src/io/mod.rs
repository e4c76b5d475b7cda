// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! I/O module - config and job files, mesh/entity exporters

mod config_file;
pub mod entity_export;
pub mod export_gltf;
pub mod export_stl;
pub mod job;
mod mesh_buffer;

pub use entity_export::{write_part21, EntityListing, FlatEntity, FlatValue};
pub use export_gltf::{write_glb, write_gltf};
pub use export_stl::write_stl;
pub use job::Job;
pub use mesh_buffer::MeshBuffer;

use crate::config::ExportConfig;
use crate::geometry::Mesh;

/// Mesh buffer honoring the export weld settings
pub fn mesh_buffer(mesh: &Mesh, config: &ExportConfig) -> MeshBuffer {
    if config.weld {
        MeshBuffer::welded(mesh, config.weld_epsilon)
    } else {
        MeshBuffer::from_mesh(mesh)
    }
}
