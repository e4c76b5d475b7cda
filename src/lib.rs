// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Stockform solid kernel
//!
//! Turns a stock blank and a list of manufacturing features into a solid:
//! B-Rep entities in a handle-addressed arena, surface-aware tessellation,
//! BSP-tree mesh Booleans, and mesh/entity exporters.

pub mod builder;
pub mod config;
pub mod error;
pub mod features;
pub mod geometry;
pub mod io;
pub mod topology;
pub mod utils;

pub use builder::{BuildOutput, BuildSession, Model, ModelBuilder};
pub use config::KernelConfig;
pub use error::{KernelError, Result};
pub use features::{FeatureDescriptor, FeatureKind, StockDescriptor};
pub use geometry::{BooleanOp, Mesh, Primitive};
pub use io::{Job, MeshBuffer};
pub use topology::{EntityArena, Handle};

/// Build a model with the default configuration
pub fn build(
    stock: Option<&StockDescriptor>,
    features: &[FeatureDescriptor],
) -> Result<BuildOutput> {
    ModelBuilder::default().build(stock, features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_basic_hole() {
        let hole = FeatureDescriptor::hole(Point3::new(50.0, 50.0, 50.0), 10.0, 10.0);
        let output = build(None, &[hole]).unwrap();
        assert_eq!(output.metadata.applied, vec![0]);
        assert!(output.metadata.volume < 500_000.0);
    }
}
