// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Model builder - stock, ordered features, skip-on-error Booleans

mod ordering;
mod session;

pub use ordering::order_features;
pub use session::{BuildSession, BuildState, FeatureOutcome};

use crate::config::KernelConfig;
use crate::error::Result;
use crate::features::{EdgeTreatment, FeatureDescriptor, FeatureKind, StockDescriptor};
use crate::geometry::tessellate::Tessellator;
use crate::geometry::{BoundingBox, Mesh};
use crate::topology::{EntityArena, Handle};
use serde::Serialize;

/// Current shape of the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ModelBody {
    /// Untouched stock solid
    Brep(Handle),
    /// Result of the most recent Boolean
    Mesh(Mesh),
}

/// Finished model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    pub body: ModelBody,
    pub edge_treatments: Vec<EdgeTreatment>,
    pub bounding_box: BoundingBox,
}

impl Model {
    /// Triangle mesh of the body; a B-Rep body is tessellated from `arena`.
    pub fn mesh(&self, arena: &EntityArena, config: &KernelConfig) -> Result<Mesh> {
        match &self.body {
            ModelBody::Mesh(mesh) => Ok(mesh.clone()),
            ModelBody::Brep(solid) => {
                Tessellator::new(arena, &config.tessellation).tessellate_solid(*solid)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFeature {
    /// Position in the caller's feature list
    pub index: usize,
    pub kind: FeatureKind,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildMetadata {
    /// Caller indices of applied and deferred features, in application order
    pub applied: Vec<usize>,
    pub skipped: Vec<SkippedFeature>,
    /// Thread helix curves kept for display
    pub tool_curves: Vec<Handle>,
    pub triangle_count: usize,
    pub volume: f64,
}

impl BuildMetadata {
    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Everything a finished build produced
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub model: Model,
    pub metadata: BuildMetadata,
    /// Entities created during the build (stock, tool bodies, curves)
    pub arena: EntityArena,
}

impl BuildOutput {
    pub fn mesh(&self, config: &KernelConfig) -> Result<Mesh> {
        self.model.mesh(&self.arena, config)
    }
}

/// Runs complete builds, each in a fresh session
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    config: KernelConfig,
}

impl ModelBuilder {
    /// Builder for `config`; out-of-range settings are rejected up front.
    pub fn new(config: KernelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Create the stock, apply `features` in machining order and finalize.
    ///
    /// Only invalid stock or a programmer error aborts the build; bad
    /// features are skipped and reported in the metadata.
    pub fn build(
        &self,
        stock: Option<&StockDescriptor>,
        features: &[FeatureDescriptor],
    ) -> Result<BuildOutput> {
        let mut session = BuildSession::new(self.config.clone())?;
        session.create_stock(stock)?;
        for index in order_features(features) {
            session.apply_feature(index, &features[index])?;
        }
        session.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Dimensions, FeatureKind};
    use nalgebra::Point3;

    #[test]
    fn test_empty_build_keeps_brep() {
        let output = ModelBuilder::default().build(None, &[]).unwrap();
        assert!(matches!(output.model.body, ModelBody::Brep(_)));
        let bbox = output.model.bounding_box;
        assert_eq!(bbox.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.max, Point3::new(100.0, 100.0, 50.0));
        assert!((output.metadata.volume - 500_000.0).abs() < 1e-6);
        assert_eq!(output.metadata.triangle_count, 12);
    }

    #[test]
    fn test_edge_treatments_are_deferred() {
        let fillet = FeatureDescriptor::new(FeatureKind::Fillet, Point3::origin())
            .with_dimensions(Dimensions {
                radius: Some(1.0),
                ..Dimensions::default()
            });
        let chamfer = FeatureDescriptor::new(FeatureKind::Chamfer, Point3::origin())
            .with_dimensions(Dimensions {
                distance: Some(0.0),
                ..Dimensions::default()
            });
        let output = ModelBuilder::default().build(None, &[chamfer, fillet]).unwrap();
        assert_eq!(output.model.edge_treatments.len(), 1);
        assert_eq!(output.metadata.applied, vec![1]);
        assert_eq!(output.metadata.skip_count(), 1);
        assert!(matches!(output.model.body, ModelBody::Brep(_)));
    }

    #[test]
    fn test_thread_curve_recorded() {
        let thread = FeatureDescriptor::new(FeatureKind::Thread, Point3::new(50.0, 50.0, 50.0))
            .with_dimensions(Dimensions {
                major_diameter: Some(8.0),
                pitch: Some(1.25),
                length: Some(10.0),
                ..Dimensions::default()
            });
        let output = ModelBuilder::default().build(None, &[thread]).unwrap();
        assert_eq!(output.metadata.tool_curves.len(), 1);
        assert!(output.arena.curve(output.metadata.tool_curves[0]).is_ok());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = KernelConfig::default();
        config.tessellation.angular_segments = 0;
        assert!(matches!(
            ModelBuilder::new(config),
            Err(crate::error::KernelError::Config(_))
        ));

        let mut config = KernelConfig::default();
        config.boolean.epsilon = -1e-6;
        assert!(ModelBuilder::new(config).is_err());
        assert!(ModelBuilder::new(KernelConfig::default()).is_ok());
    }
}
