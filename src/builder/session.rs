// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Build session state machine

use super::{BuildMetadata, BuildOutput, Model, ModelBody, SkippedFeature};
use crate::config::KernelConfig;
use crate::error::{KernelError, Result};
use crate::features::{
    generate, EdgeTreatment, FeatureDescriptor, FeatureOutput, StockDescriptor, StockKind, ToolBody,
};
use crate::geometry::analytics::signed_volume;
use crate::geometry::primitives::{make_box, make_frustum};
use crate::geometry::tessellate::Tessellator;
use crate::geometry::{perform_boolean_operation, Mesh};
use crate::topology::{EntityArena, Handle};
use crate::utils::Frame;
use nalgebra::Vector3;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildState {
    Idle,
    StockCreated,
    ApplyingFeature,
    Finalized,
}

/// What happened to one feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureOutcome {
    /// Boolean-combined into the model
    Applied,
    /// Recorded as edge-treatment metadata
    Deferred,
    /// Rejected; the model is unchanged
    Skipped,
}

/// One model build: owns its arena, applies features in order.
pub struct BuildSession {
    config: KernelConfig,
    arena: EntityArena,
    state: BuildState,
    body: Option<ModelBody>,
    edge_treatments: Vec<EdgeTreatment>,
    metadata: BuildMetadata,
}

impl BuildSession {
    pub fn new(config: KernelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            arena: EntityArena::new(),
            state: BuildState::Idle,
            body: None,
            edge_treatments: Vec::new(),
            metadata: BuildMetadata::default(),
        })
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn arena(&self) -> &EntityArena {
        &self.arena
    }

    pub fn body(&self) -> Option<&ModelBody> {
        self.body.as_ref()
    }

    pub fn metadata(&self) -> &BuildMetadata {
        &self.metadata
    }

    /// Reset the arena and create the stock solid (100 × 100 × 50 block when `None`).
    pub fn create_stock(&mut self, stock: Option<&StockDescriptor>) -> Result<Handle> {
        self.arena.reset();
        self.body = None;
        self.edge_treatments.clear();
        self.metadata = BuildMetadata::default();
        self.state = BuildState::Idle;

        let default_stock = StockDescriptor::default();
        let stock = stock.unwrap_or(&default_stock);
        let solid = self.build_stock(stock)?;

        tracing::debug!("Created {:?} stock {}", stock.kind, solid);
        self.body = Some(ModelBody::Brep(solid));
        self.state = BuildState::StockCreated;
        Ok(solid)
    }

    fn build_stock(&mut self, stock: &StockDescriptor) -> Result<Handle> {
        let p = stock.position;
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return Err(KernelError::InvalidStockDimensions("position is not finite".into()));
        }
        let dims = &stock.dimensions;
        let frame = Frame::at(p);
        match stock.kind {
            StockKind::Block => {
                let length = stock_dimension("length", dims.length)?;
                let width = stock_dimension("width", dims.width)?;
                let height = stock_dimension("height", dims.height)?;
                Ok(make_box(&mut self.arena, &frame, Vector3::new(length, width, height)))
            }
            StockKind::Cylinder => {
                let radius = stock_dimension("diameter", dims.diameter)? / 2.0;
                let height = stock_dimension("height", dims.height.or(dims.length))?;
                Ok(make_frustum(&mut self.arena, &frame, radius, radius, height))
            }
        }
    }

    /// Apply one feature; recoverable failures become recorded skips.
    ///
    /// Creates the default stock first when called before [`create_stock`](Self::create_stock).
    pub fn apply_feature(
        &mut self,
        index: usize,
        feature: &FeatureDescriptor,
    ) -> Result<FeatureOutcome> {
        if self.body.is_none() {
            self.create_stock(None)?;
        }
        self.state = BuildState::ApplyingFeature;
        tracing::debug!("Applying feature {} ({})", index, feature.kind);

        let result = match generate(&mut self.arena, feature, &self.config.features) {
            Ok(FeatureOutput::Tool(tool)) => self.combine(&tool).map(|mesh| {
                self.body = Some(ModelBody::Mesh(mesh));
                self.metadata.applied.push(index);
                self.metadata.tool_curves.extend(tool.curves.iter().copied());
                FeatureOutcome::Applied
            }),
            Ok(FeatureOutput::EdgeTreatment(treatment)) => {
                self.edge_treatments.push(treatment);
                self.metadata.applied.push(index);
                Ok(FeatureOutcome::Deferred)
            }
            Err(e) => Err(e),
        };
        self.state = BuildState::StockCreated;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_recoverable() => {
                tracing::warn!("Feature {} ({}) skipped: {}", index, feature.kind, e);
                self.metadata.skipped.push(SkippedFeature {
                    index,
                    kind: feature.kind,
                    error: e.to_string(),
                });
                Ok(FeatureOutcome::Skipped)
            }
            Err(e) => Err(e),
        }
    }

    /// Running mesh combined with every tool solid; nothing is committed on error.
    fn combine(&self, tool: &ToolBody) -> Result<Mesh> {
        let tessellator = Tessellator::new(&self.arena, &self.config.tessellation);
        let mut mesh = match &self.body {
            Some(ModelBody::Mesh(mesh)) => mesh.clone(),
            Some(ModelBody::Brep(solid)) => tessellator.tessellate_solid(*solid)?,
            None => Mesh::empty(),
        };
        for &solid in &tool.solids {
            let tool_mesh = tessellator.tessellate_solid(solid)?;
            let epsilon = self.config.boolean.epsilon;
            mesh = perform_boolean_operation(&mesh, &tool_mesh, tool.op, epsilon)?;
        }
        Ok(mesh)
    }

    /// Close the session; the model is immutable afterwards.
    pub fn finalize(mut self) -> Result<BuildOutput> {
        if self.body.is_none() {
            self.create_stock(None)?;
        }
        let body = self.body.take().ok_or_else(|| KernelError::degenerate("session has no stock"))?;

        let tessellator = Tessellator::new(&self.arena, &self.config.tessellation);
        let (bounding_box, summary) = match &body {
            ModelBody::Mesh(mesh) => (
                mesh.bounding_box(),
                (mesh.triangle_count(), signed_volume(mesh)),
            ),
            ModelBody::Brep(solid) => {
                let mesh = tessellator.tessellate_solid(*solid)?;
                (
                    self.arena.solid_bounding_box(*solid)?,
                    (mesh.triangle_count(), signed_volume(&mesh)),
                )
            }
        };
        self.metadata.triangle_count = summary.0;
        self.metadata.volume = summary.1;
        self.state = BuildState::Finalized;

        tracing::info!(
            "Build finished: {} applied, {} skipped, {} triangles",
            self.metadata.applied.len(),
            self.metadata.skipped.len(),
            self.metadata.triangle_count
        );

        Ok(BuildOutput {
            model: Model {
                body,
                edge_treatments: self.edge_treatments,
                bounding_box,
            },
            metadata: self.metadata,
            arena: self.arena,
        })
    }
}

fn stock_dimension(name: &str, value: Option<f64>) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(v) => Err(KernelError::InvalidStockDimensions(format!(
            "{name} must be positive, got {v}"
        ))),
        None => Err(KernelError::InvalidStockDimensions(format!("missing {name}"))),
    }
}
