// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Invalid features are skipped without touching the model

use anyhow::Result;
use nalgebra::Point3;
use stockform::builder::{BuildSession, FeatureOutcome};
use stockform::features::Dimensions;
use stockform::{FeatureDescriptor, FeatureKind, KernelConfig, ModelBuilder, StockDescriptor};

fn bad_pocket() -> FeatureDescriptor {
    FeatureDescriptor::pocket(Point3::new(10.0, 10.0, 50.0), 20.0, 10.0, -5.0, 0.0)
}

#[test]
fn test_negative_pocket_depth_leaves_model_unchanged() -> Result<()> {
    let mut session = BuildSession::new(KernelConfig::default())?;
    session.create_stock(Some(&StockDescriptor::block(100.0, 100.0, 50.0)))?;
    session.apply_feature(0, &FeatureDescriptor::hole(Point3::new(50.0, 50.0, 50.0), 8.0, 12.0))?;

    let body_before = session.body().cloned();
    let skips_before = session.metadata().skip_count();
    let entities_before = session.arena().len();

    assert_eq!(session.apply_feature(1, &bad_pocket())?, FeatureOutcome::Skipped);

    assert_eq!(session.body().cloned(), body_before);
    assert_eq!(session.metadata().skip_count(), skips_before + 1);
    assert_eq!(session.arena().len(), entities_before);
    assert!(session.metadata().skipped[0].error.contains("pocket"));
    Ok(())
}

#[test]
fn test_skip_does_not_change_build_result() -> Result<()> {
    let hole = FeatureDescriptor::hole(Point3::new(50.0, 50.0, 50.0), 8.0, 12.0);
    let builder = ModelBuilder::default();

    let clean = builder.build(None, &[hole.clone()])?;
    let with_bad = builder.build(None, &[bad_pocket(), hole])?;

    assert_eq!(with_bad.model, clean.model);
    assert_eq!(with_bad.metadata.skip_count(), 1);
    assert_eq!(with_bad.metadata.skipped[0].index, 0);
    assert_eq!(with_bad.metadata.applied, vec![1]);
    Ok(())
}

#[test]
fn test_every_kind_rejects_missing_dimensions() -> Result<()> {
    let features: Vec<FeatureDescriptor> = FeatureKind::ALL
        .iter()
        .map(|&kind| FeatureDescriptor::new(kind, Point3::new(50.0, 50.0, 50.0)))
        .collect();
    let output = ModelBuilder::default().build(None, &features)?;

    assert_eq!(output.metadata.skip_count(), FeatureKind::ALL.len());
    assert!(output.metadata.applied.is_empty());
    assert!((output.metadata.volume - 500_000.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_invalid_stock_aborts_build() {
    let stock = StockDescriptor::block(100.0, -1.0, 50.0);
    assert!(ModelBuilder::default().build(Some(&stock), &[]).is_err());
}

#[test]
fn test_non_finite_position_is_skipped() -> Result<()> {
    let hole = FeatureDescriptor::new(FeatureKind::Hole, Point3::new(f64::NAN, 0.0, 0.0))
        .with_dimensions(Dimensions {
            diameter: Some(5.0),
            depth: Some(5.0),
            ..Dimensions::default()
        });
    let output = ModelBuilder::default().build(None, &[hole])?;
    assert_eq!(output.metadata.skip_count(), 1);
    Ok(())
}

#[test]
fn test_microscopic_thread_pitch_is_skipped() -> Result<()> {
    let mut session = BuildSession::new(KernelConfig::default())?;
    session.create_stock(None)?;
    let body_before = session.body().cloned();
    let entities_before = session.arena().len();

    // 1e7 turns would need 1.6e8 helix samples
    let thread = FeatureDescriptor::new(FeatureKind::Thread, Point3::new(50.0, 50.0, 50.0))
        .with_dimensions(Dimensions {
            major_diameter: Some(8.0),
            pitch: Some(1e-6),
            length: Some(10.0),
            ..Dimensions::default()
        });
    assert_eq!(session.apply_feature(0, &thread)?, FeatureOutcome::Skipped);

    assert_eq!(session.body().cloned(), body_before);
    assert_eq!(session.arena().len(), entities_before);
    assert!(session.metadata().skipped[0].error.contains("helix samples"));
    Ok(())
}
