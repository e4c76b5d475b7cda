// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Build jobs read from JSON or TOML

use crate::builder::{BuildOutput, ModelBuilder};
use crate::features::{FeatureDescriptor, StockDescriptor};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Stock plus feature list; the default stock is used when `stock` is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<StockDescriptor>,
    #[serde(default)]
    pub features: Vec<FeatureDescriptor>,
}

impl Job {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse JSON job")
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML job")
    }

    /// Load a job file, choosing the format by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file: {:?}", path))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            other => bail!("Unsupported job format: {:?}", other),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize job")
    }

    pub fn build(&self, builder: &ModelBuilder) -> Result<BuildOutput> {
        builder
            .build(self.stock.as_ref(), &self.features)
            .context("Job build failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureKind, StockKind};
    use nalgebra::Point3;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const JSON_JOB: &str = r#"{
        "stock": { "kind": "block", "dimensions": { "length": 100, "width": 100, "height": 50 } },
        "features": [
            { "kind": "hole", "position": [20, 25, 20],
              "dimensions": { "diameter": 10, "depth": 20 } },
            { "kind": "pocket", "position": [30, 15, 20],
              "dimensions": { "length": 40, "width": 20, "depth": 10, "cornerRadius": 0 } }
        ]
    }"#;

    #[test]
    fn test_json_job() -> Result<()> {
        let job = Job::from_json(JSON_JOB)?;
        let stock = job.stock.as_ref().unwrap();
        assert_eq!(stock.kind, StockKind::Block);
        assert_eq!(stock.position, Point3::origin());
        assert_eq!(job.features.len(), 2);
        assert_eq!(job.features[1].kind, FeatureKind::Pocket);
        assert_eq!(job.features[1].dimensions.corner_radius, Some(0.0));
        Ok(())
    }

    #[test]
    fn test_toml_job() -> Result<()> {
        let job = Job::from_toml(
            r#"
            [stock]
            kind = "cylinder"
            position = [0.0, 0.0, 0.0]
            [stock.dimensions]
            diameter = 40.0
            height = 60.0

            [[features]]
            kind = "boss"
            position = [0.0, 0.0, 60.0]
            dimensions = { diameter = 10.0, height = 5.0 }
            "#,
        )?;
        assert_eq!(job.stock.unwrap().kind, StockKind::Cylinder);
        assert_eq!(job.features[0].kind, FeatureKind::Boss);
        Ok(())
    }

    #[test]
    fn test_job_file_and_round_trip() -> Result<()> {
        let job = Job::from_json(JSON_JOB)?;
        let mut file = NamedTempFile::with_suffix(".json")?;
        file.write_all(job.to_json()?.as_bytes())?;
        assert_eq!(Job::from_file(file.path())?, job);

        let unknown = NamedTempFile::with_suffix(".yaml")?;
        assert!(Job::from_file(unknown.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let json = r#"{ "features": [{ "kind": "knurl", "position": [0, 0, 0] }] }"#;
        assert!(Job::from_json(json).is_err());
    }
}
