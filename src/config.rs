// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Kernel configuration system

use crate::error::KernelError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default config file looked up by `KernelConfig::load`
pub const CONFIG_FILE: &str = "stockform.toml";

/// Resolution of the surface tessellator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationConfig {
    /// Segments around cylinders, cones and full circles
    pub angular_segments: usize,
    /// Latitude bands of a sphere
    pub sphere_rings: usize,
    /// Longitude segments of a sphere
    pub sphere_segments: usize,
    /// Segments around the tube of a torus
    pub torus_rings: usize,
    /// Segments around the main axis of a torus
    pub torus_segments: usize,
    /// Tessellate the faces of one solid on the rayon pool
    pub parallel_faces: bool,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            angular_segments: 32,
            sphere_rings: 16,
            sphere_segments: 32,
            torus_rings: 16,
            torus_segments: 32,
            parallel_faces: true,
        }
    }
}

/// Feature generator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Straight segments approximating each rounded pocket corner
    pub corner_segments: usize,
    /// Helix samples per thread turn
    pub thread_segments_per_turn: usize,
    /// Upper bound on the samples of one thread helix
    pub max_helix_samples: usize,
    /// Included angle used when a countersink does not specify one (degrees)
    pub default_countersink_angle: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            corner_segments: 8,
            thread_segments_per_turn: 16,
            max_helix_samples: 100_000,
            default_countersink_angle: 90.0,
        }
    }
}

/// BSP classification tolerance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooleanConfig {
    pub epsilon: f64,
}

impl Default for BooleanConfig {
    fn default() -> Self {
        Self { epsilon: 1e-6 }
    }
}

/// Mesh export options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Merge coincident positions into shared indices
    pub weld: bool,
    pub weld_epsilon: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            weld: false,
            weld_epsilon: 1e-6,
        }
    }
}

/// Kernel configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub tessellation: TessellationConfig,
    pub features: FeatureConfig,
    pub boolean: BooleanConfig,
    pub export: ExportConfig,
}

impl KernelConfig {
    /// Parse and validate TOML configuration text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: KernelConfig = toml::from_str(text).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Apply `STOCKFORM_*` overrides from `(name, value)` pairs such as
    /// `std::env::vars()`; unparseable values are ignored.
    pub fn apply_env_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            match name.as_str() {
                "STOCKFORM_ANGULAR_SEGMENTS" => {
                    set_parsed(&mut self.tessellation.angular_segments, &value)
                }
                "STOCKFORM_SPHERE_RINGS" => set_parsed(&mut self.tessellation.sphere_rings, &value),
                "STOCKFORM_SPHERE_SEGMENTS" => {
                    set_parsed(&mut self.tessellation.sphere_segments, &value)
                }
                "STOCKFORM_CORNER_SEGMENTS" => {
                    set_parsed(&mut self.features.corner_segments, &value)
                }
                "STOCKFORM_PARALLEL" => {
                    self.tessellation.parallel_faces = value.trim().parse().unwrap_or(true)
                }
                _ => {}
            }
        }
    }

    /// Reject resolutions the tessellator cannot work with
    pub fn validate(&self) -> std::result::Result<(), KernelError> {
        let t = &self.tessellation;
        if t.angular_segments < 3
            || t.sphere_segments < 3
            || t.torus_segments < 3
            || t.torus_rings < 3
        {
            return Err(KernelError::Config("segment counts must be at least 3".into()));
        }
        if t.sphere_rings < 2 {
            return Err(KernelError::Config("sphere_rings must be at least 2".into()));
        }
        let f = &self.features;
        if f.corner_segments == 0 || f.thread_segments_per_turn < 4 {
            return Err(KernelError::Config(
                "corner_segments must be positive and thread_segments_per_turn at least 4".into(),
            ));
        }
        if f.max_helix_samples < f.thread_segments_per_turn {
            return Err(KernelError::Config(
                "max_helix_samples must cover at least one thread turn".into(),
            ));
        }
        let angle = self.features.default_countersink_angle;
        if !(angle > 0.0 && angle < 180.0) {
            return Err(KernelError::Config(format!(
                "countersink angle {angle} out of (0, 180)"
            )));
        }
        if !(self.boolean.epsilon > 0.0) || !(self.export.weld_epsilon > 0.0) {
            return Err(KernelError::Config("tolerances must be positive".into()));
        }
        Ok(())
    }
}

fn set_parsed<T: FromStr>(target: &mut T, value: &str) {
    if let Ok(parsed) = value.trim().parse() {
        *target = parsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = KernelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tessellation.angular_segments, 32);
        assert_eq!(config.tessellation.sphere_rings, 16);
        assert_eq!(config.features.corner_segments, 8);
        assert_eq!(config.boolean.epsilon, 1e-6);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: KernelConfig = toml::from_str(
            r#"
            [tessellation]
            angular_segments = 64
            "#,
        )
        .unwrap();
        assert_eq!(config.tessellation.angular_segments, 64);
        assert_eq!(config.tessellation.sphere_segments, 32);
        assert_eq!(config.features, FeatureConfig::default());
    }

    #[test]
    fn test_validate_rejects_low_resolution() {
        let mut config = KernelConfig::default();
        config.tessellation.angular_segments = 2;
        assert!(matches!(config.validate(), Err(KernelError::Config(_))));

        let mut config = KernelConfig::default();
        config.boolean.epsilon = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = KernelConfig::default();
        config.apply_env_overrides(vars(&[
            ("STOCKFORM_ANGULAR_SEGMENTS", "48"),
            ("STOCKFORM_SPHERE_RINGS", " 20 "),
            ("STOCKFORM_SPHERE_SEGMENTS", "many"),
            ("STOCKFORM_CORNER_SEGMENTS", "4"),
            ("STOCKFORM_PARALLEL", "false"),
            ("HOME", "/root"),
        ]));
        assert_eq!(config.tessellation.angular_segments, 48);
        assert_eq!(config.tessellation.sphere_rings, 20);
        assert_eq!(config.tessellation.sphere_segments, 32);
        assert_eq!(config.features.corner_segments, 4);
        assert!(!config.tessellation.parallel_faces);
    }

    #[test]
    fn test_toml_text_is_validated() {
        let err =
            KernelConfig::from_toml_str("[tessellation]\nangular_segments = 0\n").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KernelError>(),
            Some(KernelError::Config(_))
        ));
        assert!(KernelConfig::from_toml_str("[boolean]\nepsilon = -1.0\n").is_err());

        let config = KernelConfig::default();
        assert_eq!(KernelConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap(), config);
    }

    #[test]
    fn test_helix_limit_must_cover_a_turn() {
        let mut config = KernelConfig::default();
        config.features.max_helix_samples = 8;
        assert!(config.validate().is_err());
    }

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
