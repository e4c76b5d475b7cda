// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Reading and writing kernel configuration files

use crate::config::{KernelConfig, CONFIG_FILE};
use anyhow::{Context, Result};
use std::path::Path;

impl KernelConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config file: {:?}", path))
    }

    /// Load `stockform.toml` from the working directory (defaults when
    /// absent), then apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_with(CONFIG_FILE, std::env::vars())
    }

    /// [`load`](Self::load) with an explicit file and variable source
    pub fn load_with<I>(path: impl AsRef<Path>, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(vars);
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }
}
