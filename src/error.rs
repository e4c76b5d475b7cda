// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Kernel error taxonomy

use crate::topology::Handle;
use thiserror::Error;

/// Errors raised by the topology graph, generators, tessellator and Boolean engine.
///
/// Only the model builder decides whether an error skips a feature or aborts a
/// build; every layer below it simply propagates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// The handle was never issued by this arena, or was issued before a reset.
    #[error("entity {handle} not found")]
    NotFound { handle: Handle },

    /// The handle exists but names a different kind of entity.
    #[error("entity {handle} is a {found}, expected {expected}")]
    KindMismatch {
        handle: Handle,
        expected: &'static str,
        found: &'static str,
    },

    /// Caller-supplied feature dimensions are missing or non-positive.
    #[error("invalid {kind} dimensions: {reason}")]
    InvalidFeatureDimensions { kind: String, reason: String },

    /// Geometry collapsed (zero-length axis, non-finite coordinates, empty boundary).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The stock descriptor cannot produce a solid.
    #[error("invalid stock dimensions: {0}")]
    InvalidStockDimensions(String),

    /// Configuration values out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl KernelError {
    pub fn invalid_dimensions(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFeatureDimensions {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateGeometry(reason.into())
    }

    /// Whether the model builder may downgrade this error into a feature skip.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidFeatureDimensions { .. } | Self::DegenerateGeometry(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(
            KernelError::invalid_dimensions("pocket", "depth must be positive").is_recoverable()
        );
        assert!(KernelError::degenerate("zero-length axis").is_recoverable());
        assert!(!KernelError::NotFound { handle: Handle::new(3) }.is_recoverable());
        assert!(!KernelError::InvalidStockDimensions("length".into()).is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = KernelError::KindMismatch {
            handle: Handle::new(7),
            expected: "point",
            found: "face",
        };
        assert_eq!(err.to_string(), "entity #7 is a face, expected point");
    }
}
