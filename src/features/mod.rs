// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Manufacturing features - descriptors and tool-body generators

mod descriptor;
pub mod generators;

pub use descriptor::{
    Dimensions, FeatureDescriptor, FeatureKind, StockDescriptor, StockDimensions, StockKind,
};
pub use generators::{generate, EdgeTreatment, EdgeTreatmentKind, FeatureOutput, ToolBody};
