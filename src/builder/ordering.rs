// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Machining order of features

use crate::features::FeatureDescriptor;

/// Indices of `features` in application order.
///
/// Stable sort by kind priority; within a priority, deeper features first.
pub fn order_features(features: &[FeatureDescriptor]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..features.len()).collect();
    order.sort_by(|&a, &b| {
        let (fa, fb) = (&features[a], &features[b]);
        fa.kind
            .priority()
            .cmp(&fb.kind.priority())
            .then_with(|| fb.sort_depth().total_cmp(&fa.sort_depth()))
    });
    order
}
