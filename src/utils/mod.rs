// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Shared utilities

pub mod math;

pub use math::Frame;
