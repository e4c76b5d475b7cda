// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Topology graph - handle-addressed B-Rep entities

mod arena;
mod entity;

pub use arena::EntityArena;
pub use entity::{
    BSplineCurve, BSplineSurface, Curve, EdgeCurve, EdgeLoop, Entity, Face, FaceBound, Handle,
    OrientedEdge, Placement, Shell, Solid, Surface, Vertex,
};
