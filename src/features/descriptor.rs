// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Feature and stock descriptors supplied by the caller

use crate::geometry::BooleanOp;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Manufacturing feature kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Pocket,
    Slot,
    Hole,
    Counterbore,
    Countersink,
    Boss,
    Face,
    Groove,
    Thread,
    Fillet,
    Chamfer,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 11] = [
        Self::Pocket,
        Self::Slot,
        Self::Hole,
        Self::Counterbore,
        Self::Countersink,
        Self::Boss,
        Self::Face,
        Self::Groove,
        Self::Thread,
        Self::Fillet,
        Self::Chamfer,
    ];

    /// Machining order; lower runs first
    pub fn priority(self) -> u8 {
        match self {
            Self::Face => 1,
            Self::Pocket => 2,
            Self::Slot => 3,
            Self::Hole | Self::Counterbore | Self::Countersink => 4,
            Self::Boss => 5,
            Self::Thread => 6,
            Self::Groove => 7,
            Self::Fillet => 8,
            Self::Chamfer => 9,
        }
    }

    /// How the feature's tool body combines with the running model; `None`
    /// for fillets and chamfers, which are recorded as metadata only
    pub fn boolean_op(self) -> Option<BooleanOp> {
        match self {
            Self::Boss => Some(BooleanOp::Union),
            Self::Fillet | Self::Chamfer => None,
            _ => Some(BooleanOp::Subtract),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Pocket => "pocket",
            Self::Slot => "slot",
            Self::Hole => "hole",
            Self::Counterbore => "counterbore",
            Self::Countersink => "countersink",
            Self::Boss => "boss",
            Self::Face => "face",
            Self::Groove => "groove",
            Self::Thread => "thread",
            Self::Fillet => "fillet",
            Self::Chamfer => "chamfer",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named feature dimensions; which ones are required depends on the kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub depth: Option<f64>,
    pub diameter: Option<f64>,
    #[serde(alias = "cornerRadius")]
    pub corner_radius: Option<f64>,
    #[serde(alias = "counterboreDiameter")]
    pub counterbore_diameter: Option<f64>,
    #[serde(alias = "counterboreDepth")]
    pub counterbore_depth: Option<f64>,
    #[serde(alias = "countersinkDiameter")]
    pub countersink_diameter: Option<f64>,
    /// Included angle in degrees
    #[serde(alias = "countersinkAngle")]
    pub countersink_angle: Option<f64>,
    pub pitch: Option<f64>,
    #[serde(alias = "majorDiameter")]
    pub major_diameter: Option<f64>,
    #[serde(alias = "minorDiameter")]
    pub minor_diameter: Option<f64>,
    pub height: Option<f64>,
    pub radius: Option<f64>,
    pub distance: Option<f64>,
}

/// One requested feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub kind: FeatureKind,
    /// Entry point on the cut plane
    pub position: Point3<f64>,
    /// Cut direction into the material; -Z when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Vector3<f64>>,
    #[serde(default)]
    pub dimensions: Dimensions,
    /// Edge selectors for fillets and chamfers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<String>,
}

impl FeatureDescriptor {
    pub fn new(kind: FeatureKind, position: Point3<f64>) -> Self {
        Self {
            kind,
            position,
            direction: None,
            dimensions: Dimensions::default(),
            edges: Vec::new(),
        }
    }

    pub fn with_direction(mut self, direction: Vector3<f64>) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_edges(mut self, edges: Vec<String>) -> Self {
        self.edges = edges;
        self
    }

    pub fn hole(position: Point3<f64>, diameter: f64, depth: f64) -> Self {
        Self::new(FeatureKind::Hole, position).with_dimensions(Dimensions {
            diameter: Some(diameter),
            depth: Some(depth),
            ..Dimensions::default()
        })
    }

    pub fn pocket(
        position: Point3<f64>,
        length: f64,
        width: f64,
        depth: f64,
        corner_radius: f64,
    ) -> Self {
        Self::new(FeatureKind::Pocket, position).with_dimensions(Dimensions {
            length: Some(length),
            width: Some(width),
            depth: Some(depth),
            corner_radius: Some(corner_radius),
            ..Dimensions::default()
        })
    }

    pub fn boss(position: Point3<f64>, diameter: f64, height: f64) -> Self {
        Self::new(FeatureKind::Boss, position).with_dimensions(Dimensions {
            diameter: Some(diameter),
            height: Some(height),
            ..Dimensions::default()
        })
    }

    /// Depth used to break priority ties
    pub fn sort_depth(&self) -> f64 {
        self.dimensions.depth.filter(|d| d.is_finite()).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockKind {
    Block,
    Cylinder,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockDimensions {
    /// Block extent along X
    pub length: Option<f64>,
    /// Block extent along Y
    pub width: Option<f64>,
    /// Extent along Z for both kinds
    pub height: Option<f64>,
    /// Cylinder diameter
    pub diameter: Option<f64>,
}

/// Stock blank.
///
/// A block spans `length × width × height` from `position` as its minimum
/// corner; a cylinder stands on `position` (base center) along +Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDescriptor {
    pub kind: StockKind,
    #[serde(default)]
    pub dimensions: StockDimensions,
    #[serde(default = "origin")]
    pub position: Point3<f64>,
}

fn origin() -> Point3<f64> {
    Point3::origin()
}

impl StockDescriptor {
    pub fn block(length: f64, width: f64, height: f64) -> Self {
        Self {
            kind: StockKind::Block,
            dimensions: StockDimensions {
                length: Some(length),
                width: Some(width),
                height: Some(height),
                diameter: None,
            },
            position: Point3::origin(),
        }
    }

    pub fn cylinder(diameter: f64, height: f64) -> Self {
        Self {
            kind: StockKind::Cylinder,
            dimensions: StockDimensions {
                diameter: Some(diameter),
                height: Some(height),
                ..StockDimensions::default()
            },
            position: Point3::origin(),
        }
    }

    pub fn at(mut self, position: Point3<f64>) -> Self {
        self.position = position;
        self
    }
}

impl Default for StockDescriptor {
    /// 100 × 100 × 50 block at the origin
    fn default() -> Self {
        Self::block(100.0, 100.0, 50.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_table() {
        let mut kinds = FeatureKind::ALL.to_vec();
        kinds.sort_by_key(|k| k.priority());
        assert_eq!(kinds.first(), Some(&FeatureKind::Face));
        assert_eq!(kinds.last(), Some(&FeatureKind::Chamfer));
        assert_eq!(FeatureKind::Counterbore.priority(), FeatureKind::Hole.priority());
        assert!(FeatureKind::Groove.priority() > FeatureKind::Thread.priority());
    }

    #[test]
    fn test_boolean_ops() {
        assert_eq!(FeatureKind::Boss.boolean_op(), Some(BooleanOp::Union));
        assert_eq!(FeatureKind::Groove.boolean_op(), Some(BooleanOp::Subtract));
        assert_eq!(FeatureKind::Fillet.boolean_op(), None);
        assert_eq!(FeatureKind::Chamfer.boolean_op(), None);
    }

    #[test]
    fn test_descriptor_json_with_camel_case() {
        let json = r#"{
            "kind": "pocket",
            "position": [30.0, 15.0, 20.0],
            "dimensions": { "length": 40, "width": 20, "depth": 10, "cornerRadius": 0 }
        }"#;
        let feature: FeatureDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(feature.kind, FeatureKind::Pocket);
        assert_eq!(feature.position, Point3::new(30.0, 15.0, 20.0));
        assert_eq!(feature.dimensions.corner_radius, Some(0.0));
        assert_eq!(feature.direction, None);
        assert_eq!(
            feature,
            FeatureDescriptor::pocket(Point3::new(30.0, 15.0, 20.0), 40.0, 20.0, 10.0, 0.0)
        );
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let json = r#"{ "kind": "knurl", "position": [0, 0, 0] }"#;
        assert!(serde_json::from_str::<FeatureDescriptor>(json).is_err());
    }

    #[test]
    fn test_stock_defaults() {
        let stock: StockDescriptor = serde_json::from_str(
            r#"{ "kind": "cylinder", "dimensions": { "diameter": 40, "height": 80 } }"#,
        )
        .unwrap();
        assert_eq!(stock, StockDescriptor::cylinder(40.0, 80.0));
        assert_eq!(StockDescriptor::default().dimensions.height, Some(50.0));
    }
}
