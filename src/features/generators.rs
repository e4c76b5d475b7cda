// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Tool bodies for manufacturing features
//!
//! Every feature is laid out in an entry frame: origin at the feature
//! position, `z` pointing out of the material (against the cut direction),
//! `x` the world X axis projected onto the entry plane. Cutting tools extend
//! `depth` below the entry plane; a boss rises above it.

use super::descriptor::{FeatureDescriptor, FeatureKind};
use crate::config::FeatureConfig;
use crate::error::{KernelError, Result};
use crate::geometry::primitives::{make_frustum, rounded_rectangle, stadium};
use crate::geometry::{BooleanOp, Primitive};
use crate::topology::{EntityArena, Handle};
use crate::utils::math::{
    clamped_uniform_knots, deg_to_rad, helix_samples, Frame, DEGENERATE_LENGTH,
};
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Thread depth factor: minor = major − 1.0825·pitch
const THREAD_DEPTH_FACTOR: f64 = 1.0825;

/// Solids to combine with the running model, in order, all with `op`
#[derive(Debug, Clone, PartialEq)]
pub struct ToolBody {
    pub solids: Vec<Handle>,
    pub op: BooleanOp,
    /// Display-only curves (thread helices)
    pub curves: Vec<Handle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeTreatmentKind {
    Fillet,
    Chamfer,
}

/// Deferred fillet/chamfer; never applied to the solid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeTreatment {
    pub kind: EdgeTreatmentKind,
    /// Fillet radius or chamfer distance
    pub size: f64,
    pub position: Point3<f64>,
    pub edges: Vec<String>,
}

/// What a feature turns into
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureOutput {
    Tool(ToolBody),
    EdgeTreatment(EdgeTreatment),
}

/// Validate a feature and create its tool body entities in `arena`.
///
/// On error nothing useful is left in the arena; the entities created before
/// the failure stay unreferenced.
pub fn generate(
    arena: &mut EntityArena,
    feature: &FeatureDescriptor,
    config: &FeatureConfig,
) -> Result<FeatureOutput> {
    let kind = feature.kind;
    let frame = entry_frame(feature)?;
    // Kinds without a Boolean op are edge treatments
    let Some(op) = kind.boolean_op() else {
        return edge_treatment(feature).map(FeatureOutput::EdgeTreatment);
    };

    let dims = &feature.dimensions;
    let (solids, curves) = match kind {
        FeatureKind::Pocket => {
            let length = required(kind, "length", dims.length)?;
            let width = required(kind, "width", dims.width)?;
            let depth = required(kind, "depth", dims.depth)?;
            let corner_radius = non_negative(kind, "corner_radius", dims.corner_radius)?;
            let profile = rounded_rectangle(length, width, corner_radius, config.corner_segments);
            (vec![profile_cut(arena, &frame, profile, depth)], Vec::new())
        }
        FeatureKind::Face | FeatureKind::Groove => {
            let length = required(kind, "length", dims.length)?;
            let width = required(kind, "width", dims.width)?;
            let depth = required(kind, "depth", dims.depth)?;
            let profile = rounded_rectangle(length, width, 0.0, 1);
            (vec![profile_cut(arena, &frame, profile, depth)], Vec::new())
        }
        FeatureKind::Slot => {
            let length = required(kind, "length", dims.length)?;
            let width = required(kind, "width", dims.width)?;
            let depth = required(kind, "depth", dims.depth)?;
            if length < width {
                return Err(KernelError::invalid_dimensions(
                    kind.name(),
                    format!("length {length} is shorter than width {width}"),
                ));
            }
            let profile = stadium(length, width, 2 * config.corner_segments);
            (vec![profile_cut(arena, &frame, profile, depth)], Vec::new())
        }
        FeatureKind::Hole => {
            let (radius, depth) = hole_size(feature)?;
            (vec![bore(arena, &frame, radius, depth)], Vec::new())
        }
        FeatureKind::Counterbore => (counterbore(arena, feature, &frame)?, Vec::new()),
        FeatureKind::Countersink => (countersink(arena, feature, &frame, config)?, Vec::new()),
        FeatureKind::Boss => {
            let diameter = required(kind, "diameter", dims.diameter)?;
            let height = required(kind, "height", dims.height.or(dims.depth))?;
            let solid = make_frustum(arena, &frame, diameter / 2.0, diameter / 2.0, height);
            (vec![solid], Vec::new())
        }
        FeatureKind::Thread => thread(arena, feature, &frame, config)?,
        FeatureKind::Fillet | FeatureKind::Chamfer => {
            return Err(KernelError::invalid_dimensions(kind.name(), "has no tool body"));
        }
    };
    Ok(FeatureOutput::Tool(ToolBody { solids, op, curves }))
}

/// Entry frame of a feature; rejects non-finite positions and zero directions.
pub fn entry_frame(feature: &FeatureDescriptor) -> Result<Frame> {
    let p = feature.position;
    if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
        return Err(KernelError::degenerate(format!(
            "{} position is not finite",
            feature.kind
        )));
    }
    let direction = feature.direction.unwrap_or(-Vector3::z());
    let length = direction.norm();
    if !length.is_finite() || length < DEGENERATE_LENGTH {
        return Err(KernelError::degenerate(format!(
            "{} direction has no usable length",
            feature.kind
        )));
    }
    // Falls back to +Y when the axis is along X
    Ok(Frame::from_axis(p, -direction / length, Vector3::x()))
}

fn required(kind: FeatureKind, name: &str, value: Option<f64>) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(v) => Err(KernelError::invalid_dimensions(
            kind.name(),
            format!("{name} must be positive, got {v}"),
        )),
        None => Err(KernelError::invalid_dimensions(kind.name(), format!("missing {name}"))),
    }
}

fn non_negative(kind: FeatureKind, name: &str, value: Option<f64>) -> Result<f64> {
    match value {
        None => Ok(0.0),
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(v) => Err(KernelError::invalid_dimensions(
            kind.name(),
            format!("{name} must not be negative, got {v}"),
        )),
    }
}

/// Prism of `profile` occupying `depth` below the entry plane
fn profile_cut(
    arena: &mut EntityArena,
    frame: &Frame,
    profile: Vec<Point2<f64>>,
    depth: f64,
) -> Handle {
    Primitive::prism(frame.offset_along_axis(-depth), profile, depth).build(arena)
}

/// Cylinder of `radius` occupying `depth` below the entry plane
fn bore(arena: &mut EntityArena, frame: &Frame, radius: f64, depth: f64) -> Handle {
    let base = frame.offset_along_axis(-depth);
    make_frustum(arena, &base, radius, radius, depth)
}

fn hole_size(feature: &FeatureDescriptor) -> Result<(f64, f64)> {
    let dims = &feature.dimensions;
    let diameter = required(feature.kind, "diameter", dims.diameter)?;
    let depth = required(feature.kind, "depth", dims.depth)?;
    Ok((diameter / 2.0, depth))
}

fn counterbore(
    arena: &mut EntityArena,
    feature: &FeatureDescriptor,
    frame: &Frame,
) -> Result<Vec<Handle>> {
    let kind = feature.kind;
    let dims = &feature.dimensions;
    let (radius, depth) = hole_size(feature)?;
    let bore_diameter = required(kind, "counterbore_diameter", dims.counterbore_diameter)?;
    let bore_depth = required(kind, "counterbore_depth", dims.counterbore_depth)?;
    if bore_diameter / 2.0 <= radius {
        return Err(KernelError::invalid_dimensions(
            kind.name(),
            "counterbore_diameter must exceed the hole diameter",
        ));
    }

    let hole = bore(arena, frame, radius, depth);
    let recess = bore(arena, frame, bore_diameter / 2.0, bore_depth);
    Ok(vec![hole, recess])
}

fn countersink(
    arena: &mut EntityArena,
    feature: &FeatureDescriptor,
    frame: &Frame,
    config: &FeatureConfig,
) -> Result<Vec<Handle>> {
    let kind = feature.kind;
    let dims = &feature.dimensions;
    let (radius, depth) = hole_size(feature)?;
    let sink_diameter = required(kind, "countersink_diameter", dims.countersink_diameter)?;
    let angle = dims.countersink_angle.unwrap_or(config.default_countersink_angle);
    if !(angle > 0.0 && angle < 180.0) {
        return Err(KernelError::invalid_dimensions(
            kind.name(),
            format!("countersink_angle must be within (0, 180) degrees, got {angle}"),
        ));
    }
    let sink_radius = sink_diameter / 2.0;
    if sink_radius <= radius {
        return Err(KernelError::invalid_dimensions(
            kind.name(),
            "countersink_diameter must exceed the hole diameter",
        ));
    }

    // Cone narrows from the sink diameter at the entry plane to the hole diameter
    let height = (sink_radius - radius) / (deg_to_rad(angle) / 2.0).tan();
    let hole = bore(arena, frame, radius, depth);
    let cone = make_frustum(
        arena,
        &frame.offset_along_axis(-height),
        radius,
        sink_radius,
        height,
    );
    Ok(vec![hole, cone])
}

fn thread(
    arena: &mut EntityArena,
    feature: &FeatureDescriptor,
    frame: &Frame,
    config: &FeatureConfig,
) -> Result<(Vec<Handle>, Vec<Handle>)> {
    let kind = feature.kind;
    let dims = &feature.dimensions;
    let pitch = required(kind, "pitch", dims.pitch)?;
    let major = required(kind, "major_diameter", dims.major_diameter.or(dims.diameter))?;
    let length = required(kind, "length", dims.length.or(dims.depth))?;
    let minor = match dims.minor_diameter {
        Some(minor) => required(kind, "minor_diameter", Some(minor))?,
        None => major - THREAD_DEPTH_FACTOR * pitch,
    };
    if minor <= 0.0 || minor >= major {
        return Err(KernelError::invalid_dimensions(
            kind.name(),
            format!("minor diameter {minor} must lie in (0, {major})"),
        ));
    }
    let turns = length / pitch;
    let samples = turns * config.thread_segments_per_turn as f64;
    if !(samples <= config.max_helix_samples as f64) {
        return Err(KernelError::invalid_dimensions(
            kind.name(),
            format!(
                "{turns} turns need more than {} helix samples",
                config.max_helix_samples
            ),
        ));
    }

    let core = bore(arena, frame, minor / 2.0, length);

    // Helix from the thread bottom up to the entry plane, kept for display only
    let base = frame.offset_along_axis(-length);
    let samples = helix_samples(&base, major / 2.0, pitch, turns, config.thread_segments_per_turn);
    let degree = 3.min(samples.len() - 1);
    let control_points: Vec<Handle> = samples.iter().map(|p| arena.create_point_at(p)).collect();
    let knots = clamped_uniform_knots(control_points.len(), degree);
    let helix = arena.create_bspline_curve(degree, control_points, knots);

    Ok((vec![core], vec![helix]))
}

fn edge_treatment(feature: &FeatureDescriptor) -> Result<EdgeTreatment> {
    let dims = &feature.dimensions;
    let (kind, size) = match feature.kind {
        FeatureKind::Fillet => (
            EdgeTreatmentKind::Fillet,
            required(feature.kind, "radius", dims.radius)?,
        ),
        _ => (
            EdgeTreatmentKind::Chamfer,
            required(feature.kind, "distance", dims.distance.or(dims.length))?,
        ),
    };
    Ok(EdgeTreatment {
        kind,
        size,
        position: feature.position,
        edges: feature.edges.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TessellationConfig;
    use crate::features::descriptor::Dimensions;
    use crate::geometry::analytics::signed_volume;
    use crate::geometry::tessellate::tessellate_solid;
    use crate::topology::Curve;
    use approx::assert_relative_eq;

    fn tool(feature: &FeatureDescriptor) -> (EntityArena, ToolBody) {
        let mut arena = EntityArena::new();
        match generate(&mut arena, feature, &FeatureConfig::default()).unwrap() {
            FeatureOutput::Tool(tool) => (arena, tool),
            other => panic!("expected a tool body, got {other:?}"),
        }
    }

    #[test]
    fn test_entry_frame_defaults_downward() {
        let hole = FeatureDescriptor::new(FeatureKind::Hole, Point3::new(1.0, 2.0, 3.0));
        let frame = entry_frame(&hole).unwrap();
        assert_relative_eq!(frame.z, Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(frame.x, Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(frame.y, Vector3::y(), epsilon = 1e-12);

        let side = FeatureDescriptor::new(FeatureKind::Hole, Point3::origin())
            .with_direction(Vector3::x());
        let frame = entry_frame(&side).unwrap();
        assert_relative_eq!(frame.z, -Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(frame.x, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_direction_is_degenerate() {
        let feature =
            FeatureDescriptor::hole(Point3::origin(), 5.0, 5.0).with_direction(Vector3::zeros());
        let mut arena = EntityArena::new();
        let err = generate(&mut arena, &feature, &FeatureConfig::default()).unwrap_err();
        assert!(matches!(err, KernelError::DegenerateGeometry(_)));
    }

    #[test]
    fn test_pocket_occupies_depth_below_entry() {
        let feature =
            FeatureDescriptor::pocket(Point3::new(30.0, 15.0, 20.0), 40.0, 20.0, 10.0, 0.0);
        let (arena, tool) = tool(&feature);
        assert_eq!(tool.op, BooleanOp::Subtract);
        let bbox = arena.solid_bounding_box(tool.solids[0]).unwrap();
        assert_relative_eq!(bbox.min, Point3::new(30.0, 15.0, 10.0), epsilon = 1e-9);
        assert_relative_eq!(bbox.max, Point3::new(70.0, 35.0, 20.0), epsilon = 1e-9);
        assert!(arena.is_manifold(tool.solids[0]).unwrap());
    }

    #[test]
    fn test_rounded_pocket_volume() {
        let feature = FeatureDescriptor::pocket(Point3::origin(), 40.0, 20.0, 10.0, 5.0);
        let (arena, tool) = tool(&feature);
        let config = TessellationConfig::default();
        let mesh = tessellate_solid(&arena, tool.solids[0], &config).unwrap();
        let exact = (40.0 * 20.0 - (4.0 - std::f64::consts::PI) * 25.0) * 10.0;
        assert!((signed_volume(&mesh) - exact).abs() / exact < 0.005);
    }

    #[test]
    fn test_negative_depth_is_invalid() {
        let feature = FeatureDescriptor::pocket(Point3::origin(), 40.0, 20.0, -10.0, 0.0);
        let mut arena = EntityArena::new();
        let err = generate(&mut arena, &feature, &FeatureConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            KernelError::InvalidFeatureDimensions { ref kind, .. } if kind == "pocket"
        ));
    }

    #[test]
    fn test_missing_diameter_is_invalid() {
        let feature = FeatureDescriptor::new(FeatureKind::Hole, Point3::origin())
            .with_dimensions(Dimensions {
                depth: Some(5.0),
                ..Dimensions::default()
            });
        let mut arena = EntityArena::new();
        assert!(generate(&mut arena, &feature, &FeatureConfig::default()).is_err());
    }

    #[test]
    fn test_countersink_cone_height() {
        let feature = FeatureDescriptor::new(FeatureKind::Countersink, Point3::new(0.0, 0.0, 10.0))
            .with_dimensions(Dimensions {
                diameter: Some(4.0),
                depth: Some(8.0),
                countersink_diameter: Some(8.0),
                ..Dimensions::default()
            });
        let (arena, tool) = tool(&feature);
        assert_eq!(tool.solids.len(), 2);
        // 90 degree included angle: height equals the radial step
        let cone = arena.solid_bounding_box(tool.solids[1]).unwrap();
        assert_relative_eq!(cone.min.z, 8.0, epsilon = 1e-9);
        assert_relative_eq!(cone.max.z, 10.0, epsilon = 1e-9);
        assert_relative_eq!(cone.max.x, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_counterbore_requires_larger_bore() {
        let feature = FeatureDescriptor::new(FeatureKind::Counterbore, Point3::origin())
            .with_dimensions(Dimensions {
                diameter: Some(6.0),
                depth: Some(10.0),
                counterbore_diameter: Some(5.0),
                counterbore_depth: Some(2.0),
                ..Dimensions::default()
            });
        let mut arena = EntityArena::new();
        assert!(generate(&mut arena, &feature, &FeatureConfig::default()).is_err());
    }

    #[test]
    fn test_boss_rises_above_entry() {
        let feature = FeatureDescriptor::boss(Point3::new(50.0, 50.0, 50.0), 10.0, 15.0);
        let (arena, tool) = tool(&feature);
        assert_eq!(tool.op, BooleanOp::Union);
        let bbox = arena.solid_bounding_box(tool.solids[0]).unwrap();
        assert_relative_eq!(bbox.min.z, 50.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.max.z, 65.0, epsilon = 1e-9);
    }

    #[test]
    fn test_thread_core_and_helix() {
        let feature = FeatureDescriptor::new(FeatureKind::Thread, Point3::new(0.0, 0.0, 20.0))
            .with_dimensions(Dimensions {
                major_diameter: Some(10.0),
                pitch: Some(1.5),
                length: Some(12.0),
                ..Dimensions::default()
            });
        let (arena, tool) = tool(&feature);
        assert_eq!(tool.curves.len(), 1);

        let core = arena.solid_bounding_box(tool.solids[0]).unwrap();
        let minor = 10.0 - 1.0825 * 1.5;
        assert_relative_eq!(core.max.x, minor / 2.0, epsilon = 1e-9);
        assert_relative_eq!(core.min.z, 8.0, epsilon = 1e-9);

        match arena.curve(tool.curves[0]).unwrap() {
            Curve::BSpline(spline) => {
                assert_eq!(spline.degree, 3);
                // 8 turns at 16 samples per turn
                assert_eq!(spline.control_points.len(), 8 * 16 + 1);
                assert_eq!(spline.knots.len(), spline.control_points.len() + 4);
            }
            other => panic!("expected a B-spline, got {other:?}"),
        }
    }

    #[test]
    fn test_slot_shorter_than_width_is_invalid() {
        let feature = FeatureDescriptor::new(FeatureKind::Slot, Point3::origin())
            .with_dimensions(Dimensions {
                length: Some(4.0),
                width: Some(6.0),
                depth: Some(2.0),
                ..Dimensions::default()
            });
        let mut arena = EntityArena::new();
        assert!(generate(&mut arena, &feature, &FeatureConfig::default()).is_err());
    }

    #[test]
    fn test_fillet_is_metadata() {
        let feature = FeatureDescriptor::new(FeatureKind::Fillet, Point3::origin())
            .with_dimensions(Dimensions {
                radius: Some(2.0),
                ..Dimensions::default()
            })
            .with_edges(vec!["top".into()]);
        let mut arena = EntityArena::new();
        let output = generate(&mut arena, &feature, &FeatureConfig::default()).unwrap();
        assert!(arena.is_empty());
        match output {
            FeatureOutput::EdgeTreatment(treatment) => {
                assert_eq!(treatment.kind, EdgeTreatmentKind::Fillet);
                assert_eq!(treatment.size, 2.0);
                assert_eq!(treatment.edges, vec!["top".to_string()]);
            }
            other => panic!("expected an edge treatment, got {other:?}"),
        }
    }

    #[test]
    fn test_tool_op_follows_kind() {
        let features = [
            FeatureDescriptor::hole(Point3::origin(), 4.0, 6.0),
            FeatureDescriptor::pocket(Point3::origin(), 10.0, 5.0, 2.0, 1.0),
            FeatureDescriptor::boss(Point3::origin(), 6.0, 3.0),
        ];
        for feature in &features {
            let (_, tool) = tool(feature);
            assert_eq!(Some(tool.op), feature.kind.boolean_op());
        }
    }

    #[test]
    fn test_chamfer_uses_length_as_distance() {
        let feature = FeatureDescriptor::new(FeatureKind::Chamfer, Point3::origin())
            .with_dimensions(Dimensions {
                length: Some(0.5),
                ..Dimensions::default()
            });
        let mut arena = EntityArena::new();
        match generate(&mut arena, &feature, &FeatureConfig::default()).unwrap() {
            FeatureOutput::EdgeTreatment(treatment) => {
                assert_eq!(treatment.kind, EdgeTreatmentKind::Chamfer);
                assert_eq!(treatment.size, 0.5);
            }
            other => panic!("expected an edge treatment, got {other:?}"),
        }
    }

    #[test]
    fn test_helix_sample_limit() {
        let feature = FeatureDescriptor::new(FeatureKind::Thread, Point3::origin())
            .with_dimensions(Dimensions {
                major_diameter: Some(10.0),
                pitch: Some(0.5),
                length: Some(20.0),
                ..Dimensions::default()
            });
        // 40 turns at 16 samples per turn
        let config = FeatureConfig {
            max_helix_samples: 639,
            ..FeatureConfig::default()
        };
        let mut arena = EntityArena::new();
        let err = generate(&mut arena, &feature, &config).unwrap_err();
        assert!(matches!(err, KernelError::InvalidFeatureDimensions { .. }));
        assert!(arena.is_empty());

        let config = FeatureConfig {
            max_helix_samples: 640,
            ..FeatureConfig::default()
        };
        assert!(generate(&mut arena, &feature, &config).is_ok());
    }
}
