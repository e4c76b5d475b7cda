// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Stockform Inc.

//! Flat entity listing and Part 21 text export
//!
//! Every arena entity is listed in creation order, numbered from 1.
//! Geometric references (points, directions, placements) are expanded to
//! literal coordinates; topological references become the number of an
//! earlier listing entry.

use crate::error::{KernelError, Result as KernelResult};
use crate::topology::{Curve, Entity, EntityArena, Handle, Placement, Surface};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One resolved field of a listed entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlatValue {
    Number(f64),
    Flag(bool),
    /// Point or direction coordinates
    Coords([f64; 3]),
    /// Origin, axis and reference direction
    Placement([[f64; 3]; 3]),
    /// Listing number of an earlier entity
    Ref(u64),
    List(Vec<FlatValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatEntity {
    pub id: u64,
    pub kind: String,
    pub values: Vec<FlatValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityListing {
    pub entities: Vec<FlatEntity>,
}

impl EntityListing {
    /// Flatten `arena`; fails if an entity refers to itself or a later one.
    pub fn from_arena(arena: &EntityArena) -> KernelResult<Self> {
        let Some((first, _)) = arena.iter().next() else {
            return Ok(Self::default());
        };
        let flattener = Flattener {
            arena,
            first: first.id(),
        };
        let entities = arena
            .iter()
            .map(|(handle, entity)| {
                let flat = FlatEntity {
                    id: flattener.number(handle)?,
                    kind: entity.kind_name().to_string(),
                    values: flattener.values(entity)?,
                };
                match Self::max_reference(&flat) {
                    Some(target) if target >= flat.id => Err(KernelError::degenerate(format!(
                        "entity #{} refers forward to #{}",
                        flat.id, target
                    ))),
                    _ => Ok(flat),
                }
            })
            .collect::<KernelResult<Vec<_>>>()?;
        Ok(Self { entities })
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Largest reference held by `entity`, if any
    pub fn max_reference(entity: &FlatEntity) -> Option<u64> {
        fn walk(value: &FlatValue, max: &mut Option<u64>) {
            match value {
                FlatValue::Ref(id) => *max = Some(max.map_or(*id, |m: u64| m.max(*id))),
                FlatValue::List(items) => items.iter().for_each(|v| walk(v, max)),
                _ => {}
            }
        }
        let mut max = None;
        entity.values.iter().for_each(|v| walk(v, &mut max));
        max
    }
}

struct Flattener<'a> {
    arena: &'a EntityArena,
    first: u64,
}

impl Flattener<'_> {
    fn number(&self, handle: Handle) -> KernelResult<u64> {
        self.arena.get(handle)?;
        Ok(handle.id() - self.first + 1)
    }

    fn reference(&self, handle: Handle) -> KernelResult<FlatValue> {
        self.number(handle).map(FlatValue::Ref)
    }

    fn point(&self, handle: Handle) -> KernelResult<FlatValue> {
        let p = self.arena.point(handle)?;
        Ok(FlatValue::Coords([p.x, p.y, p.z]))
    }

    fn direction(&self, handle: Handle) -> KernelResult<FlatValue> {
        let d = self.arena.direction(handle)?;
        Ok(FlatValue::Coords([d.x, d.y, d.z]))
    }

    fn placement_value(&self, placement: &Placement) -> KernelResult<FlatValue> {
        let o = self.arena.point(placement.origin)?;
        let a = self.arena.direction(placement.axis)?;
        let r = self.arena.direction(placement.ref_direction)?;
        Ok(FlatValue::Placement([
            [o.x, o.y, o.z],
            [a.x, a.y, a.z],
            [r.x, r.y, r.z],
        ]))
    }

    fn placement(&self, handle: Handle) -> KernelResult<FlatValue> {
        self.placement_value(self.arena.placement(handle)?)
    }

    fn numbers(values: &[f64]) -> FlatValue {
        FlatValue::List(values.iter().copied().map(FlatValue::Number).collect())
    }

    fn points(&self, handles: &[Handle]) -> KernelResult<FlatValue> {
        handles
            .iter()
            .map(|&h| self.point(h))
            .collect::<KernelResult<_>>()
            .map(FlatValue::List)
    }

    fn values(&self, entity: &Entity) -> KernelResult<Vec<FlatValue>> {
        use FlatValue::{Flag, Number};

        let values = match entity {
            Entity::Point(p) => vec![FlatValue::Coords([p.x, p.y, p.z])],
            Entity::Direction(d) => vec![FlatValue::Coords([d.x, d.y, d.z])],
            Entity::Placement(p) => vec![self.placement_value(p)?],
            Entity::Curve(curve) => match curve {
                Curve::Line { origin, direction } => {
                    vec![self.point(*origin)?, self.direction(*direction)?]
                }
                Curve::Circle { placement, radius } => {
                    vec![self.placement(*placement)?, Number(*radius)]
                }
                Curve::Ellipse {
                    placement,
                    semi_major,
                    semi_minor,
                } => vec![
                    self.placement(*placement)?,
                    Number(*semi_major),
                    Number(*semi_minor),
                ],
                Curve::BSpline(spline) => vec![
                    Number(spline.degree as f64),
                    self.points(&spline.control_points)?,
                    Self::numbers(&spline.knots),
                ],
            },
            Entity::Surface(surface) => match surface {
                Surface::Plane { placement } => vec![self.placement(*placement)?],
                Surface::Cylinder { placement, radius }
                | Surface::Sphere { placement, radius } => {
                    vec![self.placement(*placement)?, Number(*radius)]
                }
                Surface::Cone {
                    placement,
                    radius,
                    semi_angle,
                } => vec![
                    self.placement(*placement)?,
                    Number(*radius),
                    Number(*semi_angle),
                ],
                Surface::Torus {
                    placement,
                    major_radius,
                    minor_radius,
                } => vec![
                    self.placement(*placement)?,
                    Number(*major_radius),
                    Number(*minor_radius),
                ],
                Surface::BSpline(spline) => {
                    let rows = spline
                        .control_points
                        .iter()
                        .map(|row| self.points(row))
                        .collect::<KernelResult<_>>()?;
                    vec![
                        Number(spline.u_degree as f64),
                        Number(spline.v_degree as f64),
                        FlatValue::List(rows),
                        Self::numbers(&spline.u_knots),
                        Self::numbers(&spline.v_knots),
                    ]
                }
            },
            Entity::Vertex(v) => vec![self.point(v.point)?],
            Entity::EdgeCurve(e) => vec![
                self.reference(e.start)?,
                self.reference(e.end)?,
                self.reference(e.curve)?,
                Flag(e.same_sense),
            ],
            Entity::Loop(l) => {
                let uses = l
                    .edges
                    .iter()
                    .map(|oe| {
                        let edge = self.reference(oe.edge)?;
                        Ok::<_, KernelError>(FlatValue::List(vec![edge, Flag(oe.forward)]))
                    })
                    .collect::<KernelResult<_>>()?;
                vec![FlatValue::List(uses)]
            }
            Entity::FaceBound(b) => vec![
                self.reference(b.edge_loop)?,
                Flag(b.outer),
                Flag(b.orientation),
            ],
            Entity::Face(f) => {
                let bounds = f
                    .bounds
                    .iter()
                    .map(|&h| self.reference(h))
                    .collect::<KernelResult<_>>()?;
                vec![
                    FlatValue::List(bounds),
                    self.reference(f.surface)?,
                    Flag(f.same_sense),
                ]
            }
            Entity::Shell(s) => {
                let faces = s
                    .faces
                    .iter()
                    .map(|&h| self.reference(h))
                    .collect::<KernelResult<_>>()?;
                vec![FlatValue::List(faces)]
            }
            Entity::Solid(s) => vec![self.reference(s.outer_shell)?],
        };
        Ok(values)
    }
}

/// Write the arena as Part 21 exchange text, stamped with the current time.
pub fn write_part21<W: Write>(arena: &EntityArena, writer: &mut W) -> Result<()> {
    write_part21_at(arena, Utc::now(), writer)
}

/// Write the arena as Part 21 exchange text with an explicit header timestamp.
pub fn write_part21_at<W: Write>(
    arena: &EntityArena,
    timestamp: DateTime<Utc>,
    writer: &mut W,
) -> Result<()> {
    let listing = EntityListing::from_arena(arena).context("Failed to flatten entity arena")?;

    writeln!(writer, "ISO-10303-21;")?;
    writeln!(writer, "HEADER;")?;
    writeln!(writer, "FILE_DESCRIPTION(('Stockform entity export'),'2;1');")?;
    writeln!(
        writer,
        "FILE_NAME('model.stp','{}',(''),(''),'Stockform','','');",
        timestamp.format("%Y-%m-%dT%H:%M:%S")
    )?;
    writeln!(writer, "FILE_SCHEMA(('STOCKFORM_FLAT'));")?;
    writeln!(writer, "ENDSEC;")?;
    writeln!(writer, "DATA;")?;

    for entity in &listing.entities {
        let args: Vec<String> = entity.values.iter().map(format_value).collect();
        writeln!(
            writer,
            "#{}={}('',{});",
            entity.id,
            entity.kind.to_uppercase(),
            args.join(",")
        )?;
    }

    writeln!(writer, "ENDSEC;")?;
    writeln!(writer, "END-ISO-10303-21;")?;
    writer.flush().context("Failed to flush Part 21 output")?;
    Ok(())
}

/// Shortest text that parses back to `v`, as a Part 21 real
fn format_number(v: f64) -> String {
    let s = format!("{v:?}").to_uppercase();
    // Part 21 reals carry a decimal point before any exponent
    match s.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => format!("{mantissa}.E{exponent}"),
        Some(_) => s,
        None if s.contains('.') => s,
        None => format!("{s}."),
    }
}

fn format_triple(c: &[f64; 3]) -> String {
    format!(
        "({},{},{})",
        format_number(c[0]),
        format_number(c[1]),
        format_number(c[2])
    )
}

fn format_value(value: &FlatValue) -> String {
    match value {
        FlatValue::Number(v) => format_number(*v),
        FlatValue::Flag(true) => ".T.".to_string(),
        FlatValue::Flag(false) => ".F.".to_string(),
        FlatValue::Coords(c) => format_triple(c),
        FlatValue::Placement(rows) => format!(
            "({},{},{})",
            format_triple(&rows[0]),
            format_triple(&rows[1]),
            format_triple(&rows[2])
        ),
        FlatValue::Ref(id) => format!("#{id}"),
        FlatValue::List(items) => {
            let inner: Vec<String> = items.iter().map(format_value).collect();
            format!("({})", inner.join(","))
        }
    }
}
