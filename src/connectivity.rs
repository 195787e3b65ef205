//! Connectivity model: connection masks and pipe block variants.
//!
//! A [`PipeFamily`] owns a handful of canonical shapes (end piece, straight,
//! corner, tee, ...). At construction it precomputes, for every mask value,
//! the first shape and rotation whose rotated connections equal that mask.
//! Placement and neighbour updates then reduce to a table lookup.

use std::sync::Arc;

use bevy::prelude::*;
use hashbrown::HashMap;
use log::debug;

use crate::components::{
    BlockPosition, FamilyId, PathDescriptor, Pipe, PipeBlock, PipeConnection,
};
use crate::error::PlacementError;
use crate::geometry::{PathId, PathRegistry};
use crate::rotation::Rotation;
use crate::side::{ConnectionMask, Side};
use crate::world_handle::BlockGrid;

/// Name of the family registered by [`PipeFamilies::with_basic`].
pub const BASIC_PIPE_FAMILY: &str = "pipes:basic";

/// Canonical geometry of one pipe block variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeShape {
    /// Human readable shape name.
    pub name: &'static str,
    /// Connected faces in the canonical frame.
    pub connections: ConnectionMask,
    /// Paths declared in the canonical frame.
    pub paths: Vec<PathId>,
}

impl PipeShape {
    /// Shape whose paths join every pair of its connected faces.
    ///
    /// Shapes with fewer than two connections get a single straight path
    /// leaving through the face opposite their connection (or along the `X`
    /// axis when unconnected), so items can always pass through them.
    #[must_use]
    pub fn fully_routed(
        name: &'static str,
        connections: ConnectionMask,
        paths: &mut PathRegistry,
    ) -> Self {
        let sides: Vec<Side> = connections.sides().collect();
        let declared = match sides.as_slice() {
            [] => vec![paths.intern(Side::Left, Side::Right)],
            [only] => vec![paths.intern(*only, only.reverse())],
            _ => sides
                .iter()
                .enumerate()
                .flat_map(|(index, s1)| sides.iter().skip(index + 1).map(move |s2| (*s1, *s2)))
                .map(|(s1, s2)| paths.intern(s1, s2))
                .collect(),
        };
        Self {
            name,
            connections,
            paths: declared,
        }
    }
}

/// A concrete block variant resolved from a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeVariant {
    /// Index of the shape inside its family.
    pub shape: usize,
    /// Rotation applied to the shape's canonical geometry.
    pub rotation: Rotation,
}

/// Archetype block plus its mask-to-variant table.
#[derive(Debug)]
pub struct PipeFamily {
    name: String,
    connection_sides: ConnectionMask,
    shapes: Vec<PipeShape>,
    table: HashMap<ConnectionMask, PipeVariant>,
}

impl PipeFamily {
    /// Builds a family and precomputes its variant table.
    ///
    /// Masks no shape can be rotated into are left out of the table; looking
    /// them up later reports [`PlacementError::NoVariant`].
    #[must_use]
    pub fn new(name: impl Into<String>, connection_sides: ConnectionMask, shapes: Vec<PipeShape>) -> Self {
        let rotations = Rotation::all();
        let mut table = HashMap::new();
        for mask in ConnectionMask::every() {
            let found = shapes.iter().enumerate().find_map(|(index, shape)| {
                rotations
                    .iter()
                    .find(|rotation| rotation.rotate_mask(shape.connections) == mask)
                    .map(|rotation| PipeVariant {
                        shape: index,
                        rotation: *rotation,
                    })
            });
            if let Some(variant) = found {
                table.insert(mask, variant);
            }
        }
        Self {
            name: name.into(),
            connection_sides,
            shapes,
            table,
        }
    }

    /// The stock family: one shape per class of connection mask under
    /// rotation, so every mask from 0 to 63 has a variant.
    #[must_use]
    pub fn basic(paths: &mut PathRegistry) -> Self {
        let mask = |sides: &[Side]| sides.iter().copied().collect::<ConnectionMask>();
        let shapes = vec![
            PipeShape::fully_routed("none", ConnectionMask::EMPTY, paths),
            PipeShape::fully_routed("end", mask(&[Side::Left]), paths),
            PipeShape::fully_routed("straight", mask(&[Side::Left, Side::Right]), paths),
            PipeShape::fully_routed("corner", mask(&[Side::Left, Side::Top]), paths),
            PipeShape::fully_routed("tee", mask(&[Side::Left, Side::Right, Side::Top]), paths),
            PipeShape::fully_routed("elbow", mask(&[Side::Left, Side::Top, Side::Back]), paths),
            PipeShape::fully_routed(
                "cross",
                mask(&[Side::Left, Side::Right, Side::Front, Side::Back]),
                paths,
            ),
            PipeShape::fully_routed(
                "bent-cross",
                mask(&[Side::Left, Side::Right, Side::Top, Side::Back]),
                paths,
            ),
            PipeShape::fully_routed("five-way", ConnectionMask::ALL.without(Side::Bottom), paths),
            PipeShape::fully_routed("six-way", ConnectionMask::ALL, paths),
        ];
        Self::new(BASIC_PIPE_FAMILY, ConnectionMask::ALL, shapes)
    }

    /// Family name, also the prefix of its variant identifiers.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Faces this family is allowed to connect through.
    #[must_use]
    pub const fn connection_sides(&self) -> ConnectionMask {
        self.connection_sides
    }

    /// Canonical shape by index.
    #[must_use]
    pub fn shape(&self, index: usize) -> Option<&PipeShape> {
        self.shapes.get(index)
    }

    /// Looks up the variant for a mask.
    ///
    /// # Errors
    /// Returns [`PlacementError::NoVariant`] when the table has no entry,
    /// which only happens for incomplete families.
    pub fn variant_for(&self, mask: ConnectionMask) -> Result<PipeVariant, PlacementError> {
        self.table
            .get(&mask)
            .copied()
            .ok_or_else(|| PlacementError::NoVariant {
                family: self.name.clone(),
                mask,
            })
    }

    /// Paths declared by a variant, in the block's local frame.
    #[must_use]
    pub fn paths_for(&self, variant: PipeVariant) -> Vec<PathId> {
        self.shape(variant.shape)
            .map(|shape| shape.paths.clone())
            .unwrap_or_default()
    }

    /// Identifier of the variant selected by `mask`, for example
    /// `pipes:basic:5`.
    #[must_use]
    pub fn variant_uri(&self, mask: ConnectionMask) -> String {
        format!("{}:{}", self.name, mask)
    }

    /// Parses the mask back out of a variant identifier.
    ///
    /// Identifiers of other families, non-numeric suffixes and values above
    /// 63 all yield `None`.
    #[must_use]
    pub fn decode_mask(&self, uri: &str) -> Option<ConnectionMask> {
        let suffix = uri.strip_prefix(self.name.as_str())?.strip_prefix(':')?;
        suffix.parse::<u8>().ok().and_then(ConnectionMask::new)
    }

    /// Connected sides named by a variant identifier.
    #[must_use]
    pub fn sides_for(&self, uri: &str) -> Option<Vec<Side>> {
        self.decode_mask(uri).map(|mask| mask.sides().collect())
    }

    /// Rotation of the variant named by an identifier.
    #[must_use]
    pub fn rotation_for(&self, uri: &str) -> Option<Rotation> {
        let mask = self.decode_mask(uri)?;
        self.table.get(&mask).map(|variant| variant.rotation)
    }
}

/// Registry of pipe families available for placement.
#[derive(Resource, Debug, Default)]
pub struct PipeFamilies {
    families: Vec<Arc<PipeFamily>>,
}

impl PipeFamilies {
    /// Registry holding only the [`BASIC_PIPE_FAMILY`].
    #[must_use]
    pub fn with_basic(paths: &mut PathRegistry) -> Self {
        let mut families = Self::default();
        families.register(PipeFamily::basic(paths));
        families
    }

    /// Adds a family, returning its identity.
    pub fn register(&mut self, family: PipeFamily) -> FamilyId {
        self.families.push(Arc::new(family));
        FamilyId(self.families.len() - 1)
    }

    /// Looks up a family by identity.
    #[must_use]
    pub fn get(&self, id: FamilyId) -> Option<Arc<PipeFamily>> {
        self.families.get(id.0).cloned()
    }

    /// Looks up a family by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<FamilyId> {
        self.families
            .iter()
            .position(|family| family.name() == name)
            .map(FamilyId)
    }
}

/// Whether the entity exposes pipe or pipe-connection capability.
#[must_use]
pub fn is_pipe_capable(world: &World, entity: Entity) -> bool {
    world.get::<Pipe>(entity).is_some() || world.get::<PipeConnection>(entity).is_some()
}

/// Derives the mask of faces of `location` that abut pipe-capable blocks.
///
/// Only faces listed in `connection_sides` are considered.
#[must_use]
pub fn compute_connection_mask(
    world: &World,
    location: IVec3,
    connection_sides: ConnectionMask,
) -> ConnectionMask {
    let Some(grid) = world.get_resource::<BlockGrid>() else {
        return ConnectionMask::EMPTY;
    };
    connection_sides
        .sides()
        .filter(|side| {
            grid.entity_at(location + side.offset())
                .is_some_and(|neighbour| is_pipe_capable(world, neighbour))
        })
        .collect()
}

/// Recomputes the variant of the pipe block `entity`.
///
/// Returns whether the variant changed. On a configuration error the block
/// keeps its previous variant.
///
/// # Errors
/// Returns [`PlacementError`] when the family is unknown or has no variant
/// for the new mask.
pub fn refresh_pipe_variant(world: &mut World, entity: Entity) -> Result<bool, PlacementError> {
    let Some(block) = world.get::<PipeBlock>(entity).copied() else {
        return Ok(false);
    };
    let Some(position) = world.get::<BlockPosition>(entity).copied() else {
        return Ok(false);
    };
    let family = world
        .get_resource::<PipeFamilies>()
        .and_then(|families| families.get(block.family))
        .ok_or_else(|| PlacementError::UnknownFamily(format!("{:?}", block.family)))?;
    let mask = compute_connection_mask(world, position.0, family.connection_sides());
    let variant = family.variant_for(mask)?;
    let unchanged = mask == block.mask && variant.rotation == block.rotation;
    if unchanged && world.get::<PathDescriptor>(entity).is_some() {
        return Ok(false);
    }
    debug!(
        "pipe at {} now uses {} ({:?})",
        position.0,
        family.variant_uri(mask),
        family.shape(variant.shape).map(|shape| shape.name)
    );
    let paths = family.paths_for(variant);
    if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
        entity_mut.insert((
            PipeBlock {
                family: block.family,
                mask,
                rotation: variant.rotation,
            },
            PathDescriptor { paths },
        ));
    }
    Ok(true)
}
