//! In-memory voxel host used by the pipe systems.
//!
//! [`BlockGrid`] maps grid positions to block entities. Placement and
//! removal go through [`place_block`] and [`remove_block`], which deliver a
//! neighbour update to the six adjacent blocks so pipes can pick a new
//! variant.

use bevy::prelude::*;
use hashbrown::HashMap;
use log::{debug, warn};

use crate::components::{BlockPosition, PathDescriptor, Pipe, PipeBlock, PipeConnection};
use crate::connectivity::{
    compute_connection_mask, refresh_pipe_variant, PipeFamilies, BASIC_PIPE_FAMILY,
};
use crate::container::ItemContainer;
use crate::error::{PipeNetworkError, PipeNetworkErrorContext, PlacementError};
use crate::intake::Suction;
use crate::side::{ConnectionMask, Side};

/// Inclusive box of loaded grid positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedRegion {
    /// Smallest loaded corner.
    pub min: IVec3,
    /// Largest loaded corner.
    pub max: IVec3,
}

impl LoadedRegion {
    /// Whether `position` lies inside the region.
    #[must_use]
    pub fn contains(&self, position: IVec3) -> bool {
        position.cmpge(self.min).all() && position.cmple(self.max).all()
    }
}

#[derive(Resource, Debug, Default)]
/// Block storage indexed by grid position.
pub struct BlockGrid {
    blocks: HashMap<IVec3, Entity>,
    /// Loaded region; `None` treats every position as loaded.
    pub loaded: Option<LoadedRegion>,
}

impl BlockGrid {
    /// Whether blocks at `position` may be queried.
    #[must_use]
    pub fn is_block_loaded(&self, position: IVec3) -> bool {
        self.loaded.is_none_or(|region| region.contains(position))
    }

    /// Entity of the block occupying `position`, if loaded and present.
    #[must_use]
    pub fn entity_at(&self, position: IVec3) -> Option<Entity> {
        if !self.is_block_loaded(position) {
            return None;
        }
        self.blocks.get(&position).copied()
    }

    /// Number of placed blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the grid holds no block.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// What to place at a grid position.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    /// A pipe of the named family.
    Pipe {
        /// Family name, see [`crate::BASIC_PIPE_FAMILY`].
        family: String,
        /// Pipe friction.
        pipe: Pipe,
    },
    /// A block storing items delivered by pipes.
    Container(ItemContainer),
    /// An intake pulling loose items into adjacent pipes.
    Suction(Suction),
    /// A block with no pipe capability.
    Solid,
}

impl BlockKind {
    /// Default pipe of the basic family.
    #[must_use]
    pub fn basic_pipe() -> Self {
        Self::Pipe {
            family: BASIC_PIPE_FAMILY.to_owned(),
            pipe: Pipe::default(),
        }
    }
}

/// Places a block and notifies its neighbours.
///
/// Pipes receive the variant matching their current neighbourhood before any
/// neighbour is notified.
///
/// # Errors
/// Returns [`PlacementError`] when the position is taken or unloaded, the
/// family is unknown, or the family has no variant for the computed mask.
/// Nothing is spawned in that case.
pub fn place_block(world: &mut World, position: IVec3, kind: BlockKind) -> Result<Entity, PlacementError> {
    {
        let grid = world.get_resource_or_init::<BlockGrid>();
        if !grid.is_block_loaded(position) {
            return Err(PlacementError::NotLoaded(position));
        }
        if grid.blocks.contains_key(&position) {
            return Err(PlacementError::Occupied(position));
        }
    }

    let entity = match kind {
        BlockKind::Pipe { family, pipe } => spawn_pipe(world, position, &family, pipe)?,
        BlockKind::Container(container) => world
            .spawn((BlockPosition(position), PipeConnection, container))
            .id(),
        BlockKind::Suction(suction) => world
            .spawn((BlockPosition(position), PipeConnection, suction))
            .id(),
        BlockKind::Solid => world.spawn(BlockPosition(position)).id(),
    };
    world.resource_mut::<BlockGrid>().blocks.insert(position, entity);
    debug!("placed block {entity} at {position}");
    notify_neighbours(world, position);
    Ok(entity)
}

fn spawn_pipe(world: &mut World, position: IVec3, family_name: &str, pipe: Pipe) -> Result<Entity, PlacementError> {
    let families = world
        .get_resource::<PipeFamilies>()
        .ok_or_else(|| PlacementError::UnknownFamily(family_name.to_owned()))?;
    let family_id = families
        .find(family_name)
        .ok_or_else(|| PlacementError::UnknownFamily(family_name.to_owned()))?;
    let family = families
        .get(family_id)
        .ok_or_else(|| PlacementError::UnknownFamily(family_name.to_owned()))?;
    let mask = compute_connection_mask(world, position, family.connection_sides());
    let variant = family.variant_for(mask).inspect_err(|err| {
        world.trigger(PipeNetworkError::new(PipeNetworkErrorContext::Placement, err.to_string()));
    })?;
    let paths = family.paths_for(variant);
    Ok(world
        .spawn((
            BlockPosition(position),
            pipe,
            PipeBlock {
                family: family_id,
                mask,
                rotation: variant.rotation,
            },
            PathDescriptor { paths },
        ))
        .id())
}

/// Removes the block at `position` and notifies its neighbours.
///
/// Items travelling through a removed pipe are not touched here; the motion
/// system notices the missing pipe on its next tick and ejects them.
pub fn remove_block(world: &mut World, position: IVec3) -> Option<Entity> {
    let entity = world.get_resource_mut::<BlockGrid>()?.blocks.remove(&position)?;
    if !world.despawn(entity) {
        warn!("block {entity} at {position} was already despawned");
    }
    debug!("removed block {entity} at {position}");
    notify_neighbours(world, position);
    Some(entity)
}

/// Delivers a neighbour update to the six blocks around `position`.
pub fn notify_neighbours(world: &mut World, position: IVec3) {
    for side in Side::ALL {
        let neighbour_position = position + side.offset();
        let Some(neighbour) = world
            .get_resource::<BlockGrid>()
            .and_then(|grid| grid.entity_at(neighbour_position))
        else {
            continue;
        };
        if let Err(err) = refresh_pipe_variant(world, neighbour) {
            world.trigger(PipeNetworkError::new(
                PipeNetworkErrorContext::NeighbourUpdate,
                err.to_string(),
            ));
        }
    }
}

/// Connection mask currently stored on the pipe at `position`.
#[must_use]
pub fn pipe_mask_at(world: &World, position: IVec3) -> Option<ConnectionMask> {
    let entity = world.get_resource::<BlockGrid>()?.entity_at(position)?;
    world.get::<PipeBlock>(entity).map(|block| block.mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_pipe_world;
    use rstest::{fixture, rstest};

    #[fixture]
    fn world() -> World {
        let mut world = World::new();
        init_pipe_world(&mut world);
        world
    }

    #[rstest]
    fn lone_pipe_has_empty_mask(mut world: World) {
        place_block(&mut world, IVec3::ZERO, BlockKind::basic_pipe()).expect("placed");
        assert_eq!(pipe_mask_at(&world, IVec3::ZERO), Some(ConnectionMask::EMPTY));
    }

    #[rstest]
    fn neighbours_update_each_other(mut world: World) {
        place_block(&mut world, IVec3::ZERO, BlockKind::basic_pipe()).expect("placed");
        place_block(&mut world, IVec3::X, BlockKind::basic_pipe()).expect("placed");
        assert_eq!(
            pipe_mask_at(&world, IVec3::ZERO),
            Some(ConnectionMask::EMPTY.with(Side::Right))
        );
        assert_eq!(
            pipe_mask_at(&world, IVec3::X),
            Some(ConnectionMask::EMPTY.with(Side::Left))
        );
        remove_block(&mut world, IVec3::X).expect("removed");
        assert_eq!(pipe_mask_at(&world, IVec3::ZERO), Some(ConnectionMask::EMPTY));
    }

    #[rstest]
    fn solid_blocks_do_not_connect(mut world: World) {
        place_block(&mut world, IVec3::ZERO, BlockKind::basic_pipe()).expect("placed");
        place_block(&mut world, IVec3::Y, BlockKind::Solid).expect("placed");
        place_block(&mut world, IVec3::NEG_Y, BlockKind::Container(ItemContainer::with_capacity(4)))
            .expect("placed");
        assert_eq!(
            pipe_mask_at(&world, IVec3::ZERO),
            Some(ConnectionMask::EMPTY.with(Side::Bottom))
        );
    }

    #[rstest]
    fn occupied_and_unloaded_positions_are_rejected(mut world: World) {
        place_block(&mut world, IVec3::ZERO, BlockKind::Solid).expect("placed");
        assert_eq!(
            place_block(&mut world, IVec3::ZERO, BlockKind::Solid),
            Err(PlacementError::Occupied(IVec3::ZERO))
        );
        world.resource_mut::<BlockGrid>().loaded = Some(LoadedRegion {
            min: IVec3::splat(-1),
            max: IVec3::splat(1),
        });
        let far = IVec3::new(5, 0, 0);
        assert_eq!(
            place_block(&mut world, far, BlockKind::Solid),
            Err(PlacementError::NotLoaded(far))
        );
    }

    #[rstest]
    fn unknown_family_spawns_nothing(mut world: World) {
        let kind = BlockKind::Pipe {
            family: "pipes:missing".to_owned(),
            pipe: Pipe::default(),
        };
        assert!(matches!(
            place_block(&mut world, IVec3::ZERO, kind),
            Err(PlacementError::UnknownFamily(_))
        ));
        assert!(world.resource::<BlockGrid>().is_empty());
    }
}
