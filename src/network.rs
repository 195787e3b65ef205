//! Network queries and the hand-over between free physics and pipes.
//!
//! [`insert_into_pipe`] and [`drop_item`] are the only places where an item
//! changes owner. Both tolerate being called on items in the "wrong" state
//! so callers on failure paths never have to check first.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use bevy::prelude::*;
use log::debug;

use crate::components::{
    block_frame, BlockPosition, PathDescriptor, PathFollower, Pipe, PipeBlock, PipeFollowing,
    SegmentPosition, TravelSign,
};
use crate::follower::{follower_point, path_template};
use crate::geometry::{PathId, PathRegistry};
use crate::items::{ItemTemplate, Lifespan, Pickup, RigidBody};
use crate::rotation::Rotation;
use crate::side::Side;
use crate::world_handle::BlockGrid;

fn neighbour(world: &World, location: IVec3, side: Side) -> Option<Entity> {
    world
        .get_resource::<BlockGrid>()?
        .entity_at(location + side.offset())
}

/// Whether the pipe beyond `side` of `location` connects back towards it.
///
/// A neighbour that is a pipe but whose own mask excludes the reverse face
/// does not count.
#[must_use]
pub fn is_connected(world: &World, location: IVec3, side: Side) -> bool {
    neighbour(world, location, side)
        .and_then(|entity| world.get::<PipeBlock>(entity))
        .is_some_and(|block| block.mask.contains(side.reverse()))
}

/// Every face of `location` with a pipe block beyond it, connected or not.
#[must_use]
pub fn find_pipes(world: &World, location: IVec3) -> BTreeMap<Side, Entity> {
    Side::ALL
        .into_iter()
        .filter_map(|side| {
            neighbour(world, location, side)
                .filter(|entity| world.get::<Pipe>(*entity).is_some())
                .map(|entity| (side, entity))
        })
        .collect()
}

/// Of `paths`, those with an end facing `side` once rotated by `rotation`.
#[must_use]
pub fn filter_paths_by_side(
    registry: &PathRegistry,
    rotation: Rotation,
    paths: &[PathId],
    side: Side,
) -> BTreeSet<PathId> {
    paths
        .iter()
        .copied()
        .filter(|path| {
            registry
                .get(*path)
                .is_some_and(|template| template.touches(rotation, side))
        })
        .collect()
}

/// Declared paths of `pipe` with an end on its `side` face.
#[must_use]
pub fn matching_paths(world: &World, pipe: Entity, side: Side) -> BTreeSet<PathId> {
    let (Some(registry), Some(descriptor)) = (
        world.get_resource::<PathRegistry>(),
        world.get::<PathDescriptor>(pipe),
    ) else {
        return BTreeSet::new();
    };
    let rotation = world
        .get::<PipeBlock>(pipe)
        .map_or(Rotation::IDENTITY, |block| block.rotation);
    filter_paths_by_side(registry, rotation, &descriptor.paths, side)
}

/// Whether `item` is currently travelling through the network.
#[must_use]
pub fn is_following(world: &World, item: Entity) -> bool {
    world.get::<PathFollower>(item).is_some()
}

/// Captures `item` into `path` of `pipe`, entering through the pipe's
/// `side` face.
///
/// The item starts at the path end on that face, heading inwards, with a
/// speed of `|speed|`. It loses its free-physics state and its orientation
/// is reset.
///
/// Returns `false`, changing nothing, when the item already follows a path,
/// `pipe` is not a pipe or does not declare `path`, or neither end of
/// `path` lies on `side`.
pub fn insert_into_pipe(
    world: &mut World,
    item: Entity,
    pipe: Entity,
    side: Side,
    path: PathId,
    speed: f32,
) -> bool {
    if world.get_entity(item).is_err() || is_following(world, item) {
        return false;
    }
    if world.get::<Pipe>(pipe).is_none()
        || !world
            .get::<PathDescriptor>(pipe)
            .is_some_and(|descriptor| descriptor.declares(path))
    {
        return false;
    }
    let (Some(frame), Some(template)) = (block_frame(world, pipe), path_template(world, path))
    else {
        return false;
    };

    let (distance, sign) = if frame.rotation.rotate_side(template.s1()) == side {
        (0.0, TravelSign::Forward)
    } else if frame.rotation.rotate_side(template.s2()) == side {
        (template.segment().max_distance(), TravelSign::Reverse)
    } else {
        return false;
    };
    let position = SegmentPosition {
        pipe,
        path,
        distance,
        sign,
        rotation: frame.rotation,
    };
    let translation = follower_point(world, &position).unwrap_or_else(|| frame.position.as_vec3());

    let mut entity = world.entity_mut(item);
    entity
        .remove::<(RigidBody, Lifespan, Pickup)>()
        .insert((
            PathFollower { position },
            PipeFollowing {
                velocity: speed.abs(),
            },
        ));
    let scale = entity.get::<Transform>().map_or(Vec3::ONE, |transform| transform.scale);
    entity.insert(Transform {
        translation,
        rotation: Quat::IDENTITY,
        scale,
    });
    debug!(
        "item {item} entered pipe {pipe} at {} through {side}",
        world.get::<BlockPosition>(pipe).map_or(IVec3::ZERO, |p| p.0)
    );
    true
}

/// Releases `item` back to free physics.
///
/// Restores its rigid body, lifespan and pickup marker from its
/// [`ItemTemplate`] (or the defaults), stamping the pickup with the current
/// simulation time, and removes any path state. Safe to call on items that
/// are not in the network and on despawned entities. Returns whether the
/// item was following a path.
pub fn drop_item(world: &mut World, item: Entity) -> bool {
    let now = world
        .get_resource::<Time>()
        .map_or(Duration::ZERO, |time| time.elapsed());
    let template = world.get::<ItemTemplate>(item).copied().unwrap_or_default();
    let Ok(mut entity) = world.get_entity_mut(item) else {
        return false;
    };
    let was_following = entity.contains::<PathFollower>();
    entity
        .remove::<(PathFollower, PipeFollowing)>()
        .insert((
            template.rigid_body,
            template.lifespan,
            Pickup { time_dropped: now },
        ));
    if was_following {
        debug!("item {item} left the pipe network");
    }
    was_following
}
