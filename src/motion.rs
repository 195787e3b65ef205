//! Per-tick motion of items travelling through pipes.
//!
//! Each tick every captured item loses speed to friction, is held at the
//! minimum speed and moves along its segment. Items that cannot continue are
//! dropped; if the block they leave into accepts pipe connections it is
//! offered the item through [`PipeInsert`].

use bevy::prelude::*;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::components::{
    block_frame, PathDescriptor, PathFollower, Pipe, PipeConnection, PipeFollowing, SegmentPosition,
};
use crate::constants::MIN_PIPE_VELOCITY;
use crate::follower::{advance, follower_point, path_template};
use crate::mapper::PipeSegmentMapper;
use crate::network::drop_item;
use crate::side::Side;
use crate::world_handle::BlockGrid;

/// How friction interacts with the minimum speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VelocityFloor {
    /// Friction is subtracted from the signed velocity and any result below
    /// the floor becomes `+floor`, so a backwards item turns forwards.
    #[default]
    Unsigned,
    /// Friction shrinks the magnitude and the floor applies to the
    /// magnitude; the direction never changes. Zero counts as forwards.
    SignPreserving,
}

impl VelocityFloor {
    /// Velocity after losing `loss` to friction and applying the floor.
    ///
    /// ```
    /// use pipeworks::VelocityFloor;
    ///
    /// assert_eq!(VelocityFloor::Unsigned.apply(-2.0, 0.5, 0.5), 0.5);
    /// assert_eq!(VelocityFloor::SignPreserving.apply(-2.0, 0.5, 0.5), -1.5);
    /// ```
    #[must_use]
    pub fn apply(self, velocity: f32, loss: f32, floor: f32) -> f32 {
        match self {
            Self::Unsigned => (velocity - loss).max(floor),
            Self::SignPreserving => {
                let magnitude = (velocity.abs() - loss).max(floor);
                if velocity < 0.0 {
                    -magnitude
                } else {
                    magnitude
                }
            }
        }
    }
}

/// Runtime tuning of the pipe network.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipeSettings {
    /// Smallest speed an item keeps while travelling.
    pub min_velocity: f32,
    /// Floor policy applied after friction.
    pub velocity_floor: VelocityFloor,
    /// Seed of the generator used by intakes.
    pub rng_seed: u64,
}

impl Default for PipeSettings {
    fn default() -> Self {
        Self {
            min_velocity: MIN_PIPE_VELOCITY,
            velocity_floor: VelocityFloor::default(),
            rng_seed: 0,
        }
    }
}

/// Offers an item leaving the network to the block it left into.
///
/// The item has already been dropped when this fires; observers claiming it
/// take it from free physics.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeInsert {
    /// Block the item leaves into.
    pub block: Entity,
    /// The item.
    pub item: Entity,
    /// Pipe the item left.
    pub pipe: Entity,
    /// Face of `block` the item arrives through.
    pub side: Side,
}

/// Advances every travelling item by `dt` seconds.
pub fn advance_traveling_items(world: &mut World, dt: f32) {
    let settings = world.get_resource::<PipeSettings>().copied().unwrap_or_default();
    let items: Vec<Entity> = world
        .query_filtered::<Entity, With<PathFollower>>()
        .iter(world)
        .collect();
    for item in items {
        step_item(world, item, dt, settings);
    }
}

fn step_item(world: &mut World, item: Entity, dt: f32, settings: PipeSettings) {
    let Some(follower) = world.get::<PathFollower>(item).copied() else {
        return;
    };
    let Some(pipe) = world.get::<Pipe>(follower.position.pipe).copied() else {
        warn!("item {item} references missing pipe {}", follower.position.pipe);
        drop_item(world, item);
        return;
    };
    let Some(mut position) = realign(world, follower.position) else {
        warn!(
            "pipe {} no longer routes the path of item {item}",
            follower.position.pipe
        );
        drop_item(world, item);
        return;
    };

    let current = world
        .get::<PipeFollowing>(item)
        .map_or(settings.min_velocity, |following| following.velocity);
    let velocity = settings
        .velocity_floor
        .apply(current, pipe.friction * dt, settings.min_velocity);

    let moved = advance(world, &mut position, velocity * dt, &mut PipeSegmentMapper);
    place_item(world, item, &position);
    if moved {
        world
            .entity_mut(item)
            .insert((PathFollower { position }, PipeFollowing { velocity }));
        return;
    }
    eject(world, item, &position, velocity);
}

/// Re-seats `position` on the current variant of its pipe.
///
/// A pipe that kept its rotation must still declare the path. A rotated
/// pipe must declare a path joining the same two world faces; the item moves
/// onto it, mirrored when the path runs the other way. Returns `None` when no
/// declared path continues the item's route.
fn realign(world: &World, position: SegmentPosition) -> Option<SegmentPosition> {
    let frame = block_frame(world, position.pipe)?;
    let descriptor = world.get::<PathDescriptor>(position.pipe)?;
    if frame.rotation == position.rotation {
        return descriptor.declares(position.path).then_some(position);
    }
    let template = path_template(world, position.path)?;
    let from = position.rotation.rotate_side(template.s1());
    let to = position.rotation.rotate_side(template.s2());
    descriptor.paths.iter().find_map(|candidate| {
        let other = path_template(world, *candidate)?;
        let max = other.segment().max_distance();
        let faces = (
            frame.rotation.rotate_side(other.s1()),
            frame.rotation.rotate_side(other.s2()),
        );
        if faces == (from, to) {
            Some(SegmentPosition {
                path: *candidate,
                distance: position.distance.clamp(0.0, max),
                rotation: frame.rotation,
                ..position
            })
        } else if faces == (to, from) {
            Some(SegmentPosition {
                path: *candidate,
                distance: (max - position.distance).clamp(0.0, max),
                sign: position.sign.reversed(),
                rotation: frame.rotation,
                ..position
            })
        } else {
            None
        }
    })
}

fn place_item(world: &mut World, item: Entity, position: &SegmentPosition) {
    let Some(translation) = follower_point(world, position) else {
        return;
    };
    let mut entity = world.entity_mut(item);
    if let Some(mut transform) = entity.get_mut::<Transform>() {
        transform.translation = translation;
        return;
    }
    entity.insert(Transform::from_translation(translation));
}

/// Face `position`'s segment leaves its pipe through when moving with
/// `velocity`.
fn exit_side(world: &World, position: &SegmentPosition, velocity: f32) -> Option<Side> {
    let frame = block_frame(world, position.pipe)?;
    let template = path_template(world, position.path)?;
    Some(
        frame
            .rotation
            .rotate_side(template.face(position.sign.heading(velocity))),
    )
}

fn eject(world: &mut World, item: Entity, position: &SegmentPosition, velocity: f32) {
    drop_item(world, item);
    let Some(side) = exit_side(world, position, velocity) else {
        return;
    };
    let Some(origin) = block_frame(world, position.pipe).map(|frame| frame.position) else {
        return;
    };
    let Some(block) = world
        .get_resource::<BlockGrid>()
        .and_then(|grid| grid.entity_at(origin + side.offset()))
    else {
        debug!("item {item} ejected from {origin} towards {side}");
        return;
    };
    if world.get::<PipeConnection>(block).is_none() {
        debug!("item {item} ejected from {origin} into {block}");
        return;
    }
    debug!("item {item} offered to {block} through {}", side.reverse());
    world.trigger(PipeInsert {
        block,
        item,
        pipe: position.pipe,
        side: side.reverse(),
    });
}

/// Exclusive system stepping travelling items by the frame's delta time.
pub fn pipe_motion_system(world: &mut World) {
    let dt = world
        .get_resource::<Time>()
        .map_or(0.0, |time| time.delta_secs());
    advance_traveling_items(world, dt);
}
