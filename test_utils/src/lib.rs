//! Utility helpers for tests.
//!
//! Builders for pipe worlds shared by the integration suites.

use bevy::prelude::*;
use pipeworks::items::spawn_loose_item;
use pipeworks::{
    init_pipe_world, insert_into_pipe, matching_paths, place_block, BlockKind, ItemTemplate,
    PathFollower, Side,
};

/// A bare `World` holding every pipe network resource.
#[must_use]
pub fn pipe_world() -> World {
    let mut world = World::new();
    init_pipe_world(&mut world);
    world
}

/// Places `length` basic pipes starting at `start` and stepping by `step`.
///
/// # Panics
/// Panics if any position is already occupied.
pub fn pipe_line(world: &mut World, start: IVec3, step: IVec3, length: i32) -> Vec<Entity> {
    (0..length)
        .map(|index| {
            let position = start + step * index;
            place_block(world, position, BlockKind::basic_pipe())
                .unwrap_or_else(|err| panic!("placing pipe at {position}: {err}"))
        })
        .collect()
}

/// Spawns a loose item with default physics at `position`.
pub fn loose_item(world: &mut World, position: Vec3) -> Entity {
    spawn_loose_item(world, position, ItemTemplate::default())
}

/// Spawns an item and inserts it into `pipe` through its `side` face along
/// the first matching path.
///
/// # Panics
/// Panics if the pipe has no path on that face or the insertion is refused.
pub fn inserted_item(world: &mut World, pipe: Entity, side: Side, speed: f32) -> Entity {
    let item = loose_item(world, Vec3::ZERO);
    let path = matching_paths(world, pipe, side)
        .first()
        .copied()
        .unwrap_or_else(|| panic!("pipe {pipe} has no path on {side}"));
    assert!(
        insert_into_pipe(world, item, pipe, side, path, speed),
        "pipe {pipe} refused the item"
    );
    item
}

/// Pipe currently carrying `item`, if any.
#[must_use]
pub fn carrier(world: &World, item: Entity) -> Option<Entity> {
    world
        .get::<PathFollower>(item)
        .map(|follower| follower.position.pipe)
}
