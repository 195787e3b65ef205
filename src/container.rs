//! Container blocks that claim items delivered by pipes.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::debug;

use crate::items::{Lifespan, Pickup, RigidBody, Stored};
use crate::motion::PipeInsert;

/// Inventory block with a fixed number of item slots.
#[derive(Component, Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemContainer {
    /// Stored items, oldest first.
    pub slots: Vec<Entity>,
    /// Maximum number of stored items.
    pub capacity: usize,
}

impl ItemContainer {
    /// Empty container holding up to `capacity` items.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Whether another item fits.
    #[must_use]
    pub fn has_room(&self) -> bool {
        self.slots.len() < self.capacity
    }

    /// Whether `item` is stored here.
    #[must_use]
    pub fn contains(&self, item: Entity) -> bool {
        self.slots.contains(&item)
    }
}

/// Stores items leaving a pipe into a container with room left.
///
/// Full containers ignore the offer and the item stays on the ground.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value."
)]
pub fn accept_piped_item(
    event: On<PipeInsert>,
    mut commands: Commands,
    mut containers: Query<&mut ItemContainer>,
) {
    let PipeInsert { block, item, .. } = *event.event();
    let Ok(mut container) = containers.get_mut(block) else {
        return;
    };
    if !container.has_room() || container.contains(item) {
        return;
    }
    container.slots.push(item);
    debug!("container {block} stored item {item}");
    commands
        .entity(item)
        .remove::<(RigidBody, Lifespan, Pickup)>()
        .insert(Stored { container: block });
}
