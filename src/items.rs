//! Loose item state groups handed back and forth with the physics layer.
//!
//! A free item carries [`RigidBody`], [`Lifespan`] and [`Pickup`]. Capturing
//! it into a pipe strips all three; dropping it restores them from its
//! [`ItemTemplate`].

use std::time::Duration;

use bevy::prelude::*;

/// Rigid-body participation of a loose item.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct RigidBody {
    /// Body mass handed to the physics layer.
    pub mass: f32,
    /// Whether the body collides with world geometry.
    pub collides_with_world: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            mass: 1.0,
            collides_with_world: true,
        }
    }
}

/// Time a loose item survives before despawning.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifespan(pub Duration);

impl Default for Lifespan {
    fn default() -> Self {
        Self(Duration::from_secs(300))
    }
}

/// Marks a loose item as collectable.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pickup {
    /// Simulation time at which the item was last dropped.
    pub time_dropped: Duration,
}

/// Free-physics state an item returns to when it leaves the network.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct ItemTemplate {
    /// Body restored on drop.
    pub rigid_body: RigidBody,
    /// Lifespan restored on drop.
    pub lifespan: Lifespan,
}

/// Records that an item was claimed by a container block.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stored {
    /// Container block holding the item.
    pub container: Entity,
}

/// Spawns a loose, physics-driven item at `position`.
pub fn spawn_loose_item(world: &mut World, position: Vec3, template: ItemTemplate) -> Entity {
    world
        .spawn((
            Transform::from_translation(position),
            template,
            template.rigid_body,
            template.lifespan,
            Pickup::default(),
        ))
        .id()
}

/// Whether the item currently has its free-physics state.
#[must_use]
pub fn is_loose(world: &World, item: Entity) -> bool {
    world.get::<RigidBody>(item).is_some()
        && world.get::<Lifespan>(item).is_some()
        && world.get::<Pickup>(item).is_some()
}
