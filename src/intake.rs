//! Suction intakes feeding loose items into adjacent pipes.
//!
//! An intake pulls loose items within its range towards itself and, once an
//! item is within reach and the intake's delay has passed, inserts it into
//! a randomly chosen adjacent pipe along a randomly chosen path touching
//! the intake. The randomness comes from the [`PipeRng`] resource so runs
//! with the same seed route identically.

use std::time::Duration;

use bevy::prelude::*;
use log::debug;
use rand::seq::IteratorRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::components::{BlockPosition, PathFollower};
use crate::constants::{
    DEFAULT_INSERT_SPEED, DEFAULT_SUCTION_DELAY, DEFAULT_SUCTION_RANGE, SUCTION_IMPULSE,
    SUCTION_REACH,
};
use crate::geometry::PathId;
use crate::items::{Pickup, RigidBody, Stored};
use crate::network::{find_pipes, insert_into_pipe, matching_paths};
use crate::side::Side;

/// Intake block state.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Suction {
    /// Radius within which loose items are pulled.
    pub range: f32,
    /// Minimum time between two captures.
    pub delay: Duration,
    /// Simulation time of the last capture.
    pub last_fire: Option<Duration>,
}

impl Default for Suction {
    fn default() -> Self {
        Self {
            range: DEFAULT_SUCTION_RANGE,
            delay: DEFAULT_SUCTION_DELAY,
            last_fire: None,
        }
    }
}

impl Suction {
    /// Whether the intake may capture at `now`.
    #[must_use]
    pub fn is_ready(&self, now: Duration) -> bool {
        self.last_fire
            .is_none_or(|last| now.saturating_sub(last) >= self.delay)
    }
}

/// Random source for intake routing.
#[derive(Resource, Debug, Clone)]
pub struct PipeRng(pub Xoshiro256PlusPlus);

impl PipeRng {
    /// Generator seeded with `seed`.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(Xoshiro256PlusPlus::seed_from_u64(seed))
    }
}

impl Default for PipeRng {
    fn default() -> Self {
        Self::seeded(0)
    }
}

/// Pull applied to a loose item near an intake.
///
/// Fired for the physics collaborator, which turns it into an impulse on
/// the item's rigid body.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SuctionImpulse {
    /// The pulled item.
    pub item: Entity,
    /// Intake doing the pulling.
    pub intake: Entity,
    /// Impulse towards the intake's centre.
    pub impulse: Vec3,
}

/// Picks an adjacent pipe and a path through the face it shares with
/// `location`.
///
/// Returns the pipe, the pipe face the item enters through and the path.
pub fn choose_target(world: &mut World, location: IVec3) -> Option<(Entity, Side, PathId)> {
    let options: Vec<(Entity, Side, Vec<PathId>)> = find_pipes(world, location)
        .into_iter()
        .map(|(side, pipe)| {
            let entry = side.reverse();
            let paths: Vec<PathId> = matching_paths(world, pipe, entry).into_iter().collect();
            (pipe, entry, paths)
        })
        .filter(|(_, _, paths)| !paths.is_empty())
        .collect();
    let mut rng = world.get_resource_or_init::<PipeRng>();
    let (pipe, entry, paths) = options.into_iter().choose(&mut rng.0)?;
    let path = paths.into_iter().choose(&mut rng.0)?;
    Some((pipe, entry, path))
}

/// Inserts `item` into a pipe next to `intake`.
///
/// Returns whether the item was captured.
pub fn capture_item(world: &mut World, intake: Entity, item: Entity) -> bool {
    let Some(location) = world.get::<BlockPosition>(intake).map(|p| p.0) else {
        return false;
    };
    let Some((pipe, entry, path)) = choose_target(world, location) else {
        return false;
    };
    let captured = insert_into_pipe(world, item, pipe, entry, path, DEFAULT_INSERT_SPEED);
    if captured {
        debug!("intake at {location} captured item {item} into {pipe}");
    }
    captured
}

fn loose_items(world: &mut World) -> Vec<(Entity, Vec3)> {
    world
        .query_filtered::<(Entity, &Transform), (
            With<RigidBody>,
            With<Pickup>,
            Without<PathFollower>,
            Without<Stored>,
        )>()
        .iter(world)
        .map(|(entity, transform)| (entity, transform.translation))
        .collect()
}

/// Exclusive system pulling loose items towards intakes and capturing those
/// within reach.
pub fn suction_system(world: &mut World) {
    let now = world
        .get_resource::<Time>()
        .map_or(Duration::ZERO, |time| time.elapsed());
    let intakes: Vec<(Entity, IVec3)> = world
        .query::<(Entity, &BlockPosition, &Suction)>()
        .iter(world)
        .map(|(entity, position, _)| (entity, position.0))
        .collect();

    for (intake, location) in intakes {
        let Some(suction) = world.get::<Suction>(intake).cloned() else {
            continue;
        };
        let centre = location.as_vec3();
        let mut ready = suction.is_ready(now);
        for (item, translation) in loose_items(world) {
            let offset = centre - translation;
            let distance = offset.length();
            if distance > suction.range {
                continue;
            }
            if distance <= SUCTION_REACH {
                if ready && capture_item(world, intake, item) {
                    ready = false;
                    if let Some(mut fired) = world.get_mut::<Suction>(intake) {
                        fired.last_fire = Some(now);
                    }
                }
                continue;
            }
            world.trigger(SuctionImpulse {
                item,
                intake,
                impulse: offset.normalize_or_zero() * SUCTION_IMPULSE,
            });
        }
    }
}
