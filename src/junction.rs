//! Junction choices and the policies that settle them.
//!
//! When an item reaches a block offering more than one continuation, the
//! mapper builds a [`JunctionChoice`] and hands it to a [`JunctionPolicy`].
//! The policy comes from the junction's own [`JunctionSelector`] if it has
//! one, otherwise from the world's [`DefaultJunctionPolicy`].

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::side::Side;

/// Decision record for a junction with several continuations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionChoice {
    /// Block where the item arrives.
    pub junction: Entity,
    /// Block the item is leaving.
    pub from: Entity,
    /// Face of the junction the item enters through.
    pub arrival: Side,
    /// Distinct outward faces of the candidate continuations, in the
    /// junction's declaration order.
    pub sides: Vec<Side>,
}

impl JunctionChoice {
    /// First enumerated side.
    #[must_use]
    pub fn first(&self) -> Option<Side> {
        self.sides.first().copied()
    }
}

/// Strategy choosing the outward side taken at a junction.
///
/// Returning a side the choice does not offer, or `None`, makes the
/// resolution fail and the item is ejected.
#[cfg_attr(test, mockall::automock)]
pub trait JunctionPolicy {
    /// Picks one of `choice.sides`.
    fn select(&mut self, choice: JunctionChoice) -> Option<Side>;
}

/// Always takes the first enumerated side.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstCandidate;

impl JunctionPolicy for FirstCandidate {
    fn select(&mut self, choice: JunctionChoice) -> Option<Side> {
        choice.first()
    }
}

/// Picks uniformly among the offered sides.
#[derive(Debug, Clone)]
pub struct RandomJunction {
    rng: Xoshiro256PlusPlus,
}

impl RandomJunction {
    /// Policy driven by a generator seeded with `seed`.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }
}

impl JunctionPolicy for RandomJunction {
    fn select(&mut self, choice: JunctionChoice) -> Option<Side> {
        choice.sides.choose(&mut self.rng).copied()
    }
}

/// Per-junction override of the default policy.
#[derive(Component)]
pub struct JunctionSelector(pub Box<dyn JunctionPolicy + Send + Sync>);

impl JunctionSelector {
    /// Wraps a policy.
    #[must_use]
    pub fn new(policy: impl JunctionPolicy + Send + Sync + 'static) -> Self {
        Self(Box::new(policy))
    }
}

/// Policy used by junctions without a [`JunctionSelector`].
#[derive(Resource)]
pub struct DefaultJunctionPolicy(pub Box<dyn JunctionPolicy + Send + Sync>);

impl Default for DefaultJunctionPolicy {
    fn default() -> Self {
        Self(Box::new(FirstCandidate))
    }
}

/// Settles `choice` with the policy responsible for its junction.
pub fn select_side(world: &mut World, choice: JunctionChoice) -> Option<Side> {
    if let Some(mut selector) = world.get_mut::<JunctionSelector>(choice.junction) {
        return selector.0.select(choice);
    }
    if let Some(mut fallback) = world.get_resource_mut::<DefaultJunctionPolicy>() {
        return fallback.0.select(choice);
    }
    choice.first()
}
