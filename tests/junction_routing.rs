//! Routing at junctions offering more than one continuation.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use pipeworks::motion::advance_traveling_items;
use pipeworks::{
    DefaultJunctionPolicy, JunctionChoice, JunctionPolicy, JunctionSelector, RandomJunction,
    Side,
};
use rstest::{fixture, rstest};
use test_utils::{carrier, inserted_item, pipe_line, pipe_world};

/// A tee at the origin fed from `-X`, continuing to `+X` and `+Y`.
struct Tee {
    world: World,
    feeder: Entity,
    junction: Entity,
    straight_on: Entity,
    riser: Entity,
}

impl Tee {
    fn build() -> Self {
        let mut world = pipe_world();
        let line = pipe_line(&mut world, IVec3::NEG_X, IVec3::X, 3);
        let riser = pipe_line(&mut world, IVec3::Y, IVec3::Y, 1);
        let [feeder, junction, straight_on] = line.as_slice() else {
            panic!("line of three pipes");
        };
        Self {
            feeder: *feeder,
            junction: *junction,
            straight_on: *straight_on,
            riser: riser.first().copied().expect("riser pipe"),
            world,
        }
    }

    /// Pipes visited by an item fed in through the feeder's outer face.
    fn route(&mut self) -> Vec<Entity> {
        let item = inserted_item(&mut self.world, self.feeder, Side::Left, 1.0);
        let mut visited = Vec::new();
        for _ in 0..80 {
            let Some(pipe) = carrier(&self.world, item) else {
                break;
            };
            if visited.last() != Some(&pipe) {
                visited.push(pipe);
            }
            advance_traveling_items(&mut self.world, 0.05);
        }
        visited
    }
}

#[fixture]
fn tee() -> Tee {
    Tee::build()
}

/// Records every choice it sees and always heads the given way.
struct Recorder {
    towards: Side,
    seen: Arc<Mutex<Vec<JunctionChoice>>>,
}

impl JunctionPolicy for Recorder {
    fn select(&mut self, choice: JunctionChoice) -> Option<Side> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(choice);
        }
        Some(self.towards)
    }
}

#[rstest]
fn default_policy_takes_the_first_declared_side(mut tee: Tee) {
    // The tee declares its paths starting from its top face.
    for _ in 0..3 {
        let visited = tee.route();
        assert_eq!(visited, vec![tee.feeder, tee.junction, tee.riser]);
    }
}

#[rstest]
#[case(Side::Top)]
#[case(Side::Right)]
fn selectors_steer_items(mut tee: Tee, #[case] towards: Side) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Recorder {
        towards,
        seen: Arc::clone(&seen),
    };
    tee.world
        .entity_mut(tee.junction)
        .insert(JunctionSelector::new(recorder));
    let visited = tee.route();
    let expected = if towards == Side::Top {
        tee.riser
    } else {
        tee.straight_on
    };
    assert_eq!(visited, vec![tee.feeder, tee.junction, expected]);

    let choices = seen.lock().expect("choices recorded");
    assert_eq!(choices.len(), 1);
    let choice = choices.first().expect("junction consulted");
    assert_eq!(choice.junction, tee.junction);
    assert_eq!(choice.from, tee.feeder);
    assert_eq!(choice.arrival, Side::Left);
    let mut sides = choice.sides.clone();
    sides.sort();
    assert_eq!(sides, vec![Side::Top, Side::Right]);
}

#[rstest]
fn unoffered_selections_eject_at_the_junction(mut tee: Tee) {
    let recorder = Recorder {
        towards: Side::Back,
        seen: Arc::default(),
    };
    tee.world
        .entity_mut(tee.junction)
        .insert(JunctionSelector::new(recorder));
    assert_eq!(tee.route(), vec![tee.feeder]);
}

#[rstest]
fn seeded_random_defaults_are_reproducible() {
    let run = |seed: u64| {
        let mut tee = Tee::build();
        tee.world
            .insert_resource(DefaultJunctionPolicy(Box::new(RandomJunction::seeded(seed))));
        (0..12)
            .map(|_| tee.route().get(2) == Some(&tee.riser))
            .collect::<Vec<bool>>()
    };
    assert_eq!(run(11), run(11));
}
