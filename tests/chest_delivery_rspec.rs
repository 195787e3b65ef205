//! Behaviour tests: an item next to an intake travels through a single pipe
//! and ends up in the container on the far side, whether it is inserted by
//! hand or captured by the intake.

#[path = "support/thread_safe_app.rs"]
mod thread_safe_app;

#[path = "support/rspec_runner.rs"]
mod rspec_runner;

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use pipeworks::items::is_loose;
use pipeworks::{
    insert_into_pipe, matching_paths, place_block, BlockKind, ItemContainer, PathFollower,
    PipePlugin, Side, Stored, Suction, DEFAULT_INSERT_SPEED,
};
use rspec_runner::run_serial;
use test_utils::loose_item;
use thread_safe_app::{lock_app, share, SharedApp};

const TICK: Duration = Duration::from_millis(50);
const DELIVERY_BOUND: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
struct DeliveryFixture {
    app: SharedApp,
    pipe: Entity,
    container: Entity,
    item: Entity,
}

impl DeliveryFixture {
    fn bootstrap() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(TICK));
        app.add_plugins(PipePlugin);

        let world = app.world_mut();
        place_block(world, IVec3::NEG_X, BlockKind::Suction(Suction::default()))
            .expect("intake placed");
        let pipe = place_block(world, IVec3::ZERO, BlockKind::basic_pipe()).expect("pipe placed");
        let container = place_block(
            world,
            IVec3::X,
            BlockKind::Container(ItemContainer::with_capacity(4)),
        )
        .expect("container placed");
        let item = loose_item(world, Vec3::new(-0.5, 0.0, 0.0));

        Self {
            app: share(app),
            pipe,
            container,
            item,
        }
    }

    fn insert(&self) {
        let mut app = lock_app(&self.app);
        let world = app.world_mut();
        let path = matching_paths(world, self.pipe, Side::Left)
            .first()
            .copied()
            .expect("path on the intake face");
        assert!(insert_into_pipe(
            world,
            self.item,
            self.pipe,
            Side::Left,
            path,
            DEFAULT_INSERT_SPEED
        ));
    }

    fn run_until_delivered(&self) {
        let mut app = lock_app(&self.app);
        let ticks = DELIVERY_BOUND.as_millis() / TICK.as_millis();
        for _ in 0..ticks {
            app.update();
            if app.world().get::<Stored>(self.item).is_some() {
                return;
            }
        }
    }

    fn assert_stored(&self) {
        let app = lock_app(&self.app);
        let world = app.world();
        let container = world
            .get::<ItemContainer>(self.container)
            .expect("container component");
        assert_eq!(container.slots, vec![self.item]);
        assert_eq!(
            world.get::<Stored>(self.item),
            Some(&Stored {
                container: self.container
            })
        );
    }

    fn assert_out_of_network(&self) {
        let app = lock_app(&self.app);
        let world = app.world();
        assert!(world.get::<PathFollower>(self.item).is_none());
        assert!(!is_loose(world, self.item));
    }
}

#[test]
fn inserted_item_reaches_the_container() {
    run_serial(&rspec::given(
        "an intake, a pipe and a container in a row",
        DeliveryFixture::bootstrap(),
        |ctx| {
            ctx.when("an item is inserted through the intake face", |ctx| {
                ctx.before_all(|fixture| {
                    fixture.insert();
                    fixture.run_until_delivered();
                });
                ctx.then("the container holds it within three seconds", |fixture| {
                    fixture.assert_stored();
                });
                ctx.then("it no longer travels or rolls around", |fixture| {
                    fixture.assert_out_of_network();
                });
            });
        },
    ));
}

#[test]
fn intake_captures_a_loose_item_and_delivers_it() {
    run_serial(&rspec::given(
        "an intake, a pipe and a container in a row",
        DeliveryFixture::bootstrap(),
        |ctx| {
            ctx.when("a loose item lies within the intake's reach", |ctx| {
                ctx.before_all(|fixture| {
                    fixture.run_until_delivered();
                });
                ctx.then("the intake feeds it through to the container", |fixture| {
                    fixture.assert_stored();
                });
                ctx.then("it no longer travels or rolls around", |fixture| {
                    fixture.assert_out_of_network();
                });
            });
        },
    ));
}
