//! Headless demo: an intake feeds a line of pipes ending in a container.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use clap::Parser;
use log::info;
use pipeworks::items::spawn_loose_item;
use pipeworks::{
    init_logging, place_block, BlockKind, ItemContainer, ItemTemplate, PipePlugin, PipeSettings,
    Stored, Suction, VelocityFloor,
};

/// Runs items through a straight pipe line into a container
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// Number of simulation ticks to run
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Number of pipe blocks between intake and container
    #[arg(long, default_value_t = 4)]
    length: i32,
    /// Keep the direction of travel when friction hits the speed floor
    #[arg(long)]
    signed_floor: bool,
    /// Seed for intake routing
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn build_line(world: &mut World, length: i32) -> Result<Entity> {
    place_block(world, IVec3::ZERO, BlockKind::Suction(Suction::default()))
        .context("placing intake")?;
    for x in 1..=length {
        place_block(world, IVec3::new(x, 0, 0), BlockKind::basic_pipe())
            .with_context(|| format!("placing pipe {x}"))?;
    }
    place_block(
        world,
        IVec3::new(length + 1, 0, 0),
        BlockKind::Container(ItemContainer::with_capacity(8)),
    )
    .context("placing container")
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    if args.length < 1 {
        bail!("the line needs at least one pipe");
    }

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)));
    app.insert_resource(PipeSettings {
        velocity_floor: if args.signed_floor {
            VelocityFloor::SignPreserving
        } else {
            VelocityFloor::Unsigned
        },
        rng_seed: args.seed,
        ..PipeSettings::default()
    });
    app.add_plugins(PipePlugin);

    let container = build_line(app.world_mut(), args.length)?;
    let item = spawn_loose_item(
        app.world_mut(),
        Vec3::new(0.0, 0.5, 0.0),
        ItemTemplate::default(),
    );
    info!("spawned item {item} next to the intake");

    for tick in 0..args.ticks {
        app.update();
        if app.world().get::<Stored>(item).is_some() {
            info!("item {item} reached container {container} after {tick} ticks");
            return Ok(());
        }
    }
    bail!("item {item} did not arrive within {} ticks", args.ticks)
}
