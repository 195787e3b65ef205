//! Bevy plugin wiring the pipe network into the schedule.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::error;

use crate::connectivity::PipeFamilies;
use crate::container::accept_piped_item;
use crate::error::PipeNetworkError;
use crate::geometry::PathRegistry;
use crate::intake::{suction_system, PipeRng};
use crate::junction::DefaultJunctionPolicy;
use crate::motion::{pipe_motion_system, PipeSettings};
use crate::world_handle::BlockGrid;

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_pipe_error(event: On<PipeNetworkError>) {
    let PipeNetworkError { context, detail } = event.event();
    error!("pipe network error during {context:?}: {detail}");
}

/// Inserts every resource the pipe network needs, keeping any already
/// present.
///
/// The basic pipe family is registered when no family table exists yet.
/// [`PipeRng`] is seeded from [`PipeSettings::rng_seed`].
pub fn init_pipe_world(world: &mut World) {
    let settings = *world.get_resource_or_init::<PipeSettings>();
    world.init_resource::<PathRegistry>();
    if !world.contains_resource::<PipeFamilies>() {
        let families = {
            let mut paths = world.resource_mut::<PathRegistry>();
            PipeFamilies::with_basic(&mut paths)
        };
        world.insert_resource(families);
    }
    world.init_resource::<BlockGrid>();
    world.init_resource::<DefaultJunctionPolicy>();
    if !world.contains_resource::<PipeRng>() {
        world.insert_resource(PipeRng::seeded(settings.rng_seed));
    }
}

/// Plugin running intakes and item motion every update.
///
/// Insert a [`PipeSettings`] resource before adding the plugin to override
/// the defaults.
#[derive(Default)]
pub struct PipePlugin;

impl Plugin for PipePlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(log_pipe_error);
        app.add_observer(accept_piped_item);
        init_pipe_world(app.world_mut());
        app.add_systems(Update, (suction_system, pipe_motion_system).chain());
    }
}
