#![cfg_attr(docsrs, feature(doc_cfg))]
//! Item pipe networks for voxel worlds.
//!
//! Pipe blocks pick a variant from the six-bit mask of their pipe-capable
//! neighbours. Items inserted into a pipe follow its declared paths,
//! crossing into neighbouring blocks by matching segment endpoints, slow
//! down under friction and drop back into free physics when they cannot
//! continue.
pub mod components;
pub mod connectivity;
pub mod constants;
pub mod container;
pub mod error;
pub mod follower;
pub mod geometry;
pub mod intake;
pub mod items;
pub mod junction;
pub mod logging;
pub mod mapper;
pub mod motion;
pub mod network;
pub mod plugin;
pub mod rotation;
pub mod side;
pub mod world_handle;
pub use constants::*;

// Re-export commonly used items
pub use components::{
    BlockPosition, PathDescriptor, PathFollower, Pipe, PipeBlock, PipeConnection, PipeFollowing,
    SegmentPosition, TravelSign,
};
pub use connectivity::{PipeFamilies, PipeFamily, PipeShape, PipeVariant, BASIC_PIPE_FAMILY};
pub use container::ItemContainer;
pub use error::{PipeNetworkError, PipeNetworkErrorContext, PlacementError};
pub use follower::{advance, MappingResult, SegmentMapping};
pub use geometry::{PathId, PathRegistry, Segment, SegmentEnd};
pub use intake::{PipeRng, Suction, SuctionImpulse};
pub use items::{ItemTemplate, Stored};
pub use junction::{
    DefaultJunctionPolicy, FirstCandidate, JunctionChoice, JunctionPolicy, JunctionSelector,
    RandomJunction,
};
pub use logging::init as init_logging;
pub use mapper::PipeSegmentMapper;
pub use motion::{PipeInsert, PipeSettings, VelocityFloor};
pub use network::{drop_item, find_pipes, insert_into_pipe, is_connected, matching_paths};
pub use plugin::{init_pipe_world, PipePlugin};
pub use rotation::Rotation;
pub use side::{ConnectionMask, Side};
pub use world_handle::{place_block, remove_block, BlockGrid, BlockKind};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use pipeworks::prelude::*;
    //! ```

    pub use crate::items::spawn_loose_item;
    pub use crate::network::{drop_item, insert_into_pipe, matching_paths};
    pub use crate::world_handle::{place_block, remove_block, BlockKind};
    pub use crate::{
        ConnectionMask, ItemContainer, ItemTemplate, PipePlugin, PipeSettings, Side, Suction,
        VelocityFloor,
    };
}
