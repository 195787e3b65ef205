//! Error types surfaced by the pipe network.
//!
//! Only configuration problems are errors. Routing failures degrade to an
//! item leaving the network and are never reported through these types.

use bevy::prelude::*;
use glam::IVec3;
use thiserror::Error;

use crate::side::ConnectionMask;

/// Reasons a block could not be placed or updated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// The family has no variant for the computed connection mask.
    #[error("family `{family}` has no variant for connection mask {mask}")]
    NoVariant {
        /// Family name.
        family: String,
        /// Mask without a registered variant.
        mask: ConnectionMask,
    },
    /// The requested pipe family is not registered.
    #[error("unknown pipe family `{0}`")]
    UnknownFamily(String),
    /// Another block already occupies the position.
    #[error("position {0} is already occupied")]
    Occupied(IVec3),
    /// The position lies outside the loaded region.
    #[error("position {0} is not loaded")]
    NotLoaded(IVec3),
}

/// Where a [`PipeNetworkError`] was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeNetworkErrorContext {
    /// While choosing the variant of a newly placed block.
    Placement,
    /// While refreshing a block after a neighbour changed.
    NeighbourUpdate,
}

/// Event raised when the network hits a configuration error.
///
/// The plugin logs these through an observer; the offending block keeps its
/// previous variant.
#[derive(Event, Debug, Clone, Error)]
#[error("{context:?}: {detail}")]
pub struct PipeNetworkError {
    /// Where the failure occurred.
    pub context: PipeNetworkErrorContext,
    /// Description of the underlying error.
    pub detail: String,
}

impl PipeNetworkError {
    /// Convenience constructor used by systems to emit error events.
    #[must_use]
    pub fn new(context: PipeNetworkErrorContext, detail: impl Into<String>) -> Self {
        Self {
            context,
            detail: detail.into(),
        }
    }
}
