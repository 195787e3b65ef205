//! ECS components describing blocks and their pipe capabilities.
//!
//! Capabilities are plain components: a block is a pipe when it carries
//! [`Pipe`], accepts connections when it carries [`PipeConnection`], and
//! declares traversable paths through [`PathDescriptor`].
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PIPE_FRICTION;
use crate::geometry::{BlockFrame, PathId, SegmentEnd};
use crate::rotation::Rotation;
use crate::side::ConnectionMask;

/// Grid position of a placed block.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Deref)]
pub struct BlockPosition(pub IVec3);

/// Pipe capability: items may travel through this block.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Pipe {
    /// Velocity lost per second by items inside this pipe.
    pub friction: f32,
}

impl Default for Pipe {
    fn default() -> Self {
        Self {
            friction: DEFAULT_PIPE_FRICTION,
        }
    }
}

/// Marks blocks pipes may connect to without being pipes themselves, such as
/// containers and intakes. Items leaving a pipe into such a block are offered
/// to it through [`crate::PipeInsert`].
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipeConnection;

/// Identity of a [`crate::PipeFamily`] inside [`crate::PipeFamilies`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FamilyId(pub(crate) usize);

/// Concrete variant a pipe block currently uses.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeBlock {
    /// Family the variant belongs to.
    pub family: FamilyId,
    /// Faces currently joined to pipe-capable neighbours.
    pub mask: ConnectionMask,
    /// Rotation applied to the variant's canonical paths.
    pub rotation: Rotation,
}

/// Paths declared by a block, in its local unrotated frame.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct PathDescriptor {
    /// Declared templates in declaration order.
    pub paths: Vec<PathId>,
}

impl PathDescriptor {
    /// Whether `path` is one of the declared templates.
    #[must_use]
    pub fn declares(&self, path: PathId) -> bool {
        self.paths.contains(&path)
    }
}

/// Direction of travel along a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TravelSign {
    /// Towards the segment's maximum distance.
    Forward,
    /// Towards distance zero.
    Reverse,
}

impl TravelSign {
    /// `+1.0` or `-1.0`.
    #[must_use]
    pub const fn value(self) -> f32 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    /// End reached when moving this way for a distance of sign `distance`.
    #[must_use]
    pub fn heading(self, distance: f32) -> SegmentEnd {
        if self.value() * distance < 0.0 {
            SegmentEnd::Start
        } else {
            SegmentEnd::End
        }
    }
}

/// Where on the network an item currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPosition {
    /// Pipe block owning the current segment.
    pub pipe: Entity,
    /// Template the segment was built from.
    pub path: PathId,
    /// Distance travelled from the segment's start.
    pub distance: f32,
    /// Direction of travel for positive velocities.
    pub sign: TravelSign,
    /// Rotation `pipe` had when the item joined the segment. A block that
    /// changes variant under an item no longer matches it.
    pub rotation: Rotation,
}

/// Captured, kinematic state of an item following a path.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PathFollower {
    /// Current position on the network.
    pub position: SegmentPosition,
}

/// Speed state of an item inside the network.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PipeFollowing {
    /// Signed speed in blocks per second.
    pub velocity: f32,
}

/// Resolves the frame of a block, using the identity rotation for blocks
/// without a pipe variant.
#[must_use]
pub fn block_frame(world: &World, entity: Entity) -> Option<BlockFrame> {
    let position = world.get::<BlockPosition>(entity)?;
    let rotation = world
        .get::<PipeBlock>(entity)
        .map_or(Rotation::IDENTITY, |block| block.rotation);
    Some(BlockFrame {
        position: position.0,
        rotation,
    })
}
