//! Pipe network tuning constants shared across systems.
//!
//! Runtime overrides live in [`crate::PipeSettings`]; these values are the
//! defaults it starts from.

use std::time::Duration;

/// Smallest speed an item keeps while travelling through a pipe.
pub const MIN_PIPE_VELOCITY: f32 = 0.5;
/// Velocity lost per second by an item inside a default pipe.
pub const DEFAULT_PIPE_FRICTION: f32 = 0.1;
/// Speed given to items inserted by intakes.
pub const DEFAULT_INSERT_SPEED: f32 = 1.0;
/// Distance from an intake's centre inside which a loose item is captured.
pub const SUCTION_REACH: f32 = 1.0;
/// Magnitude of the pull applied to loose items near an intake.
pub const SUCTION_IMPULSE: f32 = 2.0;
/// Radius inside which an intake notices loose items.
pub const DEFAULT_SUCTION_RANGE: f32 = 3.0;
/// Cool-down between two captures of the same intake.
pub const DEFAULT_SUCTION_DELAY: Duration = Duration::from_millis(500);
/// Distance under which two segment endpoints are considered coincident.
pub const ENDPOINT_EPSILON: f32 = 1e-3;
/// Minimum cosine between the leaving and entering tangents at a joint.
pub const TANGENT_TOLERANCE: f32 = 0.99;
/// Upper bound on boundary crossings resolved during a single advance.
pub const MAX_SEGMENT_HOPS: usize = 16;
/// Number of samples in a curved segment's arc-length table.
pub const CURVE_SAMPLES: usize = 32;
