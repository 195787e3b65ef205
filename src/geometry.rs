//! Segment geometry and the shared path template cache.
//!
//! A [`PathTemplate`] names the two faces a path connects in a block's
//! local, unrotated frame. Its [`Segment`] (the curve items actually travel
//! along) is computed the first time anyone asks for it and never changes
//! afterwards, so the cache can be read from every system without locking.

use std::sync::Arc;

use bevy::prelude::Resource;
use glam::{IVec3, Vec3};
use hashbrown::HashMap;
use once_cell::sync::OnceCell;

use crate::constants::{CURVE_SAMPLES, ENDPOINT_EPSILON, TANGENT_TOLERANCE};
use crate::rotation::Rotation;
use crate::side::Side;

/// Distance from a block's centre to the centre of any of its faces.
const FACE_DISTANCE: f32 = 0.5;

/// Which end of a segment an item has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentEnd {
    /// Distance zero.
    Start,
    /// The segment's maximum distance.
    End,
}

/// Geometric relation between the joint ends of two segments.
///
/// The first half names the end of the current segment, the second the end
/// of the candidate it meets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentMatch {
    /// Current start meets candidate start.
    StartStart,
    /// Current start meets candidate end.
    StartEnd,
    /// Current end meets candidate start.
    EndStart,
    /// Current end meets candidate end.
    EndEnd,
}

impl SegmentMatch {
    /// End of the current segment involved in the match.
    #[must_use]
    pub const fn current_end(self) -> SegmentEnd {
        match self {
            Self::StartStart | Self::StartEnd => SegmentEnd::Start,
            Self::EndStart | Self::EndEnd => SegmentEnd::End,
        }
    }

    /// End of the candidate segment involved in the match.
    #[must_use]
    pub const fn candidate_end(self) -> SegmentEnd {
        match self {
            Self::StartStart | Self::EndStart => SegmentEnd::Start,
            Self::StartEnd | Self::EndEnd => SegmentEnd::End,
        }
    }
}

/// A quadratic curve with a sampled arc-length table.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSegment {
    start: Vec3,
    control: Vec3,
    end: Vec3,
    /// Cumulative length at evenly spaced parameter values, first entry zero.
    lengths: Vec<f32>,
}

impl CurveSegment {
    fn new(start: Vec3, control: Vec3, end: Vec3) -> Self {
        let mut lengths = Vec::with_capacity(CURVE_SAMPLES + 1);
        let mut total = 0.0;
        let mut previous = start;
        lengths.push(0.0);
        for step in 1..=CURVE_SAMPLES {
            let point = Self::evaluate(start, control, end, step as f32 / CURVE_SAMPLES as f32);
            total += point.distance(previous);
            lengths.push(total);
            previous = point;
        }
        Self {
            start,
            control,
            end,
            lengths,
        }
    }

    fn evaluate(start: Vec3, control: Vec3, end: Vec3, t: f32) -> Vec3 {
        let inverse = 1.0 - t;
        start * inverse * inverse + control * 2.0 * inverse * t + end * t * t
    }

    fn length(&self) -> f32 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Curve parameter at which `distance` has been travelled.
    fn parameter_at(&self, distance: f32) -> f32 {
        let clamped = distance.clamp(0.0, self.length());
        let upper = self
            .lengths
            .iter()
            .position(|length| *length >= clamped)
            .unwrap_or(CURVE_SAMPLES);
        if upper == 0 {
            return 0.0;
        }
        let lower_length = self.lengths.get(upper - 1).copied().unwrap_or(0.0);
        let upper_length = self.lengths.get(upper).copied().unwrap_or(lower_length);
        let span = upper_length - lower_length;
        let fraction = if span > f32::EPSILON {
            (clamped - lower_length) / span
        } else {
            0.0
        };
        ((upper - 1) as f32 + fraction) / CURVE_SAMPLES as f32
    }

    fn point(&self, distance: f32) -> Vec3 {
        Self::evaluate(self.start, self.control, self.end, self.parameter_at(distance))
    }

    fn tangent(&self, distance: f32) -> Vec3 {
        let t = self.parameter_at(distance);
        let derivative = (self.control - self.start) * 2.0 * (1.0 - t) + (self.end - self.control) * 2.0 * t;
        derivative.normalize_or_zero()
    }
}

/// Immutable path an item travels along, in block-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Straight line between two points.
    Line {
        /// Point at distance zero.
        start: Vec3,
        /// Point at the maximum distance.
        end: Vec3,
    },
    /// Bent path through the block.
    Curve(CurveSegment),
}

impl Segment {
    /// Builds the segment joining the centres of two faces.
    ///
    /// Opposite faces yield a line through the centre; perpendicular faces a
    /// curve bending at the centre. A path from a face to itself degenerates
    /// to a zero-length line.
    #[must_use]
    pub fn between(s1: Side, s2: Side) -> Self {
        let start = s1.offset().as_vec3() * FACE_DISTANCE;
        let end = s2.offset().as_vec3() * FACE_DISTANCE;
        if s1 == s2 || s1.reverse() == s2 {
            Self::Line { start, end }
        } else {
            Self::Curve(CurveSegment::new(start, Vec3::ZERO, end))
        }
    }

    /// Total travel distance from start to end.
    #[must_use]
    pub fn max_distance(&self) -> f32 {
        match self {
            Self::Line { start, end } => start.distance(*end),
            Self::Curve(curve) => curve.length(),
        }
    }

    /// Local position after travelling `distance` from the start.
    #[must_use]
    pub fn point(&self, distance: f32) -> Vec3 {
        match self {
            Self::Line { start, end } => {
                let length = start.distance(*end);
                if length <= f32::EPSILON {
                    return *start;
                }
                start.lerp(*end, (distance / length).clamp(0.0, 1.0))
            }
            Self::Curve(curve) => curve.point(distance),
        }
    }

    /// Unit direction of travel from start towards end at `distance`.
    #[must_use]
    pub fn tangent(&self, distance: f32) -> Vec3 {
        match self {
            Self::Line { start, end } => (*end - *start).normalize_or_zero(),
            Self::Curve(curve) => curve.tangent(distance),
        }
    }

    /// Local position of one end.
    #[must_use]
    pub fn endpoint(&self, end: SegmentEnd) -> Vec3 {
        match end {
            SegmentEnd::Start => self.point(0.0),
            SegmentEnd::End => self.point(self.max_distance()),
        }
    }

    /// Direction an item leaves the segment through `end`.
    #[must_use]
    pub fn exit_direction(&self, end: SegmentEnd) -> Vec3 {
        match end {
            SegmentEnd::Start => -self.tangent(0.0),
            SegmentEnd::End => self.tangent(self.max_distance()),
        }
    }
}

/// Block position and orientation a segment is placed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFrame {
    /// Grid position of the owning block.
    pub position: IVec3,
    /// Orientation of the owning block.
    pub rotation: Rotation,
}

impl BlockFrame {
    /// Maps a block-local point into world space.
    #[must_use]
    pub fn to_world(self, local: Vec3) -> Vec3 {
        self.position.as_vec3() + self.rotation.rotate_vec3(local)
    }

    /// Maps a block-local direction into world space.
    #[must_use]
    pub fn direction_to_world(self, local: Vec3) -> Vec3 {
        self.rotation.rotate_vec3(local)
    }
}

/// Classifies how two placed segments meet.
///
/// Two ends match when their world positions coincide and an item leaving
/// the current segment through its end continues smoothly into the
/// candidate. Returns `None` when no pair of ends joins.
#[must_use]
pub fn segment_match(
    current: &Segment,
    current_frame: BlockFrame,
    candidate: &Segment,
    candidate_frame: BlockFrame,
) -> Option<SegmentMatch> {
    [SegmentEnd::Start, SegmentEnd::End]
        .into_iter()
        .find_map(|from| {
            joining_end(current, current_frame, from, candidate, candidate_frame)
                .map(|into| match (from, into) {
                    (SegmentEnd::Start, SegmentEnd::Start) => SegmentMatch::StartStart,
                    (SegmentEnd::Start, SegmentEnd::End) => SegmentMatch::StartEnd,
                    (SegmentEnd::End, SegmentEnd::Start) => SegmentMatch::EndStart,
                    (SegmentEnd::End, SegmentEnd::End) => SegmentMatch::EndEnd,
                })
        })
}

/// End of `candidate` an item leaving `current` through `from` enters by.
#[must_use]
pub fn joining_end(
    current: &Segment,
    current_frame: BlockFrame,
    from: SegmentEnd,
    candidate: &Segment,
    candidate_frame: BlockFrame,
) -> Option<SegmentEnd> {
    let joint = current_frame.to_world(current.endpoint(from));
    let leaving = current_frame.direction_to_world(current.exit_direction(from));
    [SegmentEnd::Start, SegmentEnd::End].into_iter().find(|into| {
        let entry = candidate_frame.to_world(candidate.endpoint(*into));
        if joint.distance(entry) > ENDPOINT_EPSILON {
            return false;
        }
        let entering = -candidate_frame.direction_to_world(candidate.exit_direction(*into));
        leaving.dot(entering) >= TANGENT_TOLERANCE
    })
}

/// Identity of a registered [`PathTemplate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(u32);

impl PathId {
    /// Position of the template in its registry.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Declared path through a block between two faces.
#[derive(Debug)]
pub struct PathTemplate {
    id: PathId,
    s1: Side,
    s2: Side,
    segment: OnceCell<Segment>,
}

impl PathTemplate {
    /// Registry identity.
    #[must_use]
    pub const fn id(&self) -> PathId {
        self.id
    }

    /// Face at distance zero, in the block's local frame.
    #[must_use]
    pub const fn s1(&self) -> Side {
        self.s1
    }

    /// Face at the maximum distance, in the block's local frame.
    #[must_use]
    pub const fn s2(&self) -> Side {
        self.s2
    }

    /// Local face at the given end.
    #[must_use]
    pub const fn face(&self, end: SegmentEnd) -> Side {
        match end {
            SegmentEnd::Start => self.s1,
            SegmentEnd::End => self.s2,
        }
    }

    /// Cached segment geometry, computed on first access.
    #[must_use]
    pub fn segment(&self) -> &Segment {
        self.segment
            .get_or_init(|| Segment::between(self.s1, self.s2))
    }

    /// Whether either end of the path faces `side` once rotated.
    #[must_use]
    pub fn touches(&self, rotation: Rotation, side: Side) -> bool {
        rotation.rotate_side(self.s1) == side || rotation.rotate_side(self.s2) == side
    }
}

/// Arena of path templates keyed by their endpoint faces.
///
/// Templates are interned: declaring the same `(s1, s2)` pair twice returns
/// the same [`PathId`], so every block sharing a path shares its geometry.
#[derive(Resource, Debug, Default)]
pub struct PathRegistry {
    templates: Vec<Arc<PathTemplate>>,
    by_faces: HashMap<(Side, Side), PathId>,
}

impl PathRegistry {
    /// Returns the template joining `s1` to `s2`, registering it if needed.
    pub fn intern(&mut self, s1: Side, s2: Side) -> PathId {
        if let Some(id) = self.by_faces.get(&(s1, s2)) {
            return *id;
        }
        let id = PathId(u32::try_from(self.templates.len()).unwrap_or(u32::MAX));
        self.templates.push(Arc::new(PathTemplate {
            id,
            s1,
            s2,
            segment: OnceCell::new(),
        }));
        self.by_faces.insert((s1, s2), id);
        id
    }

    /// Looks up a template by identity.
    #[must_use]
    pub fn get(&self, id: PathId) -> Option<Arc<PathTemplate>> {
        self.templates.get(id.index()).cloned()
    }

    /// Looks up the template joining `s1` to `s2` without registering it.
    #[must_use]
    pub fn find(&self, s1: Side, s2: Side) -> Option<PathId> {
        self.by_faces.get(&(s1, s2)).copied()
    }

    /// Number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether no template has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
