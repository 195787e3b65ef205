//! Path-follow primitive: moves a [`SegmentPosition`] along its segment.
//!
//! Crossing an endpoint hands control to a [`SegmentMapping`], which decides
//! the segment the item continues on. Overshoot carries over, so a fast item
//! may cross several short segments in one call.

use bevy::prelude::*;
use log::trace;

use crate::components::{block_frame, SegmentPosition, TravelSign};
use crate::constants::MAX_SEGMENT_HOPS;
use crate::geometry::{PathId, PathRegistry, PathTemplate, SegmentEnd};
use crate::rotation::Rotation;
use std::sync::Arc;

/// Segment an item continues on after crossing a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingResult {
    /// Template of the next segment.
    pub path: PathId,
    /// Block owning the next segment.
    pub entity: Entity,
    /// Direction of travel on the next segment.
    pub sign: TravelSign,
}

/// Boundary resolver consulted whenever an item reaches a segment end.
pub trait SegmentMapping {
    /// Returns the continuation past `end` of `position`'s segment, or `None`
    /// when the item cannot continue.
    fn next_segment(
        &mut self,
        world: &mut World,
        position: &SegmentPosition,
        end: SegmentEnd,
    ) -> Option<MappingResult>;
}

/// Looks up a template in the world's [`PathRegistry`].
#[must_use]
pub fn path_template(world: &World, path: PathId) -> Option<Arc<PathTemplate>> {
    world.get_resource::<PathRegistry>()?.get(path)
}

/// Moves `position` by `distance` along its segment.
///
/// Positive distances travel in the direction of `position.sign`, negative
/// ones against it. Returns `false` when an endpoint was reached and the
/// mapping offered no continuation; `position` is then left on that
/// endpoint.
///
/// At most [`MAX_SEGMENT_HOPS`] boundaries are crossed per call, which caps
/// how many segments an item covers in one tick. Distance left over after
/// the last crossing is discarded and `position` rests at the entry of the
/// segment it joined last.
pub fn advance(
    world: &mut World,
    position: &mut SegmentPosition,
    distance: f32,
    mapping: &mut dyn SegmentMapping,
) -> bool {
    let mut remaining = distance;
    for _ in 0..MAX_SEGMENT_HOPS {
        let Some(template) = path_template(world, position.path) else {
            return false;
        };
        let max = template.segment().max_distance();
        let target = position.distance + position.sign.value() * remaining;
        if (0.0..=max).contains(&target) {
            position.distance = target;
            return true;
        }

        let (end, overshoot) = if target > max {
            (SegmentEnd::End, target - max)
        } else {
            (SegmentEnd::Start, -target)
        };
        position.distance = match end {
            SegmentEnd::Start => 0.0,
            SegmentEnd::End => max,
        };
        let Some(next) = mapping.next_segment(world, position, end) else {
            return false;
        };
        let Some(next_template) = path_template(world, next.path) else {
            return false;
        };
        trace!(
            "crossing from {:?} on {} to {:?} on {}",
            position.path,
            position.pipe,
            next.path,
            next.entity
        );

        let backwards = remaining < 0.0;
        position.rotation =
            block_frame(world, next.entity).map_or(Rotation::IDENTITY, |frame| frame.rotation);
        position.pipe = next.entity;
        position.path = next.path;
        position.sign = if backwards { next.sign.reversed() } else { next.sign };
        position.distance = match next.sign {
            TravelSign::Forward => 0.0,
            TravelSign::Reverse => next_template.segment().max_distance(),
        };
        remaining = if backwards { -overshoot } else { overshoot };
    }
    trace!(
        "hop limit reached on {}, discarding {} of travel",
        position.pipe,
        remaining.abs()
    );
    true
}

/// World-space point of `position`, or `None` when its pipe or template is
/// gone.
#[must_use]
pub fn follower_point(world: &World, position: &SegmentPosition) -> Option<Vec3> {
    let frame = block_frame(world, position.pipe)?;
    let template = path_template(world, position.path)?;
    Some(frame.to_world(template.segment().point(position.distance)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::BlockPosition;
    use crate::side::Side;
    use approx::assert_relative_eq;
    use rstest::rstest;

    /// Continues straight onto the same template in the next block along `+X`.
    struct StraightAhead {
        path: PathId,
        blocks: Vec<Entity>,
        calls: usize,
    }

    impl SegmentMapping for StraightAhead {
        fn next_segment(
            &mut self,
            _world: &mut World,
            position: &SegmentPosition,
            end: SegmentEnd,
        ) -> Option<MappingResult> {
            self.calls += 1;
            let index = self.blocks.iter().position(|entity| *entity == position.pipe)?;
            let next = match end {
                SegmentEnd::End => self.blocks.get(index + 1)?,
                SegmentEnd::Start => self.blocks.get(index.checked_sub(1)?)?,
            };
            Some(MappingResult {
                path: self.path,
                entity: *next,
                sign: match end {
                    SegmentEnd::End => TravelSign::Forward,
                    SegmentEnd::Start => TravelSign::Reverse,
                },
            })
        }
    }

    fn line_world(length: i32) -> (World, StraightAhead) {
        let mut world = World::new();
        let mut paths = PathRegistry::default();
        let path = paths.intern(Side::Left, Side::Right);
        world.insert_resource(paths);
        let blocks = (0..length)
            .map(|x| world.spawn(BlockPosition(IVec3::new(x, 0, 0))).id())
            .collect();
        (world, StraightAhead { path, blocks, calls: 0 })
    }

    fn start_of(mapping: &StraightAhead) -> SegmentPosition {
        SegmentPosition {
            pipe: mapping.blocks.first().copied().expect("at least one block"),
            path: mapping.path,
            distance: 0.0,
            sign: TravelSign::Forward,
            rotation: Rotation::IDENTITY,
        }
    }

    #[rstest]
    fn short_moves_stay_on_the_segment() {
        let (mut world, mut mapping) = line_world(1);
        let mut position = start_of(&mapping);
        assert!(advance(&mut world, &mut position, 0.25, &mut mapping));
        assert_relative_eq!(position.distance, 0.25);
        assert_eq!(mapping.calls, 0);
        let point = follower_point(&world, &position).expect("point");
        assert!(point.abs_diff_eq(Vec3::new(-0.25, 0.0, 0.0), 1e-6));
    }

    #[rstest]
    fn overshoot_carries_across_several_blocks() {
        let (mut world, mut mapping) = line_world(4);
        let mut position = start_of(&mapping);
        assert!(advance(&mut world, &mut position, 2.5, &mut mapping));
        assert_eq!(mapping.calls, 2);
        assert_eq!(Some(&position.pipe), mapping.blocks.get(2));
        assert_relative_eq!(position.distance, 0.5);
        let point = follower_point(&world, &position).expect("point");
        assert!(point.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
    }

    #[rstest]
    fn missing_continuation_stops_on_the_endpoint() {
        let (mut world, mut mapping) = line_world(2);
        let mut position = start_of(&mapping);
        assert!(!advance(&mut world, &mut position, 5.0, &mut mapping));
        assert_eq!(Some(&position.pipe), mapping.blocks.get(1));
        assert_relative_eq!(position.distance, 1.0);
    }

    #[rstest]
    fn fast_items_stop_at_the_hop_limit() {
        let length = i32::try_from(MAX_SEGMENT_HOPS).expect("small hop limit") + 4;
        let (mut world, mut mapping) = line_world(length);
        let mut position = start_of(&mapping);
        assert!(advance(&mut world, &mut position, 100.0, &mut mapping));
        assert_eq!(mapping.calls, MAX_SEGMENT_HOPS);
        assert_eq!(Some(&position.pipe), mapping.blocks.get(MAX_SEGMENT_HOPS));
        assert_relative_eq!(position.distance, 0.0);
    }

    #[rstest]
    fn negative_distances_travel_against_the_sign() {
        let (mut world, mut mapping) = line_world(3);
        let mut position = SegmentPosition {
            pipe: mapping.blocks.get(2).copied().expect("third block"),
            path: mapping.path,
            distance: 0.5,
            sign: TravelSign::Forward,
            rotation: Rotation::IDENTITY,
        };
        assert!(advance(&mut world, &mut position, -1.0, &mut mapping));
        assert_eq!(Some(&position.pipe), mapping.blocks.get(1));
        assert_eq!(position.sign, TravelSign::Forward);
        assert_relative_eq!(position.distance, 0.5);
    }
}
