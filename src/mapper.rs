//! Segment mapper: walks items across block boundaries.
//!
//! Nothing here keeps a graph of the network. Every crossing looks at the
//! block beyond the reached endpoint, matches its declared paths against
//! the arriving segment and picks one, so placing or breaking blocks is
//! picked up on the next crossing.

use bevy::prelude::*;
use log::{debug, trace};

use crate::components::{block_frame, PathDescriptor, SegmentPosition, TravelSign};
use crate::follower::{path_template, MappingResult, SegmentMapping};
use crate::geometry::{joining_end, PathId, SegmentEnd};
use crate::junction::{select_side, JunctionChoice};
use crate::side::Side;
use crate::world_handle::BlockGrid;

/// A continuation offered by a neighbouring block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Face of the junction the continuation leaves through.
    pub outward: Side,
    /// Declared path carrying the continuation.
    pub path: PathId,
    /// Direction of travel on that path.
    pub sign: TravelSign,
}

/// Boundary resolver backed by live world queries.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipeSegmentMapper;

impl PipeSegmentMapper {
    /// Block beyond `end` of `position`'s segment, with the face the item
    /// enters it through.
    #[must_use]
    pub fn neighbour_across(
        world: &World,
        position: &SegmentPosition,
        end: SegmentEnd,
    ) -> Option<(Entity, Side)> {
        let frame = block_frame(world, position.pipe)?;
        let template = path_template(world, position.path)?;
        let exit = frame.rotation.rotate_side(template.face(end));
        let neighbour = world
            .get_resource::<BlockGrid>()?
            .entity_at(frame.position + exit.offset())?;
        Some((neighbour, exit.reverse()))
    }

    /// Paths of `junction` that continue `position`'s segment past `end`.
    ///
    /// Candidates follow the junction's declaration order; a second path
    /// leaving through an outward side already listed is dropped.
    #[must_use]
    pub fn candidates(
        world: &World,
        position: &SegmentPosition,
        end: SegmentEnd,
        junction: Entity,
    ) -> Vec<Candidate> {
        let (Some(current_frame), Some(current)) = (
            block_frame(world, position.pipe),
            path_template(world, position.path),
        ) else {
            return Vec::new();
        };
        let (Some(junction_frame), Some(descriptor)) = (
            block_frame(world, junction),
            world.get::<PathDescriptor>(junction),
        ) else {
            return Vec::new();
        };

        let mut found: Vec<Candidate> = Vec::new();
        for path in &descriptor.paths {
            let Some(template) = path_template(world, *path) else {
                continue;
            };
            let Some(entry) = joining_end(
                current.segment(),
                current_frame,
                end,
                template.segment(),
                junction_frame,
            ) else {
                continue;
            };
            let (exit, sign) = match entry {
                SegmentEnd::Start => (SegmentEnd::End, TravelSign::Forward),
                SegmentEnd::End => (SegmentEnd::Start, TravelSign::Reverse),
            };
            let outward = junction_frame.rotation.rotate_side(template.face(exit));
            if found.iter().any(|candidate| candidate.outward == outward) {
                continue;
            }
            found.push(Candidate {
                outward,
                path: *path,
                sign,
            });
        }
        found
    }
}

impl SegmentMapping for PipeSegmentMapper {
    fn next_segment(
        &mut self,
        world: &mut World,
        position: &SegmentPosition,
        end: SegmentEnd,
    ) -> Option<MappingResult> {
        let (junction, arrival) = Self::neighbour_across(world, position, end)?;
        let candidates = Self::candidates(world, position, end, junction);
        let chosen = match candidates.as_slice() {
            [] => {
                trace!("no continuation into {junction} through {arrival}");
                return None;
            }
            [only] => *only,
            _ => {
                let choice = JunctionChoice {
                    junction,
                    from: position.pipe,
                    arrival,
                    sides: candidates.iter().map(|candidate| candidate.outward).collect(),
                };
                let side = select_side(world, choice)?;
                let Some(picked) = candidates.iter().find(|candidate| candidate.outward == side)
                else {
                    debug!("junction {junction} selected {side}, which it does not offer");
                    return None;
                };
                debug!("junction {junction} routes item towards {side}");
                *picked
            }
        };
        Some(MappingResult {
            path: chosen.path,
            entity: junction,
            sign: chosen.sign,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::junction::{JunctionSelector, MockJunctionPolicy};
    use crate::world_handle::{place_block, BlockKind};
    use crate::init_pipe_world;
    use rstest::{fixture, rstest};

    #[fixture]
    fn world() -> World {
        let mut world = World::new();
        init_pipe_world(&mut world);
        world
    }

    fn place(world: &mut World, position: IVec3) -> Entity {
        place_block(world, position, BlockKind::basic_pipe()).expect("pipe placed")
    }

    /// Position on the first declared path of `pipe` heading through the
    /// face `towards`.
    fn heading(world: &World, pipe: Entity, towards: Side) -> (SegmentPosition, SegmentEnd) {
        let rotation = world
            .get::<crate::components::PipeBlock>(pipe)
            .expect("pipe variant")
            .rotation;
        let descriptor = world.get::<PathDescriptor>(pipe).expect("paths");
        for path in &descriptor.paths {
            let template = path_template(world, *path).expect("template");
            for end in [SegmentEnd::Start, SegmentEnd::End] {
                if rotation.rotate_side(template.face(end)) == towards {
                    let position = SegmentPosition {
                        pipe,
                        path: *path,
                        distance: 0.0,
                        sign: TravelSign::Forward,
                        rotation,
                    };
                    return (position, end);
                }
            }
        }
        panic!("no path of {pipe} reaches {towards}");
    }

    #[rstest]
    fn straight_line_resolves_to_the_single_neighbour(mut world: World) {
        let west = place(&mut world, IVec3::ZERO);
        let east = place(&mut world, IVec3::X);
        let (position, end) = heading(&world, west, Side::Right);
        for _ in 0..4 {
            let next = PipeSegmentMapper
                .next_segment(&mut world, &position, end)
                .expect("continuation");
            assert_eq!(next.entity, east);
            let template = path_template(&world, next.path).expect("template");
            let rotation = world
                .get::<crate::components::PipeBlock>(east)
                .expect("variant")
                .rotation;
            let entry = match next.sign {
                TravelSign::Forward => SegmentEnd::Start,
                TravelSign::Reverse => SegmentEnd::End,
            };
            assert_eq!(rotation.rotate_side(template.face(entry)), Side::Left);
        }
    }

    #[rstest]
    fn missing_neighbours_fail_resolution(mut world: World) {
        let lone = place(&mut world, IVec3::ZERO);
        let (position, end) = heading(&world, lone, Side::Right);
        assert!(PipeSegmentMapper.next_segment(&mut world, &position, end).is_none());
    }

    #[rstest]
    fn blocks_without_paths_fail_resolution(mut world: World) {
        let pipe = place(&mut world, IVec3::ZERO);
        place_block(&mut world, IVec3::X, BlockKind::Solid).expect("solid placed");
        let (position, end) = heading(&world, pipe, Side::Right);
        assert!(PipeSegmentMapper.next_segment(&mut world, &position, end).is_none());
    }

    #[rstest]
    fn tee_junctions_list_each_outward_side_once(mut world: World) {
        let feeder = place(&mut world, IVec3::NEG_X);
        let junction = place(&mut world, IVec3::ZERO);
        place(&mut world, IVec3::X);
        place(&mut world, IVec3::Y);
        let (position, end) = heading(&world, feeder, Side::Right);
        let candidates = PipeSegmentMapper::candidates(&world, &position, end, junction);
        let mut sides: Vec<Side> = candidates.iter().map(|c| c.outward).collect();
        sides.sort();
        assert_eq!(sides, vec![Side::Top, Side::Right]);
    }

    #[rstest]
    fn junction_policy_decides_between_candidates(mut world: World) {
        let feeder = place(&mut world, IVec3::NEG_X);
        let junction = place(&mut world, IVec3::ZERO);
        place(&mut world, IVec3::X);
        let riser = place(&mut world, IVec3::Y);

        let mut policy = MockJunctionPolicy::new();
        policy
            .expect_select()
            .withf(|choice| choice.arrival == Side::Left && choice.sides.len() == 2)
            .times(1)
            .returning(|_| Some(Side::Top));
        world
            .entity_mut(junction)
            .insert(JunctionSelector::new(policy));

        let (position, end) = heading(&world, feeder, Side::Right);
        let next = PipeSegmentMapper
            .next_segment(&mut world, &position, end)
            .expect("continuation");
        assert_eq!(next.entity, junction);
        let candidates = PipeSegmentMapper::candidates(&world, &position, end, junction);
        let upward = candidates
            .iter()
            .find(|candidate| candidate.outward == Side::Top)
            .expect("upward candidate");
        assert_eq!(next.path, upward.path);
        assert_ne!(next.entity, riser);
    }

    #[rstest]
    fn unoffered_selection_fails_resolution(mut world: World) {
        let feeder = place(&mut world, IVec3::NEG_X);
        let junction = place(&mut world, IVec3::ZERO);
        place(&mut world, IVec3::X);
        place(&mut world, IVec3::Y);
        let mut policy = MockJunctionPolicy::new();
        policy.expect_select().returning(|_| Some(Side::Bottom));
        world
            .entity_mut(junction)
            .insert(JunctionSelector::new(policy));
        let (position, end) = heading(&world, feeder, Side::Right);
        assert!(PipeSegmentMapper.next_segment(&mut world, &position, end).is_none());
    }
}
