//! Block faces and six-bit connection masks.
//!
//! Bit `i` of a [`ConnectionMask`] corresponds to [`Side::ALL`]`[i]`. The
//! numeric value of a mask doubles as the identifier of a pipe block variant,
//! so the bit layout is stable.

use std::fmt;

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// One of the six faces of a voxel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Side {
    /// `+Y`.
    Top,
    /// `-Y`.
    Bottom,
    /// `-X`.
    Left,
    /// `+X`.
    Right,
    /// `-Z`.
    Front,
    /// `+Z`.
    Back,
}

impl Side {
    /// Every side in bit order.
    pub const ALL: [Self; 6] = [
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
        Self::Front,
        Self::Back,
    ];

    /// Unit offset from a block to its neighbour on this side.
    #[must_use]
    pub const fn offset(self) -> IVec3 {
        match self {
            Self::Top => IVec3::Y,
            Self::Bottom => IVec3::NEG_Y,
            Self::Left => IVec3::NEG_X,
            Self::Right => IVec3::X,
            Self::Front => IVec3::NEG_Z,
            Self::Back => IVec3::Z,
        }
    }

    /// The side facing the opposite way.
    ///
    /// # Examples
    ///
    /// ```
    /// use pipeworks::Side;
    /// assert_eq!(Side::Left.reverse(), Side::Right);
    /// assert_eq!(Side::Top.reverse().reverse(), Side::Top);
    /// ```
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }

    /// Mask bit assigned to this side.
    #[must_use]
    pub const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Exact inverse of [`Side::offset`].
    #[must_use]
    pub fn from_offset(offset: IVec3) -> Option<Self> {
        Self::ALL.into_iter().find(|side| side.offset() == offset)
    }

    /// The side whose axis dominates `direction`.
    ///
    /// Ties resolve towards `Y`, then `X`, then `Z`. The zero vector maps to
    /// [`Side::Top`].
    ///
    /// # Examples
    ///
    /// ```
    /// use glam::Vec3;
    /// use pipeworks::Side;
    /// assert_eq!(Side::in_direction(Vec3::new(-0.9, 0.2, 0.1)), Side::Left);
    /// assert_eq!(Side::in_direction(Vec3::new(0.0, 0.0, 2.0)), Side::Back);
    /// ```
    #[must_use]
    pub fn in_direction(direction: Vec3) -> Self {
        let abs = direction.abs();
        if abs.y >= abs.x && abs.y >= abs.z {
            if direction.y < 0.0 {
                Self::Bottom
            } else {
                Self::Top
            }
        } else if abs.x >= abs.z {
            if direction.x < 0.0 {
                Self::Left
            } else {
                Self::Right
            }
        } else if direction.z < 0.0 {
            Self::Front
        } else {
            Self::Back
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::Front => "front",
            Self::Back => "back",
        };
        f.write_str(name)
    }
}

/// Set of sides packed into six bits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ConnectionMask(u8);

impl ConnectionMask {
    /// No sides.
    pub const EMPTY: Self = Self(0);
    /// All six sides.
    pub const ALL: Self = Self(0b11_1111);

    /// Wraps a raw value, rejecting anything above six bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use pipeworks::ConnectionMask;
    /// assert!(ConnectionMask::new(63).is_some());
    /// assert!(ConnectionMask::new(64).is_none());
    /// ```
    #[must_use]
    pub const fn new(bits: u8) -> Option<Self> {
        if bits > Self::ALL.0 {
            None
        } else {
            Some(Self(bits))
        }
    }

    /// Raw mask value in `0..=63`.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether `side` is part of the set.
    #[must_use]
    pub const fn contains(self, side: Side) -> bool {
        self.0 & side.bit() != 0
    }

    /// Copy of the mask with `side` added.
    #[must_use]
    pub const fn with(self, side: Side) -> Self {
        Self(self.0 | side.bit())
    }

    /// Copy of the mask with `side` removed.
    #[must_use]
    pub const fn without(self, side: Side) -> Self {
        Self(self.0 & !side.bit())
    }

    /// Number of sides in the set.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Whether no side is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Sides in bit order.
    #[must_use]
    pub fn sides(self) -> impl Iterator<Item = Side> {
        Side::ALL.into_iter().filter(move |side| self.contains(*side))
    }

    /// Every mask value from `0` to `63`.
    #[must_use]
    pub fn every() -> impl Iterator<Item = Self> {
        (0..=Self::ALL.0).map(Self)
    }
}

impl FromIterator<Side> for ConnectionMask {
    fn from_iter<I: IntoIterator<Item = Side>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Display for ConnectionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
