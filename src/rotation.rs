//! Axis-aligned block orientations.
//!
//! A [`Rotation`] records where the local `+X`, `+Y` and `+Z` axes land in
//! world space. Only the 24 proper rotations of the cube are representable,
//! so rotating integer offsets stays exact.

use glam::{IVec3, Mat3, Quat, Vec3};

use crate::side::{ConnectionMask, Side};

/// One of the 24 orientations of a cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rotation {
    x: Side,
    y: Side,
    z: Side,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotation {
    /// Leaves every axis in place.
    pub const IDENTITY: Self = Self {
        x: Side::Right,
        y: Side::Top,
        z: Side::Back,
    };

    /// Builds the rotation mapping local `+X` to `x` and local `+Y` to `y`.
    ///
    /// Returns `None` when the two sides are not perpendicular.
    #[must_use]
    pub fn from_axes(x: Side, y: Side) -> Option<Self> {
        let z = Side::from_offset(x.offset().cross(y.offset()))?;
        Some(Self { x, y, z })
    }

    /// All 24 orientations, starting with [`Rotation::IDENTITY`].
    #[must_use]
    pub fn all() -> Vec<Self> {
        let mut rotations = vec![Self::IDENTITY];
        for x in Side::ALL {
            for y in Side::ALL {
                if let Some(rotation) = Self::from_axes(x, y) {
                    if rotation != Self::IDENTITY {
                        rotations.push(rotation);
                    }
                }
            }
        }
        rotations
    }

    /// Rotates an integer offset.
    #[must_use]
    pub fn rotate_offset(self, offset: IVec3) -> IVec3 {
        self.x.offset() * offset.x + self.y.offset() * offset.y + self.z.offset() * offset.z
    }

    /// Rotates a world-space vector.
    #[must_use]
    pub fn rotate_vec3(self, vector: Vec3) -> Vec3 {
        self.matrix() * vector
    }

    /// Rotates a face of the block.
    ///
    /// # Examples
    ///
    /// ```
    /// use pipeworks::{Rotation, Side};
    /// let quarter = Rotation::from_axes(Side::Back, Side::Top).unwrap();
    /// assert_eq!(quarter.rotate_side(Side::Right), Side::Back);
    /// assert_eq!(quarter.rotate_side(Side::Top), Side::Top);
    /// ```
    #[must_use]
    pub fn rotate_side(self, side: Side) -> Side {
        Side::in_direction(self.rotate_offset(side.offset()).as_vec3())
    }

    /// Rotates every side contained in `mask`.
    #[must_use]
    pub fn rotate_mask(self, mask: ConnectionMask) -> ConnectionMask {
        mask.sides().map(|side| self.rotate_side(side)).collect()
    }

    /// Column matrix with the rotated axes as columns.
    #[must_use]
    pub fn matrix(self) -> Mat3 {
        Mat3::from_cols(
            self.x.offset().as_vec3(),
            self.y.offset().as_vec3(),
            self.z.offset().as_vec3(),
        )
    }

    /// Quaternion form, for callers that orient meshes or transforms.
    #[must_use]
    pub fn quat(self) -> Quat {
        Quat::from_mat3(&self.matrix())
    }
}
