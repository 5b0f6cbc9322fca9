// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::EPSILON;

/// 3D vector in world (RAS) millimetres.
///
/// * Used both for points (landmark positions, translations) and for
///   directions (basis columns); the calling context decides which.
/// * Use [`crate::Mat4::transform_point`] for points (homogeneous `w = 1`)
///   and [`crate::Mat4::transform_direction`] for directions (`w = 0`).
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "[f64; 3]", into = "[f64; 3]")
)]
pub struct Vec3 {
    data: [f64; 3],
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit vector pointing along the positive X axis.
    pub const UNIT_X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit vector pointing along the positive Y axis.
    pub const UNIT_Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit vector pointing along the positive Z axis.
    pub const UNIT_Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Creates a vector from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { data: [x, y, z] }
    }

    /// Returns the components as an array.
    pub fn to_array(self) -> [f64; 3] {
        self.data
    }

    /// X component.
    pub fn x(&self) -> f64 {
        self.data[0]
    }

    /// Y component.
    pub fn y(&self) -> f64 {
        self.data[1]
    }

    /// Z component.
    pub fn z(&self) -> f64 {
        self.data[2]
    }

    pub(crate) fn component(&self, idx: usize) -> f64 {
        self.data[idx]
    }

    /// Adds two vectors.
    pub fn add(&self, other: &Self) -> Self {
        Self::new(
            self.component(0) + other.component(0),
            self.component(1) + other.component(1),
            self.component(2) + other.component(2),
        )
    }

    /// Subtracts another vector.
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(
            self.component(0) - other.component(0),
            self.component(1) - other.component(1),
            self.component(2) - other.component(2),
        )
    }

    /// Scales the vector by a scalar.
    pub fn scale(&self, scalar: f64) -> Self {
        Self::new(
            self.component(0) * scalar,
            self.component(1) * scalar,
            self.component(2) * scalar,
        )
    }

    /// Returns the vector pointing the opposite way.
    pub fn negate(&self) -> Self {
        self.scale(-1.0)
    }

    /// Dot product with another vector.
    pub fn dot(&self, other: &Self) -> f64 {
        self.component(0) * other.component(0)
            + self.component(1) * other.component(1)
            + self.component(2) * other.component(2)
    }

    /// Cross product with another vector (`self × other`).
    pub fn cross(&self, other: &Self) -> Self {
        let ax = self.component(0);
        let ay = self.component(1);
        let az = self.component(2);
        let bx = other.component(0);
        let by = other.component(1);
        let bz = other.component(2);
        Self::new(ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx)
    }

    /// Vector length (magnitude).
    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Squared magnitude of the vector.
    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    /// Returns `true` when the length is at or below [`EPSILON`].
    pub fn is_degenerate(&self) -> bool {
        self.length() <= EPSILON
    }

    /// Normalises the vector, returning the zero vector if length ≤ `EPSILON`.
    ///
    /// Callers that must not see a zero vector check [`Vec3::try_normalize`].
    pub fn normalize(&self) -> Self {
        self.try_normalize().unwrap_or(Self::ZERO)
    }

    /// Normalises the vector, or `None` when it is degenerate.
    pub fn try_normalize(&self) -> Option<Self> {
        let len = self.length();
        if len <= EPSILON || !len.is_finite() {
            return None;
        }
        Some(self.scale(1.0 / len))
    }

    /// Returns a unit vector perpendicular to `self`.
    ///
    /// Crosses with the world axis least aligned with `self`; a degenerate
    /// input yields `UNIT_X`.
    pub fn any_perpendicular(&self) -> Self {
        let ax = self.x().abs();
        let ay = self.y().abs();
        let az = self.z().abs();
        let axis = if ax <= ay && ax <= az {
            Self::UNIT_X
        } else if ay <= az {
            Self::UNIT_Y
        } else {
            Self::UNIT_Z
        };
        self.cross(&axis).try_normalize().unwrap_or(Self::UNIT_X)
    }

    /// Returns `true` if all components are finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|c| c.is_finite())
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(value: [f64; 3]) -> Self {
        Self { data: value }
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(value: Vec3) -> Self {
        value.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_is_right_handed() {
        assert_eq!(Vec3::UNIT_X.cross(&Vec3::UNIT_Y), Vec3::UNIT_Z);
        assert_eq!(Vec3::UNIT_Y.cross(&Vec3::UNIT_Z), Vec3::UNIT_X);
        assert_eq!(Vec3::UNIT_Z.cross(&Vec3::UNIT_X), Vec3::UNIT_Y);
    }

    #[test]
    fn degenerate_vectors_do_not_normalize() {
        assert!(Vec3::ZERO.try_normalize().is_none());
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
        let v = Vec3::new(3.0, 0.0, 4.0).normalize();
        assert!((v.length() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn any_perpendicular_is_unit_and_orthogonal() {
        for v in [
            Vec3::UNIT_X,
            Vec3::new(0.3, -2.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
        ] {
            let p = v.any_perpendicular();
            assert!((p.length() - 1.0).abs() < 1e-12);
            assert!(p.dot(&v).abs() < 1e-12);
        }
    }
}
