// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Linear algebra helpers for slice reslicing: vectors, 3×3 bases, and 4×4
//! rigid transforms.
//!
//! Everything is `f64` and column-major. Rotation helpers take degrees and are
//! exact at multiples of 90° so display conventions (axial, sagittal, coronal)
//! compose without rounding noise.
#![forbid(unsafe_code)]

use std::f64::consts::TAU;

mod mat3;
mod mat4;
mod vec3;

pub use mat3::Mat3;
pub use mat4::Mat4;
pub use vec3::Vec3;

/// Degeneracy threshold for lengths and determinants.
pub const EPSILON: f64 = 1e-12;

/// Converts degrees to radians.
pub fn deg_to_rad(value: f64) -> f64 {
    value * (TAU / 360.0)
}

/// Converts radians to degrees.
pub fn rad_to_deg(value: f64) -> f64 {
    value * (360.0 / TAU)
}

/// Returns `(sin, cos)` of an angle given in degrees.
///
/// The angle is reduced into `[0, 360)` first, so `deg` and `deg + 360`
/// agree up to the rounding of the addition itself. Quarter turns return
/// exact values.
#[allow(clippy::float_cmp)]
pub fn sin_cos_deg(deg: f64) -> (f64, f64) {
    let reduced = deg.rem_euclid(360.0);
    if reduced == 0.0 {
        (0.0, 1.0)
    } else if reduced == 90.0 {
        (1.0, 0.0)
    } else if reduced == 180.0 {
        (0.0, -1.0)
    } else if reduced == 270.0 {
        (-1.0, 0.0)
    } else {
        deg_to_rad(reduced).sin_cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turns_are_exact() {
        assert_eq!(sin_cos_deg(0.0), (0.0, 1.0));
        assert_eq!(sin_cos_deg(90.0), (1.0, 0.0));
        assert_eq!(sin_cos_deg(-90.0), (-1.0, 0.0));
        assert_eq!(sin_cos_deg(540.0), (0.0, -1.0));
    }

    #[test]
    fn full_turn_offsets_are_bit_identical() {
        for deg in [12.5, -37.0, 181.25, 359.0] {
            assert_eq!(sin_cos_deg(deg), sin_cos_deg(deg + 360.0));
        }
    }

    #[test]
    fn degree_radian_round_trip() {
        let deg = 123.456;
        assert!((rad_to_deg(deg_to_rad(deg)) - deg).abs() < 1e-12);
    }
}
