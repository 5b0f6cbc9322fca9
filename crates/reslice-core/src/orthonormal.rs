// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Orthonormal repair of driver poses.
//!
//! Every pose goes through [`orthonormalize`] before composition; nothing
//! upstream is trusted to deliver a clean rotation.

use reslice_math::{Mat3, Mat4, Vec3};

/// Largest |cos| accepted between two basis columns (90° ± ~0.1°).
pub const ORTHOGONALITY_TOLERANCE: f64 = 0.002;

/// How a pose was brought into orthonormal form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repair {
    /// Columns were already orthogonal; each was only rescaled to unit length.
    Normalized,
    /// Columns were skewed or degenerate; the basis was replaced by its
    /// nearest orthonormal basis.
    Corrected,
}

/// A pose whose basis is orthonormal, plus how it got that way.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orthonormalized {
    /// The repaired pose; translation is carried over unchanged.
    pub pose: Mat4,
    /// Which path produced it.
    pub repair: Repair,
}

impl Orthonormalized {
    /// `true` when the input needed more than unit rescaling.
    pub fn was_corrected(&self) -> bool {
        self.repair == Repair::Corrected
    }
}

/// Returns `true` if every pair of basis columns is orthogonal within
/// [`ORTHOGONALITY_TOLERANCE`].
///
/// The dot products are taken on the raw columns, as the driver reported
/// them.
pub fn is_orthogonal(basis: &Mat3) -> bool {
    let [x, y, z] = basis.columns();
    x.dot(&y).abs() < ORTHOGONALITY_TOLERANCE
        && x.dot(&z).abs() < ORTHOGONALITY_TOLERANCE
        && y.dot(&z).abs() < ORTHOGONALITY_TOLERANCE
}

/// Brings the rotational part of `pose` into orthonormal form.
///
/// Total: any input, including singular or non-finite bases, yields a
/// usable pose. A non-finite translation is replaced by the origin.
pub fn orthonormalize(pose: &Mat4) -> Orthonormalized {
    let basis = pose.basis();
    let translation = pose.translation_part();
    let (translation, translation_ok) = if translation.is_finite() {
        (translation, true)
    } else {
        (Vec3::ZERO, false)
    };

    if translation_ok && is_orthogonal(&basis) {
        let [x, y, z] = basis.columns();
        if let (Some(x), Some(y), Some(z)) = (x.try_normalize(), y.try_normalize(), z.try_normalize())
        {
            return Orthonormalized {
                pose: Mat4::from_columns(x, y, z, translation),
                repair: Repair::Normalized,
            };
        }
    }

    Orthonormalized {
        pose: Mat4::from_basis_translation(&basis.orthonormalize(), translation),
        repair: Repair::Corrected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_orthogonal_basis_takes_fast_path() {
        let pose = Mat4::translation(1.0, 2.0, 3.0).multiply(&Mat4::scale(2.0, 0.5, 4.0));
        let out = orthonormalize(&pose);
        assert_eq!(out.repair, Repair::Normalized);
        assert_eq!(out.pose, Mat4::translation(1.0, 2.0, 3.0));
    }

    #[test]
    fn skewed_basis_is_corrected() {
        let skewed = Mat4::from_columns(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.1, 1.0, 0.0),
            Vec3::UNIT_Z,
            Vec3::new(4.0, 5.0, 6.0),
        );
        let out = orthonormalize(&skewed);
        assert!(out.was_corrected());
        assert_eq!(out.pose.translation_part(), Vec3::new(4.0, 5.0, 6.0));
        assert!(is_orthogonal(&out.pose.basis()));
        let gram = out.pose.basis().transpose().multiply(&out.pose.basis());
        assert!(gram.max_abs_diff(&Mat3::identity()) < 1e-12);
    }

    #[test]
    fn tolerance_boundary() {
        // cos ≈ 0.0019: accepted as orthogonal.
        let nearly = Mat4::from_columns(
            Vec3::UNIT_X,
            Vec3::new(0.0019, 1.0, 0.0).normalize(),
            Vec3::UNIT_Z,
            Vec3::ZERO,
        );
        assert_eq!(orthonormalize(&nearly).repair, Repair::Normalized);
        // cos ≈ 0.0025: corrected.
        let skewed = Mat4::from_columns(
            Vec3::UNIT_X,
            Vec3::new(0.0025, 1.0, 0.0).normalize(),
            Vec3::UNIT_Z,
            Vec3::ZERO,
        );
        assert_eq!(orthonormalize(&skewed).repair, Repair::Corrected);
    }

    #[test]
    fn zero_column_is_corrected_not_zeroed() {
        let pose = Mat4::from_columns(Vec3::UNIT_X, Vec3::UNIT_Y, Vec3::ZERO, Vec3::ZERO);
        let out = orthonormalize(&pose);
        assert!(out.was_corrected());
        assert_eq!(out.pose.column(2), Vec3::UNIT_Z);
    }

    #[test]
    fn non_finite_translation_is_replaced() {
        let pose = Mat4::translation(f64::NAN, 0.0, 0.0);
        let out = orthonormalize(&pose);
        assert!(out.was_corrected());
        assert!(out.pose.is_finite());
    }
}
