// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Matrix comparison helpers for assertions and property tests.

use reslice_math::{Mat3, Mat4};

/// Default tolerance for composed matrices.
pub const MATRIX_TOLERANCE: f64 = 1e-9;

/// `true` if the basis of `m` is orthonormal within `tol`.
pub fn is_orthonormal(m: &Mat4, tol: f64) -> bool {
    let basis = m.basis();
    basis
        .transpose()
        .multiply(&basis)
        .max_abs_diff(&Mat3::identity())
        < tol
}

/// Rotation taking the basis of `a` to the basis of `b`, expressed in `a`'s frame.
pub fn relative_rotation(a: &Mat4, b: &Mat4) -> Mat3 {
    a.basis().transpose().multiply(&b.basis())
}

/// Angle of a rotation matrix in degrees, from its trace.
pub fn rotation_angle_deg(r: &Mat3) -> f64 {
    let trace = r.element(0, 0) + r.element(1, 1) + r.element(2, 2);
    ((trace - 1.0) / 2.0).clamp(-1.0, 1.0).acos().to_degrees()
}

/// `true` if `a` and `b` agree elementwise within `tol`.
pub fn mat4_close(a: &Mat4, b: &Mat4, tol: f64) -> bool {
    a.max_abs_diff(b) < tol
}
