// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::{Vec3, EPSILON};

/// Iteration cap for the polar decomposition in [`Mat3::orthonormalize`].
const POLAR_MAX_ITERATIONS: usize = 64;

/// Convergence threshold (max absolute element change) for the polar iteration.
const POLAR_TOLERANCE: f64 = 1e-14;

/// Column-major 3×3 matrix holding a rotation/scale basis.
///
/// Column `i` is the image of the `i`-th local axis, which is how pose bases
/// are read everywhere in the reslice pipeline.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat3 {
    data: [f64; 9],
}

impl Mat3 {
    /// Returns the identity matrix.
    pub const fn identity() -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, // col 0
                0.0, 1.0, 0.0, // col 1
                0.0, 0.0, 1.0, // col 2
            ],
        }
    }

    /// Builds a matrix from its three columns.
    pub fn from_columns(x: Vec3, y: Vec3, z: Vec3) -> Self {
        Self {
            data: [
                x.x(),
                x.y(),
                x.z(),
                y.x(),
                y.y(),
                y.z(),
                z.x(),
                z.y(),
                z.z(),
            ],
        }
    }

    /// Returns column `col` (0..3).
    pub fn column(&self, col: usize) -> Vec3 {
        Vec3::new(
            self.data[col * 3],
            self.data[col * 3 + 1],
            self.data[col * 3 + 2],
        )
    }

    /// Returns all three columns.
    pub fn columns(&self) -> [Vec3; 3] {
        [self.column(0), self.column(1), self.column(2)]
    }

    /// Element at (`row`, `col`).
    pub fn element(&self, row: usize, col: usize) -> f64 {
        self.data[col * 3 + row]
    }

    /// Returns the transpose.
    pub fn transpose(&self) -> Self {
        let mut out = [0.0; 9];
        for row in 0..3 {
            for col in 0..3 {
                out[row * 3 + col] = self.element(row, col);
            }
        }
        Self { data: out }
    }

    /// Determinant (the signed volume spanned by the columns).
    pub fn determinant(&self) -> f64 {
        let [x, y, z] = self.columns();
        x.dot(&y.cross(&z))
    }

    /// Inverse, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let [a, b, c] = self.columns();
        let det = a.dot(&b.cross(&c));
        if det.abs() <= EPSILON || !det.is_finite() {
            return None;
        }
        // Rows of the inverse are the reciprocal basis vectors.
        let inv_det = 1.0 / det;
        let r0 = b.cross(&c).scale(inv_det);
        let r1 = c.cross(&a).scale(inv_det);
        let r2 = a.cross(&b).scale(inv_det);
        Some(Self::from_columns(r0, r1, r2).transpose())
    }

    /// Multiplies two matrices (`self * rhs`).
    pub fn multiply(&self, rhs: &Self) -> Self {
        let mut out = [0.0; 9];
        for row in 0..3 {
            for col in 0..3 {
                let mut sum = 0.0;
                for k in 0..3 {
                    sum += self.element(row, k) * rhs.element(k, col);
                }
                out[col * 3 + row] = sum;
            }
        }
        Self { data: out }
    }

    /// Largest absolute element-wise difference to `other`.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Returns `true` if all elements are finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Returns the nearest orthonormal matrix (orthogonal polar factor).
    ///
    /// Uses the Newton iteration `X ← ½(X + X⁻ᵀ)`, which converges
    /// quadratically to the orthogonal factor of the polar decomposition and
    /// keeps the sign of the determinant. Singular or non-finite input falls
    /// back to Gram–Schmidt with a synthesized completion, so the result is
    /// always an orthonormal basis.
    pub fn orthonormalize(&self) -> Self {
        if !self.is_finite() {
            return Self::identity();
        }
        let sign = self.determinant().signum();
        let mut current = *self;
        for _ in 0..POLAR_MAX_ITERATIONS {
            let Some(inv) = current.inverse() else {
                return self.gram_schmidt(sign);
            };
            let inv_t = inv.transpose();
            let mut next = [0.0; 9];
            for (i, slot) in next.iter_mut().enumerate() {
                *slot = 0.5 * (current.data[i] + inv_t.data[i]);
            }
            let next = Self { data: next };
            let delta = next.max_abs_diff(&current);
            current = next;
            if delta <= POLAR_TOLERANCE {
                break;
            }
        }
        current
    }

    /// Gram–Schmidt over the columns with completion for missing axes.
    ///
    /// `sign` selects the handedness of the synthesized third axis (a
    /// reflection stays a reflection).
    fn gram_schmidt(&self, sign: f64) -> Self {
        let [c0, c1, c2] = self.columns();
        let x = c0
            .try_normalize()
            .or_else(|| c1.cross(&c2).try_normalize())
            .unwrap_or_else(|| {
                if c1.is_degenerate() {
                    c2.any_perpendicular()
                } else {
                    c1.any_perpendicular()
                }
            });
        let y = c1
            .sub(&x.scale(x.dot(&c1)))
            .try_normalize()
            .or_else(|| {
                let from_z = c2.sub(&x.scale(x.dot(&c2)));
                from_z.try_normalize().map(|z| z.cross(&x))
            })
            .unwrap_or_else(|| x.any_perpendicular());
        let z = x.cross(&y);
        let z = if sign < 0.0 { z.negate() } else { z };
        Self::from_columns(x, y, z)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn assert_orthonormal(m: &Mat3) {
        let gram = m.transpose().multiply(m);
        assert!(
            gram.max_abs_diff(&Mat3::identity()) < 1e-10,
            "not orthonormal: {m:?}"
        );
    }

    #[test]
    fn inverse_of_identity_is_identity() {
        assert_eq!(Mat3::identity().inverse(), Some(Mat3::identity()));
    }

    #[test]
    fn inverse_round_trips() {
        let m = Mat3::from_columns(
            Vec3::new(2.0, 0.5, 0.0),
            Vec3::new(0.1, 3.0, -1.0),
            Vec3::new(0.0, 0.2, 1.5),
        );
        let inv = m.inverse().unwrap();
        assert!(m.multiply(&inv).max_abs_diff(&Mat3::identity()) < 1e-12);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = Mat3::from_columns(Vec3::UNIT_X, Vec3::UNIT_X, Vec3::UNIT_Z);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn skewed_basis_orthonormalizes() {
        let m = Mat3::from_columns(
            Vec3::new(1.0, 0.1, 0.0),
            Vec3::new(0.05, 1.0, 0.02),
            Vec3::new(0.0, -0.03, 1.0),
        );
        let o = m.orthonormalize();
        assert_orthonormal(&o);
        assert!(o.determinant() > 0.0);
        // Nearest rotation stays close to the input.
        assert!(o.max_abs_diff(&m) < 0.1);
    }

    #[test]
    fn scaled_rotation_recovers_rotation() {
        let m = Mat3::from_columns(
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(-3.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 0.5),
        );
        let o = m.orthonormalize();
        let expected = Mat3::from_columns(Vec3::UNIT_Y, Vec3::UNIT_X.negate(), Vec3::UNIT_Z);
        assert!(o.max_abs_diff(&expected) < 1e-12);
    }

    #[test]
    fn reflection_keeps_negative_determinant() {
        let m = Mat3::from_columns(Vec3::UNIT_X, Vec3::UNIT_Y, Vec3::new(0.1, 0.0, -1.0));
        let o = m.orthonormalize();
        assert_orthonormal(&o);
        assert!(o.determinant() < 0.0);
    }

    #[test]
    fn singular_input_falls_back_to_gram_schmidt() {
        let m = Mat3::from_columns(Vec3::new(2.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0), Vec3::ZERO);
        let o = m.orthonormalize();
        assert_orthonormal(&o);
        assert!((o.column(0).x() - 1.0).abs() < 1e-12);
        assert!((o.column(1).y() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_zero_input_yields_a_basis() {
        let m = Mat3::from_columns(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO);
        assert_orthonormal(&m.orthonormalize());
    }
}
