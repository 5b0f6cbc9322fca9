// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::{sin_cos_deg, Mat3, Vec3};

/// Column‑major 4×4 matrix holding an affine pose (`object → world`).
///
/// - Column `i < 3` is the image of local axis `i`; column 3 is the
///   translation.
/// - Products follow the usual convention: `a * b` applies `b` first.
///
/// # Examples
/// ```
/// use reslice_math::{Mat4, Vec3};
/// let t = Mat4::translation(5.0, -3.0, 2.0);
/// let p = Vec3::new(2.0, 4.0, -1.0);
/// assert_eq!(t.transform_point(&p).to_array(), [7.0, 1.0, 1.0]);
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "[[f64; 4]; 4]", into = "[[f64; 4]; 4]")
)]
pub struct Mat4 {
    data: [f64; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    /// Returns the identity matrix.
    pub const fn identity() -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, // col 0
                0.0, 1.0, 0.0, 0.0, // col 1
                0.0, 0.0, 1.0, 0.0, // col 2
                0.0, 0.0, 0.0, 1.0, // col 3
            ],
        }
    }

    /// Builds a pure translation.
    pub const fn translation(tx: f64, ty: f64, tz: f64) -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, // col 0
                0.0, 1.0, 0.0, 0.0, // col 1
                0.0, 0.0, 1.0, 0.0, // col 2
                tx, ty, tz, 1.0, // col 3 (translation)
            ],
        }
    }

    /// Builds a pure translation from a vector.
    pub fn from_translation(t: Vec3) -> Self {
        Self::translation(t.x(), t.y(), t.z())
    }

    /// Builds a non-uniform scale matrix.
    pub const fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            data: [
                sx, 0.0, 0.0, 0.0, // col 0
                0.0, sy, 0.0, 0.0, // col 1
                0.0, 0.0, sz, 0.0, // col 2
                0.0, 0.0, 0.0, 1.0, // col 3
            ],
        }
    }

    /// Builds an affine matrix from a 3×3 basis and a translation.
    pub fn from_basis_translation(basis: &Mat3, t: Vec3) -> Self {
        Self::from_columns(basis.column(0), basis.column(1), basis.column(2), t)
    }

    /// Builds an affine matrix from three axis columns and a translation.
    pub fn from_columns(x: Vec3, y: Vec3, z: Vec3, t: Vec3) -> Self {
        Self {
            data: [
                x.x(),
                x.y(),
                x.z(),
                0.0,
                y.x(),
                y.y(),
                y.z(),
                0.0,
                z.x(),
                z.y(),
                z.z(),
                0.0,
                t.x(),
                t.y(),
                t.z(),
                1.0,
            ],
        }
    }

    /// Builds a matrix from row-major nested arrays (`rows[r][c]`).
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        let mut data = [0.0; 16];
        for (row, values) in rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                data[col * 4 + row] = *value;
            }
        }
        Self { data }
    }

    /// Returns the matrix as row-major nested arrays.
    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (row, values) in rows.iter_mut().enumerate() {
            for (col, value) in values.iter_mut().enumerate() {
                *value = self.element(row, col);
            }
        }
        rows
    }

    /// Rotation about +X by `deg` degrees (counter-clockwise looking down the axis).
    pub fn rotation_x_deg(deg: f64) -> Self {
        let (s, c) = sin_cos_deg(deg);
        // `0.0 - s` rather than `-s` keeps exact zeros positive.
        Self::new([
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, s, 0.0, //
            0.0, 0.0 - s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Rotation about +Y by `deg` degrees.
    pub fn rotation_y_deg(deg: f64) -> Self {
        let (s, c) = sin_cos_deg(deg);
        Self::new([
            c, 0.0, 0.0 - s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Rotation about +Z by `deg` degrees.
    pub fn rotation_z_deg(deg: f64) -> Self {
        let (s, c) = sin_cos_deg(deg);
        Self::new([
            c, s, 0.0, 0.0, //
            0.0 - s, c, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Creates a matrix from column-major array data.
    pub const fn new(data: [f64; 16]) -> Self {
        Self { data }
    }

    /// Returns the matrix as a column‑major array.
    pub fn to_array(self) -> [f64; 16] {
        self.data
    }

    /// Element at (`row`, `col`).
    pub fn element(&self, row: usize, col: usize) -> f64 {
        self.data[col * 4 + row]
    }

    /// Returns the xyz part of column `col`.
    pub fn column(&self, col: usize) -> Vec3 {
        Vec3::new(
            self.data[col * 4],
            self.data[col * 4 + 1],
            self.data[col * 4 + 2],
        )
    }

    /// Upper-left 3×3 block (rotation/scale basis).
    pub fn basis(&self) -> Mat3 {
        Mat3::from_columns(self.column(0), self.column(1), self.column(2))
    }

    /// Translation component (column 3).
    pub fn translation_part(&self) -> Vec3 {
        self.column(3)
    }

    /// Returns a copy with the basis replaced, keeping translation.
    pub fn with_basis(&self, basis: &Mat3) -> Self {
        Self::from_basis_translation(basis, self.translation_part())
    }

    /// Returns a copy with the translation replaced, keeping the basis.
    pub fn with_translation(&self, t: Vec3) -> Self {
        let mut data = self.data;
        data[12] = t.x();
        data[13] = t.y();
        data[14] = t.z();
        Self { data }
    }

    /// Multiplies the matrix with another matrix (`self * rhs`).
    pub fn multiply(&self, rhs: &Self) -> Self {
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.element(row, k) * rhs.element(k, col);
                }
                out[col * 4 + row] = sum;
            }
        }
        Self::new(out)
    }

    /// Transforms a point (assumes `w = 1`, no perspective divide).
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        self.transform_direction(point).add(&self.translation_part())
    }

    /// Transforms a direction vector (ignores translation, `w = 0`).
    pub fn transform_direction(&self, direction: &Vec3) -> Vec3 {
        let x = direction.component(0);
        let y = direction.component(1);
        let z = direction.component(2);

        let nx = self.element(0, 0) * x + self.element(0, 1) * y + self.element(0, 2) * z;
        let ny = self.element(1, 0) * x + self.element(1, 1) * y + self.element(1, 2) * z;
        let nz = self.element(2, 0) * x + self.element(2, 1) * y + self.element(2, 2) * z;

        Vec3::new(nx, ny, nz)
    }

    /// Largest absolute element-wise difference to `other`.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Element-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.max_abs_diff(other) <= tolerance
    }

    /// Returns `true` if all elements are finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl From<[f64; 16]> for Mat4 {
    fn from(value: [f64; 16]) -> Self {
        Self { data: value }
    }
}

impl From<[[f64; 4]; 4]> for Mat4 {
    fn from(rows: [[f64; 4]; 4]) -> Self {
        Self::from_rows(rows)
    }
}

impl From<Mat4> for [[f64; 4]; 4] {
    fn from(value: Mat4) -> Self {
        value.to_rows()
    }
}

impl core::ops::Mul for Mat4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        self.multiply(&rhs)
    }
}

impl core::ops::Mul<&Mat4> for Mat4 {
    type Output = Self;
    fn mul(self, rhs: &Mat4) -> Self::Output {
        self.multiply(rhs)
    }
}

impl core::ops::MulAssign for Mat4 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = self.multiply(&rhs);
    }
}
