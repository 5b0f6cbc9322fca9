// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mode composition: driver pose + slice configuration → slice-to-world.
//!
//! Composition order matters; each mode below fixes the display convention
//! (left/right, anterior/posterior) for that orientation. Steps are applied
//! with [`TransformStack`], where every operation is concatenated in the
//! frame produced by the previous ones.

use std::fmt;
use std::str::FromStr;

use reslice_math::Mat4;

use crate::config::SliceConfig;

/// How a slice is oriented relative to its driver.
///
/// Discriminants are the persisted integer codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum SliceMode {
    /// Do not move the slice.
    #[default]
    None = 0,
    /// Axial plane at the driver position.
    Axial = 1,
    /// Sagittal plane at the driver position.
    Sagittal = 2,
    /// Coronal plane at the driver position.
    Coronal = 3,
    /// Plane containing the driver's local Z axis (first variant).
    InPlane = 4,
    /// Plane containing the driver's local Z axis, rotated 90° from [`SliceMode::InPlane`].
    InPlane90 = 5,
    /// Plane perpendicular to the driver's local Z axis.
    Transverse = 6,
}

impl SliceMode {
    /// All modes in code order.
    pub const ALL: [Self; 7] = [
        Self::None,
        Self::Axial,
        Self::Sagittal,
        Self::Coronal,
        Self::InPlane,
        Self::InPlane90,
        Self::Transverse,
    ];

    /// Persisted integer code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Mode for a persisted integer code, if it names one.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|m| i64::from(m.code()) == code)
    }

    /// Lower-case name used by tooling.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Axial => "axial",
            Self::Sagittal => "sagittal",
            Self::Coronal => "coronal",
            Self::InPlane => "inplane",
            Self::InPlane90 => "inplane90",
            Self::Transverse => "transverse",
        }
    }

    /// `true` if the driver's orientation is ignored and only its position used.
    pub fn uses_translation_only(self) -> bool {
        matches!(self, Self::Axial | Self::Sagittal | Self::Coronal)
    }
}

impl fmt::Display for SliceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognized mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown slice mode: {0}")]
pub struct UnknownModeName(pub String);

impl FromStr for SliceMode {
    type Err = UnknownModeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| UnknownModeName(s.to_string()))
    }
}

/// Transform builder with post-multiplying semantics.
///
/// `rotate_*` and `concatenate` append on the right, so each step acts in the
/// local frame left by the previous steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformStack {
    matrix: Mat4,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformStack {
    /// Starts from the identity.
    pub fn new() -> Self {
        Self {
            matrix: Mat4::identity(),
        }
    }

    /// Appends an arbitrary matrix.
    pub fn concatenate(&mut self, m: &Mat4) -> &mut Self {
        self.matrix = self.matrix.multiply(m);
        self
    }

    /// Appends a rotation about the current X axis.
    pub fn rotate_x(&mut self, deg: f64) -> &mut Self {
        self.concatenate(&Mat4::rotation_x_deg(deg))
    }

    /// Appends a rotation about the current Y axis.
    pub fn rotate_y(&mut self, deg: f64) -> &mut Self {
        self.concatenate(&Mat4::rotation_y_deg(deg))
    }

    /// Appends a rotation about the current Z axis.
    pub fn rotate_z(&mut self, deg: f64) -> &mut Self {
        self.concatenate(&Mat4::rotation_z_deg(deg))
    }

    /// The accumulated matrix.
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }
}

/// Composes the slice-to-world matrix for an orthonormal driver pose.
///
/// Returns `None` for [`SliceMode::None`]: the slice keeps its last pose.
pub fn compose(driver_to_world: &Mat4, config: &SliceConfig) -> Option<Mat4> {
    let rotation = config.rotation_deg;
    let flip = if config.flip { 180.0 } else { 0.0 };
    let position = Mat4::from_translation(driver_to_world.translation_part());

    let mut slice_to_world = TransformStack::new();
    match config.mode {
        SliceMode::None => return None,
        SliceMode::Axial => {
            slice_to_world
                .concatenate(&position)
                .rotate_z(rotation + 180.0)
                .rotate_x(flip + 180.0);
        }
        SliceMode::Sagittal => {
            slice_to_world
                .concatenate(&position)
                .rotate_x(rotation - 90.0)
                .rotate_z(flip + 180.0)
                .rotate_y(90.0);
        }
        SliceMode::Coronal => {
            slice_to_world
                .concatenate(&position)
                .rotate_y(rotation + 180.0)
                .rotate_x(flip + 180.0)
                .rotate_x(90.0);
        }
        SliceMode::InPlane | SliceMode::InPlane90 | SliceMode::Transverse => {
            let slice_to_driver = slice_to_driver(config.mode, rotation, flip);
            slice_to_world
                .concatenate(driver_to_world)
                .concatenate(&slice_to_driver);
        }
    }
    Some(slice_to_world.matrix())
}

/// Local orientation of the slice inside the driver frame (driver-relative modes).
fn slice_to_driver(mode: SliceMode, rotation: f64, flip: f64) -> Mat4 {
    let mut stack = TransformStack::new();
    match mode {
        SliceMode::InPlane => {
            stack.rotate_x(-90.0).rotate_y(90.0);
        }
        SliceMode::InPlane90 => {
            stack.rotate_x(-90.0);
        }
        _ => {}
    }
    stack.rotate_z(rotation).rotate_x(flip);
    stack.matrix()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reslice_math::Vec3;

    fn config(mode: SliceMode, rotation_deg: f64, flip: bool) -> SliceConfig {
        SliceConfig {
            mode,
            rotation_deg,
            flip,
        }
    }

    #[test]
    fn codes_round_trip() {
        for mode in SliceMode::ALL {
            assert_eq!(SliceMode::from_code(i64::from(mode.code())), Some(mode));
            assert_eq!(mode.name().parse::<SliceMode>(), Ok(mode));
        }
        assert_eq!(SliceMode::from_code(7), None);
        assert_eq!(SliceMode::from_code(-1), None);
    }

    #[test]
    fn none_leaves_slice_alone() {
        assert!(compose(&Mat4::identity(), &config(SliceMode::None, 30.0, true)).is_none());
    }

    #[test]
    fn axial_at_origin_is_identity() {
        // Rz(180) · Rx(180) = diag(-1, -1, 1) · diag(1, -1, -1)
        let m = compose(&Mat4::identity(), &config(SliceMode::Axial, 0.0, false)).unwrap();
        let expected = Mat4::scale(-1.0, 1.0, -1.0);
        assert!(m.approx_eq(&expected, 1e-12), "{m:?}");
    }

    #[test]
    fn axial_ignores_driver_orientation() {
        let driver = Mat4::translation(3.0, 4.0, 5.0).multiply(&Mat4::rotation_y_deg(37.0));
        let plain = Mat4::translation(3.0, 4.0, 5.0);
        for mode in [SliceMode::Axial, SliceMode::Sagittal, SliceMode::Coronal] {
            let a = compose(&driver, &config(mode, 15.0, true)).unwrap();
            let b = compose(&plain, &config(mode, 15.0, true)).unwrap();
            assert!(a.approx_eq(&b, 1e-12), "{mode}");
            assert_eq!(a.translation_part(), Vec3::new(3.0, 4.0, 5.0));
        }
    }

    #[test]
    fn sagittal_normal_is_world_x() {
        let m = compose(&Mat4::identity(), &config(SliceMode::Sagittal, 0.0, false)).unwrap();
        let normal = m.column(2);
        assert!((normal.x().abs() - 1.0).abs() < 1e-12, "{normal:?}");
    }

    #[test]
    fn coronal_normal_is_world_y() {
        let m = compose(&Mat4::identity(), &config(SliceMode::Coronal, 0.0, false)).unwrap();
        let normal = m.column(2);
        assert!((normal.y().abs() - 1.0).abs() < 1e-12, "{normal:?}");
    }

    #[test]
    fn transverse_follows_driver_frame() {
        let driver = Mat4::translation(1.0, 2.0, 3.0).multiply(&Mat4::rotation_x_deg(30.0));
        let m = compose(&driver, &config(SliceMode::Transverse, 0.0, false)).unwrap();
        assert!(m.approx_eq(&driver, 1e-12));
    }

    #[test]
    fn inplane_contains_driver_z() {
        let driver = Mat4::translation(1.0, 2.0, 3.0).multiply(&Mat4::rotation_y_deg(25.0));
        let driver_z = driver.column(2);
        for mode in [SliceMode::InPlane, SliceMode::InPlane90] {
            let m = compose(&driver, &config(mode, 0.0, false)).unwrap();
            // The slice normal is perpendicular to the driver's Z axis.
            assert!(m.column(2).dot(&driver_z).abs() < 1e-12, "{mode}");
            assert_eq!(m.translation_part(), driver.translation_part());
        }
    }

    #[test]
    fn inplane_variants_differ_by_quarter_turn() {
        let driver = Mat4::identity();
        let a = compose(&driver, &config(SliceMode::InPlane, 0.0, false)).unwrap();
        let b = compose(&driver, &config(SliceMode::InPlane90, 0.0, false)).unwrap();
        let cos = a.column(2).dot(&b.column(2));
        assert!(cos.abs() < 1e-12);
    }
}
