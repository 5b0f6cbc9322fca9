// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pose extraction: reduce any driver variant to a `driver → world` matrix.
//!
//! The result is the raw pose. It may carry scale or skew (images, parent
//! transforms) and is repaired by [`crate::orthonormal`] before composition.

use reslice_math::{Mat3, Mat4, Vec3};

use crate::driver::{DriverNode, LineLandmark, PointLandmark, RigidFrame, VolumetricImage};

/// Which reference axis seeded a line basis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpReference {
    /// World +Y; used whenever the line is not parallel to it.
    WorldY,
    /// World +X; used when the line is parallel to +Y.
    WorldX,
}

/// Extracts the current pose of a driver, or `None` if it has no usable
/// pose right now.
pub fn extract_pose(node: &DriverNode) -> Option<Mat4> {
    match node {
        DriverNode::RigidFrame(frame) => rigid_frame_pose(frame),
        DriverNode::VolumetricImage(image) => image_pose(image),
        DriverNode::LineLandmark(line) => line_landmark_pose(line),
        DriverNode::PointLandmark(point) => point_landmark_pose(point),
    }
}

/// The frame's transform to world, verbatim.
pub fn rigid_frame_pose(frame: &RigidFrame) -> Option<Mat4> {
    frame.to_world
}

/// Center-origin pose of an image plane.
///
/// Axis columns are normalized by their voxel spacing and the origin moves
/// from the first voxel corner to the center of the first slice: only the
/// row and column axes contribute to the shift, so every image is treated
/// as a single-slice reference plane. Missing pixel data means a zero
/// shift; the orientation and origin are still valid.
pub fn image_pose(image: &VolumetricImage) -> Option<Mat4> {
    let ijk = &image.ijk_to_world;
    let size = image.dimensions.unwrap_or([0, 0, 0]);

    let mut axes = [Vec3::ZERO; 3];
    let mut spacing = [0.0; 3];
    for (i, (axis, space)) in axes.iter_mut().zip(spacing.iter_mut()).enumerate() {
        let column = ijk.column(i);
        *space = column.length();
        *axis = column.try_normalize()?;
    }

    let half_extent = |i: usize| spacing[i] * f64::from(size[i]) / 2.0;
    let shift = axes[0]
        .scale(half_extent(0))
        .add(&axes[1].scale(half_extent(1)));

    let local = Mat4::from_columns(
        axes[0],
        axes[1],
        axes[2],
        ijk.translation_part().add(&shift),
    );
    Some(match image.parent_to_world {
        Some(parent) => parent.multiply(&local),
        None => local,
    })
}

/// Pose of a line landmark from its first two control points.
pub fn line_landmark_pose(line: &LineLandmark) -> Option<Mat4> {
    let (p1, p2) = line.endpoints()?;
    Some(line_pose(p1, p2))
}

/// Pose of a line from `p1` to `p2`: the line direction is the local Z axis
/// and the origin sits on `p2`.
pub fn line_pose(p1: Vec3, p2: Vec3) -> Mat4 {
    let (basis, _) = line_basis(p1, p2);
    Mat4::from_basis_translation(&basis, p2)
}

/// Right-handed basis `(t, s, n)` whose `n` points from `p1` to `p2`.
///
/// Only exactly coincident points give `n = +Z`; any other separation,
/// however small, keeps its direction. The in-plane axes are seeded from
/// world +Y unless `n` is parallel to it; then world +X seeds them instead.
pub fn line_basis(p1: Vec3, p2: Vec3) -> (Mat3, UpReference) {
    let n = line_direction(p1, p2);

    let up = Vec3::UNIT_Y;
    let t_from_up = up.cross(&n);
    if n.dot(&up) < 1.0 && !t_from_up.is_degenerate() {
        let t = t_from_up.normalize();
        let s = n.cross(&t).normalize();
        return (Mat3::from_columns(t, s, n), UpReference::WorldY);
    }

    let r = Vec3::UNIT_X;
    let s = n.cross(&r).normalize();
    let t = s.cross(&n).normalize();
    (Mat3::from_columns(t, s, n), UpReference::WorldX)
}

fn line_direction(p1: Vec3, p2: Vec3) -> Vec3 {
    let d = p2.sub(&p1);
    if d == Vec3::ZERO {
        return Vec3::UNIT_Z;
    }
    // Rescale to a unit largest component so tiny separations survive normalization.
    let largest = d.x().abs().max(d.y().abs()).max(d.z().abs());
    d.scale(1.0 / largest)
        .try_normalize()
        .unwrap_or(Vec3::UNIT_Z)
}

/// Identity orientation at the landmark's first point.
pub fn point_landmark_pose(point: &PointLandmark) -> Option<Mat4> {
    point.position().map(Mat4::from_translation)
}
