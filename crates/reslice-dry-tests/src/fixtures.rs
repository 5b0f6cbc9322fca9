// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Driver fixtures.

use reslice_core::{LineLandmark, PointLandmark, RigidFrame, VolumetricImage};
use reslice_math::{Mat4, Vec3};

/// Rigid frame with the given transform to world.
pub fn frame(to_world: Mat4) -> RigidFrame {
    RigidFrame::transform(Some(to_world))
}

/// Rigid frame translated by `(x, y, z)` with identity orientation.
pub fn translated_frame(x: f64, y: f64, z: f64) -> RigidFrame {
    frame(Mat4::translation(x, y, z))
}

/// Rigid frame whose transform to world is currently unavailable.
pub fn frame_without_pose() -> RigidFrame {
    RigidFrame::transform(None)
}

/// Markups plane with the given object-to-world matrix.
pub fn plane(object_to_world: Mat4) -> RigidFrame {
    RigidFrame::plane(Some(object_to_world))
}

/// Volumetric image with loaded pixel data.
pub fn image(ijk_to_world: Mat4, dimensions: [u32; 3]) -> VolumetricImage {
    VolumetricImage {
        ijk_to_world,
        dimensions: Some(dimensions),
        parent_to_world: None,
    }
}

/// Volumetric image whose pixel data has not been loaded yet.
pub fn empty_image(ijk_to_world: Mat4) -> VolumetricImage {
    VolumetricImage {
        ijk_to_world,
        dimensions: None,
        parent_to_world: None,
    }
}

/// Line landmark through two points.
pub fn line(p1: [f64; 3], p2: [f64; 3]) -> LineLandmark {
    LineLandmark::ruler(Vec3::from(p1), Vec3::from(p2))
}

/// Point landmark at `p`.
pub fn point(p: [f64; 3]) -> PointLandmark {
    PointLandmark::at(Vec3::from(p))
}
