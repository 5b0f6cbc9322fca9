// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Driver variants: the reference objects a slice can follow.
//!
//! The set is closed. Each variant carries the pose-defining data the scene
//! reported at lookup time; [`crate::pose::extract_pose`] reduces it to a
//! single `driver → world` matrix.

use reslice_math::{Mat4, Vec3};

/// Change notifications a driver can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DriverEvent {
    /// Generic "object modified".
    Modified,
    /// The object's transform to world changed (pose changed).
    TransformModified,
    /// A volumetric image's voxel data changed.
    ImageDataModified,
    /// A landmark's control points moved, were added, or were removed.
    PointModified,
}

/// Events every subscription listens to, regardless of variant.
pub const DEFAULT_EVENTS: [DriverEvent; 2] = [DriverEvent::Modified, DriverEvent::TransformModified];

/// Where a rigid frame's pose comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameSource {
    /// A linear transform node.
    #[default]
    Transform,
    /// A markups plane; its object-to-world matrix follows the control points.
    MarkupsPlane,
}

/// A rigid coordinate frame: a linear transform node or a markups plane.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidFrame {
    /// Transform to world, or `None` if it cannot currently be computed
    /// (e.g. a non-linear transform somewhere up the hierarchy).
    pub to_world: Option<Mat4>,
    /// Kind of node behind the frame.
    #[cfg_attr(feature = "serde", serde(default))]
    pub source: FrameSource,
}

impl RigidFrame {
    /// Frame of a linear transform node.
    pub fn transform(to_world: Option<Mat4>) -> Self {
        Self {
            to_world,
            source: FrameSource::Transform,
        }
    }

    /// Frame of a markups plane, posed by its object-to-world matrix.
    pub fn plane(object_to_world: Option<Mat4>) -> Self {
        Self {
            to_world: object_to_world,
            source: FrameSource::MarkupsPlane,
        }
    }
}

/// A volumetric image.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolumetricImage {
    /// Index (IJK) to world matrix. Column lengths are the voxel spacings.
    pub ijk_to_world: Mat4,
    /// Voxel grid dimensions; `None` while pixel data is not loaded yet.
    pub dimensions: Option<[u32; 3]>,
    /// World transform of the parent rigid frame, if the image is
    /// transformed by one and that transform is currently available.
    pub parent_to_world: Option<Mat4>,
}

/// A line landmark: markups line control points, or a ruler's two endpoints.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineLandmark {
    /// World positions of the control points; the first two define the line.
    pub control_points: Vec<Vec3>,
}

impl LineLandmark {
    /// Line through two explicit endpoints (ruler annotation).
    pub fn ruler(p1: Vec3, p2: Vec3) -> Self {
        Self {
            control_points: vec![p1, p2],
        }
    }

    /// The two defining endpoints, if both are placed.
    pub fn endpoints(&self) -> Option<(Vec3, Vec3)> {
        match self.control_points.as_slice() {
            [p1, p2, ..] => Some((*p1, *p2)),
            _ => None,
        }
    }
}

/// A single-point landmark (fiducial).
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointLandmark {
    /// World positions of the control points; only the first is used.
    pub control_points: Vec<Vec3>,
}

impl PointLandmark {
    /// Landmark with a single placed point.
    pub fn at(position: Vec3) -> Self {
        Self {
            control_points: vec![position],
        }
    }

    /// The driving position, if a point is placed.
    pub fn position(&self) -> Option<Vec3> {
        self.control_points.first().copied()
    }
}

/// A reference object that can drive a slice.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DriverNode {
    /// Rigid coordinate frame.
    RigidFrame(RigidFrame),
    /// Volumetric image.
    VolumetricImage(VolumetricImage),
    /// Two-point line (markups line or ruler).
    LineLandmark(LineLandmark),
    /// Single point.
    PointLandmark(PointLandmark),
}

impl DriverNode {
    /// Variant-specific "content changed" events this node declares.
    pub fn content_events(&self) -> &'static [DriverEvent] {
        match self {
            Self::RigidFrame(RigidFrame {
                source: FrameSource::Transform,
                ..
            }) => &[],
            Self::VolumetricImage(_) => &[DriverEvent::ImageDataModified],
            Self::RigidFrame(RigidFrame {
                source: FrameSource::MarkupsPlane,
                ..
            })
            | Self::LineLandmark(_)
            | Self::PointLandmark(_) => &[DriverEvent::PointModified],
        }
    }

    /// Full, de-duplicated event list a subscription to this node observes.
    pub fn observed_events(&self) -> Vec<DriverEvent> {
        let mut events = DEFAULT_EVENTS.to_vec();
        for event in self.content_events() {
            if !events.contains(event) {
                events.push(*event);
            }
        }
        events
    }

    /// Short variant name for logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RigidFrame(RigidFrame {
                source: FrameSource::MarkupsPlane,
                ..
            }) => "markups-plane",
            Self::RigidFrame(_) => "rigid-frame",
            Self::VolumetricImage(_) => "volumetric-image",
            Self::LineLandmark(_) => "line-landmark",
            Self::PointLandmark(_) => "point-landmark",
        }
    }
}

impl From<RigidFrame> for DriverNode {
    fn from(value: RigidFrame) -> Self {
        Self::RigidFrame(value)
    }
}

impl From<VolumetricImage> for DriverNode {
    fn from(value: VolumetricImage) -> Self {
        Self::VolumetricImage(value)
    }
}

impl From<LineLandmark> for DriverNode {
    fn from(value: LineLandmark) -> Self {
        Self::LineLandmark(value)
    }
}

impl From<PointLandmark> for DriverNode {
    fn from(value: PointLandmark) -> Self {
        Self::PointLandmark(value)
    }
}
