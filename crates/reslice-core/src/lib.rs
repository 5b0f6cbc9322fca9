// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! reslice-core: keep slice planes aligned with a moving reference object.
//!
//! A slice is bound to a driver (rigid frame, volumetric image, line or point
//! landmark). Whenever the driver changes, its pose is extracted, repaired to
//! an orthonormal basis, and combined with the slice's mode, rotation and
//! flip into a new slice-to-world matrix that is committed to the scene.
//!
//! The scene graph is reached only through [`ScenePort`]; [`ResliceLogic`]
//! owns the bindings and subscriptions for one attached scene.
#![forbid(unsafe_code)]

/// Per-slice configuration and its attribute encoding.
pub mod config;
/// Driver variants and their change events.
pub mod driver;
mod ident;
/// Dispatcher and configuration API.
pub mod logic;
/// Slice modes and composition.
pub mod mode;
/// Orthonormal repair of driver poses.
pub mod orthonormal;
/// Pose extraction per driver variant.
pub mod pose;
/// Slice bindings and subscriptions.
pub mod registry;
/// Scene-graph port.
pub mod scene;

pub use config::{AttributeError, SliceConfig};
pub use driver::{
    DriverEvent, DriverNode, FrameSource, LineLandmark, PointLandmark, RigidFrame, VolumetricImage,
};
pub use ident::{NodeId, SliceId};
pub use logic::{
    DispatchReport, DriverAssignment, ResliceError, ResliceLogic, SliceOutcome, SliceUpdate,
};
pub use mode::{compose, SliceMode, TransformStack};
pub use orthonormal::{orthonormalize, Orthonormalized, Repair};
pub use pose::extract_pose;
pub use registry::{DriverBinding, DriverRegistry, Subscription};
pub use scene::{NodeLookup, SceneEvent, ScenePort};
