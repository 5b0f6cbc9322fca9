// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for reslice crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`scene`] - In-memory [`ScenePort`](reslice_core::ScenePort) fake with call counters
//! - [`fixtures`] - Driver builders (frames, planes, images, lines, points)
//! - [`approx`] - Matrix comparison helpers

pub mod approx;
pub mod fixtures;
pub mod scene;

// Re-export commonly used items at crate root for convenience
pub use approx::{is_orthonormal, mat4_close, relative_rotation, rotation_angle_deg, MATRIX_TOLERANCE};
pub use scene::{FakeNode, FakeScene, FakeSlice};
