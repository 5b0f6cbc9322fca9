// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene port: the narrow contract the reslice core consumes from the scene graph.

use reslice_math::Mat4;

use crate::driver::{DriverEvent, DriverNode};
use crate::ident::{NodeId, SliceId};

/// Result of resolving a node id.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeLookup {
    /// No node with that id exists.
    Missing,
    /// The node exists but is not one of the driver variants.
    Unsupported,
    /// A driver, with its current pose-defining data.
    Driver(DriverNode),
}

impl NodeLookup {
    /// The driver snapshot, if the id resolved to one.
    pub fn into_driver(self) -> Option<DriverNode> {
        match self {
            Self::Driver(node) => Some(node),
            Self::Missing | Self::Unsupported => None,
        }
    }
}

/// Bulk scene lifecycle notifications.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SceneEvent {
    /// A node was added; slices that persisted it as their driver re-bind.
    NodeAdded(NodeId),
    /// A node is about to be removed; slices it drives are detached.
    NodeRemoved(NodeId),
    /// A slice node was removed from the scene.
    SliceRemoved(SliceId),
    /// A bulk load or import finished.
    EndBatchProcess,
}

/// Scene-graph collaborator.
///
/// Implementors own every node. The reslice core reads driver data on
/// demand, writes slice matrices and attributes, and manages its
/// subscriptions through this trait; change notifications travel the other
/// way as calls into [`crate::ResliceLogic::handle_driver_event`].
pub trait ScenePort {
    /// Resolves a node id to a driver snapshot.
    fn lookup_node(&self, id: &NodeId) -> NodeLookup;

    /// Starts delivering `events` from `id`.
    fn subscribe(&mut self, id: &NodeId, events: &[DriverEvent]);

    /// Stops delivering every event from `id`.
    fn unsubscribe(&mut self, id: &NodeId);

    /// All slice nodes currently in the scene.
    fn slice_ids(&self) -> Vec<SliceId>;

    /// `true` if the slice node exists.
    fn contains_slice(&self, slice: &SliceId) -> bool {
        self.slice_ids().contains(slice)
    }

    /// Reads a persisted slice attribute.
    fn slice_attribute(&self, slice: &SliceId, key: &str) -> Option<String>;

    /// Writes a persisted slice attribute.
    fn set_slice_attribute(&mut self, slice: &SliceId, key: &str, value: &str);

    /// Removes a persisted slice attribute.
    fn remove_slice_attribute(&mut self, slice: &SliceId, key: &str);

    /// Replaces the slice-to-world matrix without notifying observers.
    fn commit_slice_to_world(&mut self, slice: &SliceId, slice_to_world: &Mat4);

    /// Emits the slice's generic "changed" notification.
    fn notify_slice_modified(&mut self, slice: &SliceId);

    /// Emits a "reslice state changed" notification for UI listeners.
    fn notify_registry_modified(&mut self) {}
}
