// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory scene fake for testing the reslice dispatcher.

use std::collections::BTreeMap;

use reslice_core::{DriverEvent, DriverNode, NodeId, NodeLookup, ScenePort, SliceId};
use reslice_math::Mat4;

/// A node in the fake scene.
#[derive(Clone, Debug, PartialEq)]
pub enum FakeNode {
    /// A supported driver.
    Driver(DriverNode),
    /// A node of some other kind (e.g. a model or a table).
    Unsupported,
}

/// One slice plane in the fake scene.
#[derive(Clone, Debug, PartialEq)]
pub struct FakeSlice {
    /// Persisted string attributes.
    pub attributes: BTreeMap<String, String>,
    /// Last committed slice-to-world matrix.
    pub slice_to_world: Mat4,
    /// Number of commits received.
    pub commit_count: usize,
    /// Number of "slice changed" notifications received.
    pub modified_count: usize,
}

impl Default for FakeSlice {
    fn default() -> Self {
        Self {
            attributes: BTreeMap::new(),
            slice_to_world: Mat4::identity(),
            commit_count: 0,
            modified_count: 0,
        }
    }
}

/// In-memory implementation of [`ScenePort`] for testing.
///
/// Nodes and slices live in ordered maps. Every port call that matters for
/// the subscription and notification invariants is counted.
///
/// # Example
///
/// ```
/// use reslice_core::{NodeId, ResliceLogic, SliceId, SliceMode};
/// use reslice_dry_tests::{fixtures, FakeScene};
///
/// let scene = FakeScene::new()
///     .with_slice("Red")
///     .with_slice("Green")
///     .with_driver("Frame", fixtures::translated_frame(1.0, 2.0, 3.0));
/// let mut logic = ResliceLogic::attach(scene);
/// let frame = NodeId::new("Frame");
/// for name in ["Red", "Green"] {
///     let slice = SliceId::new(name);
///     logic.set_mode_for_slice(SliceMode::Axial, &slice).unwrap();
///     logic.set_driver_for_slice(Some(&frame), &slice).unwrap();
/// }
/// assert_eq!(logic.scene().subscription_count(), 1);
/// assert_eq!(logic.scene().subscribe_calls(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct FakeScene {
    nodes: BTreeMap<NodeId, FakeNode>,
    slices: BTreeMap<SliceId, FakeSlice>,
    subscriptions: BTreeMap<NodeId, Vec<DriverEvent>>,
    subscribe_calls: usize,
    unsubscribe_calls: usize,
    registry_notifications: usize,
}

impl FakeScene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a slice with no attributes.
    pub fn with_slice(mut self, id: &str) -> Self {
        self.add_slice(SliceId::new(id));
        self
    }

    /// Builder: add a driver node.
    pub fn with_driver(mut self, id: &str, node: impl Into<DriverNode>) -> Self {
        self.insert_driver(NodeId::new(id), node);
        self
    }

    /// Builder: add a node that is not a driver.
    pub fn with_unsupported(mut self, id: &str) -> Self {
        self.nodes.insert(NodeId::new(id), FakeNode::Unsupported);
        self
    }

    /// Builder: pre-populate a persisted slice attribute.
    pub fn with_attribute(mut self, slice: &str, key: &str, value: &str) -> Self {
        self.slices
            .entry(SliceId::new(slice))
            .or_default()
            .attributes
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Add a slice; an existing slice is left untouched.
    pub fn add_slice(&mut self, id: SliceId) {
        self.slices.entry(id).or_default();
    }

    /// Remove a slice and everything stored on it.
    pub fn remove_slice(&mut self, id: &SliceId) -> Option<FakeSlice> {
        self.slices.remove(id)
    }

    /// Insert or replace a driver node.
    pub fn insert_driver(&mut self, id: NodeId, node: impl Into<DriverNode>) {
        self.nodes.insert(id, FakeNode::Driver(node.into()));
    }

    /// Remove a node; its subscription, if any, is left for the logic to release.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<FakeNode> {
        self.nodes.remove(id)
    }

    /// Mutable access to a driver's data.
    pub fn driver_mut(&mut self, id: &NodeId) -> Option<&mut DriverNode> {
        match self.nodes.get_mut(id) {
            Some(FakeNode::Driver(node)) => Some(node),
            _ => None,
        }
    }

    /// The stored slice, if present.
    pub fn slice(&self, id: &SliceId) -> Option<&FakeSlice> {
        self.slices.get(id)
    }

    /// Last committed matrix of a slice.
    pub fn slice_to_world(&self, id: &SliceId) -> Option<Mat4> {
        self.slices.get(id).map(|s| s.slice_to_world)
    }

    /// Overwrite a slice's matrix directly (as a user interaction would).
    pub fn set_slice_to_world(&mut self, id: &SliceId, m: Mat4) {
        if let Some(slice) = self.slices.get_mut(id) {
            slice.slice_to_world = m;
        }
    }

    /// A persisted slice attribute.
    pub fn attribute(&self, slice: &SliceId, key: &str) -> Option<&str> {
        self.slices
            .get(slice)
            .and_then(|s| s.attributes.get(key))
            .map(String::as_str)
    }

    /// Number of commits a slice has received.
    pub fn commit_count(&self, slice: &SliceId) -> usize {
        self.slices.get(slice).map_or(0, |s| s.commit_count)
    }

    /// Number of "slice changed" notifications a slice has received.
    pub fn modified_count(&self, slice: &SliceId) -> usize {
        self.slices.get(slice).map_or(0, |s| s.modified_count)
    }

    /// Number of nodes currently subscribed to.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// `true` if `id` is currently subscribed to.
    pub fn is_subscribed(&self, id: &NodeId) -> bool {
        self.subscriptions.contains_key(id)
    }

    /// Events requested by the live subscription to `id`.
    pub fn subscribed_events(&self, id: &NodeId) -> Option<&[DriverEvent]> {
        self.subscriptions.get(id).map(Vec::as_slice)
    }

    /// Total number of `subscribe` calls.
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls
    }

    /// Total number of `unsubscribe` calls.
    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls
    }

    /// Number of "reslice state changed" notifications.
    pub fn registry_notifications(&self) -> usize {
        self.registry_notifications
    }
}

impl ScenePort for FakeScene {
    fn lookup_node(&self, id: &NodeId) -> NodeLookup {
        match self.nodes.get(id) {
            None => NodeLookup::Missing,
            Some(FakeNode::Unsupported) => NodeLookup::Unsupported,
            Some(FakeNode::Driver(node)) => NodeLookup::Driver(node.clone()),
        }
    }

    fn subscribe(&mut self, id: &NodeId, events: &[DriverEvent]) {
        self.subscribe_calls += 1;
        self.subscriptions.insert(id.clone(), events.to_vec());
    }

    fn unsubscribe(&mut self, id: &NodeId) {
        self.unsubscribe_calls += 1;
        self.subscriptions.remove(id);
    }

    fn slice_ids(&self) -> Vec<SliceId> {
        self.slices.keys().cloned().collect()
    }

    fn contains_slice(&self, slice: &SliceId) -> bool {
        self.slices.contains_key(slice)
    }

    fn slice_attribute(&self, slice: &SliceId, key: &str) -> Option<String> {
        self.attribute(slice, key).map(str::to_string)
    }

    fn set_slice_attribute(&mut self, slice: &SliceId, key: &str, value: &str) {
        if let Some(s) = self.slices.get_mut(slice) {
            s.attributes.insert(key.to_string(), value.to_string());
        }
    }

    fn remove_slice_attribute(&mut self, slice: &SliceId, key: &str) {
        if let Some(s) = self.slices.get_mut(slice) {
            s.attributes.remove(key);
        }
    }

    fn commit_slice_to_world(&mut self, slice: &SliceId, slice_to_world: &Mat4) {
        if let Some(s) = self.slices.get_mut(slice) {
            s.slice_to_world = *slice_to_world;
            s.commit_count += 1;
        }
    }

    fn notify_slice_modified(&mut self, slice: &SliceId) {
        if let Some(s) = self.slices.get_mut(slice) {
            s.modified_count += 1;
        }
    }

    fn notify_registry_modified(&mut self) {
        self.registry_notifications += 1;
    }
}
