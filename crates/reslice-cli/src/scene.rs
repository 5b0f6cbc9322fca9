// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory scene built from a replay script.

use std::collections::BTreeMap;

use reslice_core::{DriverEvent, DriverNode, NodeId, NodeLookup, ScenePort, SliceId};
use reslice_math::Mat4;
use tracing::{debug, trace};

#[derive(Debug)]
enum DocumentNode {
    Driver(DriverNode),
    Unsupported,
}

/// Stored state of one slice.
#[derive(Debug, Default)]
pub struct SliceState {
    pub attributes: BTreeMap<String, String>,
    pub slice_to_world: Mat4,
    pub commits: usize,
    pub notifications: usize,
}

/// Scene document: nodes, slices and live subscriptions.
#[derive(Debug, Default)]
pub struct DocumentScene {
    nodes: BTreeMap<NodeId, DocumentNode>,
    slices: BTreeMap<SliceId, SliceState>,
    subscriptions: BTreeMap<NodeId, Vec<DriverEvent>>,
}

impl DocumentScene {
    pub fn add_slice(&mut self, id: SliceId) -> &mut SliceState {
        self.slices.entry(id).or_default()
    }

    pub fn insert_driver(&mut self, id: NodeId, node: DriverNode) {
        self.nodes.insert(id, DocumentNode::Driver(node));
    }

    pub fn insert_unsupported(&mut self, id: NodeId) {
        self.nodes.insert(id, DocumentNode::Unsupported);
    }

    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        self.nodes.remove(id).is_some()
    }

    pub fn slices(&self) -> impl Iterator<Item = (&SliceId, &SliceState)> {
        self.slices.iter()
    }

    /// Nodes with a live subscription.
    pub fn subscribed(&self) -> impl Iterator<Item = &NodeId> {
        self.subscriptions.keys()
    }
}

impl ScenePort for DocumentScene {
    fn lookup_node(&self, id: &NodeId) -> NodeLookup {
        match self.nodes.get(id) {
            None => NodeLookup::Missing,
            Some(DocumentNode::Unsupported) => NodeLookup::Unsupported,
            Some(DocumentNode::Driver(node)) => NodeLookup::Driver(node.clone()),
        }
    }

    fn subscribe(&mut self, id: &NodeId, events: &[DriverEvent]) {
        trace!(node = %id, ?events, "subscribe");
        self.subscriptions.insert(id.clone(), events.to_vec());
    }

    fn unsubscribe(&mut self, id: &NodeId) {
        trace!(node = %id, "unsubscribe");
        self.subscriptions.remove(id);
    }

    fn slice_ids(&self) -> Vec<SliceId> {
        self.slices.keys().cloned().collect()
    }

    fn contains_slice(&self, slice: &SliceId) -> bool {
        self.slices.contains_key(slice)
    }

    fn slice_attribute(&self, slice: &SliceId, key: &str) -> Option<String> {
        self.slices
            .get(slice)
            .and_then(|s| s.attributes.get(key))
            .cloned()
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
            s.commits += 1;
        }
    }

    fn notify_slice_modified(&mut self, slice: &SliceId) {
        if let Some(s) = self.slices.get_mut(slice) {
            s.notifications += 1;
            debug!(%slice, "slice modified");
        }
    }
}
