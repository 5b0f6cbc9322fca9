// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dispatcher: configuration calls, change notifications, and the
//! extract → orthonormalize → compose → commit pipeline.
//!
//! All work happens inline on the calling thread. A start/end modify counter
//! defers slice "changed" notifications until the outermost call returns, so
//! a multi-step operation emits each notification once.

use reslice_math::Mat4;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::{
    format_flip, format_mode, format_rotation, SliceConfig, DRIVER_ATTRIBUTE, FLIP_ATTRIBUTE,
    MODE_ATTRIBUTE, ROTATION_ATTRIBUTE,
};
use crate::driver::{DriverEvent, DriverNode};
use crate::ident::{NodeId, SliceId};
use crate::mode::{compose, SliceMode};
use crate::orthonormal::orthonormalize;
use crate::pose::extract_pose;
use crate::registry::DriverRegistry;
use crate::scene::{SceneEvent, ScenePort};

/// Caller misuse of the configuration API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResliceError {
    /// The slice id names no slice node in the scene.
    #[error("unknown slice: {0}")]
    UnknownSlice(SliceId),
    /// Rotation must be a finite number of degrees.
    #[error("rotation is not finite: {0}")]
    NonFiniteRotation(f64),
}

/// What a recomputation did to one slice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SliceUpdate {
    /// A new slice-to-world matrix was committed.
    Committed(Mat4),
    /// Mode is [`SliceMode::None`]; the slice keeps its pose.
    Unchanged,
    /// The driver has no usable pose yet; the slice keeps its pose.
    NoPose,
    /// The driver no longer resolves; the slice was detached.
    DriverInvalid,
    /// The slice has no driver.
    Unbound,
}

impl SliceUpdate {
    /// The committed matrix, if any.
    pub fn committed(&self) -> Option<&Mat4> {
        match self {
            Self::Committed(m) => Some(m),
            _ => None,
        }
    }
}

/// Outcome of [`ResliceLogic::set_driver_for_slice`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DriverAssignment {
    /// The slice now follows the driver.
    Bound {
        /// `true` if this call created the driver's subscription.
        subscribed: bool,
        /// Result of the immediate recomputation.
        update: SliceUpdate,
    },
    /// No valid driver was given; any previous binding was cleared.
    Detached,
}

/// Per-slice outcome inside a [`DispatchReport`].
#[derive(Clone, Debug, PartialEq)]
pub struct SliceOutcome {
    /// The slice.
    pub slice: SliceId,
    /// What happened to it.
    pub update: SliceUpdate,
}

/// Per-slice outcomes of one notification, in bind order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispatchReport {
    /// One entry per slice touched.
    pub outcomes: Vec<SliceOutcome>,
}

impl DispatchReport {
    /// Number of slices whose matrix was committed.
    pub fn committed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.update, SliceUpdate::Committed(_)))
            .count()
    }

    /// `true` if no slice was touched.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn push(&mut self, slice: SliceId, update: SliceUpdate) {
        self.outcomes.push(SliceOutcome { slice, update });
    }
}

/// Reslice logic for one attached scene.
///
/// Owns the [`DriverRegistry`]; nothing else writes bindings or
/// subscriptions.
#[derive(Debug)]
pub struct ResliceLogic<S: ScenePort> {
    scene: S,
    registry: DriverRegistry,
    modify_depth: u32,
    pending_slices: Vec<SliceId>,
    registry_dirty: bool,
}

impl<S: ScenePort> ResliceLogic<S> {
    /// Attaches to `scene` and restores bindings from persisted attributes.
    pub fn attach(scene: S) -> Self {
        let mut logic = Self {
            scene,
            registry: DriverRegistry::new(),
            modify_depth: 0,
            pending_slices: Vec::new(),
            registry_dirty: false,
        };
        logic.rescan_scene();
        logic
    }

    /// Releases every subscription and hands the scene back.
    pub fn detach(mut self) -> S {
        self.clear_all();
        self.scene
    }

    /// The attached scene.
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Mutable access to the attached scene.
    ///
    /// Changes made here are not observed until the scene reports them
    /// through [`Self::handle_driver_event`] or [`Self::handle_scene_event`].
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    /// Current bindings and subscriptions.
    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Configuration currently in effect for `slice`.
    pub fn slice_config(&self, slice: &SliceId) -> SliceConfig {
        self.registry
            .binding(slice)
            .map_or_else(|| self.persisted_config(slice), |b| b.config)
    }

    /// Binds `slice` to `driver`, or detaches it when `driver` is `None` or
    /// does not resolve to a supported node.
    ///
    /// A successful bind persists the driver attribute, subscribes to the
    /// driver if no other slice already does, and recomputes the slice.
    ///
    /// # Errors
    /// [`ResliceError::UnknownSlice`] if `slice` is not in the scene.
    pub fn set_driver_for_slice(
        &mut self,
        driver: Option<&NodeId>,
        slice: &SliceId,
    ) -> Result<DriverAssignment, ResliceError> {
        self.ensure_slice(slice)?;
        let resolved = driver.and_then(|id| {
            self.scene
                .lookup_node(id)
                .into_driver()
                .map(|node| (id.clone(), node))
        });

        self.start_modify();
        let assignment = match resolved {
            None => {
                if let Some(id) = driver {
                    debug!(%slice, driver = %id, "driver does not resolve; detaching slice");
                }
                self.detach_slice(slice);
                DriverAssignment::Detached
            }
            Some((id, node)) => {
                let seed = self.persisted_config(slice);
                self.registry.ensure_record(slice, seed);
                let previous = self.registry.bind(slice, id.clone());
                self.scene
                    .set_slice_attribute(slice, DRIVER_ATTRIBUTE, id.as_str());
                let subscribed = self.observe(&id, &node);
                if let Some(previous) = previous.filter(|p| p != &id) {
                    self.release_if_unreferenced(&previous);
                }
                self.registry_dirty = true;
                DriverAssignment::Bound {
                    subscribed,
                    update: self.update_slice(slice),
                }
            }
        };
        self.end_modify();
        Ok(assignment)
    }

    /// Sets the mode of `slice` and recomputes it if bound.
    ///
    /// # Errors
    /// [`ResliceError::UnknownSlice`] if `slice` is not in the scene.
    pub fn set_mode_for_slice(
        &mut self,
        mode: SliceMode,
        slice: &SliceId,
    ) -> Result<SliceUpdate, ResliceError> {
        self.configure(slice, |config| {
            config.mode = mode;
            (MODE_ATTRIBUTE, format_mode(mode))
        })
    }

    /// Sets the in-plane rotation of `slice` and recomputes it if bound.
    ///
    /// # Errors
    /// [`ResliceError::UnknownSlice`] if `slice` is not in the scene, or
    /// [`ResliceError::NonFiniteRotation`] for NaN or infinite input.
    pub fn set_rotation_for_slice(
        &mut self,
        rotation_deg: f64,
        slice: &SliceId,
    ) -> Result<SliceUpdate, ResliceError> {
        if !rotation_deg.is_finite() {
            return Err(ResliceError::NonFiniteRotation(rotation_deg));
        }
        self.configure(slice, |config| {
            config.rotation_deg = rotation_deg;
            (ROTATION_ATTRIBUTE, format_rotation(rotation_deg))
        })
    }

    /// Sets the flip flag of `slice` and recomputes it if bound.
    ///
    /// # Errors
    /// [`ResliceError::UnknownSlice`] if `slice` is not in the scene.
    pub fn set_flip_for_slice(
        &mut self,
        flip: bool,
        slice: &SliceId,
    ) -> Result<SliceUpdate, ResliceError> {
        self.configure(slice, |config| {
            config.flip = flip;
            (FLIP_ATTRIBUTE, format_flip(flip))
        })
    }

    /// Re-derives every binding from persisted slice attributes.
    ///
    /// Subscribes to newly referenced drivers and releases drivers no slice
    /// references any more. Slices are not recomputed; that happens on the
    /// next notification or configuration write.
    pub fn rescan_scene(&mut self) {
        self.start_modify();
        let slices = self.scene.slice_ids();
        self.registry.retain_slices(|s| slices.contains(s));

        for slice in &slices {
            let config = self.persisted_config(slice);
            self.registry.ensure_record(slice, config).config = config;

            let wanted = self
                .scene
                .slice_attribute(slice, DRIVER_ATTRIBUTE)
                .map(NodeId::from);
            let resolved = wanted.as_ref().and_then(|id| {
                self.scene
                    .lookup_node(id)
                    .into_driver()
                    .map(|node| (id.clone(), node))
            });
            match resolved {
                Some((id, node)) => {
                    self.registry.bind(slice, id.clone());
                    self.observe(&id, &node);
                }
                None => {
                    if let Some(id) = wanted {
                        debug!(%slice, driver = %id, "persisted driver not present yet");
                    }
                    self.registry.unbind(slice);
                }
            }
        }

        let stale: Vec<NodeId> = self
            .registry
            .subscriptions()
            .iter()
            .filter(|s| !self.registry.is_referenced(&s.driver))
            .map(|s| s.driver.clone())
            .collect();
        for id in &stale {
            self.release(id);
        }

        self.registry_dirty = true;
        self.end_modify();
    }

    /// Handles a change notification from an observed driver.
    ///
    /// Every slice bound to `driver` is recomputed, in bind order.
    /// Notifications from drivers or for events that are not observed are
    /// ignored.
    pub fn handle_driver_event(&mut self, driver: &NodeId, event: DriverEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        let observed = self
            .registry
            .subscriptions()
            .iter()
            .any(|s| &s.driver == driver && s.events.contains(&event));
        if !observed {
            trace!(%driver, ?event, "ignoring unobserved event");
            return report;
        }

        self.start_modify();
        for slice in self.registry.slices_driven_by(driver) {
            let update = self.update_slice(&slice);
            report.push(slice, update);
        }
        self.end_modify();
        report
    }

    /// Handles a scene lifecycle notification.
    pub fn handle_scene_event(&mut self, event: &SceneEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        self.start_modify();
        match event {
            SceneEvent::EndBatchProcess => self.rescan_scene(),
            SceneEvent::NodeRemoved(id) => {
                for slice in self.registry.slices_driven_by(id) {
                    self.detach_slice(&slice);
                    report.push(slice, SliceUpdate::DriverInvalid);
                }
                self.release(id);
            }
            SceneEvent::NodeAdded(id) => {
                if let Some(node) = self.scene.lookup_node(id).into_driver() {
                    for slice in self.scene.slice_ids() {
                        let persisted = self.scene.slice_attribute(&slice, DRIVER_ATTRIBUTE);
                        let already = self.registry.driver_of(&slice) == Some(id);
                        if persisted.as_deref() != Some(id.as_str()) || already {
                            continue;
                        }
                        let seed = self.persisted_config(&slice);
                        self.registry.ensure_record(&slice, seed);
                        let previous = self.registry.bind(&slice, id.clone());
                        self.observe(id, &node);
                        if let Some(previous) = previous.filter(|p| p != id) {
                            self.release_if_unreferenced(&previous);
                        }
                        self.registry_dirty = true;
                        let update = self.update_slice(&slice);
                        report.push(slice, update);
                    }
                }
            }
            SceneEvent::SliceRemoved(slice) => {
                if let Some(binding) = self.registry.remove_record(slice) {
                    if let Some(driver) = binding.driver {
                        self.release_if_unreferenced(&driver);
                    }
                    self.registry_dirty = true;
                }
                self.pending_slices.retain(|s| s != slice);
            }
        }
        self.end_modify();
        report
    }

    /// Releases every subscription and forgets every binding.
    pub fn clear_all(&mut self) {
        for sub in self.registry.take_subscriptions() {
            self.scene.unsubscribe(&sub.driver);
        }
        self.registry.clear_bindings();
        self.pending_slices.clear();
        self.registry_dirty = false;
        self.modify_depth = 0;
    }

    /// Runs `f` inside one modify scope; slice notifications raised by the
    /// steps in `f` are emitted once, after it returns.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.start_modify();
        let out = f(self);
        self.end_modify();
        out
    }

    fn start_modify(&mut self) {
        self.modify_depth += 1;
    }

    fn end_modify(&mut self) {
        self.modify_depth = self.modify_depth.saturating_sub(1);
        if self.modify_depth > 0 {
            return;
        }
        for slice in std::mem::take(&mut self.pending_slices) {
            if self.scene.contains_slice(&slice) {
                self.scene.notify_slice_modified(&slice);
            }
        }
        if std::mem::take(&mut self.registry_dirty) {
            self.scene.notify_registry_modified();
        }
    }

    fn ensure_slice(&self, slice: &SliceId) -> Result<(), ResliceError> {
        if self.scene.contains_slice(slice) {
            Ok(())
        } else {
            Err(ResliceError::UnknownSlice(slice.clone()))
        }
    }

    fn persisted_config(&self, slice: &SliceId) -> SliceConfig {
        let read = |key| self.scene.slice_attribute(slice, key);
        SliceConfig::from_attributes(
            read(MODE_ATTRIBUTE).as_deref(),
            read(ROTATION_ATTRIBUTE).as_deref(),
            read(FLIP_ATTRIBUTE).as_deref(),
        )
    }

    fn configure(
        &mut self,
        slice: &SliceId,
        apply: impl FnOnce(&mut SliceConfig) -> (&'static str, String),
    ) -> Result<SliceUpdate, ResliceError> {
        self.ensure_slice(slice)?;
        self.start_modify();
        let seed = self.persisted_config(slice);
        let record = self.registry.ensure_record(slice, seed);
        let (key, value) = apply(&mut record.config);
        self.scene.set_slice_attribute(slice, key, &value);
        self.registry_dirty = true;
        let update = self.update_slice(slice);
        self.end_modify();
        Ok(update)
    }

    fn update_slice(&mut self, slice: &SliceId) -> SliceUpdate {
        let Some(binding) = self.registry.binding(slice) else {
            return SliceUpdate::Unbound;
        };
        let Some(driver) = binding.driver.clone() else {
            return SliceUpdate::Unbound;
        };
        let config = binding.config;

        let Some(node) = self.scene.lookup_node(&driver).into_driver() else {
            debug!(%slice, %driver, "driver no longer resolves; detaching slice");
            self.detach_slice(slice);
            return SliceUpdate::DriverInvalid;
        };
        if config.mode == SliceMode::None {
            debug!(%slice, %driver, "mode is none; slice left in place");
            return SliceUpdate::Unchanged;
        }
        let Some(raw) = extract_pose(&node) else {
            debug!(%slice, %driver, kind = node.kind(), "driver has no pose yet");
            return SliceUpdate::NoPose;
        };

        let repaired = orthonormalize(&raw);
        if repaired.was_corrected() {
            warn!(
                %slice,
                %driver,
                kind = node.kind(),
                "driver pose is not orthonormal; using nearest orthonormal pose"
            );
        }
        let Some(slice_to_world) = compose(&repaired.pose, &config) else {
            return SliceUpdate::Unchanged;
        };

        trace!(%slice, %driver, mode = %config.mode, "committing slice pose");
        self.scene.commit_slice_to_world(slice, &slice_to_world);
        if !self.pending_slices.contains(slice) {
            self.pending_slices.push(slice.clone());
        }
        SliceUpdate::Committed(slice_to_world)
    }

    fn detach_slice(&mut self, slice: &SliceId) {
        let previous = self.registry.unbind(slice);
        self.scene.remove_slice_attribute(slice, DRIVER_ATTRIBUTE);
        if let Some(previous) = previous {
            self.release_if_unreferenced(&previous);
            self.registry_dirty = true;
        }
    }

    fn observe(&mut self, id: &NodeId, node: &DriverNode) -> bool {
        if self.registry.is_observed(id) {
            return false;
        }
        let events = node.observed_events();
        self.scene.subscribe(id, &events);
        self.registry.insert_subscription(id.clone(), events);
        debug!(driver = %id, kind = node.kind(), "observing driver");
        true
    }

    fn release_if_unreferenced(&mut self, id: &NodeId) {
        if !self.registry.is_referenced(id) {
            self.release(id);
        }
    }

    fn release(&mut self, id: &NodeId) {
        if self.registry.remove_subscription(id) {
            self.scene.unsubscribe(id);
            debug!(driver = %id, "released driver");
        }
    }
}
