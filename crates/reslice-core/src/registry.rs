// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Driver registry: slice bindings and the deduplicated subscription set.
//!
//! The registry is pure bookkeeping. It never talks to the scene; the
//! dispatcher in [`crate::logic`] pairs each registry change with the
//! matching scene call.

use std::fmt;

use crate::config::SliceConfig;
use crate::driver::DriverEvent;
use crate::ident::{NodeId, SliceId};

/// One slice's driver and display configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverBinding {
    /// The slice being driven.
    pub slice: SliceId,
    /// Active driver, if any.
    pub driver: Option<NodeId>,
    /// Display configuration; kept even while no driver is bound.
    pub config: SliceConfig,
}

/// A live subscription to one driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    /// Observed node.
    pub driver: NodeId,
    /// Events requested when subscribing.
    pub events: Vec<DriverEvent>,
}

/// Bindings in bind order plus one subscription per observed driver.
#[derive(Clone, Debug, Default)]
pub struct DriverRegistry {
    bindings: Vec<DriverBinding>,
    subscriptions: Vec<Subscription>,
}

impl DriverRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `slice`, if one exists.
    pub fn binding(&self, slice: &SliceId) -> Option<&DriverBinding> {
        self.bindings.iter().find(|b| &b.slice == slice)
    }

    fn binding_mut(&mut self, slice: &SliceId) -> Option<&mut DriverBinding> {
        self.bindings.iter_mut().find(|b| &b.slice == slice)
    }

    /// Record for `slice`, created unbound with `seed` if absent.
    pub fn ensure_record(&mut self, slice: &SliceId, seed: SliceConfig) -> &mut DriverBinding {
        let index = match self.bindings.iter().position(|b| &b.slice == slice) {
            Some(index) => index,
            None => {
                self.bindings.push(DriverBinding {
                    slice: slice.clone(),
                    driver: None,
                    config: seed,
                });
                self.bindings.len() - 1
            }
        };
        &mut self.bindings[index]
    }

    /// Binds `slice` to `driver`; returns the previous driver.
    ///
    /// A slice that changes driver moves to the end of the bind order. A
    /// record created here keeps the default configuration.
    pub fn bind(&mut self, slice: &SliceId, driver: NodeId) -> Option<NodeId> {
        let mut record = match self.bindings.iter().position(|b| &b.slice == slice) {
            Some(index) if self.bindings[index].driver.as_ref() == Some(&driver) => {
                return Some(driver);
            }
            Some(index) => self.bindings.remove(index),
            None => DriverBinding {
                slice: slice.clone(),
                driver: None,
                config: SliceConfig::default(),
            },
        };
        let previous = record.driver.replace(driver);
        self.bindings.push(record);
        previous
    }

    /// Clears the driver of `slice`, keeping its configuration; returns the
    /// previous driver.
    pub fn unbind(&mut self, slice: &SliceId) -> Option<NodeId> {
        self.binding_mut(slice).and_then(|b| b.driver.take())
    }

    /// Active driver of `slice`.
    pub fn driver_of(&self, slice: &SliceId) -> Option<&NodeId> {
        self.binding(slice).and_then(|b| b.driver.as_ref())
    }

    /// Slices bound to `driver`, in bind order.
    pub fn slices_driven_by(&self, driver: &NodeId) -> Vec<SliceId> {
        self.bindings
            .iter()
            .filter(|b| b.driver.as_ref() == Some(driver))
            .map(|b| b.slice.clone())
            .collect()
    }

    /// `true` if any slice is bound to `driver`.
    pub fn is_referenced(&self, driver: &NodeId) -> bool {
        self.bindings
            .iter()
            .any(|b| b.driver.as_ref() == Some(driver))
    }

    /// `true` if `driver` has a live subscription.
    pub fn is_observed(&self, driver: &NodeId) -> bool {
        self.subscriptions.iter().any(|s| &s.driver == driver)
    }

    /// Records a subscription; `false` if `driver` was already observed.
    pub fn insert_subscription(&mut self, driver: NodeId, events: Vec<DriverEvent>) -> bool {
        if self.is_observed(&driver) {
            return false;
        }
        self.subscriptions.push(Subscription { driver, events });
        true
    }

    /// Forgets the subscription to `driver`; `false` if there was none.
    pub fn remove_subscription(&mut self, driver: &NodeId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| &s.driver != driver);
        self.subscriptions.len() != before
    }

    /// Drains every subscription.
    pub fn take_subscriptions(&mut self) -> Vec<Subscription> {
        std::mem::take(&mut self.subscriptions)
    }

    /// Drops the whole record of `slice`.
    pub fn remove_record(&mut self, slice: &SliceId) -> Option<DriverBinding> {
        let index = self.bindings.iter().position(|b| &b.slice == slice)?;
        Some(self.bindings.remove(index))
    }

    /// Keeps only records whose slice satisfies `keep`.
    pub fn retain_slices(&mut self, mut keep: impl FnMut(&SliceId) -> bool) {
        self.bindings.retain(|b| keep(&b.slice));
    }

    /// Drops every record.
    pub fn clear_bindings(&mut self) {
        self.bindings.clear();
    }

    /// Number of distinct observed drivers.
    pub fn observed_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// All records in bind order.
    pub fn bindings(&self) -> &[DriverBinding] {
        &self.bindings
    }

    /// All live subscriptions.
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }
}

impl fmt::Display for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of observed nodes: {}", self.subscriptions.len())?;
        if !self.subscriptions.is_empty() {
            writeln!(f, "Observed nodes:")?;
            for sub in &self.subscriptions {
                writeln!(f, "  {}", sub.driver)?;
            }
        }
        Ok(())
    }
}
