//! Configured doors and their per-door control state.
//!
//! Each [`Door`] couples immutable wiring (relay channel, optional sensor)
//! with two synchronization layers:
//!
//! - an async `operation` lock held by a background task for one whole
//!   pulse or reconciliation run, so operations on the same door never
//!   overlap;
//! - a short-lived `control` mutex guarding the ephemeral fields that
//!   queries read and commands update without waiting for the operation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use doorkeep_core::{DoorPosition, Error, RelayChannel, Result, SensorId};
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;

use crate::config::DoorConfig;
use crate::reconcile::{ReconcileStep, classify};

/// Static description of a configured door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoorInfo {
    pub name: String,
    pub relay_channel: RelayChannel,
    pub sensor: Option<SensorId>,
}

/// Ephemeral control fields of a door, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DoorSnapshot {
    /// A sensorless (or forced) pulse is queued or running.
    pub transitioning: bool,
    /// Target of the running reconciliation.
    pub desired: Option<DoorPosition>,
    /// Previous confirmed reading of the running reconciliation.
    pub last: Option<DoorPosition>,
}

#[derive(Debug, Default)]
struct ControlState {
    /// Single-pulse operations spawned and not yet finished.
    pending_pulses: u32,
    desired: Option<DoorPosition>,
    last: Option<DoorPosition>,
}

/// Result of trying to start a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Begin {
    /// No run was active; the caller must spawn one.
    Started,
    /// A run was already active; its target was replaced.
    Retargeted,
    /// The door already reads the requested position.
    Extraneous,
}

/// One physical door.
#[derive(Debug)]
pub struct Door {
    info: DoorInfo,
    operation: AsyncMutex<()>,
    control: Mutex<ControlState>,
}

impl Door {
    fn new(config: &DoorConfig) -> Self {
        Self {
            info: DoorInfo {
                name: config.name.clone(),
                relay_channel: config.relay_channel,
                sensor: config.sensor,
            },
            operation: AsyncMutex::new(()),
            control: Mutex::new(ControlState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn relay_channel(&self) -> RelayChannel {
        self.info.relay_channel
    }

    pub fn sensor(&self) -> Option<SensorId> {
        self.info.sensor
    }

    pub fn info(&self) -> &DoorInfo {
        &self.info
    }

    pub fn snapshot(&self) -> DoorSnapshot {
        let control = self.control();
        DoorSnapshot {
            transitioning: control.pending_pulses > 0,
            desired: control.desired,
            last: control.last,
        }
    }

    /// Exclusive right to drive the door's relay.
    pub(crate) fn operation(&self) -> &AsyncMutex<()> {
        &self.operation
    }

    fn control(&self) -> MutexGuard<'_, ControlState> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn begin_pulse(&self) {
        self.control().pending_pulses += 1;
    }

    pub(crate) fn end_pulse(&self) {
        let mut control = self.control();
        control.pending_pulses = control.pending_pulses.saturating_sub(1);
    }

    /// Replace the target of an active reconciliation.
    ///
    /// Returns `false` when no reconciliation is active.
    pub(crate) fn retarget(&self, target: DoorPosition) -> bool {
        let mut control = self.control();
        match control.desired.as_mut() {
            Some(desired) => {
                *desired = target;
                true
            }
            None => false,
        }
    }

    /// Decide, atomically, whether a reconciliation towards `target` must
    /// start given the freshly read `current` position.
    pub(crate) fn begin_reconciliation(
        &self,
        target: DoorPosition,
        current: DoorPosition,
    ) -> Begin {
        let mut control = self.control();
        if let Some(desired) = control.desired.as_mut() {
            *desired = target;
            return Begin::Retargeted;
        }
        // A queued forced pulse will move the door after `current` was read.
        if current == target && control.pending_pulses == 0 {
            return Begin::Extraneous;
        }
        control.desired = Some(target);
        control.last = Some(current);
        Begin::Started
    }

    /// Restart the active run from `current`, read with the operation lock
    /// held. Returns the target, or `None` if no reconciliation is active.
    pub(crate) fn resync(&self, current: DoorPosition) -> Option<DoorPosition> {
        let mut control = self.control();
        let desired = control.desired?;
        control.last = Some(current);
        Some(desired)
    }

    /// Classify a post-pulse reading against the stored `last` and
    /// `desired`, recording it as the new `last` when another pulse follows.
    ///
    /// Returns `None` if no reconciliation is active.
    pub(crate) fn observe(
        &self,
        current: DoorPosition,
    ) -> Option<(ReconcileStep, DoorPosition, DoorPosition)> {
        let mut control = self.control();
        let (last, desired) = (control.last?, control.desired?);
        let step = classify(last, desired, current);
        if step == ReconcileStep::Repeat {
            control.last = Some(current);
        }
        Some((step, last, desired))
    }

    pub(crate) fn end_reconciliation(&self) {
        let mut control = self.control();
        control.desired = None;
        control.last = None;
    }
}

/// The set of configured doors, in configuration order.
#[derive(Debug)]
pub struct DoorRegistry {
    doors: Vec<Arc<Door>>,
    index: HashMap<String, usize>,
}

impl DoorRegistry {
    /// Build the registry from door configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if two doors share a name.
    pub fn new(configs: &[DoorConfig]) -> Result<Self> {
        let mut doors = Vec::with_capacity(configs.len());
        let mut index = HashMap::with_capacity(configs.len());

        for config in configs {
            if index.insert(config.name.clone(), doors.len()).is_some() {
                return Err(Error::Config(format!(
                    "duplicate door name: {}",
                    config.name
                )));
            }
            doors.push(Arc::new(Door::new(config)));
        }

        Ok(Self { doors, index })
    }

    /// Look up a door by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unregistered name.
    pub fn get(&self, name: &str) -> Result<&Arc<Door>> {
        self.index
            .get(name)
            .map(|&i| &self.doors[i])
            .ok_or_else(|| Error::not_found(name))
    }

    /// Door names in configuration order.
    pub fn list_doors(&self) -> Vec<&str> {
        self.doors.iter().map(|door| door.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.doors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }
}
