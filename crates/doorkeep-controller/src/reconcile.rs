//! Reconciliation loop for doors with a position sensor.
//!
//! The relay can only toggle a door, so reaching a target takes a loop:
//! pulse, wait for the mechanism to settle, sample the sensor, and compare
//! the reading with the previous confirmed reading (`last`) and the target
//! (`desired`):
//!
//! | `last == desired` | `current == desired` | step                 |
//! |-------------------|----------------------|----------------------|
//! | yes               | no                   | repeat (pulse again) |
//! | no                | yes                  | reached              |
//! | otherwise         |                      | inconsistent         |
//!
//! `desired` may be replaced by a newer command between iterations; the
//! loop always classifies against the latest target.

use doorkeep_core::{DoorPosition, Error, Result, SensorId};
use doorkeep_hardware::{PositionSensor, RelayActuator};
use tracing::{debug, warn};

use crate::controller::Shared;
use crate::events::DoorEventKind;
use crate::registry::Door;

/// Classification of one post-pulse sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStep {
    /// The pulse undid progress (or the target moved); pulse again.
    Repeat,
    /// The door reads the target position.
    Reached,
    /// The reading contradicts the toggle model.
    Inconsistent,
}

/// Classify `current` against the previous reading and the target.
pub fn classify(last: DoorPosition, desired: DoorPosition, current: DoorPosition) -> ReconcileStep {
    match (last == desired, current == desired) {
        (true, false) => ReconcileStep::Repeat,
        (false, true) => ReconcileStep::Reached,
        _ => ReconcileStep::Inconsistent,
    }
}

impl<R: RelayActuator, S: PositionSensor> Shared<R, S> {
    /// Drive `door` until its sensor confirms the target.
    ///
    /// Must be called with the door's operation lock held and `desired`
    /// set. Samples the sensor first so the run starts from where the door
    /// is now. Returns the confirmed position.
    ///
    /// # Errors
    ///
    /// - `Error::Hardware` if a pulse or read fails
    /// - `Error::StateTransition` on an inconsistent reading
    /// - `Error::RetriesExhausted` when the configured pulse limit is hit
    pub(crate) async fn reconcile(&self, door: &Door, sensor: SensorId) -> Result<DoorPosition> {
        // Operations queued ahead of this run may have moved the door since
        // the command read it.
        let current = self.sensor.read_position(sensor).await?;
        let desired = door.resync(current).ok_or_else(|| vanished(door))?;
        if current == desired {
            debug!(door = %door.name(), %current, "Door already at target, no pulse needed");
            return Ok(current);
        }

        let mut attempts: u32 = 0;

        loop {
            if let Some(max) = self.max_attempts
                && attempts >= max
            {
                return Err(Error::RetriesExhausted {
                    door: door.name().to_string(),
                    attempts,
                });
            }

            self.pulse(door).await?;
            attempts += 1;
            self.emit(door, DoorEventKind::Pulsed);

            tokio::time::sleep(self.timing.settle_duration()).await;

            let current = self.sensor.read_position(sensor).await?;
            debug!(door = %door.name(), %current, attempts, "Sensor sampled");

            let (step, last, desired) = door.observe(current).ok_or_else(|| vanished(door))?;

            match step {
                ReconcileStep::Repeat => {
                    warn!(
                        door = %door.name(),
                        %last, %desired, %current,
                        "Repeated transition, pulsing again"
                    );
                    self.emit(door, DoorEventKind::RepeatedTransition);
                }
                ReconcileStep::Reached => return Ok(current),
                ReconcileStep::Inconsistent => {
                    return Err(Error::StateTransition {
                        door: door.name().to_string(),
                        last: last.to_string(),
                        desired: desired.to_string(),
                        current: current.to_string(),
                    });
                }
            }
        }
    }
}

fn vanished(door: &Door) -> Error {
    Error::Hardware(format!(
        "Reconciliation state of {} vanished mid-run",
        door.name()
    ))
}
