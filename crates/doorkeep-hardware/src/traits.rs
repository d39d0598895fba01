//! Hardware device trait definitions.
//!
//! This module defines the two collaborator interfaces consumed by the door
//! controller: a relay actuator that simulates a momentary button press, and
//! a binary position sensor sampled after the door has finished moving.
//!
//! Both traits take `&self` because a single relay board or sensor bus is
//! shared by every configured door. Methods return `impl Future + Send` so
//! that operations can run inside spawned Tokio tasks; implementors may still
//! write plain `async fn` in their `impl` blocks.

use std::future::Future;
use std::time::Duration;

use doorkeep_core::{DoorPosition, RelayChannel, SensorId};

use crate::error::Result;

/// Relay actuator abstraction.
///
/// A relay channel is wired in parallel with a door opener's wall button.
/// Each pulse toggles the door's physical state; the actuator itself has no
/// notion of "open" or "closed".
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use doorkeep_core::{DoorPosition, RelayChannel, SensorId};
/// use doorkeep_hardware::mock::MockDoorBench;
/// use doorkeep_hardware::traits::RelayActuator;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> doorkeep_hardware::Result<()> {
///     let (relay, _sensor, handle) = MockDoorBench::new();
///     handle.add_door(RelayChannel::new(1), SensorId::new(1), DoorPosition::Closed);
///
///     relay.pulse(RelayChannel::new(1), Duration::from_millis(1)).await?;
///     assert_eq!(handle.pulse_count(RelayChannel::new(1)), 1);
///     Ok(())
/// }
/// ```
pub trait RelayActuator: Send + Sync {
    /// Drive the relay coil of `channel` high (`true`) or low (`false`).
    ///
    /// # Errors
    ///
    /// Returns an error if the channel does not exist or the bus write fails.
    fn set_asserted(
        &self,
        channel: RelayChannel,
        asserted: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Perform one pulse: assert, hold for `hold`, release.
    ///
    /// The settle pause that lets the mechanism finish moving is the
    /// caller's concern.
    ///
    /// # Errors
    ///
    /// Returns the first error from asserting or releasing the relay.
    fn pulse(
        &self,
        channel: RelayChannel,
        hold: Duration,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.set_asserted(channel, true).await?;
            tokio::time::sleep(hold).await;
            self.set_asserted(channel, false).await
        }
    }
}

/// Binary position sensor abstraction.
///
/// Typically a reed switch on the door track; reports only whether the door
/// is fully open or closed.
pub trait PositionSensor: Send + Sync {
    /// Sample the sensor at `sensor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor does not exist or cannot be read.
    fn read_position(&self, sensor: SensorId)
    -> impl Future<Output = Result<DoorPosition>> + Send;
}
