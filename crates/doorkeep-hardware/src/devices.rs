//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits (RPITIT) is not object-safe, so the
//! controller cannot hold a `Box<dyn RelayActuator>`. These enums provide
//! concrete type dispatch instead, and are the default device types of the
//! door controller.
//!
//! # Examples
//!
//! ```
//! use doorkeep_hardware::devices::{AnyPositionSensor, AnyRelayActuator};
//! use doorkeep_hardware::mock::MockDoorBench;
//!
//! let (relay, sensor, _handle) = MockDoorBench::new();
//! let relay = AnyRelayActuator::Mock(relay);
//! let sensor = AnyPositionSensor::Mock(sensor);
//! ```

use doorkeep_core::{DoorPosition, RelayChannel, SensorId};

use crate::Result;
use crate::mock::{MockRelay, MockSensor};
use crate::traits::{PositionSensor, RelayActuator};

/// Enum wrapper for relay actuator dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyRelayActuator {
    /// Simulated relay board for development and testing.
    Mock(MockRelay),
    // TODO: add an I2C relay board variant behind `hardware-i2c-relay`
}

impl RelayActuator for AnyRelayActuator {
    async fn set_asserted(&self, channel: RelayChannel, asserted: bool) -> Result<()> {
        match self {
            Self::Mock(device) => device.set_asserted(channel, asserted).await,
        }
    }
}

/// Enum wrapper for position sensor dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyPositionSensor {
    /// Simulated reed switches for development and testing.
    Mock(MockSensor),
    // TODO: add a GPIO reed switch variant behind `hardware-gpio`
}

impl PositionSensor for AnyPositionSensor {
    async fn read_position(&self, sensor: SensorId) -> Result<DoorPosition> {
        match self {
            Self::Mock(device) => device.read_position(sensor).await,
        }
    }
}
