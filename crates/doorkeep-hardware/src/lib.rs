//! Hardware abstraction layer for the doorkeep door controller.
//!
//! This crate defines the two collaborators the controller consumes:
//!
//! - [`RelayActuator`]: pulses a relay channel wired across a door opener's
//!   wall button. Each pulse toggles the door; it never sets a position.
//! - [`PositionSensor`]: samples a binary open/closed sensor.
//!
//! # Design Philosophy
//!
//! - **Async-first**: operations return `Send` futures so they can run in
//!   spawned Tokio tasks.
//! - **Shared**: a relay board or sensor bus serves many doors, so all
//!   methods take `&self`.
//! - **Error-aware**: all operations return [`Result<T>`][error::Result] with
//!   a [`HardwareError`] describing the failure.
//!
//! ```no_run
//! use std::time::Duration;
//! use doorkeep_core::{DoorPosition, RelayChannel, SensorId};
//! use doorkeep_hardware::{PositionSensor, RelayActuator, Result};
//!
//! async fn toggle_and_sample<R: RelayActuator, S: PositionSensor>(
//!     relay: &R,
//!     sensor: &S,
//! ) -> Result<DoorPosition> {
//!     relay.pulse(RelayChannel::new(2), Duration::from_millis(500)).await?;
//!     tokio::time::sleep(Duration::from_secs(15)).await;
//!     sensor.read_position(SensorId::new(1)).await
//! }
//! ```
//!
//! # Mock Implementations
//!
//! The [`mock`] module simulates a relay board and reed switches wired to
//! toggling doors, for development and testing without physical hardware.
//! Low-level GPIO and I2C drivers live outside this crate.
//!
//! [`RelayActuator`]: traits::RelayActuator
//! [`PositionSensor`]: traits::PositionSensor

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;

// Re-export commonly used types for convenience
pub use devices::{AnyPositionSensor, AnyRelayActuator};
pub use error::{HardwareError, Result};
pub use traits::{PositionSensor, RelayActuator};
