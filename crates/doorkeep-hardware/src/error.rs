//! Error types for hardware operations.
//!
//! This module defines error types specific to relay and sensor I/O,
//! covering disconnected devices, unknown addresses, and bus errors.

use doorkeep_core::{RelayChannel, SensorId};

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during relay or sensor operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// No relay is wired to the requested channel.
    #[error("Unknown relay channel: {channel}")]
    UnknownChannel { channel: RelayChannel },

    /// No sensor answers at the requested address.
    #[error("Unknown sensor: {sensor}")]
    UnknownSensor { sensor: SensorId },

    /// Bus communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new unknown channel error.
    pub fn unknown_channel(channel: RelayChannel) -> Self {
        Self::UnknownChannel { channel }
    }

    /// Create a new unknown sensor error.
    pub fn unknown_sensor(sensor: SensorId) -> Self {
        Self::UnknownSensor { sensor }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }
}

impl From<HardwareError> for doorkeep_core::Error {
    fn from(error: HardwareError) -> Self {
        doorkeep_core::Error::Hardware(error.to_string())
    }
}
