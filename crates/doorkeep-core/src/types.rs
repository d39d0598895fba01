use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relay board channel driving one door's actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelayChannel(u8);

impl RelayChannel {
    #[must_use]
    pub const fn new(channel: u8) -> Self {
        RelayChannel(channel)
    }

    /// Get the raw channel number.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for RelayChannel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "relay#{}", self.0)
    }
}

/// Address of a binary position sensor (reed switch input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(u8);

impl SensorId {
    #[must_use]
    pub const fn new(id: u8) -> Self {
        SensorId(id)
    }

    /// Get the raw sensor address.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "sensor#{}", self.0)
    }
}

/// Physical position as reported by a position sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorPosition {
    Open,
    Closed,
}

impl DoorPosition {
    /// The position one relay pulse moves the door to.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            DoorPosition::Open => DoorPosition::Closed,
            DoorPosition::Closed => DoorPosition::Open,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DoorPosition::Open => "open",
            DoorPosition::Closed => "closed",
        }
    }
}

impl fmt::Display for DoorPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally observable state of a door, as answered by a state query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Open,
    Closed,
    /// An operation is in flight; the true state is known once it completes.
    Indeterminate,
    /// The door has no position sensor.
    Unknown,
}

impl DoorState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DoorState::Open => "open",
            DoorState::Closed => "closed",
            DoorState::Indeterminate => "indeterminate",
            DoorState::Unknown => "unknown",
        }
    }
}

impl From<DoorPosition> for DoorState {
    fn from(position: DoorPosition) -> Self {
        match position {
            DoorPosition::Open => DoorState::Open,
            DoorPosition::Closed => DoorState::Closed,
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target state accepted by a transition command.
///
/// `Unknown` forces a single pulse regardless of any sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    Open,
    Closed,
    Unknown,
}

impl DesiredState {
    /// Target position to reconcile towards, `None` for a forced pulse.
    #[must_use]
    pub fn position(&self) -> Option<DoorPosition> {
        match self {
            DesiredState::Open => Some(DoorPosition::Open),
            DesiredState::Closed => Some(DoorPosition::Closed),
            DesiredState::Unknown => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DesiredState::Open => "open",
            DesiredState::Closed => "closed",
            DesiredState::Unknown => "unknown",
        }
    }
}

impl From<DoorPosition> for DesiredState {
    fn from(position: DoorPosition) -> Self {
        match position {
            DoorPosition::Open => DesiredState::Open,
            DoorPosition::Closed => DesiredState::Closed,
        }
    }
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DesiredState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(DesiredState::Open),
            "closed" => Ok(DesiredState::Closed),
            "unknown" => Ok(DesiredState::Unknown),
            _ => Err(Error::BadRequest(format!(
                "Unrecognized desired state: {s:?} (expected open, closed or unknown)"
            ))),
        }
    }
}
