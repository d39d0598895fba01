//! Door events emitted by background operations.
//!
//! Commands return before any physical work happens, so the event stream is
//! how observers (tests, a status page, a push channel) learn the outcome
//! without polling. Events are broadcast; a receiver that falls behind by
//! more than [`EVENT_CHANNEL_CAPACITY`] events loses the oldest ones.
//!
//! [`EVENT_CHANNEL_CAPACITY`]: doorkeep_core::constants::EVENT_CHANNEL_CAPACITY

use chrono::{DateTime, Utc};
use doorkeep_core::DoorPosition;
use serde::Serialize;

/// Something that happened to one door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoorEvent {
    pub door: String,
    pub kind: DoorEventKind,
    pub at: DateTime<Utc>,
}

impl DoorEvent {
    pub fn new(door: impl Into<String>, kind: DoorEventKind) -> Self {
        Self {
            door: door.into(),
            kind,
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "detail")]
#[non_exhaustive]
pub enum DoorEventKind {
    /// One relay pulse completed.
    Pulsed,
    /// The door already read the requested position; nothing was done.
    Extraneous,
    /// The last pulse did not bring the door closer to its target.
    RepeatedTransition,
    /// Reconciliation confirmed the target position.
    Reached(DoorPosition),
    /// The sensor reading contradicted the toggle model.
    TransitionFailed,
    /// Reconciliation hit the configured pulse limit.
    RetriesExhausted,
    /// A relay or sensor operation failed.
    HardwareFault(String),
    /// The background operation released the door.
    Idle,
}

impl DoorEventKind {
    /// Whether this event ends a reconciliation run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Reached(_) | Self::TransitionFailed | Self::RetriesExhausted
        )
    }
}
