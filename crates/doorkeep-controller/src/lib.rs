//! Door controller for relay-actuated gates and garage doors.
//!
//! A door opener's relay can only toggle the door, and its optional
//! position sensor is only meaningful once the door stops moving. This
//! crate reconciles a requested state (`open`/`closed`) with that hardware:
//!
//! - [`DoorRegistry`] holds the configured doors and their per-door
//!   operation lock and ephemeral control state.
//! - [`DoorController`] exposes the query/command contract
//!   ([`get_state`](DoorController::get_state),
//!   [`request_transition`](DoorController::request_transition),
//!   [`list_doors`](DoorController::list_doors)) and runs physical work in
//!   background tasks.
//! - [`reconcile`] implements the pulse/settle/read/classify loop for doors
//!   with a sensor.
//! - [`ControllerConfig`] loads doors and timing from TOML.
//!
//! Only `NotFound`, `BadRequest` and synchronous sensor failures reach the
//! caller. Everything that happens after a command returns is logged with
//! `tracing` and published as a [`DoorEvent`].

pub mod config;
pub mod controller;
pub mod events;
pub mod reconcile;
pub mod registry;

pub use config::{ControllerConfig, DoorConfig, ReconcileConfig, TimingConfig};
pub use controller::DoorController;
pub use events::{DoorEvent, DoorEventKind};
pub use registry::{Door, DoorInfo, DoorRegistry, DoorSnapshot};
