//! Door controller: the command/query contract over the door registry.
//!
//! # Architecture
//!
//! Queries and commands run on the caller's task and never wait for a
//! door's operation lock. Physical work is handed to a spawned Tokio task
//! that holds the door's lock for its whole run:
//!
//! ```text
//! request_transition ──► decide ──► spawn ──► [door lock] pulse ─► settle ─► read ─► classify
//!        │                                          ▲                                    │
//!        └── returns get_state snapshot             └────────── repeat ◄─────────────────┘
//! ```
//!
//! Sensorless doors (and `unknown` requests) get exactly one pulse. Doors
//! with a sensor get a reconciliation run; a command issued while a run is
//! active only replaces its target (last writer wins).
//!
//! # Examples
//!
//! ```no_run
//! use doorkeep_controller::{ControllerConfig, DoorController};
//! use doorkeep_core::DesiredState;
//! use doorkeep_hardware::mock::MockDoorBench;
//! use doorkeep_hardware::{AnyPositionSensor, AnyRelayActuator};
//!
//! #[tokio::main]
//! async fn main() -> doorkeep_core::Result<()> {
//!     let config = ControllerConfig::load()?;
//!     let (relay, sensor, _bench) = MockDoorBench::new();
//!     let controller = DoorController::new(
//!         &config,
//!         AnyRelayActuator::Mock(relay),
//!         AnyPositionSensor::Mock(sensor),
//!     )?;
//!
//!     let desired: DesiredState = "open".parse()?;
//!     let state = controller.request_transition("left_garage", desired).await?;
//!     println!("left_garage is {state}");
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use doorkeep_core::constants::EVENT_CHANNEL_CAPACITY;
use doorkeep_core::{DesiredState, DoorPosition, DoorState, Error, Result, SensorId};
use doorkeep_hardware::{AnyPositionSensor, AnyRelayActuator, PositionSensor, RelayActuator};
use tokio::sync::{Mutex as AsyncMutex, broadcast};
use tracing::{debug, error, info, warn};

use crate::config::{ControllerConfig, TimingConfig};
use crate::events::{DoorEvent, DoorEventKind};
use crate::registry::{Begin, Door, DoorInfo, DoorRegistry, DoorSnapshot};

/// State shared between the controller and its background tasks.
pub(crate) struct Shared<R, S> {
    pub(crate) registry: DoorRegistry,
    pub(crate) relay: R,
    pub(crate) sensor: S,
    pub(crate) timing: TimingConfig,
    pub(crate) max_attempts: Option<u32>,
    /// Present when pulses on different doors must not overlap.
    bus: Option<AsyncMutex<()>>,
    events: broadcast::Sender<DoorEvent>,
}

/// Controls the configured doors.
///
/// Cheap to clone; clones share doors, devices and the event stream.
pub struct DoorController<R = AnyRelayActuator, S = AnyPositionSensor> {
    shared: Arc<Shared<R, S>>,
}

impl<R, S> Clone for DoorController<R, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R, S> DoorController<R, S>
where
    R: RelayActuator + 'static,
    S: PositionSensor + 'static,
{
    /// Create a controller for the doors in `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn new(config: &ControllerConfig, relay: R, sensor: S) -> Result<Self> {
        config.validate()?;
        let registry = DoorRegistry::new(&config.doors)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        info!(
            doors = registry.len(),
            max_attempts = ?config.reconcile.max_attempts,
            serialize_bus = config.reconcile.serialize_bus,
            "Door controller ready"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                registry,
                relay,
                sensor,
                timing: config.timing.clone(),
                max_attempts: config.reconcile.max_attempts,
                bus: config.reconcile.serialize_bus.then(|| AsyncMutex::new(())),
                events,
            }),
        })
    }

    /// Door names in configuration order.
    pub fn list_doors(&self) -> Vec<&str> {
        self.shared.registry.list_doors()
    }

    /// Static description of a door.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown door.
    pub fn door(&self, name: &str) -> Result<DoorInfo> {
        Ok(self.shared.registry.get(name)?.info().clone())
    }

    /// Ephemeral control fields of a door.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown door.
    pub fn snapshot(&self, name: &str) -> Result<DoorSnapshot> {
        Ok(self.shared.registry.get(name)?.snapshot())
    }

    /// Whether a background operation is queued or running for a door.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown door.
    pub fn is_busy(&self, name: &str) -> Result<bool> {
        let snapshot = self.snapshot(name)?;
        Ok(snapshot.transitioning || snapshot.desired.is_some())
    }

    /// Subscribe to events from background operations.
    pub fn subscribe(&self) -> broadcast::Receiver<DoorEvent> {
        self.shared.events.subscribe()
    }

    /// Current state of a door.
    ///
    /// `indeterminate` while an operation is in flight, `unknown` for a
    /// sensorless door, otherwise the sensor reading.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` for an unknown door
    /// - `Error::Hardware` if the sensor cannot be read
    pub async fn get_state(&self, name: &str) -> Result<DoorState> {
        let door = self.shared.registry.get(name)?;
        self.shared.state_of(door).await
    }

    /// Request that a door reach `desired`.
    ///
    /// Schedules the physical work and returns the door's state observed
    /// immediately afterwards; it does not wait for the door to move.
    /// Background failures are logged and reported through
    /// [`subscribe`](Self::subscribe), never returned here.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` for an unknown door
    /// - `Error::Hardware` if the sensor cannot be read to decide
    pub async fn request_transition(
        &self,
        name: &str,
        desired: DesiredState,
    ) -> Result<DoorState> {
        let door = Arc::clone(self.shared.registry.get(name)?);

        match (door.sensor(), desired.position()) {
            (Some(sensor), Some(target)) => {
                self.request_reconciliation(&door, sensor, target).await?
            }
            _ => self.request_pulse(&door),
        }

        self.shared.state_of(&door).await
    }

    fn request_pulse(&self, door: &Arc<Door>) {
        door.begin_pulse();
        info!(door = %door.name(), "Scheduling single pulse");

        let shared = Arc::clone(&self.shared);
        tokio::spawn(shared.run_pulse(Arc::clone(door)));
    }

    async fn request_reconciliation(
        &self,
        door: &Arc<Door>,
        sensor: SensorId,
        target: DoorPosition,
    ) -> Result<()> {
        if door.retarget(target) {
            info!(door = %door.name(), %target, "Reconciliation in flight, target updated");
            return Ok(());
        }

        let current = self.shared.sensor.read_position(sensor).await?;

        match door.begin_reconciliation(target, current) {
            Begin::Retargeted => {
                info!(door = %door.name(), %target, "Reconciliation in flight, target updated");
            }
            Begin::Extraneous => {
                warn!(door = %door.name(), %target, "Extraneous request, door already there");
                self.shared.emit(door, DoorEventKind::Extraneous);
            }
            Begin::Started => {
                info!(
                    door = %door.name(),
                    from = %current,
                    to = %target,
                    "Starting reconciliation"
                );
                let shared = Arc::clone(&self.shared);
                tokio::spawn(shared.run_reconciliation(Arc::clone(door), sensor));
            }
        }
        Ok(())
    }
}

impl<R: RelayActuator, S: PositionSensor> Shared<R, S> {
    async fn state_of(&self, door: &Door) -> Result<DoorState> {
        let snapshot = door.snapshot();
        if snapshot.transitioning {
            return Ok(DoorState::Indeterminate);
        }
        let Some(sensor) = door.sensor() else {
            return Ok(DoorState::Unknown);
        };
        if snapshot.desired.is_some() {
            return Ok(DoorState::Indeterminate);
        }
        Ok(self.sensor.read_position(sensor).await?.into())
    }

    /// One relay pulse on `door`, serialized on the bus when configured.
    pub(crate) async fn pulse(&self, door: &Door) -> doorkeep_hardware::Result<()> {
        let _bus = match &self.bus {
            Some(bus) => Some(bus.lock().await),
            None => None,
        };
        debug!(door = %door.name(), channel = %door.relay_channel(), "Pulsing relay");
        self.relay
            .pulse(door.relay_channel(), self.timing.assert_duration())
            .await
    }

    pub(crate) fn emit(&self, door: &Door, kind: DoorEventKind) {
        // No subscribers is not an error.
        let _ = self.events.send(DoorEvent::new(door.name(), kind));
    }

    async fn run_pulse(self: Arc<Self>, door: Arc<Door>) {
        let guard = door.operation().lock().await;

        match self.pulse(&door).await {
            Ok(()) => {
                info!(door = %door.name(), "Pulse complete");
                self.emit(&door, DoorEventKind::Pulsed);
            }
            Err(e) => {
                error!(door = %door.name(), error = %e, "Pulse failed");
                self.emit(&door, DoorEventKind::HardwareFault(e.to_string()));
            }
        }

        door.end_pulse();
        drop(guard);
        self.emit(&door, DoorEventKind::Idle);
    }

    async fn run_reconciliation(self: Arc<Self>, door: Arc<Door>, sensor: SensorId) {
        let guard = door.operation().lock().await;

        match self.reconcile(&door, sensor).await {
            Ok(position) => {
                info!(door = %door.name(), %position, "Successful transition");
                self.emit(&door, DoorEventKind::Reached(position));
            }
            Err(e @ Error::StateTransition { .. }) => {
                error!(door = %door.name(), error = %e, "State transition error");
                self.emit(&door, DoorEventKind::TransitionFailed);
            }
            Err(e @ Error::RetriesExhausted { .. }) => {
                error!(door = %door.name(), error = %e, "Giving up on transition");
                self.emit(&door, DoorEventKind::RetriesExhausted);
            }
            Err(e) => {
                error!(door = %door.name(), error = %e, "Reconciliation aborted");
                self.emit(&door, DoorEventKind::HardwareFault(e.to_string()));
            }
        }

        door.end_reconciliation();
        drop(guard);
        self.emit(&door, DoorEventKind::Idle);
    }
}
