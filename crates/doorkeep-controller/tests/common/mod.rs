//! Common test utilities for controller integration tests.
//!
//! Builds a controller over a mock door bench with three doors:
//!
//! - `gate`: sensorless, relay channel 1
//! - `garage`: relay channel 2, sensor 1
//! - `shed`: relay channel 3, sensor 2
//!
//! Tests run on a paused Tokio clock, so assert and settle delays advance
//! instantly once every task is waiting on a timer.

#![allow(dead_code)]

use std::time::Duration;

use doorkeep_controller::{
    ControllerConfig, DoorConfig, DoorController, DoorEvent, DoorEventKind,
};
use doorkeep_core::{DesiredState, DoorPosition, DoorState, RelayChannel, SensorId};
use doorkeep_hardware::mock::{MockBenchHandle, MockDoorBench};
use doorkeep_hardware::{AnyPositionSensor, AnyRelayActuator};
use tokio::sync::broadcast;

pub const GATE: &str = "gate";
pub const GATE_RELAY: RelayChannel = RelayChannel::new(1);

pub const GARAGE: &str = "garage";
pub const GARAGE_RELAY: RelayChannel = RelayChannel::new(2);
pub const GARAGE_SENSOR: SensorId = SensorId::new(1);

pub const SHED: &str = "shed";
pub const SHED_RELAY: RelayChannel = RelayChannel::new(3);
pub const SHED_SENSOR: SensorId = SensorId::new(2);

/// Upper bound on how long (virtual time) a test waits for an event.
const EVENT_TIMEOUT: Duration = Duration::from_secs(600);

pub struct TestRig {
    pub controller: DoorController,
    pub bench: MockBenchHandle,
    pub events: broadcast::Receiver<DoorEvent>,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("doorkeep_controller=debug,doorkeep_hardware=trace")
        .try_init();
}

pub fn config() -> ControllerConfig {
    ControllerConfig {
        doors: vec![
            DoorConfig::new(GATE, GATE_RELAY),
            DoorConfig::new(GARAGE, GARAGE_RELAY).with_sensor(GARAGE_SENSOR),
            DoorConfig::new(SHED, SHED_RELAY).with_sensor(SHED_SENSOR),
        ],
        ..ControllerConfig::default()
    }
}

/// Rig with default timing; the garage and shed start at `initial`.
pub fn rig(initial: DoorPosition) -> TestRig {
    rig_with(config(), initial)
}

pub fn rig_with(config: ControllerConfig, initial: DoorPosition) -> TestRig {
    init_tracing();

    let (relay, sensor, bench) = MockDoorBench::new();
    bench.add_sensorless(GATE_RELAY);
    bench.add_door(GARAGE_RELAY, GARAGE_SENSOR, initial);
    bench.add_door(SHED_RELAY, SHED_SENSOR, initial);

    let controller = DoorController::new(
        &config,
        AnyRelayActuator::Mock(relay),
        AnyPositionSensor::Mock(sensor),
    )
    .unwrap();
    let events = controller.subscribe();

    TestRig {
        controller,
        bench,
        events,
    }
}

/// Parse a wire token and issue the command, as a request binding would.
pub async fn dispatch(
    controller: &DoorController,
    door: &str,
    token: &str,
) -> doorkeep_core::Result<DoorState> {
    let desired: DesiredState = token.parse()?;
    controller.request_transition(door, desired).await
}

/// Collect the event kinds for `door` up to and including its next `Idle`.
pub async fn until_idle(
    events: &mut broadcast::Receiver<DoorEvent>,
    door: &str,
) -> Vec<DoorEventKind> {
    let mut kinds = Vec::new();
    loop {
        let event = tokio::time::timeout(EVENT_TIMEOUT, events.recv())
            .await
            .unwrap_or_else(|_| panic!("no Idle event for {door}, saw {kinds:?}"))
            .unwrap();
        if event.door != door {
            continue;
        }
        let idle = event.kind == DoorEventKind::Idle;
        kinds.push(event.kind);
        if idle {
            return kinds;
        }
    }
}

/// Assert that no further event arrives within one settle period.
pub async fn assert_quiet(events: &mut broadcast::Receiver<DoorEvent>) {
    let result = tokio::time::timeout(Duration::from_secs(60), events.recv()).await;
    assert!(result.is_err(), "unexpected event: {result:?}");
}
