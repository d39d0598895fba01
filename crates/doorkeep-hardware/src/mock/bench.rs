//! Mock door bench for testing and development.
//!
//! A bench simulates the physical world behind a relay board and a set of
//! reed switches: each relay channel may be wired to a door whose position
//! toggles when the relay is released, and whose position the matching
//! sensor reports. Tests drive and inspect the bench through a
//! [`MockBenchHandle`].

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use doorkeep_core::{DoorPosition, RelayChannel, SensorId};
use tracing::trace;

use crate::{
    HardwareError, Result,
    traits::{PositionSensor, RelayActuator},
};

#[derive(Debug, Default)]
struct ChannelState {
    /// Sensor observing the door this channel drives, if any.
    sensor: Option<SensorId>,
    asserted: bool,
    pulses: u32,
    /// Number of times the channel was asserted while already asserted.
    overlaps: u32,
    /// Pulses no longer move the door.
    jammed: bool,
    fail_next: bool,
}

#[derive(Debug)]
struct SensorState {
    position: DoorPosition,
    /// Readings returned before falling back to `position`.
    script: VecDeque<DoorPosition>,
    fail_next: bool,
}

#[derive(Debug, Default)]
struct BenchState {
    channels: HashMap<RelayChannel, ChannelState>,
    sensors: HashMap<SensorId, SensorState>,
    asserted_now: usize,
    max_asserted: usize,
    total_pulses: u32,
}

type SharedBench = Arc<Mutex<BenchState>>;

fn lock(bench: &SharedBench) -> MutexGuard<'_, BenchState> {
    bench.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Factory for a simulated relay board and sensor bus sharing one world.
///
/// # Examples
///
/// ```
/// use doorkeep_core::{DoorPosition, RelayChannel, SensorId};
/// use doorkeep_hardware::mock::MockDoorBench;
///
/// let (_relay, _sensor, handle) = MockDoorBench::new();
/// handle.add_door(RelayChannel::new(2), SensorId::new(1), DoorPosition::Closed);
/// handle.add_sensorless(RelayChannel::new(1));
///
/// assert_eq!(handle.position(SensorId::new(1)), Some(DoorPosition::Closed));
/// ```
#[derive(Debug)]
pub struct MockDoorBench;

impl MockDoorBench {
    /// Create an empty bench.
    ///
    /// Returns the relay board, the sensor bus, and a handle for wiring
    /// doors and inspecting what happened.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (MockRelay, MockSensor, MockBenchHandle) {
        let bench: SharedBench = Arc::new(Mutex::new(BenchState::default()));
        (
            MockRelay {
                bench: bench.clone(),
            },
            MockSensor {
                bench: bench.clone(),
            },
            MockBenchHandle { bench },
        )
    }
}

/// Simulated relay board.
#[derive(Debug, Clone)]
pub struct MockRelay {
    bench: SharedBench,
}

impl RelayActuator for MockRelay {
    async fn set_asserted(&self, channel: RelayChannel, asserted: bool) -> Result<()> {
        let mut bench = lock(&self.bench);
        let BenchState {
            channels,
            sensors,
            asserted_now,
            max_asserted,
            total_pulses,
        } = &mut *bench;

        let state = channels
            .get_mut(&channel)
            .ok_or_else(|| HardwareError::unknown_channel(channel))?;

        if state.fail_next {
            state.fail_next = false;
            return Err(HardwareError::communication(format!(
                "Relay write to {channel} not acknowledged"
            )));
        }

        if asserted {
            if state.asserted {
                state.overlaps += 1;
            } else {
                *asserted_now += 1;
            }
            state.asserted = true;
            *max_asserted = (*max_asserted).max(*asserted_now);
            trace!(%channel, "Relay asserted");
            return Ok(());
        }

        if !state.asserted {
            return Ok(());
        }

        state.asserted = false;
        *asserted_now -= 1;
        state.pulses += 1;
        *total_pulses += 1;

        if !state.jammed
            && let Some(sensor) = state.sensor.and_then(|id| sensors.get_mut(&id))
        {
            sensor.position = sensor.position.toggled();
        }

        trace!(%channel, pulses = state.pulses, "Relay released");
        Ok(())
    }
}

/// Simulated reed switch bus.
#[derive(Debug, Clone)]
pub struct MockSensor {
    bench: SharedBench,
}

impl PositionSensor for MockSensor {
    async fn read_position(&self, sensor: SensorId) -> Result<DoorPosition> {
        let mut bench = lock(&self.bench);
        let state = bench
            .sensors
            .get_mut(&sensor)
            .ok_or_else(|| HardwareError::unknown_sensor(sensor))?;

        if state.fail_next {
            state.fail_next = false;
            return Err(HardwareError::disconnected(sensor.to_string()));
        }

        Ok(state.script.pop_front().unwrap_or(state.position))
    }
}

/// Handle for wiring and inspecting a mock bench.
///
/// Cloneable; all clones observe the same bench.
#[derive(Debug, Clone)]
pub struct MockBenchHandle {
    bench: SharedBench,
}

impl MockBenchHandle {
    /// Wire `channel` to a door observed by `sensor`, starting at `initial`.
    pub fn add_door(&self, channel: RelayChannel, sensor: SensorId, initial: DoorPosition) {
        let mut bench = lock(&self.bench);
        bench.channels.insert(
            channel,
            ChannelState {
                sensor: Some(sensor),
                ..ChannelState::default()
            },
        );
        bench.sensors.insert(
            sensor,
            SensorState {
                position: initial,
                script: VecDeque::new(),
                fail_next: false,
            },
        );
    }

    /// Wire `channel` to a door without position feedback.
    pub fn add_sensorless(&self, channel: RelayChannel) {
        lock(&self.bench)
            .channels
            .insert(channel, ChannelState::default());
    }

    /// Physical position of the door observed by `sensor`.
    pub fn position(&self, sensor: SensorId) -> Option<DoorPosition> {
        lock(&self.bench).sensors.get(&sensor).map(|s| s.position)
    }

    /// Move the door observed by `sensor` by hand.
    pub fn set_position(&self, sensor: SensorId, position: DoorPosition) {
        if let Some(state) = lock(&self.bench).sensors.get_mut(&sensor) {
            state.position = position;
        }
    }

    /// Make pulses on `channel` stop (or resume) moving the door.
    pub fn set_jammed(&self, channel: RelayChannel, jammed: bool) {
        if let Some(state) = lock(&self.bench).channels.get_mut(&channel) {
            state.jammed = jammed;
        }
    }

    /// Queue readings that `sensor` reports before its real position.
    pub fn script_readings(
        &self,
        sensor: SensorId,
        readings: impl IntoIterator<Item = DoorPosition>,
    ) {
        if let Some(state) = lock(&self.bench).sensors.get_mut(&sensor) {
            state.script.extend(readings);
        }
    }

    /// Make the next relay write on `channel` fail.
    pub fn fail_next_pulse(&self, channel: RelayChannel) {
        if let Some(state) = lock(&self.bench).channels.get_mut(&channel) {
            state.fail_next = true;
        }
    }

    /// Make the next read of `sensor` fail.
    pub fn fail_next_read(&self, sensor: SensorId) {
        if let Some(state) = lock(&self.bench).sensors.get_mut(&sensor) {
            state.fail_next = true;
        }
    }

    /// Completed pulses on `channel`.
    pub fn pulse_count(&self, channel: RelayChannel) -> u32 {
        lock(&self.bench)
            .channels
            .get(&channel)
            .map_or(0, |state| state.pulses)
    }

    /// Completed pulses across all channels.
    pub fn total_pulses(&self) -> u32 {
        lock(&self.bench).total_pulses
    }

    /// Times `channel` was asserted while a pulse on it was still held.
    pub fn overlapping_pulses(&self, channel: RelayChannel) -> u32 {
        lock(&self.bench)
            .channels
            .get(&channel)
            .map_or(0, |state| state.overlaps)
    }

    /// Highest number of relays asserted at the same moment.
    pub fn max_concurrent_pulses(&self) -> usize {
        lock(&self.bench).max_asserted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const GARAGE: RelayChannel = RelayChannel::new(2);
    const GARAGE_SENSOR: SensorId = SensorId::new(1);

    #[tokio::test(start_paused = true)]
    async fn test_pulse_toggles_wired_door() {
        let (relay, sensor, handle) = MockDoorBench::new();
        handle.add_door(GARAGE, GARAGE_SENSOR, DoorPosition::Closed);

        relay.pulse(GARAGE, Duration::from_millis(500)).await.unwrap();
        assert_eq!(
            sensor.read_position(GARAGE_SENSOR).await.unwrap(),
            DoorPosition::Open
        );

        relay.pulse(GARAGE, Duration::from_millis(500)).await.unwrap();
        assert_eq!(
            sensor.read_position(GARAGE_SENSOR).await.unwrap(),
            DoorPosition::Closed
        );
        assert_eq!(handle.pulse_count(GARAGE), 2);
        assert_eq!(handle.total_pulses(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_jammed_door_does_not_move() {
        let (relay, sensor, handle) = MockDoorBench::new();
        handle.add_door(GARAGE, GARAGE_SENSOR, DoorPosition::Closed);
        handle.set_jammed(GARAGE, true);

        relay.pulse(GARAGE, Duration::from_millis(500)).await.unwrap();

        assert_eq!(handle.pulse_count(GARAGE), 1);
        assert_eq!(
            sensor.read_position(GARAGE_SENSOR).await.unwrap(),
            DoorPosition::Closed
        );
    }

    #[tokio::test]
    async fn test_scripted_readings_take_precedence() {
        let (_relay, sensor, handle) = MockDoorBench::new();
        handle.add_door(GARAGE, GARAGE_SENSOR, DoorPosition::Closed);
        handle.script_readings(GARAGE_SENSOR, [DoorPosition::Open, DoorPosition::Open]);

        for expected in [DoorPosition::Open, DoorPosition::Open, DoorPosition::Closed] {
            assert_eq!(sensor.read_position(GARAGE_SENSOR).await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_unknown_addresses() {
        let (relay, sensor, _handle) = MockDoorBench::new();

        let err = relay.set_asserted(GARAGE, true).await.unwrap_err();
        assert!(matches!(err, HardwareError::UnknownChannel { .. }));

        let err = sensor.read_position(GARAGE_SENSOR).await.unwrap_err();
        assert!(matches!(err, HardwareError::UnknownSensor { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_injected_failures_are_one_shot() {
        let (relay, sensor, handle) = MockDoorBench::new();
        handle.add_door(GARAGE, GARAGE_SENSOR, DoorPosition::Closed);
        handle.fail_next_pulse(GARAGE);
        handle.fail_next_read(GARAGE_SENSOR);

        let err = relay
            .pulse(GARAGE, Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, HardwareError::CommunicationError { .. }));
        let err = sensor.read_position(GARAGE_SENSOR).await.unwrap_err();
        assert!(matches!(err, HardwareError::Disconnected { .. }));

        assert_eq!(handle.pulse_count(GARAGE), 0);
        relay.pulse(GARAGE, Duration::from_millis(500)).await.unwrap();
        assert_eq!(
            sensor.read_position(GARAGE_SENSOR).await.unwrap(),
            DoorPosition::Open
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_tracking() {
        let (relay, _sensor, handle) = MockDoorBench::new();
        handle.add_sensorless(RelayChannel::new(1));
        handle.add_sensorless(GARAGE);

        let hold = Duration::from_millis(500);
        let (a, b) = tokio::join!(
            relay.pulse(RelayChannel::new(1), hold),
            relay.pulse(GARAGE, hold)
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(handle.max_concurrent_pulses(), 2);
        assert_eq!(handle.overlapping_pulses(GARAGE), 0);

        relay.set_asserted(GARAGE, true).await.unwrap();
        relay.set_asserted(GARAGE, true).await.unwrap();
        assert_eq!(handle.overlapping_pulses(GARAGE), 1);
    }
}
