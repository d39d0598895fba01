//! Controller configuration: TOML file with environment variable overrides.
//!
//! Looks for the file named by `DOORKEEP_CONFIG`, falling back to
//! `doorkeep.toml` in the working directory. Every section has a default so
//! the file is optional; the default door set is the gate and the two garage
//! doors.
//!
//! ```toml
//! [timing]
//! assert_ms = 500
//! settle_ms = 15000
//!
//! [reconcile]
//! max_attempts = 5
//! serialize_bus = false
//!
//! [[doors]]
//! name = "gate"
//! relay_channel = 1
//!
//! [[doors]]
//! name = "left_garage"
//! relay_channel = 2
//! sensor = 1
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use doorkeep_core::constants::{DEFAULT_ASSERT_DURATION_MS, DEFAULT_SETTLE_DURATION_MS};
use doorkeep_core::{Error, RelayChannel, Result, SensorId};
use serde::{Deserialize, Serialize};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "doorkeep.toml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Relay and settle timing.
    pub timing: TimingConfig,
    /// Reconciliation loop behavior.
    pub reconcile: ReconcileConfig,
    /// Configured doors, in listing order.
    pub doors: Vec<DoorConfig>,
}

/// Relay pulse timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Time the relay is held asserted per pulse.
    pub assert_ms: u64,
    /// Pause after a pulse before the sensor is sampled.
    pub settle_ms: u64,
}

/// Reconciliation loop options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Give up after this many pulses without a terminal classification.
    /// Unbounded when absent.
    pub max_attempts: Option<u32>,
    /// Hold a controller-wide lock around every relay pulse so that doors
    /// sharing one relay bus never pulse at the same time.
    pub serialize_bus: bool,
}

/// One physical door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorConfig {
    pub name: String,
    pub relay_channel: RelayChannel,
    #[serde(default)]
    pub sensor: Option<SensorId>,
}

impl DoorConfig {
    pub fn new(name: impl Into<String>, relay_channel: RelayChannel) -> Self {
        Self {
            name: name.into(),
            relay_channel,
            sensor: None,
        }
    }

    #[must_use]
    pub fn with_sensor(mut self, sensor: SensorId) -> Self {
        self.sensor = Some(sensor);
        self
    }
}

impl TimingConfig {
    #[must_use]
    pub fn assert_duration(&self) -> Duration {
        Duration::from_millis(self.assert_ms)
    }

    #[must_use]
    pub fn settle_duration(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl ControllerConfig {
    /// Load configuration from `DOORKEEP_CONFIG` or `doorkeep.toml` (if
    /// present), then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file exists but is unreadable or
    /// malformed, an override is not a number, or validation fails.
    pub fn load() -> Result<Self> {
        let path =
            std::env::var("DOORKEEP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file, returning defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on I/O or parse failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(Error::Config(format!(
                "failed to read {}: {err}",
                path.display()
            ))),
        }
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the text is not valid configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| Error::Config(format!("failed to parse: {err}")))
    }

    /// Apply `DOORKEEP_ASSERT_MS`, `DOORKEEP_SETTLE_MS` and
    /// `DOORKEEP_MAX_ATTEMPTS` from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a present value is not a number.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(val) = lookup("DOORKEEP_ASSERT_MS") {
            self.timing.assert_ms = parse_override("DOORKEEP_ASSERT_MS", &val)?;
        }
        if let Some(val) = lookup("DOORKEEP_SETTLE_MS") {
            self.timing.settle_ms = parse_override("DOORKEEP_SETTLE_MS", &val)?;
        }
        if let Some(val) = lookup("DOORKEEP_MAX_ATTEMPTS") {
            self.reconcile.max_attempts = Some(parse_override("DOORKEEP_MAX_ATTEMPTS", &val)?);
        }
        Ok(())
    }

    /// Check semantic constraints the TOML schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.timing.assert_ms == 0 {
            return Err(Error::Config("assert_ms must be non-zero".to_string()));
        }
        if self.reconcile.max_attempts == Some(0) {
            return Err(Error::Config("max_attempts must be non-zero".to_string()));
        }
        if self.doors.is_empty() {
            return Err(Error::Config("at least one door is required".to_string()));
        }

        let mut names = HashSet::new();
        let mut channels = HashSet::new();
        let mut sensors = HashSet::new();
        for door in &self.doors {
            if door.name.trim().is_empty() {
                return Err(Error::Config("door name must not be empty".to_string()));
            }
            if !names.insert(door.name.as_str()) {
                return Err(Error::Config(format!("duplicate door name: {}", door.name)));
            }
            if !channels.insert(door.relay_channel) {
                return Err(Error::Config(format!(
                    "{} is assigned to more than one door",
                    door.relay_channel
                )));
            }
            if let Some(sensor) = door.sensor
                && !sensors.insert(sensor)
            {
                return Err(Error::Config(format!(
                    "{sensor} is assigned to more than one door"
                )));
            }
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, val: &str) -> Result<T> {
    val.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number, got {val:?}")))
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            reconcile: ReconcileConfig::default(),
            doors: vec![
                DoorConfig::new("gate", RelayChannel::new(1)),
                DoorConfig::new("left_garage", RelayChannel::new(2)).with_sensor(SensorId::new(1)),
                DoorConfig::new("right_garage", RelayChannel::new(3))
                    .with_sensor(SensorId::new(2)),
            ],
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            assert_ms: DEFAULT_ASSERT_DURATION_MS,
            settle_ms: DEFAULT_SETTLE_DURATION_MS,
        }
    }
}
