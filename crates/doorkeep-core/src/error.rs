use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Caller-visible errors
    #[error("Door not found: {door}")]
    NotFound { door: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    // Hardware errors
    #[error("Hardware operation failed: {0}")]
    Hardware(String),

    // Reconciliation errors
    #[error(
        "State transition error on {door}: last={last}, desired={desired}, current={current}"
    )]
    StateTransition {
        door: String,
        last: String,
        desired: String,
        current: String,
    },

    /// State transition abandoned after `reconcile.max_attempts` pulses,
    /// distinct from an inconsistent reading.
    #[error("Door {door} did not reach its target after {attempts} pulses")]
    RetriesExhausted { door: String, attempts: u32 },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn not_found(door: impl Into<String>) -> Self {
        Self::NotFound { door: door.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
