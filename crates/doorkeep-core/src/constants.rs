//! Timing and sizing constants shared by the door controller crates.
//!
//! The defaults are tuned for a residential gate and sectional garage doors
//! driven through a relay board that simulates a wall button press.

// ============================================================================
// Relay Timing
// ============================================================================

/// Default time the relay is held asserted for one pulse, in milliseconds.
///
/// Long enough for typical garage door openers to register a button press.
pub const DEFAULT_ASSERT_DURATION_MS: u64 = 500;

/// Default pause after a pulse before the position sensor is sampled, in
/// milliseconds.
///
/// Covers full travel of a sectional garage door.
pub const DEFAULT_SETTLE_DURATION_MS: u64 = 15_000;

// ============================================================================
// Event Stream
// ============================================================================

/// Capacity of the door event broadcast channel.
///
/// Receivers that fall further behind than this lose the oldest events.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

