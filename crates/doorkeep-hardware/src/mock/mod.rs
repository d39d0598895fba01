//! Mock device implementations for testing and development.
//!
//! This module provides a simulated relay board and sensor bus that can be
//! controlled programmatically without requiring physical hardware.

pub mod bench;

// Re-export commonly used types
pub use bench::{MockBenchHandle, MockDoorBench, MockRelay, MockSensor};
