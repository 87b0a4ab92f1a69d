//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters,
//! enabling controlled testing of application logic.

pub mod counter;
pub mod layer;
pub mod sink;
pub mod stopwatch;

pub use counter::MockCounterMetric;
pub use layer::{CapturedEvent, MockCaptureLayer};
pub use sink::{CapturedLine, MockSink};
pub use stopwatch::MockStopwatch;
