//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Stopwatch abstraction (system time vs mock)
//! - Storage implementations (sharded maps)
//! - Tracing integration (default sink)
//! - The public logging facade and its builder

pub mod rate_limited_log;
pub mod sink;
pub mod stopwatch;
pub mod storage;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides controllable test doubles for testing
/// rate limiting behavior.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// rate-limited-log = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
