//! Shared helpers for integration tests.

#![allow(dead_code)]

use rate_limited_log::infrastructure::mocks::MockSink;
use rate_limited_log::{RateLimitedLog, RateLimitedLogBuilder, Registry};
use std::sync::Arc;
use std::time::Duration;

/// Builder wired to `sink` and a private registry.
pub fn builder(
    max_rate: u32,
    period: Duration,
    sink: &MockSink,
    registry: &Arc<Registry>,
) -> RateLimitedLogBuilder {
    RateLimitedLog::builder(max_rate, period)
        .with_sink(Arc::new(sink.clone()))
        .with_registry(Arc::clone(registry))
}

pub fn registry() -> Arc<Registry> {
    Arc::new(Registry::new().unwrap())
}
