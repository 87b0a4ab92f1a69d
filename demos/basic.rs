//! Basic example demonstrating per-pattern rate limiting.
//!
//! Allows up to 3 lines per message template every 2 seconds and prints the
//! suppression summaries as periods end.

use rate_limited_log::{Level, RateLimitedLog};
use std::thread::sleep;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    // Pending summaries are written when this guard goes out of scope.
    let _flush = rate_limited_log::flush_on_exit().expect("failed to start registry");

    let log = RateLimitedLog::builder(3, Duration::from_secs(2))
        .build()
        .expect("valid configuration");

    println!("=== Basic Rate Limiting Example ===\n");
    println!("Limit: 3 lines per template every 2 seconds\n");

    println!("Emitting 10 lines from one INFO template:");
    for i in 1..=10 {
        log.info("This is a repeated log message, iteration {}", &[&i]);
    }

    println!("\nEmitting 10 lines from one WARN template:");
    for i in 1..=10 {
        log.warn("This is a repeated warning message, iteration {}", &[&i]);
    }

    println!("\nEmitting different templates (each has its own limit):");
    for i in 1..=5 {
        log.info("Message A {}", &[&i]);
        log.info("Message B {}", &[&i]);
        log.info("Message C {}", &[&i]);
    }

    println!("\nA level-bound handle reports its summary at its own level:");
    let errors = log.get_with_level("Upstream {} timed out", Level::Error);
    for _ in 0..6 {
        errors.emit(&[&"billing"]);
    }

    println!("\nWaiting for the period to end...\n");
    sleep(Duration::from_millis(2500));

    let snapshot = log.metrics().snapshot();
    println!("\n=== Example Complete ===");
    println!(
        "Allowed {} of {} events ({:.0}% suppressed) across {} patterns.",
        snapshot.events_allowed,
        snapshot.total_events(),
        snapshot.suppression_rate() * 100.0,
        log.pattern_count()
    );
}
