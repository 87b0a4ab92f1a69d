//! Domain layer - pure types with no runtime machinery.
//!
//! This layer contains the values the rate limiter reasons about:
//! - Severity levels
//! - Rate limit configuration
//! - Pattern keys and message templates
//! - Suppression summaries
//!
//! All types in this layer are plain values and easily testable.

pub mod key;
pub mod level;
pub mod rate;
pub mod summary;
pub mod template;
