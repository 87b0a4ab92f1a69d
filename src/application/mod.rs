//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Per-pattern counting and suppression decisions
//! - Pattern cache (lookup and creation)
//! - Registry and background reset scheduling
//! - Observability metrics
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod cache;
pub mod metrics;
pub mod pattern;
pub mod ports;
pub mod registry;
pub mod scheduler;
