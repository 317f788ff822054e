//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to the registry backend:
//!     → timeouts.rs (enforce the per-call deadline)
//!     → On transient failure: retries.rs (reads only, backoff.rs delays)
//! ```
//!
//! # Design Decisions
//! - Every backend call has a deadline
//! - Only reads are retried; procedures that mutate state run once
//! - Jittered backoff spreads retries from concurrent requests

pub mod backoff;
pub mod retries;
pub mod timeouts;
