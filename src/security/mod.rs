//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (cap request body size)
//!     → rate_limit.rs (per-IP token bucket on guest mutations)
//!     → handler
//!     → headers.rs (security response headers)
//!
//! Admin request:
//!     → admin::auth (bearer token, credentials.rs comparison)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Secrets are compared in constant time
//! - No trust in client input

pub mod credentials;
pub mod headers;
pub mod limits;
pub mod rate_limit;
