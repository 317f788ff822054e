//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, request span)
//!     → gifts.rs / pix.rs / event.rs (guest API)
//!     → admin (bearer-protected API)
//!     → response.rs (error mapping)
//!     → Send to client
//! ```

pub mod event;
pub mod gifts;
pub mod pix;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, ApiResult};
pub use server::{AppState, HttpServer};
