//! Gift registry service library.
//!
//! Pix payment codes (BR Code encoder, decoder and QR rendering) plus the
//! HTTP service around a wedding or housewarming gift list.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pix;
pub mod registry;
pub mod resilience;
pub mod security;

pub use config::schema::RegistryConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
