//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse, URLs are http(s))
//! - Check the payee data can produce a payment code
//! - Check the seed catalog is consistent (unique ids, sane prices)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RegistryConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system, on start and on reload

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{BackendKind, RegistryConfig};
use crate::pix::amount::MAX_AMOUNT_CENTS;
use crate::pix::payload::MAX_KEY_LEN;
use crate::registry::types::CATEGORIES;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Minimum admin API key length when the admin routes are mounted.
pub const MIN_API_KEY_LEN: usize = 16;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `backend.url`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &RegistryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("listener.bind_address", "must be a socket address like 0.0.0.0:8080"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    let obs = &config.observability;
    if !LOG_LEVELS.contains(&obs.log_level.as_str()) {
        errors.push(ValidationError::new("observability.log_level", format!("unknown level '{}'", obs.log_level)));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("observability.metrics_address", "must be a socket address"));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than zero"));
    }

    let rl = &config.rate_limit;
    if rl.enabled && (rl.requests_per_second == 0 || rl.burst_size == 0) {
        errors.push(ValidationError::new("rate_limit", "requests_per_second and burst_size must be positive"));
    }

    if config.admin.enabled {
        if config.admin.api_key.chars().count() < MIN_API_KEY_LEN {
            errors.push(ValidationError::new(
                "admin.api_key",
                format!("must be at least {} characters when admin is enabled", MIN_API_KEY_LEN),
            ));
        }
        if config.backend.admin_secret.is_empty() {
            errors.push(ValidationError::new("backend.admin_secret", "is required when admin is enabled"));
        }
    }

    validate_backend(config, &mut errors);
    validate_pix(config, &mut errors);

    if !config.event.map_url.is_empty() && !is_http_url(&config.event.map_url) {
        errors.push(ValidationError::new("event.map_url", "must be an http(s) URL"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_backend(config: &RegistryConfig, errors: &mut Vec<ValidationError>) {
    let backend = &config.backend;

    if backend.request_timeout_secs == 0 {
        errors.push(ValidationError::new("backend.request_timeout_secs", "must be greater than zero"));
    }
    if backend.retries.max_attempts == 0 {
        errors.push(ValidationError::new("backend.retries.max_attempts", "must be at least 1"));
    }
    if backend.retries.base_delay_ms > backend.retries.max_delay_ms {
        errors.push(ValidationError::new("backend.retries", "base_delay_ms exceeds max_delay_ms"));
    }

    match backend.kind {
        BackendKind::Postgrest => {
            if !is_http_url(&backend.url) {
                errors.push(ValidationError::new("backend.url", "must be an http(s) URL for the postgrest backend"));
            }
            if backend.anon_key.is_empty() {
                errors.push(ValidationError::new("backend.anon_key", "is required for the postgrest backend"));
            }
            if !backend.seed.is_empty() {
                errors.push(ValidationError::new("backend.seed", "only applies to the memory backend"));
            }
        }
        BackendKind::Memory => {
            let mut ids = HashSet::new();
            for (i, seed) in backend.seed.iter().enumerate() {
                let field = format!("backend.seed[{}]", i);
                if seed.name.trim().is_empty() {
                    errors.push(ValidationError::new(&field, "name is required"));
                }
                if seed.price.is_some_and(|p| !p.is_finite() || p < 0.0) {
                    errors.push(ValidationError::new(&field, "price must be a non-negative number"));
                }
                if seed.max_quantity == 0 {
                    errors.push(ValidationError::new(&field, "max_quantity must be at least 1"));
                }
                if let Some(category) = &seed.category {
                    if !CATEGORIES.contains(&category.as_str()) {
                        errors.push(ValidationError::new(&field, format!("unknown category '{}'", category)));
                    }
                }
                if let Some(id) = seed.id {
                    if !ids.insert(id) {
                        errors.push(ValidationError::new(&field, format!("duplicate id {}", id)));
                    }
                }
            }
        }
    }
}

fn validate_pix(config: &RegistryConfig, errors: &mut Vec<ValidationError>) {
    let pix = &config.pix;

    if pix.key.trim().is_empty() {
        errors.push(ValidationError::new("pix.key", "is required"));
    } else if pix.key.chars().count() > MAX_KEY_LEN {
        errors.push(ValidationError::new("pix.key", format!("must be at most {} characters", MAX_KEY_LEN)));
    }

    if pix.max_amount_cents == 0 || pix.max_amount_cents > MAX_AMOUNT_CENTS {
        errors.push(ValidationError::new(
            "pix.max_amount_cents",
            format!("must be between 1 and {}", MAX_AMOUNT_CENTS),
        ));
    }
    for preset in &pix.presets {
        if *preset == 0 || preset.saturating_mul(100) > pix.max_amount_cents {
            errors.push(ValidationError::new("pix.presets", format!("preset {} is out of range", preset)));
        }
    }

    if !(64..=1024).contains(&pix.qr_size) {
        errors.push(ValidationError::new("pix.qr_size", "must be between 64 and 1024"));
    }
    for (field, colour) in [("pix.qr_foreground", &pix.qr_foreground), ("pix.qr_background", &pix.qr_background)] {
        if !is_hex_colour(colour) {
            errors.push(ValidationError::new(field, "must be a #rrggbb colour"));
        }
    }
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
}

fn is_hex_colour(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
