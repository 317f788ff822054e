//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the registry
//! service. All types derive Serde traits for deserialization from config
//! files, and every section falls back to its `Default` so a minimal file
//! only names what differs.

use serde::{Deserialize, Serialize};

use crate::registry::types::{Gift, GiftId};

/// Root configuration for the registry service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Per-IP limits on guest mutations.
    pub rate_limit: RateLimitConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Where gifts, donations and RSVPs are stored.
    pub backend: BackendConfig,

    /// Payee details used to build payment codes.
    pub pix: PixConfig,

    /// Event details shown to guests.
    pub event: EventConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add security response headers.
    pub enable_headers: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 64 * 1024,
        }
    }
}

/// Rate limiting configuration for reservations, contributions and RSVPs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Sustained requests per second per IP.
    pub requests_per_second: u32,

    /// Burst capacity.
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 1,
            burst_size: 10,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the `/admin` routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process store, seeded from `backend.seed`.
    #[default]
    Memory,
    /// Hosted database reached through its PostgREST endpoint.
    Postgrest,
}

/// Retry configuration for backend reads.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Backend configuration. Changes here need a restart.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,

    /// Project URL, e.g. "https://abc.supabase.co" (postgrest only).
    pub url: String,

    /// Public API key sent as `apikey` and bearer token (postgrest only).
    pub anon_key: String,

    /// Secret passed to admin procedures. Never sent to guests.
    pub admin_secret: String,

    /// Deadline for each backend call in seconds.
    pub request_timeout_secs: u64,

    pub retries: RetryConfig,

    /// Initial catalog for the memory backend.
    pub seed: Vec<GiftSeed>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            url: String::new(),
            anon_key: String::new(),
            admin_secret: String::new(),
            request_timeout_secs: 10,
            retries: RetryConfig::default(),
            seed: Vec::new(),
        }
    }
}

/// A `[[backend.seed]]` catalog entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GiftSeed {
    /// Numbered after the highest explicit id when omitted.
    #[serde(default)]
    pub id: Option<GiftId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub product_link: Option<String>,
    #[serde(default)]
    pub warning_title: Option<String>,
    #[serde(default)]
    pub warning_message: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_max_quantity")]
    pub max_quantity: u32,
}

fn default_max_quantity() -> u32 {
    1
}

impl GiftSeed {
    /// Build the catalog item, using `fallback_id` when no id is set.
    pub fn to_gift(&self, fallback_id: GiftId) -> Gift {
        Gift {
            id: self.id.unwrap_or(fallback_id),
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            price: self.price,
            image_url: self.image_url.clone(),
            product_link: self.product_link.clone(),
            warning_title: self.warning_title.clone(),
            warning_message: self.warning_message.clone(),
            category: self.category.clone(),
            max_quantity: self.max_quantity.max(1),
            current_quantity: 0,
            reserved_by: None,
            delivery_method: None,
        }
    }
}

/// Payee configuration for payment codes. Reloadable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PixConfig {
    /// Payee's Pix key (e-mail, phone, CPF/CNPJ or random key).
    pub key: String,

    pub merchant_name: String,

    pub merchant_city: String,

    /// Reference printed on every code built by the service.
    pub transaction_id: String,

    /// Suggested amounts in BRL shown to guests.
    pub presets: Vec<u64>,

    /// Largest contribution accepted, in cents.
    pub max_amount_cents: u64,

    /// Rendered QR size in pixels.
    pub qr_size: u32,

    pub qr_foreground: String,

    pub qr_background: String,
}

impl Default for PixConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            merchant_name: String::new(),
            merchant_city: String::new(),
            transaction_id: "CHADECASA2025".to_string(),
            presets: vec![50, 100, 200],
            max_amount_cents: 100_000_000,
            qr_size: 240,
            qr_foreground: "#ea580c".to_string(),
            qr_background: "#ffffff".to_string(),
        }
    }
}

/// Event details shown to guests. Reloadable.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EventConfig {
    pub title: String,

    /// Free-form date shown on the page, e.g. "14 de junho de 2025".
    pub date: String,

    pub time: String,

    pub address: String,

    pub map_url: String,

    /// Returned to guests who choose to ship their gift.
    pub shipping_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config: RegistryConfig = toml::from_str(
            r#"
            [pix]
            key = "casal@example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.pix.key, "casal@example.com");
        assert_eq!(config.pix.transaction_id, "CHADECASA2025");
        assert_eq!(config.pix.presets, vec![50, 100, 200]);
        assert_eq!(config.backend.kind, BackendKind::Memory);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert!(!config.admin.enabled);
    }

    #[test]
    fn test_seed_entries() {
        let config: RegistryConfig = toml::from_str(
            r#"
            [backend]
            kind = "memory"

            [[backend.seed]]
            name = "Air fryer"
            price = 399.9
            category = "Eletros"

            [[backend.seed]]
            id = 10
            name = "Taças"
            max_quantity = 6
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.seed.len(), 2);

        let first = config.backend.seed[0].to_gift(1);
        assert_eq!(first.id, 1);
        assert_eq!(first.max_quantity, 1);

        let second = config.backend.seed[1].to_gift(2);
        assert_eq!(second.id, 10);
        assert_eq!(second.remaining(), 6);
    }
}
