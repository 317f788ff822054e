//! Retry logic.
//!
//! # Responsibilities
//! - Re-run read calls that failed transiently
//! - Space attempts with exponential backoff + jitter
//!
//! # Design Decisions
//! - Callers opt in per call; mutating procedures never go through here
//! - Only `Unavailable` and `Timeout` are retried, never a backend's answer

use std::future::Future;

use crate::config::RetryConfig;
use crate::registry::error::RegistryResult;
use crate::resilience::backoff::calculate_backoff;

/// Run `call` up to `config.max_attempts` times while it fails transiently.
pub async fn retry_read<T, F, Fut>(config: &RetryConfig, operation: &'static str, mut call: F) -> RegistryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RegistryResult<T>>,
{
    let max_attempts = if config.enabled { config.max_attempts.max(1) } else { 1 };
    let mut attempt = 0;

    loop {
        attempt += 1;
        match call().await {
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = calculate_backoff(attempt, config.base_delay_ms, config.max_delay_ms);
                tracing::info!(operation, attempt, delay = ?delay, error = %e, "Retrying backend read");
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}
