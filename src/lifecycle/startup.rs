//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the configured registry backend
//! - Seed the in-memory catalog from config

use std::sync::Arc;

use crate::config::{BackendConfig, BackendKind, GiftSeed};
use crate::registry::{Gift, InMemoryBackend, PostgrestBackend, RegistryBackend, RegistryResult};

/// Construct the backend named by `config.kind`.
pub fn build_backend(config: &BackendConfig) -> RegistryResult<Arc<dyn RegistryBackend>> {
    let backend: Arc<dyn RegistryBackend> = match config.kind {
        BackendKind::Memory => {
            let gifts = seed_gifts(&config.seed);
            tracing::info!(gifts = gifts.len(), "Using in-memory registry backend");
            Arc::new(InMemoryBackend::with_gifts(config.admin_secret.clone(), gifts))
        }
        BackendKind::Postgrest => {
            let backend = PostgrestBackend::new(config)?;
            tracing::info!(url = %config.url, "Using PostgREST registry backend");
            Arc::new(backend)
        }
    };
    Ok(backend)
}

/// Seeds without an id are numbered after the highest explicit one.
pub fn seed_gifts(seeds: &[GiftSeed]) -> Vec<Gift> {
    let mut next_id = seeds.iter().filter_map(|s| s.id).max().unwrap_or(0) + 1;
    seeds
        .iter()
        .map(|seed| {
            let gift = seed.to_gift(next_id);
            if seed.id.is_none() {
                next_id += 1;
            }
            gift
        })
        .collect()
}
