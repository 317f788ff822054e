//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls with a deadline
//! - Turn an elapsed deadline into `RegistryError::Timeout`
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry
//! - Timeout errors are distinct from other errors and map to 504

use std::future::Future;
use std::time::Duration;

use crate::registry::error::{RegistryError, RegistryResult};

/// Run `fut`, failing with [`RegistryError::Timeout`] after `secs` seconds.
pub async fn with_deadline<T, F>(secs: u64, fut: F) -> RegistryResult<T>
where
    F: Future<Output = RegistryResult<T>>,
{
    match tokio::time::timeout(Duration::from_secs(secs), fut).await {
        Ok(result) => result,
        Err(_) => Err(RegistryError::Timeout(secs)),
    }
}
