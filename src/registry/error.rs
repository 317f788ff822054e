//! Registry backend error definitions.

use thiserror::Error;

/// Errors that can occur while talking to the registry backend.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Backend could not be reached or answered with a server error.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Backend call exceeded the configured deadline.
    #[error("Backend call timed out after {0} seconds")]
    Timeout(u64),

    /// Backend refused the call (bad secret, failed check inside a procedure).
    #[error("Rejected by backend: {0}")]
    Rejected(String),

    /// Admin secret did not match.
    #[error("Unauthorized")]
    Unauthorized,

    /// No gift or donation with this id.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A row came back in a shape the service does not accept.
    #[error("Invalid {entity} record: {reason}")]
    InvalidRecord { entity: &'static str, reason: String },

    /// Input failed validation before reaching the backend.
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl RegistryError {
    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::NotFound { entity: "gift", id: 7 };
        assert_eq!(err.to_string(), "gift 7 not found");

        let err = RegistryError::Timeout(10);
        assert_eq!(err.to_string(), "Backend call timed out after 10 seconds");
    }

    #[test]
    fn test_transient_classification() {
        assert!(RegistryError::Timeout(1).is_transient());
        assert!(RegistryError::Unavailable("503".into()).is_transient());
        assert!(!RegistryError::Rejected("no".into()).is_transient());
        assert!(!RegistryError::Unauthorized.is_transient());
    }
}
