//! Unified error type for data layer

use thiserror::Error;

/// Unified error type for data layer operations
#[derive(Error, Debug)]
pub enum DataError {
    /// MySQL database error
    #[error("MySQL error: {0}")]
    Mysql(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog contents could not be decoded
    #[error("Invalid catalog data: {0}")]
    InvalidCatalog(String),

    /// Backend not available
    #[error("Backend {backend} is not available: {reason}")]
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },
}

impl DataError {
    /// Create a backend unavailable error
    pub fn backend_unavailable(backend: &'static str, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend,
            reason: reason.into(),
        }
    }

    /// Check if this is a connection-related error that might be transient
    pub fn is_transient(&self) -> bool {
        match self {
            Self::BackendUnavailable { .. } => true,
            Self::Mysql(e) => {
                matches!(
                    e,
                    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
                )
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidCatalog(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_unavailable_error_display() {
        let err = DataError::backend_unavailable("mysql", "connection refused");
        assert_eq!(
            err.to_string(),
            "Backend mysql is not available: connection refused"
        );
    }

    #[test]
    fn test_invalid_catalog_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DataError::from(json_err);
        assert!(err.to_string().starts_with("Invalid catalog data:"));
    }

    #[test]
    fn test_is_transient() {
        assert!(DataError::backend_unavailable("mysql", "down").is_transient());
        assert!(DataError::Mysql(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!DataError::Mysql(sqlx::Error::RowNotFound).is_transient());
        assert!(!DataError::Config("bad config".into()).is_transient());
    }
}
