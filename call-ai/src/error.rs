//! Error types for call AI operations.

use std::fmt;

/// Universal error type that abstracts provider-specific errors into common variants.
///
/// All provider implementations map their native errors to these variants,
/// preserving context while keeping the pipeline code provider-agnostic. The
/// pipeline's retry/fallback policy keys off the variant: `Network` and
/// `Timeout` are transient and eligible for the cheaper-model retry path,
/// while `Deserialization` marks unusable model output.
#[derive(Debug)]
pub enum Error {
    /// API key rejected or missing permissions. Not retryable.
    Authentication(String),

    /// Network connectivity issues, DNS failures, or 5xx responses.
    /// Typically transient; eligible for the fallback retry path.
    Network(String),

    /// Invalid parameters or malformed client configuration.
    Configuration(String),

    /// Provider-side business error (e.g. unsupported audio format).
    Provider(String),

    /// Operation exceeded its timeout budget.
    Timeout(String),

    /// Provider rate limit exceeded; wait before retrying.
    RateLimited { retry_after_seconds: u64 },

    /// Failed to serialize a request payload.
    Serialization(String),

    /// Model output could not be parsed into the expected shape.
    Deserialization(String),

    /// Catch-all for errors that don't fit other categories.
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Whether the pipeline should attempt its cheaper/simpler retry path.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Network(_)
                | Error::Timeout(_)
                | Error::RateLimited { .. }
                | Error::Deserialization(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Authentication(msg) => write!(f, "Authentication failed: {}", msg),
            Error::Network(msg) => write!(f, "Network error: {}", msg),
            Error::Configuration(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Provider(msg) => write!(f, "Provider error: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::RateLimited {
                retry_after_seconds,
            } => {
                write!(f, "Rate limited: retry after {}s", retry_after_seconds)
            }
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Deserialization(msg) => write!(f, "Deserialization error: {}", msg),
            Error::Other(err) => write!(f, "Other error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(Error::Network("connection reset".to_string()).is_retryable());
        assert!(Error::Timeout("120s exceeded".to_string()).is_retryable());
        assert!(Error::Deserialization("not json".to_string()).is_retryable());
        assert!(!Error::Authentication("bad key".to_string()).is_retryable());
        assert!(!Error::Configuration("missing model".to_string()).is_retryable());
    }
}
