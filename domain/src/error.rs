//! Error types for the `domain` layer.
use call_ai::error::Error as CallAiError;
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. The intent is to translate errors between layers while maintaining
/// layer boundaries. Ex. `domain` is dependent on `entity_api`, and `web` is dependent on `domain`,
/// but `web` should not be dependent, directly, on `entity_api`. Ultimately the various
/// `error_kind`s are used by `web` to return appropriate HTTP status codes and messages
/// to the client.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

impl Error {
    /// Shorthand for internal errors that originate in this layer.
    pub fn internal(message: impl Into<String>) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(message.into())),
        }
    }

    /// Shorthand for not-found conditions detected in this layer.
    pub fn not_found() -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::NotFound,
            )),
        }
    }

    /// Shorthand for caller-supplied data that fails validation.
    pub fn invalid(message: impl Into<String>) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::Invalid(message.into()),
            )),
        }
    }
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    Config(String),
    Other(String),
}

/// Enum representing the various kinds of entity errors that can bubble up from the
/// "Entity" layer (`entity_api` and `entity`). These errors are translated from the
/// `entity_api` layer to the `domain` layer and reduced to a subset of error kinds
/// that are relevant to the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Invalid(String),
    DbTransaction,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Timeout,
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let entity_error_kind = match err.error_kind {
            EntityApiErrorKind::RecordNotFound => EntityErrorKind::NotFound,
            EntityApiErrorKind::InvalidQueryTerm | EntityApiErrorKind::ValidationError => {
                EntityErrorKind::Invalid("invalid entity data".to_string())
            }
            EntityApiErrorKind::RecordNotUpdated => EntityErrorKind::DbTransaction,
            _ => EntityErrorKind::Other("EntityApiErrorKind".to_string()),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Errors that result from issues building the reqwest::Client instance. This
        // type of error will occur prior to any network calls being made.
        if err.is_builder() {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to build reqwest client".to_string(),
                )),
            }
        } else if err.is_timeout() {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Timeout),
            }
        // Errors that result from issues with the network call itself.
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}

// Provider errors surfaced through the `call-ai` abstraction layer.
impl From<CallAiError> for Error {
    fn from(err: CallAiError) -> Self {
        let error_kind = match &err {
            CallAiError::Network(_) | CallAiError::RateLimited { .. } => {
                DomainErrorKind::External(ExternalErrorKind::Network)
            }
            CallAiError::Timeout(_) => DomainErrorKind::External(ExternalErrorKind::Timeout),
            CallAiError::Authentication(msg) | CallAiError::Configuration(msg) => {
                DomainErrorKind::Internal(InternalErrorKind::Config(msg.clone()))
            }
            CallAiError::Provider(msg) => {
                DomainErrorKind::External(ExternalErrorKind::Other(msg.clone()))
            }
            CallAiError::Serialization(msg) | CallAiError::Deserialization(msg) => {
                DomainErrorKind::Internal(InternalErrorKind::Other(msg.clone()))
            }
            CallAiError::Other(_) => {
                DomainErrorKind::External(ExternalErrorKind::Other(err.to_string()))
            }
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "JSON (de)serialization error".to_string(),
            )),
        }
    }
}
