//! Unified error type for the content lifecycle and moderation engine.
//!
//! Every core operation returns [`Result`]. The HTTP layer maps errors onto
//! status codes with [`Error::status_code`] and shows callers
//! [`Error::public_message`], which never leaks storage details.

use thiserror::Error;

/// Errors surfaced by the newsdesk core.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing required input.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// A referenced content item or comment does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// What was looked up (e.g. `"article"`, `"comment"`)
        entity: &'static str,
        /// The identifier that did not resolve
        id: i64,
    },

    /// The caller's role does not permit the operation.
    #[error("Forbidden: {operation}")]
    Forbidden {
        /// The denied operation
        operation: String,
    },

    /// The operation is not allowed in the item's current lifecycle state.
    #[error("Invalid state: {reason}")]
    InvalidState {
        /// Why the transition was refused
        reason: String,
    },

    /// Underlying persistence failure.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A storage call exceeded the caller's deadline and was abandoned.
    #[error("Storage call timed out")]
    Timeout,

    /// Configuration could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::InvalidState`].
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// HTTP status code the transport layer should answer with.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::InvalidState { .. } => 400,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Database(_) | Self::Timeout | Self::Config { .. } => 500,
        }
    }

    /// Message safe to show to an end user.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Timeout | Self::Config { .. } => "server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::validation("empty text").status_code(), 400);
        assert_eq!(Error::invalid_state("already archived").status_code(), 400);
        assert_eq!(
            Error::Forbidden {
                operation: "archive".to_string()
            }
            .status_code(),
            403
        );
        assert_eq!(
            Error::NotFound {
                entity: "article",
                id: 7
            }
            .status_code(),
            404
        );
        assert_eq!(Error::Timeout.status_code(), 500);
    }

    #[test]
    fn test_storage_errors_are_not_leaked() {
        let err = Error::from(sea_orm::DbErr::Custom("connection refused on 10.0.0.3".into()));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), "server error");

        let err = Error::validation("Comment text cannot be empty");
        assert_eq!(
            err.public_message(),
            "Validation error: Comment text cannot be empty"
        );
    }
}
