//! Errors returned across the log service boundary.

use thiserror::Error;

/// Failure of a remote call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Network hiccup or a record that is not queryable yet
    #[error("transient failure: {0}")]
    Transient(String),

    /// The push channel could not be reached
    #[error("connection failed: {0}")]
    Connection(String),

    /// The service refused the request, optionally saying why
    #[error("{}", .message.as_deref().unwrap_or("request rejected"))]
    Rejected { message: Option<String> },

    #[error("record not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: Some(message.into()),
        }
    }

    /// Only transient failures are worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Message suitable for a notification, or `fallback` when the
    /// service did not provide one
    pub fn user_message(&self, fallback: &str) -> String {
        let message = match self {
            Self::Transient(m) | Self::Connection(m) => Some(m.as_str()),
            Self::Rejected { message } => message.as_deref(),
            Self::NotFound(id) => return format!("Record {} was not found", id),
        };

        match message {
            Some(m) if !m.trim().is_empty() => m.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Result wrapper for remote calls.
pub type ServiceResult<T> = Result<T, ServiceError>;
