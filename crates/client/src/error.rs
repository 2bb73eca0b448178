//! Client error types
//!
//! Every failed call surfaces as a [`ClientError`], never a raw status code.

use reqwest::StatusCode;
use serde::Serialize;

/// Coarse failure category reported to the caller and the notifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The request could not be built
    Configuration,
    /// No response was received (includes timeouts)
    Network,
    /// 4xx other than a recovered 401
    Client,
    /// 5xx, or a response body that could not be decoded
    Server,
    /// 401 that survived a successful refresh
    AuthExpired,
    /// 401 with no usable refresh token, or a failed refresh
    AuthTerminal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to configure the request: {0}")]
    RequestConfig(String),

    #[error("Could not connect to the server: {0}")]
    Unreachable(String),

    #[error("You do not have permission to access this resource")]
    Forbidden,

    #[error("The requested resource was not found")]
    NotFound,

    #[error("Internal server error, please try again later")]
    Server { message: Option<String> },

    #[error("Request failed with status {status}: {}", .message.as_deref().unwrap_or("unknown error"))]
    Http {
        status: u16,
        message: Option<String>,
    },

    /// `cause` is the refresh failure that ended the session, if one was attempted
    #[error("Session expired, please sign in again")]
    SessionExpired {
        #[source]
        cause: Option<Box<ClientError>>,
    },

    #[error("Invalid response body: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Session ended without a refresh attempt
    pub fn session_expired() -> Self {
        ClientError::SessionExpired { cause: None }
    }

    /// Session ended because the refresh call failed with `cause`
    pub fn refresh_failed(cause: ClientError) -> Self {
        ClientError::SessionExpired {
            cause: Some(Box::new(cause)),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::SessionExpired { .. })
    }

    /// Why the session expired, when a refresh was attempted
    pub fn refresh_cause(&self) -> Option<&ClientError> {
        match self {
            ClientError::SessionExpired { cause } => cause.as_deref(),
            _ => None,
        }
    }

    /// Map a non-success, non-refreshable status to an error
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        match status {
            StatusCode::FORBIDDEN => ClientError::Forbidden,
            StatusCode::NOT_FOUND => ClientError::NotFound,
            StatusCode::INTERNAL_SERVER_ERROR => ClientError::Server { message },
            other => ClientError::Http {
                status: other.as_u16(),
                message,
            },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::RequestConfig(_) => ErrorCategory::Configuration,
            ClientError::Unreachable(_) => ErrorCategory::Network,
            ClientError::Forbidden | ClientError::NotFound => ErrorCategory::Client,
            ClientError::Server { .. } | ClientError::InvalidResponse(_) => ErrorCategory::Server,
            ClientError::Http { status: 401, .. } => ErrorCategory::AuthExpired,
            ClientError::Http { status, .. } if *status >= 500 => ErrorCategory::Server,
            ClientError::Http { .. } => ErrorCategory::Client,
            ClientError::SessionExpired { .. } => ErrorCategory::AuthTerminal,
        }
    }

    /// HTTP status, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Forbidden => Some(403),
            ClientError::NotFound => Some(404),
            ClientError::Server { .. } => Some(500),
            ClientError::Http { status, .. } => Some(*status),
            ClientError::SessionExpired { .. } => Some(401),
            _ => None,
        }
    }

    /// Server-provided message, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Server { message } | ClientError::Http { message, .. } => {
                message.as_deref()
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ClientError::RequestConfig(err.to_string())
        } else if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            ClientError::Unreachable(err.to_string())
        }
    }
}

/// Pull a human-readable message out of an error body.
/// Accepts `{"message": ..}` and `{"error": {"message": ..}}`.
pub(crate) fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error").and_then(|e| e.get("message")))
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

pub type ClientResult<T> = Result<T, ClientError>;
