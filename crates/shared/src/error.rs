use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of every failure the client can surface. Each failed operation maps to
/// exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    /// Checked locally before any request, e.g. a missing bearer token.
    Precondition,
    /// The request never produced an HTTP response.
    Transport,
    /// Non-2xx status.
    Server { status: u16 },
    /// 2xx status with a body of the wrong shape.
    Format,
    /// Local form validation rejected the input.
    Validation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precondition => f.write_str("precondition"),
            Self::Transport => f.write_str("transport"),
            Self::Server { status } => write!(f, "server({status})"),
            Self::Format => f.write_str("format"),
            Self::Validation => f.write_str("validation"),
        }
    }
}

pub const MISSING_TOKEN_MESSAGE: &str = "Authentication token not found, please sign in again";
pub const UNEXPECTED_FORMAT_MESSAGE: &str = "Unexpected response format";
pub const NETWORK_FAILURE_MESSAGE: &str = "Unable to reach the server";

/// Body shape the API uses for failures. Only `message` is read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// Best-effort extraction of `message` from a failure body.
    pub fn message_from_body(body: &str) -> Option<String> {
        serde_json::from_str::<ApiError>(body)
            .ok()?
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_token() -> Self {
        Self::new(ErrorKind::Precondition, MISSING_TOKEN_MESSAGE)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn format() -> Self {
        Self::new(ErrorKind::Format, UNEXPECTED_FORMAT_MESSAGE)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Non-2xx response. Uses the body's `message` when present, otherwise a fixed fallback.
    pub fn server(status: u16, body: &str) -> Self {
        let message = ApiError::message_from_body(body)
            .unwrap_or_else(|| format!("Request failed (HTTP {status})"));
        Self::new(ErrorKind::Server { status }, message)
    }
}
