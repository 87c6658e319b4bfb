//! Failures of a model call, classified by what the caller can do about them

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    fn with_kind(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::with_kind(LlmErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::with_kind(LlmErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::with_kind(LlmErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::with_kind(LlmErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::with_kind(LlmErrorKind::InvalidRequest, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::with_kind(LlmErrorKind::Unknown, message)
    }

    /// The provider refused our credentials; retrying the turn cannot help
    pub fn is_configuration(&self) -> bool {
        self.kind == LlmErrorKind::Auth
    }
}

/// HTTP-level classification of a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Timeouts, connect failures, truncated bodies
    Network,
    /// 429
    RateLimit,
    /// 5xx
    ServerError,
    /// 401 / 403
    Auth,
    /// 400
    InvalidRequest,
    Unknown,
}

impl LlmErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LlmErrorKind::Network => "network",
            LlmErrorKind::RateLimit => "rate_limit",
            LlmErrorKind::ServerError => "server_error",
            LlmErrorKind::Auth => "auth",
            LlmErrorKind::InvalidRequest => "invalid_request",
            LlmErrorKind::Unknown => "unknown",
        }
    }
}
