// Error handling module
// Gateway errors fan out to every caller queued on a refresh,
// so they stay cheap to clone.

use thiserror::Error;

/// Errors produced by the authenticated request gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// A refresh was attempted with no refresh token in the store.
    /// Treated like a rejected refresh for session purposes.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The backend refused the refresh token (expired, revoked, malformed).
    /// Terminal for the current session.
    #[error("token refresh rejected by server (status {status})")]
    RefreshRejected { status: u16 },

    /// The backend could not be reached, or its response could not be read.
    /// Does not invalidate the session on its own.
    #[error("network error: {0}")]
    Network(String),

    /// The request could not be constructed or its body replayed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() || err.is_request() {
            GatewayError::InvalidRequest(err.to_string())
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

/// Errors surfaced by the typed API clients.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport or token-refresh failure below the API layer.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The backend returned a non-success status with a `detail` message.
    #[error("API error: {status} - {detail}")]
    Api { status: u16, detail: String },

    /// The response body did not match the expected shape.
    #[error("failed to decode API response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Status code of the backend rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
