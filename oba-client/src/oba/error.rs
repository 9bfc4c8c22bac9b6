//! OneBusAway client error types.

/// Message shown to users when the API is rate limiting us.
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again after a few seconds.";

/// Errors from the OneBusAway HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ObaError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429 from the API
    #[error("rate limited by OneBusAway API (HTTP 429)")]
    RateLimited,

    /// Any other non-success HTTP status
    #[error("HTTP status {status}: {message}")]
    Status { status: u16, message: String },

    /// HTTP 200, but the response envelope carried a non-200 `code`
    #[error("API error code {code}: {text}")]
    ApiCode { code: i64, text: String },

    /// Response body was not the JSON we expected
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Client configuration was rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ObaError {
    pub(crate) fn json(err: impl std::fmt::Display, body: Option<&str>) -> Self {
        ObaError::Json {
            message: err.to_string(),
            body: body.map(|b| b.chars().take(500).collect()),
        }
    }

    /// Whether the request that produced this error is worth retrying.
    ///
    /// Only rate limiting and server-side (5xx) failures qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            ObaError::RateLimited => true,
            ObaError::Status { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ObaError::RateLimited)
    }

    /// Text suitable for showing to a rider, e.g. `user_message("arrivals")`.
    pub fn user_message(&self, what: &str) -> String {
        if self.is_rate_limited() {
            RATE_LIMIT_MESSAGE.to_string()
        } else {
            format!("Failed to load {what}: {self}")
        }
    }
}
