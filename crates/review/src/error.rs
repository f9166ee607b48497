use precinct_core::error::CoreError;

/// Errors surfaced by the review client.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("Precinct API error ({status} {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The request was rejected locally before reaching the network.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The service answered with a response variant that does not match the request.
    #[error("Unexpected response to {action}: {kind}")]
    UnexpectedResponse {
        action: &'static str,
        kind: String,
    },

    /// A local domain check failed for a reason other than bad input.
    #[error(transparent)]
    Core(CoreError),

    /// Missing or malformed client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReviewError {
    /// Whether the service reported the target row as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReviewError::Api { status: 404, .. })
    }
}

impl From<CoreError> for ReviewError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => ReviewError::Validation(msg),
            other => ReviewError::Core(other),
        }
    }
}
