//! Review client configuration.
//!
//! | Variable             | Required | Default                 |
//! |----------------------|----------|-------------------------|
//! | `PRECINCT_API_URL`   | no       | `http://localhost:3000` |
//! | `PRECINCT_API_TOKEN` | yes      | --                      |

use crate::error::ReviewError;

/// Default service base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Connection settings for the device review service.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Base URL without a trailing slash, e.g. `http://host:3000`.
    pub api_url: String,
    /// Bearer token carrying the `admin` role.
    pub api_token: String,
}

impl ReviewConfig {
    pub fn new(api_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ReviewError> {
        let api_url =
            std::env::var("PRECINCT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_token = std::env::var("PRECINCT_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ReviewError::Config("PRECINCT_API_TOKEN must be set".into()))?;
        Ok(Self::new(api_url, api_token))
    }

    /// Full URL of the review RPC endpoint.
    pub fn review_url(&self) -> String {
        format!("{}/api/v1/device-review", self.api_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ReviewConfig::new("http://precinct.local:3000/", "t");
        assert_eq!(
            config.review_url(),
            "http://precinct.local:3000/api/v1/device-review"
        );
    }
}
