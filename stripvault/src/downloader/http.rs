//! HTTP client abstraction for testability

use std::time::Duration;

use super::FetchError;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("stripvault/", env!("CARGO_PKG_VERSION"));

/// Trait for HTTP client operations.
///
/// Sources take the client as a type parameter so tests can substitute a
/// mock.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    ///
    /// Non-success statuses are reported as [`FetchError::Http`].
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP client backed by reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with the default timeout and user agent.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_settings(DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT)
    }

    /// Creates a client with a custom timeout and user agent.
    pub fn with_settings(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes()?.to_vec())
    }
}
