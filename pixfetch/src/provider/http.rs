//! HTTP transport using a blocking reqwest client.

use super::types::{Transport, TransportError};
use std::time::Duration;
use tracing::{debug, trace};

/// Default User-Agent string for HTTP requests.
/// Some image hosts reject requests without one.
pub const DEFAULT_USER_AGENT: &str = concat!("pixfetch/", env!("CARGO_PKG_VERSION"));

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Real HTTP transport implementation using reqwest.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Creates a new HttpTransport with default configuration.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_options(DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT)
    }

    /// Creates a new HttpTransport with custom timeout and User-Agent.
    pub fn with_options(timeout_secs: u64, user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, identity: &str) -> Result<Vec<u8>, TransportError> {
        trace!(url = identity, "HTTP GET request starting");

        let response = self
            .client
            .get(identity)
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = identity, status = status.as_u16(), "HTTP GET failed");
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: identity.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| TransportError::Body(e.to_string()))?;

        trace!(url = identity, bytes = bytes.len(), "HTTP GET complete");
        Ok(bytes)
    }
}
