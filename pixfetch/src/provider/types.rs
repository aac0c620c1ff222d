//! Transport types and traits

use thiserror::Error;

/// Errors that can occur while fetching a resource.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The request never produced a response.
    #[error("Request failed: {0}")]
    Request(String),

    /// The response body could not be read.
    #[error("Failed to read response: {0}")]
    Body(String),

    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// Fetches the raw bytes behind an identity.
///
/// Implementations block the calling thread; the dispatcher only ever calls
/// them from worker pool threads.
pub trait Transport: Send + Sync {
    /// Fetch the resource named by `identity` (typically a URL).
    fn fetch(&self, identity: &str) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn fetch(&self, identity: &str) -> Result<Vec<u8>, TransportError> {
        (**self).fetch(identity)
    }
}

/// Mock transport for testing.
///
/// Returns the same response for every identity.
#[cfg(test)]
pub struct MockTransport {
    pub response: Result<Vec<u8>, TransportError>,
}

#[cfg(test)]
impl Transport for MockTransport {
    fn fetch(&self, _identity: &str) -> Result<Vec<u8>, TransportError> {
        self.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_status_error_message() {
        let err = TransportError::Status {
            status: 404,
            url: "https://example.com/missing.png".into(),
        };
        assert_eq!(err.to_string(), "HTTP 404 from https://example.com/missing.png");
    }

    #[test]
    fn test_arc_transport_delegates() {
        let transport = Arc::new(MockTransport {
            response: Ok(vec![1, 2, 3]),
        });
        assert_eq!(transport.fetch("anything"), Ok(vec![1, 2, 3]));
    }
}
