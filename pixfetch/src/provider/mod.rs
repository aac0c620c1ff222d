//! Resource transports.
//!
//! The dispatcher fetches through the [`Transport`] trait; [`HttpTransport`]
//! is the default, blocking HTTP implementation.

mod http;
mod types;

pub use http::{HttpTransport, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
pub use types::{Transport, TransportError};

#[cfg(test)]
pub use types::MockTransport;
