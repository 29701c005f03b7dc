//! HTTP transport
//!
//! The client talks to the service through the [`Transport`] trait so that
//! tests can substitute an in-memory server. [`UreqTransport`] is the real
//! implementation.

use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("dataapi-rs/", env!("CARGO_PKG_VERSION"));

/// Header carrying the application token
pub const TOKEN_HEADER: &str = "Token";

/// One outgoing command
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Full URL of the keyspace, collection or table
    pub url: String,
    /// Serialized command body
    pub body: String,
    /// Application token, if any
    pub token: Option<String>,
    /// Time allowed for the whole exchange
    pub timeout: Duration,
    /// The body carries integers or decimals beyond f64 precision
    pub big_numbers: bool,
}

/// Raw response as received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body text
    pub body: String,
}

/// Sends commands to the service
pub trait Transport: Send + Sync {
    /// Send one request and wait for its response.
    ///
    /// # Errors
    ///
    /// - `Timeout` if no response arrived within `request.timeout`
    /// - `Transport` for any other failure to complete the exchange
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// [`Transport`] backed by `ureq`
#[derive(Debug, Clone, Default)]
pub struct UreqTransport;

impl UreqTransport {
    /// Create a transport
    pub fn new() -> Self {
        Self
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(request.timeout))
            .http_status_as_error(false)
            .build();
        let agent = ureq::Agent::new_with_config(config);

        let mut builder = agent
            .post(&request.url)
            .header("Content-Type", "application/json")
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &request.token {
            builder = builder.header(TOKEN_HEADER, token);
        }

        debug!(
            target: "dataapi::http",
            url = %request.url,
            bytes = request.body.len(),
            big_numbers = request.big_numbers,
            "Sending command"
        );

        let mut response = builder.send(request.body.as_bytes()).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("timed out") || msg.contains("Timeout") {
                Error::Timeout {
                    timeout_ms: request.timeout.as_millis() as u64,
                }
            } else {
                Error::Transport { reason: msg }
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Transport {
                reason: format!("failed to read response: {}", e),
            })?;

        debug!(target: "dataapi::http", status, bytes = body.len(), "Received response");
        Ok(HttpResponse { status, body })
    }
}
