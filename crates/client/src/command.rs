//! Command dispatch
//!
//! [`CommandRunner`] turns one command body into one HTTP exchange:
//!
//! 1. wrap the body as `{"<name>": body}` and write it as JSON
//! 2. emit `Started`, send through the transport with the request timeout
//! 3. split the response into `data`, `status` and `errors`
//! 4. emit `Succeeded` or `Failed`
//!
//! A response with a non-empty `errors` array is a failure even when the
//! HTTP status is 200.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dataapi_serdes::{NumericMode, WireValue};
use serde_json::Map;
use tracing::{debug, warn};

use crate::error::{Error, ErrorDescriptor, Result};
use crate::events::{CommandEvent, CommandTarget, EventBus, EventListener};
use crate::http::{HttpRequest, Transport};

/// Path prefix of the JSON API
pub const API_PATH: &str = "api/json/v1";

/// Decoded response of one command
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// `data` block, if any
    pub data: Option<WireValue>,
    /// `status` block, if any
    pub status: Option<WireValue>,
    /// How untyped numbers in this response should be decoded
    pub numeric_mode: NumericMode,
}

impl RawResponse {
    /// Field of the `status` block
    pub fn status_field(&self, key: &str) -> Option<&WireValue> {
        self.status.as_ref().and_then(|s| s.get(key))
    }

    /// Field of the `data` block
    pub fn data_field(&self, key: &str) -> Option<&WireValue> {
        self.data.as_ref().and_then(|d| d.get(key))
    }
}

/// One command ready to send
#[derive(Debug, Clone)]
pub struct Command {
    /// Command name, e.g. `insertMany`
    pub name: String,
    /// Command body (the value under the name)
    pub body: WireValue,
    /// The body carries numbers beyond f64 precision
    pub big_numbers: bool,
}

impl Command {
    /// Create a command from a name and a body object
    pub fn new(name: impl Into<String>, body: Map<String, WireValue>) -> Self {
        Self {
            name: name.into(),
            body: WireValue::Object(body),
            big_numbers: false,
        }
    }

    /// Mark the body as carrying big numbers
    pub fn with_big_numbers(mut self, big_numbers: bool) -> Self {
        self.big_numbers |= big_numbers;
        self
    }
}

/// Sends commands for one client
pub(crate) struct CommandRunner {
    transport: Arc<dyn Transport>,
    endpoint: String,
    keyspace: String,
    token: Option<String>,
    enable_big_numbers: bool,
    events: EventBus,
}

impl CommandRunner {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        endpoint: &str,
        keyspace: &str,
        token: Option<String>,
        enable_big_numbers: bool,
        events: EventBus,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            keyspace: keyspace.to_string(),
            token,
            enable_big_numbers,
            events,
        }
    }

    pub(crate) fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub(crate) fn add_listener(&self, listener: Arc<dyn EventListener>) {
        self.events.add(listener);
    }

    fn url(&self, target: &CommandTarget) -> String {
        match &target.name {
            Some(name) => format!("{}/{}/{}/{}", self.endpoint, API_PATH, target.keyspace, name),
            None => format!("{}/{}/{}", self.endpoint, API_PATH, target.keyspace),
        }
    }

    /// Send a command and wait for its decoded response.
    ///
    /// # Errors
    ///
    /// - `Timeout` / `Transport` from the transport
    /// - `DataApi` if the response carries an `errors` array
    /// - `UnexpectedResponse` if the body is not a JSON object
    pub(crate) fn run(
        &self,
        target: &CommandTarget,
        command: Command,
        timeout: Duration,
    ) -> Result<RawResponse> {
        let Command {
            name,
            body,
            big_numbers,
        } = command;

        self.events.emit(CommandEvent::Started {
            command: name.clone(),
            target: target.clone(),
            timeout,
        });
        let started = Instant::now();

        let result = self.exchange(target, &name, body, big_numbers, timeout);

        let elapsed = started.elapsed();
        match &result {
            Ok(_) => {
                debug!(target: "dataapi::command", command = %name, %target, ?elapsed, "Command succeeded");
                self.events.emit(CommandEvent::Succeeded {
                    command: name,
                    target: target.clone(),
                    elapsed,
                });
            }
            Err(e) => {
                warn!(target: "dataapi::command", command = %name, %target, error = %e, "Command failed");
                self.events.emit(CommandEvent::Failed {
                    command: name,
                    target: target.clone(),
                    elapsed,
                    error: e.to_string(),
                });
            }
        }
        result
    }

    fn exchange(
        &self,
        target: &CommandTarget,
        name: &str,
        body: WireValue,
        big_numbers: bool,
        timeout: Duration,
    ) -> Result<RawResponse> {
        let mut envelope = Map::with_capacity(1);
        envelope.insert(name.to_string(), body);
        let request = HttpRequest {
            url: self.url(target),
            body: serde_json::to_string(&WireValue::Object(envelope))?,
            token: self.token.clone(),
            timeout,
            big_numbers,
        };

        let response = self.transport.send(&request)?;
        let parsed: WireValue = serde_json::from_str(&response.body).map_err(|e| {
            if response.status >= 400 {
                Error::Transport {
                    reason: format!("HTTP {}: {}", response.status, truncate(&response.body)),
                }
            } else {
                Error::from(e)
            }
        })?;

        let mut fields = match parsed {
            WireValue::Object(fields) => fields,
            other => {
                return Err(Error::UnexpectedResponse {
                    reason: format!("expected object, got {}", truncate(&other.to_string())),
                })
            }
        };

        if let Some(errors) = fields.remove("errors") {
            let descriptors: Vec<ErrorDescriptor> = serde_json::from_value(errors)?;
            if !descriptors.is_empty() {
                return Err(Error::DataApi {
                    errors: descriptors,
                });
            }
        }
        if response.status >= 400 {
            return Err(Error::Transport {
                reason: format!("HTTP {}", response.status),
            });
        }

        let numeric_mode = if self.enable_big_numbers || big_numbers {
            NumericMode::Extended
        } else {
            NumericMode::Standard
        };
        Ok(RawResponse {
            data: fields.remove("data"),
            status: fields.remove("status"),
            numeric_mode,
        })
    }
}

fn truncate(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}
