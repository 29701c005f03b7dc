//! Common test utilities for client tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use dataapi::{ClientConfig, DataApiClient, Error, HttpRequest, HttpResponse, Result, Transport};
use parking_lot::Mutex;
use serde_json::Value as Json;

pub const ENDPOINT: &str = "http://localhost:8181";

/// Transport answering from a queue of canned responses and recording
/// every request it receives
#[derive(Default)]
pub struct Scripted {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl Scripted {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a 200 response with a JSON body
    pub fn reply(&self, body: Json) -> &Self {
        self.reply_raw(200, body.to_string())
    }

    /// Queue a response with any status and body text
    pub fn reply_raw(&self, status: u16, body: impl Into<String>) -> &Self {
        self.responses.lock().push_back(HttpResponse {
            status,
            body: body.into(),
        });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Parsed body of the `i`-th request
    pub fn body(&self, i: usize) -> Json {
        serde_json::from_str(&self.requests.lock()[i].body).unwrap()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Transport for Scripted {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push(request.clone());
        self.responses.lock().pop_front().ok_or_else(|| Error::Transport {
            reason: "no scripted response left".into(),
        })
    }
}

/// Config pointing at [`ENDPOINT`] with a fixed token
pub fn config() -> ClientConfig {
    ClientConfig {
        token: Some("test-token".into()),
        ..ClientConfig::new(ENDPOINT)
    }
}

pub fn client(server: &Arc<Scripted>) -> DataApiClient {
    client_with(config(), server)
}

pub fn client_with(config: ClientConfig, server: &Arc<Scripted>) -> DataApiClient {
    DataApiClient::with_transport(config, server.clone()).unwrap()
}
