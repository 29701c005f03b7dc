//! Client entry point

use std::sync::Arc;

use dataapi_serdes::{CodecRegistry, SerDes, WireValue};
use tracing::info;

use crate::collection::Collection;
use crate::command::{Command, CommandRunner, RawResponse};
use crate::config::{ClientConfig, Timeouts};
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::events::{CommandTarget, EventBus, EventListener};
use crate::http::{Transport, UreqTransport};
use crate::table::Table;

/// Client for one keyspace of a DataAPI service.
///
/// Collections and tables obtained from the client share its transport,
/// codecs and listeners. Cloning the client is cheap.
///
/// # Example
///
/// ```ignore
/// use dataapi::{ClientConfig, DataApiClient, Value};
///
/// let client = DataApiClient::new(ClientConfig::from_file("dataapi.toml".as_ref())?)?;
/// let users = client.collection("users");
/// users.insert_one(Value::object([("name", Value::from("ada"))]), Default::default())?;
/// ```
#[derive(Clone)]
pub struct DataApiClient {
    config: Arc<ClientConfig>,
    runner: Arc<CommandRunner>,
    codecs: Arc<CodecRegistry>,
}

impl std::fmt::Debug for DataApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataApiClient")
            .field("endpoint", &self.config.endpoint)
            .field("keyspace", &self.config.keyspace)
            .field("codecs", &self.codecs)
            .finish()
    }
}

impl DataApiClient {
    /// Create a client that talks HTTP through `ureq`.
    ///
    /// # Errors
    ///
    /// `Config` if the configuration is invalid.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(UreqTransport::new()))
    }

    /// Create a client over any transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let token = config.resolve_token();
        info!(
            target: "dataapi::client",
            endpoint = %config.endpoint,
            keyspace = %config.keyspace,
            has_token = token.is_some(),
            "Client created"
        );
        let runner = CommandRunner::new(
            transport,
            &config.endpoint,
            &config.keyspace,
            token,
            config.serdes.options.enable_big_numbers,
            EventBus::new(config.logging.events),
        );
        Ok(Self {
            config: Arc::new(config),
            runner: Arc::new(runner),
            codecs: CodecRegistry::empty(),
        })
    }

    /// Use `codecs` for every collection and table obtained afterwards
    pub fn with_codecs(mut self, codecs: Arc<CodecRegistry>) -> Self {
        self.codecs = codecs;
        self
    }

    /// Configuration the client was built from
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Register a command event listener
    pub fn add_listener(&self, listener: Arc<dyn EventListener>) {
        self.runner.add_listener(listener);
    }

    fn endpoint(&self, name: &str, serdes: SerDes, timeouts: Timeouts) -> Endpoint {
        let serdes = match self.config.serdes.key_transformer() {
            Some(keys) => serdes.with_key_transformer(keys),
            None => serdes,
        };
        Endpoint::new(
            Arc::clone(&self.runner),
            name,
            serdes,
            timeouts.merge(&self.config.timeouts),
        )
    }

    /// Handle on a collection; no request is sent
    pub fn collection(&self, name: &str) -> Collection {
        self.collection_with_timeouts(name, Timeouts::default())
    }

    /// Handle on a collection with its own timeout defaults
    pub fn collection_with_timeouts(&self, name: &str, timeouts: Timeouts) -> Collection {
        let serdes = SerDes::documents(Arc::clone(&self.codecs), self.config.serdes.options.clone());
        Collection::new(self.endpoint(name, serdes, timeouts))
    }

    /// Handle on a table; no request is sent
    pub fn table(&self, name: &str) -> Table {
        self.table_with_timeouts(name, Timeouts::default())
    }

    /// Handle on a table with its own timeout defaults
    pub fn table_with_timeouts(&self, name: &str, timeouts: Timeouts) -> Table {
        let serdes = SerDes::tables(Arc::clone(&self.codecs), self.config.serdes.options.clone());
        Table::new(self.endpoint(name, serdes, timeouts))
    }

    /// Send a raw keyspace-level command such as `{"findCollections": {}}`.
    ///
    /// # Errors
    ///
    /// `Serialization` unless `command` is an object with exactly one key,
    /// or any error of the exchange.
    pub fn command(&self, command: WireValue) -> Result<RawResponse> {
        let (name, body) = match command {
            WireValue::Object(fields) if fields.len() == 1 => {
                let mut fields = fields.into_iter();
                match fields.next() {
                    Some((name, WireValue::Object(body))) => (name, body),
                    _ => return Err(raw_command_error()),
                }
            }
            _ => return Err(raw_command_error()),
        };
        let timeout = self.config.timeouts.request_timeout();
        self.runner.run(
            &CommandTarget::keyspace(self.runner.keyspace()),
            Command::new(name, body),
            timeout,
        )
    }
}

fn raw_command_error() -> Error {
    Error::Serialization {
        reason: "a command is an object with one key mapping to an object body".into(),
    }
}
