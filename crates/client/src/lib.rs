//! Client for the DataAPI HTTP interface
//!
//! This crate sends commands to a DataAPI service and exposes:
//! - DataApiClient: entry point holding transport, codecs and listeners
//! - Collection / Table: typed operations on one collection or table
//! - FindCursor / FindAndRerankCursor: lazily paginated result cursors
//! - CommandEvent: lifecycle notifications for every command sent
//! - ClientConfig: TOML-loadable configuration
//!
//! Values travel through the `dataapi-serdes` engine on the way out and
//! back in, so custom codecs registered on the client apply to every
//! operation.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod collection;
mod command;
pub mod config;
mod convert;
pub mod cursor;
mod db;
mod endpoint;
pub mod error;
pub mod events;
pub mod http;
pub mod options;
pub mod results;
mod table;

pub use collection::Collection;
pub use command::{Command, RawResponse, API_PATH};
pub use config::{ClientConfig, EventFilter, KeyTransform, LoggingConfig, SerdesConfig, Timeouts};
pub use cursor::{
    CursorState, FindAndRerankCursor, FindCursor, FindOptions, HybridLimits, Page, PageFetcher,
    PageRequest, PageToken, RerankFetcher, RerankOptions, RerankRequest, RerankedResult,
    MAX_IN_MEMORY_SORT_LIMIT,
};
pub use db::DataApiClient;
pub use error::{Error, ErrorDescriptor, Result};
pub use events::{CommandEvent, CommandTarget, EventListener};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use options::{
    CommandOptions, DeleteOneOptions, FindOneOptions, InsertManyOptions, UpdateOneOptions,
};
pub use results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult};
pub use table::Table;
