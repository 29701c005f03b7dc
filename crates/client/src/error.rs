//! Error types for client operations.
//!
//! All errors surfaced by the client are represented by the [`Error`] enum.
//! These errors are:
//! - **Structured**: Each variant has typed fields for error details
//! - **Serializable**: Can be converted to/from JSON
//! - **Lossless**: Server error descriptors are kept as sent

use serde::{Deserialize, Serialize};

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// One entry of a server `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDescriptor {
    /// Machine-readable code such as `DOCUMENT_ALREADY_EXISTS`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
    /// Error family reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    /// Error scope reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl std::fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

/// Client operation errors.
///
/// # Categories
///
/// | Category | Variants | Description |
/// |----------|----------|-------------|
/// | Conversion | `Serialization`, `MissingSchema` | Host/wire value conversion failed |
/// | Cursor | `InvalidCursorConfig` | Rejected cursor options |
/// | Network | `Transport`, `Timeout` | The request did not complete |
/// | Server | `DataApi`, `UnexpectedResponse`, `TooManyDocumentsToCount` | The server refused or answered oddly |
/// | Setup | `Config` | Invalid configuration |
/// | System | `Internal` | Bug or invariant violation |
///
/// # Example
///
/// ```ignore
/// use dataapi_client::Error;
///
/// match collection.insert_one(doc) {
///     Ok(result) => println!("inserted {:?}", result.inserted_id),
///     Err(Error::DataApi { errors }) => {
///         for e in errors {
///             println!("server said: {}", e);
///         }
///     }
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // ==================== Conversion ====================
    /// A value could not be serialized or deserialized
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// A table response lacked the schema needed to decode it
    #[error("missing schema: {reason}")]
    MissingSchema { reason: String },

    // ==================== Cursor ====================
    /// Cursor options conflict or were set in the wrong order
    #[error("invalid cursor configuration: {reason}")]
    InvalidCursorConfig { reason: String },

    // ==================== Network ====================
    /// HTTP request failed (connection refused, bad status, etc.)
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// The request or operation ran out of time
    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ==================== Server ====================
    /// The server returned an `errors` array
    #[error("data api error: {}", format_descriptors(.errors))]
    DataApi { errors: Vec<ErrorDescriptor> },

    /// The response did not have the expected shape
    #[error("unexpected response: {reason}")]
    UnexpectedResponse { reason: String },

    /// A count exceeded the caller's upper bound
    #[error("too many documents to count: more than {limit}")]
    TooManyDocumentsToCount { limit: u64 },

    // ==================== Setup ====================
    /// Configuration could not be loaded or is invalid
    #[error("config error: {reason}")]
    Config { reason: String },

    // ==================== System ====================
    /// Internal error (bug or invariant violation)
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

fn format_descriptors(errors: &[ErrorDescriptor]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Check if retrying the same request might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Timeout { .. })
    }
}
