//! Error types for value conversion
//!
//! This module defines the error domain shared by the value model and the
//! serialization engine. We use `thiserror` for automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

/// Result type alias for value conversion
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while converting between host values and wire values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A table-only datatype was used inside a schemaless document
    #[error("{type_name} cannot be used in a collection document; {hint}")]
    TableOnlyType {
        /// Name of the offending host type
        type_name: &'static str,
        /// Suggested alternative
        hint: &'static str,
    },

    /// A table response arrived without the schema needed to decode it
    #[error("missing schema: {reason}")]
    MissingSchema {
        /// What was expected
        reason: String,
    },

    /// Server-declared schema could not be interpreted
    #[error("malformed schema for column '{column}': {reason}")]
    MalformedSchema {
        /// Column the schema entry belongs to
        column: String,
        /// Why it was rejected
        reason: String,
    },

    /// A wire value does not have the shape its type requires
    #[error("invalid wire value at {path}: expected {expected}, got {actual}")]
    InvalidWireValue {
        /// Rendered path of the value
        path: String,
        /// Expected shape
        expected: String,
        /// Observed shape
        actual: String,
    },

    /// A textual representation could not be parsed
    #[error("cannot parse {type_name} from '{input}': {reason}")]
    Parse {
        /// Target host type
        type_name: &'static str,
        /// Offending text
        input: String,
        /// Parser message
        reason: String,
    },

    /// A codec was rejected at registration
    #[error("invalid codec: {reason}")]
    InvalidCodec {
        /// Why it was rejected
        reason: String,
    },

    /// A user codec reported a failure
    #[error("codec error at {path}: {message}")]
    Codec {
        /// Rendered path of the value
        path: String,
        /// Codec message
        message: String,
    },
}

impl Error {
    /// Create a parse error
    pub fn parse(type_name: &'static str, input: impl Into<String>, reason: impl ToString) -> Self {
        Error::Parse {
            type_name,
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a codec error
    pub fn codec(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Codec {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid wire value error
    pub fn invalid_wire(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Error::InvalidWireValue {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a missing schema error
    pub fn missing_schema(reason: impl Into<String>) -> Self {
        Error::MissingSchema {
            reason: reason.into(),
        }
    }
}
