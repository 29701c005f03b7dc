//! Error conversion from lower-layer error types.
//!
//! This module maps value-conversion errors from `dataapi-core` and
//! response-parsing errors from `serde_json` onto the client [`Error`].

use crate::Error;
use dataapi_core::Error as CoreError;

/// Convert a value-conversion error to a client error.
///
/// Schema problems keep their own variant so callers can tell a broken
/// response apart from an unserializable value.
impl From<CoreError> for Error {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingSchema { reason } => Error::MissingSchema { reason },
            CoreError::MalformedSchema { column, reason } => Error::MissingSchema {
                reason: format!("malformed schema for column '{}': {}", column, reason),
            },
            CoreError::InvalidCodec { reason } => Error::Config {
                reason: format!("invalid codec: {}", reason),
            },
            other @ (CoreError::TableOnlyType { .. }
            | CoreError::InvalidWireValue { .. }
            | CoreError::Parse { .. }
            | CoreError::Codec { .. }) => Error::Serialization {
                reason: other.to_string(),
            },
        }
    }
}

/// Convert a JSON parse failure of a response body.
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::UnexpectedResponse {
            reason: format!("invalid JSON: {}", err),
        }
    }
}
