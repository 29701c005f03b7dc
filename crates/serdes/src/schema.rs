//! Server-declared table schema
//!
//! Table responses describe their columns in the `status` block:
//!
//! ```json
//! {"status": {"projectionSchema": {"name": {"type": "text"},
//!                                  "tags": {"type": "set", "valueType": "text"}}}}
//! ```
//!
//! Insert responses carry `primaryKeySchema` instead, describing the
//! positional tuples in `insertedIds`.

use std::fmt;

use dataapi_core::{Error, Result};

use crate::wire::{self, WireValue};

/// Key of the projected-column schema in a response status
pub const PROJECTION_SCHEMA: &str = "projectionSchema";
/// Key of the primary-key schema in a response status
pub const PRIMARY_KEY_SCHEMA: &str = "primaryKeySchema";

/// Scalar column types; variants mirror the server type names
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Ascii,
    Bigint,
    Blob,
    Boolean,
    Counter,
    Date,
    Decimal,
    Double,
    Duration,
    Float,
    Inet,
    Int,
    Smallint,
    Text,
    Time,
    Timestamp,
    Timeuuid,
    Tinyint,
    Uuid,
    Varchar,
    Varint,
}

impl ScalarType {
    /// Parse a server type name
    pub fn from_name(name: &str) -> Option<Self> {
        let t = match name {
            "ascii" => ScalarType::Ascii,
            "bigint" => ScalarType::Bigint,
            "blob" => ScalarType::Blob,
            "boolean" => ScalarType::Boolean,
            "counter" => ScalarType::Counter,
            "date" => ScalarType::Date,
            "decimal" => ScalarType::Decimal,
            "double" => ScalarType::Double,
            "duration" => ScalarType::Duration,
            "float" => ScalarType::Float,
            "inet" => ScalarType::Inet,
            "int" => ScalarType::Int,
            "smallint" => ScalarType::Smallint,
            "text" => ScalarType::Text,
            "time" => ScalarType::Time,
            "timestamp" => ScalarType::Timestamp,
            "timeuuid" => ScalarType::Timeuuid,
            "tinyint" => ScalarType::Tinyint,
            "uuid" => ScalarType::Uuid,
            "varchar" => ScalarType::Varchar,
            "varint" => ScalarType::Varint,
            _ => return None,
        };
        Some(t)
    }

    /// Server type name
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Ascii => "ascii",
            ScalarType::Bigint => "bigint",
            ScalarType::Blob => "blob",
            ScalarType::Boolean => "boolean",
            ScalarType::Counter => "counter",
            ScalarType::Date => "date",
            ScalarType::Decimal => "decimal",
            ScalarType::Double => "double",
            ScalarType::Duration => "duration",
            ScalarType::Float => "float",
            ScalarType::Inet => "inet",
            ScalarType::Int => "int",
            ScalarType::Smallint => "smallint",
            ScalarType::Text => "text",
            ScalarType::Time => "time",
            ScalarType::Timestamp => "timestamp",
            ScalarType::Timeuuid => "timeuuid",
            ScalarType::Tinyint => "tinyint",
            ScalarType::Uuid => "uuid",
            ScalarType::Varchar => "varchar",
            ScalarType::Varint => "varint",
        }
    }

    /// Check if values of this type are strings on the wire
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            ScalarType::Ascii | ScalarType::Text | ScalarType::Varchar
        )
    }
}

/// Declared type of a column or collection element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// Scalar column
    Scalar(ScalarType),
    /// `list<T>`
    List(Box<ColumnType>),
    /// `set<T>`
    Set(Box<ColumnType>),
    /// `map<K, V>`
    Map(Box<ColumnType>, Box<ColumnType>),
    /// `vector<float, N>`
    Vector {
        /// Declared dimension, if reported
        dimension: Option<usize>,
    },
    /// A type the client does not understand; values pass through untyped
    Unsupported(String),
}

impl ColumnType {
    /// Wire type name, used by the type-exact codec tier
    pub fn type_name(&self) -> &str {
        match self {
            ColumnType::Scalar(s) => s.name(),
            ColumnType::List(_) => "list",
            ColumnType::Set(_) => "set",
            ColumnType::Map(_, _) => "map",
            ColumnType::Vector { .. } => "vector",
            ColumnType::Unsupported(raw) => raw,
        }
    }

    /// Wire value a sparse response stands for when this column is absent
    pub fn sparse_default(&self) -> WireValue {
        match self {
            ColumnType::List(_) | ColumnType::Set(_) => WireValue::Array(Vec::new()),
            ColumnType::Map(_, _) => WireValue::Object(serde_json::Map::new()),
            _ => WireValue::Null,
        }
    }

    /// Parse a column definition (`{"type": ..., "valueType": ..., ...}` or a bare type name)
    pub fn parse(definition: &WireValue, column: &str) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedSchema {
            column: column.to_string(),
            reason,
        };

        let (type_name, def) = match definition {
            WireValue::String(name) => (name.as_str(), None),
            WireValue::Object(obj) => {
                let name = obj
                    .get("type")
                    .and_then(WireValue::as_str)
                    .ok_or_else(|| malformed("missing 'type'".to_string()))?;
                (name, Some(obj))
            }
            other => {
                return Err(malformed(format!(
                    "expected object or string, got {}",
                    wire::kind(other)
                )))
            }
        };

        let element = |key: &str| -> Result<Box<ColumnType>> {
            let inner = def
                .and_then(|d| d.get(key))
                .ok_or_else(|| malformed(format!("'{}' requires '{}'", type_name, key)))?;
            Ok(Box::new(ColumnType::parse(inner, column)?))
        };

        let parsed = match type_name {
            "list" => ColumnType::List(element("valueType")?),
            "set" => ColumnType::Set(element("valueType")?),
            "map" => ColumnType::Map(element("keyType")?, element("valueType")?),
            "vector" => ColumnType::Vector {
                dimension: def
                    .and_then(|d| d.get("dimension"))
                    .and_then(WireValue::as_u64)
                    .map(|d| d as usize),
            },
            other => match ScalarType::from_name(other) {
                Some(scalar) => ColumnType::Scalar(scalar),
                None => ColumnType::Unsupported(other.to_string()),
            },
        };
        Ok(parsed)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Scalar(s) => f.write_str(s.name()),
            ColumnType::List(v) => write!(f, "list<{}>", v),
            ColumnType::Set(v) => write!(f, "set<{}>", v),
            ColumnType::Map(k, v) => write!(f, "map<{}, {}>", k, v),
            ColumnType::Vector { dimension: Some(d) } => write!(f, "vector<float, {}>", d),
            ColumnType::Vector { dimension: None } => f.write_str("vector<float>"),
            ColumnType::Unsupported(raw) => f.write_str(raw),
        }
    }
}

/// Column metadata accompanying one table response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseSchema {
    /// Projected columns of a row response, in server order
    Projection(Vec<(String, ColumnType)>),
    /// Primary-key columns, in key order
    PrimaryKey(Vec<(String, ColumnType)>),
}

impl ResponseSchema {
    fn parse_columns(schema: &WireValue, key: &str) -> Result<Vec<(String, ColumnType)>> {
        let obj = schema.as_object().ok_or_else(|| Error::MalformedSchema {
            column: key.to_string(),
            reason: format!("expected object, got {}", wire::kind(schema)),
        })?;
        obj.iter()
            .map(|(name, def)| Ok((name.clone(), ColumnType::parse(def, name)?)))
            .collect()
    }

    /// Read the projection schema from a response `status` block
    pub fn projection_from_status(status: Option<&WireValue>) -> Result<Self> {
        let schema = status
            .and_then(|s| s.get(PROJECTION_SCHEMA))
            .ok_or_else(|| Error::missing_schema(format!("response has no {}", PROJECTION_SCHEMA)))?;
        Ok(ResponseSchema::Projection(Self::parse_columns(
            schema,
            PROJECTION_SCHEMA,
        )?))
    }

    /// Read the primary-key schema from a response `status` block
    pub fn primary_key_from_status(status: Option<&WireValue>) -> Result<Self> {
        let schema = status
            .and_then(|s| s.get(PRIMARY_KEY_SCHEMA))
            .ok_or_else(|| Error::missing_schema(format!("response has no {}", PRIMARY_KEY_SCHEMA)))?;
        Ok(ResponseSchema::PrimaryKey(Self::parse_columns(
            schema,
            PRIMARY_KEY_SCHEMA,
        )?))
    }

    /// Columns in schema order
    pub fn columns(&self) -> &[(String, ColumnType)] {
        match self {
            ResponseSchema::Projection(cols) | ResponseSchema::PrimaryKey(cols) => cols,
        }
    }

    /// Declared type of a column
    pub fn column(&self, name: &str) -> Option<&ColumnType> {
        self.columns()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }
}
