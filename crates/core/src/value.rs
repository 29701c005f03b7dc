//! Host value model
//!
//! [`Value`] is the tree application code reads and writes. The serialization
//! engine turns it into wire JSON and back; nothing in this module knows
//! about the wire.
//!
//! ## Type Rules
//!
//! - No implicit coercions: `Int(1) != Float(1.0)`, `Blob(b"a") != String("a")`
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//! - `Set` and `Map` keep insertion order; equality is order-sensitive
//! - `Date`, `Time`, `Duration`, `Inet`, `Set` and `Map` only exist in tables

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use num_bigint::BigInt;
use uuid::Uuid;

use crate::datatypes::{DataApiDuration, DataApiVector, ObjectId};

/// Host-side value for documents and rows.
#[derive(Debug, Clone)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// Integer outside the 64-bit range
    BigInt(BigInt),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// Arbitrary-precision decimal
    Decimal(BigDecimal),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Blob(Vec<u8>),
    /// Instant in UTC
    Timestamp(DateTime<Utc>),
    /// Calendar date without time zone
    Date(NaiveDate),
    /// Time of day without date
    Time(NaiveTime),
    /// Months/days/nanoseconds duration
    Duration(DataApiDuration),
    /// UUID
    Uuid(Uuid),
    /// 12-byte document id
    ObjectId(ObjectId),
    /// f32 embedding
    Vector(DataApiVector),
    /// IPv4 or IPv6 address
    Inet(IpAddr),
    /// Ordered list
    Array(Vec<Value>),
    /// Set of distinct values (insertion ordered)
    Set(Vec<Value>),
    /// Map with arbitrary keys (insertion ordered)
    Map(Vec<(Value, Value)>),
    /// Object with string keys
    Object(HashMap<String, Value>),
}

/// Discriminant of a [`Value`], used by the type-exact codec tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    /// [`Value::Null`]
    Null,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Int`]
    Int,
    /// [`Value::BigInt`]
    BigInt,
    /// [`Value::Float`]
    Float,
    /// [`Value::Decimal`]
    Decimal,
    /// [`Value::String`]
    String,
    /// [`Value::Blob`]
    Blob,
    /// [`Value::Timestamp`]
    Timestamp,
    /// [`Value::Date`]
    Date,
    /// [`Value::Time`]
    Time,
    /// [`Value::Duration`]
    Duration,
    /// [`Value::Uuid`]
    Uuid,
    /// [`Value::ObjectId`]
    ObjectId,
    /// [`Value::Vector`]
    Vector,
    /// [`Value::Inet`]
    Inet,
    /// [`Value::Array`]
    Array,
    /// [`Value::Set`]
    Set,
    /// [`Value::Map`]
    Map,
    /// [`Value::Object`]
    Object,
}

impl TypeTag {
    /// Host type name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Null => "Null",
            TypeTag::Bool => "Bool",
            TypeTag::Int => "Int",
            TypeTag::BigInt => "BigInt",
            TypeTag::Float => "Float",
            TypeTag::Decimal => "Decimal",
            TypeTag::String => "String",
            TypeTag::Blob => "Blob",
            TypeTag::Timestamp => "Timestamp",
            TypeTag::Date => "DataApiDate",
            TypeTag::Time => "DataApiTime",
            TypeTag::Duration => "DataApiDuration",
            TypeTag::Uuid => "Uuid",
            TypeTag::ObjectId => "ObjectId",
            TypeTag::Vector => "DataApiVector",
            TypeTag::Inet => "DataApiInet",
            TypeTag::Array => "Array",
            TypeTag::Set => "Set",
            TypeTag::Map => "Map",
            TypeTag::Object => "Object",
        }
    }

    /// Check if the type can only be stored in a table
    pub fn is_table_only(&self) -> bool {
        matches!(
            self,
            TypeTag::Date
                | TypeTag::Time
                | TypeTag::Duration
                | TypeTag::Inet
                | TypeTag::Set
                | TypeTag::Map
        )
    }

    /// Error hint for a table-only type used in a document
    pub fn table_only_hint(&self) -> Option<&'static str> {
        let hint = match self {
            TypeTag::Date => "use a Timestamp instead",
            TypeTag::Time | TypeTag::Duration | TypeTag::Inet => "store it as a string instead",
            TypeTag::Set => "use an Array instead",
            TypeTag::Map => "use an Object with string keys instead",
            _ => return None,
        };
        Some(hint)
    }

    /// Build the error for a table-only type used in a document
    pub fn table_only_error(&self) -> Option<crate::Error> {
        self.table_only_hint().map(|hint| crate::Error::TableOnlyType {
            type_name: self.name(),
            hint,
        })
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Custom PartialEq implementation for IEEE-754 float semantics
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::ObjectId(a), Value::ObjectId(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Inet(a), Value::Inet(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            // Different types are never equal
            _ => false,
        }
    }
}

impl Value {
    /// Get the type tag of this value
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::BigInt(_) => TypeTag::BigInt,
            Value::Float(_) => TypeTag::Float,
            Value::Decimal(_) => TypeTag::Decimal,
            Value::String(_) => TypeTag::String,
            Value::Blob(_) => TypeTag::Blob,
            Value::Timestamp(_) => TypeTag::Timestamp,
            Value::Date(_) => TypeTag::Date,
            Value::Time(_) => TypeTag::Time,
            Value::Duration(_) => TypeTag::Duration,
            Value::Uuid(_) => TypeTag::Uuid,
            Value::ObjectId(_) => TypeTag::ObjectId,
            Value::Vector(_) => TypeTag::Vector,
            Value::Inet(_) => TypeTag::Inet,
            Value::Array(_) => TypeTag::Array,
            Value::Set(_) => TypeTag::Set,
            Value::Map(_) => TypeTag::Map,
            Value::Object(_) => TypeTag::Object,
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        self.type_tag().name()
    }

    /// Build an object from key/value pairs
    pub fn object<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a container the engine descends into
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Value::Array(_) | Value::Set(_) | Value::Map(_) | Value::Object(_)
        )
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[Value] if this is an Array value
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as &HashMap if this is an Object value
    pub fn as_object(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Look up a field if this is an Object value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|o| o.get(key))
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f as f64)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(o: HashMap<String, Value>) -> Self {
        Value::Object(o)
    }
}

impl From<BigInt> for Value {
    fn from(i: BigInt) -> Self {
        Value::BigInt(i)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::Time(t)
    }
}

impl From<DataApiDuration> for Value {
    fn from(d: DataApiDuration) -> Self {
        Value::Duration(d)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::ObjectId(id)
    }
}

impl From<DataApiVector> for Value {
    fn from(v: DataApiVector) -> Self {
        Value::Vector(v)
    }
}

impl From<IpAddr> for Value {
    fn from(ip: IpAddr) -> Self {
        Value::Inet(ip)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
