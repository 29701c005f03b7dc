//! Codec definitions
//!
//! A [`Codec`] pairs a [`MatchCriterion`] with a serialize function, a
//! deserialize function, or both. Codecs are registered into a
//! [`CodecRegistry`](crate::CodecRegistry) for one [`Universe`] and are
//! immutable afterwards.
//!
//! # Example
//!
//! ```
//! use dataapi_serdes::{Codec, DesAction, SerAction};
//! use dataapi_core::Value;
//!
//! let doubled = Codec::for_name("age")
//!     .serialize(|value, _ctx| match value {
//!         Value::Int(i) => Ok(SerAction::Done(serde_json::json!(i * 2))),
//!         _ => Ok(SerAction::Decline),
//!     })
//!     .deserialize(|wire, _ctx| match wire.as_i64() {
//!         Some(i) => Ok(DesAction::Done(Value::Int(i / 2))),
//!         None => Ok(DesAction::Decline),
//!     });
//! ```

use std::fmt;
use std::sync::Arc;

use dataapi_core::{PathPattern, Result, TypeTag, Value};

use crate::context::{DesCtx, SerCtx};
use crate::wire::WireValue;

/// The two independent schema universes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Universe {
    /// Schemaless JSON documents (collections)
    Documents,
    /// Server-declared typed columns (tables)
    Tables,
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Universe::Documents => f.write_str("documents"),
            Universe::Tables => f.write_str("tables"),
        }
    }
}

/// Outcome of a serialize codec
#[derive(Debug, Clone, PartialEq)]
pub enum SerAction {
    /// Use this wire value; do not descend into it
    Done(WireValue),
    /// Substitute this host value and keep traversing it normally
    Continue(Value),
    /// Not handled here; try the next codec or tier
    Decline,
}

/// Outcome of a deserialize codec
#[derive(Debug, Clone, PartialEq)]
pub enum DesAction {
    /// Use this host value; do not descend into it
    Done(Value),
    /// Substitute this wire value and keep traversing it normally
    Continue(WireValue),
    /// Not handled here; try the next codec or tier
    Decline,
}

/// Serialize function signature
pub type SerFn = Arc<dyn Fn(&Value, &mut SerCtx) -> Result<SerAction> + Send + Sync>;
/// Deserialize function signature
pub type DesFn = Arc<dyn Fn(&WireValue, &mut DesCtx<'_>) -> Result<DesAction> + Send + Sync>;
/// Serialize-side guard predicate
pub type SerGuard = Arc<dyn Fn(&Value, &SerCtx) -> bool + Send + Sync>;
/// Deserialize-side guard predicate
pub type DesGuard = Arc<dyn Fn(&WireValue, &DesCtx<'_>) -> bool + Send + Sync>;

/// What a codec matches against.
#[derive(Clone)]
pub enum MatchCriterion {
    /// The entire current path (wildcards allowed)
    Path(PathPattern),
    /// The last path key; `""` names the root object
    Name(String),
    /// Host type on serialize; wire type name on deserialize.
    ///
    /// For tables the wire type name is the declared column type (`"set"`,
    /// `"text"`, ...). For documents it is the sigil (`"$date"`, `"$uuid"`, ...).
    Type {
        /// Host type matched when serializing
        host: Option<TypeTag>,
        /// Wire type matched when deserializing
        wire: Option<String>,
    },
    /// Predicate functions, tried in registration order
    Guard {
        /// Predicate used when serializing
        ser: Option<SerGuard>,
        /// Predicate used when deserializing
        des: Option<DesGuard>,
    },
}

impl fmt::Debug for MatchCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchCriterion::Path(p) => f.debug_tuple("Path").field(p).finish(),
            MatchCriterion::Name(n) => f.debug_tuple("Name").field(n).finish(),
            MatchCriterion::Type { host, wire } => f
                .debug_struct("Type")
                .field("host", host)
                .field("wire", wire)
                .finish(),
            MatchCriterion::Guard { ser, des } => f
                .debug_struct("Guard")
                .field("ser", &ser.is_some())
                .field("des", &des.is_some())
                .finish(),
        }
    }
}

/// A registered conversion rule.
#[derive(Clone)]
pub struct Codec {
    pub(crate) criterion: MatchCriterion,
    pub(crate) serialize: Option<SerFn>,
    pub(crate) deserialize: Option<DesFn>,
}

impl Codec {
    fn with_criterion(criterion: MatchCriterion) -> Self {
        Self {
            criterion,
            serialize: None,
            deserialize: None,
        }
    }

    /// Match the entire current path
    pub fn for_path(pattern: PathPattern) -> Self {
        Self::with_criterion(MatchCriterion::Path(pattern))
    }

    /// Match the last key of the current path (`""` for the root object)
    pub fn for_name(name: impl Into<String>) -> Self {
        Self::with_criterion(MatchCriterion::Name(name.into()))
    }

    /// Match a host type when serializing
    pub fn for_type(tag: TypeTag) -> Self {
        Self::with_criterion(MatchCriterion::Type {
            host: Some(tag),
            wire: None,
        })
    }

    /// Match a wire type name when deserializing
    pub fn for_wire_type(name: impl Into<String>) -> Self {
        Self::with_criterion(MatchCriterion::Type {
            host: None,
            wire: Some(name.into()),
        })
    }

    /// Match with predicates; a codec without a predicate for a direction
    /// is considered for every node in that direction
    pub fn custom() -> Self {
        Self::with_criterion(MatchCriterion::Guard {
            ser: None,
            des: None,
        })
    }

    /// Also match this wire type name when deserializing (type codecs only)
    pub fn and_wire_type(mut self, name: impl Into<String>) -> Self {
        if let MatchCriterion::Type { wire, .. } = &mut self.criterion {
            *wire = Some(name.into());
        }
        self
    }

    /// Serialize-side predicate (guard codecs only)
    pub fn ser_guard<F>(mut self, guard: F) -> Self
    where
        F: Fn(&Value, &SerCtx) -> bool + Send + Sync + 'static,
    {
        if let MatchCriterion::Guard { ser, .. } = &mut self.criterion {
            *ser = Some(Arc::new(guard));
        }
        self
    }

    /// Deserialize-side predicate (guard codecs only)
    pub fn des_guard<F>(mut self, guard: F) -> Self
    where
        F: Fn(&WireValue, &DesCtx<'_>) -> bool + Send + Sync + 'static,
    {
        if let MatchCriterion::Guard { des, .. } = &mut self.criterion {
            *des = Some(Arc::new(guard));
        }
        self
    }

    /// Attach the serialize function
    pub fn serialize<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &mut SerCtx) -> Result<SerAction> + Send + Sync + 'static,
    {
        self.serialize = Some(Arc::new(f));
        self
    }

    /// Attach the deserialize function
    pub fn deserialize<F>(mut self, f: F) -> Self
    where
        F: Fn(&WireValue, &mut DesCtx<'_>) -> Result<DesAction> + Send + Sync + 'static,
    {
        self.deserialize = Some(Arc::new(f));
        self
    }

    /// The match criterion
    pub fn criterion(&self) -> &MatchCriterion {
        &self.criterion
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("criterion", &self.criterion)
            .field("serialize", &self.serialize.is_some())
            .field("deserialize", &self.deserialize.is_some())
            .finish()
    }
}
