//! The serialization engine
//!
//! [`SerDes`] walks a host [`Value`] tree into wire JSON and back. At every
//! node it resolves a codec through the tiers of the [`CodecRegistry`]:
//!
//! 1. path: codecs whose pattern matches the full current path
//! 2. name: codecs registered for the last key of the path (`""` at the root)
//! 3. type: host type when serializing; declared column type (tables) or
//!    sigil key (documents) when deserializing
//! 4. guard: predicate codecs in registration order
//! 5. the built-in default for the universe
//!
//! Inside a tier codecs run in registration order. The first one that does
//! not decline decides the node: `Done` ends the visit, `Continue` replaces
//! the value and jumps straight to the built-in default, which recurses
//! into containers.
//!
//! # Mutation
//!
//! Serialization never writes into the host tree. [`SerDes::serialize`]
//! borrows it and copies leaves into a fresh wire tree;
//! [`SerDes::serialize_owned`] consumes it and moves strings and
//! containers into the wire tree instead of copying them.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use dataapi_core::{Error, PathSegment, Result, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::builtins::{self, documents, tables};
use crate::codec::{DesAction, SerAction, Universe};
use crate::context::{DesCtx, DesTarget, SerCtx};
use crate::key_transformer::KeyTransformer;
use crate::registry::CodecRegistry;
use crate::schema::{ColumnType, ResponseSchema};
use crate::wire::{self, NumericMode, WireValue};

/// Behaviour switches for a [`SerDes`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerDesOptions {
    /// Let the client hand owned values to the engine, which then moves
    /// their contents into the wire tree
    pub mutate_in_place: bool,
    /// Leave columns absent from a table response absent in the row
    pub sparse_data: bool,
    /// Decode out-of-range integers and long decimals in responses exactly
    pub enable_big_numbers: bool,
    /// Encode vectors as `$binary` (default: tables yes, documents no)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_vectors: Option<bool>,
}

impl SerDesOptions {
    fn binary_vectors(&self, universe: Universe) -> bool {
        self.binary_vectors
            .unwrap_or(universe == Universe::Tables)
    }

    fn numeric_mode(&self) -> NumericMode {
        if self.enable_big_numbers {
            NumericMode::Extended
        } else {
            NumericMode::Standard
        }
    }
}

/// Result of one serialize call
#[derive(Debug, Clone, PartialEq)]
pub struct Serialized {
    /// The wire tree
    pub wire: WireValue,
    /// Whether any big integer or decimal was encoded
    pub big_numbers: bool,
}

enum Resolved<T, W> {
    Done(T),
    Continue(W),
    Pass,
}

/// Serializer/deserializer bound to one universe
#[derive(Clone)]
pub struct SerDes {
    universe: Universe,
    registry: Arc<CodecRegistry>,
    options: SerDesOptions,
    keys: Option<Arc<dyn KeyTransformer>>,
}

impl std::fmt::Debug for SerDes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerDes")
            .field("universe", &self.universe)
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("keys", &self.keys)
            .finish()
    }
}

impl SerDes {
    /// Create an engine for a universe
    pub fn new(universe: Universe, registry: Arc<CodecRegistry>, options: SerDesOptions) -> Self {
        Self {
            universe,
            registry,
            options,
            keys: None,
        }
    }

    /// Engine for collection documents
    pub fn documents(registry: Arc<CodecRegistry>, options: SerDesOptions) -> Self {
        Self::new(Universe::Documents, registry, options)
    }

    /// Engine for table rows
    pub fn tables(registry: Arc<CodecRegistry>, options: SerDesOptions) -> Self {
        Self::new(Universe::Tables, registry, options)
    }

    /// Rename keys with a transformer
    pub fn with_key_transformer(mut self, keys: Arc<dyn KeyTransformer>) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Universe of this engine
    pub fn universe(&self) -> Universe {
        self.universe
    }

    /// Options of this engine
    pub fn options(&self) -> &SerDesOptions {
        &self.options
    }

    // =========================================================================
    // Serialize
    // =========================================================================

    /// Serialize a borrowed value
    pub fn serialize(&self, value: &Value) -> Result<Serialized> {
        self.serialize_cow(Cow::Borrowed(value))
    }

    /// Serialize a value, reusing its allocations
    pub fn serialize_owned(&self, value: Value) -> Result<Serialized> {
        self.serialize_cow(Cow::Owned(value))
    }

    /// Serialize a value the caller hands over, honouring `mutate_in_place`
    pub fn serialize_value(&self, value: Value) -> Result<Serialized> {
        if self.options.mutate_in_place {
            self.serialize_owned(value)
        } else {
            self.serialize(&value)
        }
    }

    fn serialize_cow(&self, value: Cow<'_, Value>) -> Result<Serialized> {
        let mut ctx = SerCtx::new(self.universe);
        let wire = self.ser_node(value, &mut ctx)?;
        Ok(Serialized {
            wire,
            big_numbers: ctx.big_numbers(),
        })
    }

    fn ser_node(&self, value: Cow<'_, Value>, ctx: &mut SerCtx) -> Result<WireValue> {
        let value = match self.resolve_ser(&value, ctx)? {
            Resolved::Done(wire) => return Ok(wire),
            Resolved::Continue(replacement) => Cow::Owned(replacement),
            Resolved::Pass => value,
        };
        self.ser_default(value, ctx)
    }

    fn resolve_ser(&self, value: &Value, ctx: &mut SerCtx) -> Result<Resolved<WireValue, Value>> {
        let tiers = &self.registry.universe(self.universe).ser;

        let by_path = tiers
            .paths
            .iter()
            .filter(|(pattern, _)| pattern.matches(ctx.path()))
            .map(|(_, f)| f);
        let by_name = ctx
            .name()
            .and_then(|name| tiers.names.get(name))
            .into_iter()
            .flatten();
        let by_type = tiers.types.get(&value.type_tag()).into_iter().flatten();
        let candidates: Vec<_> = by_path.chain(by_name).chain(by_type).cloned().collect();

        for f in candidates {
            match f(value, ctx)? {
                SerAction::Done(wire) => return Ok(Resolved::Done(wire)),
                SerAction::Continue(replacement) => return Ok(Resolved::Continue(replacement)),
                SerAction::Decline => {}
            }
        }

        for (guard, f) in &tiers.guards {
            if guard.as_ref().map_or(true, |g| g(value, &*ctx)) {
                match f(value, ctx)? {
                    SerAction::Done(wire) => return Ok(Resolved::Done(wire)),
                    SerAction::Continue(replacement) => return Ok(Resolved::Continue(replacement)),
                    SerAction::Decline => {}
                }
            }
        }
        Ok(Resolved::Pass)
    }

    fn ser_default(&self, value: Cow<'_, Value>, ctx: &mut SerCtx) -> Result<WireValue> {
        if self.universe == Universe::Documents {
            if let Some(err) = value.type_tag().table_only_error() {
                return Err(err);
            }
        }
        match value {
            Cow::Borrowed(Value::Array(items)) | Cow::Borrowed(Value::Set(items)) => {
                self.ser_items(items.iter().map(Cow::Borrowed), ctx)
            }
            Cow::Owned(Value::Array(items)) | Cow::Owned(Value::Set(items)) => {
                self.ser_items(items.into_iter().map(Cow::Owned), ctx)
            }
            Cow::Borrowed(Value::Object(fields)) => self.ser_fields(
                fields
                    .iter()
                    .map(|(k, v)| (Cow::Borrowed(k.as_str()), Cow::Borrowed(v))),
                ctx,
            ),
            Cow::Owned(Value::Object(fields)) => self.ser_fields(
                fields.into_iter().map(|(k, v)| (Cow::Owned(k), Cow::Owned(v))),
                ctx,
            ),
            Cow::Borrowed(Value::Map(pairs)) => {
                let textual = pairs.iter().all(|(k, _)| matches!(k, Value::String(_)));
                self.ser_map(
                    pairs.iter().map(|(k, v)| (Cow::Borrowed(k), Cow::Borrowed(v))),
                    textual,
                    ctx,
                )
            }
            Cow::Owned(Value::Map(pairs)) => {
                let textual = pairs.iter().all(|(k, _)| matches!(k, Value::String(_)));
                self.ser_map(
                    pairs.into_iter().map(|(k, v)| (Cow::Owned(k), Cow::Owned(v))),
                    textual,
                    ctx,
                )
            }
            Cow::Owned(Value::String(s)) => Ok(WireValue::String(s)),
            leaf => {
                let binary = self.options.binary_vectors(self.universe);
                match self.universe {
                    Universe::Documents => documents::encode(&leaf, ctx, binary),
                    Universe::Tables => tables::encode(&leaf, ctx, binary),
                }
            }
        }
    }

    fn ser_items<'v, I>(&self, items: I, ctx: &mut SerCtx) -> Result<WireValue>
    where
        I: Iterator<Item = Cow<'v, Value>>,
    {
        let mut out = Vec::with_capacity(items.size_hint().0);
        for (i, item) in items.enumerate() {
            ctx.path.push(PathSegment::Index(i));
            let wire = self.ser_node(item, ctx);
            ctx.path.pop();
            out.push(wire?);
        }
        Ok(WireValue::Array(out))
    }

    fn ser_fields<'v, I>(&self, fields: I, ctx: &mut SerCtx) -> Result<WireValue>
    where
        I: Iterator<Item = (Cow<'v, str>, Cow<'v, Value>)>,
    {
        let mut out = serde_json::Map::new();
        for (key, value) in fields {
            let wire_key = match &self.keys {
                Some(keys) => keys.to_wire_key(&key, ctx.path()),
                None => key.to_string(),
            };
            ctx.path.push(PathSegment::Key(key.into_owned()));
            let wire = self.ser_node(value, ctx);
            ctx.path.pop();
            out.insert(wire_key, wire?);
        }
        Ok(WireValue::Object(out))
    }

    /// Maps with only string keys become objects; any other key type
    /// becomes an array of `[key, value]` pairs.
    fn ser_map<'v, I>(&self, pairs: I, textual: bool, ctx: &mut SerCtx) -> Result<WireValue>
    where
        I: Iterator<Item = (Cow<'v, Value>, Cow<'v, Value>)>,
    {
        if textual {
            let fields = pairs.filter_map(|(k, v)| match k {
                Cow::Borrowed(Value::String(s)) => Some((Cow::Borrowed(s.as_str()), v)),
                Cow::Owned(Value::String(s)) => Some((Cow::Owned(s), v)),
                _ => None,
            });
            return self.with_keys_disabled(|engine| engine.ser_fields(fields, ctx));
        }

        let mut out = Vec::new();
        for (i, (key, value)) in pairs.enumerate() {
            ctx.path.push(PathSegment::Index(i));
            ctx.path.push(PathSegment::Index(0));
            let wire_key = self.ser_node(key, ctx);
            ctx.path.pop();
            ctx.path.push(PathSegment::Index(1));
            let wire_value = self.ser_node(value, ctx);
            ctx.path.pop();
            ctx.path.pop();
            out.push(WireValue::Array(vec![wire_key?, wire_value?]));
        }
        Ok(WireValue::Array(out))
    }

    /// Map keys are data, not field names; they are never renamed.
    fn with_keys_disabled<T>(&self, f: impl FnOnce(&SerDes) -> T) -> T {
        if self.keys.is_none() {
            return f(self);
        }
        let plain = SerDes {
            universe: self.universe,
            registry: Arc::clone(&self.registry),
            options: self.options.clone(),
            keys: None,
        };
        f(&plain)
    }

    // =========================================================================
    // Deserialize
    // =========================================================================

    /// Deserialize a document or a row
    pub fn deserialize_record(
        &self,
        wire: &WireValue,
        schema: Option<&ResponseSchema>,
    ) -> Result<Value> {
        self.deserialize(wire, schema, DesTarget::Record)
    }

    /// Deserialize a primary-key tuple into an object keyed by column
    pub fn deserialize_primary_key(
        &self,
        wire: &WireValue,
        schema: &ResponseSchema,
    ) -> Result<Value> {
        self.deserialize(wire, Some(schema), DesTarget::PrimaryKey)
    }

    /// Deserialize with the engine's numeric mode
    pub fn deserialize(
        &self,
        wire: &WireValue,
        schema: Option<&ResponseSchema>,
        target: DesTarget,
    ) -> Result<Value> {
        self.deserialize_with_mode(wire, schema, target, self.options.numeric_mode())
    }

    /// Deserialize with an explicit numeric mode.
    ///
    /// # Errors
    ///
    /// - `MissingSchema` if a table payload comes without a schema
    /// - `InvalidWireValue` / `Parse` if a value does not fit its declared type
    /// - any error returned by a codec
    pub fn deserialize_with_mode(
        &self,
        wire: &WireValue,
        schema: Option<&ResponseSchema>,
        target: DesTarget,
        mode: NumericMode,
    ) -> Result<Value> {
        if self.universe == Universe::Tables && schema.is_none() {
            return Err(Error::missing_schema(match target {
                DesTarget::Record => "table row without projectionSchema",
                DesTarget::PrimaryKey => "primary key without primaryKeySchema",
            }));
        }
        let mut ctx = DesCtx::new(self.universe, schema, target, mode);
        match (target, schema) {
            (DesTarget::PrimaryKey, Some(schema)) => self.des_primary_key(wire, schema, &mut ctx),
            _ => self.des_node(Cow::Borrowed(wire), &mut ctx),
        }
    }

    fn des_primary_key<'a>(
        &self,
        wire: &WireValue,
        schema: &'a ResponseSchema,
        ctx: &mut DesCtx<'a>,
    ) -> Result<Value> {
        let items = wire.as_array().ok_or_else(|| {
            Error::invalid_wire(ctx.path().to_string(), "primary key tuple", wire::kind(wire))
        })?;
        let columns = schema.columns();
        if items.len() != columns.len() {
            return Err(Error::invalid_wire(
                ctx.path().to_string(),
                format!("tuple of {} values", columns.len()),
                format!("tuple of {} values", items.len()),
            ));
        }

        let mut out = HashMap::with_capacity(columns.len());
        for ((column, column_type), item) in columns.iter().zip(items) {
            let host_key = self.host_key(column, ctx);
            let decoded = self.des_child(
                PathSegment::Key(host_key.clone()),
                Some(column_type),
                Cow::Borrowed(item),
                ctx,
            )?;
            out.insert(host_key, decoded);
        }
        Ok(Value::Object(out))
    }

    fn des_node<'a>(&self, value: Cow<'_, WireValue>, ctx: &mut DesCtx<'a>) -> Result<Value> {
        let value = match self.resolve_des(&value, ctx)? {
            Resolved::Done(host) => return Ok(host),
            Resolved::Continue(replacement) => Cow::Owned(replacement),
            Resolved::Pass => value,
        };
        match self.universe {
            Universe::Documents => self.des_document(&value, ctx),
            Universe::Tables => self.des_table(&value, ctx),
        }
    }

    fn resolve_des(&self, value: &WireValue, ctx: &mut DesCtx<'_>) -> Result<Resolved<Value, WireValue>> {
        let tiers = &self.registry.universe(self.universe).des;

        let type_key = match self.universe {
            Universe::Tables => ctx.declared_type().map(ColumnType::type_name),
            Universe::Documents => wire::as_sigil(value).map(|(key, _)| key),
        };
        let by_path = tiers
            .paths
            .iter()
            .filter(|(pattern, _)| pattern.matches(ctx.path()))
            .map(|(_, f)| f);
        let by_name = ctx
            .name()
            .and_then(|name| tiers.names.get(name))
            .into_iter()
            .flatten();
        let by_type = type_key
            .and_then(|key| tiers.types.get(key))
            .into_iter()
            .flatten();
        let candidates: Vec<_> = by_path.chain(by_name).chain(by_type).cloned().collect();

        for f in candidates {
            match f(value, ctx)? {
                DesAction::Done(host) => return Ok(Resolved::Done(host)),
                DesAction::Continue(replacement) => return Ok(Resolved::Continue(replacement)),
                DesAction::Decline => {}
            }
        }

        for (guard, f) in &tiers.guards {
            if guard.as_ref().map_or(true, |g| g(value, &*ctx)) {
                match f(value, ctx)? {
                    DesAction::Done(host) => return Ok(Resolved::Done(host)),
                    DesAction::Continue(replacement) => return Ok(Resolved::Continue(replacement)),
                    DesAction::Decline => {}
                }
            }
        }
        Ok(Resolved::Pass)
    }

    /// Visit one child with its path segment and declared type set, then restore both.
    fn des_child<'a>(
        &self,
        segment: PathSegment,
        declared: Option<&'a ColumnType>,
        value: Cow<'_, WireValue>,
        ctx: &mut DesCtx<'a>,
    ) -> Result<Value> {
        let saved = std::mem::replace(&mut ctx.declared, declared);
        ctx.path.push(segment);
        let decoded = self.des_node(value, ctx);
        ctx.path.pop();
        ctx.declared = saved;
        decoded
    }

    fn host_key(&self, wire_key: &str, ctx: &DesCtx<'_>) -> String {
        match &self.keys {
            Some(keys) => keys.to_host_key(wire_key, ctx.path()),
            None => wire_key.to_string(),
        }
    }

    fn des_document(&self, value: &WireValue, ctx: &mut DesCtx<'_>) -> Result<Value> {
        if documents::is_vector_field(ctx.path()) && !value.is_null() {
            return builtins::decode_vector(value, ctx.path()).map(Value::Vector);
        }
        if let Some((key, payload)) = wire::as_sigil(value) {
            if let Some(decoded) = documents::decode_sigil(key, payload, ctx.path())? {
                return Ok(decoded);
            }
        }
        self.des_untyped(value, ctx)
    }

    /// Structural decoding without type information
    fn des_untyped(&self, value: &WireValue, ctx: &mut DesCtx<'_>) -> Result<Value> {
        let decoded = match value {
            WireValue::Null => Value::Null,
            WireValue::Bool(b) => Value::Bool(*b),
            WireValue::Number(n) => wire::number_to_value(n, ctx.numeric_mode()),
            WireValue::String(s) => Value::String(s.clone()),
            WireValue::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(self.des_child(PathSegment::Index(i), None, Cow::Borrowed(item), ctx)?);
                }
                Value::Array(out)
            }
            WireValue::Object(fields) => {
                if self.universe == Universe::Tables {
                    if let Some((wire::BINARY, _)) = wire::as_sigil(value) {
                        return builtins::decode_blob(value, ctx.path()).map(Value::Blob);
                    }
                }
                let mut out = HashMap::with_capacity(fields.len());
                for (key, item) in fields {
                    let host_key = self.host_key(key, ctx);
                    let decoded =
                        self.des_child(PathSegment::Key(host_key.clone()), None, Cow::Borrowed(item), ctx)?;
                    out.insert(host_key, decoded);
                }
                Value::Object(out)
            }
        };
        Ok(decoded)
    }

    fn des_table<'a>(&self, value: &WireValue, ctx: &mut DesCtx<'a>) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if ctx.path().is_root() && !ctx.parsing_primary_key() {
            return self.des_row(value, ctx);
        }

        let declared = match ctx.declared_type() {
            Some(declared) => declared,
            None => return self.des_untyped(value, ctx),
        };
        match declared {
            ColumnType::Scalar(scalar) => {
                tables::decode_scalar(*scalar, value, ctx.path(), ctx.numeric_mode())
            }
            ColumnType::Vector { .. } => builtins::decode_vector(value, ctx.path()).map(Value::Vector),
            ColumnType::List(element) => self.des_elements(value, element, ctx).map(Value::Array),
            ColumnType::Set(element) => self.des_elements(value, element, ctx).map(Value::Set),
            ColumnType::Map(key_type, value_type) => self.des_map(value, key_type, value_type, ctx),
            ColumnType::Unsupported(raw) => {
                warn!(
                    target: "dataapi::serdes",
                    path = %ctx.path(),
                    column_type = %raw,
                    "Unsupported column type, decoding untyped"
                );
                self.des_untyped(value, ctx)
            }
        }
    }

    /// Decode a top-level row, filling absent schema columns first
    fn des_row<'a>(&self, value: &WireValue, ctx: &mut DesCtx<'a>) -> Result<Value> {
        let fields = value.as_object().ok_or_else(|| {
            Error::invalid_wire(ctx.path().to_string(), "row object", wire::kind(value))
        })?;
        let schema = match ctx.schema() {
            Some(schema) => schema,
            None => return Err(Error::missing_schema("table row without projectionSchema")),
        };

        let absent: Vec<(&'a str, &'a ColumnType)> = if self.options.sparse_data {
            Vec::new()
        } else {
            schema
                .columns()
                .iter()
                .filter(|(name, _)| !fields.contains_key(name))
                .map(|(name, column_type)| (name.as_str(), column_type))
                .collect()
        };
        if !absent.is_empty() {
            debug!(target: "dataapi::serdes", columns = absent.len(), "Populating sparse row columns");
        }

        let present = fields
            .iter()
            .map(|(k, v)| (k.as_str(), schema.column(k), Cow::Borrowed(v)));
        let populated = absent
            .into_iter()
            .map(|(k, t)| (k, Some(t), Cow::Owned(t.sparse_default())));

        let mut out = HashMap::with_capacity(fields.len());
        for (wire_key, declared, item) in present.chain(populated) {
            let host_key = self.host_key(wire_key, ctx);
            let decoded = self.des_child(PathSegment::Key(host_key.clone()), declared, item, ctx)?;
            out.insert(host_key, decoded);
        }
        Ok(Value::Object(out))
    }

    fn des_elements<'a>(
        &self,
        value: &WireValue,
        element: &'a ColumnType,
        ctx: &mut DesCtx<'a>,
    ) -> Result<Vec<Value>> {
        let items = value.as_array().ok_or_else(|| {
            Error::invalid_wire(ctx.path().to_string(), "array", wire::kind(value))
        })?;
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            out.push(self.des_child(PathSegment::Index(i), Some(element), Cow::Borrowed(item), ctx)?);
        }
        Ok(out)
    }

    fn des_map<'a>(
        &self,
        value: &WireValue,
        key_type: &'a ColumnType,
        value_type: &'a ColumnType,
        ctx: &mut DesCtx<'a>,
    ) -> Result<Value> {
        let scalar_key = match key_type {
            ColumnType::Scalar(s) => Some(*s),
            _ => None,
        };
        let mut out = Vec::new();
        match value {
            WireValue::Object(fields) => {
                for (key, item) in fields {
                    let host_key = match scalar_key {
                        Some(s) => {
                            let key_wire = tables::map_key_to_wire(key, Some(s));
                            tables::decode_scalar(s, &key_wire, ctx.path(), ctx.numeric_mode())?
                        }
                        None => Value::String(key.clone()),
                    };
                    let decoded = self.des_child(
                        PathSegment::Key(key.clone()),
                        Some(value_type),
                        Cow::Borrowed(item),
                        ctx,
                    )?;
                    out.push((host_key, decoded));
                }
            }
            WireValue::Array(pairs) => {
                for (i, pair) in pairs.iter().enumerate() {
                    let (k, v) = match pair.as_array().map(Vec::as_slice) {
                        Some([k, v]) => (k, v),
                        _ => {
                            return Err(Error::invalid_wire(
                                format!("{}[{}]", ctx.path(), i),
                                "[key, value] pair",
                                wire::kind(pair),
                            ))
                        }
                    };
                    ctx.path.push(PathSegment::Index(i));
                    let key = self.des_child(PathSegment::Index(0), Some(key_type), Cow::Borrowed(k), ctx);
                    let val = key.and_then(|key| {
                        self.des_child(PathSegment::Index(1), Some(value_type), Cow::Borrowed(v), ctx)
                            .map(|val| (key, val))
                    });
                    ctx.path.pop();
                    out.push(val?);
                }
            }
            other => {
                return Err(Error::invalid_wire(
                    ctx.path().to_string(),
                    "object or array of pairs",
                    wire::kind(other),
                ))
            }
        }
        Ok(Value::Map(out))
    }
}
