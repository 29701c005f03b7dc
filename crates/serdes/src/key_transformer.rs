//! Key renaming between host and wire naming conventions
//!
//! A [`KeyTransformer`] is consulted by the engine immediately before it
//! visits a child stored under an object key or column name, in both
//! directions.
//!
//! # Contract
//!
//! For every key `k` a transformer accepts and every parent path `p`:
//!
//! ```text
//! to_host_key(to_wire_key(k, p), p) == k
//! ```
//!
//! The engine does not check this at runtime.

use std::fmt;

use dataapi_core::ValuePath;
use tracing::debug;

/// Bidirectional key renaming hook
pub trait KeyTransformer: Send + Sync + fmt::Debug {
    /// Rename a host key for the wire. `parent` is the path of the containing object.
    fn to_wire_key(&self, key: &str, parent: &ValuePath) -> String;

    /// Rename a wire key for the host. `parent` is the host path of the containing object.
    fn to_host_key(&self, key: &str, parent: &ValuePath) -> String;
}

/// Converts host `camelCase` keys to wire `snake_case` keys and back.
///
/// Each ASCII uppercase letter `X` becomes `_x` on the wire; each `_x`
/// (ASCII lowercase `x`) becomes `X` on the host. The round trip holds for
/// every host key without underscores.
///
/// Never renamed:
/// - operator keys starting with `$` (`$vector`, `$in`, `$setOnInsert`)
/// - `_id` when `except_id` is set
/// - nested keys when `transform_nested` is off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CamelToSnakeCase {
    /// Rename keys below the top level too
    pub transform_nested: bool,
    /// Leave `_id` untouched
    pub except_id: bool,
}

impl Default for CamelToSnakeCase {
    fn default() -> Self {
        Self {
            transform_nested: false,
            except_id: true,
        }
    }
}

impl CamelToSnakeCase {
    /// Create a transformer with explicit settings
    pub fn new(transform_nested: bool, except_id: bool) -> Self {
        Self {
            transform_nested,
            except_id,
        }
    }

    fn applies(&self, key: &str, parent: &ValuePath) -> bool {
        if key.starts_with('$') {
            return false;
        }
        if self.except_id && key == "_id" {
            return false;
        }
        self.transform_nested || parent.is_root()
    }

    /// Whether `key` under `parent` comes back unchanged from a wire round trip.
    ///
    /// Host keys holding `_` followed by a lowercase letter (`user_name`)
    /// come back camel-cased (`userName`).
    pub fn round_trips(&self, key: &str, parent: &ValuePath) -> bool {
        if !self.applies(key, parent) {
            return true;
        }
        !key
            .as_bytes()
            .windows(2)
            .any(|pair| pair[0] == b'_' && pair[1].is_ascii_lowercase())
    }
}

impl KeyTransformer for CamelToSnakeCase {
    fn to_wire_key(&self, key: &str, parent: &ValuePath) -> String {
        if !self.applies(key, parent) {
            return key.to_string();
        }
        if !self.round_trips(key, parent) {
            debug!(
                target: "dataapi::serdes",
                key,
                path = %parent,
                "Host key will not survive the wire round trip"
            );
        }
        let mut out = String::with_capacity(key.len() + 4);
        for c in key.chars() {
            if c.is_ascii_uppercase() {
                out.push('_');
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    fn to_host_key(&self, key: &str, parent: &ValuePath) -> String {
        if !self.applies(key, parent) {
            return key.to_string();
        }
        let mut out = String::with_capacity(key.len());
        let mut chars = key.chars().peekable();
        while let Some(c) = chars.next() {
            match (c, chars.peek()) {
                ('_', Some(next)) if next.is_ascii_lowercase() => {
                    out.push(next.to_ascii_uppercase());
                    chars.next();
                }
                _ => out.push(c),
            }
        }
        out
    }
}
