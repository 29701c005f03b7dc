//! Codec registry
//!
//! Codecs are collected with a [`CodecRegistryBuilder`] and frozen into a
//! [`CodecRegistry`]. The frozen registry is shared by `Arc` between every
//! serdes instance that uses it and is never mutated again.
//!
//! Each universe keeps one index per direction. Inside each index the
//! codecs are split by tier so resolution never scans codecs that cannot
//! match:
//!
//! | Tier | Index |
//! |------|-------|
//! | path | list of `(pattern, fn)` |
//! | name | map from key to fns |
//! | type | map from host type / wire type name to fns |
//! | guard | list of `(predicate, fn)` |

use std::collections::HashMap;
use std::sync::Arc;

use dataapi_core::{Error, PathPattern, Result, TypeTag};
use tracing::debug;

use crate::codec::{Codec, DesFn, DesGuard, MatchCriterion, SerFn, SerGuard, Universe};

/// Serialize-direction tiers of one universe
#[derive(Default, Clone)]
pub(crate) struct SerTiers {
    pub(crate) paths: Vec<(PathPattern, SerFn)>,
    pub(crate) names: HashMap<String, Vec<SerFn>>,
    pub(crate) types: HashMap<TypeTag, Vec<SerFn>>,
    pub(crate) guards: Vec<(Option<SerGuard>, SerFn)>,
}

/// Deserialize-direction tiers of one universe
#[derive(Default, Clone)]
pub(crate) struct DesTiers {
    pub(crate) paths: Vec<(PathPattern, DesFn)>,
    pub(crate) names: HashMap<String, Vec<DesFn>>,
    pub(crate) types: HashMap<String, Vec<DesFn>>,
    pub(crate) guards: Vec<(Option<DesGuard>, DesFn)>,
}

impl SerTiers {
    fn len(&self) -> usize {
        self.paths.len()
            + self.names.values().map(Vec::len).sum::<usize>()
            + self.types.values().map(Vec::len).sum::<usize>()
            + self.guards.len()
    }
}

impl DesTiers {
    fn len(&self) -> usize {
        self.paths.len()
            + self.names.values().map(Vec::len).sum::<usize>()
            + self.types.values().map(Vec::len).sum::<usize>()
            + self.guards.len()
    }
}

#[derive(Default, Clone)]
pub(crate) struct UniverseCodecs {
    pub(crate) ser: SerTiers,
    pub(crate) des: DesTiers,
}

/// Immutable set of codecs for both universes
#[derive(Default, Clone)]
pub struct CodecRegistry {
    documents: UniverseCodecs,
    tables: UniverseCodecs,
}

impl CodecRegistry {
    /// Start collecting codecs
    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::default()
    }

    /// A registry with no user codecs; only built-in defaults apply
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn universe(&self, universe: Universe) -> &UniverseCodecs {
        match universe {
            Universe::Documents => &self.documents,
            Universe::Tables => &self.tables,
        }
    }

    /// Number of registered codec functions for a universe
    pub fn len(&self, universe: Universe) -> usize {
        let codecs = self.universe(universe);
        codecs.ser.len() + codecs.des.len()
    }

    /// Check if a universe has no user codecs
    pub fn is_empty(&self, universe: Universe) -> bool {
        self.len(universe) == 0
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("documents", &self.len(Universe::Documents))
            .field("tables", &self.len(Universe::Tables))
            .finish()
    }
}

/// Mutable registration phase of a [`CodecRegistry`]
#[derive(Default, Debug)]
pub struct CodecRegistryBuilder {
    registry: CodecRegistry,
}

impl CodecRegistryBuilder {
    /// Register a codec for one universe.
    ///
    /// Codecs in the same tier are tried in the order they were registered.
    ///
    /// # Errors
    ///
    /// - `InvalidCodec` if the codec has neither a serialize nor a deserialize function
    /// - `TableOnlyType` if a type codec targets a table-only type in documents
    pub fn register(&mut self, universe: Universe, codec: Codec) -> Result<&mut Self> {
        let Codec {
            criterion,
            serialize,
            deserialize,
        } = codec;

        if serialize.is_none() && deserialize.is_none() {
            return Err(Error::InvalidCodec {
                reason: format!("{:?} has no serialize or deserialize function", criterion),
            });
        }

        let target = match universe {
            Universe::Documents => &mut self.registry.documents,
            Universe::Tables => &mut self.registry.tables,
        };

        match criterion {
            MatchCriterion::Path(pattern) => {
                if let Some(f) = serialize {
                    target.ser.paths.push((pattern.clone(), f));
                }
                if let Some(f) = deserialize {
                    target.des.paths.push((pattern, f));
                }
            }
            MatchCriterion::Name(name) => {
                if let Some(f) = serialize {
                    target.ser.names.entry(name.clone()).or_default().push(f);
                }
                if let Some(f) = deserialize {
                    target.des.names.entry(name).or_default().push(f);
                }
            }
            MatchCriterion::Type { host, wire } => {
                if let (Universe::Documents, Some(tag)) = (universe, host) {
                    if let Some(err) = tag.table_only_error() {
                        return Err(err);
                    }
                }
                if host.is_none() && wire.is_none() {
                    return Err(Error::InvalidCodec {
                        reason: "type codec names neither a host nor a wire type".to_string(),
                    });
                }
                if host.is_none() && serialize.is_some() {
                    return Err(Error::InvalidCodec {
                        reason: "serialize function on a wire-only type codec".to_string(),
                    });
                }
                if wire.is_none() && deserialize.is_some() {
                    return Err(Error::InvalidCodec {
                        reason: "deserialize function on a host-only type codec; add a wire type"
                            .to_string(),
                    });
                }
                if let (Some(tag), Some(f)) = (host, serialize) {
                    target.ser.types.entry(tag).or_default().push(f);
                }
                if let (Some(name), Some(f)) = (wire, deserialize) {
                    target.des.types.entry(name).or_default().push(f);
                }
            }
            MatchCriterion::Guard { ser, des } => {
                if let Some(f) = serialize {
                    target.ser.guards.push((ser, f));
                }
                if let Some(f) = deserialize {
                    target.des.guards.push((des, f));
                }
            }
        }
        Ok(self)
    }

    /// Freeze the registry
    pub fn build(self) -> Arc<CodecRegistry> {
        debug!(
            target: "dataapi::serdes",
            documents = self.registry.len(Universe::Documents),
            tables = self.registry.len(Universe::Tables),
            "Codec registry built"
        );
        Arc::new(self.registry)
    }
}
