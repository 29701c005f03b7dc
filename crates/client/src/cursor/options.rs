//! Cursor options

use std::collections::{BTreeMap, HashMap};

use dataapi_core::Value;
use dataapi_serdes::WireValue;
use serde::{Deserialize, Serialize};

/// Options of a [`FindCursor`](super::FindCursor)
///
/// The filter is a host value and goes through the SerDes like a document.
/// Sort and projection are sent as written; sort key order is significant.
#[derive(Debug, Clone, PartialEq)]
pub struct FindOptions {
    /// Filter document
    pub filter: Value,
    /// Sort document
    pub sort: Option<WireValue>,
    /// Projection document
    pub projection: Option<WireValue>,
    /// Cap on records yielded over the cursor's lifetime
    pub limit: Option<u64>,
    /// Records to skip (needs a sort)
    pub skip: Option<u64>,
    /// Ask for `$similarity` on each record
    pub include_similarity: bool,
    /// Ask for the query vector the server sorted by
    pub include_sort_vector: bool,
    /// Resume from a page token
    pub initial_page_state: Option<String>,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            filter: Value::Object(HashMap::new()),
            sort: None,
            projection: None,
            limit: None,
            skip: None,
            include_similarity: false,
            include_sort_vector: false,
            initial_page_state: None,
        }
    }
}

/// Candidate limits of a hybrid search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HybridLimits {
    /// Same limit for every sub-query
    Single(u64),
    /// Limit per sub-query, e.g. `$vector` and `$lexical`
    PerQuery(BTreeMap<String, u64>),
}

/// Options of a [`FindAndRerankCursor`](super::FindAndRerankCursor)
#[derive(Debug, Clone, PartialEq)]
pub struct RerankOptions {
    /// Filter document
    pub filter: Value,
    /// Hybrid sort, e.g. `{"$hybrid": "text"}`
    pub sort: Option<WireValue>,
    /// Projection document
    pub projection: Option<WireValue>,
    /// Number of reranked results to return
    pub limit: Option<u64>,
    /// Candidates fetched by each sub-query before reranking
    pub hybrid_limits: Option<HybridLimits>,
    /// Field the reranker reads
    pub rerank_on: Option<String>,
    /// Query text the reranker scores against
    pub rerank_query: Option<String>,
    /// Ask for per-record scores
    pub include_scores: bool,
    /// Ask for the query vector the server sorted by
    pub include_sort_vector: bool,
}

impl Default for RerankOptions {
    fn default() -> Self {
        Self {
            filter: Value::Object(HashMap::new()),
            sort: None,
            projection: None,
            limit: None,
            hybrid_limits: None,
            rerank_on: None,
            rerank_query: None,
            include_scores: false,
            include_sort_vector: false,
        }
    }
}
