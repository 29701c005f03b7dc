//! Command plumbing shared by collections and tables
//!
//! An [`Endpoint`] is one named collection or table. It builds command
//! bodies through its SerDes, sends them through the client's runner and
//! decodes the records of the response. The documents universe decodes
//! records by their sigils; the tables universe needs the schema the
//! server sends along in `status`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dataapi_core::Value;
use dataapi_serdes::{wire, DesTarget, ResponseSchema, SerDes, Serialized, Universe, WireValue};
use serde_json::Map;
use tracing::debug;

use crate::command::{Command, CommandRunner, RawResponse};
use crate::config::Timeouts;
use crate::cursor::{
    reranked, FindOptions, Page, PageFetcher, PageRequest, RerankFetcher, RerankRequest,
    RerankedResult,
};
use crate::error::{Error, Result};
use crate::events::CommandTarget;
use crate::options::{
    CommandOptions, DeleteOneOptions, FindOneOptions, InsertManyOptions, UpdateOneOptions,
};
use crate::results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult};

/// Tracks the remaining time of an operation made of several requests
struct Deadline {
    end: Instant,
    timeouts: Timeouts,
}

impl Deadline {
    fn start(timeouts: Timeouts) -> Self {
        Self {
            end: Instant::now() + timeouts.general_method_timeout(),
            timeouts,
        }
    }

    /// Timeout for the next request: the request timeout, capped by what is left
    fn next_request(&self) -> Result<Duration> {
        let left = self.end.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(Error::Timeout {
                timeout_ms: self.timeouts.general_method_timeout().as_millis() as u64,
            });
        }
        Ok(left.min(self.timeouts.request_timeout()))
    }
}

/// Body of a command under construction
struct Body {
    fields: Map<String, WireValue>,
    options: Map<String, WireValue>,
    big_numbers: bool,
}

impl Body {
    fn new() -> Self {
        Self {
            fields: Map::new(),
            options: Map::new(),
            big_numbers: false,
        }
    }

    fn set(&mut self, key: &str, value: WireValue) -> &mut Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    fn set_opt(&mut self, key: &str, value: Option<&WireValue>) -> &mut Self {
        if let Some(value) = value {
            self.fields.insert(key.to_string(), value.clone());
        }
        self
    }

    fn option(&mut self, key: &str, value: impl Into<WireValue>) -> &mut Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    fn add(&mut self, serialized: Serialized) -> WireValue {
        self.big_numbers |= serialized.big_numbers;
        serialized.wire
    }

    fn into_command(self, name: &str) -> Command {
        let Body {
            mut fields,
            options,
            big_numbers,
        } = self;
        if !options.is_empty() {
            fields.insert("options".to_string(), WireValue::Object(options));
        }
        Command::new(name, fields).with_big_numbers(big_numbers)
    }
}

/// One collection or table
pub(crate) struct Endpoint {
    runner: Arc<CommandRunner>,
    target: CommandTarget,
    serdes: SerDes,
    timeouts: Timeouts,
}

impl Endpoint {
    pub(crate) fn new(
        runner: Arc<CommandRunner>,
        name: &str,
        serdes: SerDes,
        timeouts: Timeouts,
    ) -> Self {
        let target = CommandTarget::named(runner.keyspace(), name);
        Self {
            runner,
            target,
            serdes,
            timeouts,
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.target.name.as_deref().unwrap_or_default()
    }

    pub(crate) fn keyspace(&self) -> &str {
        &self.target.keyspace
    }

    /// Call overrides layered over this endpoint's defaults
    pub(crate) fn timeouts(&self, call: &Timeouts) -> Timeouts {
        call.merge(&self.timeouts)
    }

    fn run(&self, body: Body, name: &'static str, timeout: Duration) -> Result<RawResponse> {
        self.runner.run(&self.target, body.into_command(name), timeout)
    }

    fn filter(&self, body: &mut Body, filter: &Value) -> Result<()> {
        let wire = body.add(self.serdes.serialize(filter)?);
        body.set("filter", wire);
        Ok(())
    }

    // =========================================================================
    // Decoding
    // =========================================================================

    fn schema(&self, response: &RawResponse) -> Result<Option<ResponseSchema>> {
        match self.serdes.universe() {
            Universe::Documents => Ok(None),
            Universe::Tables => Ok(Some(ResponseSchema::projection_from_status(
                response.status.as_ref(),
            )?)),
        }
    }

    fn decode(&self, wire: &WireValue, schema: Option<&ResponseSchema>, response: &RawResponse) -> Result<Value> {
        Ok(self
            .serdes
            .deserialize_with_mode(wire, schema, DesTarget::Record, response.numeric_mode)?)
    }

    /// Decode `data.documents`
    fn decode_documents(&self, response: &RawResponse) -> Result<Vec<Value>> {
        let documents = match response.data_field("documents") {
            Some(WireValue::Array(documents)) => documents,
            Some(other) => {
                return Err(Error::UnexpectedResponse {
                    reason: format!("data.documents is {}", wire::kind(other)),
                })
            }
            None => return Ok(Vec::new()),
        };
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let schema = self.schema(response)?;
        documents
            .iter()
            .map(|doc| self.decode(doc, schema.as_ref(), response))
            .collect()
    }

    /// Decode `data.document`, which is `null` when nothing matched
    fn decode_document(&self, response: &RawResponse) -> Result<Option<Value>> {
        match response.data_field("document") {
            None | Some(WireValue::Null) => Ok(None),
            Some(doc) => {
                let schema = self.schema(response)?;
                self.decode(doc, schema.as_ref(), response).map(Some)
            }
        }
    }

    /// Decode `status.insertedIds`
    fn decode_inserted_ids(&self, response: &RawResponse) -> Result<Vec<Value>> {
        let ids = match response.status_field("insertedIds") {
            Some(WireValue::Array(ids)) => ids,
            _ => {
                return Err(Error::UnexpectedResponse {
                    reason: "status.insertedIds missing".into(),
                })
            }
        };
        match self.serdes.universe() {
            Universe::Documents => ids
                .iter()
                .map(|id| self.decode(id, None, response))
                .collect(),
            Universe::Tables => {
                let schema = ResponseSchema::primary_key_from_status(response.status.as_ref())?;
                ids.iter()
                    .map(|id| {
                        Ok(self.serdes.deserialize_with_mode(
                            id,
                            Some(&schema),
                            DesTarget::PrimaryKey,
                            response.numeric_mode,
                        )?)
                    })
                    .collect()
            }
        }
    }

    fn sort_vector(response: &RawResponse) -> Result<Option<dataapi_core::DataApiVector>> {
        match response.status_field("sortVector") {
            None | Some(WireValue::Null) => Ok(None),
            Some(v) => Ok(Some(wire::vector_from_wire(v)?)),
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    pub(crate) fn insert_one(&self, record: Value, options: &CommandOptions) -> Result<InsertOneResult> {
        let mut body = Body::new();
        let wire = body.add(self.serdes.serialize_value(record)?);
        body.set("document", wire);

        let timeout = self.timeouts(&options.timeouts).request_timeout();
        let response = self.run(body, "insertOne", timeout)?;
        let inserted_id = self
            .decode_inserted_ids(&response)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::UnexpectedResponse {
                reason: "insertOne returned no id".into(),
            })?;
        Ok(InsertOneResult { inserted_id })
    }

    pub(crate) fn insert_many(
        &self,
        records: Vec<Value>,
        options: &InsertManyOptions,
    ) -> Result<InsertManyResult> {
        let deadline = Deadline::start(self.timeouts(&options.timeouts));
        let chunk_size = options.chunk_size.max(1);
        let total = records.len();
        let mut inserted_ids = Vec::with_capacity(total);

        let mut records = records.into_iter().peekable();
        while records.peek().is_some() {
            let mut body = Body::new();
            let mut documents = Vec::with_capacity(chunk_size);
            for record in records.by_ref().take(chunk_size) {
                documents.push(body.add(self.serdes.serialize_value(record)?));
            }
            body.set("documents", WireValue::Array(documents));
            body.option("ordered", options.ordered);

            let response = self.run(body, "insertMany", deadline.next_request()?)?;
            inserted_ids.extend(self.decode_inserted_ids(&response)?);
            debug!(
                target: "dataapi::client",
                target_name = self.name(),
                inserted = inserted_ids.len(),
                total,
                "Inserted chunk"
            );
        }
        Ok(InsertManyResult { inserted_ids })
    }

    pub(crate) fn find_one(&self, filter: &Value, options: &FindOneOptions) -> Result<Option<Value>> {
        let mut body = Body::new();
        self.filter(&mut body, filter)?;
        body.set_opt("sort", options.sort.as_ref())
            .set_opt("projection", options.projection.as_ref());
        if options.include_similarity {
            body.option("includeSimilarity", true);
        }

        let timeout = self.timeouts(&options.timeouts).request_timeout();
        let response = self.run(body, "findOne", timeout)?;
        self.decode_document(&response)
    }

    pub(crate) fn update_one(
        &self,
        filter: &Value,
        update: Value,
        options: &UpdateOneOptions,
    ) -> Result<UpdateResult> {
        let mut body = Body::new();
        self.filter(&mut body, filter)?;
        let update = body.add(self.serdes.serialize_value(update)?);
        body.set("update", update)
            .set_opt("sort", options.sort.as_ref());
        if options.upsert {
            body.option("upsert", true);
        }

        let timeout = self.timeouts(&options.timeouts).request_timeout();
        let response = self.run(body, "updateOne", timeout)?;
        let upserted_id = match response.status_field("upsertedId") {
            Some(id) if !id.is_null() && self.serdes.universe() == Universe::Documents => {
                Some(self.decode(id, None, &response)?)
            }
            _ => None,
        };
        Ok(UpdateResult {
            matched_count: count(&response, "matchedCount")?,
            modified_count: count(&response, "modifiedCount")?,
            upserted_id,
        })
    }

    pub(crate) fn delete_one(&self, filter: &Value, options: &DeleteOneOptions) -> Result<DeleteResult> {
        let mut body = Body::new();
        self.filter(&mut body, filter)?;
        body.set_opt("sort", options.sort.as_ref());

        let timeout = self.timeouts(&options.timeouts).request_timeout();
        let response = self.run(body, "deleteOne", timeout)?;
        Ok(DeleteResult {
            deleted_count: count(&response, "deletedCount")?,
        })
    }

    /// `deleteMany` until the server stops reporting `moreData`
    pub(crate) fn delete_many(&self, filter: &Value, options: &CommandOptions) -> Result<DeleteResult> {
        let deadline = Deadline::start(self.timeouts(&options.timeouts));
        let mut deleted_count = 0;
        loop {
            let mut body = Body::new();
            self.filter(&mut body, filter)?;
            let response = self.run(body, "deleteMany", deadline.next_request()?)?;

            // A filterless delete reports -1: everything went, count unknown.
            deleted_count += response
                .status_field("deletedCount")
                .and_then(WireValue::as_u64)
                .unwrap_or(0);
            if !more_data(&response) {
                return Ok(DeleteResult { deleted_count });
            }
        }
    }

    pub(crate) fn count_documents(
        &self,
        filter: &Value,
        upper_bound: u64,
        options: &CommandOptions,
    ) -> Result<u64> {
        let mut body = Body::new();
        self.filter(&mut body, filter)?;

        let timeout = self.timeouts(&options.timeouts).request_timeout();
        let response = self.run(body, "countDocuments", timeout)?;
        let n = count(&response, "count")?;
        if more_data(&response) || n > upper_bound {
            return Err(Error::TooManyDocumentsToCount { limit: upper_bound });
        }
        Ok(n)
    }

    pub(crate) fn estimated_document_count(&self, options: &CommandOptions) -> Result<u64> {
        let timeout = self.timeouts(&options.timeouts).request_timeout();
        let response = self.run(Body::new(), "estimatedDocumentCount", timeout)?;
        count(&response, "count")
    }

    fn find_body(&self, options: &FindOptions, page_state: Option<&str>) -> Result<Body> {
        let mut body = Body::new();
        self.filter(&mut body, &options.filter)?;
        body.set_opt("sort", options.sort.as_ref())
            .set_opt("projection", options.projection.as_ref());
        if let Some(limit) = options.limit {
            body.option("limit", limit);
        }
        if let Some(skip) = options.skip {
            body.option("skip", skip);
        }
        if options.include_similarity {
            body.option("includeSimilarity", true);
        }
        if options.include_sort_vector {
            body.option("includeSortVector", true);
        }
        if let Some(page_state) = page_state {
            body.option("pageState", page_state);
        }
        Ok(body)
    }
}

impl PageFetcher for Endpoint {
    fn fetch_page(&self, request: &PageRequest<'_>, timeout: Duration) -> Result<Page> {
        let body = self.find_body(request.options, request.page_state)?;
        let response = self.run(body, "find", timeout)?;
        Ok(Page {
            records: self.decode_documents(&response)?,
            next_page_state: response
                .data_field("nextPageState")
                .and_then(WireValue::as_str)
                .map(str::to_string),
            sort_vector: Self::sort_vector(&response)?,
        })
    }
}

impl RerankFetcher for Endpoint {
    fn fetch_reranked(
        &self,
        request: &RerankRequest<'_>,
        timeout: Duration,
    ) -> Result<Page<RerankedResult<Value>>> {
        let options = request.options;
        let mut body = Body::new();
        self.filter(&mut body, &options.filter)?;
        body.set_opt("sort", options.sort.as_ref())
            .set_opt("projection", options.projection.as_ref());
        if let Some(limit) = options.limit {
            body.option("limit", limit);
        }
        if let Some(limits) = &options.hybrid_limits {
            body.option("hybridLimits", serde_json::to_value(limits)?);
        }
        if let Some(field) = &options.rerank_on {
            body.option("rerankOn", field.as_str());
        }
        if let Some(query) = &options.rerank_query {
            body.option("rerankQuery", query.as_str());
        }
        if options.include_scores {
            body.option("includeScores", true);
        }
        if options.include_sort_vector {
            body.option("includeSortVector", true);
        }

        let response = self.run(body, "findAndRerank", timeout)?;
        let documents = self.decode_documents(&response)?;
        let scores = response
            .status_field("documentResponses")
            .and_then(WireValue::as_array);
        let records = documents
            .into_iter()
            .enumerate()
            .map(|(i, doc)| {
                let doc_scores = scores
                    .and_then(|s| s.get(i))
                    .and_then(|r| r.get("scores"));
                reranked(doc, doc_scores)
            })
            .collect();
        Ok(Page::reranked(records, Self::sort_vector(&response)?))
    }
}

fn count(response: &RawResponse, key: &str) -> Result<u64> {
    response
        .status_field(key)
        .and_then(WireValue::as_u64)
        .ok_or_else(|| Error::UnexpectedResponse {
            reason: format!("status.{} missing or not a count", key),
        })
}

fn more_data(response: &RawResponse) -> bool {
    response
        .status_field("moreData")
        .and_then(WireValue::as_bool)
        .unwrap_or(false)
}
