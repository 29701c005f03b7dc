//! Collection Tests

use std::str::FromStr;

use crate::common::*;
use dataapi::{
    CommandOptions, DeleteOneOptions, Error, FindOneOptions, FindOptions, InsertManyOptions,
    KeyTransform, RerankOptions, UpdateOneOptions, Value,
};
use dataapi_core::{BigInt, Uuid};
use serde_json::json;

fn ada() -> Value {
    Value::object([("name", Value::from("ada")), ("age", Value::Int(36))])
}

// ============================================================================
// Inserts
// ============================================================================

#[test]
fn insert_one_sends_document_and_decodes_id() {
    let server = Scripted::new();
    let id = Uuid::new_v4();
    server.reply(json!({"status": {"insertedIds": [{"$uuid": id.to_string()}]}}));

    let result = client(&server)
        .collection("users")
        .insert_one(ada(), CommandOptions::default())
        .unwrap();
    assert_eq!(result.inserted_id, Value::Uuid(id));

    let request = &server.requests()[0];
    assert_eq!(request.url, format!("{}/api/json/v1/default_keyspace/users", ENDPOINT));
    assert_eq!(request.token.as_deref(), Some("test-token"));
    assert!(!request.big_numbers);
    assert_eq!(
        server.body(0),
        json!({"insertOne": {"document": {"name": "ada", "age": 36}}})
    );
}

#[test]
fn insert_many_sends_chunks_in_order() {
    let server = Scripted::new();
    server
        .reply(json!({"status": {"insertedIds": [1, 2]}}))
        .reply(json!({"status": {"insertedIds": [3, 4]}}))
        .reply(json!({"status": {"insertedIds": [5]}}));

    let docs = (1..=5).map(|i| Value::object([("_id", Value::Int(i))])).collect();
    let options = InsertManyOptions {
        chunk_size: 2,
        ..Default::default()
    };
    let result = client(&server)
        .collection("users")
        .insert_many(docs, options)
        .unwrap();

    assert_eq!(result.inserted_count(), 5);
    assert_eq!(result.inserted_ids[4], Value::Int(5));
    assert_eq!(server.request_count(), 3);
    assert_eq!(
        server.body(2),
        json!({"insertMany": {"documents": [{"_id": 5}], "options": {"ordered": false}}})
    );
}

#[test]
fn insert_many_stops_at_first_failing_chunk() {
    let server = Scripted::new();
    server
        .reply(json!({"status": {"insertedIds": [1, 2]}}))
        .reply(json!({"errors": [{"errorCode": "DOCUMENT_ALREADY_EXISTS", "message": "dup"}]}));

    let docs = (1..=6).map(|i| Value::object([("_id", Value::Int(i))])).collect();
    let options = InsertManyOptions {
        chunk_size: 2,
        ordered: true,
        ..Default::default()
    };
    let err = client(&server)
        .collection("users")
        .insert_many(docs, options)
        .unwrap_err();
    assert!(matches!(err, Error::DataApi { .. }));
    assert_eq!(server.request_count(), 2);
}

#[test]
fn big_number_marks_request() {
    let server = Scripted::new();
    server.reply_raw(200, r#"{"status": {"insertedIds": [123456789012345678901234567890]}}"#);

    let big = BigInt::from_str("123456789012345678901234567890").unwrap();
    let result = client(&server)
        .collection("ledger")
        .insert_one(
            Value::object([("_id", Value::BigInt(big.clone()))]),
            CommandOptions::default(),
        )
        .unwrap();

    let request = &server.requests()[0];
    assert!(request.big_numbers);
    assert!(request.body.contains("123456789012345678901234567890"));
    // The response of a big-number request is decoded exactly.
    assert_eq!(result.inserted_id, Value::BigInt(big));
}

// ============================================================================
// Reads
// ============================================================================

#[test]
fn find_walks_pages_with_page_state() {
    let server = Scripted::new();
    server
        .reply(json!({"data": {"documents": [{"n": 1}, {"n": 2}], "nextPageState": "p2"}}))
        .reply(json!({"data": {"documents": [{"n": 3}], "nextPageState": null}}));

    let filter = Value::object([("kind", Value::from("a"))]);
    let options = FindOptions {
        projection: Some(json!({"n": 1})),
        ..Default::default()
    };
    let records = client(&server)
        .collection("items")
        .find(filter, options)
        .unwrap()
        .to_vec()
        .unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[2].get("n"), Some(&Value::Int(3)));
    assert_eq!(
        server.body(0),
        json!({"find": {"filter": {"kind": "a"}, "projection": {"n": 1}}})
    );
    assert_eq!(server.body(1)["find"]["options"]["pageState"], json!("p2"));
}

#[test]
fn find_sends_options_and_reads_sort_vector() {
    let server = Scripted::new();
    server.reply(json!({
        "data": {"documents": [{"n": 1}], "nextPageState": null},
        "status": {"sortVector": [0.5, 0.25]}
    }));

    let options = FindOptions {
        sort: Some(json!({"$vector": [0.5, 0.25]})),
        limit: Some(10),
        include_similarity: true,
        include_sort_vector: true,
        ..Default::default()
    };
    let mut cursor = client(&server)
        .collection("items")
        .find(Value::Object(Default::default()), options)
        .unwrap();
    let vector = cursor.sort_vector().unwrap().unwrap();
    assert_eq!(vector.as_slice(), &[0.5, 0.25]);
    assert_eq!(cursor.buffered(), 1);

    let sent = server.body(0);
    assert_eq!(
        sent["find"]["options"],
        json!({"limit": 10, "includeSimilarity": true, "includeSortVector": true})
    );
    assert_eq!(sent["find"]["sort"], json!({"$vector": [0.5, 0.25]}));
}

#[test]
fn find_one_returns_none_for_null_document() {
    let server = Scripted::new();
    server.reply(json!({"data": {"document": null}}));
    let found = client(&server)
        .collection("users")
        .find_one(ada(), FindOneOptions::default())
        .unwrap();
    assert!(found.is_none());
}

#[test]
fn find_and_rerank_attaches_scores() {
    let server = Scripted::new();
    server.reply(json!({
        "data": {"documents": [{"n": 1}, {"n": 2}], "nextPageState": "ignored"},
        "status": {"documentResponses": [
            {"scores": {"$rerank": 0.9, "$vector": 0.7}},
            {"scores": {"$rerank": 0.4}}
        ]}
    }));

    let options = RerankOptions {
        sort: Some(json!({"$hybrid": "tree houses"})),
        rerank_on: Some("body".into()),
        include_scores: true,
        ..Default::default()
    };
    let mut cursor = client(&server)
        .collection("articles")
        .find_and_rerank(Value::Object(Default::default()), options);
    let results = cursor.to_vec().unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].scores["$rerank"], 0.9);
    assert_eq!(results[0].scores["$vector"], 0.7);
    assert_eq!(results[1].document.get("n"), Some(&Value::Int(2)));
    assert_eq!(server.request_count(), 1);
    assert_eq!(
        server.body(0)["findAndRerank"]["options"],
        json!({"rerankOn": "body", "includeScores": true})
    );
}

// ============================================================================
// Updates, deletes, counts
// ============================================================================

#[test]
fn update_one_reports_counts_and_upserted_id() {
    let server = Scripted::new();
    let id = Uuid::new_v4();
    server.reply(json!({"status": {
        "matchedCount": 0,
        "modifiedCount": 0,
        "upsertedId": {"$uuid": id.to_string()}
    }}));

    let update = Value::object([("$set", Value::object([("age", Value::Int(37))]))]);
    let options = UpdateOneOptions {
        upsert: true,
        ..Default::default()
    };
    let result = client(&server)
        .collection("users")
        .update_one(ada(), update, options)
        .unwrap();
    assert_eq!(result.matched_count, 0);
    assert_eq!(result.upserted_id, Some(Value::Uuid(id)));
    assert_eq!(server.body(0)["updateOne"]["options"], json!({"upsert": true}));
}

#[test]
fn delete_one_reports_count() {
    let server = Scripted::new();
    server.reply(json!({"status": {"deletedCount": 1}}));
    let result = client(&server)
        .collection("users")
        .delete_one(ada(), DeleteOneOptions::default())
        .unwrap();
    assert_eq!(result.deleted_count, 1);
}

#[test]
fn delete_many_loops_while_more_data() {
    let server = Scripted::new();
    server
        .reply(json!({"status": {"deletedCount": 20, "moreData": true}}))
        .reply(json!({"status": {"deletedCount": 5}}));
    let result = client(&server)
        .collection("users")
        .delete_many(ada(), CommandOptions::default())
        .unwrap();
    assert_eq!(result.deleted_count, 25);
    assert_eq!(server.request_count(), 2);
}

#[test]
fn count_documents_respects_upper_bound() {
    let server = Scripted::new();
    server
        .reply(json!({"status": {"count": 5}}))
        .reply(json!({"status": {"count": 5}}))
        .reply(json!({"status": {"count": 1000, "moreData": true}}));
    let users = client(&server).collection("users");

    assert_eq!(users.count_documents(ada(), 10, CommandOptions::default()).unwrap(), 5);
    assert_eq!(
        users.count_documents(ada(), 3, CommandOptions::default()).unwrap_err(),
        Error::TooManyDocumentsToCount { limit: 3 }
    );
    assert_eq!(
        users.count_documents(ada(), 1000, CommandOptions::default()).unwrap_err(),
        Error::TooManyDocumentsToCount { limit: 1000 }
    );
}

#[test]
fn estimated_count_sends_empty_body() {
    let server = Scripted::new();
    server.reply(json!({"status": {"count": 12345}}));
    let n = client(&server)
        .collection("users")
        .estimated_document_count(CommandOptions::default())
        .unwrap();
    assert_eq!(n, 12345);
    assert_eq!(server.body(0), json!({"estimatedDocumentCount": {}}));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn server_errors_become_data_api_errors() {
    let server = Scripted::new();
    server.reply(json!({"errors": [
        {"errorCode": "DOCUMENT_ALREADY_EXISTS", "message": "duplicate _id", "family": "REQUEST"}
    ]}));
    let err = client(&server)
        .collection("users")
        .insert_one(ada(), CommandOptions::default())
        .unwrap_err();
    match err {
        Error::DataApi { errors } => {
            assert_eq!(errors[0].error_code.as_deref(), Some("DOCUMENT_ALREADY_EXISTS"));
            assert_eq!(errors[0].family.as_deref(), Some("REQUEST"));
        }
        other => panic!("expected DataApi, got {:?}", other),
    }
}

#[test]
fn http_failure_is_retryable_transport_error() {
    let server = Scripted::new();
    server.reply_raw(503, "<html>unavailable</html>");
    let err = client(&server)
        .collection("users")
        .find_one(ada(), FindOneOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Transport { .. }));
    assert!(err.is_retryable());
}

#[test]
fn non_object_response_is_unexpected() {
    let server = Scripted::new();
    server.reply(json!([1, 2]));
    let err = client(&server)
        .collection("users")
        .estimated_document_count(CommandOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::UnexpectedResponse { .. }));
}

#[test]
fn table_only_value_is_rejected_before_sending() {
    let server = Scripted::new();
    let doc = Value::object([("tags", Value::Set(vec![Value::from("a")]))]);
    let err = client(&server)
        .collection("users")
        .insert_one(doc, CommandOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Serialization { .. }));
    assert_eq!(server.request_count(), 0);
}

// ============================================================================
// Key renaming
// ============================================================================

#[test]
fn snake_case_keys_on_the_wire() {
    let server = Scripted::new();
    server
        .reply(json!({"status": {"insertedIds": ["x"]}}))
        .reply(json!({"data": {"document": {"_id": "x", "user_name": "ada"}}}));

    let mut config = config();
    config.serdes.key_transform = KeyTransform::SnakeCase;
    let users = client_with(config, &server).collection("users");

    users
        .insert_one(
            Value::object([("_id", Value::from("x")), ("userName", Value::from("ada"))]),
            CommandOptions::default(),
        )
        .unwrap();
    assert_eq!(
        server.body(0),
        json!({"insertOne": {"document": {"_id": "x", "user_name": "ada"}}})
    );

    let found = users
        .find_one(Value::object([("_id", Value::from("x"))]), FindOneOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(found.get("userName"), Some(&Value::from("ada")));
}
