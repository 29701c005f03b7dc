//! Table Tests

use crate::common::*;
use dataapi::{
    CommandOptions, Error, FindOneOptions, FindOptions, InsertManyOptions, SerDesOptions, Value,
};
use dataapi_core::chrono::NaiveDate;
use serde_json::json;

fn schema() -> serde_json::Value {
    json!({
        "id": {"type": "int"},
        "born": {"type": "date"},
        "tags": {"type": "set", "valueType": "text"}
    })
}

#[test]
fn find_populates_sparse_columns() {
    let server = Scripted::new();
    server.reply(json!({
        "data": {"documents": [{"id": 1, "born": "2024-01-02"}, {"id": 2, "tags": ["x"]}], "nextPageState": null},
        "status": {"projectionSchema": schema()}
    }));

    let rows = client(&server)
        .table("people")
        .find(Value::Object(Default::default()), FindOptions::default())
        .unwrap()
        .to_vec()
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("tags"), Some(&Value::Set(vec![])));
    assert_eq!(
        rows[0].get("born"),
        Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()))
    );
    assert_eq!(rows[1].get("born"), Some(&Value::Null));
    assert_eq!(rows[1].get("tags"), Some(&Value::Set(vec![Value::from("x")])));
}

#[test]
fn sparse_data_keeps_rows_as_sent() {
    let server = Scripted::new();
    server.reply(json!({
        "data": {"document": {"id": 1}},
        "status": {"projectionSchema": schema()}
    }));

    let mut config = config();
    config.serdes.options = SerDesOptions {
        sparse_data: true,
        ..Default::default()
    };
    let row = client_with(config, &server)
        .table("people")
        .find_one(Value::object([("id", Value::Int(1))]), FindOneOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(row, Value::object([("id", Value::Int(1))]));
}

#[test]
fn empty_page_needs_no_schema() {
    let server = Scripted::new();
    server.reply(json!({"data": {"documents": [], "nextPageState": null}}));
    let rows = client(&server)
        .table("people")
        .find(Value::Object(Default::default()), FindOptions::default())
        .unwrap()
        .to_vec()
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn rows_without_schema_are_rejected() {
    let server = Scripted::new();
    server.reply(json!({"data": {"documents": [{"id": 1}], "nextPageState": null}}));
    let err = client(&server)
        .table("people")
        .find(Value::Object(Default::default()), FindOptions::default())
        .unwrap()
        .next()
        .unwrap_err();
    assert!(matches!(err, Error::MissingSchema { .. }));
}

#[test]
fn inserted_ids_follow_primary_key_schema() {
    let server = Scripted::new();
    server.reply(json!({"status": {
        "primaryKeySchema": {"region": {"type": "text"}, "seq": {"type": "int"}},
        "insertedIds": [["eu", 1], ["us", 2]]
    }}));

    let rows = vec![
        Value::object([("region", Value::from("eu")), ("seq", Value::Int(1))]),
        Value::object([("region", Value::from("us")), ("seq", Value::Int(2))]),
    ];
    let result = client(&server)
        .table("events")
        .insert_many(rows.clone(), InsertManyOptions::default())
        .unwrap();
    assert_eq!(result.inserted_ids, rows);
}

#[test]
fn table_values_use_table_wire_forms() {
    let server = Scripted::new();
    server.reply(json!({"status": {
        "primaryKeySchema": {"id": {"type": "int"}},
        "insertedIds": [[7]]
    }}));

    let row = Value::object([
        ("id", Value::Int(7)),
        ("born", Value::Date(NaiveDate::from_ymd_opt(1990, 5, 17).unwrap())),
        ("tags", Value::Set(vec![Value::from("a")])),
    ]);
    let result = client(&server)
        .table("people")
        .insert_one(row, CommandOptions::default())
        .unwrap();

    assert_eq!(result.inserted_id, Value::object([("id", Value::Int(7))]));
    assert_eq!(
        server.body(0),
        json!({"insertOne": {"document": {"id": 7, "born": "1990-05-17", "tags": ["a"]}}})
    );
}
