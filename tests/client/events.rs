//! Command Event Tests

use std::sync::Arc;

use crate::common::*;
use dataapi::{CommandEvent, CommandOptions, CommandTarget, Error, EventFilter};
use parking_lot::Mutex;
use serde_json::json;

fn recorder() -> (Arc<Mutex<Vec<CommandEvent>>>, impl Fn(&CommandEvent) + Send + Sync) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    (events, move |event: &CommandEvent| sink.lock().push(event.clone()))
}

#[test]
fn success_emits_started_then_succeeded() {
    let server = Scripted::new();
    server.reply(json!({"status": {"count": 3}}));
    let client = client(&server);
    let (events, listener) = recorder();
    client.add_listener(Arc::new(listener));

    client
        .collection("users")
        .estimated_document_count(CommandOptions::default())
        .unwrap();

    let events = events.lock();
    assert_eq!(events.len(), 2);
    match &events[0] {
        CommandEvent::Started { command, target, .. } => {
            assert_eq!(command, "estimatedDocumentCount");
            assert_eq!(target, &CommandTarget::named("default_keyspace", "users"));
        }
        other => panic!("expected Started, got {:?}", other),
    }
    assert!(matches!(events[1], CommandEvent::Succeeded { .. }));
}

#[test]
fn failure_emits_failed_with_error() {
    let server = Scripted::new();
    server.reply(json!({"errors": [{"message": "no such collection"}]}));
    let client = client(&server);
    let (events, listener) = recorder();
    client.add_listener(Arc::new(listener));

    let err = client
        .collection("ghosts")
        .estimated_document_count(CommandOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::DataApi { .. }));

    let events = events.lock();
    match events.last() {
        Some(CommandEvent::Failed { error, .. }) => assert!(error.contains("no such collection")),
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[test]
fn failures_filter_drops_other_events() {
    let server = Scripted::new();
    server
        .reply(json!({"status": {"count": 3}}))
        .reply_raw(500, "boom");
    let mut config = config();
    config.logging.events = EventFilter::Failures;
    let client = client_with(config, &server);
    let (events, listener) = recorder();
    client.add_listener(Arc::new(listener));

    let users = client.collection("users");
    users.estimated_document_count(CommandOptions::default()).unwrap();
    users.estimated_document_count(CommandOptions::default()).unwrap_err();

    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].command(), "estimatedDocumentCount");
    assert!(matches!(events[0], CommandEvent::Failed { .. }));
}

#[test]
fn every_listener_sees_every_event() {
    let server = Scripted::new();
    server.reply(json!({"status": {"collections": []}}));
    let client = client(&server);
    let (first, a) = recorder();
    let (second, b) = recorder();
    client.add_listener(Arc::new(a));
    client.add_listener(Arc::new(b));

    let response = client.command(json!({"findCollections": {}})).unwrap();
    assert_eq!(response.status_field("collections"), Some(&json!([])));

    assert_eq!(first.lock().len(), 2);
    assert_eq!(*first.lock(), *second.lock());
    match &first.lock()[0] {
        CommandEvent::Started { target, .. } => {
            assert_eq!(target, &CommandTarget::keyspace("default_keyspace"))
        }
        other => panic!("expected Started, got {:?}", other),
    }
    assert_eq!(
        server.requests()[0].url,
        format!("{}/api/json/v1/default_keyspace", ENDPOINT)
    );
}

#[test]
fn raw_command_must_have_one_key() {
    let server = Scripted::new();
    let err = client(&server)
        .command(json!({"a": {}, "b": {}}))
        .unwrap_err();
    assert!(matches!(err, Error::Serialization { .. }));
    assert_eq!(server.request_count(), 0);
}
