//! Client Configuration Tests

use std::time::Duration;

use crate::common::*;
use dataapi::{ClientConfig, CommandOptions, DataApiClient, Error, KeyTransform, Timeouts};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn config_file_drives_the_client() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dataapi.toml");
    std::fs::write(
        &path,
        r#"
endpoint = "http://db.internal:8181/"
keyspace = "shop"
token = "from-file"

[timeouts]
request_timeout_ms = 1234

[serdes]
key_transform = "snake_case"
"#,
    )
    .unwrap();

    let config = ClientConfig::from_file(&path).unwrap();
    assert_eq!(config.keyspace, "shop");
    assert_eq!(config.serdes.key_transform, KeyTransform::SnakeCase);

    let server = Scripted::new();
    server.reply(json!({"status": {"count": 1}}));
    client_with(config, &server)
        .collection("orders")
        .estimated_document_count(CommandOptions::default())
        .unwrap();

    let request = &server.requests()[0];
    assert_eq!(request.url, "http://db.internal:8181/api/json/v1/shop/orders");
    assert_eq!(request.token.as_deref(), Some("from-file"));
    assert_eq!(request.timeout, Duration::from_millis(1234));
}

#[test]
fn call_timeouts_override_collection_and_client() {
    let server = Scripted::new();
    server
        .reply(json!({"status": {"count": 1}}))
        .reply(json!({"status": {"count": 1}}));
    let mut config = config();
    config.timeouts = Timeouts::request(5000);
    let users = client_with(config, &server).collection_with_timeouts("users", Timeouts::request(2000));

    users.estimated_document_count(CommandOptions::default()).unwrap();
    users
        .estimated_document_count(CommandOptions {
            timeouts: Timeouts::request(700),
        })
        .unwrap();

    let requests = server.requests();
    assert_eq!(requests[0].timeout, Duration::from_millis(2000));
    assert_eq!(requests[1].timeout, Duration::from_millis(700));
}

#[test]
fn default_toml_is_valid() {
    let config = ClientConfig::from_toml(ClientConfig::default_toml()).unwrap();
    assert_eq!(config.keyspace, "default_keyspace");
    assert_eq!(config.timeouts.request_timeout(), Duration::from_secs(10));
}

#[test]
fn written_config_reads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dataapi.toml");
    let mut original = config();
    original.serdes.options.enable_big_numbers = true;
    original.write_to_file(&path).unwrap();
    assert_eq!(ClientConfig::from_file(&path).unwrap(), original);
}

#[test]
fn invalid_config_is_rejected() {
    let server = Scripted::new();
    let err = DataApiClient::with_transport(ClientConfig::new("  "), server.clone()).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));

    let err = ClientConfig::from_toml("endpoint = \"http://x\"\n[timeouts]\nrequest_timeout_ms = 0\n")
        .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));

    let missing = TempDir::new().unwrap().path().join("absent.toml");
    assert!(matches!(
        ClientConfig::from_file(&missing),
        Err(Error::Config { .. })
    ));
}
