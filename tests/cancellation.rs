//! Integration tests for cancellable requests and superseding queries

mod common;

use common::{gateway, silent_server};
use conference_gateway::api::cancellable::DEFAULT_CANCEL_REASON;
use conference_gateway::services::live_query::SUPERSEDED_REASON;
use conference_gateway::{GatewayError, LiveQuery, RequestConfig};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_cancel_before_response_settles_as_cancelled() {
    let base_url = silent_server().await;
    let gw = gateway(&base_url);
    let handle = Arc::new(gw.create_cancellable_request());

    let pending = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.execute(RequestConfig::get("/api/participants")).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.cancel("superseded search");

    let result = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("execute did not settle after cancel")
        .expect("task panicked");

    match result {
        Err(GatewayError::Cancelled(reason)) => assert_eq!(reason, "superseded search"),
        other => panic!("expected cancellation, got {:?}", other),
    }
    assert!(handle.is_cancelled());
}

#[tokio::test]
async fn test_cancelled_handle_rejects_later_executions() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/programs")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let gw = gateway(&server.url());
    let handle = gw.create_cancellable_request();
    handle.cancel(DEFAULT_CANCEL_REASON);

    let err = handle.execute(RequestConfig::get("/api/programs")).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.payload(), json!({ "message": DEFAULT_CANCEL_REASON, "cancelled": true }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_execute_resolves_and_bypasses_cache() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/participants")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("search".to_string(), "ada".to_string()),
            Matcher::Regex(r"_t=\d+".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"[{"name":"Ada"}]"#)
        .expect(2)
        .create_async()
        .await;

    let gw = gateway(&server.url());
    let handle = gw.create_cancellable_request();
    let config = RequestConfig::get("/api/participants").with_param("search", "ada");

    let first = handle.execute(config.clone()).await.unwrap();
    let second = handle.execute(config).await.unwrap();

    assert_eq!(first, json!([{ "name": "Ada" }]));
    assert_eq!(first, second);
    assert!(gw.cache().is_empty());
    assert!(!handle.is_cancelled());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_execute_post_with_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/register")
        .match_body(Matcher::Json(json!({ "email": "a@example.com" })))
        .with_status(201)
        .with_body(r#"{"registered":true}"#)
        .create_async()
        .await;

    let gw = gateway(&server.url());
    let handle = gw.create_cancellable_request();
    let result = handle
        .execute(RequestConfig::post("/api/register", json!({ "email": "a@example.com" })))
        .await
        .unwrap();

    assert_eq!(result, json!({ "registered": true }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_live_query_supersedes_in_flight_request() {
    let base_url = silent_server().await;
    let query = Arc::new(LiveQuery::new(gateway(&base_url)));

    let first = {
        let query = query.clone();
        tokio::spawn(async move {
            query
                .run(RequestConfig::get("/api/participants").with_param("search", "a"))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = {
        let query = query.clone();
        tokio::spawn(async move {
            query
                .run(RequestConfig::get("/api/participants").with_param("search", "ad"))
                .await
        })
    };

    let first = tokio::time::timeout(Duration::from_secs(5), first)
        .await
        .expect("superseded request did not settle")
        .expect("task panicked");
    match first {
        Err(GatewayError::Cancelled(reason)) => assert_eq!(reason, SUPERSEDED_REASON),
        other => panic!("expected superseded cancellation, got {:?}", other),
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    query.cancel("closed");
    let second = tokio::time::timeout(Duration::from_secs(5), second)
        .await
        .expect("cancelled request did not settle")
        .expect("task panicked");
    assert!(second.unwrap_err().is_cancelled());
}
