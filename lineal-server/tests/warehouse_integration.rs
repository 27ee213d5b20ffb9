//! End-to-end warehouse tests: events in, queries out
//!
//! Uses both the inner-function approach and the Axum `oneshot` approach for
//! full handler dispatch, with an in-memory graph store throughout.

use axum::http::StatusCode;
use lineal_core::config::TraversalConfig;
use lineal_core::events::parse_event;
use lineal_core::model::Scope;
use lineal_core::{LineageEvent, LineageGraph};
use lineal_server::http::{build_router, entity_inner, health_inner, HttpState};
use lineal_server::subsystems::consumer;
use lineal_server::subsystems::warehouse::WarehouseHandler;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};

// For oneshot testing
use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;

fn entity_event(guid: &str, type_name: &str, name: &str) -> LineageEvent {
    parse_event(
        &json!({
            "eventType": "ENTITY_CREATED",
            "guid": guid,
            "typeName": type_name,
            "displayName": name,
        })
        .to_string(),
    )
    .unwrap()
}

fn flow_event(source: &str, target: &str) -> LineageEvent {
    parse_event(
        &json!({
            "eventType": "RELATIONSHIP_CREATED",
            "sourceGuid": source,
            "targetGuid": target,
            "typeName": "DataFlow",
        })
        .to_string(),
    )
    .unwrap()
}

/// Ingest a batch of events through the consumer loop and return a handler
/// facade over the resulting store.
async fn ingest(events: Vec<LineageEvent>) -> WarehouseHandler {
    let graph = Arc::new(RwLock::new(LineageGraph::new()));
    let (tx, rx) = mpsc::channel(64);
    let (shutdown_tx, _) = broadcast::channel(1);

    for event in events {
        tx.send(event).await.unwrap();
    }
    drop(tx);
    consumer::run_consumer_loop(graph.clone(), rx, shutdown_tx.subscribe()).await;

    WarehouseHandler::new(graph, &TraversalConfig::default())
}

fn make_state(handler: WarehouseHandler) -> (Arc<HttpState>, mpsc::Receiver<LineageEvent>) {
    let (events_tx, events_rx) = mpsc::channel(8);
    (Arc::new(HttpState { handler, events_tx }), events_rx)
}

// ===========================================================================
// TEST 1: ingested chain answers the spec's worked example
// ===========================================================================
#[tokio::test]
async fn test_ingested_chain_end_to_end() {
    let handler = ingest(vec![
        entity_event("A", "RelationalTable", "orders_raw"),
        entity_event("B", "RelationalTable", "orders"),
        entity_event("C", "RelationalTable", "orders_mart"),
        flow_event("A", "B"),
        flow_event("B", "C"),
    ])
    .await;

    let full = handler.lineage(Scope::EndToEnd, "B", true).await;
    assert_eq!(full.vertices.len(), 3);
    assert_eq!(full.edges.len(), 2);

    let one_hop = handler.lineage(Scope::SourceAndDestination, "B", true).await;
    assert_eq!(one_hop, full);

    let sources = handler.lineage(Scope::UltimateSource, "C", true).await;
    assert_eq!(sources.vertices.len(), 3);
}

// ===========================================================================
// TEST 2: malformed and unknown-GUID events leave queries unaffected
// ===========================================================================
#[tokio::test]
async fn test_bad_events_are_isolated_from_queries() {
    assert!(parse_event("{nope").is_err());

    let ghost = uuid::Uuid::new_v4().to_string();
    let handler = ingest(vec![
        entity_event("A", "RelationalTable", "orders"),
        // Deletes an element that never existed; must be discarded.
        parse_event(&json!({"eventType": "ENTITY_DELETED", "guid": ghost}).to_string()).unwrap(),
    ])
    .await;

    assert_eq!(handler.counts().await, (1, 0));
    let result = handler.lineage(Scope::EndToEnd, "A", true).await;
    assert!(result.contains_vertex("A"));
}

// ===========================================================================
// TEST 3: edge-before-entity ingestion resolves via placeholders
// ===========================================================================
#[tokio::test]
async fn test_edge_first_ingestion_traversable() {
    let handler = ingest(vec![
        flow_event("A", "B"),
        entity_event("A", "RelationalTable", "orders_raw"),
        entity_event("B", "RelationalTable", "orders"),
    ])
    .await;

    let result = handler.lineage(Scope::EndToEnd, "A", true).await;
    assert_eq!(result.vertices.len(), 2);
    assert!(result
        .vertices
        .iter()
        .all(|v| v.type_name == "RelationalTable"));
}

// ===========================================================================
// TEST 4: GET /health via inner function
// ===========================================================================
#[tokio::test]
async fn test_http_health() {
    let handler = ingest(vec![entity_event("A", "RelationalTable", "orders")]).await;
    let (status, body) = health_inner(&handler).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["vertices"], 1);
}

// ===========================================================================
// TEST 5: GET /version via oneshot — returns version and protocol
// ===========================================================================
#[tokio::test]
async fn test_version_endpoint_oneshot() {
    let handler = ingest(vec![]).await;
    let (state, _rx) = make_state(handler);
    let app = build_router(state);

    let req = Request::builder()
        .method("GET")
        .uri("/version")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert!(json["version"].is_string());
    assert_eq!(json["protocol"], "lineal/1");
}

// ===========================================================================
// TEST 6: POST /lineage via oneshot returns the traversed subgraph
// ===========================================================================
#[tokio::test]
async fn test_lineage_endpoint_oneshot() {
    let handler = ingest(vec![
        entity_event("A", "RelationalTable", "orders_raw"),
        entity_event("P", "Process", "load_orders"),
        entity_event("B", "RelationalTable", "orders"),
        flow_event("A", "P"),
        flow_event("P", "B"),
    ])
    .await;
    let (state, _rx) = make_state(handler);
    let app = build_router(state);

    let body = json!({
        "scope": "end-to-end",
        "guid": "A",
        "include_processes": false,
    });
    let req = Request::builder()
        .method("POST")
        .uri("/lineage")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    let guids: Vec<&str> = json["vertices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["guid"].as_str().unwrap())
        .collect();
    assert!(guids.contains(&"A") && guids.contains(&"B"));
    assert!(!guids.contains(&"P"));
    // The bridge edge keeps A connected to B with the process elided.
    assert!(json["edges"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["source"] == "A" && e["target"] == "B"));
}

// ===========================================================================
// TEST 7: GET /entities/{guid} — 200 for known, 404 for unknown
// ===========================================================================
#[tokio::test]
async fn test_entity_endpoint_status_codes() {
    let handler = ingest(vec![entity_event("A", "RelationalTable", "orders")]).await;

    let (status, body) = entity_inner(&handler, "A").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["display_name"], "orders");

    let (status, _) = entity_inner(&handler, "ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ===========================================================================
// TEST 8: POST /events queues onto the intake channel
// ===========================================================================
#[tokio::test]
async fn test_events_endpoint_queues() {
    let handler = ingest(vec![]).await;
    let (state, mut rx) = make_state(handler);
    let app = build_router(state);

    let body = json!({
        "eventType": "ENTITY_CREATED",
        "guid": "g-1",
        "typeName": "RelationalTable",
        "displayName": "orders",
    });
    let req = Request::builder()
        .method("POST")
        .uri("/events")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let queued = rx.recv().await.unwrap();
    assert_eq!(queued.subject_guid(), "g-1");
}

// ===========================================================================
// TEST 9: search and nodes over an ingested graph
// ===========================================================================
#[tokio::test]
async fn test_search_and_nodes_queries() {
    let handler = ingest(vec![
        entity_event("g-1", "RelationalColumn", "customer_id"),
        entity_event("g-2", "RelationalColumn", "customer_name"),
        entity_event("g-3", "RelationalTable", "customers"),
    ])
    .await;

    let nodes = handler
        .nodes(&lineal_core::model::NodeNamesSearchCriteria {
            type_name: Some("RelationalColumn".to_string()),
            search_value: "CUSTOMER".to_string(),
            limit: 10,
        })
        .await;
    assert_eq!(nodes.len(), 2);

    let types = handler.types().await;
    assert_eq!(types, vec!["RelationalColumn", "RelationalTable"]);
}
