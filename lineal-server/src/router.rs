use crate::subsystems::warehouse::WarehouseHandler;
use lineal_core::ipc::{LinealRequest, LinealResponse};

pub async fn handle_request(request: LinealRequest, handler: &WarehouseHandler) -> LinealResponse {
    match request {
        LinealRequest::Ping => LinealResponse::pong(),
        LinealRequest::Health => {
            let (vertices, edges) = handler.counts().await;
            LinealResponse::ok(serde_json::json!({
                "status": "healthy",
                "vertices": vertices,
                "edges": edges,
            }))
        }
        LinealRequest::Lineage {
            scope,
            guid,
            include_processes,
        } => {
            let result = handler.lineage(scope, &guid, include_processes).await;
            match serde_json::to_value(&result) {
                Ok(data) => LinealResponse::ok(data),
                Err(e) => LinealResponse::err(e.to_string()),
            }
        }
        LinealRequest::EntityDetails { guid } => match handler.entity_details(&guid).await {
            Ok(vertex) => match serde_json::to_value(&vertex) {
                Ok(data) => LinealResponse::ok(data),
                Err(e) => LinealResponse::err(e.to_string()),
            },
            Err(e) if e.is_not_found() => LinealResponse::not_found(e.to_string()),
            Err(e) => LinealResponse::err(e.to_string()),
        },
        LinealRequest::Search { request } => {
            let hits = handler.search(&request).await;
            let count = hits.len();
            LinealResponse::ok(serde_json::json!({
                "results": hits,
                "count": count,
            }))
        }
        LinealRequest::Types => {
            let types = handler.types().await;
            LinealResponse::ok(serde_json::json!({ "types": types }))
        }
        LinealRequest::Nodes { criteria } => {
            let nodes = handler.nodes(&criteria).await;
            let count = nodes.len();
            LinealResponse::ok(serde_json::json!({
                "nodes": nodes,
                "count": count,
            }))
        }
        LinealRequest::ElementHierarchy { request } => {
            let result = handler.element_hierarchy(&request).await;
            match serde_json::to_value(&result) {
                Ok(data) => LinealResponse::ok(data),
                Err(e) => LinealResponse::err(e.to_string()),
            }
        }
    }
}
