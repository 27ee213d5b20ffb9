use crate::model::{
    ElementHierarchyRequest, LineageSearchRequest, NodeNamesSearchCriteria, Scope,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LinealRequest {
    Ping,
    Health,
    Lineage {
        scope: Scope,
        guid: String,
        #[serde(default = "default_include_processes")]
        include_processes: bool,
    },
    EntityDetails {
        guid: String,
    },
    Search {
        request: LineageSearchRequest,
    },
    Types,
    Nodes {
        criteria: NodeNamesSearchCriteria,
    },
    ElementHierarchy {
        request: ElementHierarchyRequest,
    },
}

fn default_include_processes() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LinealResponse {
    pub status: String,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub version: String,
}

impl LinealResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            error: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(msg.into()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: "not_found".to_string(),
            data: None,
            error: Some(msg.into()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(serde_json::json!({"pong": true}))
    }
}
