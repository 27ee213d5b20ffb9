//! Warehouse handler — the query facade over the graph store
//!
//! Every operation takes the store's read lock once and holds it for the
//! whole call, so a traversal's hops all observe the same snapshot. Mutation
//! never happens here; it belongs to the consumer subsystem.

use std::sync::Arc;

use lineal_core::config::TraversalConfig;
use lineal_core::model::{
    ElementHierarchyRequest, LineageSearchRequest, LineageVertex, LineageVerticesAndEdges,
    NodeNamesSearchCriteria, Scope,
};
use lineal_core::traversal::{element_hierarchy, traverse, EdgeClassifier};
use lineal_core::{LineageGraph, LinealError};
use tokio::sync::RwLock;

/// Cap on node-name search results regardless of what the caller asks for.
const MAX_NODE_RESULTS: usize = 100;

pub type SharedGraph = Arc<RwLock<LineageGraph>>;

#[derive(Clone)]
pub struct WarehouseHandler {
    graph: SharedGraph,
    classifier: Arc<EdgeClassifier>,
    max_hops: usize,
}

impl WarehouseHandler {
    pub fn new(graph: SharedGraph, traversal_config: &TraversalConfig) -> Self {
        Self {
            graph,
            classifier: Arc::new(EdgeClassifier::from_config(traversal_config)),
            max_hops: traversal_config.max_hops,
        }
    }

    pub fn graph(&self) -> SharedGraph {
        self.graph.clone()
    }

    /// Scope-bounded lineage query. Unknown GUIDs yield an empty subgraph.
    pub async fn lineage(
        &self,
        scope: Scope,
        guid: &str,
        include_processes: bool,
    ) -> LineageVerticesAndEdges {
        let graph = self.graph.read().await;
        traverse(
            &graph,
            &self.classifier,
            scope,
            guid,
            include_processes,
            self.max_hops,
        )
    }

    /// Single-entity lookup; the one query where an unknown GUID is a typed
    /// not-found rather than an empty result.
    pub async fn entity_details(&self, guid: &str) -> Result<LineageVertex, LinealError> {
        let graph = self.graph.read().await;
        graph
            .get_vertex(guid)
            .cloned()
            .ok_or_else(|| LinealError::NotFound(format!("vertex {guid}")))
    }

    pub async fn search(&self, request: &LineageSearchRequest) -> Vec<LineageVertex> {
        let graph = self.graph.read().await;
        graph.search(request)
    }

    pub async fn types(&self) -> Vec<String> {
        let graph = self.graph.read().await;
        graph.vertex_types()
    }

    pub async fn nodes(&self, criteria: &NodeNamesSearchCriteria) -> Vec<LineageVertex> {
        let clamped = NodeNamesSearchCriteria {
            type_name: criteria.type_name.clone(),
            search_value: criteria.search_value.clone(),
            limit: criteria.limit.clamp(1, MAX_NODE_RESULTS),
        };
        let graph = self.graph.read().await;
        graph.find_nodes(&clamped)
    }

    pub async fn element_hierarchy(
        &self,
        request: &ElementHierarchyRequest,
    ) -> LineageVerticesAndEdges {
        let graph = self.graph.read().await;
        element_hierarchy(
            &graph,
            &self.classifier,
            &request.guid,
            request.direction,
            self.max_hops,
        )
    }

    /// Vertex/edge counts for health reporting.
    pub async fn counts(&self) -> (usize, usize) {
        let graph = self.graph.read().await;
        (graph.vertex_count(), graph.edge_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn handler_with_chain() -> WarehouseHandler {
        let mut graph = LineageGraph::new();
        graph.upsert_vertex("A", "RelationalTable", "orders_raw", BTreeMap::new());
        graph.upsert_vertex("B", "RelationalTable", "orders", BTreeMap::new());
        graph.upsert_edge("A", "B", "DataFlow", BTreeMap::new());
        WarehouseHandler::new(
            Arc::new(RwLock::new(graph)),
            &TraversalConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_lineage_known_and_unknown_guid() {
        let handler = handler_with_chain();
        let result = handler.lineage(Scope::EndToEnd, "A", true).await;
        assert_eq!(result.vertices.len(), 2);

        let empty = handler
            .lineage(Scope::EndToEnd, "nonexistent-guid", true)
            .await;
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_entity_details_not_found_is_typed() {
        let handler = handler_with_chain();
        let v = handler.entity_details("A").await.unwrap();
        assert_eq!(v.display_name, "orders_raw");

        let err = handler.entity_details("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_nodes_limit_is_clamped() {
        let handler = handler_with_chain();
        let hits = handler
            .nodes(&NodeNamesSearchCriteria {
                type_name: None,
                search_value: "orders".to_string(),
                limit: 0,
            })
            .await;
        // limit 0 is clamped up to 1, not treated as "no results"
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_types_and_counts() {
        let handler = handler_with_chain();
        assert_eq!(handler.types().await, vec!["RelationalTable"]);
        assert_eq!(handler.counts().await, (2, 1));
    }
}
