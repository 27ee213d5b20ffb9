//! GUID-indexed lineage graph store
//!
//! The store is the sole shared mutable resource in the warehouse. All
//! mutation flows through `apply` (or the upsert/delete operations it calls);
//! the server shares it as `Arc<tokio::sync::RwLock<LineageGraph>>` so a
//! single consumer serializes writes while each query holds the read lock for
//! its whole traversal and observes one consistent snapshot.
//!
//! Endpoint policy: an edge whose endpoint entity has not arrived yet creates
//! a placeholder vertex, completed idempotently by the later entity event.
//! Updates and deletes addressing an unknown GUID are typed not-found errors
//! that the consumer logs and discards.

use crate::error::LinealError;
use crate::events::LineageEvent;
use crate::model::{
    EdgeKey, LineageEdge, LineageSearchRequest, LineageVertex, NodeNamesSearchCriteria,
};
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};

/// Cap applied to search requests that ask for more.
const MAX_SEARCH_LIMIT: usize = 100;

/// Default page size when a search request does not specify one.
const DEFAULT_SEARCH_LIMIT: usize = 20;

#[derive(Debug, Default)]
pub struct LineageGraph {
    vertices: HashMap<String, LineageVertex>,
    edges: HashMap<EdgeKey, LineageEdge>,
    out_edges: HashMap<String, BTreeSet<EdgeKey>>,
    in_edges: HashMap<String, BTreeSet<EdgeKey>>,
}

impl LineageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn get_vertex(&self, guid: &str) -> Option<&LineageVertex> {
        self.vertices.get(guid)
    }

    pub fn get_edge(&self, key: &EdgeKey) -> Option<&LineageEdge> {
        self.edges.get(key)
    }

    /// Edges leaving `guid`, in key order.
    pub fn outgoing(&self, guid: &str) -> impl Iterator<Item = &LineageEdge> {
        self.out_edges
            .get(guid)
            .into_iter()
            .flatten()
            .filter_map(|k| self.edges.get(k))
    }

    /// Edges arriving at `guid`, in key order.
    pub fn incoming(&self, guid: &str) -> impl Iterator<Item = &LineageEdge> {
        self.in_edges
            .get(guid)
            .into_iter()
            .flatten()
            .filter_map(|k| self.edges.get(k))
    }

    /// Insert or replace a vertex. Last write wins on the full property set.
    /// A placeholder left behind by edge-first ingestion is completed here.
    pub fn upsert_vertex(
        &mut self,
        guid: &str,
        type_name: &str,
        display_name: &str,
        properties: std::collections::BTreeMap<String, String>,
    ) {
        let vertex = LineageVertex {
            guid: guid.to_string(),
            type_name: type_name.to_string(),
            display_name: display_name.to_string(),
            properties,
            updated_at: Utc::now(),
        };
        self.vertices.insert(guid.to_string(), vertex);
        self.out_edges.entry(guid.to_string()).or_default();
        self.in_edges.entry(guid.to_string()).or_default();
    }

    /// Insert or replace an edge, materializing placeholder endpoints for
    /// entities that have not arrived yet.
    pub fn upsert_edge(
        &mut self,
        source: &str,
        target: &str,
        type_name: &str,
        properties: std::collections::BTreeMap<String, String>,
    ) {
        for endpoint in [source, target] {
            if !self.vertices.contains_key(endpoint) {
                tracing::debug!(guid = endpoint, "creating placeholder vertex for edge endpoint");
                self.vertices
                    .insert(endpoint.to_string(), LineageVertex::placeholder(endpoint));
            }
        }

        let edge = LineageEdge {
            source: source.to_string(),
            target: target.to_string(),
            type_name: type_name.to_string(),
            properties,
            updated_at: Utc::now(),
        };
        let key = edge.key();
        self.out_edges
            .entry(source.to_string())
            .or_default()
            .insert(key.clone());
        self.in_edges
            .entry(target.to_string())
            .or_default()
            .insert(key.clone());
        self.edges.insert(key, edge);
    }

    /// Remove a vertex and cascade to its incident edges.
    pub fn delete_vertex(&mut self, guid: &str) -> Result<(), LinealError> {
        if self.vertices.remove(guid).is_none() {
            return Err(LinealError::NotFound(format!("vertex {guid}")));
        }

        let incident: Vec<EdgeKey> = self
            .out_edges
            .remove(guid)
            .unwrap_or_default()
            .into_iter()
            .chain(self.in_edges.remove(guid).unwrap_or_default())
            .collect();

        for key in incident {
            self.edges.remove(&key);
            if let Some(set) = self.out_edges.get_mut(&key.source) {
                set.remove(&key);
            }
            if let Some(set) = self.in_edges.get_mut(&key.target) {
                set.remove(&key);
            }
        }
        Ok(())
    }

    pub fn delete_edge(
        &mut self,
        source: &str,
        target: &str,
        type_name: &str,
    ) -> Result<(), LinealError> {
        let key = EdgeKey {
            source: source.to_string(),
            target: target.to_string(),
            type_name: type_name.to_string(),
        };
        if self.edges.remove(&key).is_none() {
            return Err(LinealError::NotFound(format!(
                "edge {source} -[{type_name}]-> {target}"
            )));
        }
        if let Some(set) = self.out_edges.get_mut(source) {
            set.remove(&key);
        }
        if let Some(set) = self.in_edges.get_mut(target) {
            set.remove(&key);
        }
        Ok(())
    }

    /// Apply one change event. Not-found errors are non-fatal: the consumer
    /// logs and discards them without touching the query path.
    pub fn apply(&mut self, event: LineageEvent) -> Result<(), LinealError> {
        match event {
            LineageEvent::EntityCreated {
                guid,
                type_name,
                display_name,
                new_properties,
            } => {
                self.upsert_vertex(&guid, &type_name, &display_name, new_properties);
                Ok(())
            }
            LineageEvent::EntityUpdated {
                guid,
                type_name,
                display_name,
                new_properties,
                ..
            } => {
                // Placeholders count as known: the update completes them.
                if !self.vertices.contains_key(&guid) {
                    return Err(LinealError::NotFound(format!("vertex {guid}")));
                }
                self.upsert_vertex(&guid, &type_name, &display_name, new_properties);
                Ok(())
            }
            LineageEvent::EntityDeleted { guid } => self.delete_vertex(&guid),
            LineageEvent::RelationshipCreated {
                source_guid,
                target_guid,
                type_name,
                new_properties,
            } => {
                self.upsert_edge(&source_guid, &target_guid, &type_name, new_properties);
                Ok(())
            }
            LineageEvent::RelationshipUpdated {
                source_guid,
                target_guid,
                type_name,
                new_properties,
                ..
            } => {
                let key = EdgeKey {
                    source: source_guid.clone(),
                    target: target_guid.clone(),
                    type_name: type_name.clone(),
                };
                if !self.edges.contains_key(&key) {
                    return Err(LinealError::NotFound(format!(
                        "edge {source_guid} -[{type_name}]-> {target_guid}"
                    )));
                }
                self.upsert_edge(&source_guid, &target_guid, &type_name, new_properties);
                Ok(())
            }
            LineageEvent::RelationshipDeleted {
                source_guid,
                target_guid,
                type_name,
            } => self.delete_edge(&source_guid, &target_guid, &type_name),
        }
    }

    /// Distinct vertex type names present in the graph, sorted. Placeholders
    /// (empty type) are excluded.
    pub fn vertex_types(&self) -> Vec<String> {
        let types: BTreeSet<String> = self
            .vertices
            .values()
            .filter(|v| !v.is_placeholder())
            .map(|v| v.type_name.clone())
            .collect();
        types.into_iter().collect()
    }

    /// Node-name search: optional type filter plus case-insensitive substring
    /// match on the display name, capped at `criteria.limit`.
    pub fn find_nodes(&self, criteria: &NodeNamesSearchCriteria) -> Vec<LineageVertex> {
        let needle = criteria.search_value.to_lowercase();
        let mut hits: Vec<&LineageVertex> = self
            .vertices
            .values()
            .filter(|v| match &criteria.type_name {
                Some(t) => &v.type_name == t,
                None => true,
            })
            .filter(|v| v.display_name.to_lowercase().contains(&needle))
            .collect();
        hits.sort_by(|a, b| a.guid.cmp(&b.guid));
        hits.into_iter().take(criteria.limit).cloned().collect()
    }

    /// Free-text search over display names and property values, paginated.
    pub fn search(&self, request: &LineageSearchRequest) -> Vec<LineageVertex> {
        let needle = request.query.to_lowercase();
        let limit = request
            .limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);

        let mut hits: Vec<&LineageVertex> = self
            .vertices
            .values()
            .filter(|v| request.type_names.is_empty() || request.type_names.contains(&v.type_name))
            .filter(|v| {
                v.display_name.to_lowercase().contains(&needle)
                    || v.properties
                        .values()
                        .any(|p| p.to_lowercase().contains(&needle))
            })
            .collect();
        hits.sort_by(|a, b| a.guid.cmp(&b.guid));
        hits.into_iter()
            .skip(request.offset)
            .take(limit)
            .cloned()
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
