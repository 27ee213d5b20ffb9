//! Scope-bounded traversal engine
//!
//! Pure functions over a `LineageGraph` snapshot: no I/O, no locking, fully
//! testable without a running server. The caller (the warehouse handler)
//! holds the store's read lock for the duration of one traversal, so every
//! hop observes the same graph.
//!
//! Edge semantics come from an `EdgeClassifier` built out of the configured
//! mapping tables: data-flow edges drive the lineage scopes, glossary edges
//! drive the glossary scope, hierarchy edges drive element-hierarchy queries.

use crate::config::TraversalConfig;
use crate::graph::LineageGraph;
use crate::model::{
    EdgeKey, HierarchyDirection, LineageEdge, LineageVerticesAndEdges, Scope, BRIDGE_EDGE_TYPE,
    BRIDGE_VIA_PROPERTY,
};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Explicit classification tables, injected at construction.
#[derive(Debug, Clone)]
pub struct EdgeClassifier {
    data_flow: BTreeSet<String>,
    glossary: BTreeSet<String>,
    hierarchy: BTreeSet<String>,
    process_vertices: BTreeSet<String>,
}

impl EdgeClassifier {
    pub fn from_config(config: &TraversalConfig) -> Self {
        Self {
            data_flow: config.data_flow_edge_types.iter().cloned().collect(),
            glossary: config.glossary_edge_types.iter().cloned().collect(),
            hierarchy: config.hierarchy_edge_types.iter().cloned().collect(),
            process_vertices: config.process_vertex_types.iter().cloned().collect(),
        }
    }

    pub fn is_data_flow(&self, type_name: &str) -> bool {
        self.data_flow.contains(type_name)
    }

    pub fn is_glossary(&self, type_name: &str) -> bool {
        self.glossary.contains(type_name)
    }

    pub fn is_hierarchy(&self, type_name: &str) -> bool {
        self.hierarchy.contains(type_name)
    }

    pub fn is_process_vertex(&self, type_name: &str) -> bool {
        self.process_vertices.contains(type_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Upstream,
    Downstream,
}

/// Execute one scope-bounded traversal from `start_guid`.
///
/// Unknown start GUIDs yield an empty subgraph, not an error. The graph may
/// contain cycles; a visited set guarantees each vertex enters the result at
/// most once. `max_hops` bounds the walk depth (0 disables the bound).
pub fn traverse(
    graph: &LineageGraph,
    classifier: &EdgeClassifier,
    scope: Scope,
    start_guid: &str,
    include_processes: bool,
    max_hops: usize,
) -> LineageVerticesAndEdges {
    if graph.get_vertex(start_guid).is_none() {
        return LineageVerticesAndEdges::default();
    }

    let data_flow = |t: &str| classifier.is_data_flow(t);
    let glossary = |t: &str| classifier.is_glossary(t);

    let (guids, edge_keys) = match scope {
        Scope::UltimateSource => walk(
            graph,
            start_guid,
            &[Direction::Upstream],
            &data_flow,
            max_hops,
        ),
        Scope::UltimateDestination => walk(
            graph,
            start_guid,
            &[Direction::Downstream],
            &data_flow,
            max_hops,
        ),
        Scope::EndToEnd => {
            let (mut guids, mut keys) = walk(
                graph,
                start_guid,
                &[Direction::Upstream],
                &data_flow,
                max_hops,
            );
            let (down_guids, down_keys) = walk(
                graph,
                start_guid,
                &[Direction::Downstream],
                &data_flow,
                max_hops,
            );
            guids.extend(down_guids);
            keys.extend(down_keys);
            (guids, keys)
        }
        Scope::SourceAndDestination => {
            let (mut guids, mut keys) =
                walk(graph, start_guid, &[Direction::Upstream], &data_flow, 1);
            let (down_guids, down_keys) =
                walk(graph, start_guid, &[Direction::Downstream], &data_flow, 1);
            guids.extend(down_guids);
            keys.extend(down_keys);
            (guids, keys)
        }
        Scope::Glossary => walk(
            graph,
            start_guid,
            &[Direction::Upstream, Direction::Downstream],
            &glossary,
            max_hops,
        ),
    };

    let mut result = assemble(graph, guids, edge_keys);
    if !include_processes {
        elide_processes(&mut result, classifier);
    }
    result
}

/// Structural-containment traversal over hierarchy edges.
pub fn element_hierarchy(
    graph: &LineageGraph,
    classifier: &EdgeClassifier,
    start_guid: &str,
    direction: HierarchyDirection,
    max_hops: usize,
) -> LineageVerticesAndEdges {
    if graph.get_vertex(start_guid).is_none() {
        return LineageVerticesAndEdges::default();
    }

    let dirs: &[Direction] = match direction {
        HierarchyDirection::Upward => &[Direction::Upstream],
        HierarchyDirection::Downward => &[Direction::Downstream],
        HierarchyDirection::All => &[Direction::Upstream, Direction::Downstream],
    };
    let hierarchy = |t: &str| classifier.is_hierarchy(t);
    let (guids, edge_keys) = walk(graph, start_guid, dirs, &hierarchy, max_hops);
    assemble(graph, guids, edge_keys)
}

/// Breadth-first walk from `start` along edges accepted by `edge_pred`,
/// following the given directions, bounded by `max_hops` (0 = unbounded).
fn walk(
    graph: &LineageGraph,
    start: &str,
    directions: &[Direction],
    edge_pred: &dyn Fn(&str) -> bool,
    max_hops: usize,
) -> (BTreeSet<String>, BTreeSet<EdgeKey>) {
    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut edges: BTreeSet<EdgeKey> = BTreeSet::new();
    let mut frontier: VecDeque<(String, usize)> = VecDeque::new();

    visited.insert(start.to_string());
    frontier.push_back((start.to_string(), 0));

    while let Some((guid, depth)) = frontier.pop_front() {
        if max_hops != 0 && depth >= max_hops {
            continue;
        }
        for direction in directions {
            let incident: Vec<&LineageEdge> = match direction {
                Direction::Upstream => graph.incoming(&guid).collect(),
                Direction::Downstream => graph.outgoing(&guid).collect(),
            };
            for edge in incident {
                if !edge_pred(&edge.type_name) {
                    continue;
                }
                edges.insert(edge.key());
                let neighbor = match direction {
                    Direction::Upstream => &edge.source,
                    Direction::Downstream => &edge.target,
                };
                if visited.insert(neighbor.clone()) {
                    frontier.push_back((neighbor.clone(), depth + 1));
                }
            }
        }
    }

    (visited, edges)
}

/// Materialize a subgraph from visited GUIDs and traversed edge keys,
/// with deterministic ordering.
fn assemble(
    graph: &LineageGraph,
    guids: BTreeSet<String>,
    edge_keys: BTreeSet<EdgeKey>,
) -> LineageVerticesAndEdges {
    let vertices = guids
        .iter()
        .filter_map(|g| graph.get_vertex(g))
        .cloned()
        .collect();
    let edges = edge_keys
        .iter()
        .filter_map(|k| graph.get_edge(k))
        .cloned()
        .collect();
    LineageVerticesAndEdges { vertices, edges }
}

/// Remove process vertices from a result subgraph while preserving
/// connectivity: each predecessor of an elided process is bridged to each of
/// its successors with a synthesized `ProcessBridge` edge whose
/// `bridged_via` property names the elided GUIDs.
///
/// Elision runs one process at a time so chains of processes collapse into a
/// single bridge between their non-process endpoints.
fn elide_processes(result: &mut LineageVerticesAndEdges, classifier: &EdgeClassifier) {
    loop {
        let process_guid = match result
            .vertices
            .iter()
            .find(|v| classifier.is_process_vertex(&v.type_name))
        {
            Some(v) => v.guid.clone(),
            None => return,
        };

        let incoming: Vec<LineageEdge> = result
            .edges
            .iter()
            .filter(|e| e.target == process_guid && e.source != process_guid)
            .cloned()
            .collect();
        let outgoing: Vec<LineageEdge> = result
            .edges
            .iter()
            .filter(|e| e.source == process_guid && e.target != process_guid)
            .cloned()
            .collect();

        result.vertices.retain(|v| v.guid != process_guid);
        result
            .edges
            .retain(|e| e.source != process_guid && e.target != process_guid);

        for in_edge in &incoming {
            for out_edge in &outgoing {
                if in_edge.source == out_edge.target {
                    // A cycle through the process collapses to nothing.
                    continue;
                }
                let mut via: Vec<String> = Vec::new();
                if let Some(prior) = in_edge.properties.get(BRIDGE_VIA_PROPERTY) {
                    via.push(prior.clone());
                }
                via.push(process_guid.clone());
                if let Some(prior) = out_edge.properties.get(BRIDGE_VIA_PROPERTY) {
                    via.push(prior.clone());
                }

                let mut properties = BTreeMap::new();
                properties.insert(BRIDGE_VIA_PROPERTY.to_string(), via.join(","));
                let bridge = LineageEdge {
                    source: in_edge.source.clone(),
                    target: out_edge.target.clone(),
                    type_name: BRIDGE_EDGE_TYPE.to_string(),
                    properties,
                    updated_at: Utc::now(),
                };
                if !result
                    .edges
                    .iter()
                    .any(|e| e.key() == bridge.key())
                {
                    result.edges.push(bridge);
                }
            }
        }
        result.edges.sort_by(|a, b| a.key().cmp(&b.key()));
    }
}

// ============================================================================
// TESTS
// ============================================================================
