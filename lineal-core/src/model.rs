//! Core lineage data model
//!
//! One tagged vertex type and one tagged edge type carry the whole catalog:
//! entity and relationship kinds are type-name strings plus a property map,
//! never one Rust type per metadata type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Type name given to edges synthesized when process vertices are elided
/// from a traversal result.
pub const BRIDGE_EDGE_TYPE: &str = "ProcessBridge";

/// Property on a bridge edge naming the elided process GUID.
pub const BRIDGE_VIA_PROPERTY: &str = "bridged_via";

/// One catalog entity participating in lineage (table, column, process,
/// glossary term, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageVertex {
    pub guid: String,
    pub type_name: String,
    pub display_name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    pub updated_at: DateTime<Utc>,
}

impl LineageVertex {
    pub fn new(
        guid: impl Into<String>,
        type_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            guid: guid.into(),
            type_name: type_name.into(),
            display_name: display_name.into(),
            properties: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Placeholder created when an edge arrives before its endpoint entity.
    /// Filled in by the later entity event.
    pub fn placeholder(guid: impl Into<String>) -> Self {
        Self::new(guid, "", "")
    }

    pub fn is_placeholder(&self) -> bool {
        self.type_name.is_empty()
    }
}

/// A typed, directed relationship between two vertices, identified by
/// `(source, target, type_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub source: String,
    pub target: String,
    pub type_name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    pub updated_at: DateTime<Utc>,
}

impl LineageEdge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            type_name: type_name.into(),
            properties: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            source: self.source.clone(),
            target: self.target.clone(),
            type_name: self.type_name.clone(),
        }
    }
}

/// Identity of an edge within the graph store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    pub source: String,
    pub target: String,
    pub type_name: String,
}

/// Immutable traversal result: a subgraph of vertices and edges.
///
/// Vertices are sorted by GUID and edges by key so responses are stable
/// across identical queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineageVerticesAndEdges {
    pub vertices: Vec<LineageVertex>,
    pub edges: Vec<LineageEdge>,
}

impl LineageVerticesAndEdges {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }

    pub fn contains_vertex(&self, guid: &str) -> bool {
        self.vertices.iter().any(|v| v.guid == guid)
    }

    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        self.edges
            .iter()
            .any(|e| e.source == source && e.target == target)
    }
}

/// Traversal mode. Every lineage request binds exactly one scope and one
/// starting GUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// Immediate predecessors and successors, one hop each direction.
    SourceAndDestination,
    /// Full lineage chain through the start vertex, both directions.
    EndToEnd,
    /// Transitive walk against data-flow direction until no predecessors.
    UltimateSource,
    /// Transitive walk with data-flow direction until no successors.
    UltimateDestination,
    /// Glossary terms associated with the start vertex, directly or
    /// transitively, over semantic-assignment edges.
    Glossary,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Scope::SourceAndDestination => "source-and-destination",
            Scope::EndToEnd => "end-to-end",
            Scope::UltimateSource => "ultimate-source",
            Scope::UltimateDestination => "ultimate-destination",
            Scope::Glossary => "glossary",
        };
        f.write_str(s)
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source-and-destination" => Ok(Scope::SourceAndDestination),
            "end-to-end" => Ok(Scope::EndToEnd),
            "ultimate-source" => Ok(Scope::UltimateSource),
            "ultimate-destination" => Ok(Scope::UltimateDestination),
            "glossary" => Ok(Scope::Glossary),
            other => Err(format!("unknown lineage scope: {other}")),
        }
    }
}

/// Search for nodes by type plus case-insensitive substring match on the
/// display name, bounded by a maximum result count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeNamesSearchCriteria {
    pub type_name: Option<String>,
    pub search_value: String,
    pub limit: usize,
}

/// Free-text search over display names and property values, paginated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageSearchRequest {
    pub query: String,
    #[serde(default)]
    pub type_names: Vec<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

/// Direction for a structural-containment traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HierarchyDirection {
    Upward,
    Downward,
    #[default]
    All,
}

/// Containment traversal scoped to hierarchy edges (schema membership and
/// the like) rather than data-flow edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementHierarchyRequest {
    pub guid: String,
    #[serde(default)]
    pub direction: HierarchyDirection,
}
