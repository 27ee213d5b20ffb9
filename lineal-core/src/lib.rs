pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod ipc;
pub mod model;
pub mod traversal;

pub use config::LinealConfig;
pub use error::LinealError;
pub use events::{parse_event, LineageEvent};
pub use graph::LineageGraph;
pub use model::{
    ElementHierarchyRequest, HierarchyDirection, LineageEdge, LineageSearchRequest, LineageVertex,
    LineageVerticesAndEdges, NodeNamesSearchCriteria, Scope,
};
pub use traversal::{element_hierarchy, traverse, EdgeClassifier};
