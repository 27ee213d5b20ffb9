use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct LinealConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
    #[serde(default)]
    pub traversal: TraversalConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub socket_path: String,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            socket_path: "/tmp/lineal.sock".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IntakeConfig {
    /// TCP address the JSON-lines event listener binds to.
    pub listen_addr: String,
    /// Bound on the in-flight event queue between intake and the consumer.
    pub queue_capacity: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8767".to_string(),
            queue_capacity: 1024,
        }
    }
}

/// Edge/vertex type classification tables for the traversal engine.
///
/// These are explicit, injected mapping tables: which relationship type names
/// carry data flow, which attach glossary terms, which express structural
/// containment, and which entity type names are process/transformation nodes.
#[derive(Debug, Deserialize, Clone)]
pub struct TraversalConfig {
    /// Hop budget per traversal; 0 disables the bound.
    pub max_hops: usize,
    pub data_flow_edge_types: Vec<String>,
    pub glossary_edge_types: Vec<String>,
    pub hierarchy_edge_types: Vec<String>,
    pub process_vertex_types: Vec<String>,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_hops: 100,
            data_flow_edge_types: vec![
                "DataFlow".to_string(),
                "LineageMapping".to_string(),
                "ProcessCall".to_string(),
            ],
            glossary_edge_types: vec![
                "SemanticAssignment".to_string(),
                "TermCategorization".to_string(),
                "TermAnchor".to_string(),
            ],
            hierarchy_edge_types: vec![
                "SchemaAttribute".to_string(),
                "AttributeForSchema".to_string(),
                "NestedSchemaAttribute".to_string(),
                "AssetSchemaType".to_string(),
            ],
            process_vertex_types: vec!["Process".to_string(), "ProcessPort".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8766,
        }
    }
}

impl LinealConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_traversal_tables_non_empty() {
        let t = TraversalConfig::default();
        assert!(t.max_hops > 0);
        assert!(!t.data_flow_edge_types.is_empty());
        assert!(!t.glossary_edge_types.is_empty());
        assert!(!t.hierarchy_edge_types.is_empty());
        assert!(!t.process_vertex_types.is_empty());
    }

    #[test]
    fn test_default_http_config() {
        let h = HttpConfig::default();
        assert!(h.enabled);
        assert_eq!(h.port, 8766);
    }
}
