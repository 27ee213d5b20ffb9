//! Change events consumed from the metadata fabric
//!
//! Events arrive as JSON on the intake channel, camelCase, tagged by
//! `eventType`. Update events carry both `oldProperties` and `newProperties`;
//! only the new set is applied — the old set exists for audit and diffing.

use crate::error::LinealError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineageEvent {
    #[serde(rename_all = "camelCase")]
    EntityCreated {
        guid: String,
        type_name: String,
        #[serde(default)]
        display_name: String,
        #[serde(default)]
        new_properties: BTreeMap<String, String>,
    },
    #[serde(rename_all = "camelCase")]
    EntityUpdated {
        guid: String,
        type_name: String,
        #[serde(default)]
        display_name: String,
        #[serde(default)]
        old_properties: Option<BTreeMap<String, String>>,
        #[serde(default)]
        new_properties: BTreeMap<String, String>,
    },
    #[serde(rename_all = "camelCase")]
    EntityDeleted { guid: String },
    #[serde(rename_all = "camelCase")]
    RelationshipCreated {
        source_guid: String,
        target_guid: String,
        type_name: String,
        #[serde(default)]
        new_properties: BTreeMap<String, String>,
    },
    #[serde(rename_all = "camelCase")]
    RelationshipUpdated {
        source_guid: String,
        target_guid: String,
        type_name: String,
        #[serde(default)]
        old_properties: Option<BTreeMap<String, String>>,
        #[serde(default)]
        new_properties: BTreeMap<String, String>,
    },
    #[serde(rename_all = "camelCase")]
    RelationshipDeleted {
        source_guid: String,
        target_guid: String,
        type_name: String,
    },
}

impl LineageEvent {
    /// GUID the event is keyed by, for per-GUID ordering diagnostics.
    pub fn subject_guid(&self) -> &str {
        match self {
            LineageEvent::EntityCreated { guid, .. }
            | LineageEvent::EntityUpdated { guid, .. }
            | LineageEvent::EntityDeleted { guid } => guid,
            LineageEvent::RelationshipCreated { source_guid, .. }
            | LineageEvent::RelationshipUpdated { source_guid, .. }
            | LineageEvent::RelationshipDeleted { source_guid, .. } => source_guid,
        }
    }
}

/// Parse one JSON-encoded change event. Malformed input is a typed,
/// non-fatal error; the caller logs and drops the event.
pub fn parse_event(raw: &str) -> Result<LineageEvent, LinealError> {
    serde_json::from_str(raw).map_err(|e| LinealError::ParseEvent(e.to_string()))
}
