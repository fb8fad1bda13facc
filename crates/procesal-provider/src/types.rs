//! Country-agnostic shapes returned by providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of searching the remote system by radicado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSummary {
    /// Provider-assigned process identifier, used for subsequent calls.
    pub process_id: String,

    /// Visibility flag from the remote source.
    pub is_private: bool,

    /// Jurisdiction-specific search fields (department, office, subjects,
    /// ...), opaque to the reconciler.
    pub fields: Map<String, Value>,
}

/// One procedural event from the remote docket, in the provider's order
/// (most recent first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAction {
    /// Correlation key, unique within the process.
    pub external_id: String,

    /// Kind of procedural event.
    pub action_type: String,

    /// Free-text annotation.
    pub annotation: String,

    /// When the action happened.
    pub action_date: Option<DateTime<Utc>>,

    /// When the action was registered in the remote system.
    pub registration_date: Option<DateTime<Utc>>,

    /// Start of the action's term, where the jurisdiction has one.
    pub initial_date: Option<DateTime<Utc>>,

    /// End of the action's term, where the jurisdiction has one.
    pub final_date: Option<DateTime<Utc>>,

    /// Whether documents are attached remotely.
    pub has_documents: bool,

    /// Any further jurisdiction-specific fields.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl RemoteAction {
    /// Standard derived metadata for the local mirror: the secondary dates,
    /// present only when the provider supplied them.
    pub fn derived_metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        if let Some(at) = self.registration_date {
            metadata.insert("registration_date".to_string(), Value::from(at.to_rfc3339()));
        }
        if let Some(at) = self.initial_date {
            metadata.insert("initial_date".to_string(), Value::from(at.to_rfc3339()));
        }
        if let Some(at) = self.final_date {
            metadata.insert("final_date".to_string(), Value::from(at.to_rfc3339()));
        }
        metadata
    }
}
