use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One immutable audit record: which entity, what happened, structured
/// details, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub entity: String,
    pub action: String,
    pub details: JsonValue,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        entity: impl Into<String>,
        action: impl Into<String>,
        details: JsonValue,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity: entity.into(),
            action: action.into(),
            details,
            recorded_at,
        }
    }
}
