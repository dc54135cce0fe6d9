//! Outbox entry records and their delivery status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::{CorrelationId, EntityId};
use serde::{Deserialize, Serialize};

pub(crate) const STATUS_FIELD: &str = "status";
pub(crate) const UPDATED_AT_FIELD: &str = "updatedAt";
pub(crate) const CORRELATION_ID_FIELD: &str = "correlationId";

/// Delivery status of an outbox entry.
///
/// Entries move forward only: `NotPublished` → `InProgress` → `Published`
/// or `Failed`. A stale `InProgress` claim may be released back to
/// `NotPublished` by the reaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxStatus {
    NotPublished,
    InProgress,
    Published,
    Failed,
}

impl OutboxStatus {
    /// Returns the stored tag for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::NotPublished => "NOT_PUBLISHED",
            OutboxStatus::InProgress => "IN_PROGRESS",
            OutboxStatus::Published => "PUBLISHED",
            OutboxStatus::Failed => "FAILED",
        }
    }

    /// Returns true if the publisher will never touch the entry again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutboxStatus::Published | OutboxStatus::Failed)
    }

    pub(crate) fn to_value(self) -> serde_json::Value {
        serde_json::Value::String(self.as_str().to_string())
    }
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown outbox status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OutboxStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_PUBLISHED" => Ok(OutboxStatus::NotPublished),
            "IN_PROGRESS" => Ok(OutboxStatus::InProgress),
            "PUBLISHED" => Ok(OutboxStatus::Published),
            "FAILED" => Ok(OutboxStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// An integration event before it is written to the outbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationEvent<T> {
    /// Event type tag, delivered as the bus detail type.
    pub name: String,
    pub payload: T,
}

impl<T> IntegrationEvent<T> {
    pub fn new(name: impl Into<String>, payload: T) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// A persisted outbox entry.
///
/// The payload is kept as the serialized JSON string that will be handed to
/// the bus unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    pub id: EntityId,
    pub name: String,
    pub payload: String,
    pub status: OutboxStatus,
    pub correlation_id: CorrelationId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OutboxEntry {
    /// Creates a new unpublished entry.
    pub fn new(
        name: impl Into<String>,
        payload: String,
        correlation_id: CorrelationId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            payload,
            status: OutboxStatus::NotPublished,
            correlation_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_uses_screaming_snake_case_tags() {
        assert_eq!(
            serde_json::to_value(OutboxStatus::NotPublished).unwrap(),
            json!("NOT_PUBLISHED")
        );
        assert_eq!(OutboxStatus::InProgress.to_value(), json!("IN_PROGRESS"));
        assert_eq!("FAILED".parse::<OutboxStatus>().unwrap(), OutboxStatus::Failed);
        assert!("DONE".parse::<OutboxStatus>().is_err());
    }

    #[test]
    fn only_published_and_failed_are_terminal() {
        assert!(!OutboxStatus::NotPublished.is_terminal());
        assert!(!OutboxStatus::InProgress.is_terminal());
        assert!(OutboxStatus::Published.is_terminal());
        assert!(OutboxStatus::Failed.is_terminal());
    }

    #[test]
    fn entry_serializes_with_camel_case_fields() {
        let correlation_id = CorrelationId::new();
        let entry = OutboxEntry::new("OrderPlaced", "{}".to_string(), correlation_id, Utc::now());
        let doc = serde_json::to_value(&entry).unwrap();

        assert_eq!(doc["status"], json!("NOT_PUBLISHED"));
        assert_eq!(doc["correlationId"], json!(correlation_id.to_string()));
        assert!(doc.get("createdAt").is_some());
        assert!(doc.get("updatedAt").is_some());

        let back: OutboxEntry = serde_json::from_value(doc).unwrap();
        assert_eq!(back, entry);
    }
}
