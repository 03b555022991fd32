//! Correlation metadata attached to every command and published event.
//!
//! A correlation id is a client-supplied unique string per logical request.
//! It is threaded through validation, the actor turn, persistence and
//! publishing, and doubles as the per-entity idempotency key: an entity
//! rejects a second distinct command carrying a correlation id it has
//! already recorded.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata accompanying a command or a published event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl EventMetadata {
    /// Metadata stamped with the current wall-clock time.
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self::new_at(correlation_id, Utc::now())
    }

    /// Metadata with an explicit timestamp (tests, replays).
    pub fn new_at(correlation_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            timestamp,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// An empty correlation id is never admissible.
    pub fn has_correlation_id(&self) -> bool {
        !self.correlation_id.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_bag_round_trips() {
        let metadata = EventMetadata::new("c-1")
            .with_property("OwnerId", "o-1")
            .with_property("RepositoryId", "r-1");

        assert_eq!(metadata.property("OwnerId"), Some("o-1"));
        assert_eq!(metadata.property("RepositoryId"), Some("r-1"));
        assert_eq!(metadata.property("BranchId"), None);
    }

    #[test]
    fn blank_correlation_id_is_rejected() {
        assert!(EventMetadata::new("c-1").has_correlation_id());
        assert!(!EventMetadata::new("").has_correlation_id());
        assert!(!EventMetadata::new("   ").has_correlation_id());
    }

    #[test]
    fn serde_shape_is_stable() {
        let metadata = EventMetadata::new_at("c-9", Utc::now()).with_property("k", "v");
        let json = serde_json::to_value(&metadata).unwrap();

        assert_eq!(json["correlation_id"], "c-9");
        assert_eq!(json["properties"]["k"], "v");

        let back: EventMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, metadata);
    }
}
