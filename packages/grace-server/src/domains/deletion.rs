//! The logical-delete → timer-scheduled physical-delete path.
//!
//! Every logical deletion registers a one-shot `PhysicalDeletion`
//! reminder whose payload is this versioned record. The scheduling site
//! and the reminder handler share the one type, and the `version` field
//! lets in-flight reminders survive payload changes across upgrades.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reminder name used by every entity's deletion path.
pub const PHYSICAL_DELETION: &str = "PhysicalDeletion";

/// Canonical physical-deletion reminder payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalDeletionPayload {
    pub version: u32,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    #[serde(default)]
    pub repository_id: Option<Uuid>,
    #[serde(default)]
    pub branch_id: Option<Uuid>,
    #[serde(default)]
    pub delete_reason: String,
    #[serde(default)]
    pub correlation_id: String,
}

impl PhysicalDeletionPayload {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(delete_reason: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            owner_id: None,
            organization_id: None,
            repository_id: None,
            branch_id: None,
            delete_reason: delete_reason.into(),
            correlation_id: correlation_id.into(),
        }
    }

    pub fn with_owner(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn with_organization(mut self, organization_id: Uuid) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    pub fn with_repository(mut self, repository_id: Uuid) -> Self {
        self.repository_id = Some(repository_id);
        self
    }

    pub fn with_branch(mut self, branch_id: Uuid) -> Self {
        self.branch_id = Some(branch_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips() {
        let payload = PhysicalDeletionPayload::new("retention expired", "c-42")
            .with_repository(Uuid::new_v4())
            .with_branch(Uuid::new_v4());

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["version"], 1);

        let back: PhysicalDeletionPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn missing_fields_decode_to_defaults() {
        // A payload written by an older build decodes without error.
        let back: PhysicalDeletionPayload =
            serde_json::from_value(serde_json::json!({"version": 1})).unwrap();
        assert_eq!(back.delete_reason, "");
        assert_eq!(back.owner_id, None);
    }
}
