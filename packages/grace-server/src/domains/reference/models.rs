//! Reference read model.
//!
//! A reference is a named snapshot of a directory tree at a moment in a
//! branch. Immutable once created apart from (un)deletion; the type is
//! fixed at creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::ReferenceEvent;
use crate::domains::entity::EventSourced;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceType {
    #[default]
    Save,
    Checkpoint,
    Commit,
    Promotion,
    Tag,
    External,
    Rebase,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDto {
    pub reference_id: Uuid,
    pub repository_id: Uuid,
    pub branch_id: Uuid,
    pub directory_version_id: Uuid,
    pub sha256_hash: String,
    pub reference_type: ReferenceType,
    pub reference_text: String,
    pub created_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub delete_reason: String,
}

impl EventSourced for ReferenceDto {
    type Event = ReferenceEvent;

    fn apply(mut dto: Self, event: &ReferenceEvent) -> Self {
        match event {
            ReferenceEvent::Created {
                reference_id,
                repository_id,
                branch_id,
                directory_version_id,
                sha256_hash,
                reference_type,
                reference_text,
                created_at,
            } => {
                dto.reference_id = *reference_id;
                dto.repository_id = *repository_id;
                dto.branch_id = *branch_id;
                dto.directory_version_id = *directory_version_id;
                dto.sha256_hash = sha256_hash.clone();
                dto.reference_type = *reference_type;
                dto.reference_text = reference_text.clone();
                dto.created_at = Some(*created_at);
            }
            ReferenceEvent::LogicalDeleted {
                delete_reason,
                deleted_at,
                ..
            } => {
                dto.deleted_at = Some(*deleted_at);
                dto.delete_reason = delete_reason.clone();
            }
            ReferenceEvent::Undeleted { .. } => {
                dto.deleted_at = None;
                dto.delete_reason.clear();
            }
            ReferenceEvent::PhysicalDeleted { .. } => {}
        }
        dto
    }

    fn exists(&self) -> bool {
        !self.reference_id.is_nil()
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_is_fixed_at_creation() {
        let dto = ReferenceDto::apply(
            ReferenceDto::default(),
            &ReferenceEvent::Created {
                reference_id: Uuid::new_v4(),
                repository_id: Uuid::new_v4(),
                branch_id: Uuid::new_v4(),
                directory_version_id: Uuid::new_v4(),
                sha256_hash: "ab".repeat(32),
                reference_type: ReferenceType::Promotion,
                reference_text: "ship it".into(),
                created_at: Utc::now(),
            },
        );
        assert!(dto.exists());
        assert_eq!(dto.reference_type, ReferenceType::Promotion);

        // No later event changes the type.
        let dto = ReferenceDto::apply(
            dto,
            &ReferenceEvent::LogicalDeleted {
                reference_id: Uuid::new_v4(),
                branch_id: Uuid::new_v4(),
                delete_reason: "r".into(),
                deleted_at: Utc::now(),
            },
        );
        assert_eq!(dto.reference_type, ReferenceType::Promotion);
    }
}
