use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::ReferenceType;
use crate::domains::entity::DomainEvent;

/// Reference events carry their branch id so read-model updaters can
/// index them without consulting the actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReferenceEvent {
    Created {
        reference_id: Uuid,
        repository_id: Uuid,
        branch_id: Uuid,
        directory_version_id: Uuid,
        sha256_hash: String,
        reference_type: ReferenceType,
        reference_text: String,
        created_at: DateTime<Utc>,
    },
    LogicalDeleted {
        reference_id: Uuid,
        branch_id: Uuid,
        delete_reason: String,
        deleted_at: DateTime<Utc>,
    },
    PhysicalDeleted {
        reference_id: Uuid,
        branch_id: Uuid,
    },
    Undeleted {
        reference_id: Uuid,
    },
}

impl DomainEvent for ReferenceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReferenceEvent::Created { .. } => "Created",
            ReferenceEvent::LogicalDeleted { .. } => "LogicalDeleted",
            ReferenceEvent::PhysicalDeleted { .. } => "PhysicalDeleted",
            ReferenceEvent::Undeleted { .. } => "Undeleted",
        }
    }
}
