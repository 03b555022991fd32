use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::ReferenceFlag;
use crate::domains::entity::DomainEvent;

/// Branch events.
///
/// The pointer-update variants (`Assigned` through `ExternalCreated`)
/// are applied in-memory only: the reference actor already published the
/// authoritative `ReferenceEvent`, and the branch re-derives its
/// `latest_*` pointers from the read model on activation. All other
/// variants are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BranchEvent {
    Created {
        branch_id: Uuid,
        repository_id: Uuid,
        branch_name: String,
        parent_branch_id: Option<Uuid>,
        based_on: Option<Uuid>,
        created_at: DateTime<Utc>,
    },
    Rebased {
        reference_id: Uuid,
    },
    NameSet {
        branch_id: Uuid,
        branch_name: String,
    },
    EnabledSet {
        flag: ReferenceFlag,
        enabled: bool,
    },
    Assigned {
        reference_id: Uuid,
        directory_version_id: Uuid,
        sha256_hash: String,
    },
    Promoted {
        reference_id: Uuid,
        directory_version_id: Uuid,
        sha256_hash: String,
    },
    Committed {
        reference_id: Uuid,
        directory_version_id: Uuid,
        sha256_hash: String,
    },
    Checkpointed {
        reference_id: Uuid,
        directory_version_id: Uuid,
        sha256_hash: String,
    },
    Saved {
        reference_id: Uuid,
        directory_version_id: Uuid,
        sha256_hash: String,
    },
    Tagged {
        reference_id: Uuid,
        directory_version_id: Uuid,
        sha256_hash: String,
    },
    ExternalCreated {
        reference_id: Uuid,
        directory_version_id: Uuid,
        sha256_hash: String,
    },
    ReferenceRemoved {
        reference_id: Uuid,
    },
    LogicalDeleted {
        delete_reason: String,
        deleted_at: DateTime<Utc>,
    },
    PhysicalDeleted {
        branch_id: Uuid,
        repository_id: Uuid,
    },
    Undeleted,
}

impl DomainEvent for BranchEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BranchEvent::Created { .. } => "Created",
            BranchEvent::Rebased { .. } => "Rebased",
            BranchEvent::NameSet { .. } => "NameSet",
            BranchEvent::EnabledSet { .. } => "EnabledSet",
            BranchEvent::Assigned { .. } => "Assigned",
            BranchEvent::Promoted { .. } => "Promoted",
            BranchEvent::Committed { .. } => "Committed",
            BranchEvent::Checkpointed { .. } => "Checkpointed",
            BranchEvent::Saved { .. } => "Saved",
            BranchEvent::Tagged { .. } => "Tagged",
            BranchEvent::ExternalCreated { .. } => "ExternalCreated",
            BranchEvent::ReferenceRemoved { .. } => "ReferenceRemoved",
            BranchEvent::LogicalDeleted { .. } => "LogicalDeleted",
            BranchEvent::PhysicalDeleted { .. } => "PhysicalDeleted",
            BranchEvent::Undeleted => "Undeleted",
        }
    }
}
