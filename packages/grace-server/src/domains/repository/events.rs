use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{RepositoryStatus, RepositoryVisibility, RetentionPolicy};
use crate::domains::entity::DomainEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RepositoryEvent {
    Created {
        repository_id: Uuid,
        owner_id: Uuid,
        organization_id: Uuid,
        repository_name: String,
        visibility: RepositoryVisibility,
        retention: RetentionPolicy,
        created_at: DateTime<Utc>,
    },
    NameSet {
        repository_id: Uuid,
        repository_name: String,
    },
    VisibilitySet {
        visibility: RepositoryVisibility,
    },
    StatusSet {
        status: RepositoryStatus,
    },
    RecordSavesSet {
        record_saves: bool,
    },
    DefaultServerApiVersionSet {
        default_server_api_version: String,
    },
    SaveDaysSet {
        save_days: i64,
    },
    CheckpointDaysSet {
        checkpoint_days: i64,
    },
    DiffCacheDaysSet {
        diff_cache_days: i64,
    },
    DirectoryVersionCacheDaysSet {
        directory_version_cache_days: i64,
    },
    LogicalDeleteDaysSet {
        logical_delete_days: i64,
    },
    DescriptionSet {
        description: String,
    },
    LogicalDeleted {
        delete_reason: String,
        deleted_at: DateTime<Utc>,
    },
    PhysicalDeleted {
        repository_id: Uuid,
    },
    Undeleted,
}

impl DomainEvent for RepositoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RepositoryEvent::Created { .. } => "Created",
            RepositoryEvent::NameSet { .. } => "NameSet",
            RepositoryEvent::VisibilitySet { .. } => "VisibilitySet",
            RepositoryEvent::StatusSet { .. } => "StatusSet",
            RepositoryEvent::RecordSavesSet { .. } => "RecordSavesSet",
            RepositoryEvent::DefaultServerApiVersionSet { .. } => "DefaultServerApiVersionSet",
            RepositoryEvent::SaveDaysSet { .. } => "SaveDaysSet",
            RepositoryEvent::CheckpointDaysSet { .. } => "CheckpointDaysSet",
            RepositoryEvent::DiffCacheDaysSet { .. } => "DiffCacheDaysSet",
            RepositoryEvent::DirectoryVersionCacheDaysSet { .. } => {
                "DirectoryVersionCacheDaysSet"
            }
            RepositoryEvent::LogicalDeleteDaysSet { .. } => "LogicalDeleteDaysSet",
            RepositoryEvent::DescriptionSet { .. } => "DescriptionSet",
            RepositoryEvent::LogicalDeleted { .. } => "LogicalDeleted",
            RepositoryEvent::PhysicalDeleted { .. } => "PhysicalDeleted",
            RepositoryEvent::Undeleted => "Undeleted",
        }
    }
}
