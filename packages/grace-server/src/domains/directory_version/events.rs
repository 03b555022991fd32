use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::FileEntry;
use crate::domains::entity::DomainEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DirectoryVersionEvent {
    Created {
        directory_version_id: Uuid,
        repository_id: Uuid,
        sha256_hash: String,
        relative_path: String,
        files: Vec<FileEntry>,
        size: u64,
        directory_version_ids: Vec<Uuid>,
        created_at: DateTime<Utc>,
    },
    LogicalDeleted {
        delete_reason: String,
        deleted_at: DateTime<Utc>,
    },
    PhysicalDeleted {
        directory_version_id: Uuid,
    },
    Undeleted,
}

impl DomainEvent for DirectoryVersionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DirectoryVersionEvent::Created { .. } => "Created",
            DirectoryVersionEvent::LogicalDeleted { .. } => "LogicalDeleted",
            DirectoryVersionEvent::PhysicalDeleted { .. } => "PhysicalDeleted",
            DirectoryVersionEvent::Undeleted => "Undeleted",
        }
    }
}
