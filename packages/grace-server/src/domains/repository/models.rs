//! Repository read model and retention policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::RepositoryEvent;
use crate::domains::entity::EventSourced;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepositoryVisibility {
    #[default]
    Private,
    Public,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepositoryStatus {
    #[default]
    Active,
    Suspended,
}

/// Retention windows, in days.
///
/// Save and checkpoint references are auto-scheduled for physical
/// deletion at creation time + the matching window; every logical delete
/// schedules physical deletion at + `logical_delete_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub save_days: i64,
    pub checkpoint_days: i64,
    pub diff_cache_days: i64,
    pub directory_version_cache_days: i64,
    pub logical_delete_days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            save_days: 7,
            checkpoint_days: 365,
            diff_cache_days: 7,
            directory_version_cache_days: 7,
            logical_delete_days: 30,
        }
    }
}

/// Owned by an organization; owns a set of branches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryDto {
    pub repository_id: Uuid,
    pub owner_id: Uuid,
    pub organization_id: Uuid,
    pub repository_name: String,
    pub visibility: RepositoryVisibility,
    pub status: RepositoryStatus,
    pub default_server_api_version: String,
    pub record_saves: bool,
    pub retention: RetentionPolicy,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub delete_reason: String,
}

impl EventSourced for RepositoryDto {
    type Event = RepositoryEvent;

    fn apply(mut dto: Self, event: &RepositoryEvent) -> Self {
        match event {
            RepositoryEvent::Created {
                repository_id,
                owner_id,
                organization_id,
                repository_name,
                visibility,
                retention,
                created_at,
            } => {
                dto.repository_id = *repository_id;
                dto.owner_id = *owner_id;
                dto.organization_id = *organization_id;
                dto.repository_name = repository_name.clone();
                dto.visibility = *visibility;
                dto.retention = *retention;
                dto.record_saves = true;
                dto.created_at = Some(*created_at);
            }
            RepositoryEvent::NameSet {
                repository_name, ..
            } => dto.repository_name = repository_name.clone(),
            RepositoryEvent::VisibilitySet { visibility } => dto.visibility = *visibility,
            RepositoryEvent::StatusSet { status } => dto.status = *status,
            RepositoryEvent::RecordSavesSet { record_saves } => dto.record_saves = *record_saves,
            RepositoryEvent::DefaultServerApiVersionSet {
                default_server_api_version,
            } => dto.default_server_api_version = default_server_api_version.clone(),
            RepositoryEvent::SaveDaysSet { save_days } => dto.retention.save_days = *save_days,
            RepositoryEvent::CheckpointDaysSet { checkpoint_days } => {
                dto.retention.checkpoint_days = *checkpoint_days;
            }
            RepositoryEvent::DiffCacheDaysSet { diff_cache_days } => {
                dto.retention.diff_cache_days = *diff_cache_days;
            }
            RepositoryEvent::DirectoryVersionCacheDaysSet {
                directory_version_cache_days,
            } => {
                dto.retention.directory_version_cache_days = *directory_version_cache_days;
            }
            RepositoryEvent::LogicalDeleteDaysSet {
                logical_delete_days,
            } => {
                dto.retention.logical_delete_days = *logical_delete_days;
            }
            RepositoryEvent::DescriptionSet { description } => {
                dto.description = description.clone();
            }
            RepositoryEvent::LogicalDeleted {
                delete_reason,
                deleted_at,
            } => {
                dto.deleted_at = Some(*deleted_at);
                dto.delete_reason = delete_reason.clone();
            }
            RepositoryEvent::Undeleted => {
                dto.deleted_at = None;
                dto.delete_reason.clear();
            }
            RepositoryEvent::PhysicalDeleted { .. } => {}
        }
        dto
    }

    fn exists(&self) -> bool {
        !self.repository_id.is_nil()
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_overrides_fold_individually() {
        let dto = [
            RepositoryEvent::Created {
                repository_id: Uuid::new_v4(),
                owner_id: Uuid::new_v4(),
                organization_id: Uuid::new_v4(),
                repository_name: "demo".into(),
                visibility: RepositoryVisibility::Private,
                retention: RetentionPolicy::default(),
                created_at: Utc::now(),
            },
            RepositoryEvent::SaveDaysSet { save_days: 30 },
            RepositoryEvent::LogicalDeleteDaysSet {
                logical_delete_days: 14,
            },
        ]
        .iter()
        .fold(RepositoryDto::default(), |dto, event| {
            RepositoryDto::apply(dto, event)
        });

        assert_eq!(dto.retention.save_days, 30);
        assert_eq!(dto.retention.checkpoint_days, 365);
        assert_eq!(dto.retention.logical_delete_days, 14);
        assert!(dto.record_saves);
    }
}
