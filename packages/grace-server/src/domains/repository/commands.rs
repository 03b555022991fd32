use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{RepositoryStatus, RepositoryVisibility, RetentionPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RepositoryCommand {
    Create {
        repository_id: Uuid,
        owner_id: Uuid,
        organization_id: Uuid,
        repository_name: String,
        visibility: RepositoryVisibility,
        retention: RetentionPolicy,
    },
    SetName {
        repository_name: String,
    },
    SetVisibility {
        visibility: RepositoryVisibility,
    },
    SetStatus {
        status: RepositoryStatus,
    },
    SetRecordSaves {
        record_saves: bool,
    },
    SetDefaultServerApiVersion {
        default_server_api_version: String,
    },
    SetSaveDays {
        save_days: i64,
    },
    SetCheckpointDays {
        checkpoint_days: i64,
    },
    SetDiffCacheDays {
        diff_cache_days: i64,
    },
    SetDirectoryVersionCacheDays {
        directory_version_cache_days: i64,
    },
    SetLogicalDeleteDays {
        logical_delete_days: i64,
    },
    SetDescription {
        description: String,
    },
    DeleteLogical {
        delete_reason: String,
        force: bool,
    },
    DeletePhysical,
    Undelete,
}
