use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::ReferenceFlag;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BranchCommand {
    Create {
        branch_id: Uuid,
        repository_id: Uuid,
        branch_name: String,
        parent_branch_id: Option<Uuid>,
        based_on: Option<Uuid>,
    },
    /// Re-base onto a promotion reference of the parent branch.
    Rebase {
        reference_id: Uuid,
    },
    SetName {
        branch_name: String,
    },
    EnableReferenceType {
        flag: ReferenceFlag,
        enabled: bool,
    },
    Assign {
        directory_version_id: Uuid,
        sha256_hash: String,
        reference_text: String,
    },
    Promote {
        directory_version_id: Uuid,
        sha256_hash: String,
        reference_text: String,
    },
    Commit {
        directory_version_id: Uuid,
        sha256_hash: String,
        reference_text: String,
    },
    Checkpoint {
        directory_version_id: Uuid,
        sha256_hash: String,
        reference_text: String,
    },
    Save {
        directory_version_id: Uuid,
        sha256_hash: String,
        reference_text: String,
    },
    Tag {
        directory_version_id: Uuid,
        sha256_hash: String,
        reference_text: String,
    },
    CreateExternal {
        directory_version_id: Uuid,
        sha256_hash: String,
        reference_text: String,
    },
    RemoveReference {
        reference_id: Uuid,
    },
    DeleteLogical {
        delete_reason: String,
        force: bool,
    },
    DeletePhysical,
    Undelete,
}
