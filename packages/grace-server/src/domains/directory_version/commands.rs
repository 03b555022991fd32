use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::FileEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DirectoryVersionCommand {
    Create {
        directory_version_id: Uuid,
        repository_id: Uuid,
        sha256_hash: String,
        relative_path: String,
        files: Vec<FileEntry>,
        size: u64,
        directory_version_ids: Vec<Uuid>,
    },
    DeleteLogical {
        delete_reason: String,
    },
    DeletePhysical,
    Undelete,
}
