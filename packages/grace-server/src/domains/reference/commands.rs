use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::ReferenceType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReferenceCommand {
    Create {
        reference_id: Uuid,
        repository_id: Uuid,
        branch_id: Uuid,
        directory_version_id: Uuid,
        sha256_hash: String,
        reference_type: ReferenceType,
        reference_text: String,
    },
    DeleteLogical {
        delete_reason: String,
    },
    DeletePhysical,
    Undelete,
}
