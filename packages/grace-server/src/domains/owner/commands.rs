use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{OwnerType, SearchVisibility};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OwnerCommand {
    Create {
        owner_id: Uuid,
        owner_name: String,
        owner_type: OwnerType,
    },
    SetName {
        owner_name: String,
    },
    SetType {
        owner_type: OwnerType,
    },
    SetDescription {
        description: String,
    },
    SetSearchVisibility {
        search_visibility: SearchVisibility,
    },
    DeleteLogical {
        delete_reason: String,
    },
    DeletePhysical,
    Undelete,
}
