use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::OrganizationType;
use crate::domains::owner::models::SearchVisibility;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrganizationCommand {
    Create {
        organization_id: Uuid,
        owner_id: Uuid,
        organization_name: String,
        organization_type: OrganizationType,
    },
    SetName {
        organization_name: String,
    },
    SetType {
        organization_type: OrganizationType,
    },
    SetSearchVisibility {
        search_visibility: SearchVisibility,
    },
    SetDescription {
        description: String,
    },
    DeleteLogical {
        delete_reason: String,
    },
    DeletePhysical,
    Undelete,
}
