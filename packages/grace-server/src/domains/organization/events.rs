use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::OrganizationType;
use crate::domains::entity::DomainEvent;
use crate::domains::owner::models::SearchVisibility;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrganizationEvent {
    Created {
        organization_id: Uuid,
        owner_id: Uuid,
        organization_name: String,
        organization_type: OrganizationType,
        created_at: DateTime<Utc>,
    },
    NameSet {
        organization_name: String,
    },
    TypeSet {
        organization_type: OrganizationType,
    },
    SearchVisibilitySet {
        search_visibility: SearchVisibility,
    },
    DescriptionSet {
        description: String,
    },
    LogicalDeleted {
        delete_reason: String,
        deleted_at: DateTime<Utc>,
    },
    PhysicalDeleted {
        organization_id: Uuid,
    },
    Undeleted,
}

impl DomainEvent for OrganizationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrganizationEvent::Created { .. } => "Created",
            OrganizationEvent::NameSet { .. } => "NameSet",
            OrganizationEvent::TypeSet { .. } => "TypeSet",
            OrganizationEvent::SearchVisibilitySet { .. } => "SearchVisibilitySet",
            OrganizationEvent::DescriptionSet { .. } => "DescriptionSet",
            OrganizationEvent::LogicalDeleted { .. } => "LogicalDeleted",
            OrganizationEvent::PhysicalDeleted { .. } => "PhysicalDeleted",
            OrganizationEvent::Undeleted => "Undeleted",
        }
    }
}
