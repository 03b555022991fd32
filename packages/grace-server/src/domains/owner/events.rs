use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{OwnerType, SearchVisibility};
use crate::domains::entity::DomainEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OwnerEvent {
    Created {
        owner_id: Uuid,
        owner_name: String,
        owner_type: OwnerType,
        created_at: DateTime<Utc>,
    },
    NameSet {
        owner_name: String,
    },
    TypeSet {
        owner_type: OwnerType,
    },
    DescriptionSet {
        description: String,
    },
    SearchVisibilitySet {
        search_visibility: SearchVisibility,
    },
    LogicalDeleted {
        delete_reason: String,
        deleted_at: DateTime<Utc>,
    },
    PhysicalDeleted {
        owner_id: Uuid,
    },
    Undeleted,
}

impl DomainEvent for OwnerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OwnerEvent::Created { .. } => "Created",
            OwnerEvent::NameSet { .. } => "NameSet",
            OwnerEvent::TypeSet { .. } => "TypeSet",
            OwnerEvent::DescriptionSet { .. } => "DescriptionSet",
            OwnerEvent::SearchVisibilitySet { .. } => "SearchVisibilitySet",
            OwnerEvent::LogicalDeleted { .. } => "LogicalDeleted",
            OwnerEvent::PhysicalDeleted { .. } => "PhysicalDeleted",
            OwnerEvent::Undeleted => "Undeleted",
        }
    }
}
