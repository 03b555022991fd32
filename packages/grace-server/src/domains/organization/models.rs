//! Organization read model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::OrganizationEvent;
use crate::domains::entity::EventSourced;
use crate::domains::owner::models::SearchVisibility;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrganizationType {
    #[default]
    Public,
    Private,
}

/// Owned by an owner; owns a set of repositories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationDto {
    pub organization_id: Uuid,
    pub owner_id: Uuid,
    pub organization_name: String,
    pub organization_type: OrganizationType,
    pub search_visibility: SearchVisibility,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub delete_reason: String,
}

impl EventSourced for OrganizationDto {
    type Event = OrganizationEvent;

    fn apply(mut dto: Self, event: &OrganizationEvent) -> Self {
        match event {
            OrganizationEvent::Created {
                organization_id,
                owner_id,
                organization_name,
                organization_type,
                created_at,
            } => {
                dto.organization_id = *organization_id;
                dto.owner_id = *owner_id;
                dto.organization_name = organization_name.clone();
                dto.organization_type = *organization_type;
                dto.created_at = Some(*created_at);
            }
            OrganizationEvent::NameSet { organization_name } => {
                dto.organization_name = organization_name.clone();
            }
            OrganizationEvent::TypeSet { organization_type } => {
                dto.organization_type = *organization_type;
            }
            OrganizationEvent::SearchVisibilitySet { search_visibility } => {
                dto.search_visibility = *search_visibility;
            }
            OrganizationEvent::DescriptionSet { description } => {
                dto.description = description.clone();
            }
            OrganizationEvent::LogicalDeleted {
                delete_reason,
                deleted_at,
            } => {
                dto.deleted_at = Some(*deleted_at);
                dto.delete_reason = delete_reason.clone();
            }
            OrganizationEvent::Undeleted => {
                dto.deleted_at = None;
                dto.delete_reason.clear();
            }
            OrganizationEvent::PhysicalDeleted { .. } => {}
        }
        dto
    }

    fn exists(&self) -> bool {
        !self.organization_id.is_nil()
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_then_renamed() {
        let organization_id = Uuid::new_v4();
        let owner_id = Uuid::new_v4();
        let dto = [
            OrganizationEvent::Created {
                organization_id,
                owner_id,
                organization_name: "eng".into(),
                organization_type: OrganizationType::Private,
                created_at: Utc::now(),
            },
            OrganizationEvent::NameSet {
                organization_name: "engineering".into(),
            },
        ]
        .iter()
        .fold(OrganizationDto::default(), |dto, event| {
            OrganizationDto::apply(dto, event)
        });

        assert!(dto.exists());
        assert_eq!(dto.owner_id, owner_id);
        assert_eq!(dto.organization_name, "engineering");
        assert_eq!(dto.organization_type, OrganizationType::Private);
    }
}
