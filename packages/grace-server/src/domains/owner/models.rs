//! Owner read model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::OwnerEvent;
use crate::domains::entity::EventSourced;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerType {
    #[default]
    User,
    Organization,
}

/// Whether the entity shows up in search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchVisibility {
    #[default]
    Visible,
    NotVisible,
}

/// The top of the hierarchy; owns a set of organizations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnerDto {
    pub owner_id: Uuid,
    pub owner_name: String,
    pub owner_type: OwnerType,
    pub description: String,
    pub search_visibility: SearchVisibility,
    pub created_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub delete_reason: String,
}

impl EventSourced for OwnerDto {
    type Event = OwnerEvent;

    fn apply(mut dto: Self, event: &OwnerEvent) -> Self {
        match event {
            OwnerEvent::Created {
                owner_id,
                owner_name,
                owner_type,
                created_at,
            } => {
                dto.owner_id = *owner_id;
                dto.owner_name = owner_name.clone();
                dto.owner_type = *owner_type;
                dto.created_at = Some(*created_at);
            }
            OwnerEvent::NameSet { owner_name } => dto.owner_name = owner_name.clone(),
            OwnerEvent::TypeSet { owner_type } => dto.owner_type = *owner_type,
            OwnerEvent::DescriptionSet { description } => dto.description = description.clone(),
            OwnerEvent::SearchVisibilitySet { search_visibility } => {
                dto.search_visibility = *search_visibility;
            }
            OwnerEvent::LogicalDeleted {
                delete_reason,
                deleted_at,
            } => {
                dto.deleted_at = Some(*deleted_at);
                dto.delete_reason = delete_reason.clone();
            }
            OwnerEvent::Undeleted => {
                dto.deleted_at = None;
                dto.delete_reason.clear();
            }
            // Physical deletion wipes the log; the fold never runs on it.
            OwnerEvent::PhysicalDeleted { .. } => {}
        }
        dto
    }

    fn exists(&self) -> bool {
        !self.owner_id.is_nil()
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_builds_dto_from_events() {
        let owner_id = Uuid::new_v4();
        let now = Utc::now();
        let events = vec![
            OwnerEvent::Created {
                owner_id,
                owner_name: "alice".into(),
                owner_type: OwnerType::User,
                created_at: now,
            },
            OwnerEvent::DescriptionSet {
                description: "primary".into(),
            },
            OwnerEvent::NameSet {
                owner_name: "alice-2".into(),
            },
        ];

        let dto = events
            .iter()
            .fold(OwnerDto::default(), |dto, event| OwnerDto::apply(dto, event));

        assert!(dto.exists());
        assert_eq!(dto.owner_name, "alice-2");
        assert_eq!(dto.description, "primary");
        assert_eq!(dto.created_at, Some(now));
    }

    #[test]
    fn rename_is_reversible() {
        let base = OwnerDto::apply(
            OwnerDto::default(),
            &OwnerEvent::Created {
                owner_id: Uuid::new_v4(),
                owner_name: "m".into(),
                owner_type: OwnerType::User,
                created_at: Utc::now(),
            },
        );
        let renamed = OwnerDto::apply(
            base,
            &OwnerEvent::NameSet {
                owner_name: "n".into(),
            },
        );
        assert_eq!(renamed.owner_name, "n");
    }

    #[test]
    fn undelete_clears_deletion_marks() {
        let dto = OwnerDto::apply(
            OwnerDto::default(),
            &OwnerEvent::LogicalDeleted {
                delete_reason: "retire".into(),
                deleted_at: Utc::now(),
            },
        );
        assert!(dto.deleted_at.is_some());

        let dto = OwnerDto::apply(dto, &OwnerEvent::Undeleted);
        assert!(dto.deleted_at.is_none());
        assert!(dto.delete_reason.is_empty());
    }
}
