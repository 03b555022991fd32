//! Branch read model.
//!
//! The `latest_*` pointers are maintained by in-memory pointer events
//! that are never persisted (the reference actor publishes the
//! authoritative event); activation re-derives them from the reference
//! read model. `based_on` persists through `Created` and `Rebased`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::BranchEvent;
use crate::domains::entity::EventSourced;

/// Which reference-producing operation a flag guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceFlag {
    Assign,
    Promotion,
    Commit,
    Checkpoint,
    Save,
    Tag,
    External,
    AutoRebase,
}

/// Per-reference-type enable switches. Everything starts enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEnabledFlags {
    pub assign: bool,
    pub promotion: bool,
    pub commit: bool,
    pub checkpoint: bool,
    pub save: bool,
    pub tag: bool,
    pub external: bool,
    pub auto_rebase: bool,
}

impl Default for ReferenceEnabledFlags {
    fn default() -> Self {
        Self {
            assign: true,
            promotion: true,
            commit: true,
            checkpoint: true,
            save: true,
            tag: true,
            external: true,
            auto_rebase: true,
        }
    }
}

impl ReferenceEnabledFlags {
    pub fn set(&mut self, flag: ReferenceFlag, enabled: bool) {
        match flag {
            ReferenceFlag::Assign => self.assign = enabled,
            ReferenceFlag::Promotion => self.promotion = enabled,
            ReferenceFlag::Commit => self.commit = enabled,
            ReferenceFlag::Checkpoint => self.checkpoint = enabled,
            ReferenceFlag::Save => self.save = enabled,
            ReferenceFlag::Tag => self.tag = enabled,
            ReferenceFlag::External => self.external = enabled,
            ReferenceFlag::AutoRebase => self.auto_rebase = enabled,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchDto {
    pub branch_id: Uuid,
    pub repository_id: Uuid,
    pub branch_name: String,
    pub parent_branch_id: Option<Uuid>,
    pub based_on: Option<Uuid>,
    pub latest_promotion: Option<Uuid>,
    pub latest_commit: Option<Uuid>,
    pub latest_checkpoint: Option<Uuid>,
    pub latest_save: Option<Uuid>,
    pub flags: ReferenceEnabledFlags,
    pub created_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub delete_reason: String,
}

impl EventSourced for BranchDto {
    type Event = BranchEvent;

    fn apply(mut dto: Self, event: &BranchEvent) -> Self {
        match event {
            BranchEvent::Created {
                branch_id,
                repository_id,
                branch_name,
                parent_branch_id,
                based_on,
                created_at,
            } => {
                dto.branch_id = *branch_id;
                dto.repository_id = *repository_id;
                dto.branch_name = branch_name.clone();
                dto.parent_branch_id = *parent_branch_id;
                dto.based_on = *based_on;
                dto.created_at = Some(*created_at);
            }
            BranchEvent::Rebased { reference_id } => dto.based_on = Some(*reference_id),
            BranchEvent::NameSet { branch_name, .. } => dto.branch_name = branch_name.clone(),
            BranchEvent::EnabledSet { flag, enabled } => dto.flags.set(*flag, *enabled),
            BranchEvent::Assigned { reference_id, .. } => dto.based_on = Some(*reference_id),
            BranchEvent::Promoted { reference_id, .. } => {
                dto.latest_promotion = Some(*reference_id);
                dto.based_on = Some(*reference_id);
            }
            BranchEvent::Committed { reference_id, .. } => {
                dto.latest_commit = Some(*reference_id);
            }
            BranchEvent::Checkpointed { reference_id, .. } => {
                dto.latest_checkpoint = Some(*reference_id);
            }
            BranchEvent::Saved { reference_id, .. } => dto.latest_save = Some(*reference_id),
            // Tags and external references maintain no pointer.
            BranchEvent::Tagged { .. } | BranchEvent::ExternalCreated { .. } => {}
            // No defined read-model effect; the event is recorded only.
            BranchEvent::ReferenceRemoved { .. } => {}
            BranchEvent::LogicalDeleted {
                delete_reason,
                deleted_at,
            } => {
                dto.deleted_at = Some(*deleted_at);
                dto.delete_reason = delete_reason.clone();
            }
            BranchEvent::Undeleted => {
                dto.deleted_at = None;
                dto.delete_reason.clear();
            }
            BranchEvent::PhysicalDeleted { .. } => {}
        }
        dto
    }

    fn exists(&self) -> bool {
        !self.branch_id.is_nil()
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(branch_id: Uuid) -> BranchEvent {
        BranchEvent::Created {
            branch_id,
            repository_id: Uuid::new_v4(),
            branch_name: "main".into(),
            parent_branch_id: None,
            based_on: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn promotion_moves_both_pointers() {
        let branch_id = Uuid::new_v4();
        let reference_id = Uuid::new_v4();

        let dto = BranchDto::apply(BranchDto::default(), &created(branch_id));
        let dto = BranchDto::apply(
            dto,
            &BranchEvent::Promoted {
                reference_id,
                directory_version_id: Uuid::new_v4(),
                sha256_hash: "00".repeat(32),
            },
        );

        assert_eq!(dto.latest_promotion, Some(reference_id));
        assert_eq!(dto.based_on, Some(reference_id));
    }

    #[test]
    fn rebase_only_moves_based_on() {
        let promotion_id = Uuid::new_v4();
        let save_id = Uuid::new_v4();

        let dto = BranchDto::apply(BranchDto::default(), &created(Uuid::new_v4()));
        let dto = BranchDto::apply(
            dto,
            &BranchEvent::Saved {
                reference_id: save_id,
                directory_version_id: Uuid::new_v4(),
                sha256_hash: "11".repeat(32),
            },
        );
        let dto = BranchDto::apply(
            dto,
            &BranchEvent::Rebased {
                reference_id: promotion_id,
            },
        );

        assert_eq!(dto.based_on, Some(promotion_id));
        assert_eq!(dto.latest_save, Some(save_id));
        assert_eq!(dto.latest_promotion, None);
    }

    #[test]
    fn flags_toggle_independently() {
        let mut flags = ReferenceEnabledFlags::default();
        assert!(flags.save);

        flags.set(ReferenceFlag::Save, false);
        assert!(!flags.save);
        assert!(flags.checkpoint);

        flags.set(ReferenceFlag::Save, true);
        assert!(flags.save);
    }

    #[test]
    fn remove_reference_has_no_read_model_effect() {
        let dto = BranchDto::apply(BranchDto::default(), &created(Uuid::new_v4()));
        let before = dto.clone();
        let after = BranchDto::apply(
            dto,
            &BranchEvent::ReferenceRemoved {
                reference_id: Uuid::new_v4(),
            },
        );
        assert_eq!(before, after);
    }
}
