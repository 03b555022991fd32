//! Read-model projections consulted by the core.
//!
//! These are deliberately thin: the branch actor re-derives its
//! `latest_*` pointers from here on activation, cascade deletion
//! enumerates children here, and name resolution finds branches here.
//! The in-memory implementation subscribes to the bus and denormalizes
//! branch and reference events; the stream is advisory, so the
//! projection is eventually consistent and never authoritative for
//! command guards that require exactness.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use grace_actors::MessageBus;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use uuid::Uuid;

use crate::domains::branch::events::BranchEvent;
use crate::domains::reference::events::ReferenceEvent;
use crate::domains::reference::models::ReferenceType;
use crate::events::{GraceEvent, GraceEventEnvelope};

/// Latest reference id per pointer-bearing type for one branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatestReferences {
    pub promotion: Option<Uuid>,
    pub commit: Option<Uuid>,
    pub checkpoint: Option<Uuid>,
    pub save: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow {
    pub reference_id: Uuid,
    pub branch_id: Uuid,
    pub reference_type: ReferenceType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRow {
    pub branch_id: Uuid,
    pub repository_id: Uuid,
    pub branch_name: String,
}

pub trait ReferenceReadModel: Send + Sync + 'static {
    fn latest_by_type(&self, branch_id: Uuid) -> LatestReferences;
    fn references_for_branch(&self, branch_id: Uuid) -> Vec<ReferenceRow>;
}

pub trait BranchReadModel: Send + Sync + 'static {
    fn branches_for_repository(&self, repository_id: Uuid) -> Vec<BranchRow>;
    fn branch_id_by_name(&self, repository_id: Uuid, branch_name: &str) -> Option<Uuid>;

    fn branch_name_taken(&self, repository_id: Uuid, branch_name: &str) -> bool {
        self.branch_id_by_name(repository_id, branch_name).is_some()
    }
}

/// Bus-fed projection of branches and references.
#[derive(Default)]
pub struct InMemoryReadModel {
    references: DashMap<Uuid, Vec<ReferenceRow>>,
    branches: DashMap<Uuid, Vec<BranchRow>>,
}

impl InMemoryReadModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Start consuming the bus; updates arrive asynchronously.
    pub fn attach(self: &Arc<Self>, bus: &MessageBus) {
        let model = Arc::clone(self);
        let mut receiver = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => {
                        if let Ok(envelope) =
                            serde_json::from_value::<GraceEventEnvelope>(message.body)
                        {
                            model.apply(envelope.event);
                        }
                    }
                    // The stream is advisory; lagging just drops updates.
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "read model lagged behind the bus");
                    }
                    Err(RecvError::Closed) => return,
                }
            }
        });
    }

    /// Test/replay entry point: apply one event synchronously.
    pub fn apply(&self, event: GraceEvent) {
        match event {
            GraceEvent::ReferenceEvent(ReferenceEvent::Created {
                reference_id,
                branch_id,
                reference_type,
                created_at,
                ..
            }) => {
                let mut rows = self.references.entry(branch_id).or_default();
                // At-least-once delivery: ignore replays.
                if rows.iter().all(|row| row.reference_id != reference_id) {
                    rows.push(ReferenceRow {
                        reference_id,
                        branch_id,
                        reference_type,
                        created_at,
                    });
                }
            }
            GraceEvent::ReferenceEvent(ReferenceEvent::PhysicalDeleted {
                reference_id,
                branch_id,
            }) => {
                if let Some(mut rows) = self.references.get_mut(&branch_id) {
                    rows.retain(|row| row.reference_id != reference_id);
                }
            }
            GraceEvent::BranchEvent(BranchEvent::Created {
                branch_id,
                repository_id,
                branch_name,
                ..
            }) => {
                let mut rows = self.branches.entry(repository_id).or_default();
                if rows.iter().all(|row| row.branch_id != branch_id) {
                    rows.push(BranchRow {
                        branch_id,
                        repository_id,
                        branch_name,
                    });
                }
            }
            GraceEvent::BranchEvent(BranchEvent::NameSet {
                branch_id,
                branch_name,
            }) => {
                for mut rows in self.branches.iter_mut() {
                    for row in rows.value_mut() {
                        if row.branch_id == branch_id {
                            row.branch_name = branch_name.clone();
                        }
                    }
                }
            }
            GraceEvent::BranchEvent(BranchEvent::PhysicalDeleted {
                branch_id,
                repository_id,
            }) => {
                if let Some(mut rows) = self.branches.get_mut(&repository_id) {
                    rows.retain(|row| row.branch_id != branch_id);
                }
            }
            _ => {}
        }
    }
}

impl ReferenceReadModel for InMemoryReadModel {
    fn latest_by_type(&self, branch_id: Uuid) -> LatestReferences {
        let mut latest = LatestReferences::default();
        let Some(rows) = self.references.get(&branch_id) else {
            return latest;
        };
        for row in rows.iter() {
            let slot = match row.reference_type {
                ReferenceType::Promotion => &mut latest.promotion,
                ReferenceType::Commit => &mut latest.commit,
                ReferenceType::Checkpoint => &mut latest.checkpoint,
                ReferenceType::Save => &mut latest.save,
                _ => continue,
            };
            let newer = rows
                .iter()
                .filter(|other| other.reference_type == row.reference_type)
                .max_by_key(|other| other.created_at);
            *slot = newer.map(|other| other.reference_id);
        }
        latest
    }

    fn references_for_branch(&self, branch_id: Uuid) -> Vec<ReferenceRow> {
        self.references
            .get(&branch_id)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

impl BranchReadModel for InMemoryReadModel {
    fn branches_for_repository(&self, repository_id: Uuid) -> Vec<BranchRow> {
        self.branches
            .get(&repository_id)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    fn branch_id_by_name(&self, repository_id: Uuid, branch_name: &str) -> Option<Uuid> {
        self.branches.get(&repository_id).and_then(|rows| {
            rows.iter()
                .find(|row| row.branch_name == branch_name)
                .map(|row| row.branch_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(branch_id: Uuid, reference_type: ReferenceType, at: DateTime<Utc>) -> GraceEvent {
        GraceEvent::ReferenceEvent(ReferenceEvent::Created {
            reference_id: Uuid::new_v4(),
            repository_id: Uuid::new_v4(),
            branch_id,
            directory_version_id: Uuid::new_v4(),
            sha256_hash: "00".repeat(32),
            reference_type,
            reference_text: String::new(),
            created_at: at,
        })
    }

    #[test]
    fn latest_tracks_newest_per_type() {
        let model = InMemoryReadModel::default();
        let branch_id = Uuid::new_v4();
        let now = Utc::now();

        model.apply(created(branch_id, ReferenceType::Save, now));
        model.apply(created(
            branch_id,
            ReferenceType::Save,
            now + chrono::Duration::seconds(10),
        ));
        model.apply(created(branch_id, ReferenceType::Commit, now));

        let rows = model.references_for_branch(branch_id);
        assert_eq!(rows.len(), 3);

        let latest = model.latest_by_type(branch_id);
        let newest_save = rows
            .iter()
            .filter(|row| row.reference_type == ReferenceType::Save)
            .max_by_key(|row| row.created_at)
            .map(|row| row.reference_id);
        assert_eq!(latest.save, newest_save);
        assert!(latest.commit.is_some());
        assert_eq!(latest.promotion, None);
    }

    #[test]
    fn physical_deletion_removes_rows() {
        let model = InMemoryReadModel::default();
        let branch_id = Uuid::new_v4();
        model.apply(created(branch_id, ReferenceType::Tag, Utc::now()));
        let reference_id = model.references_for_branch(branch_id)[0].reference_id;

        model.apply(GraceEvent::ReferenceEvent(ReferenceEvent::PhysicalDeleted {
            reference_id,
            branch_id,
        }));
        assert!(model.references_for_branch(branch_id).is_empty());
    }

    #[test]
    fn branch_rows_support_name_lookup_and_rename() {
        let model = InMemoryReadModel::default();
        let repository_id = Uuid::new_v4();
        let branch_id = Uuid::new_v4();

        model.apply(GraceEvent::BranchEvent(BranchEvent::Created {
            branch_id,
            repository_id,
            branch_name: "main".into(),
            parent_branch_id: None,
            based_on: None,
            created_at: Utc::now(),
        }));
        assert_eq!(model.branch_id_by_name(repository_id, "main"), Some(branch_id));
        assert!(model.branch_name_taken(repository_id, "main"));

        model.apply(GraceEvent::BranchEvent(BranchEvent::NameSet {
            branch_id,
            branch_name: "trunk".into(),
        }));
        assert_eq!(model.branch_id_by_name(repository_id, "main"), None);
        assert_eq!(model.branch_id_by_name(repository_id, "trunk"), Some(branch_id));
    }
}
