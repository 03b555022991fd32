//! Branch entity actor and its typed client.
//!
//! Reference-producing commands mint a fresh reference id, drive the
//! reference actor's `Create` first, and only on success apply the
//! branch's own pointer event - in memory, never persisted. Activation
//! therefore finishes by patching the `latest_*` pointers from the
//! reference read model; that reconciliation is load-bearing.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use futures::future::BoxFuture;
use grace_actors::{
    ActorContext, ActorHost, ActorHostError, EventMetadata, ManagedActor, ReminderEnvelope,
};
use tracing::warn;
use uuid::Uuid;

use super::commands::BranchCommand;
use super::events::BranchEvent;
use super::models::{BranchDto, ReferenceFlag};
use crate::context::ServerDeps;
use crate::domains::deletion::{PhysicalDeletionPayload, PHYSICAL_DELETION};
use crate::domains::entity::{DomainEvent, EntityCore, EventSourced, GraceReturnValue};
use crate::domains::reference::actor::ReferenceClient;
use crate::domains::reference::commands::ReferenceCommand;
use crate::domains::reference::models::ReferenceType;
use crate::domains::repository::actor::RepositoryClient;
use crate::errors::GraceError;

pub struct BranchActor {
    core: EntityCore<BranchDto>,
}

#[async_trait]
impl ManagedActor for BranchActor {
    type Deps = ServerDeps;
    const KIND: &'static str = "Branch";

    fn spawn(ctx: ActorContext<ServerDeps>) -> Self {
        Self {
            core: EntityCore::spawn(ctx),
        }
    }

    async fn activate(&mut self) -> Result<(), ActorHostError> {
        self.core.activate().await?;
        // Pointer events are not persisted; re-derive the latest
        // reference per type from the read model.
        if self.core.exists() {
            let latest = self
                .core
                .ctx
                .deps()
                .references
                .latest_by_type(self.core.log.dto.branch_id);
            let dto = &mut self.core.log.dto;
            dto.latest_promotion = latest.promotion;
            dto.latest_commit = latest.commit;
            dto.latest_checkpoint = latest.checkpoint;
            dto.latest_save = latest.save;
        }
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.core.disposed
    }

    async fn receive_reminder(
        &mut self,
        reminder: ReminderEnvelope,
    ) -> Result<(), ActorHostError> {
        if reminder.name == PHYSICAL_DELETION {
            let payload: PhysicalDeletionPayload =
                serde_json::from_value(reminder.payload).unwrap_or_default();
            let metadata = EventMetadata::new_at(payload.correlation_id, reminder.due_time);
            if self.core.exists() {
                if let Err(error) = self.physical_deletion_cascade(&metadata).await {
                    warn!(%error, "physical deletion of branch failed");
                }
            }
        }
        Ok(())
    }
}

impl BranchActor {
    pub async fn handle(
        &mut self,
        command: BranchCommand,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        tracing::Span::current().record("correlation_id", metadata.correlation_id.as_str());
        self.core.guard_correlation(&metadata)?;
        let is_create = matches!(command, BranchCommand::Create { .. });
        self.core
            .guard_lifecycle(is_create, GraceError::BranchDoesNotExist)?;

        match command {
            BranchCommand::Create {
                branch_id,
                repository_id,
                branch_name,
                parent_branch_id,
                based_on,
            } => {
                let event = BranchEvent::Created {
                    branch_id,
                    repository_id,
                    branch_name,
                    parent_branch_id,
                    based_on,
                    created_at: metadata.timestamp,
                };
                self.persisted(event, &metadata).await
            }
            BranchCommand::Rebase { reference_id } => self.rebase(reference_id, metadata).await,
            BranchCommand::SetName { branch_name } => {
                let event = BranchEvent::NameSet {
                    branch_id: self.core.log.dto.branch_id,
                    branch_name,
                };
                self.persisted(event, &metadata).await
            }
            BranchCommand::EnableReferenceType { flag, enabled } => {
                let event = BranchEvent::EnabledSet { flag, enabled };
                self.persisted(event, &metadata).await
            }
            BranchCommand::Assign {
                directory_version_id,
                sha256_hash,
                reference_text,
            } => {
                self.ensure_enabled(ReferenceFlag::Assign)?;
                // An assign is an explicit re-point of `based_on`,
                // recorded as a rebase-typed reference.
                let reference_id = self
                    .create_reference(
                        ReferenceType::Rebase,
                        directory_version_id,
                        &sha256_hash,
                        reference_text,
                        &metadata,
                    )
                    .await?;
                self.pointer(
                    BranchEvent::Assigned {
                        reference_id,
                        directory_version_id,
                        sha256_hash,
                    },
                    reference_id,
                    &metadata,
                )
            }
            BranchCommand::Promote {
                directory_version_id,
                sha256_hash,
                reference_text,
            } => {
                self.ensure_enabled(ReferenceFlag::Promotion)?;
                self.ensure_based_on_latest_parent_promotion().await?;
                let reference_id = self
                    .create_reference(
                        ReferenceType::Promotion,
                        directory_version_id,
                        &sha256_hash,
                        reference_text,
                        &metadata,
                    )
                    .await?;
                self.pointer(
                    BranchEvent::Promoted {
                        reference_id,
                        directory_version_id,
                        sha256_hash,
                    },
                    reference_id,
                    &metadata,
                )
            }
            BranchCommand::Commit {
                directory_version_id,
                sha256_hash,
                reference_text,
            } => {
                self.ensure_enabled(ReferenceFlag::Commit)?;
                let reference_id = self
                    .create_reference(
                        ReferenceType::Commit,
                        directory_version_id,
                        &sha256_hash,
                        reference_text,
                        &metadata,
                    )
                    .await?;
                self.pointer(
                    BranchEvent::Committed {
                        reference_id,
                        directory_version_id,
                        sha256_hash,
                    },
                    reference_id,
                    &metadata,
                )
            }
            BranchCommand::Checkpoint {
                directory_version_id,
                sha256_hash,
                reference_text,
            } => {
                self.ensure_enabled(ReferenceFlag::Checkpoint)?;
                let reference_id = self
                    .create_reference(
                        ReferenceType::Checkpoint,
                        directory_version_id,
                        &sha256_hash,
                        reference_text,
                        &metadata,
                    )
                    .await?;
                self.pointer(
                    BranchEvent::Checkpointed {
                        reference_id,
                        directory_version_id,
                        sha256_hash,
                    },
                    reference_id,
                    &metadata,
                )
            }
            BranchCommand::Save {
                directory_version_id,
                sha256_hash,
                reference_text,
            } => {
                self.ensure_enabled(ReferenceFlag::Save)?;
                let reference_id = self
                    .create_reference(
                        ReferenceType::Save,
                        directory_version_id,
                        &sha256_hash,
                        reference_text,
                        &metadata,
                    )
                    .await?;
                self.pointer(
                    BranchEvent::Saved {
                        reference_id,
                        directory_version_id,
                        sha256_hash,
                    },
                    reference_id,
                    &metadata,
                )
            }
            BranchCommand::Tag {
                directory_version_id,
                sha256_hash,
                reference_text,
            } => {
                self.ensure_enabled(ReferenceFlag::Tag)?;
                let reference_id = self
                    .create_reference(
                        ReferenceType::Tag,
                        directory_version_id,
                        &sha256_hash,
                        reference_text,
                        &metadata,
                    )
                    .await?;
                self.pointer(
                    BranchEvent::Tagged {
                        reference_id,
                        directory_version_id,
                        sha256_hash,
                    },
                    reference_id,
                    &metadata,
                )
            }
            BranchCommand::CreateExternal {
                directory_version_id,
                sha256_hash,
                reference_text,
            } => {
                self.ensure_enabled(ReferenceFlag::External)?;
                let reference_id = self
                    .create_reference(
                        ReferenceType::External,
                        directory_version_id,
                        &sha256_hash,
                        reference_text,
                        &metadata,
                    )
                    .await?;
                self.pointer(
                    BranchEvent::ExternalCreated {
                        reference_id,
                        directory_version_id,
                        sha256_hash,
                    },
                    reference_id,
                    &metadata,
                )
            }
            BranchCommand::RemoveReference { reference_id } => {
                let event = BranchEvent::ReferenceRemoved { reference_id };
                self.persisted(event, &metadata).await
            }
            BranchCommand::DeleteLogical {
                delete_reason,
                force,
            } => self.delete_logical(delete_reason, force, metadata).await,
            BranchCommand::DeletePhysical => {
                let branch_id = self.core.log.dto.branch_id;
                self.physical_deletion_cascade(&metadata).await?;
                Ok(
                    GraceReturnValue::new("PhysicalDeleted", &metadata.correlation_id)
                        .with_property("BranchId", branch_id.to_string()),
                )
            }
            BranchCommand::Undelete => {
                if !self.core.is_deleted() {
                    return Err(GraceError::NotLogicallyDeleted);
                }
                self.core.cancel_physical_deletion();
                self.persisted(BranchEvent::Undeleted, &metadata).await
            }
        }
    }

    /// Create a rebase-typed reference copying the promotion's snapshot
    /// and persist the `Rebased` event; `based_on` becomes the
    /// promotion's id while the `latest_*` pointers stay untouched.
    async fn rebase(
        &mut self,
        reference_id: Uuid,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        let host = self.core.ctx.host()?;
        let promotion = ReferenceClient::new(host, reference_id).get().await?;
        if !promotion.exists() {
            return Err(GraceError::ReferenceDoesNotExist);
        }

        let rebase_reference_id = self
            .create_reference(
                ReferenceType::Rebase,
                promotion.directory_version_id,
                &promotion.sha256_hash,
                promotion.reference_text.clone(),
                &metadata,
            )
            .await?;

        let event = BranchEvent::Rebased { reference_id };
        let event_type = event.event_type();
        self.core.commit(event, &metadata).await?;
        Ok(self
            .enriched(event_type, &metadata)
            .with_return_value(rebase_reference_id.to_string())
            .with_property("ReferenceId", rebase_reference_id.to_string())
            .with_property("BasedOn", reference_id.to_string()))
    }

    async fn delete_logical(
        &mut self,
        delete_reason: String,
        force: bool,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        if self.core.is_deleted() {
            return Err(GraceError::AlreadyDeleted);
        }
        let dto = self.core.log.dto.clone();
        let references = self
            .core
            .ctx
            .deps()
            .references
            .references_for_branch(dto.branch_id);
        if !references.is_empty() && !force {
            return Err(GraceError::BranchIsNotEmpty);
        }

        let event = BranchEvent::LogicalDeleted {
            delete_reason: delete_reason.clone(),
            deleted_at: metadata.timestamp,
        };
        let event_type = event.event_type();
        self.core.commit(event, &metadata).await?;

        let host = self.core.ctx.host()?;
        let retention = RepositoryClient::new(host, dto.repository_id)
            .retention_policy()
            .await?;
        let payload = PhysicalDeletionPayload::new(delete_reason, &metadata.correlation_id)
            .with_repository(dto.repository_id)
            .with_branch(dto.branch_id);
        self.core
            .schedule_physical_deletion(Duration::days(retention.logical_delete_days), &payload);

        Ok(self.enriched(event_type, &metadata))
    }

    /// Send every reference `DeletePhysical`, then delete this branch's
    /// own event log. A branch is physically deleted only together with
    /// its references.
    async fn physical_deletion_cascade(
        &mut self,
        metadata: &EventMetadata,
    ) -> Result<(), GraceError> {
        let dto = self.core.log.dto.clone();
        let references = self
            .core
            .ctx
            .deps()
            .references
            .references_for_branch(dto.branch_id);
        let host = self.core.ctx.host()?;
        for reference in references {
            let client = ReferenceClient::new(Arc::clone(&host), reference.reference_id);
            if let Err(error) = client
                .handle(ReferenceCommand::DeletePhysical, metadata.clone())
                .await
            {
                warn!(
                    reference_id = %reference.reference_id,
                    %error,
                    "cascading physical delete to reference failed"
                );
            }
        }
        self.core.cancel_physical_deletion();
        self.core
            .physically_delete(
                BranchEvent::PhysicalDeleted {
                    branch_id: dto.branch_id,
                    repository_id: dto.repository_id,
                },
                metadata,
            )
            .await
    }

    /// Mint a reference id and drive the reference actor's Create.
    async fn create_reference(
        &mut self,
        reference_type: ReferenceType,
        directory_version_id: Uuid,
        sha256_hash: &str,
        reference_text: String,
        metadata: &EventMetadata,
    ) -> Result<Uuid, GraceError> {
        let dto = &self.core.log.dto;
        let reference_id = Uuid::new_v4();
        let command = ReferenceCommand::Create {
            reference_id,
            repository_id: dto.repository_id,
            branch_id: dto.branch_id,
            directory_version_id,
            sha256_hash: sha256_hash.to_string(),
            reference_type,
            reference_text,
        };
        let host = self.core.ctx.host()?;
        ReferenceClient::new(host, reference_id)
            .handle(command, metadata.clone())
            .await?;
        Ok(reference_id)
    }

    /// Apply an in-memory pointer event and shape the reply. The event
    /// is neither persisted nor republished; the reference actor already
    /// published the authoritative one.
    fn pointer(
        &mut self,
        event: BranchEvent,
        reference_id: Uuid,
        metadata: &EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        let event_type = event.event_type();
        self.core.log.fold_only(&event);
        Ok(self
            .enriched(event_type, metadata)
            .with_return_value(reference_id.to_string())
            .with_property("ReferenceId", reference_id.to_string()))
    }

    async fn persisted(
        &mut self,
        event: BranchEvent,
        metadata: &EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        let event_type = event.event_type();
        self.core.commit(event, metadata).await?;
        Ok(self.enriched(event_type, metadata))
    }

    fn ensure_enabled(&self, flag: ReferenceFlag) -> Result<(), GraceError> {
        let flags = &self.core.log.dto.flags;
        let (enabled, error) = match flag {
            ReferenceFlag::Assign => (flags.assign, GraceError::AssignIsDisabled),
            ReferenceFlag::Promotion => (flags.promotion, GraceError::PromotionIsDisabled),
            ReferenceFlag::Commit => (flags.commit, GraceError::CommitIsDisabled),
            ReferenceFlag::Checkpoint => (flags.checkpoint, GraceError::CheckpointIsDisabled),
            ReferenceFlag::Save => (flags.save, GraceError::SaveIsDisabled),
            ReferenceFlag::Tag => (flags.tag, GraceError::TagIsDisabled),
            ReferenceFlag::External => (flags.external, GraceError::ExternalIsDisabled),
            ReferenceFlag::AutoRebase => (flags.auto_rebase, GraceError::AutoRebaseIsDisabled),
        };
        if enabled {
            Ok(())
        } else {
            Err(error)
        }
    }

    /// A promotion from a child branch requires the child to be based on
    /// the parent's latest promotion. Root branches promote freely.
    async fn ensure_based_on_latest_parent_promotion(&self) -> Result<(), GraceError> {
        let dto = &self.core.log.dto;
        let Some(parent_branch_id) = dto.parent_branch_id else {
            return Ok(());
        };
        if parent_branch_id == dto.branch_id {
            return Ok(());
        }
        let host = self.core.ctx.host()?;
        let parent = BranchClient::new(host, parent_branch_id).get().await?;
        if !parent.exists() {
            return Err(GraceError::ParentBranchDoesNotExist);
        }
        if let Some(expected) = parent.latest_promotion {
            if dto.based_on != Some(expected) {
                return Err(GraceError::BranchNotBasedOnLatestPromotion);
            }
        }
        Ok(())
    }

    fn enriched(&self, event_type: &str, metadata: &EventMetadata) -> GraceReturnValue {
        let dto = &self.core.log.dto;
        GraceReturnValue::new(event_type, &metadata.correlation_id)
            .with_property("RepositoryId", dto.repository_id.to_string())
            .with_property("BranchId", dto.branch_id.to_string())
    }
}

/// Typed invocation handle for the branch actor.
#[derive(Clone)]
pub struct BranchClient {
    host: Arc<ActorHost<ServerDeps>>,
    id: Uuid,
}

impl BranchClient {
    pub fn new(host: Arc<ActorHost<ServerDeps>>, id: Uuid) -> Self {
        Self { host, id }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn handle(
        &self,
        command: BranchCommand,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        self.host
            .with_actor::<BranchActor, _>(&self.id.to_string(), move |actor| {
                Box::pin(actor.handle(command, metadata)) as BoxFuture<'_, _>
            })
            .await?
    }

    pub async fn exists(&self) -> Result<bool, GraceError> {
        Ok(self
            .host
            .with_actor::<BranchActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.exists() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn get(&self) -> Result<BranchDto, GraceError> {
        Ok(self
            .host
            .with_actor::<BranchActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.log.dto.clone() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn is_deleted(&self) -> Result<bool, GraceError> {
        Ok(self
            .host
            .with_actor::<BranchActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.is_deleted() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn get_parent_branch(&self) -> Result<Option<Uuid>, GraceError> {
        Ok(self
            .host
            .with_actor::<BranchActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.log.dto.parent_branch_id }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn get_latest_promotion(&self) -> Result<Option<Uuid>, GraceError> {
        Ok(self
            .host
            .with_actor::<BranchActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.log.dto.latest_promotion }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn get_latest_commit(&self) -> Result<Option<Uuid>, GraceError> {
        Ok(self
            .host
            .with_actor::<BranchActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.log.dto.latest_commit }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn get_latest_checkpoint(&self) -> Result<Option<Uuid>, GraceError> {
        Ok(self
            .host
            .with_actor::<BranchActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.log.dto.latest_checkpoint }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn get_latest_save(&self) -> Result<Option<Uuid>, GraceError> {
        Ok(self
            .host
            .with_actor::<BranchActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.log.dto.latest_save }) as BoxFuture<'_, _>
            })
            .await?)
    }
}
