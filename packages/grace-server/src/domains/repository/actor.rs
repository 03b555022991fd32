//! Repository entity actor and its typed client.
//!
//! The repository is the retention authority: reference actors ask it
//! for the policy that schedules their physical deletion. Logical
//! deletion only marks the repository and arms its timer; the cascade to
//! children happens at physical-deletion time, when the handler
//! enumerates branches through the read model and sends each
//! `DeletePhysical` in turn. Physical deletion consults no other actor,
//! which keeps the cascade free of call cycles.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use futures::future::BoxFuture;
use grace_actors::{
    ActorContext, ActorHost, ActorHostError, EventMetadata, ManagedActor, ReminderEnvelope,
};
use tracing::warn;
use uuid::Uuid;

use super::commands::RepositoryCommand;
use super::events::RepositoryEvent;
use super::models::{RepositoryDto, RetentionPolicy};
use crate::context::ServerDeps;
use crate::domains::branch::actor::BranchClient;
use crate::domains::branch::commands::BranchCommand;
use crate::domains::deletion::{PhysicalDeletionPayload, PHYSICAL_DELETION};
use crate::domains::entity::{DomainEvent, EntityCore, EventSourced, GraceReturnValue};
use crate::errors::GraceError;

pub struct RepositoryActor {
    core: EntityCore<RepositoryDto>,
}

#[async_trait]
impl ManagedActor for RepositoryActor {
    type Deps = ServerDeps;
    const KIND: &'static str = "Repository";

    fn spawn(ctx: ActorContext<ServerDeps>) -> Self {
        Self {
            core: EntityCore::spawn(ctx),
        }
    }

    async fn activate(&mut self) -> Result<(), ActorHostError> {
        self.core.activate().await
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
                    warn!(%error, "physical deletion of repository failed");
                }
            }
        }
        Ok(())
    }
}

impl RepositoryActor {
    pub async fn handle(
        &mut self,
        command: RepositoryCommand,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        tracing::Span::current().record("correlation_id", metadata.correlation_id.as_str());
        self.core.guard_correlation(&metadata)?;
        let is_create = matches!(command, RepositoryCommand::Create { .. });
        self.core
            .guard_lifecycle(is_create, GraceError::RepositoryDoesNotExist)?;

        let event = match command {
            RepositoryCommand::Create {
                repository_id,
                owner_id,
                organization_id,
                repository_name,
                visibility,
                retention,
            } => RepositoryEvent::Created {
                repository_id,
                owner_id,
                organization_id,
                repository_name,
                visibility,
                retention,
                created_at: metadata.timestamp,
            },
            RepositoryCommand::SetName { repository_name } => RepositoryEvent::NameSet {
                repository_id: self.core.log.dto.repository_id,
                repository_name,
            },
            RepositoryCommand::SetVisibility { visibility } => {
                RepositoryEvent::VisibilitySet { visibility }
            }
            RepositoryCommand::SetStatus { status } => RepositoryEvent::StatusSet { status },
            RepositoryCommand::SetRecordSaves { record_saves } => {
                RepositoryEvent::RecordSavesSet { record_saves }
            }
            RepositoryCommand::SetDefaultServerApiVersion {
                default_server_api_version,
            } => RepositoryEvent::DefaultServerApiVersionSet {
                default_server_api_version,
            },
            RepositoryCommand::SetSaveDays { save_days } => {
                RepositoryEvent::SaveDaysSet { save_days }
            }
            RepositoryCommand::SetCheckpointDays { checkpoint_days } => {
                RepositoryEvent::CheckpointDaysSet { checkpoint_days }
            }
            RepositoryCommand::SetDiffCacheDays { diff_cache_days } => {
                RepositoryEvent::DiffCacheDaysSet { diff_cache_days }
            }
            RepositoryCommand::SetDirectoryVersionCacheDays {
                directory_version_cache_days,
            } => RepositoryEvent::DirectoryVersionCacheDaysSet {
                directory_version_cache_days,
            },
            RepositoryCommand::SetLogicalDeleteDays {
                logical_delete_days,
            } => RepositoryEvent::LogicalDeleteDaysSet {
                logical_delete_days,
            },
            RepositoryCommand::SetDescription { description } => {
                RepositoryEvent::DescriptionSet { description }
            }
            RepositoryCommand::DeleteLogical {
                delete_reason,
                force,
            } => {
                return self.delete_logical(delete_reason, force, metadata).await;
            }
            RepositoryCommand::DeletePhysical => {
                return self.delete_physical(metadata).await;
            }
            RepositoryCommand::Undelete => {
                if !self.core.is_deleted() {
                    return Err(GraceError::NotLogicallyDeleted);
                }
                self.core.cancel_physical_deletion();
                RepositoryEvent::Undeleted
            }
        };

        let event_type = event.event_type();
        self.core.commit(event, &metadata).await?;
        Ok(self.enriched(event_type, &metadata))
    }

    /// Mark deleted and arm the physical-deletion timer.
    ///
    /// Without `force`, a repository that still has branches is rejected;
    /// `force` lowers the guard and leaves the children to the cascade
    /// that runs when the timer fires.
    async fn delete_logical(
        &mut self,
        delete_reason: String,
        force: bool,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        if self.core.is_deleted() {
            return Err(GraceError::AlreadyDeleted);
        }
        let repository_id = self.core.log.dto.repository_id;
        let branches = self
            .core
            .ctx
            .deps()
            .branches
            .branches_for_repository(repository_id);
        if !branches.is_empty() && !force {
            return Err(GraceError::RepositoryIsNotEmpty);
        }

        let event = RepositoryEvent::LogicalDeleted {
            delete_reason: delete_reason.clone(),
            deleted_at: metadata.timestamp,
        };
        let event_type = event.event_type();
        self.core.commit(event, &metadata).await?;

        let dto = &self.core.log.dto;
        let payload = PhysicalDeletionPayload::new(delete_reason, &metadata.correlation_id)
            .with_owner(dto.owner_id)
            .with_organization(dto.organization_id)
            .with_repository(repository_id);
        self.core.schedule_physical_deletion(
            Duration::days(dto.retention.logical_delete_days),
            &payload,
        );

        Ok(self.enriched(event_type, &metadata))
    }

    async fn delete_physical(
        &mut self,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        let repository_id = self.core.log.dto.repository_id;
        self.physical_deletion_cascade(&metadata).await?;
        Ok(
            GraceReturnValue::new("PhysicalDeleted", &metadata.correlation_id)
                .with_property("RepositoryId", repository_id.to_string()),
        )
    }

    /// Send every branch `DeletePhysical`, then delete this repository's
    /// own event log. Cross-entity progress is best-effort; a branch
    /// failure is logged and the remaining children still proceed.
    async fn physical_deletion_cascade(
        &mut self,
        metadata: &EventMetadata,
    ) -> Result<(), GraceError> {
        let repository_id = self.core.log.dto.repository_id;
        let branches = self
            .core
            .ctx
            .deps()
            .branches
            .branches_for_repository(repository_id);
        let host = self.core.ctx.host()?;
        for branch in branches {
            let client = BranchClient::new(Arc::clone(&host), branch.branch_id);
            if let Err(error) = client
                .handle(BranchCommand::DeletePhysical, metadata.clone())
                .await
            {
                warn!(
                    branch_id = %branch.branch_id,
                    %error,
                    "cascading physical delete to branch failed"
                );
            }
        }
        self.core.cancel_physical_deletion();
        self.core
            .physically_delete(RepositoryEvent::PhysicalDeleted { repository_id }, metadata)
            .await
    }

    fn enriched(&self, event_type: &str, metadata: &EventMetadata) -> GraceReturnValue {
        let dto = &self.core.log.dto;
        GraceReturnValue::new(event_type, &metadata.correlation_id)
            .with_return_value(dto.repository_id.to_string())
            .with_property("OwnerId", dto.owner_id.to_string())
            .with_property("OrganizationId", dto.organization_id.to_string())
            .with_property("RepositoryId", dto.repository_id.to_string())
    }
}

/// Typed invocation handle for the repository actor.
#[derive(Clone)]
pub struct RepositoryClient {
    host: Arc<ActorHost<ServerDeps>>,
    id: Uuid,
}

impl RepositoryClient {
    pub fn new(host: Arc<ActorHost<ServerDeps>>, id: Uuid) -> Self {
        Self { host, id }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn handle(
        &self,
        command: RepositoryCommand,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        self.host
            .with_actor::<RepositoryActor, _>(&self.id.to_string(), move |actor| {
                Box::pin(actor.handle(command, metadata)) as BoxFuture<'_, _>
            })
            .await?
    }

    pub async fn exists(&self) -> Result<bool, GraceError> {
        Ok(self
            .host
            .with_actor::<RepositoryActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.exists() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn get(&self) -> Result<RepositoryDto, GraceError> {
        Ok(self
            .host
            .with_actor::<RepositoryActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.log.dto.clone() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn is_deleted(&self) -> Result<bool, GraceError> {
        Ok(self
            .host
            .with_actor::<RepositoryActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.is_deleted() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    /// Retention policy consulted by reference actors when scheduling
    /// their own physical deletion.
    pub async fn retention_policy(&self) -> Result<RetentionPolicy, GraceError> {
        let dto = self.get().await?;
        if !dto.exists() {
            return Err(GraceError::RepositoryDoesNotExist);
        }
        Ok(dto.retention)
    }
}
