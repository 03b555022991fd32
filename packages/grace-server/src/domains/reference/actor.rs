//! Reference entity actor and its typed client.
//!
//! Save and checkpoint references schedule their own physical deletion
//! at creation, using the owning repository's retention policy. A
//! logical delete schedules it at `logical_delete_days`. The reminder
//! handler removes the persisted event log, resets in-memory state and
//! marks the actor disposed, so the next activation sees the default dto.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use futures::future::BoxFuture;
use grace_actors::{
    ActorContext, ActorHost, ActorHostError, EventMetadata, ManagedActor, ReminderEnvelope,
};
use tracing::warn;
use uuid::Uuid;

use super::commands::ReferenceCommand;
use super::events::ReferenceEvent;
use super::models::{ReferenceDto, ReferenceType};
use crate::context::ServerDeps;
use crate::domains::deletion::{PhysicalDeletionPayload, PHYSICAL_DELETION};
use crate::domains::entity::{DomainEvent, EntityCore, GraceReturnValue};
use crate::domains::repository::actor::RepositoryClient;
use crate::errors::GraceError;

pub struct ReferenceActor {
    core: EntityCore<ReferenceDto>,
}

#[async_trait]
impl ManagedActor for ReferenceActor {
    type Deps = ServerDeps;
    const KIND: &'static str = "Reference";

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
            let dto = &self.core.log.dto;
            let event = ReferenceEvent::PhysicalDeleted {
                reference_id: dto.reference_id,
                branch_id: dto.branch_id,
            };
            if self.core.exists() {
                if let Err(error) = self.core.physically_delete(event, &metadata).await {
                    warn!(%error, "physical deletion of reference failed");
                }
            }
        }
        Ok(())
    }
}

impl ReferenceActor {
    pub async fn handle(
        &mut self,
        command: ReferenceCommand,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        tracing::Span::current().record("correlation_id", metadata.correlation_id.as_str());
        self.core.guard_correlation(&metadata)?;
        let is_create = matches!(command, ReferenceCommand::Create { .. });
        self.core
            .guard_lifecycle(is_create, GraceError::ReferenceDoesNotExist)?;

        match command {
            ReferenceCommand::Create {
                reference_id,
                repository_id,
                branch_id,
                directory_version_id,
                sha256_hash,
                reference_type,
                reference_text,
            } => {
                let event = ReferenceEvent::Created {
                    reference_id,
                    repository_id,
                    branch_id,
                    directory_version_id,
                    sha256_hash,
                    reference_type,
                    reference_text,
                    created_at: metadata.timestamp,
                };
                let event_type = event.event_type();
                self.core.commit(event, &metadata).await?;

                // Saves and checkpoints expire by retention policy.
                let retention_days = match reference_type {
                    ReferenceType::Save => Some(self.retention(repository_id).await?.save_days),
                    ReferenceType::Checkpoint => {
                        Some(self.retention(repository_id).await?.checkpoint_days)
                    }
                    _ => None,
                };
                if let Some(days) = retention_days {
                    let payload = PhysicalDeletionPayload::new(
                        "retention expired",
                        &metadata.correlation_id,
                    )
                    .with_repository(repository_id)
                    .with_branch(branch_id);
                    self.core
                        .schedule_physical_deletion(Duration::days(days), &payload);
                }

                Ok(self.enriched(event_type, &metadata))
            }
            ReferenceCommand::DeleteLogical { delete_reason } => {
                self.delete_logical(delete_reason, metadata).await
            }
            ReferenceCommand::DeletePhysical => self.delete_physical(metadata).await,
            ReferenceCommand::Undelete => {
                if !self.core.is_deleted() {
                    return Err(GraceError::NotLogicallyDeleted);
                }
                self.core.cancel_physical_deletion();
                let event = ReferenceEvent::Undeleted {
                    reference_id: self.core.log.dto.reference_id,
                };
                let event_type = event.event_type();
                self.core.commit(event, &metadata).await?;
                Ok(self.enriched(event_type, &metadata))
            }
        }
    }

    async fn delete_logical(
        &mut self,
        delete_reason: String,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        if self.core.is_deleted() {
            return Err(GraceError::AlreadyDeleted);
        }
        let dto = self.core.log.dto.clone();
        let event = ReferenceEvent::LogicalDeleted {
            reference_id: dto.reference_id,
            branch_id: dto.branch_id,
            delete_reason: delete_reason.clone(),
            deleted_at: metadata.timestamp,
        };
        let event_type = event.event_type();
        self.core.commit(event, &metadata).await?;

        let retention = self.retention(dto.repository_id).await?;
        let payload = PhysicalDeletionPayload::new(delete_reason, &metadata.correlation_id)
            .with_repository(dto.repository_id)
            .with_branch(dto.branch_id);
        self.core
            .schedule_physical_deletion(Duration::days(retention.logical_delete_days), &payload);

        Ok(self.enriched(event_type, &metadata))
    }

    async fn delete_physical(
        &mut self,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        let dto = &self.core.log.dto;
        let reference_id = dto.reference_id;
        let event = ReferenceEvent::PhysicalDeleted {
            reference_id,
            branch_id: dto.branch_id,
        };
        self.core.cancel_physical_deletion();
        self.core.physically_delete(event, &metadata).await?;
        Ok(
            GraceReturnValue::new("PhysicalDeleted", &metadata.correlation_id)
                .with_property("ReferenceId", reference_id.to_string()),
        )
    }

    async fn retention(
        &self,
        repository_id: Uuid,
    ) -> Result<crate::domains::repository::models::RetentionPolicy, GraceError> {
        let host = self.core.ctx.host()?;
        RepositoryClient::new(host, repository_id)
            .retention_policy()
            .await
    }

    fn enriched(&self, event_type: &str, metadata: &EventMetadata) -> GraceReturnValue {
        let dto = &self.core.log.dto;
        GraceReturnValue::new(event_type, &metadata.correlation_id)
            .with_return_value(dto.reference_id.to_string())
            .with_property("RepositoryId", dto.repository_id.to_string())
            .with_property("BranchId", dto.branch_id.to_string())
            .with_property("ReferenceId", dto.reference_id.to_string())
    }
}

/// Typed invocation handle for the reference actor.
#[derive(Clone)]
pub struct ReferenceClient {
    host: Arc<ActorHost<ServerDeps>>,
    id: Uuid,
}

impl ReferenceClient {
    pub fn new(host: Arc<ActorHost<ServerDeps>>, id: Uuid) -> Self {
        Self { host, id }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn handle(
        &self,
        command: ReferenceCommand,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        self.host
            .with_actor::<ReferenceActor, _>(&self.id.to_string(), move |actor| {
                Box::pin(actor.handle(command, metadata)) as BoxFuture<'_, _>
            })
            .await?
    }

    pub async fn exists(&self) -> Result<bool, GraceError> {
        Ok(self
            .host
            .with_actor::<ReferenceActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.exists() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn get(&self) -> Result<ReferenceDto, GraceError> {
        Ok(self
            .host
            .with_actor::<ReferenceActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.log.dto.clone() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn is_deleted(&self) -> Result<bool, GraceError> {
        Ok(self
            .host
            .with_actor::<ReferenceActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.is_deleted() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn get_reference_type(&self) -> Result<ReferenceType, GraceError> {
        Ok(self
            .host
            .with_actor::<ReferenceActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.log.dto.reference_type }) as BoxFuture<'_, _>
            })
            .await?)
    }
}
