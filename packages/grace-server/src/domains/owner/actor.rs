//! Owner entity actor and its typed client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use futures::future::BoxFuture;
use grace_actors::{
    ActorContext, ActorHost, ActorHostError, EventMetadata, ManagedActor, ReminderEnvelope,
};
use tracing::warn;
use uuid::Uuid;

use super::commands::OwnerCommand;
use super::events::OwnerEvent;
use super::models::OwnerDto;
use crate::context::ServerDeps;
use crate::domains::deletion::{PhysicalDeletionPayload, PHYSICAL_DELETION};
use crate::domains::entity::{DomainEvent, EntityCore, GraceReturnValue};
use crate::errors::GraceError;

pub struct OwnerActor {
    core: EntityCore<OwnerDto>,
}

#[async_trait]
impl ManagedActor for OwnerActor {
    type Deps = ServerDeps;
    const KIND: &'static str = "Owner";

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
            let owner_id = self.core.log.dto.owner_id;
            if self.core.exists() {
                if let Err(error) = self
                    .core
                    .physically_delete(OwnerEvent::PhysicalDeleted { owner_id }, &metadata)
                    .await
                {
                    warn!(%owner_id, %error, "physical deletion of owner failed");
                }
            }
        }
        Ok(())
    }
}

impl OwnerActor {
    pub async fn handle(
        &mut self,
        command: OwnerCommand,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        tracing::Span::current().record("correlation_id", metadata.correlation_id.as_str());
        self.core.guard_correlation(&metadata)?;
        let is_create = matches!(command, OwnerCommand::Create { .. });
        self.core.guard_lifecycle(is_create, GraceError::OwnerDoesNotExist)?;

        let event = match command {
            OwnerCommand::Create {
                owner_id,
                owner_name,
                owner_type,
            } => OwnerEvent::Created {
                owner_id,
                owner_name,
                owner_type,
                created_at: metadata.timestamp,
            },
            OwnerCommand::SetName { owner_name } => OwnerEvent::NameSet { owner_name },
            OwnerCommand::SetType { owner_type } => OwnerEvent::TypeSet { owner_type },
            OwnerCommand::SetDescription { description } => {
                OwnerEvent::DescriptionSet { description }
            }
            OwnerCommand::SetSearchVisibility { search_visibility } => {
                OwnerEvent::SearchVisibilitySet { search_visibility }
            }
            OwnerCommand::DeleteLogical { delete_reason } => {
                return self.delete_logical(delete_reason, metadata).await;
            }
            OwnerCommand::DeletePhysical => {
                return self.delete_physical(metadata).await;
            }
            OwnerCommand::Undelete => {
                if !self.core.is_deleted() {
                    return Err(GraceError::NotLogicallyDeleted);
                }
                self.core.cancel_physical_deletion();
                OwnerEvent::Undeleted
            }
        };

        let event_type = event.event_type();
        self.core.commit(event, &metadata).await?;
        Ok(self.enriched(event_type, &metadata))
    }

    async fn delete_logical(
        &mut self,
        delete_reason: String,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        if self.core.is_deleted() {
            return Err(GraceError::AlreadyDeleted);
        }
        let event = OwnerEvent::LogicalDeleted {
            delete_reason: delete_reason.clone(),
            deleted_at: metadata.timestamp,
        };
        let event_type = event.event_type();
        self.core.commit(event, &metadata).await?;

        let payload = PhysicalDeletionPayload::new(delete_reason, &metadata.correlation_id)
            .with_owner(self.core.log.dto.owner_id);
        self.core.schedule_physical_deletion(
            Duration::days(self.core.ctx.deps().config.default_logical_delete_days),
            &payload,
        );
        Ok(self.enriched(event_type, &metadata))
    }

    async fn delete_physical(
        &mut self,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        let owner_id = self.core.log.dto.owner_id;
        self.core.cancel_physical_deletion();
        self.core
            .physically_delete(OwnerEvent::PhysicalDeleted { owner_id }, &metadata)
            .await?;
        Ok(
            GraceReturnValue::new("PhysicalDeleted", &metadata.correlation_id)
                .with_property("OwnerId", owner_id.to_string()),
        )
    }

    fn enriched(&self, event_type: &str, metadata: &EventMetadata) -> GraceReturnValue {
        let dto = &self.core.log.dto;
        GraceReturnValue::new(event_type, &metadata.correlation_id)
            .with_return_value(dto.owner_id.to_string())
            .with_property("OwnerId", dto.owner_id.to_string())
    }
}

/// Typed invocation handle for the owner actor.
#[derive(Clone)]
pub struct OwnerClient {
    host: Arc<ActorHost<ServerDeps>>,
    id: Uuid,
}

impl OwnerClient {
    pub fn new(host: Arc<ActorHost<ServerDeps>>, id: Uuid) -> Self {
        Self { host, id }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn handle(
        &self,
        command: OwnerCommand,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        self.host
            .with_actor::<OwnerActor, _>(&self.id.to_string(), move |actor| {
                Box::pin(actor.handle(command, metadata)) as BoxFuture<'_, _>
            })
            .await?
    }

    pub async fn exists(&self) -> Result<bool, GraceError> {
        Ok(self
            .host
            .with_actor::<OwnerActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.exists() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn get(&self) -> Result<OwnerDto, GraceError> {
        Ok(self
            .host
            .with_actor::<OwnerActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.log.dto.clone() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn is_deleted(&self) -> Result<bool, GraceError> {
        Ok(self
            .host
            .with_actor::<OwnerActor, _>(&self.id.to_string(), |actor| {
                Box::pin(async move { actor.core.is_deleted() }) as BoxFuture<'_, _>
            })
            .await?)
    }
}
