//! Directory-version entity actor and its typed client.
//!
//! The aggregate size must equal the sum of the file sizes it
//! references; the check runs before a `Create` is accepted.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use futures::future::BoxFuture;
use grace_actors::{
    ActorContext, ActorHost, ActorHostError, EventMetadata, ManagedActor, ReminderEnvelope,
};
use tracing::warn;
use uuid::Uuid;

use super::commands::DirectoryVersionCommand;
use super::events::DirectoryVersionEvent;
use super::models::{
    compute_directory_sha256, directory_version_actor_id, DirectoryVersionDto, FileEntry,
};
use crate::context::ServerDeps;
use crate::domains::deletion::{PhysicalDeletionPayload, PHYSICAL_DELETION};
use crate::domains::entity::{DomainEvent, EntityCore, GraceReturnValue};
use crate::domains::repository::actor::RepositoryClient;
use crate::errors::GraceError;
use crate::pipeline::validations::is_well_formed_sha256;

pub struct DirectoryVersionActor {
    core: EntityCore<DirectoryVersionDto>,
}

#[async_trait]
impl ManagedActor for DirectoryVersionActor {
    type Deps = ServerDeps;
    const KIND: &'static str = "DirectoryVersion";

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
            let directory_version_id = self.core.log.dto.directory_version_id;
            if self.core.exists() {
                if let Err(error) = self
                    .core
                    .physically_delete(
                        DirectoryVersionEvent::PhysicalDeleted {
                            directory_version_id,
                        },
                        &metadata,
                    )
                    .await
                {
                    warn!(%directory_version_id, %error, "physical deletion of directory version failed");
                }
            }
        }
        Ok(())
    }
}

impl DirectoryVersionActor {
    pub async fn handle(
        &mut self,
        command: DirectoryVersionCommand,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        tracing::Span::current().record("correlation_id", metadata.correlation_id.as_str());
        self.core.guard_correlation(&metadata)?;
        let is_create = matches!(command, DirectoryVersionCommand::Create { .. });
        self.core
            .guard_lifecycle(is_create, GraceError::DirectoryVersionDoesNotExist)?;

        match command {
            DirectoryVersionCommand::Create {
                directory_version_id,
                repository_id,
                sha256_hash,
                relative_path,
                files,
                size,
                directory_version_ids,
            } => {
                if !is_well_formed_sha256(&sha256_hash) {
                    return Err(GraceError::InvalidSha256 { value: sha256_hash });
                }
                if compute_directory_sha256(&files) != sha256_hash.to_lowercase() {
                    return Err(GraceError::Sha256Mismatch);
                }
                let declared: u64 = files.iter().map(|file| file.size).sum();
                if declared != size {
                    return Err(GraceError::DeclaredSizeMismatch);
                }

                let event = DirectoryVersionEvent::Created {
                    directory_version_id,
                    repository_id,
                    sha256_hash,
                    relative_path,
                    files,
                    size,
                    directory_version_ids,
                    created_at: metadata.timestamp,
                };
                let event_type = event.event_type();
                self.core.commit(event, &metadata).await?;
                Ok(self.enriched(event_type, &metadata))
            }
            DirectoryVersionCommand::DeleteLogical { delete_reason } => {
                self.delete_logical(delete_reason, metadata).await
            }
            DirectoryVersionCommand::DeletePhysical => {
                let directory_version_id = self.core.log.dto.directory_version_id;
                self.core.cancel_physical_deletion();
                self.core
                    .physically_delete(
                        DirectoryVersionEvent::PhysicalDeleted {
                            directory_version_id,
                        },
                        &metadata,
                    )
                    .await?;
                Ok(
                    GraceReturnValue::new("PhysicalDeleted", &metadata.correlation_id)
                        .with_property("DirectoryVersionId", directory_version_id.to_string()),
                )
            }
            DirectoryVersionCommand::Undelete => {
                if !self.core.is_deleted() {
                    return Err(GraceError::NotLogicallyDeleted);
                }
                self.core.cancel_physical_deletion();
                let event = DirectoryVersionEvent::Undeleted;
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
        let repository_id = self.core.log.dto.repository_id;
        let event = DirectoryVersionEvent::LogicalDeleted {
            delete_reason: delete_reason.clone(),
            deleted_at: metadata.timestamp,
        };
        let event_type = event.event_type();
        self.core.commit(event, &metadata).await?;

        let host = self.core.ctx.host()?;
        let retention = RepositoryClient::new(host, repository_id)
            .retention_policy()
            .await?;
        let payload = PhysicalDeletionPayload::new(delete_reason, &metadata.correlation_id)
            .with_repository(repository_id);
        self.core
            .schedule_physical_deletion(Duration::days(retention.logical_delete_days), &payload);

        Ok(self.enriched(event_type, &metadata))
    }

    fn enriched(&self, event_type: &str, metadata: &EventMetadata) -> GraceReturnValue {
        let dto = &self.core.log.dto;
        GraceReturnValue::new(event_type, &metadata.correlation_id)
            .with_return_value(dto.directory_version_id.to_string())
            .with_property("RepositoryId", dto.repository_id.to_string())
            .with_property("DirectoryVersionId", dto.directory_version_id.to_string())
    }
}

/// Typed handle addressed by content: `(repository_id, sha256)`.
#[derive(Clone)]
pub struct DirectoryVersionClient {
    host: Arc<ActorHost<ServerDeps>>,
    actor_id: Uuid,
}

impl DirectoryVersionClient {
    /// Address the actor serving the given repository + hash pair.
    pub fn by_content(
        host: Arc<ActorHost<ServerDeps>>,
        repository_id: Uuid,
        sha256_hash: &str,
    ) -> Self {
        Self {
            actor_id: directory_version_actor_id(repository_id, sha256_hash),
            host,
        }
    }

    pub fn actor_id(&self) -> Uuid {
        self.actor_id
    }

    pub async fn handle(
        &self,
        command: DirectoryVersionCommand,
        metadata: EventMetadata,
    ) -> Result<GraceReturnValue, GraceError> {
        self.host
            .with_actor::<DirectoryVersionActor, _>(&self.actor_id.to_string(), move |actor| {
                Box::pin(actor.handle(command, metadata)) as BoxFuture<'_, _>
            })
            .await?
    }

    pub async fn exists(&self) -> Result<bool, GraceError> {
        Ok(self
            .host
            .with_actor::<DirectoryVersionActor, _>(&self.actor_id.to_string(), |actor| {
                Box::pin(async move { actor.core.exists() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn get(&self) -> Result<DirectoryVersionDto, GraceError> {
        Ok(self
            .host
            .with_actor::<DirectoryVersionActor, _>(&self.actor_id.to_string(), |actor| {
                Box::pin(async move { actor.core.log.dto.clone() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn is_deleted(&self) -> Result<bool, GraceError> {
        Ok(self
            .host
            .with_actor::<DirectoryVersionActor, _>(&self.actor_id.to_string(), |actor| {
                Box::pin(async move { actor.core.is_deleted() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    /// File entries, bounded for query shaping.
    pub async fn get_files(&self, max_count: usize) -> Result<Vec<FileEntry>, GraceError> {
        Ok(self
            .host
            .with_actor::<DirectoryVersionActor, _>(&self.actor_id.to_string(), move |actor| {
                Box::pin(async move {
                    actor
                        .core
                        .log
                        .dto
                        .files
                        .iter()
                        .take(max_count)
                        .cloned()
                        .collect::<Vec<_>>()
                }) as BoxFuture<'_, _>
            })
            .await?)
    }
}
