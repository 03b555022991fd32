//! Repository-name index actor.
//!
//! A lookup actor keyed `{repo-name}|{owner-id}|{organization-id}`
//! caching a single repository id, set by whoever created or renamed
//! the repository. Not event-sourced: it persists the one value under
//! its own key.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use grace_actors::{
    ActorContext, ActorHost, ActorHostError, ManagedActor, ReminderEnvelope,
};
use serde_json::json;
use uuid::Uuid;

use crate::context::ServerDeps;
use crate::errors::GraceError;

const REPOSITORY_ID_KEY: &str = "repositoryId";

/// Build the index actor's id for a repository name under its ancestors.
pub fn repository_name_index_key(
    repository_name: &str,
    owner_id: Uuid,
    organization_id: Uuid,
) -> String {
    format!("{repository_name}|{owner_id}|{organization_id}")
}

pub struct RepositoryNameActor {
    ctx: ActorContext<ServerDeps>,
    repository_id: Option<Uuid>,
    disposed: bool,
}

#[async_trait]
impl ManagedActor for RepositoryNameActor {
    type Deps = ServerDeps;
    const KIND: &'static str = "RepositoryName";

    fn spawn(ctx: ActorContext<ServerDeps>) -> Self {
        Self {
            ctx,
            repository_id: None,
            disposed: false,
        }
    }

    async fn activate(&mut self) -> Result<(), ActorHostError> {
        let address = self.ctx.address().clone();
        self.repository_id = self
            .ctx
            .storage()
            .retrieve(&address, REPOSITORY_ID_KEY)
            .await?
            .and_then(|value| serde_json::from_value(value).ok());
        self.disposed = false;
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    async fn receive_reminder(
        &mut self,
        _reminder: ReminderEnvelope,
    ) -> Result<(), ActorHostError> {
        Ok(())
    }
}

impl RepositoryNameActor {
    pub fn get_repository_id(&self) -> Option<Uuid> {
        self.repository_id
    }

    pub async fn set_repository_id(
        &mut self,
        repository_id: Option<Uuid>,
    ) -> Result<(), GraceError> {
        let address = self.ctx.address().clone();
        if let Err(error) = self
            .ctx
            .storage()
            .save(&address, REPOSITORY_ID_KEY, json!(repository_id))
            .await
        {
            self.disposed = true;
            return Err(GraceError::EventHandlingFailed {
                detail: error.to_string(),
            });
        }
        self.repository_id = repository_id;
        Ok(())
    }
}

/// Typed invocation handle for the name index.
#[derive(Clone)]
pub struct RepositoryNameClient {
    host: Arc<ActorHost<ServerDeps>>,
    key: String,
}

impl RepositoryNameClient {
    pub fn new(
        host: Arc<ActorHost<ServerDeps>>,
        repository_name: &str,
        owner_id: Uuid,
        organization_id: Uuid,
    ) -> Self {
        Self {
            host,
            key: repository_name_index_key(repository_name, owner_id, organization_id),
        }
    }

    pub async fn get_repository_id(&self) -> Result<Option<Uuid>, GraceError> {
        Ok(self
            .host
            .with_actor::<RepositoryNameActor, _>(&self.key, |actor| {
                Box::pin(async move { actor.get_repository_id() }) as BoxFuture<'_, _>
            })
            .await?)
    }

    pub async fn set_repository_id(
        &self,
        repository_id: Option<Uuid>,
    ) -> Result<(), GraceError> {
        self.host
            .with_actor::<RepositoryNameActor, _>(&self.key, move |actor| {
                Box::pin(actor.set_repository_id(repository_id)) as BoxFuture<'_, _>
            })
            .await?
    }
}
