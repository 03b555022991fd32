//! Explicit dependency wiring.
//!
//! Handles to the platform services (storage, bus, host, reminders) and
//! the server-level dependencies are built once at process start and
//! passed through this context; there is no module-level mutable state.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use grace_actors::{
    ActorHost, Clock, ExistenceCache, InMemoryStateStorage, MessageBus, ReminderService,
    StateStorage, SystemClock,
};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::domains::branch::actor::{BranchActor, BranchClient};
use crate::domains::directory_version::actor::{DirectoryVersionActor, DirectoryVersionClient};
use crate::domains::organization::actor::{OrganizationActor, OrganizationClient};
use crate::domains::owner::actor::{OwnerActor, OwnerClient};
use crate::domains::reference::actor::{ReferenceActor, ReferenceClient};
use crate::domains::repository::actor::{RepositoryActor, RepositoryClient};
use crate::domains::repository_name::actor::{RepositoryNameActor, RepositoryNameClient};
use crate::readmodel::{BranchReadModel, InMemoryReadModel, ReferenceReadModel};

/// Dependencies visible to every actor through its context.
pub struct ServerDeps {
    pub config: Config,
    pub cache: ExistenceCache,
    pub references: Arc<dyn ReferenceReadModel>,
    pub branches: Arc<dyn BranchReadModel>,
}

/// Everything the command pipeline needs to run.
pub struct ServerContext {
    pub host: Arc<ActorHost<ServerDeps>>,
    pub bus: MessageBus,
    pub storage: Arc<dyn StateStorage>,
    pub reminders: Arc<ReminderService>,
    pub clock: Arc<dyn Clock>,
}

pub struct ServerContextBuilder {
    config: Config,
    storage: Option<Arc<dyn StateStorage>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ServerContextBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            storage: None,
            clock: None,
        }
    }

    /// Swap the state-store collaborator (tests inject fault wrappers).
    pub fn with_storage(mut self, storage: Arc<dyn StateStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Swap the clock (tests drive retention with a manual clock).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Wire the platform services, read models and actor kinds.
    ///
    /// Must run inside a tokio runtime: the reminder scheduler and the
    /// read-model updater are spawned here.
    pub fn build(self) -> ServerContext {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(InMemoryStateStorage::new()));
        let bus = MessageBus::new();

        let read_model = InMemoryReadModel::new();
        read_model.attach(&bus);

        let reminders = ReminderService::start(Arc::clone(&clock));
        let cache = ExistenceCache::new(Duration::from_secs(self.config.cache_ttl_seconds));
        let deps = ServerDeps {
            config: self.config,
            cache,
            references: Arc::clone(&read_model) as Arc<dyn ReferenceReadModel>,
            branches: read_model as Arc<dyn BranchReadModel>,
        };

        let host = ActorHost::new(
            Arc::clone(&storage),
            bus.clone(),
            Arc::clone(&reminders),
            deps,
        );
        host.register_kind::<OwnerActor>();
        host.register_kind::<OrganizationActor>();
        host.register_kind::<RepositoryActor>();
        host.register_kind::<BranchActor>();
        host.register_kind::<ReferenceActor>();
        host.register_kind::<DirectoryVersionActor>();
        host.register_kind::<RepositoryNameActor>();

        ServerContext {
            host,
            bus,
            storage,
            reminders,
            clock,
        }
    }
}

impl ServerContext {
    pub fn builder(config: Config) -> ServerContextBuilder {
        ServerContextBuilder::new(config)
    }

    /// One-shot startup: wire everything, then wait for the state-store
    /// collaborator to report ready.
    pub async fn initialize(config: Config) -> Result<Self> {
        let readiness_timeout = Duration::from_secs(config.readiness_timeout_seconds);
        let context = Self::builder(config).build();
        context
            .wait_until_ready(readiness_timeout)
            .await
            .context("state store did not become ready")?;
        info!("server context initialized");
        Ok(context)
    }

    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.storage.ready().await {
                Ok(()) => return Ok(()),
                Err(error) if tokio::time::Instant::now() >= deadline => {
                    return Err(error).context("readiness wait timed out");
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(250)).await,
            }
        }
    }

    pub fn deps(&self) -> &ServerDeps {
        self.host.deps()
    }

    // Typed actor proxies.

    pub fn owner(&self, id: Uuid) -> OwnerClient {
        OwnerClient::new(Arc::clone(&self.host), id)
    }

    pub fn organization(&self, id: Uuid) -> OrganizationClient {
        OrganizationClient::new(Arc::clone(&self.host), id)
    }

    pub fn repository(&self, id: Uuid) -> RepositoryClient {
        RepositoryClient::new(Arc::clone(&self.host), id)
    }

    pub fn branch(&self, id: Uuid) -> BranchClient {
        BranchClient::new(Arc::clone(&self.host), id)
    }

    pub fn reference(&self, id: Uuid) -> ReferenceClient {
        ReferenceClient::new(Arc::clone(&self.host), id)
    }

    pub fn directory_version(&self, repository_id: Uuid, sha256_hash: &str) -> DirectoryVersionClient {
        DirectoryVersionClient::by_content(Arc::clone(&self.host), repository_id, sha256_hash)
    }

    pub fn repository_name(
        &self,
        repository_name: &str,
        owner_id: Uuid,
        organization_id: Uuid,
    ) -> RepositoryNameClient {
        RepositoryNameClient::new(
            Arc::clone(&self.host),
            repository_name,
            owner_id,
            organization_id,
        )
    }
}
