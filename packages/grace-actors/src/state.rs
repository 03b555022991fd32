//! State storage contract and the in-memory implementation.
//!
//! One key per actor holds that actor's entire ordered event list; the
//! store promises durability and single-key linearizability per actor.
//! Activation rebuilds in-memory state by retrieving and replaying the
//! list, which keeps the contract down to three verbs.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::error::StorageError;
use crate::host::ActorAddress;

/// Durable keyed storage for actor state.
///
/// Values are opaque serialized blobs. Implementations must be
/// linearizable per `(actor, key)` and durable; everything else (replay,
/// folding, idempotency) is built above this contract.
#[async_trait]
pub trait StateStorage: Send + Sync + 'static {
    async fn save(&self, actor: &ActorAddress, key: &str, value: Value)
        -> Result<(), StorageError>;

    async fn retrieve(
        &self,
        actor: &ActorAddress,
        key: &str,
    ) -> Result<Option<Value>, StorageError>;

    /// Returns true when a value existed and was removed.
    async fn delete(&self, actor: &ActorAddress, key: &str) -> Result<bool, StorageError>;

    /// Readiness probe used by the one-shot startup wait.
    async fn ready(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Process-local storage with the contractual semantics.
///
/// A `DashMap` keyed by `{kind}/{id}|{key}` is trivially linearizable per
/// key. Durability is whatever the process lifetime is; the production
/// deployment swaps in a platform-backed implementation of the same trait.
#[derive(Default)]
pub struct InMemoryStateStorage {
    entries: DashMap<String, Value>,
}

impl InMemoryStateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn storage_key(actor: &ActorAddress, key: &str) -> String {
        format!("{}/{}|{}", actor.kind, actor.id, key)
    }

    /// Number of stored keys, across all actors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl StateStorage for InMemoryStateStorage {
    async fn save(
        &self,
        actor: &ActorAddress,
        key: &str,
        value: Value,
    ) -> Result<(), StorageError> {
        self.entries.insert(Self::storage_key(actor, key), value);
        Ok(())
    }

    async fn retrieve(
        &self,
        actor: &ActorAddress,
        key: &str,
    ) -> Result<Option<Value>, StorageError> {
        Ok(self
            .entries
            .get(&Self::storage_key(actor, key))
            .map(|entry| entry.value().clone()))
    }

    async fn delete(&self, actor: &ActorAddress, key: &str) -> Result<bool, StorageError> {
        Ok(self.entries.remove(&Self::storage_key(actor, key)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn address(id: &str) -> ActorAddress {
        ActorAddress::new("Branch", id)
    }

    #[tokio::test]
    async fn save_retrieve_delete_cycle() {
        let storage = InMemoryStateStorage::new();
        let actor = address("b-1");

        assert_eq!(storage.retrieve(&actor, "events").await.unwrap(), None);

        storage
            .save(&actor, "events", json!([{"n": 1}]))
            .await
            .unwrap();
        assert_eq!(
            storage.retrieve(&actor, "events").await.unwrap(),
            Some(json!([{"n": 1}]))
        );

        assert!(storage.delete(&actor, "events").await.unwrap());
        assert!(!storage.delete(&actor, "events").await.unwrap());
        assert_eq!(storage.retrieve(&actor, "events").await.unwrap(), None);
    }

    #[tokio::test]
    async fn keys_are_scoped_per_actor() {
        let storage = InMemoryStateStorage::new();

        storage
            .save(&address("b-1"), "events", json!(1))
            .await
            .unwrap();
        storage
            .save(&address("b-2"), "events", json!(2))
            .await
            .unwrap();

        assert_eq!(
            storage.retrieve(&address("b-1"), "events").await.unwrap(),
            Some(json!(1))
        );
        assert_eq!(
            storage.retrieve(&address("b-2"), "events").await.unwrap(),
            Some(json!(2))
        );
    }
}
