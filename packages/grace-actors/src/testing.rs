//! Test utilities shared by the runtime and server crates.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;
use crate::host::ActorAddress;
use crate::state::StateStorage;

/// Poll `check` until it returns true or the timeout elapses.
///
/// Reminder delivery and read-model updates are asynchronous even under
/// a manual clock; tests use this instead of fixed sleeps.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Storage wrapper that fails the next N saves.
///
/// Used to drive the poisoned-actor recovery path: a failed persist must
/// leave the next turn rebuilding from the inner (consistent) store.
pub struct FlakyStorage {
    inner: Arc<dyn StateStorage>,
    failures_remaining: AtomicUsize,
}

impl FlakyStorage {
    pub fn new(inner: Arc<dyn StateStorage>) -> Self {
        Self {
            inner,
            failures_remaining: AtomicUsize::new(0),
        }
    }

    pub fn fail_next_saves(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    fn should_fail(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl StateStorage for FlakyStorage {
    async fn save(
        &self,
        actor: &ActorAddress,
        key: &str,
        value: Value,
    ) -> Result<(), StorageError> {
        if self.should_fail() {
            return Err(StorageError::Unavailable(
                "injected save failure".to_string(),
            ));
        }
        self.inner.save(actor, key, value).await
    }

    async fn retrieve(
        &self,
        actor: &ActorAddress,
        key: &str,
    ) -> Result<Option<Value>, StorageError> {
        self.inner.retrieve(actor, key).await
    }

    async fn delete(&self, actor: &ActorAddress, key: &str) -> Result<bool, StorageError> {
        self.inner.delete(actor, key).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::InMemoryStateStorage;

    #[tokio::test]
    async fn flaky_storage_fails_exactly_n_saves() {
        let storage = FlakyStorage::new(Arc::new(InMemoryStateStorage::new()));
        let actor = ActorAddress::new("Branch", "b-1");
        storage.fail_next_saves(2);

        assert!(storage.save(&actor, "events", json!(1)).await.is_err());
        assert!(storage.save(&actor, "events", json!(2)).await.is_err());
        assert!(storage.save(&actor, "events", json!(3)).await.is_ok());
        assert_eq!(
            storage.retrieve(&actor, "events").await.unwrap(),
            Some(json!(3))
        );
    }

    #[tokio::test]
    async fn eventually_times_out() {
        assert!(!eventually(Duration::from_millis(50), || async { false }).await);
        assert!(eventually(Duration::from_millis(50), || async { true }).await);
    }
}
