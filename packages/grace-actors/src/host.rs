//! Virtual-actor host: single-active-instance placement and serial,
//! turn-based dispatch.
//!
//! An actor is addressed by `(kind, id)`. The host materializes it on
//! first use (spawn + activate), keeps at most one live instance per
//! address, and runs calls into it one at a time in arrival order: the
//! per-address slot lock *is* the turn. An actor that marks itself
//! disposed during a turn (an error whose state effect is uncertain) is
//! re-activated from durable storage before its next turn runs.

use std::any::Any;
use std::sync::{Arc, Weak};
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::Mutex;
use tracing::{debug, debug_span, warn, Instrument};

use crate::bus::MessageBus;
use crate::error::ActorHostError;
use crate::reminders::{ReminderEnvelope, ReminderService};
use crate::state::StateStorage;

/// Cluster-unique actor identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorAddress {
    pub kind: &'static str,
    pub id: String,
}

impl ActorAddress {
    pub fn new(kind: &'static str, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for ActorAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// An actor the host can place, activate and drive.
///
/// `activate` must rebuild all in-memory state from durable storage; it
/// runs before the first turn and again after a turn left the actor
/// disposed. `receive_reminder` is entered under the same turn discipline
/// as a regular call.
#[async_trait]
pub trait ManagedActor: Send + 'static {
    /// Shared application dependencies visible through the context.
    type Deps: Send + Sync + 'static;

    const KIND: &'static str;

    fn spawn(ctx: ActorContext<Self::Deps>) -> Self;

    async fn activate(&mut self) -> Result<(), ActorHostError>;

    /// True when the previous turn left state of uncertain validity.
    fn is_disposed(&self) -> bool {
        false
    }

    async fn receive_reminder(
        &mut self,
        reminder: ReminderEnvelope,
    ) -> Result<(), ActorHostError>;
}

/// Handles an actor receives at spawn time.
pub struct ActorContext<D> {
    address: ActorAddress,
    storage: Arc<dyn StateStorage>,
    bus: MessageBus,
    reminders: Arc<ReminderService>,
    host: Weak<ActorHost<D>>,
    deps: Arc<D>,
}

impl<D> Clone for ActorContext<D> {
    fn clone(&self) -> Self {
        Self {
            address: self.address.clone(),
            storage: Arc::clone(&self.storage),
            bus: self.bus.clone(),
            reminders: Arc::clone(&self.reminders),
            host: Weak::clone(&self.host),
            deps: Arc::clone(&self.deps),
        }
    }
}

impl<D> ActorContext<D> {
    pub fn address(&self) -> &ActorAddress {
        &self.address
    }

    pub fn storage(&self) -> &Arc<dyn StateStorage> {
        &self.storage
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub fn reminders(&self) -> &Arc<ReminderService> {
        &self.reminders
    }

    pub fn deps(&self) -> &D {
        &self.deps
    }

    /// Host handle for cross-actor calls made inside a turn.
    pub fn host(&self) -> Result<Arc<ActorHost<D>>, ActorHostError> {
        self.host.upgrade().ok_or(ActorHostError::HostUnavailable)
    }
}

struct ActorSlot<A> {
    cell: Mutex<Option<A>>,
}

impl<A> ActorSlot<A> {
    fn new() -> Self {
        Self {
            cell: Mutex::new(None),
        }
    }
}

type ReminderDeliverer<D> = Arc<
    dyn Fn(Arc<ActorHost<D>>, String, ReminderEnvelope) -> BoxFuture<'static, Result<(), ActorHostError>>
        + Send
        + Sync,
>;

/// The host. One per process; cheap handles are `Arc<ActorHost<D>>`.
pub struct ActorHost<D> {
    slots: DashMap<ActorAddress, Arc<dyn Any + Send + Sync>>,
    deliverers: DashMap<&'static str, ReminderDeliverer<D>>,
    storage: Arc<dyn StateStorage>,
    bus: MessageBus,
    reminders: Arc<ReminderService>,
    deps: Arc<D>,
}

impl<D: Send + Sync + 'static> ActorHost<D> {
    /// Build the host and bind reminder delivery to it.
    ///
    /// Reminder handler failures are logged and swallowed here; a failed
    /// reminder is never rescheduled automatically.
    pub fn new(
        storage: Arc<dyn StateStorage>,
        bus: MessageBus,
        reminders: Arc<ReminderService>,
        deps: D,
    ) -> Arc<Self> {
        let host = Arc::new(Self {
            slots: DashMap::new(),
            deliverers: DashMap::new(),
            storage,
            bus,
            reminders,
            deps: Arc::new(deps),
        });

        let weak = Arc::downgrade(&host);
        host.reminders.bind_delivery(Box::new(move |address, envelope| {
            let weak = Weak::clone(&weak);
            Box::pin(async move {
                let Some(host) = weak.upgrade() else {
                    return;
                };
                if let Err(error) = host.deliver_reminder(&address, envelope).await {
                    warn!(%address, %error, "reminder handler failed; not rescheduled");
                }
            })
        }));

        host
    }

    /// Make a kind routable for reminder delivery.
    pub fn register_kind<A>(&self)
    where
        A: ManagedActor<Deps = D>,
    {
        let deliverer: ReminderDeliverer<D> = Arc::new(|host, id, envelope| {
            Box::pin(async move {
                host.with_actor::<A, _>(&id, move |actor| {
                    Box::pin(async move { actor.receive_reminder(envelope).await })
                        as BoxFuture<'_, _>
                })
                .await?
            })
        });
        self.deliverers.insert(A::KIND, deliverer);
    }

    /// Run one turn against the actor at `(A::KIND, id)`.
    ///
    /// The slot lock serializes turns in arrival order. The actor is
    /// spawned and activated on first use, and re-activated when the
    /// previous turn left it disposed. The pre/post hooks bracket the
    /// turn with a tracing span and a duration log.
    pub async fn with_actor<A, R>(
        self: &Arc<Self>,
        id: &str,
        turn: impl for<'a> FnOnce(&'a mut A) -> BoxFuture<'a, R> + Send,
    ) -> Result<R, ActorHostError>
    where
        A: ManagedActor<Deps = D>,
        R: Send,
    {
        let address = ActorAddress::new(A::KIND, id);
        let slot = self.slot::<A>(&address)?;
        let mut cell = slot.cell.lock().await;

        let needs_activation = match cell.as_ref() {
            Some(actor) => actor.is_disposed(),
            None => true,
        };
        if needs_activation {
            let ctx = ActorContext {
                address: address.clone(),
                storage: Arc::clone(&self.storage),
                bus: self.bus.clone(),
                reminders: Arc::clone(&self.reminders),
                host: Arc::downgrade(self),
                deps: Arc::clone(&self.deps),
            };
            let mut actor = A::spawn(ctx);
            actor.activate().await?;
            *cell = Some(actor);
            debug!(kind = A::KIND, actor_id = %address.id, "actor activated");
        }
        let Some(actor) = cell.as_mut() else {
            return Err(ActorHostError::HostUnavailable);
        };

        let started = Instant::now();
        let span = debug_span!(
            "actor_turn",
            kind = A::KIND,
            actor_id = %address.id,
            correlation_id = tracing::field::Empty,
        );
        let result = turn(actor).instrument(span).await;
        debug!(
            kind = A::KIND,
            actor_id = %address.id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "turn complete"
        );
        Ok(result)
    }

    /// Reminder entry point: routes by kind, re-enters under the turn lock.
    pub async fn deliver_reminder(
        self: &Arc<Self>,
        address: &ActorAddress,
        envelope: ReminderEnvelope,
    ) -> Result<(), ActorHostError> {
        let deliverer = self
            .deliverers
            .get(address.kind)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ActorHostError::UnknownKind {
                kind: address.kind.to_string(),
            })?;
        deliverer(Arc::clone(self), address.id.clone(), envelope).await
    }

    pub fn storage(&self) -> &Arc<dyn StateStorage> {
        &self.storage
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub fn reminders(&self) -> &Arc<ReminderService> {
        &self.reminders
    }

    pub fn deps(&self) -> &D {
        &self.deps
    }

    fn slot<A>(&self, address: &ActorAddress) -> Result<Arc<ActorSlot<A>>, ActorHostError>
    where
        A: ManagedActor<Deps = D>,
    {
        let entry = self
            .slots
            .entry(address.clone())
            .or_insert_with(|| Arc::new(ActorSlot::<A>::new()) as Arc<dyn Any + Send + Sync>)
            .value()
            .clone();
        entry
            .downcast::<ActorSlot<A>>()
            .map_err(|_| ActorHostError::WrongActorKind {
                address: address.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{Duration, Utc};
    use serde_json::json;

    use super::*;
    use crate::reminders::{Clock, ManualClock, ReminderPeriod};
    use crate::state::InMemoryStateStorage;
    use crate::testing::eventually;

    struct TestDeps {
        activations: AtomicUsize,
    }

    struct CounterActor {
        ctx: ActorContext<TestDeps>,
        count: u64,
        reminder_names: Vec<String>,
        disposed: bool,
    }

    impl CounterActor {
        async fn increment(&mut self) -> Result<u64, ActorHostError> {
            let current = self.count;
            // Force a suspension point inside the turn; interleaving
            // would lose increments.
            tokio::task::yield_now().await;
            self.count = current + 1;
            self.ctx
                .storage()
                .save(&self.ctx.address().clone(), "count", json!(self.count))
                .await?;
            Ok(self.count)
        }

        fn poison_with_unpersisted_change(&mut self) {
            self.count += 100;
            self.disposed = true;
        }
    }

    #[async_trait]
    impl ManagedActor for CounterActor {
        type Deps = TestDeps;
        const KIND: &'static str = "Counter";

        fn spawn(ctx: ActorContext<TestDeps>) -> Self {
            Self {
                ctx,
                count: 0,
                reminder_names: Vec::new(),
                disposed: false,
            }
        }

        async fn activate(&mut self) -> Result<(), ActorHostError> {
            self.ctx.deps().activations.fetch_add(1, Ordering::SeqCst);
            let address = self.ctx.address().clone();
            self.count = match self.ctx.storage().retrieve(&address, "count").await? {
                Some(value) => value.as_u64().unwrap_or(0),
                None => 0,
            };
            self.disposed = false;
            Ok(())
        }

        fn is_disposed(&self) -> bool {
            self.disposed
        }

        async fn receive_reminder(
            &mut self,
            reminder: ReminderEnvelope,
        ) -> Result<(), ActorHostError> {
            self.reminder_names.push(reminder.name);
            Ok(())
        }
    }

    fn build_host(clock: Arc<dyn Clock>) -> Arc<ActorHost<TestDeps>> {
        let storage = Arc::new(InMemoryStateStorage::new());
        let reminders = ReminderService::start(clock);
        let host = ActorHost::new(
            storage,
            MessageBus::new(),
            reminders,
            TestDeps {
                activations: AtomicUsize::new(0),
            },
        );
        host.register_kind::<CounterActor>();
        host
    }

    #[tokio::test]
    async fn turns_are_serialized_per_actor() {
        let host = build_host(Arc::new(ManualClock::new(Utc::now())));

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let host = Arc::clone(&host);
            tasks.push(tokio::spawn(async move {
                host.with_actor::<CounterActor, _>("c-1", |actor| {
                    Box::pin(async move { actor.increment().await })
                })
                .await
                .unwrap()
                .unwrap()
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let count = host
            .with_actor::<CounterActor, _>("c-1", |actor| Box::pin(async move { actor.count }))
            .await
            .unwrap();
        assert_eq!(count, 32);
    }

    #[tokio::test]
    async fn distinct_ids_are_distinct_actors() {
        let host = build_host(Arc::new(ManualClock::new(Utc::now())));

        for id in ["a", "b"] {
            host.with_actor::<CounterActor, _>(id, |actor| {
                Box::pin(async move { actor.increment().await })
            })
            .await
            .unwrap()
            .unwrap();
        }

        let count_a = host
            .with_actor::<CounterActor, _>("a", |actor| Box::pin(async move { actor.count }))
            .await
            .unwrap();
        assert_eq!(count_a, 1);
        assert_eq!(host.deps().activations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn poisoned_actor_is_rebuilt_from_storage_before_next_turn() {
        let host = build_host(Arc::new(ManualClock::new(Utc::now())));

        host.with_actor::<CounterActor, _>("p-1", |actor| {
            Box::pin(async move { actor.increment().await })
        })
        .await
        .unwrap()
        .unwrap();

        host.with_actor::<CounterActor, _>("p-1", |actor| {
            Box::pin(async move { actor.poison_with_unpersisted_change() })
        })
        .await
        .unwrap();

        // The next turn re-activates; the unpersisted +100 is gone.
        let count = host
            .with_actor::<CounterActor, _>("p-1", |actor| Box::pin(async move { actor.count }))
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(host.deps().activations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reminders_reenter_the_actor() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let host = build_host(clock.clone() as Arc<dyn Clock>);

        host.with_actor::<CounterActor, _>("r-1", |actor| {
            Box::pin(async move { actor.increment().await })
        })
        .await
        .unwrap()
        .unwrap();

        host.reminders().register(
            ActorAddress::new(CounterActor::KIND, "r-1"),
            "Maintenance",
            json!({"version": 1}),
            Duration::minutes(5),
            ReminderPeriod::Never,
        );
        clock.advance(Duration::minutes(6));

        let host_for_check = Arc::clone(&host);
        let delivered = eventually(std::time::Duration::from_secs(2), move || {
            let host = Arc::clone(&host_for_check);
            async move {
                host.with_actor::<CounterActor, _>("r-1", |actor| {
                    Box::pin(async move {
                        actor.reminder_names.contains(&"Maintenance".to_string())
                    })
                })
                .await
                .unwrap_or(false)
            }
        })
        .await;
        assert!(delivered);
    }
}
