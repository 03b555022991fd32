//! # grace-actors
//!
//! The virtual-actor runtime underneath the Grace version-control server.
//!
//! Every entity in Grace (owner, organization, repository, branch,
//! reference, directory version) is a *virtual actor*: it is addressed by
//! `(kind, id)`, materialized on first use, and every call into it runs
//! **one turn at a time** in arrival order. All of the server's guarantees
//! (per-entity event ordering, idempotency under retries, poisoned-state
//! recovery) hang off that turn discipline, so it lives here and nowhere
//! else.
//!
//! ## Architecture
//!
//! ```text
//! caller ──► ActorHost::with_actor(kind, id, turn)
//!                │  slot lock = the turn (one at a time, FIFO)
//!                ├─► spawn + activate on first use / after poisoning
//!                ├─► pre hook  (span, correlation capture, start instant)
//!                ├─► turn body (entity command handling)
//!                └─► post hook (duration log)
//!
//! ReminderService ──(due)──► ActorHost::deliver_reminder ──► same path
//! ```
//!
//! ## Key invariants
//!
//! 1. **One turn at a time per address** - two operations on the same
//!    entity are totally ordered.
//! 2. **Activate before first turn** - an actor always sees state rebuilt
//!    from durable storage before handling anything.
//! 3. **Poisoned means rebuild** - an actor that marks itself disposed is
//!    re-activated before its next turn; in-memory state never diverges
//!    from the store across turns.
//! 4. **Reminders re-enter through the front door** - reminder delivery
//!    takes the same slot lock as a regular call.
//!
//! The state store, event bus and reminder service are platform
//! collaborators behind narrow contracts; the in-memory implementations
//! here are single-process stand-ins with the contractual semantics
//! (per-key linearizability, fire-and-forget publish, one-shot named
//! reminders).

pub mod bus;
pub mod cache;
pub mod core;
pub mod error;
pub mod host;
pub mod reminders;
pub mod state;
pub mod testing;

pub use crate::core::EventMetadata;
pub use bus::{MessageBus, PublishedMessage};
pub use cache::{CachedEntity, ExistenceCache};
pub use error::{ActorHostError, StorageError};
pub use host::{ActorAddress, ActorContext, ActorHost, ManagedActor};
pub use reminders::{
    Clock, ManualClock, ReminderEnvelope, ReminderPeriod, ReminderService, SystemClock,
};
pub use state::{InMemoryStateStorage, StateStorage};
