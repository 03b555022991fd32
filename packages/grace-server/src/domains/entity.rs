//! Shared event-sourcing skeleton for entity actors.
//!
//! State per actor is the current `dto` plus the ordered event list.
//! Activation rebuilds both by retrieving the list from storage and
//! folding it onto the entity default, so the fold *is* the read model
//! (a pure function of the events). The commit path appends, persists
//! the whole list, then publishes; any failure in that path marks the
//! actor disposed so the next turn reloads from durable state instead of
//! trusting in-memory values of uncertain validity.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use grace_actors::{ActorContext, ActorHostError, EventMetadata, ReminderPeriod};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::context::ServerDeps;
use crate::domains::deletion::{PhysicalDeletionPayload, PHYSICAL_DELETION};
use crate::errors::GraceError;
use crate::events::{GraceEvent, GraceEventEnvelope};

/// The one storage key per entity actor.
pub const EVENTS_KEY: &str = "events";

/// A closed, tagged event union for one entity kind.
pub trait DomainEvent {
    /// Variant name, used as the `event_type` of enriched results.
    fn event_type(&self) -> &'static str;
}

/// A dto that is a pure fold of its entity's events.
pub trait EventSourced: Default + Clone + Send + Sync + 'static {
    type Event: DomainEvent
        + Clone
        + Serialize
        + DeserializeOwned
        + Into<GraceEvent>
        + Send
        + Sync
        + 'static;

    /// The fold: previous dto + event -> next dto. Pure.
    fn apply(dto: Self, event: &Self::Event) -> Self;

    /// False for the default dto and after physical deletion.
    fn exists(&self) -> bool;

    fn deleted_at(&self) -> Option<DateTime<Utc>>;
}

/// An event as persisted: payload plus the metadata it arrived with.
/// The recorded correlation ids are the idempotency ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedEvent<E> {
    pub event: E,
    pub metadata: EventMetadata,
}

/// Current dto + ordered event list.
pub struct EntityLog<T: EventSourced> {
    pub dto: T,
    pub events: Vec<RecordedEvent<T::Event>>,
}

impl<T: EventSourced> EntityLog<T> {
    pub fn empty() -> Self {
        Self {
            dto: T::default(),
            events: Vec::new(),
        }
    }

    pub fn seen_correlation(&self, correlation_id: &str) -> bool {
        self.events
            .iter()
            .any(|recorded| recorded.metadata.correlation_id == correlation_id)
    }

    /// Fold the event into the dto and append it to the list.
    pub fn record(&mut self, event: T::Event, metadata: EventMetadata) {
        self.dto = T::apply(std::mem::take(&mut self.dto), &event);
        self.events.push(RecordedEvent { event, metadata });
    }

    /// Fold without recording: in-memory-only events (the branch's
    /// pointer updates) maintain the snapshot but are never persisted.
    pub fn fold_only(&mut self, event: &T::Event) {
        self.dto = T::apply(std::mem::take(&mut self.dto), event);
    }
}

/// The common core every entity actor embeds.
pub struct EntityCore<T: EventSourced> {
    pub ctx: ActorContext<ServerDeps>,
    pub log: EntityLog<T>,
    pub disposed: bool,
}

impl<T: EventSourced> EntityCore<T> {
    pub fn spawn(ctx: ActorContext<ServerDeps>) -> Self {
        Self {
            ctx,
            log: EntityLog::empty(),
            disposed: false,
        }
    }

    /// Rebuild dto + events from storage by replay.
    pub async fn activate(&mut self) -> Result<(), ActorHostError> {
        let address = self.ctx.address().clone();
        self.log = match self.ctx.storage().retrieve(&address, EVENTS_KEY).await? {
            None => EntityLog::empty(),
            Some(value) => {
                let events: Vec<RecordedEvent<T::Event>> = serde_json::from_value(value)
                    .map_err(|error| ActorHostError::CorruptState {
                        address: address.clone(),
                        detail: error.to_string(),
                    })?;
                let dto = events
                    .iter()
                    .fold(T::default(), |dto, recorded| T::apply(dto, &recorded.event));
                EntityLog { dto, events }
            }
        };
        self.disposed = false;
        Ok(())
    }

    pub fn exists(&self) -> bool {
        self.log.dto.exists()
    }

    pub fn is_deleted(&self) -> bool {
        self.log.dto.deleted_at().is_some()
    }

    /// Idempotency guard: a correlation id may not be reused to apply a
    /// second distinct command against the same entity.
    pub fn guard_correlation(&self, metadata: &EventMetadata) -> Result<(), GraceError> {
        if !metadata.has_correlation_id() {
            return Err(GraceError::MissingCorrelationId);
        }
        if self.log.seen_correlation(&metadata.correlation_id) {
            return Err(GraceError::DuplicateCorrelationId);
        }
        Ok(())
    }

    /// Create requires a fresh entity; everything else requires one.
    pub fn guard_lifecycle(&self, is_create: bool, not_found: GraceError) -> Result<(), GraceError> {
        if is_create && self.exists() {
            return Err(GraceError::EntityAlreadyExists);
        }
        if !is_create && !self.exists() {
            return Err(not_found);
        }
        Ok(())
    }

    /// Fold + append + persist + publish.
    ///
    /// On any failure the actor is poisoned: the in-memory state may no
    /// longer match the store, and the next turn must re-activate.
    /// In-place rollback is deliberately not attempted.
    pub async fn commit(
        &mut self,
        event: T::Event,
        metadata: &EventMetadata,
    ) -> Result<(), GraceError> {
        let envelope = GraceEventEnvelope::new(event.clone(), metadata.clone());
        let body = match serde_json::to_value(&envelope) {
            Ok(body) => body,
            Err(error) => {
                self.disposed = true;
                return Err(GraceError::EventHandlingFailed {
                    detail: format!("serializing event envelope: {error}"),
                });
            }
        };

        self.log.record(event, metadata.clone());
        let serialized = match serde_json::to_value(&self.log.events) {
            Ok(value) => value,
            Err(error) => {
                self.disposed = true;
                return Err(GraceError::EventHandlingFailed {
                    detail: format!("serializing event log: {error}"),
                });
            }
        };

        let address = self.ctx.address().clone();
        if let Err(error) = self
            .ctx
            .storage()
            .save(&address, EVENTS_KEY, serialized)
            .await
        {
            self.disposed = true;
            return Err(GraceError::EventHandlingFailed {
                detail: error.to_string(),
            });
        }

        // Publish after persistence; a crash in between loses the
        // publish, which consumers of the advisory stream tolerate.
        self.ctx
            .bus()
            .publish(&self.ctx.deps().config.pubsub_topic, body);
        Ok(())
    }

    /// Publish an event that is not persisted (physical-deletion notices).
    pub fn publish_only(&self, event: T::Event, metadata: &EventMetadata) {
        if let Ok(body) = serde_json::to_value(GraceEventEnvelope::new(event, metadata.clone())) {
            self.ctx
                .bus()
                .publish(&self.ctx.deps().config.pubsub_topic, body);
        }
    }

    /// Physical deletion: remove the event log from storage, reset the
    /// in-memory state to defaults, mark disposed (the next turn
    /// re-activates to the default dto), and announce it.
    pub async fn physically_delete(
        &mut self,
        event: T::Event,
        metadata: &EventMetadata,
    ) -> Result<(), GraceError> {
        let address = self.ctx.address().clone();
        if let Err(error) = self.ctx.storage().delete(&address, EVENTS_KEY).await {
            self.disposed = true;
            return Err(GraceError::EventHandlingFailed {
                detail: error.to_string(),
            });
        }
        self.log = EntityLog::empty();
        self.disposed = true;
        self.publish_only(event, metadata);
        info!(actor = %address, correlation_id = %metadata.correlation_id, "physically deleted");
        Ok(())
    }

    /// Register the one-shot physical-deletion reminder.
    pub fn schedule_physical_deletion(
        &self,
        due_in: chrono::Duration,
        payload: &PhysicalDeletionPayload,
    ) {
        self.ctx.reminders().register(
            self.ctx.address().clone(),
            PHYSICAL_DELETION,
            serde_json::to_value(payload).unwrap_or(Value::Null),
            due_in,
            ReminderPeriod::Never,
        );
    }

    /// Cancel a pending physical deletion (undelete path).
    pub fn cancel_physical_deletion(&self) {
        self.ctx
            .reminders()
            .unregister(self.ctx.address(), PHYSICAL_DELETION);
    }
}

/// Enriched Ok value returned by every `handle`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraceReturnValue {
    pub return_value: String,
    pub event_type: String,
    pub correlation_id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl GraceReturnValue {
    pub fn new(event_type: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            return_value: String::new(),
            event_type: event_type.into(),
            correlation_id: correlation_id.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_return_value(mut self, value: impl Into<String>) -> Self {
        self.return_value = value.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::domains::owner::events::OwnerEvent;
    use crate::domains::owner::models::{OwnerDto, OwnerType};

    fn created(name: &str) -> OwnerEvent {
        OwnerEvent::Created {
            owner_id: Uuid::new_v4(),
            owner_name: name.into(),
            owner_type: OwnerType::User,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn record_folds_and_appends() {
        let mut log: EntityLog<OwnerDto> = EntityLog::empty();
        assert!(!log.dto.exists());

        log.record(created("alice"), EventMetadata::new("c-1"));
        log.record(
            OwnerEvent::NameSet {
                owner_name: "alice-2".into(),
            },
            EventMetadata::new("c-2"),
        );

        assert_eq!(log.events.len(), 2);
        assert_eq!(log.dto.owner_name, "alice-2");
    }

    #[test]
    fn recorded_correlation_ids_are_the_idempotency_ledger() {
        let mut log: EntityLog<OwnerDto> = EntityLog::empty();
        log.record(created("alice"), EventMetadata::new("c-1"));

        assert!(log.seen_correlation("c-1"));
        assert!(!log.seen_correlation("c-2"));
    }

    #[test]
    fn fold_only_does_not_touch_the_event_list() {
        let mut log: EntityLog<OwnerDto> = EntityLog::empty();
        log.record(created("alice"), EventMetadata::new("c-1"));

        log.fold_only(&OwnerEvent::DescriptionSet {
            description: "in-memory only".into(),
        });

        assert_eq!(log.dto.description, "in-memory only");
        assert_eq!(log.events.len(), 1);
    }

    #[test]
    fn event_log_round_trips_through_json() {
        let mut log: EntityLog<OwnerDto> = EntityLog::empty();
        log.record(created("alice"), EventMetadata::new("c-1"));

        let value = serde_json::to_value(&log.events).unwrap();
        let back: Vec<RecordedEvent<OwnerEvent>> = serde_json::from_value(value).unwrap();
        let dto = back
            .iter()
            .fold(OwnerDto::default(), |dto, recorded| {
                OwnerDto::apply(dto, &recorded.event)
            });

        assert_eq!(dto, log.dto);
        assert_eq!(back[0].metadata.correlation_id, "c-1");
    }
}
