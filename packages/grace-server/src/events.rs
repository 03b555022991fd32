//! Domain events on the wire.
//!
//! Every published event is a tagged record
//! `{ tag, event, metadata }` serialized as JSON with stable tags, so
//! external subscribers can route on `tag` without understanding every
//! payload.

use grace_actors::EventMetadata;
use serde::{Deserialize, Serialize};

use crate::domains::branch::events::BranchEvent;
use crate::domains::directory_version::events::DirectoryVersionEvent;
use crate::domains::organization::events::OrganizationEvent;
use crate::domains::owner::events::OwnerEvent;
use crate::domains::reference::events::ReferenceEvent;
use crate::domains::repository::events::RepositoryEvent;

/// Discriminated union of every entity's events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tag", content = "event")]
pub enum GraceEvent {
    OwnerEvent(OwnerEvent),
    OrganizationEvent(OrganizationEvent),
    RepositoryEvent(RepositoryEvent),
    BranchEvent(BranchEvent),
    ReferenceEvent(ReferenceEvent),
    DirectoryVersionEvent(DirectoryVersionEvent),
}

impl From<OwnerEvent> for GraceEvent {
    fn from(event: OwnerEvent) -> Self {
        GraceEvent::OwnerEvent(event)
    }
}

impl From<OrganizationEvent> for GraceEvent {
    fn from(event: OrganizationEvent) -> Self {
        GraceEvent::OrganizationEvent(event)
    }
}

impl From<RepositoryEvent> for GraceEvent {
    fn from(event: RepositoryEvent) -> Self {
        GraceEvent::RepositoryEvent(event)
    }
}

impl From<BranchEvent> for GraceEvent {
    fn from(event: BranchEvent) -> Self {
        GraceEvent::BranchEvent(event)
    }
}

impl From<ReferenceEvent> for GraceEvent {
    fn from(event: ReferenceEvent) -> Self {
        GraceEvent::ReferenceEvent(event)
    }
}

impl From<DirectoryVersionEvent> for GraceEvent {
    fn from(event: DirectoryVersionEvent) -> Self {
        GraceEvent::DirectoryVersionEvent(event)
    }
}

/// The full wire envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraceEventEnvelope {
    #[serde(flatten)]
    pub event: GraceEvent,
    pub metadata: EventMetadata,
}

impl GraceEventEnvelope {
    pub fn new(event: impl Into<GraceEvent>, metadata: EventMetadata) -> Self {
        Self {
            event: event.into(),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn envelope_carries_stable_tag() {
        let event = ReferenceEvent::LogicalDeleted {
            reference_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            delete_reason: "retire".to_string(),
            deleted_at: chrono::Utc::now(),
        };
        let envelope = GraceEventEnvelope::new(event, EventMetadata::new("c-1"));
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["tag"], "ReferenceEvent");
        assert_eq!(json["event"]["LogicalDeleted"]["delete_reason"], "retire");
        assert_eq!(json["metadata"]["correlation_id"], "c-1");

        let back: GraceEventEnvelope = serde_json::from_value(json).unwrap();
        assert!(matches!(
            back.event,
            GraceEvent::ReferenceEvent(ReferenceEvent::LogicalDeleted { .. })
        ));
    }
}
