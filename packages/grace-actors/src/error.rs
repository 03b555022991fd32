//! Runtime error types.
//!
//! These are the only errors the actor host surfaces. Domain errors live
//! in the server crate; nothing here crosses the event bus.

use thiserror::Error;

use crate::host::ActorAddress;

/// Failure of the state-storage collaborator.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("could not serialize state under key {key}: {detail}")]
    Serialization { key: String, detail: String },
}

/// Failure inside the actor host itself.
#[derive(Debug, Error)]
pub enum ActorHostError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("stored state for {address} could not be decoded: {detail}")]
    CorruptState { address: ActorAddress, detail: String },

    #[error("{address} is already occupied by an actor of a different kind")]
    WrongActorKind { address: ActorAddress },

    #[error("no actor kind named {kind} is registered with the host")]
    UnknownKind { kind: String },

    #[error("actor host is no longer available")]
    HostUnavailable,
}
