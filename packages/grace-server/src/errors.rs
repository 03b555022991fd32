//! Server error taxonomy.
//!
//! `GraceError` is the closed set of string-keyed error codes that cross
//! the actor surface and the pipeline boundary. `code()` is the stable
//! key; the `Display` text is the en-US catalog entry resolved for that
//! key. Nothing else (no `anyhow::Error`, no runtime error) is ever
//! returned to a caller.

use grace_actors::ActorHostError;
use thiserror::Error;

/// Coarse classification used for reply shaping (the 400/500 split) and
/// for deciding whether a failure poisons the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    PreconditionFailed,
    Integrity,
    Dependency,
    Internal,
}

impl ErrorKind {
    /// HTTP status the transport layer maps this kind to.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Dependency | ErrorKind::Internal => 500,
            _ => 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraceError {
    // -- Validation ---------------------------------------------------------
    #[error("a correlation id is required")]
    MissingCorrelationId,

    #[error("{value} is not a valid identifier")]
    InvalidUuid { value: String },

    #[error("{name} is not a valid entity name")]
    InvalidEntityName { name: String },

    #[error("{value} is not a valid sha256 hash")]
    InvalidSha256 { value: String },

    #[error("{field} must be between {minimum} and {maximum}; got {value}")]
    ValueOutOfRange {
        field: &'static str,
        minimum: i64,
        maximum: i64,
        value: i64,
    },

    // -- NotFound -----------------------------------------------------------
    #[error("the owner does not exist")]
    OwnerDoesNotExist,

    #[error("the organization does not exist")]
    OrganizationDoesNotExist,

    #[error("the repository does not exist")]
    RepositoryDoesNotExist,

    #[error("the branch does not exist")]
    BranchDoesNotExist,

    #[error("the parent branch does not exist")]
    ParentBranchDoesNotExist,

    #[error("the reference does not exist")]
    ReferenceDoesNotExist,

    #[error("the directory version does not exist")]
    DirectoryVersionDoesNotExist,

    // -- Conflict -----------------------------------------------------------
    #[error("an entity with this id already exists")]
    EntityAlreadyExists,

    #[error("the name {name} is already in use")]
    NameAlreadyExists { name: String },

    #[error("this correlation id was already used against this entity")]
    DuplicateCorrelationId,

    #[error("the entity is already deleted")]
    AlreadyDeleted,

    #[error("the entity is not logically deleted")]
    NotLogicallyDeleted,

    // -- PreconditionFailed -------------------------------------------------
    #[error("assign references are disabled on this branch")]
    AssignIsDisabled,

    #[error("promotion references are disabled on this branch")]
    PromotionIsDisabled,

    #[error("commit references are disabled on this branch")]
    CommitIsDisabled,

    #[error("checkpoint references are disabled on this branch")]
    CheckpointIsDisabled,

    #[error("save references are disabled on this branch")]
    SaveIsDisabled,

    #[error("tag references are disabled on this branch")]
    TagIsDisabled,

    #[error("external references are disabled on this branch")]
    ExternalIsDisabled,

    #[error("auto-rebase is disabled on this branch")]
    AutoRebaseIsDisabled,

    #[error("the branch is not based on the latest promotion of its parent")]
    BranchNotBasedOnLatestPromotion,

    #[error("the repository still contains branches")]
    RepositoryIsNotEmpty,

    #[error("the branch still contains references")]
    BranchIsNotEmpty,

    // -- Integrity ----------------------------------------------------------
    #[error("the computed sha256 hash does not match the declared hash")]
    Sha256Mismatch,

    #[error("the declared size does not match the sum of the file sizes")]
    DeclaredSizeMismatch,

    // -- Dependency ---------------------------------------------------------
    #[error("the state store is unavailable: {detail}")]
    StorageUnavailable { detail: String },

    #[error("applying the event failed: {detail}")]
    EventHandlingFailed { detail: String },

    // -- Internal -----------------------------------------------------------
    #[error("unexpected failure: {detail}")]
    Unexpected { detail: String },
}

impl GraceError {
    pub fn kind(&self) -> ErrorKind {
        use GraceError::*;
        match self {
            MissingCorrelationId
            | InvalidUuid { .. }
            | InvalidEntityName { .. }
            | InvalidSha256 { .. }
            | ValueOutOfRange { .. } => ErrorKind::Validation,

            OwnerDoesNotExist
            | OrganizationDoesNotExist
            | RepositoryDoesNotExist
            | BranchDoesNotExist
            | ParentBranchDoesNotExist
            | ReferenceDoesNotExist
            | DirectoryVersionDoesNotExist => ErrorKind::NotFound,

            EntityAlreadyExists
            | NameAlreadyExists { .. }
            | DuplicateCorrelationId
            | AlreadyDeleted
            | NotLogicallyDeleted => ErrorKind::Conflict,

            AssignIsDisabled
            | PromotionIsDisabled
            | CommitIsDisabled
            | CheckpointIsDisabled
            | SaveIsDisabled
            | TagIsDisabled
            | ExternalIsDisabled
            | AutoRebaseIsDisabled
            | BranchNotBasedOnLatestPromotion
            | RepositoryIsNotEmpty
            | BranchIsNotEmpty => ErrorKind::PreconditionFailed,

            Sha256Mismatch | DeclaredSizeMismatch => ErrorKind::Integrity,

            StorageUnavailable { .. } | EventHandlingFailed { .. } => ErrorKind::Dependency,

            Unexpected { .. } => ErrorKind::Internal,
        }
    }

    /// Stable string key, the handle into the message catalog.
    pub fn code(&self) -> &'static str {
        use GraceError::*;
        match self {
            MissingCorrelationId => "MissingCorrelationId",
            InvalidUuid { .. } => "InvalidUuid",
            InvalidEntityName { .. } => "InvalidEntityName",
            InvalidSha256 { .. } => "InvalidSha256",
            ValueOutOfRange { .. } => "ValueOutOfRange",
            OwnerDoesNotExist => "OwnerDoesNotExist",
            OrganizationDoesNotExist => "OrganizationDoesNotExist",
            RepositoryDoesNotExist => "RepositoryDoesNotExist",
            BranchDoesNotExist => "BranchDoesNotExist",
            ParentBranchDoesNotExist => "ParentBranchDoesNotExist",
            ReferenceDoesNotExist => "ReferenceDoesNotExist",
            DirectoryVersionDoesNotExist => "DirectoryVersionDoesNotExist",
            EntityAlreadyExists => "EntityAlreadyExists",
            NameAlreadyExists { .. } => "NameAlreadyExists",
            DuplicateCorrelationId => "DuplicateCorrelationId",
            AlreadyDeleted => "AlreadyDeleted",
            NotLogicallyDeleted => "NotLogicallyDeleted",
            AssignIsDisabled => "AssignIsDisabled",
            PromotionIsDisabled => "PromotionIsDisabled",
            CommitIsDisabled => "CommitIsDisabled",
            CheckpointIsDisabled => "CheckpointIsDisabled",
            SaveIsDisabled => "SaveIsDisabled",
            TagIsDisabled => "TagIsDisabled",
            ExternalIsDisabled => "ExternalIsDisabled",
            AutoRebaseIsDisabled => "AutoRebaseIsDisabled",
            BranchNotBasedOnLatestPromotion => "BranchNotBasedOnLatestPromotion",
            RepositoryIsNotEmpty => "RepositoryIsNotEmpty",
            BranchIsNotEmpty => "BranchIsNotEmpty",
            Sha256Mismatch => "Sha256Mismatch",
            DeclaredSizeMismatch => "DeclaredSizeMismatch",
            StorageUnavailable { .. } => "StorageUnavailable",
            EventHandlingFailed { .. } => "EventHandlingFailed",
            Unexpected { .. } => "Unexpected",
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

impl From<ActorHostError> for GraceError {
    fn from(error: ActorHostError) -> Self {
        match error {
            ActorHostError::Storage(inner) => GraceError::StorageUnavailable {
                detail: inner.to_string(),
            },
            other => GraceError::Unexpected {
                detail: other.to_string(),
            },
        }
    }
}
