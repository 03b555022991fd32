//! Entity actors, one module per entity kind.
//!
//! Every actor shares the `entity` skeleton: state is `dto` (the current
//! read model) plus the ordered event list, both rebuilt on activation by
//! replay; `handle` guards idempotency and lifecycle, translates the
//! command into an event, folds + persists + publishes it, and returns an
//! enriched result. A failure mid-apply poisons the actor so the next
//! turn rebuilds from durable state.

pub mod branch;
pub mod deletion;
pub mod directory_version;
pub mod entity;
pub mod organization;
pub mod owner;
pub mod reference;
pub mod repository;
pub mod repository_name;
