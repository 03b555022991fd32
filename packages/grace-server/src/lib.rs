//! # grace-server
//!
//! Core of the Grace distributed version-control server: clients push
//! file content, directory snapshots and symbolic references (saves,
//! checkpoints, commits, promotions, tags, rebases) against an
//! Owner → Organization → Repository → Branch hierarchy. History is an
//! append-only event log per entity; read models are pure folds of that
//! log; domain events go out on a pub/sub topic for subscribers and the
//! in-process read-model updater.
//!
//! This crate holds the entity actors and everything that fronts them:
//!
//! - `domains` - one event-sourced actor per entity kind (owner,
//!   organization, repository, branch, reference, directory version,
//!   repository-name index), all sharing the same skeleton: replay on
//!   activate, correlation-id idempotency guard, command → event
//!   translation, fold + persist + publish, poison-on-failure.
//! - `pipeline` - the validation/command pipeline every mutating
//!   operation goes through: concurrent validations, name → id
//!   resolution, actor dispatch, reply shaping.
//! - `resolve` - canonical id resolution for owner/org/repo/branch paths.
//! - `readmodel` - the thin in-process projections the branch actor and
//!   cascade deletion consult.
//!
//! The actor runtime itself (turn dispatch, state storage, bus,
//! reminders, cache) lives in `grace-actors`.

pub mod config;
pub mod context;
pub mod domains;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod readmodel;
pub mod resolve;

pub use config::Config;
pub use context::{ServerContext, ServerDeps};
pub use errors::{ErrorKind, GraceError};
pub use events::{GraceEvent, GraceEventEnvelope};
