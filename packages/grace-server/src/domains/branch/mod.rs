pub mod actor;
pub mod commands;
pub mod events;
pub mod models;

pub use actor::{BranchActor, BranchClient};
pub use commands::BranchCommand;
pub use events::BranchEvent;
pub use models::{BranchDto, ReferenceEnabledFlags, ReferenceFlag};
