pub mod actor;
pub mod commands;
pub mod events;
pub mod models;

pub use actor::{OwnerActor, OwnerClient};
pub use commands::OwnerCommand;
pub use events::OwnerEvent;
pub use models::{OwnerDto, OwnerType, SearchVisibility};
