pub mod actor;
pub mod commands;
pub mod events;
pub mod models;

pub use actor::{RepositoryActor, RepositoryClient};
pub use commands::RepositoryCommand;
pub use events::RepositoryEvent;
pub use models::{RepositoryDto, RepositoryStatus, RepositoryVisibility, RetentionPolicy};
