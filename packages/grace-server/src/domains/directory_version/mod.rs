pub mod actor;
pub mod commands;
pub mod events;
pub mod models;

pub use actor::{DirectoryVersionActor, DirectoryVersionClient};
pub use commands::DirectoryVersionCommand;
pub use events::DirectoryVersionEvent;
pub use models::{
    compute_directory_sha256, directory_version_actor_id, DirectoryVersionDto, FileEntry,
};
