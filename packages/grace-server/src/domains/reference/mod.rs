pub mod actor;
pub mod commands;
pub mod events;
pub mod models;

pub use actor::{ReferenceActor, ReferenceClient};
pub use commands::ReferenceCommand;
pub use events::ReferenceEvent;
pub use models::{ReferenceDto, ReferenceType};
