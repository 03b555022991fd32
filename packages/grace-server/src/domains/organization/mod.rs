pub mod actor;
pub mod commands;
pub mod events;
pub mod models;

pub use actor::{OrganizationActor, OrganizationClient};
pub use commands::OrganizationCommand;
pub use events::OrganizationEvent;
pub use models::{OrganizationDto, OrganizationType};
