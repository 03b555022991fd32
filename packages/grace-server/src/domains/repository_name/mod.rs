pub mod actor;

pub use actor::{repository_name_index_key, RepositoryNameActor, RepositoryNameClient};
