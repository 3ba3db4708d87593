pub mod activity_repo;
pub mod api_key_repo;
pub mod schema;
pub mod server_repo;
pub mod store;
pub mod team_repo;
pub mod util;

pub use crate::store::{DbProvider, DbStore};
