pub mod listings_repo;
pub mod migrations;
pub mod pool;

pub use listings_repo::PgListingStore;
pub use pool::{connect_lazy, DbPool, DbPoolError};
