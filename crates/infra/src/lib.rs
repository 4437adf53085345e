pub mod cache;
pub mod db;
pub mod search;
pub mod store;
