pub mod draft;
pub mod filter;
pub mod listing;
pub mod page;
