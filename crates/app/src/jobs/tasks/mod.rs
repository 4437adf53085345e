pub mod cache_purge;
pub mod listing_expiry;
