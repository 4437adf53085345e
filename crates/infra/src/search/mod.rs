pub mod service;
pub mod translator;

pub use service::{CachePolicy, ListingSearchService, SearchError};
pub use translator::{featured_plan, translate, FetchPlan, Predicate, SortKey};
