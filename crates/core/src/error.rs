use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error("geo query requires latitude, longitude and radius together")]
    IncompleteGeoQuery,
    #[error("invalid geo query: {0}")]
    InvalidGeoQuery(String),
    #[error("invalid {0}: {1}")]
    InvalidEnum(&'static str, String),
    #[error("invalid listing: {0}")]
    InvalidDraft(String),
}
