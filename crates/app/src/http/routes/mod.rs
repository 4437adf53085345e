pub mod admin;
pub mod health;
pub mod listings;
pub mod owner_listings;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
