use serde::Deserialize;
use uuid::Uuid;

use crate::domain::listing::{ListingType, PropertyType};
use crate::error::CoreError;
use crate::types::geo::GeoPoint;

/// Days a new listing stays active before the expiry sweep picks it up.
pub const LISTING_LIFETIME_DAYS: i64 = 30;

const DEFAULT_CURRENCY: &str = "VND";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Owner-supplied listing content, used for both create and full update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub address: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub area: f64,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    pub ward_id: Uuid,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub amenity_ids: Vec<Uuid>,
    /// First entry becomes the primary image.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// A draft that passed validation: text trimmed, amenities deduplicated and
/// coordinates folded into a point.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDraft {
    pub title: String,
    pub description: String,
    pub address: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: i64,
    pub currency: String,
    pub area: f64,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub ward_id: Uuid,
    pub location: Option<GeoPoint>,
    pub amenity_ids: Vec<Uuid>,
    pub image_urls: Vec<String>,
}

impl ListingDraft {
    pub fn validate(self) -> Result<ValidatedDraft, CoreError> {
        let title = required("title", &self.title)?;
        let address = required("address", &self.address)?;
        if self.price < 0 {
            return Err(CoreError::InvalidDraft(format!(
                "price {} must not be negative",
                self.price
            )));
        }
        if !self.area.is_finite() || self.area < 0.0 {
            return Err(CoreError::InvalidDraft(format!(
                "area {} must be a non-negative number",
                self.area
            )));
        }
        let location = match (self.latitude, self.longitude) {
            (None, None) => None,
            (Some(latitude), Some(longitude)) => Some(GeoPoint::new(latitude, longitude)?),
            _ => {
                return Err(CoreError::InvalidDraft(
                    "latitude and longitude must be given together".to_string(),
                ));
            }
        };
        let currency = self.currency.trim().to_ascii_uppercase();
        let currency = if currency.is_empty() {
            default_currency()
        } else {
            currency
        };

        let mut amenity_ids = self.amenity_ids;
        amenity_ids.sort_unstable();
        amenity_ids.dedup();
        let image_urls = self
            .image_urls
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect();

        Ok(ValidatedDraft {
            title,
            description: self.description.trim().to_string(),
            address,
            property_type: self.property_type,
            listing_type: self.listing_type,
            price: self.price,
            currency,
            area: self.area + 0.0,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            ward_id: self.ward_id,
            location,
            amenity_ids,
            image_urls,
        })
    }
}

fn required(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidDraft(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
