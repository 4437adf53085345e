use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::geo::GeoPoint;

macro_rules! text_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let trimmed = value.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| CoreError::InvalidEnum($label, trimmed.to_string()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(ListingStatus, "listing status", {
    Draft => "draft",
    Active => "active",
    Pending => "pending",
    Sold => "sold",
    Rented => "rented",
    Expired => "expired",
    Suspended => "suspended",
    Cancelled => "cancelled",
});

text_enum!(ListingType, "listing type", {
    Sale => "sale",
    Rent => "rent",
});

text_enum!(PropertyType, "property type", {
    Apartment => "apartment",
    House => "house",
    Villa => "villa",
    Townhouse => "townhouse",
    Land => "land",
    Commercial => "commercial",
    Office => "office",
    Warehouse => "warehouse",
    Shop => "shop",
    Other => "other",
});

/// Authoritative listing record as read from the store, joined with its
/// property and location names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub id: Uuid,
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
    pub ward_name: String,
    pub district_id: Uuid,
    pub district_name: String,
    pub province_id: Uuid,
    pub province_name: String,
    pub location: Option<GeoPoint>,
    pub amenity_ids: Vec<Uuid>,
    pub primary_image_url: Option<String>,
    pub is_featured: bool,
    pub status: ListingStatus,
    pub view_count: i64,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Listing {
    pub fn is_publicly_visible(&self) -> bool {
        self.status == ListingStatus::Active && !self.is_deleted
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSummary {
    pub id: Uuid,
    pub title: String,
    pub address: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: i64,
    pub currency: String,
    pub area: f64,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub primary_image_url: Option<String>,
    pub is_featured: bool,
    pub status: ListingStatus,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub ward_name: String,
    pub district_name: String,
    pub province_name: String,
}

impl From<&Listing> for ListingSummary {
    fn from(listing: &Listing) -> Self {
        Self {
            id: listing.id,
            title: listing.title.clone(),
            address: listing.address.clone(),
            property_type: listing.property_type,
            listing_type: listing.listing_type,
            price: listing.price,
            currency: listing.currency.clone(),
            area: listing.area,
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            primary_image_url: listing.primary_image_url.clone(),
            is_featured: listing.is_featured,
            status: listing.status,
            view_count: listing.view_count,
            created_at: listing.created_at,
            ward_name: listing.ward_name.clone(),
            district_name: listing.district_name.clone(),
            province_name: listing.province_name.clone(),
        }
    }
}
