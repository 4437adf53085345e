use std::fmt::{Display, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::listing::{ListingType, PropertyType};
use crate::error::CoreError;
use crate::types::geo::GeoRadius;
use crate::types::range::ValueRange;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Price,
    Area,
    CreatedAt,
    #[default]
    Relevance,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Price => "price",
            SortBy::Area => "area",
            SortBy::CreatedAt => "created_at",
            SortBy::Relevance => "relevance",
        }
    }
}

impl FromStr for SortBy {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "");
        match normalized.as_str() {
            "price" => Ok(SortBy::Price),
            "area" => Ok(SortBy::Area),
            "createdat" => Ok(SortBy::CreatedAt),
            "" | "relevance" => Ok(SortBy::Relevance),
            _ => Err(CoreError::InvalidEnum("sort", value.trim().to_string())),
        }
    }
}

/// Location constraint. Only the most specific level supplied is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationScope {
    Ward(Uuid),
    District(Uuid),
    Province(Uuid),
}

impl LocationScope {
    pub fn most_specific(
        ward_id: Option<Uuid>,
        district_id: Option<Uuid>,
        province_id: Option<Uuid>,
    ) -> Option<Self> {
        ward_id
            .map(LocationScope::Ward)
            .or(district_id.map(LocationScope::District))
            .or(province_id.map(LocationScope::Province))
    }
}

/// Search constraints as supplied by a caller. Call [`SearchFilter::validate`]
/// before using it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    pub keyword: Option<String>,
    pub listing_type: Option<ListingType>,
    pub property_type: Option<PropertyType>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub ward_id: Option<Uuid>,
    pub district_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub amenity_ids: Vec<Uuid>,
    pub is_featured: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
    pub sort_by: SortBy,
    pub sort_descending: bool,
    pub page_number: i64,
    pub page_size: i64,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            keyword: None,
            listing_type: None,
            property_type: None,
            min_price: None,
            max_price: None,
            min_area: None,
            max_area: None,
            bedrooms: None,
            bathrooms: None,
            ward_id: None,
            district_id: None,
            province_id: None,
            amenity_ids: Vec::new(),
            is_featured: None,
            latitude: None,
            longitude: None,
            radius_km: None,
            sort_by: SortBy::Relevance,
            sort_descending: true,
            page_number: 1,
            page_size: i64::from(DEFAULT_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub by: SortBy,
    /// Always `false` for [`SortBy::Relevance`], which has a fixed order.
    pub descending: bool,
}

/// A filter that passed validation, in normalized form.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFilter {
    pub keyword: Option<String>,
    pub listing_type: Option<ListingType>,
    pub property_type: Option<PropertyType>,
    pub price: Option<ValueRange<i64>>,
    pub area: Option<ValueRange<f64>>,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<u32>,
    pub location: Option<LocationScope>,
    pub amenity_ids: Vec<Uuid>,
    pub is_featured: Option<bool>,
    pub geo: Option<GeoRadius>,
    pub sort: SortOrder,
    pub page_number: u32,
    pub page_size: u32,
}

impl SearchFilter {
    pub fn validate(&self) -> Result<ValidatedFilter, CoreError> {
        let price = ValueRange::from_bounds("price", self.min_price, self.max_price)?;
        let area = ValueRange::from_bounds("area", self.min_area, self.max_area)?;
        let geo = GeoRadius::from_parts(self.latitude, self.longitude, self.radius_km)?;

        let keyword = self
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase);

        let mut amenity_ids = self.amenity_ids.clone();
        amenity_ids.sort_unstable();
        amenity_ids.dedup();

        let descending = self.sort_by != SortBy::Relevance && self.sort_descending;

        Ok(ValidatedFilter {
            keyword,
            listing_type: self.listing_type,
            property_type: self.property_type,
            price,
            area,
            min_bedrooms: self.bedrooms,
            min_bathrooms: self.bathrooms,
            location: LocationScope::most_specific(
                self.ward_id,
                self.district_id,
                self.province_id,
            ),
            amenity_ids,
            is_featured: self.is_featured,
            geo,
            sort: SortOrder {
                by: self.sort_by,
                descending,
            },
            page_number: clamp_page_number(self.page_number),
            page_size: clamp_page_size(self.page_size),
        })
    }
}

impl ValidatedFilter {
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number - 1) * u64::from(self.page_size)
    }

    /// Canonical text form used to seed cache keys. Fields appear in a fixed
    /// order and absent optionals are omitted.
    pub fn canonical_key(&self) -> String {
        let mut key = CanonicalWriter::default();
        if let Some(keyword) = &self.keyword {
            key.field("kw", escape(keyword));
        }
        if let Some(listing_type) = self.listing_type {
            key.field("lt", listing_type);
        }
        if let Some(property_type) = self.property_type {
            key.field("pt", property_type);
        }
        if let Some(price) = &self.price {
            key.optional("pmin", price.min);
            key.optional("pmax", price.max);
        }
        if let Some(area) = &self.area {
            key.optional("amin", area.min);
            key.optional("amax", area.max);
        }
        key.optional("bed", self.min_bedrooms);
        key.optional("bath", self.min_bathrooms);
        match self.location {
            Some(LocationScope::Ward(id)) => key.field("ward", id),
            Some(LocationScope::District(id)) => key.field("district", id),
            Some(LocationScope::Province(id)) => key.field("province", id),
            None => {}
        }
        if !self.amenity_ids.is_empty() {
            let joined = self
                .amenity_ids
                .iter()
                .map(Uuid::to_string)
                .collect::<Vec<_>>()
                .join(",");
            key.field("amen", joined);
        }
        key.optional("feat", self.is_featured);
        if let Some(geo) = &self.geo {
            key.field("lat", geo.center.latitude);
            key.field("lon", geo.center.longitude);
            key.field("rad", geo.radius_km);
        }
        key.field("sort", self.sort.by.as_str());
        if self.sort.descending {
            key.field("desc", true);
        }
        key.field("page", self.page_number);
        key.field("size", self.page_size);
        key.finish()
    }
}

#[derive(Default)]
struct CanonicalWriter {
    out: String,
}

impl CanonicalWriter {
    fn field(&mut self, name: &str, value: impl Display) {
        if !self.out.is_empty() {
            self.out.push('&');
        }
        let _ = write!(self.out, "{name}={value}");
    }

    fn optional<T: Display>(&mut self, name: &str, value: Option<T>) {
        if let Some(value) = value {
            self.field(name, value);
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '&' | '=') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub fn clamp_page_number(value: i64) -> u32 {
    u32::try_from(value.max(1)).unwrap_or(u32::MAX)
}

pub fn clamp_page_size(value: i64) -> u32 {
    let clamped = value.clamp(1, i64::from(MAX_PAGE_SIZE));
    u32::try_from(clamped).unwrap_or(DEFAULT_PAGE_SIZE)
}
