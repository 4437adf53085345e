use std::cmp::Ordering;

use realty_core::domain::filter::{LocationScope, SortBy, SortOrder, ValidatedFilter};
use realty_core::domain::listing::{Listing, ListingStatus, ListingType, PropertyType};
use realty_core::types::geo::GeoRadius;
use uuid::Uuid;

/// One conjunctive constraint on a listing.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Status(ListingStatus),
    NotDeleted,
    /// Lowercased needle matched against title, description or address.
    Keyword(String),
    ListingType(ListingType),
    PropertyType(PropertyType),
    MinPrice(i64),
    MaxPrice(i64),
    MinArea(f64),
    MaxArea(f64),
    MinBedrooms(u32),
    MinBathrooms(u32),
    Ward(Uuid),
    District(Uuid),
    Province(Uuid),
    /// The listing must carry every amenity in the set.
    AllAmenities(Vec<Uuid>),
    Featured(bool),
}

impl Predicate {
    pub fn matches(&self, listing: &Listing) -> bool {
        match self {
            Predicate::Status(status) => listing.status == *status,
            Predicate::NotDeleted => !listing.is_deleted,
            Predicate::Keyword(needle) => [&listing.title, &listing.description, &listing.address]
                .into_iter()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
            Predicate::ListingType(kind) => listing.listing_type == *kind,
            Predicate::PropertyType(kind) => listing.property_type == *kind,
            Predicate::MinPrice(min) => listing.price >= *min,
            Predicate::MaxPrice(max) => listing.price <= *max,
            Predicate::MinArea(min) => listing.area >= *min,
            Predicate::MaxArea(max) => listing.area <= *max,
            Predicate::MinBedrooms(min) => listing.bedrooms.is_some_and(|value| value >= *min),
            Predicate::MinBathrooms(min) => listing.bathrooms.is_some_and(|value| value >= *min),
            Predicate::Ward(id) => listing.ward_id == *id,
            Predicate::District(id) => listing.district_id == *id,
            Predicate::Province(id) => listing.province_id == *id,
            Predicate::AllAmenities(ids) => ids.iter().all(|id| listing.amenity_ids.contains(id)),
            Predicate::Featured(flag) => listing.is_featured == *flag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Price { descending: bool },
    Area { descending: bool },
    CreatedAt { descending: bool },
    /// Featured first, then newest first.
    Relevance,
}

impl SortKey {
    pub fn from_order(order: SortOrder) -> Self {
        let descending = order.descending;
        match order.by {
            SortBy::Price => SortKey::Price { descending },
            SortBy::Area => SortKey::Area { descending },
            SortBy::CreatedAt => SortKey::CreatedAt { descending },
            SortBy::Relevance => SortKey::Relevance,
        }
    }

    /// Total order over listings: primary key, then id ascending.
    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let primary = match self {
            SortKey::Price { descending } => directed(a.price.cmp(&b.price), *descending),
            SortKey::Area { descending } => directed(a.area.total_cmp(&b.area), *descending),
            SortKey::CreatedAt { descending } => {
                directed(a.created_at.cmp(&b.created_at), *descending)
            }
            SortKey::Relevance => b
                .is_featured
                .cmp(&a.is_featured)
                .then_with(|| b.created_at.cmp(&a.created_at)),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

fn directed(ordering: Ordering, descending: bool) -> Ordering {
    if descending {
        ordering.reverse()
    } else {
        ordering
    }
}

/// Concrete fetch against the listing store.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    pub predicates: Vec<Predicate>,
    /// Applied after every predicate.
    pub geo: Option<GeoRadius>,
    pub sort: SortKey,
    pub offset: u64,
    pub limit: u64,
}

impl FetchPlan {
    pub fn matches(&self, listing: &Listing) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(listing))
            && self.geo.is_none_or(|geo| listing.location.is_some_and(|point| geo.contains(point)))
    }
}

fn eligibility() -> Vec<Predicate> {
    vec![Predicate::Status(ListingStatus::Active), Predicate::NotDeleted]
}

pub fn translate(filter: &ValidatedFilter) -> FetchPlan {
    let mut predicates = eligibility();

    if let Some(keyword) = &filter.keyword {
        predicates.push(Predicate::Keyword(keyword.clone()));
    }
    if let Some(kind) = filter.listing_type {
        predicates.push(Predicate::ListingType(kind));
    }
    if let Some(kind) = filter.property_type {
        predicates.push(Predicate::PropertyType(kind));
    }
    if let Some(price) = &filter.price {
        predicates.extend(price.min.map(Predicate::MinPrice));
        predicates.extend(price.max.map(Predicate::MaxPrice));
    }
    if let Some(area) = &filter.area {
        predicates.extend(area.min.map(Predicate::MinArea));
        predicates.extend(area.max.map(Predicate::MaxArea));
    }
    predicates.extend(filter.min_bedrooms.map(Predicate::MinBedrooms));
    predicates.extend(filter.min_bathrooms.map(Predicate::MinBathrooms));
    match filter.location {
        Some(LocationScope::Ward(id)) => predicates.push(Predicate::Ward(id)),
        Some(LocationScope::District(id)) => predicates.push(Predicate::District(id)),
        Some(LocationScope::Province(id)) => predicates.push(Predicate::Province(id)),
        None => {}
    }
    if !filter.amenity_ids.is_empty() {
        predicates.push(Predicate::AllAmenities(filter.amenity_ids.clone()));
    }
    predicates.extend(filter.is_featured.map(Predicate::Featured));

    FetchPlan {
        predicates,
        geo: filter.geo,
        sort: SortKey::from_order(filter.sort),
        offset: filter.offset(),
        limit: u64::from(filter.page_size),
    }
}

pub fn featured_plan(count: u32) -> FetchPlan {
    let mut predicates = eligibility();
    predicates.push(Predicate::Featured(true));
    FetchPlan {
        predicates,
        geo: None,
        sort: SortKey::CreatedAt { descending: true },
        offset: 0,
        limit: u64::from(count),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use realty_core::domain::draft::ListingDraft;
    use realty_core::domain::listing::{Listing, ListingStatus, ListingType, PropertyType};
    use uuid::Uuid;

    pub const WARD: Uuid = Uuid::from_u128(0xa1);
    pub const OTHER_WARD: Uuid = Uuid::from_u128(0xa2);
    pub const DISTRICT: Uuid = Uuid::from_u128(0xb1);
    pub const PROVINCE: Uuid = Uuid::from_u128(0xc1);

    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    pub fn listing(n: u128) -> Listing {
        let created_at = epoch() + Duration::minutes(n as i64);
        Listing {
            id: Uuid::from_u128(n),
            title: format!("Listing {n}"),
            description: "Bright unit close to the river".to_string(),
            address: format!("{n} Le Loi"),
            property_type: PropertyType::Apartment,
            listing_type: ListingType::Rent,
            price: 7_000_000,
            currency: "VND".to_string(),
            area: 55.0,
            bedrooms: Some(2),
            bathrooms: Some(1),
            ward_id: WARD,
            ward_name: "Ben Nghe".to_string(),
            district_id: DISTRICT,
            district_name: "District 1".to_string(),
            province_id: PROVINCE,
            province_name: "Ho Chi Minh City".to_string(),
            location: None,
            amenity_ids: Vec::new(),
            primary_image_url: None,
            is_featured: false,
            status: ListingStatus::Active,
            view_count: 0,
            owner_id: "owner-1".to_string(),
            created_at,
            updated_at: created_at,
            end_date: None,
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn draft(ward_id: Uuid) -> ListingDraft {
        ListingDraft {
            title: "Corner shophouse".to_string(),
            description: "Two frontages".to_string(),
            address: "12 Hai Ba Trung".to_string(),
            property_type: PropertyType::Shop,
            listing_type: ListingType::Rent,
            price: 45_000_000,
            currency: "VND".to_string(),
            area: 120.0,
            bedrooms: None,
            bathrooms: Some(2),
            ward_id,
            latitude: None,
            longitude: None,
            amenity_ids: Vec::new(),
            image_urls: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use realty_core::domain::filter::{SearchFilter, SortBy};
    use realty_core::types::geo::GeoPoint;

    use super::fixtures::{listing, DISTRICT, OTHER_WARD, WARD};
    use super::*;

    fn plan_for(filter: SearchFilter) -> FetchPlan {
        translate(&filter.validate().unwrap())
    }

    #[test]
    fn eligibility_is_always_first() {
        let plan = plan_for(SearchFilter::default());
        assert_eq!(plan.predicates, eligibility());
        assert_eq!(plan.sort, SortKey::Relevance);
        assert_eq!((plan.offset, plan.limit), (0, 20));
    }

    #[test]
    fn only_most_specific_location_is_emitted() {
        let plan = plan_for(SearchFilter {
            ward_id: Some(WARD),
            district_id: Some(DISTRICT),
            ..SearchFilter::default()
        });
        assert!(plan.predicates.contains(&Predicate::Ward(WARD)));
        assert!(!plan
            .predicates
            .iter()
            .any(|predicate| matches!(predicate, Predicate::District(_))));
    }

    #[test]
    fn keyword_matches_any_text_field_case_insensitively() {
        let predicate = Predicate::Keyword("le loi".to_string());
        assert!(predicate.matches(&listing(1)));
        let predicate = Predicate::Keyword("river".to_string());
        assert!(predicate.matches(&listing(1)));
        let predicate = Predicate::Keyword("penthouse".to_string());
        assert!(!predicate.matches(&listing(1)));
    }

    #[test]
    fn amenities_require_every_id() {
        let pool = Uuid::from_u128(0x51);
        let gym = Uuid::from_u128(0x52);
        let mut item = listing(1);
        item.amenity_ids = vec![pool];
        let predicate = Predicate::AllAmenities(vec![pool, gym]);
        assert!(!predicate.matches(&item));
        item.amenity_ids.push(gym);
        assert!(predicate.matches(&item));
    }

    #[test]
    fn inactive_and_deleted_listings_never_match() {
        let plan = plan_for(SearchFilter::default());
        let mut sold = listing(1);
        sold.status = ListingStatus::Sold;
        let mut deleted = listing(2);
        deleted.is_deleted = true;
        assert!(!plan.matches(&sold));
        assert!(!plan.matches(&deleted));
        assert!(plan.matches(&listing(3)));
    }

    #[test]
    fn geo_filter_excludes_listings_without_location() {
        let plan = plan_for(SearchFilter {
            latitude: Some(10.77),
            longitude: Some(106.70),
            radius_km: Some(2.0),
            ..SearchFilter::default()
        });
        let mut near = listing(1);
        near.location = Some(GeoPoint::new(10.78, 106.70).unwrap());
        let mut far = listing(2);
        far.location = Some(GeoPoint::new(21.02, 105.85).unwrap());
        assert!(plan.matches(&near));
        assert!(!plan.matches(&far));
        assert!(!plan.matches(&listing(3)));
    }

    #[test]
    fn min_rooms_reject_unknown_counts() {
        let mut item = listing(1);
        item.bedrooms = None;
        assert!(!Predicate::MinBedrooms(1).matches(&item));
        assert!(Predicate::MinBathrooms(1).matches(&item));
    }

    #[test]
    fn every_sort_key_honours_its_direction() {
        let shaped = |n: u128, price: i64, area: f64| {
            let mut item = listing(n);
            item.price = price;
            item.area = area;
            item
        };
        let items = vec![shaped(1, 300, 20.0), shaped(2, 100, 60.0), shaped(3, 200, 40.0)];
        let cases = [
            (SortBy::Price, false, [2, 3, 1]),
            (SortBy::Price, true, [1, 3, 2]),
            (SortBy::Area, false, [1, 3, 2]),
            (SortBy::Area, true, [2, 3, 1]),
            (SortBy::CreatedAt, false, [1, 2, 3]),
            (SortBy::CreatedAt, true, [3, 2, 1]),
        ];
        for (sort_by, sort_descending, expected) in cases {
            let plan = plan_for(SearchFilter {
                sort_by,
                sort_descending,
                ..SearchFilter::default()
            });
            let mut sorted = items.clone();
            sorted.sort_by(|a, b| plan.sort.compare(a, b));
            let ids: Vec<u128> = sorted.iter().map(|item| item.id.as_u128()).collect();
            assert_eq!(ids, expected, "{sort_by:?} descending={sort_descending}");
        }
    }

    #[test]
    fn ties_break_by_id_ascending() {
        let mut a = listing(2);
        let mut b = listing(1);
        a.price = 5;
        b.price = 5;
        let key = SortKey::Price { descending: true };
        assert_eq!(key.compare(&b, &a), Ordering::Less);
        assert_eq!(key.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn relevance_puts_featured_then_newest_first() {
        let old_featured = {
            let mut item = listing(1);
            item.is_featured = true;
            item
        };
        let newest = listing(9);
        let older = listing(5);
        let mut items = vec![older.clone(), newest.clone(), old_featured.clone()];
        items.sort_by(|a, b| SortKey::Relevance.compare(a, b));
        let ids: Vec<_> = items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![old_featured.id, newest.id, older.id]);
    }

    #[test]
    fn featured_plan_is_newest_first_and_bounded() {
        let plan = featured_plan(5);
        assert!(plan.predicates.contains(&Predicate::Featured(true)));
        assert_eq!(plan.sort, SortKey::CreatedAt { descending: true });
        assert_eq!(plan.limit, 5);
        let mut other = listing(1);
        other.ward_id = OTHER_WARD;
        other.is_featured = true;
        assert!(plan.matches(&other));
    }
}
