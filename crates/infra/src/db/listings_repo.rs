use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use realty_core::domain::draft::{ValidatedDraft, LISTING_LIFETIME_DAYS};
use realty_core::domain::listing::{Listing, ListingStatus, ListingType, PropertyType};
use realty_core::types::geo::{GeoPoint, GeoRadius, EARTH_RADIUS_KM};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use super::DbPool;
use crate::search::translator::{FetchPlan, Predicate, SortKey};
use crate::store::{ListingPage, ListingStore, ListingWriter, StoreError};

const LISTING_COLUMNS: &str = r#"
    SELECT
        l.id,
        p.title,
        p.description,
        p.address,
        p.property_type,
        l.listing_type,
        l.price,
        l.currency,
        p.area,
        p.bedrooms,
        p.bathrooms,
        w.id AS ward_id,
        w.name AS ward_name,
        d.id AS district_id,
        d.name AS district_name,
        pr.id AS province_id,
        pr.name AS province_name,
        p.latitude,
        p.longitude,
        ARRAY(
            SELECT pa.amenity_id
            FROM property_amenities pa
            WHERE pa.property_id = p.id
            ORDER BY pa.amenity_id
        ) AS amenity_ids,
        (
            SELECT pi.url
            FROM property_images pi
            WHERE pi.property_id = p.id
            ORDER BY pi.is_primary DESC, pi.sort_order ASC
            LIMIT 1
        ) AS primary_image_url,
        l.is_featured,
        l.status,
        l.view_count,
        p.owner_id,
        l.created_at,
        l.updated_at,
        l.end_date,
        l.is_deleted,
        l.deleted_at
"#;

const LISTING_JOINS: &str = r#"
    FROM listings l
    JOIN properties p ON p.id = l.property_id
    JOIN wards w ON w.id = p.ward_id
    JOIN districts d ON d.id = w.district_id
    JOIN provinces pr ON pr.id = d.province_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    title: String,
    description: String,
    address: String,
    property_type: String,
    listing_type: String,
    price: i64,
    currency: String,
    area: f64,
    bedrooms: Option<i32>,
    bathrooms: Option<i32>,
    ward_id: Uuid,
    ward_name: String,
    district_id: Uuid,
    district_name: String,
    province_id: Uuid,
    province_name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    amenity_ids: Vec<Uuid>,
    primary_image_url: Option<String>,
    is_featured: bool,
    status: String,
    view_count: i64,
    owner_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ListingRow> for Listing {
    type Error = StoreError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        let location = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => {
                Some(GeoPoint::new(latitude, longitude).map_err(decode_error)?)
            }
            _ => None,
        };
        Ok(Listing {
            id: row.id,
            title: row.title,
            description: row.description,
            address: row.address,
            property_type: row.property_type.parse::<PropertyType>().map_err(decode_error)?,
            listing_type: row.listing_type.parse::<ListingType>().map_err(decode_error)?,
            price: row.price,
            currency: row.currency,
            area: row.area,
            bedrooms: room_count(row.bedrooms)?,
            bathrooms: room_count(row.bathrooms)?,
            ward_id: row.ward_id,
            ward_name: row.ward_name,
            district_id: row.district_id,
            district_name: row.district_name,
            province_id: row.province_id,
            province_name: row.province_name,
            location,
            amenity_ids: row.amenity_ids,
            primary_image_url: row.primary_image_url,
            is_featured: row.is_featured,
            status: row.status.parse::<ListingStatus>().map_err(decode_error)?,
            view_count: row.view_count,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            end_date: row.end_date,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        })
    }
}

fn decode_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::Decode(err.to_string())
}

fn room_count(value: Option<i32>) -> Result<Option<u32>, StoreError> {
    value
        .map(|count| u32::try_from(count).map_err(|_| decode_error(format!("room count {count}"))))
        .transpose()
}

/// Escapes `LIKE` metacharacters so the keyword matches literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn order_by(sort: SortKey) -> &'static str {
    match sort {
        SortKey::Price { descending: true } => " ORDER BY l.price DESC, l.id ASC",
        SortKey::Price { descending: false } => " ORDER BY l.price ASC, l.id ASC",
        SortKey::Area { descending: true } => " ORDER BY p.area DESC, l.id ASC",
        SortKey::Area { descending: false } => " ORDER BY p.area ASC, l.id ASC",
        SortKey::CreatedAt { descending: true } => " ORDER BY l.created_at DESC, l.id ASC",
        SortKey::CreatedAt { descending: false } => " ORDER BY l.created_at ASC, l.id ASC",
        SortKey::Relevance => " ORDER BY l.is_featured DESC, l.created_at DESC, l.id ASC",
    }
}

fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Status(status) => {
            builder.push(" AND l.status = ").push_bind(status.as_str());
        }
        Predicate::NotDeleted => {
            builder.push(" AND l.is_deleted = FALSE");
        }
        Predicate::Keyword(needle) => {
            let pattern = format!("%{}%", escape_like(needle));
            builder
                .push(" AND (p.title ILIKE ")
                .push_bind(pattern.clone())
                .push(r" ESCAPE '\' OR p.description ILIKE ")
                .push_bind(pattern.clone())
                .push(r" ESCAPE '\' OR p.address ILIKE ")
                .push_bind(pattern)
                .push(r" ESCAPE '\')");
        }
        Predicate::ListingType(kind) => {
            builder.push(" AND l.listing_type = ").push_bind(kind.as_str());
        }
        Predicate::PropertyType(kind) => {
            builder.push(" AND p.property_type = ").push_bind(kind.as_str());
        }
        Predicate::MinPrice(min) => {
            builder.push(" AND l.price >= ").push_bind(*min);
        }
        Predicate::MaxPrice(max) => {
            builder.push(" AND l.price <= ").push_bind(*max);
        }
        Predicate::MinArea(min) => {
            builder.push(" AND p.area >= ").push_bind(*min);
        }
        Predicate::MaxArea(max) => {
            builder.push(" AND p.area <= ").push_bind(*max);
        }
        Predicate::MinBedrooms(min) => {
            builder.push(" AND p.bedrooms >= ").push_bind(bound_i32(*min));
        }
        Predicate::MinBathrooms(min) => {
            builder.push(" AND p.bathrooms >= ").push_bind(bound_i32(*min));
        }
        Predicate::Ward(id) => {
            builder.push(" AND w.id = ").push_bind(*id);
        }
        Predicate::District(id) => {
            builder.push(" AND d.id = ").push_bind(*id);
        }
        Predicate::Province(id) => {
            builder.push(" AND pr.id = ").push_bind(*id);
        }
        Predicate::AllAmenities(ids) => {
            let required = i64::try_from(ids.len()).unwrap_or(i64::MAX);
            builder
                .push(
                    " AND (SELECT COUNT(DISTINCT pa.amenity_id) FROM property_amenities pa \
                     WHERE pa.property_id = p.id AND pa.amenity_id = ANY(",
                )
                .push_bind(ids.clone())
                .push(")) = ")
                .push_bind(required);
        }
        Predicate::Featured(flag) => {
            builder.push(" AND l.is_featured = ").push_bind(*flag);
        }
    }
}

fn push_geo(builder: &mut QueryBuilder<'_, Postgres>, geo: &GeoRadius) {
    let latitude = geo.center.latitude;
    builder
        .push(" AND p.latitude IS NOT NULL AND p.longitude IS NOT NULL AND 2 * ")
        .push_bind(EARTH_RADIUS_KM)
        .push(" * ASIN(LEAST(1.0, SQRT(POWER(SIN(RADIANS(p.latitude - ")
        .push_bind(latitude)
        .push(") / 2), 2) + COS(RADIANS(")
        .push_bind(latitude)
        .push(")) * COS(RADIANS(p.latitude)) * POWER(SIN(RADIANS(p.longitude - ")
        .push_bind(geo.center.longitude)
        .push(") / 2), 2)))) <= ")
        .push_bind(geo.radius_km);
}

fn bound_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn bound_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn push_conditions(builder: &mut QueryBuilder<'_, Postgres>, plan: &FetchPlan) {
    builder.push(" WHERE TRUE");
    for predicate in &plan.predicates {
        push_predicate(builder, predicate);
    }
    if let Some(geo) = &plan.geo {
        push_geo(builder, geo);
    }
}

fn count_query(plan: &FetchPlan) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*)");
    builder.push(LISTING_JOINS);
    push_conditions(&mut builder, plan);
    builder
}

fn page_query(plan: &FetchPlan) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(LISTING_COLUMNS);
    builder.push(LISTING_JOINS);
    push_conditions(&mut builder, plan);
    builder
        .push(order_by(plan.sort))
        .push(" LIMIT ")
        .push_bind(bound_i64(plan.limit))
        .push(" OFFSET ")
        .push_bind(bound_i64(plan.offset));
    builder
}

fn owner_query(owner_id: &str, offset: u64, limit: u64) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(LISTING_COLUMNS);
    builder
        .push(LISTING_JOINS)
        .push(" WHERE p.owner_id = ")
        .push_bind(owner_id.to_string())
        .push(" AND l.is_deleted = FALSE ORDER BY l.created_at DESC, l.id ASC LIMIT ")
        .push_bind(bound_i64(limit))
        .push(" OFFSET ")
        .push_bind(bound_i64(offset));
    builder
}

/// Fails with [`StoreError::UnknownWard`] before any insert touches the row
/// the foreign key would reject.
async fn ensure_ward(conn: &mut PgConnection, ward_id: Uuid) -> Result<(), StoreError> {
    let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM wards WHERE id = $1")
        .bind(ward_id)
        .fetch_optional(&mut *conn)
        .await?;
    found.map(|_| ()).ok_or(StoreError::UnknownWard(ward_id))
}

/// Rewrites the amenity and image child rows of a property.
async fn replace_property_children(
    conn: &mut PgConnection,
    property_id: Uuid,
    draft: &ValidatedDraft,
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM property_amenities WHERE property_id = $1")
        .bind(property_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM property_images WHERE property_id = $1")
        .bind(property_id)
        .execute(&mut *conn)
        .await?;
    if !draft.amenity_ids.is_empty() {
        sqlx::query(
            "INSERT INTO property_amenities (property_id, amenity_id) SELECT $1, UNNEST($2::uuid[])",
        )
        .bind(property_id)
        .bind(draft.amenity_ids.clone())
        .execute(&mut *conn)
        .await?;
    }
    for (position, url) in draft.image_urls.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO property_images (id, property_id, url, is_primary, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(property_id)
        .bind(url)
        .bind(position == 0)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

fn latitude(draft: &ValidatedDraft) -> Option<f64> {
    draft.location.map(|point| point.latitude)
}

fn longitude(draft: &ValidatedDraft) -> Option<f64> {
    draft.location.map(|point| point.longitude)
}

const SNAPSHOT_ISOLATION: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

/// Postgres-backed listing store. Fetch plans become one count query and
/// one page query over the same conditions, run in a single read-only
/// repeatable-read transaction.
#[derive(Debug, Clone)]
pub struct PgListingStore {
    pool: DbPool,
}

impl PgListingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn query(&self, plan: &FetchPlan) -> Result<ListingPage, StoreError> {
        // Both statements read one snapshot, so the total agrees with the page.
        let mut tx = self.pool.begin().await?;
        sqlx::query(SNAPSHOT_ISOLATION).execute(&mut *tx).await?;

        let mut counter = count_query(plan);
        let total: i64 = counter.build_query_scalar().fetch_one(&mut *tx).await?;

        let mut pager = page_query(plan);
        let rows: Vec<ListingRow> = pager.build_query_as().fetch_all(&mut *tx).await?;
        tx.commit().await?;

        let items = rows
            .into_iter()
            .map(Listing::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListingPage {
            items,
            total_count: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(LISTING_COLUMNS);
        builder
            .push(LISTING_JOINS)
            .push(" WHERE l.id = ")
            .push_bind(id)
            .push(" AND l.is_deleted = FALSE");
        let row: Option<ListingRow> = builder.build_query_as().fetch_optional(&self.pool).await?;
        row.map(Listing::try_from).transpose()
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<ListingPage, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(SNAPSHOT_ISOLATION).execute(&mut *tx).await?;
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM listings l
            JOIN properties p ON p.id = l.property_id
            WHERE p.owner_id = $1 AND l.is_deleted = FALSE
            "#,
        )
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;
        let rows: Vec<ListingRow> = owner_query(owner_id, offset, limit)
            .build_query_as()
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        let items = rows
            .into_iter()
            .map(Listing::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ListingPage {
            items,
            total_count: u64::try_from(total).unwrap_or(0),
        })
    }
}

#[async_trait]
impl ListingWriter for PgListingStore {
    async fn create(
        &self,
        owner_id: &str,
        draft: &ValidatedDraft,
        now: DateTime<Utc>,
    ) -> Result<Listing, StoreError> {
        let mut tx = self.pool.begin().await?;
        ensure_ward(&mut tx, draft.ward_id).await?;

        let property_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO properties (
                id, title, description, address, property_type, area, bedrooms,
                bathrooms, ward_id, latitude, longitude, owner_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            "#,
        )
        .bind(property_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.address)
        .bind(draft.property_type.as_str())
        .bind(draft.area)
        .bind(draft.bedrooms.map(bound_i32))
        .bind(draft.bathrooms.map(bound_i32))
        .bind(draft.ward_id)
        .bind(latitude(draft))
        .bind(longitude(draft))
        .bind(owner_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        replace_property_children(&mut tx, property_id, draft).await?;

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO listings (
                id, property_id, listing_type, price, currency, status, end_date,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            "#,
        )
        .bind(id)
        .bind(property_id)
        .bind(draft.listing_type.as_str())
        .bind(draft.price)
        .bind(&draft.currency)
        .bind(ListingStatus::Active.as_str())
        .bind(now + Duration::days(LISTING_LIFETIME_DAYS))
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::Decode(format!("created listing {id} not readable")))
    }

    async fn update(&self, id: Uuid, draft: &ValidatedDraft) -> Result<Option<Listing>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let property_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE listings
            SET listing_type = $1, price = $2, currency = $3, updated_at = NOW()
            WHERE id = $4 AND is_deleted = FALSE
            RETURNING property_id
            "#,
        )
        .bind(draft.listing_type.as_str())
        .bind(draft.price)
        .bind(&draft.currency)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(property_id) = property_id else {
            return Ok(None);
        };
        ensure_ward(&mut tx, draft.ward_id).await?;

        sqlx::query(
            r#"
            UPDATE properties
            SET title = $1, description = $2, address = $3, property_type = $4, area = $5,
                bedrooms = $6, bathrooms = $7, ward_id = $8, latitude = $9, longitude = $10,
                updated_at = NOW()
            WHERE id = $11
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.address)
        .bind(draft.property_type.as_str())
        .bind(draft.area)
        .bind(draft.bedrooms.map(bound_i32))
        .bind(draft.bathrooms.map(bound_i32))
        .bind(draft.ward_id)
        .bind(latitude(draft))
        .bind(longitude(draft))
        .bind(property_id)
        .execute(&mut *tx)
        .await?;
        replace_property_children(&mut tx, property_id, draft).await?;
        tx.commit().await?;

        self.get_by_id(id).await
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE listings SET view_count = view_count + 1 WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_status(&self, id: Uuid, status: ListingStatus) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE listings
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND is_deleted = FALSE
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE listings
            SET is_deleted = TRUE, deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError> {
        let mut ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE listings
            SET status = $1, updated_at = $2
            WHERE status = $3
              AND is_deleted = FALSE
              AND end_date IS NOT NULL
              AND end_date < $2
            RETURNING id
            "#,
        )
        .bind(ListingStatus::Expired.as_str())
        .bind(now)
        .bind(ListingStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use realty_core::domain::filter::{SearchFilter, SortBy};

    use super::*;
    use crate::search::translator::{featured_plan, translate};

    fn plan(filter: SearchFilter) -> FetchPlan {
        translate(&filter.validate().unwrap())
    }

    #[test]
    fn count_and_page_share_a_snapshot() {
        assert!(SNAPSHOT_ISOLATION.starts_with("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ"));
        assert!(SNAPSHOT_ISOLATION.ends_with("READ ONLY"));
    }

    #[test]
    fn owner_query_includes_every_status() {
        let sql = owner_query("agent-7", 20, 10).sql().to_string();
        assert!(sql.contains("p.owner_id = $1 AND l.is_deleted = FALSE"));
        assert!(sql.ends_with("ORDER BY l.created_at DESC, l.id ASC LIMIT $2 OFFSET $3"));
        assert!(!sql.contains("l.status ="));
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\now"), "50\\%\\_off\\\\now");
        assert_eq!(escape_like("river view"), "river view");
    }

    #[test]
    fn every_sort_breaks_ties_by_id() {
        for sort in [
            SortKey::Price { descending: true },
            SortKey::Price { descending: false },
            SortKey::Area { descending: true },
            SortKey::Area { descending: false },
            SortKey::CreatedAt { descending: true },
            SortKey::CreatedAt { descending: false },
            SortKey::Relevance,
        ] {
            assert!(order_by(sort).ends_with("l.id ASC"));
        }
        assert_eq!(
            order_by(SortKey::Relevance),
            " ORDER BY l.is_featured DESC, l.created_at DESC, l.id ASC"
        );
    }

    #[test]
    fn eligibility_leads_every_query() {
        let sql = count_query(&featured_plan(5)).sql().to_string();
        let status = sql.find("l.status = $1").unwrap();
        let deleted = sql.find("l.is_deleted = FALSE").unwrap();
        let featured = sql.find("l.is_featured = $2").unwrap();
        assert!(status < deleted && deleted < featured);
    }

    #[test]
    fn page_query_binds_limit_and_offset_last() {
        let sql = page_query(&plan(SearchFilter {
            listing_type: Some(ListingType::Rent),
            sort_by: SortBy::Price,
            page_number: 3,
            page_size: 10,
            ..SearchFilter::default()
        }))
        .sql()
        .to_string();
        assert!(sql.contains("l.listing_type = $2"));
        assert!(sql.contains("ORDER BY l.price DESC, l.id ASC LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn keyword_and_amenities_become_subclauses() {
        let sql = count_query(&plan(SearchFilter {
            keyword: Some("Garden".to_string()),
            amenity_ids: vec![Uuid::from_u128(1), Uuid::from_u128(2)],
            ..SearchFilter::default()
        }))
        .sql()
        .to_string();
        assert!(sql.contains("p.title ILIKE $2"));
        assert!(sql.contains("p.address ILIKE $4"));
        assert!(sql.contains("pa.amenity_id = ANY($5)) = $6"));
    }

    #[test]
    fn geo_radius_is_filtered_in_sql() {
        let sql = count_query(&plan(SearchFilter {
            latitude: Some(10.77),
            longitude: Some(106.70),
            radius_km: Some(2.0),
            ..SearchFilter::default()
        }))
        .sql()
        .to_string();
        assert!(sql.contains("p.latitude IS NOT NULL"));
        assert!(sql.contains("ASIN(LEAST(1.0, SQRT("));
        assert!(sql.trim_end().ends_with("<= $6"));
    }
}
