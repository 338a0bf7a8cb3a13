//! Apartment Repository
//!
//! Apartments are owned by the sales side; this module only carries what
//! navigation needs: availability aggregates, floor listings, and the writes
//! (status, price, active flag) whose effects must reach the caches.

use std::collections::HashMap;
use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Apartment, ApartmentCreate, ApartmentStatus, ApartmentUpdate, BuildingStats, StatusCounts,
};
use shared::util::now_millis;
use sqlx::SqlitePool;

use super::project::require_building;
use crate::catalogue::CatalogueCache;
use crate::error::ServiceResult;
use crate::navigation::{NavScope, NavigationCache};
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_non_negative, validate_required_text};

const APARTMENT_COLUMNS: &str = "id, project_id, building_id, floor_number, apartment_number, \
     status, price, area_total, area_living, bedrooms, bathrooms, has_balcony, is_active, \
     sort_order, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> ServiceResult<Option<Apartment>> {
    let apartment = sqlx::query_as::<_, Apartment>(&format!(
        "SELECT {APARTMENT_COLUMNS} FROM apartments WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(apartment)
}

pub async fn require(pool: &SqlitePool, id: i64) -> ServiceResult<Apartment> {
    find_by_id(pool, id).await?.ok_or_else(|| {
        AppError::new(ErrorCode::ApartmentNotFound)
            .with_detail("apartment_id", id)
            .into()
    })
}

/// Active apartments of one floor, keyed by id
pub async fn active_on_floor(
    pool: &SqlitePool,
    building_id: i64,
    floor_number: i32,
) -> ServiceResult<HashMap<i64, Apartment>> {
    let rows = sqlx::query_as::<_, Apartment>(&format!(
        "SELECT {APARTMENT_COLUMNS} FROM apartments \
         WHERE building_id = ? AND floor_number = ? AND is_active = 1"
    ))
    .bind(building_id)
    .bind(floor_number)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|a| (a.id, a)).collect())
}

/// Per-building availability of a project, active apartments only
pub async fn building_stats(
    pool: &SqlitePool,
    project_id: i64,
) -> ServiceResult<HashMap<i64, BuildingStats>> {
    let rows: Vec<(i64, String, i64, i32, i32)> = sqlx::query_as(
        "SELECT building_id, status, COUNT(*), MIN(floor_number), MAX(floor_number) \
         FROM apartments WHERE project_id = ? AND is_active = 1 \
         GROUP BY building_id, status",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    let mut stats: HashMap<i64, BuildingStats> = HashMap::new();
    for (building_id, status, count, min_floor, max_floor) in rows {
        let entry = stats.entry(building_id).or_default();
        entry.counts.record(&ApartmentStatus::from(status), count);
        entry.min_floor = Some(entry.min_floor.map_or(min_floor, |m| m.min(min_floor)));
        entry.max_floor = Some(entry.max_floor.map_or(max_floor, |m| m.max(max_floor)));
    }
    Ok(stats)
}

/// Per-floor availability of a building, active apartments only
pub async fn floor_stats(
    pool: &SqlitePool,
    building_id: i64,
) -> ServiceResult<HashMap<i32, StatusCounts>> {
    let rows: Vec<(i32, String, i64)> = sqlx::query_as(
        "SELECT floor_number, status, COUNT(*) FROM apartments \
         WHERE building_id = ? AND is_active = 1 GROUP BY floor_number, status",
    )
    .bind(building_id)
    .fetch_all(pool)
    .await?;

    let mut stats: HashMap<i32, StatusCounts> = HashMap::new();
    for (floor_number, status, count) in rows {
        stats
            .entry(floor_number)
            .or_default()
            .record(&ApartmentStatus::from(status), count);
    }
    Ok(stats)
}

/// First `limit` distinct floors with active apartments, ascending
pub async fn prefetch_floors(
    pool: &SqlitePool,
    building_id: i64,
    limit: u32,
) -> ServiceResult<Vec<i32>> {
    let floors: Vec<i32> = sqlx::query_scalar(
        "SELECT DISTINCT floor_number FROM apartments \
         WHERE building_id = ? AND is_active = 1 ORDER BY floor_number LIMIT ?",
    )
    .bind(building_id)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;
    Ok(floors)
}

fn validate_measures(
    price: Option<f64>,
    area_total: Option<f64>,
    area_living: Option<f64>,
) -> Result<(), AppError> {
    validate_non_negative(price, "price")?;
    validate_non_negative(area_total, "area_total")?;
    validate_non_negative(area_living, "area_living")?;
    Ok(())
}

/// Apartment writes with cache invalidation
#[derive(Clone)]
pub struct ApartmentRepository {
    pool: SqlitePool,
    navigation: NavigationCache,
    catalogue: Arc<CatalogueCache>,
}

impl ApartmentRepository {
    pub fn new(pool: SqlitePool, navigation: NavigationCache, catalogue: Arc<CatalogueCache>) -> Self {
        Self {
            pool,
            navigation,
            catalogue,
        }
    }

    pub async fn create(
        &self,
        project_id: i64,
        building_id: i64,
        data: ApartmentCreate,
    ) -> ServiceResult<Apartment> {
        require_building(&self.pool, project_id, building_id).await?;
        validate_required_text(&data.apartment_number, "apartment_number", MAX_SHORT_TEXT_LEN)?;
        validate_measures(data.price, data.area_total, data.area_living)?;

        let now = now_millis();
        let status = data.status.unwrap_or(ApartmentStatus::Available);
        let result: Result<i64, sqlx::Error> = sqlx::query_scalar(
            "INSERT INTO apartments (project_id, building_id, floor_number, apartment_number, \
             status, price, area_total, area_living, bedrooms, bathrooms, has_balcony, \
             is_active, sort_order, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(project_id)
        .bind(building_id)
        .bind(data.floor_number)
        .bind(data.apartment_number.trim())
        .bind(status.as_str())
        .bind(data.price)
        .bind(data.area_total)
        .bind(data.area_living)
        .bind(data.bedrooms)
        .bind(data.bathrooms)
        .bind(data.has_balcony.unwrap_or(false))
        .bind(data.is_active.unwrap_or(true))
        .bind(data.sort_order.unwrap_or(0))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        let id = match result {
            Ok(id) => id,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::conflict(format!(
                    "Apartment {} already exists on floor {}",
                    data.apartment_number.trim(),
                    data.floor_number
                ))
                .with_detail("field", "apartment_number")
                .into());
            }
            Err(e) => return Err(e.into()),
        };

        let apartment = require(&self.pool, id).await?;
        self.invalidate(&apartment);
        Ok(apartment)
    }

    pub async fn update(&self, id: i64, data: ApartmentUpdate) -> ServiceResult<Apartment> {
        let before = require(&self.pool, id).await?;
        validate_measures(data.price, data.area_total, data.area_living)?;

        sqlx::query(
            "UPDATE apartments SET \
             status = COALESCE(?1, status), \
             price = COALESCE(?2, price), \
             area_total = COALESCE(?3, area_total), \
             area_living = COALESCE(?4, area_living), \
             bedrooms = COALESCE(?5, bedrooms), \
             bathrooms = COALESCE(?6, bathrooms), \
             has_balcony = COALESCE(?7, has_balcony), \
             is_active = COALESCE(?8, is_active), \
             sort_order = COALESCE(?9, sort_order), \
             updated_at = ?10 \
             WHERE id = ?11",
        )
        .bind(data.status.as_ref().map(ApartmentStatus::as_str))
        .bind(data.price)
        .bind(data.area_total)
        .bind(data.area_living)
        .bind(data.bedrooms)
        .bind(data.bathrooms)
        .bind(data.has_balcony)
        .bind(data.is_active)
        .bind(data.sort_order)
        .bind(now_millis())
        .bind(id)
        .execute(&self.pool)
        .await?;

        let after = require(&self.pool, id).await?;
        self.invalidate(&after);
        if before.status != after.status {
            tracing::info!(
                apartment_id = id,
                from = %before.status,
                to = %after.status,
                "Apartment status changed"
            );
        }
        Ok(after)
    }

    pub async fn update_status(&self, id: i64, status: ApartmentStatus) -> ServiceResult<Apartment> {
        self.update(
            id,
            ApartmentUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    /// Deletes the apartment together with the zones bound to it
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let apartment = require(&self.pool, id).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM zones WHERE entity_kind = 'apartment' AND entity_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM apartments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.invalidate(&apartment);
        Ok(())
    }

    /// Floor view of the apartment, plus the building and overview views
    /// whose stats aggregate it, plus the catalogue listing.
    fn invalidate(&self, apartment: &Apartment) {
        let p = apartment.project_id;
        let b = apartment.building_id;
        self.navigation
            .invalidate(&NavScope::floor(p, b, Some(apartment.floor_number)));
        self.navigation.invalidate(&NavScope::building(p, Some(b)));
        self.navigation.invalidate(&NavScope::overview(p));
        self.catalogue.bump();
    }
}
