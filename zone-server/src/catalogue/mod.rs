//! Catalogue listing of available apartments
//!
//! Pages are cached under version-rotated keys: any apartment write bumps the
//! `catalogue` version and every previously cached page is abandoned.

use std::sync::Arc;

use shared::models::{Apartment, CataloguePage, CatalogueQuery, CatalogueSort, SortDirection};
use sqlx::SqlitePool;

use crate::error::ServiceResult;
use crate::navigation::VersionedCache;
use crate::utils::validation::validate_non_negative;

pub type CatalogueCache = VersionedCache<Arc<CataloguePage>>;

/// Version domain of the catalogue cache
pub const CATALOGUE_DOMAIN: &str = "catalogue";

pub const DEFAULT_PER_PAGE: u32 = 12;
pub const MAX_PER_PAGE: u32 = 500;

const FILTER: &str = "FROM apartments \
     WHERE is_active = 1 AND status = 'available' \
     AND (?1 IS NULL OR project_id = ?1) \
     AND (?2 IS NULL OR building_id = ?2) \
     AND (?3 IS NULL OR floor_number = ?3) \
     AND (?4 IS NULL OR bedrooms = ?4) \
     AND (?5 IS NULL OR price >= ?5) \
     AND (?6 IS NULL OR price <= ?6) \
     AND (?7 IS NULL OR area_total >= ?7) \
     AND (?8 IS NULL OR area_total <= ?8)";

fn order_clause(sort: CatalogueSort, dir: Option<SortDirection>) -> String {
    let (column, default_dir) = match sort {
        CatalogueSort::Default => ("created_at", SortDirection::Desc),
        CatalogueSort::Price => ("price", SortDirection::Asc),
        CatalogueSort::Area => ("area_total", SortDirection::Asc),
        CatalogueSort::Floor => ("floor_number", SortDirection::Asc),
        CatalogueSort::Bedrooms => ("bedrooms", SortDirection::Asc),
    };
    let dir = match dir.unwrap_or(default_dir) {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    format!("ORDER BY {column} {dir}, id {dir}")
}

/// Page and page size after defaults and clamping
fn pagination(query: &CatalogueQuery) -> (u32, u32) {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    (page, per_page)
}

#[derive(Clone)]
pub struct CatalogueService {
    pool: SqlitePool,
    cache: Arc<CatalogueCache>,
}

impl CatalogueService {
    pub fn new(pool: SqlitePool, cache: Arc<CatalogueCache>) -> Self {
        Self { pool, cache }
    }

    pub fn cache(&self) -> &CatalogueCache {
        &self.cache
    }

    pub async fn list(&self, query: CatalogueQuery) -> ServiceResult<Arc<CataloguePage>> {
        validate_non_negative(query.min_price, "min_price")?;
        validate_non_negative(query.max_price, "max_price")?;
        validate_non_negative(query.min_area, "min_area")?;
        validate_non_negative(query.max_area, "max_area")?;

        let (page, per_page) = pagination(&query);
        let normalized = CatalogueQuery {
            page: Some(page),
            per_page: Some(per_page),
            ..query
        };
        let query_key = serde_json::to_string(&normalized)?;

        self.cache
            .get_or_try_insert_with(&query_key, || async {
                self.fetch(&normalized, page, per_page).await.map(Arc::new)
            })
            .await
    }

    async fn fetch(
        &self,
        query: &CatalogueQuery,
        page: u32,
        per_page: u32,
    ) -> ServiceResult<CataloguePage> {
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {FILTER}"))
            .bind(query.project_id)
            .bind(query.building_id)
            .bind(query.floor_number)
            .bind(query.bedrooms)
            .bind(query.min_price)
            .bind(query.max_price)
            .bind(query.min_area)
            .bind(query.max_area)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT id, project_id, building_id, floor_number, apartment_number, status, price, \
             area_total, area_living, bedrooms, bathrooms, has_balcony, is_active, sort_order, \
             created_at, updated_at {FILTER} {} LIMIT ?9 OFFSET ?10",
            order_clause(query.sort_by.unwrap_or_default(), query.sort_dir)
        );
        let offset = i64::from(page - 1) * i64::from(per_page);
        let items = sqlx::query_as::<_, Apartment>(&sql)
            .bind(query.project_id)
            .bind(query.building_id)
            .bind(query.floor_number)
            .bind(query.bedrooms)
            .bind(query.min_price)
            .bind(query.max_price)
            .bind(query.min_area)
            .bind(query.max_area)
            .bind(i64::from(per_page))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(total, page, per_page, "Catalogue page computed");
        Ok(CataloguePage {
            items,
            total,
            page,
            per_page,
        })
    }
}
