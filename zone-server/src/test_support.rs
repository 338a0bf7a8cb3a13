//! Seeded in-memory state for service tests
//!
//! One project with two buildings:
//! - building A: a1, a2 on floor 1 and a3 on floor 2, all available
//! - building B: b1 on floor 1, sold

use shared::models::{ApartmentCreate, ApartmentStatus, BuildingCreate, ProjectCreate};
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::catalogue::CatalogueService;
use crate::core::{Config, ServerState};
use crate::db::DbService;
use crate::db::repository::{ApartmentRepository, ZoneRepository, project};
use crate::images::ZoneImageManager;
use crate::navigation::NavigationCache;

pub struct Fixture {
    pub state: ServerState,
    pub pool: SqlitePool,
    pub project_id: i64,
    pub building_a: i64,
    pub building_b: i64,
    pub apartment_a1: i64,
    pub apartment_a2: i64,
    pub apartment_a3: i64,
    pub apartment_b1: i64,
    pub zones: ZoneRepository,
    pub apartments: ApartmentRepository,
    pub navigation: NavigationCache,
    pub catalogue: CatalogueService,
    pub images: ZoneImageManager,
    /// Uploads land here; removed on drop
    pub dir: TempDir,
}

fn apartment(floor_number: i32, number: &str, status: ApartmentStatus) -> ApartmentCreate {
    ApartmentCreate {
        floor_number,
        apartment_number: number.to_string(),
        status: Some(status),
        price: Some(150_000.0 + f64::from(floor_number) * 10_000.0),
        area_total: Some(80.0),
        area_living: Some(60.0),
        bedrooms: Some(2),
        bathrooms: Some(1),
        has_balcony: Some(floor_number > 1),
        is_active: None,
        sort_order: None,
    }
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_overrides(dir.path(), 3000);
        let db = DbService::in_memory().await.unwrap();
        let state = ServerState::new(config, db);
        let pool = state.pool().clone();

        let project = project::create_project(
            &pool,
            ProjectCreate {
                title: "Riverside".into(),
                location: Some("Valencia".into()),
            },
        )
        .await
        .unwrap();
        let building_a = project::create_building(
            &pool,
            project.id,
            BuildingCreate {
                name: "Tower A".into(),
                identifier: "A".into(),
                sort_order: Some(1),
            },
        )
        .await
        .unwrap();
        let building_b = project::create_building(
            &pool,
            project.id,
            BuildingCreate {
                name: "Tower B".into(),
                identifier: "B".into(),
                sort_order: Some(2),
            },
        )
        .await
        .unwrap();

        let apartments = state.apartments.clone();
        let a1 = apartments
            .create(project.id, building_a.id, apartment(1, "1A", ApartmentStatus::Available))
            .await
            .unwrap();
        let a2 = apartments
            .create(project.id, building_a.id, apartment(1, "1B", ApartmentStatus::Available))
            .await
            .unwrap();
        let a3 = apartments
            .create(project.id, building_a.id, apartment(2, "2A", ApartmentStatus::Available))
            .await
            .unwrap();
        let b1 = apartments
            .create(project.id, building_b.id, apartment(1, "1A", ApartmentStatus::Sold))
            .await
            .unwrap();

        Self {
            pool,
            project_id: project.id,
            building_a: building_a.id,
            building_b: building_b.id,
            apartment_a1: a1.id,
            apartment_a2: a2.id,
            apartment_a3: a3.id,
            apartment_b1: b1.id,
            zones: state.zones.clone(),
            apartments,
            navigation: state.navigation.clone(),
            catalogue: state.catalogue.clone(),
            images: state.images.clone(),
            state,
            dir,
        }
    }
}
