//! Navigation resolver
//!
//! Builds the three drill-down views from live data. Stats only count active
//! apartments, and a status outside available/reserved/sold is reported as
//! `other`.

use std::collections::HashMap;
use std::sync::Arc;

use shared::models::{
    ApartmentUnit, Building, BuildingSummary, BuildingView, EntityRef, FloorView, FloorZone,
    ImageType, ImageView, NavigationView, OverviewView, OverviewZone, Project, ProjectSummary,
    StatusCounts, Zone, ZoneShape, ZoneStyle,
};
use sqlx::SqlitePool;

use super::LevelContext;
use crate::db::repository::{apartment, project, zone, zone_image};
use crate::error::ServiceResult;
use crate::geometry;
use crate::images::ImageStore;

#[derive(Clone)]
pub struct NavigationResolver {
    pool: SqlitePool,
    images: Arc<dyn ImageStore>,
    prefetch_floor_count: u32,
}

fn project_summary(project: Project) -> ProjectSummary {
    ProjectSummary {
        id: project.id,
        title: project.title,
        location: project.location,
    }
}

fn building_summary(building: &Building) -> BuildingSummary {
    BuildingSummary {
        id: building.id,
        name: building.name.clone(),
        identifier: building.identifier.clone(),
    }
}

fn zone_shape(zone: &Zone, fallback_label: impl FnOnce() -> String) -> ZoneShape {
    ZoneShape {
        zone_id: zone.id,
        label: zone.label.clone().unwrap_or_else(fallback_label),
        path: geometry::outline_path(&zone.polygon),
        polygon: zone.polygon.clone(),
        bounding_box: zone.bounding_box,
    }
}

fn configured_style(zone: &Zone) -> ZoneStyle {
    ZoneStyle::configured(
        zone.fill_color.as_deref(),
        zone.stroke_color.as_deref(),
        zone.hover_color.as_deref(),
    )
}

impl NavigationResolver {
    pub fn new(pool: SqlitePool, images: Arc<dyn ImageStore>, prefetch_floor_count: u32) -> Self {
        Self {
            pool,
            images,
            prefetch_floor_count,
        }
    }

    pub async fn resolve(
        &self,
        project_id: i64,
        context: LevelContext,
    ) -> ServiceResult<NavigationView> {
        match context {
            LevelContext::Overview => self.resolve_overview(project_id).await.map(NavigationView::Overview),
            LevelContext::Building { building_id } => self
                .resolve_building(project_id, building_id)
                .await
                .map(NavigationView::Building),
            LevelContext::Floor {
                building_id,
                floor_number,
            } => self
                .resolve_floor(project_id, building_id, floor_number)
                .await
                .map(NavigationView::Floor),
        }
    }

    async fn background(
        &self,
        project_id: i64,
        context: &LevelContext,
    ) -> ServiceResult<Option<ImageView>> {
        let image =
            zone_image::find_for_slot(&self.pool, project_id, context, ImageType::Background)
                .await?;
        Ok(image.map(|img| ImageView {
            url: self.images.url_for(&img.storage_key),
            viewbox: img.viewbox,
            width: img.width,
            height: img.height,
        }))
    }

    pub async fn resolve_overview(&self, project_id: i64) -> ServiceResult<OverviewView> {
        let project = project::require_project(&self.pool, project_id).await?;
        let context = LevelContext::Overview;

        let buildings: HashMap<i64, Building> = project::list_buildings(&self.pool, project_id)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();
        let active_buildings = buildings.values().filter(|b| b.is_active).count();
        let stats = apartment::building_stats(&self.pool, project_id).await?;
        let zones = zone::list_for_context(&self.pool, project_id, &context, true).await?;

        let mut views = Vec::with_capacity(zones.len());
        for zone in &zones {
            let EntityRef::Building(building_id) = zone.entity else {
                continue;
            };
            let Some(building) = buildings.get(&building_id) else {
                tracing::warn!(zone_id = zone.id, building_id, "Zone bound to a missing building");
                continue;
            };
            views.push(OverviewZone {
                shape: zone_shape(zone, || building.name.clone()),
                building: building_summary(building),
                style: configured_style(zone),
                stats: stats.get(&building_id).copied().unwrap_or_default(),
            });
        }

        Ok(OverviewView {
            project: project_summary(project),
            has_multiple_buildings: active_buildings > 1,
            image: self.background(project_id, &context).await?,
            zones: views,
        })
    }

    pub async fn resolve_building(
        &self,
        project_id: i64,
        building_id: i64,
    ) -> ServiceResult<BuildingView> {
        let project = project::require_project(&self.pool, project_id).await?;
        let building = project::require_building(&self.pool, project_id, building_id).await?;
        let context = LevelContext::Building { building_id };

        let stats = apartment::floor_stats(&self.pool, building_id).await?;
        let zones = zone::list_for_context(&self.pool, project_id, &context, true).await?;

        let views = zones
            .iter()
            .filter_map(|zone| {
                let EntityRef::FloorNumber(floor_number) = zone.entity else {
                    return None;
                };
                Some(FloorZone {
                    shape: zone_shape(zone, || format!("Floor {floor_number}")),
                    floor_number,
                    style: configured_style(zone),
                    stats: stats.get(&floor_number).copied().unwrap_or_default(),
                })
            })
            .collect();

        Ok(BuildingView {
            project: project_summary(project),
            building: building_summary(&building),
            image: self.background(project_id, &context).await?,
            zones: views,
            prefetch_floors: apartment::prefetch_floors(
                &self.pool,
                building_id,
                self.prefetch_floor_count,
            )
            .await?,
        })
    }

    pub async fn resolve_floor(
        &self,
        project_id: i64,
        building_id: i64,
        floor_number: i32,
    ) -> ServiceResult<FloorView> {
        let project = project::require_project(&self.pool, project_id).await?;
        let building = project::require_building(&self.pool, project_id, building_id).await?;
        let context = LevelContext::Floor {
            building_id,
            floor_number,
        };

        let apartments = apartment::active_on_floor(&self.pool, building_id, floor_number).await?;
        let mut stats = StatusCounts::default();
        for a in apartments.values() {
            stats.record(&a.status, 1);
        }

        let zones = zone::list_for_context(&self.pool, project_id, &context, true).await?;
        let units = zones
            .iter()
            .filter_map(|zone| {
                let EntityRef::Apartment(apartment_id) = zone.entity else {
                    return None;
                };
                // Inactive or deleted apartments are not shown
                let a = apartments.get(&apartment_id)?;
                Some(ApartmentUnit {
                    shape: zone_shape(zone, || a.apartment_number.clone()),
                    apartment_id,
                    apartment_number: a.apartment_number.clone(),
                    status: a.status.clone(),
                    price: a.price,
                    area_total: a.area_total,
                    area_living: a.area_living,
                    bedrooms: a.bedrooms,
                    bathrooms: a.bathrooms,
                    has_balcony: a.has_balcony,
                    style: ZoneStyle::for_status(&a.status),
                })
            })
            .collect();

        Ok(FloorView {
            project: project_summary(project),
            building: building_summary(&building),
            floor_number,
            image: self.background(project_id, &context).await?,
            units,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;
    use serde_json::json;
    use shared::error::ErrorCode;
    use shared::models::{ApartmentStatus, ZoneCreate, ZoneType};

    fn square(x: f64, y: f64) -> Vec<serde_json::Value> {
        vec![json!([x, y]), json!([x + 10.0, y]), json!([x + 10.0, y + 10.0]), json!([x, y + 10.0])]
    }

    fn zone(zone_type: ZoneType, building_id: Option<i64>, entity: EntityRef) -> ZoneCreate {
        ZoneCreate {
            zone_type,
            building_id,
            entity,
            polygon: square(0.0, 0.0),
            label: None,
            fill_color: None,
            stroke_color: None,
            hover_color: None,
            sort_order: None,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_empty_overview() {
        let fx = Fixture::new().await;
        let view = fx.navigation.resolver().resolve_overview(fx.project_id).await.unwrap();
        assert!(view.zones.is_empty());
        assert!(view.image.is_none());
        assert!(view.has_multiple_buildings);
        assert_eq!(view.project.title, "Riverside");
    }

    #[tokio::test]
    async fn test_overview_stats_per_building() {
        let fx = Fixture::new().await;
        for building in [fx.building_a, fx.building_b] {
            fx.zones
                .create(fx.project_id, zone(ZoneType::BuildingBlock, None, EntityRef::Building(building)))
                .await
                .unwrap();
        }

        let view = fx.navigation.resolver().resolve_overview(fx.project_id).await.unwrap();
        assert_eq!(view.zones.len(), 2);

        let a = view.zones.iter().find(|z| z.building.id == fx.building_a).unwrap();
        assert_eq!(a.shape.label, "Tower A");
        assert_eq!(a.stats.counts.available, 3);
        assert_eq!(a.stats.counts.total, 3);
        assert_eq!((a.stats.min_floor, a.stats.max_floor), (Some(1), Some(2)));
        assert_eq!(a.style.fill, ZoneStyle::DEFAULT_FILL);

        let b = view.zones.iter().find(|z| z.building.id == fx.building_b).unwrap();
        assert_eq!(b.stats.counts.sold, 1);
        assert_eq!(b.stats.counts.available, 0);
    }

    #[tokio::test]
    async fn test_building_view_floor_stats_and_prefetch() {
        let fx = Fixture::new().await;
        fx.zones
            .create(
                fx.project_id,
                zone(ZoneType::FloorStrip, Some(fx.building_a), EntityRef::FloorNumber(1)),
            )
            .await
            .unwrap();

        let view = fx
            .navigation
            .resolver()
            .resolve_building(fx.project_id, fx.building_a)
            .await
            .unwrap();
        assert_eq!(view.zones.len(), 1);
        assert_eq!(view.zones[0].shape.label, "Floor 1");
        assert_eq!(view.zones[0].stats.available, 2);
        assert_eq!(view.prefetch_floors, vec![1, 2]);
        assert_eq!(view.zones[0].shape.path, "M0,0 L10,0 L10,10 L0,10 Z");
    }

    #[tokio::test]
    async fn test_floor_view_styles_follow_status() {
        let fx = Fixture::new().await;
        for apartment in [fx.apartment_a1, fx.apartment_a2] {
            fx.zones
                .create(
                    fx.project_id,
                    zone(ZoneType::ApartmentUnit, Some(fx.building_a), EntityRef::Apartment(apartment)),
                )
                .await
                .unwrap();
        }
        fx.apartments
            .update_status(fx.apartment_a2, ApartmentStatus::Other("on_hold".into()))
            .await
            .unwrap();

        let view = fx
            .navigation
            .resolver()
            .resolve_floor(fx.project_id, fx.building_a, 1)
            .await
            .unwrap();
        assert_eq!(view.units.len(), 2);
        assert_eq!(view.stats.available, 1);
        assert_eq!(view.stats.other, 1);
        assert_eq!(view.stats.total, 2);

        let held = view.units.iter().find(|u| u.apartment_id == fx.apartment_a2).unwrap();
        assert_eq!(held.style, ZoneStyle::for_status(&ApartmentStatus::Other("on_hold".into())));
        assert_eq!(held.shape.label, "1B");
    }

    #[tokio::test]
    async fn test_inactive_apartment_hidden_from_floor() {
        let fx = Fixture::new().await;
        fx.zones
            .create(
                fx.project_id,
                zone(ZoneType::ApartmentUnit, Some(fx.building_a), EntityRef::Apartment(fx.apartment_a1)),
            )
            .await
            .unwrap();
        fx.apartments
            .update(
                fx.apartment_a1,
                shared::models::ApartmentUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let view = fx
            .navigation
            .resolver()
            .resolve_floor(fx.project_id, fx.building_a, 1)
            .await
            .unwrap();
        assert!(view.units.is_empty());
        assert_eq!(view.stats.total, 1);
    }

    #[tokio::test]
    async fn test_unknown_project_and_building() {
        let fx = Fixture::new().await;
        let resolver = fx.navigation.resolver();

        let err = resolver.resolve_overview(9999).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ProjectNotFound));

        let err = resolver.resolve_building(fx.project_id, 9999).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::BuildingNotFound));
    }

    #[tokio::test]
    async fn test_apartment_write_invalidates_aggregating_views() {
        let fx = Fixture::new().await;
        let floor = LevelContext::Floor {
            building_id: fx.building_a,
            floor_number: 1,
        };
        let building_b = LevelContext::Building {
            building_id: fx.building_b,
        };
        for ctx in [LevelContext::Overview, floor, building_b] {
            fx.navigation.resolve(fx.project_id, ctx).await.unwrap();
        }

        fx.apartments
            .update_status(fx.apartment_a1, ApartmentStatus::Sold)
            .await
            .unwrap();

        assert!(!fx.navigation.contains(fx.project_id, &floor));
        assert!(!fx.navigation.contains(fx.project_id, &LevelContext::Overview));
        assert!(fx.navigation.contains(fx.project_id, &building_b));
    }
}
