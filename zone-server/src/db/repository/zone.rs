//! Zone Repository
//!
//! Polygons and bounding boxes are stored as JSON text. The entity binding is
//! split into `entity_kind` / `entity_id` so that the unique binding index can
//! cover it.

use std::collections::HashSet;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    BoundingBox, BulkDeleteFilter, EntityKind, EntityRef, ImportItemError, ImportReport,
    LevelType, TemplateReplication, Zone, ZoneCreate, ZoneImport, ZoneImportItem, ZoneType,
    ZoneUpdate, ZoneWrite,
};
use shared::util::now_millis;
use sqlx::{Executor, Sqlite, SqlitePool};

use super::{apartment, project};
use crate::audit_log;
use crate::error::{ServiceError, ServiceResult};
use crate::geometry::{self, PreparedPolygon};
use crate::navigation::{LevelContext, NavScope, NavigationCache};
use crate::utils::validation::{
    MAX_NAME_LEN, blank_to_none, validate_color, validate_optional_text,
};

const ZONE_COLUMNS: &str = "id, project_id, level_type, zone_type, building_id, floor_number, \
     entity_kind, entity_id, polygon, bounding_box, label, fill_color, stroke_color, \
     hover_color, is_active, sort_order, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ZoneRow {
    id: i64,
    project_id: i64,
    level_type: LevelType,
    zone_type: ZoneType,
    building_id: Option<i64>,
    floor_number: Option<i32>,
    entity_kind: EntityKind,
    entity_id: i64,
    polygon: String,
    bounding_box: String,
    label: Option<String>,
    fill_color: Option<String>,
    stroke_color: Option<String>,
    hover_color: Option<String>,
    is_active: bool,
    sort_order: i32,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<ZoneRow> for Zone {
    type Error = ServiceError;

    fn try_from(row: ZoneRow) -> Result<Self, Self::Error> {
        let entity = EntityRef::from_parts(row.entity_kind, row.entity_id).ok_or_else(|| {
            ServiceError::Db(
                format!(
                    "zone {} has an invalid binding {}:{}",
                    row.id,
                    row.entity_kind.as_str(),
                    row.entity_id
                )
                .into(),
            )
        })?;
        let bounding_box: BoundingBox = serde_json::from_str(&row.bounding_box)?;

        Ok(Zone {
            id: row.id,
            project_id: row.project_id,
            level_type: row.level_type,
            zone_type: row.zone_type,
            building_id: row.building_id,
            floor_number: row.floor_number,
            entity,
            polygon: serde_json::from_str(&row.polygon)?,
            bounding_box,
            label: row.label,
            fill_color: row.fill_color,
            stroke_color: row.stroke_color,
            hover_color: row.hover_color,
            is_active: row.is_active,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_zones(rows: Vec<ZoneRow>) -> ServiceResult<Vec<Zone>> {
    rows.into_iter().map(Zone::try_from).collect()
}

/// Context a zone is drawn in
pub fn zone_context(zone: &Zone) -> Result<LevelContext, AppError> {
    LevelContext::new(zone.level_type, zone.building_id, zone.floor_number)
}

fn zone_scope(zone: &Zone) -> NavScope {
    NavScope::for_zone(
        zone.project_id,
        zone.zone_type,
        zone.building_id,
        zone.floor_number,
    )
}

/// Zones drawn in one context, ordered by sort_order, created_at, id
///
/// The overview lists every building_block zone of the project; building
/// and floor contexts filter by their identifiers.
pub async fn list_for_context(
    pool: &SqlitePool,
    project_id: i64,
    context: &LevelContext,
    active_only: bool,
) -> ServiceResult<Vec<Zone>> {
    let rows = sqlx::query_as::<_, ZoneRow>(&format!(
        "SELECT {ZONE_COLUMNS} FROM zones \
         WHERE project_id = ?1 AND level_type = ?2 AND building_id IS ?3 \
         AND (?4 IS NULL OR floor_number = ?4) \
         AND (?5 = 0 OR is_active = 1) \
         ORDER BY sort_order, created_at, id"
    ))
    .bind(project_id)
    .bind(context.level())
    .bind(context.building_id())
    .bind(context.floor_number())
    .bind(active_only)
    .fetch_all(pool)
    .await?;
    into_zones(rows)
}

pub async fn find_by_id(
    pool: &SqlitePool,
    project_id: i64,
    zone_id: i64,
) -> ServiceResult<Option<Zone>> {
    let row = sqlx::query_as::<_, ZoneRow>(&format!(
        "SELECT {ZONE_COLUMNS} FROM zones WHERE id = ? AND project_id = ?"
    ))
    .bind(zone_id)
    .bind(project_id)
    .fetch_optional(pool)
    .await?;
    row.map(Zone::try_from).transpose()
}

pub async fn require(pool: &SqlitePool, project_id: i64, zone_id: i64) -> ServiceResult<Zone> {
    find_by_id(pool, project_id, zone_id).await?.ok_or_else(|| {
        AppError::new(ErrorCode::ZoneNotFound)
            .with_detail("zone_id", zone_id)
            .into()
    })
}

/// Zone already holding this binding, other than `exclude`
async fn find_binding<'e, E>(
    executor: E,
    project_id: i64,
    zone_type: ZoneType,
    building_id: Option<i64>,
    entity: EntityRef,
    exclude: Option<i64>,
) -> ServiceResult<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM zones \
         WHERE project_id = ?1 AND zone_type = ?2 AND IFNULL(building_id, 0) = IFNULL(?3, 0) \
         AND entity_kind = ?4 AND entity_id = ?5 AND (?6 IS NULL OR id != ?6) \
         LIMIT 1",
    )
    .bind(project_id)
    .bind(zone_type)
    .bind(building_id)
    .bind(entity.kind())
    .bind(entity.raw_id())
    .bind(exclude)
    .fetch_optional(executor)
    .await?;
    Ok(id)
}

fn duplicate_binding(zone_type: ZoneType, entity: EntityRef, existing: Option<i64>) -> AppError {
    let mut err = AppError::with_message(
        ErrorCode::DuplicateEntityBinding,
        format!(
            "{} {} is already bound to another {zone_type} zone",
            entity.kind().as_str(),
            entity.raw_id()
        ),
    )
    .with_detail("field", "entity");
    if let Some(id) = existing {
        err = err.with_detail("zone_id", id);
    }
    err
}

/// Where a zone sits once its binding has been checked
#[derive(Debug, Clone, Copy)]
struct Placement {
    building_id: Option<i64>,
    floor_number: Option<i32>,
}

struct ZoneInsert<'a> {
    project_id: i64,
    zone_type: ZoneType,
    placement: Placement,
    entity: EntityRef,
    polygon: &'a PreparedPolygon,
    label: Option<&'a str>,
    fill_color: Option<&'a str>,
    stroke_color: Option<&'a str>,
    hover_color: Option<&'a str>,
    sort_order: i32,
    is_active: bool,
    now: i64,
}

async fn insert<'e, E>(executor: E, row: ZoneInsert<'_>) -> ServiceResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result: Result<i64, sqlx::Error> = sqlx::query_scalar(
        "INSERT INTO zones (project_id, level_type, zone_type, building_id, floor_number, \
         entity_kind, entity_id, polygon, bounding_box, label, fill_color, stroke_color, \
         hover_color, is_active, sort_order, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(row.project_id)
    .bind(row.zone_type.level())
    .bind(row.zone_type)
    .bind(row.placement.building_id)
    .bind(row.placement.floor_number)
    .bind(row.entity.kind())
    .bind(row.entity.raw_id())
    .bind(serde_json::to_string(&row.polygon.points)?)
    .bind(serde_json::to_string(&row.polygon.bounding_box)?)
    .bind(row.label)
    .bind(row.fill_color)
    .bind(row.stroke_color)
    .bind(row.hover_color)
    .bind(row.is_active)
    .bind(row.sort_order)
    .bind(row.now)
    .bind(row.now)
    .fetch_one(executor)
    .await;

    match result {
        Ok(id) => Ok(id),
        // Lost a race against the pre-check
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(duplicate_binding(row.zone_type, row.entity, None).into())
        }
        Err(e) => Err(e.into()),
    }
}

fn validate_style(
    label: &Option<String>,
    fill: &Option<String>,
    stroke: &Option<String>,
    hover: &Option<String>,
) -> Result<(), AppError> {
    validate_optional_text(label, "label", MAX_NAME_LEN)?;
    validate_color(fill, "fill_color")?;
    validate_color(stroke, "stroke_color")?;
    validate_color(hover, "hover_color")?;
    Ok(())
}

/// `None` keeps the current value, an empty string clears it
fn merge_text(update: Option<String>, current: Option<String>) -> Option<String> {
    match update {
        None => current,
        Some(v) => blank_to_none(Some(v)),
    }
}

fn invalid_template(message: impl Into<String>) -> AppError {
    AppError::with_message(ErrorCode::InvalidTemplate, message)
}

/// Zone writes with validation, cache invalidation and audit logging
#[derive(Clone)]
pub struct ZoneRepository {
    pool: SqlitePool,
    navigation: NavigationCache,
}

impl ZoneRepository {
    pub fn new(pool: SqlitePool, navigation: NavigationCache) -> Self {
        Self { pool, navigation }
    }

    pub async fn find_by_id(&self, project_id: i64, zone_id: i64) -> ServiceResult<Zone> {
        require(&self.pool, project_id, zone_id).await
    }

    pub async fn list_for_context(
        &self,
        project_id: i64,
        context: &LevelContext,
        active_only: bool,
    ) -> ServiceResult<Vec<Zone>> {
        project::require_project(&self.pool, project_id).await?;
        list_for_context(&self.pool, project_id, context, active_only).await
    }

    /// Check the binding against the zone type and derive building and floor
    ///
    /// building_block zones are project-wide; the other types need a building
    /// of the project. An apartment must live in that building, and its floor
    /// becomes the zone's floor.
    async fn resolve_placement(
        &self,
        project_id: i64,
        zone_type: ZoneType,
        building_id: Option<i64>,
        entity: EntityRef,
    ) -> ServiceResult<Placement> {
        if entity.kind() != zone_type.entity_kind() {
            return Err(AppError::with_message(
                ErrorCode::EntityKindMismatch,
                format!(
                    "{zone_type} zones bind to {}, not {}",
                    zone_type.entity_kind().as_str(),
                    entity.kind().as_str()
                ),
            )
            .with_detail("field", "entity")
            .into());
        }

        match (zone_type.requires_building(), building_id) {
            (false, Some(_)) => {
                return Err(AppError::with_message(
                    ErrorCode::InvalidZoneContext,
                    format!("{zone_type} zones are project-wide and take no building_id"),
                )
                .with_detail("field", "building_id")
                .into());
            }
            (true, None) => {
                return Err(AppError::with_message(
                    ErrorCode::InvalidZoneContext,
                    format!("{zone_type} zones require a building_id"),
                )
                .with_detail("field", "building_id")
                .into());
            }
            (true, Some(b)) => {
                project::require_building(&self.pool, project_id, b).await?;
            }
            (false, None) => {}
        }

        match entity {
            EntityRef::Building(id) => {
                project::require_building(&self.pool, project_id, id).await?;
                Ok(Placement {
                    building_id: None,
                    floor_number: None,
                })
            }
            EntityRef::FloorNumber(floor) => Ok(Placement {
                building_id,
                floor_number: Some(floor),
            }),
            EntityRef::Apartment(id) => {
                let apartment = apartment::require(&self.pool, id).await?;
                if apartment.project_id != project_id || Some(apartment.building_id) != building_id
                {
                    return Err(AppError::with_message(
                        ErrorCode::InvalidZoneContext,
                        format!("apartment {id} is not in building {building_id:?}"),
                    )
                    .with_detail("field", "entity")
                    .into());
                }
                Ok(Placement {
                    building_id,
                    floor_number: Some(apartment.floor_number),
                })
            }
        }
    }

    /// Active zones in the zone's context whose boxes intersect it
    async fn overlapping(&self, zone: &Zone) -> ServiceResult<Vec<i64>> {
        let context = zone_context(zone)?;
        let others = list_for_context(&self.pool, zone.project_id, &context, true).await?;
        Ok(others
            .iter()
            .filter(|other| {
                other.id != zone.id
                    && geometry::boxes_overlap(&other.bounding_box, &zone.bounding_box)
            })
            .map(|other| other.id)
            .collect())
    }

    async fn written(&self, zone: Zone) -> ServiceResult<ZoneWrite> {
        let overlapping_zone_ids = self.overlapping(&zone).await?;
        if !overlapping_zone_ids.is_empty() {
            tracing::debug!(
                zone_id = zone.id,
                overlaps = ?overlapping_zone_ids,
                "Zone overlaps other zones"
            );
        }
        Ok(ZoneWrite {
            zone,
            overlapping_zone_ids,
        })
    }

    pub async fn create(&self, project_id: i64, data: ZoneCreate) -> ServiceResult<ZoneWrite> {
        project::require_project(&self.pool, project_id).await?;
        let placement = self
            .resolve_placement(project_id, data.zone_type, data.building_id, data.entity)
            .await?;
        let polygon = geometry::prepare_polygon(&data.polygon)?;

        let label = blank_to_none(data.label);
        let fill = blank_to_none(data.fill_color);
        let stroke = blank_to_none(data.stroke_color);
        let hover = blank_to_none(data.hover_color);
        validate_style(&label, &fill, &stroke, &hover)?;

        if let Some(existing) = find_binding(
            &self.pool,
            project_id,
            data.zone_type,
            placement.building_id,
            data.entity,
            None,
        )
        .await?
        {
            return Err(duplicate_binding(data.zone_type, data.entity, Some(existing)).into());
        }

        let id = insert(
            &self.pool,
            ZoneInsert {
                project_id,
                zone_type: data.zone_type,
                placement,
                entity: data.entity,
                polygon: &polygon,
                label: label.as_deref(),
                fill_color: fill.as_deref(),
                stroke_color: stroke.as_deref(),
                hover_color: hover.as_deref(),
                sort_order: data.sort_order.unwrap_or(0),
                is_active: data.is_active.unwrap_or(true),
                now: now_millis(),
            },
        )
        .await?;

        let zone = require(&self.pool, project_id, id).await?;
        self.navigation.invalidate(&zone_scope(&zone));

        audit_log!(
            "zone.create",
            format!("zone:{id}"),
            format!(
                "project={project_id} type={} building={:?} floor={:?} entity={}:{}",
                zone.zone_type,
                zone.building_id,
                zone.floor_number,
                zone.entity.kind().as_str(),
                zone.entity.raw_id()
            )
        );

        self.written(zone).await
    }

    /// Partial update; the zone type and building are fixed at creation
    pub async fn update(
        &self,
        project_id: i64,
        zone_id: i64,
        data: ZoneUpdate,
    ) -> ServiceResult<ZoneWrite> {
        let before = require(&self.pool, project_id, zone_id).await?;

        let entity = data.entity.unwrap_or(before.entity);
        let placement = if data.entity.is_some() {
            let placement = self
                .resolve_placement(project_id, before.zone_type, before.building_id, entity)
                .await?;
            if let Some(existing) = find_binding(
                &self.pool,
                project_id,
                before.zone_type,
                placement.building_id,
                entity,
                Some(zone_id),
            )
            .await?
            {
                return Err(duplicate_binding(before.zone_type, entity, Some(existing)).into());
            }
            placement
        } else {
            Placement {
                building_id: before.building_id,
                floor_number: before.floor_number,
            }
        };

        let polygon = match &data.polygon {
            Some(raw) => geometry::prepare_polygon(raw)?,
            None => PreparedPolygon {
                points: before.polygon.clone(),
                bounding_box: before.bounding_box,
            },
        };

        let label = merge_text(data.label, before.label.clone());
        let fill = merge_text(data.fill_color, before.fill_color.clone());
        let stroke = merge_text(data.stroke_color, before.stroke_color.clone());
        let hover = merge_text(data.hover_color, before.hover_color.clone());
        validate_style(&label, &fill, &stroke, &hover)?;

        let result = sqlx::query(
            "UPDATE zones SET floor_number = ?, entity_kind = ?, entity_id = ?, polygon = ?, \
             bounding_box = ?, label = ?, fill_color = ?, stroke_color = ?, hover_color = ?, \
             sort_order = ?, is_active = ?, updated_at = ? \
             WHERE id = ? AND project_id = ?",
        )
        .bind(placement.floor_number)
        .bind(entity.kind())
        .bind(entity.raw_id())
        .bind(serde_json::to_string(&polygon.points)?)
        .bind(serde_json::to_string(&polygon.bounding_box)?)
        .bind(label)
        .bind(fill)
        .bind(stroke)
        .bind(hover)
        .bind(data.sort_order.unwrap_or(before.sort_order))
        .bind(data.is_active.unwrap_or(before.is_active))
        .bind(now_millis())
        .bind(zone_id)
        .bind(project_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(duplicate_binding(before.zone_type, entity, None).into());
            }
            Err(e) => return Err(e.into()),
        }

        let after = require(&self.pool, project_id, zone_id).await?;
        self.navigation.invalidate(&zone_scope(&before));
        self.navigation.invalidate(&zone_scope(&after));

        audit_log!(
            "zone.update",
            format!("zone:{zone_id}"),
            format!(
                "project={project_id} polygon_changed={} entity={}:{}",
                data.polygon.is_some(),
                after.entity.kind().as_str(),
                after.entity.raw_id()
            )
        );

        self.written(after).await
    }

    pub async fn delete(&self, project_id: i64, zone_id: i64) -> ServiceResult<()> {
        let zone = require(&self.pool, project_id, zone_id).await?;

        sqlx::query("DELETE FROM zones WHERE id = ?")
            .bind(zone_id)
            .execute(&self.pool)
            .await?;
        self.navigation.invalidate(&zone_scope(&zone));

        audit_log!(
            "zone.delete",
            format!("zone:{zone_id}"),
            format!("project={project_id} type={}", zone.zone_type)
        );
        Ok(())
    }

    /// Delete every zone matching the filter in one transaction
    pub async fn bulk_delete(&self, project_id: i64, filter: BulkDeleteFilter) -> ServiceResult<u64> {
        project::require_project(&self.pool, project_id).await?;

        let mut tx = self.pool.begin().await?;
        let touched: Vec<(ZoneType, Option<i64>, Option<i32>)> = sqlx::query_as(
            "SELECT DISTINCT zone_type, building_id, floor_number FROM zones \
             WHERE project_id = ?1 AND (?2 IS NULL OR zone_type = ?2) \
             AND (?3 IS NULL OR building_id = ?3)",
        )
        .bind(project_id)
        .bind(filter.zone_type)
        .bind(filter.building_id)
        .fetch_all(&mut *tx)
        .await?;

        let deleted = sqlx::query(
            "DELETE FROM zones \
             WHERE project_id = ?1 AND (?2 IS NULL OR zone_type = ?2) \
             AND (?3 IS NULL OR building_id = ?3)",
        )
        .bind(project_id)
        .bind(filter.zone_type)
        .bind(filter.building_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        tx.commit().await?;

        for (zone_type, building_id, floor_number) in touched {
            self.navigation.invalidate(&NavScope::for_zone(
                project_id,
                zone_type,
                building_id,
                floor_number,
            ));
        }

        audit_log!(
            "zone.bulk_delete",
            format!("project:{project_id}"),
            format!(
                "type={:?} building={:?} deleted={deleted}",
                filter.zone_type, filter.building_id
            )
        );
        Ok(deleted)
    }

    /// One floor_strip zone per listed floor, all-or-nothing
    ///
    /// Floor `i` of the list gets the template shifted by `i * offset`.
    pub async fn bulk_create_from_template(
        &self,
        project_id: i64,
        req: TemplateReplication,
    ) -> ServiceResult<Vec<Zone>> {
        project::require_building(&self.pool, project_id, req.building_id).await?;

        if req.floors.is_empty() {
            return Err(invalid_template("floors must not be empty")
                .with_detail("field", "floors")
                .into());
        }
        let mut seen = HashSet::with_capacity(req.floors.len());
        if let Some(dup) = req.floors.iter().find(|f| !seen.insert(**f)) {
            return Err(invalid_template(format!("floor {dup} is listed more than once"))
                .with_detail("field", "floors")
                .with_detail("floor", *dup)
                .into());
        }
        if !req.x_offset_per_floor.is_finite() || !req.y_offset_per_floor.is_finite() {
            return Err(invalid_template("floor offsets must be finite numbers").into());
        }
        validate_optional_text(
            &Some(req.label_template.clone()),
            "label_template",
            MAX_NAME_LEN,
        )?;

        let fill = blank_to_none(req.fill_color);
        let stroke = blank_to_none(req.stroke_color);
        let hover = blank_to_none(req.hover_color);
        validate_style(&None, &fill, &stroke, &hover)?;

        let template = geometry::prepare_polygon(&req.template)?;
        let now = now_millis();

        // Dropping the transaction on an early return rolls back every insert
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(req.floors.len());
        for (i, floor) in req.floors.iter().copied().enumerate() {
            let entity = EntityRef::FloorNumber(floor);
            if let Some(existing) = find_binding(
                &mut *tx,
                project_id,
                ZoneType::FloorStrip,
                Some(req.building_id),
                entity,
                None,
            )
            .await?
            {
                return Err(duplicate_binding(ZoneType::FloorStrip, entity, Some(existing))
                    .with_detail("floor", floor)
                    .into());
            }

            let step = i as f64;
            let polygon =
                template.offset(step * req.x_offset_per_floor, step * req.y_offset_per_floor);
            let label = req.label_template.replace("{floor}", &floor.to_string());

            let id = insert(
                &mut *tx,
                ZoneInsert {
                    project_id,
                    zone_type: ZoneType::FloorStrip,
                    placement: Placement {
                        building_id: Some(req.building_id),
                        floor_number: Some(floor),
                    },
                    entity,
                    polygon: &polygon,
                    label: Some(label.as_str()),
                    fill_color: fill.as_deref(),
                    stroke_color: stroke.as_deref(),
                    hover_color: hover.as_deref(),
                    sort_order: i32::try_from(i).unwrap_or(i32::MAX),
                    is_active: true,
                    now,
                },
            )
            .await?;
            ids.push(id);
        }
        tx.commit().await?;

        self.navigation
            .invalidate(&NavScope::building(project_id, Some(req.building_id)));

        audit_log!(
            "zone.bulk_template",
            format!("building:{}", req.building_id),
            format!("project={project_id} floors={:?}", req.floors)
        );

        let mut zones = Vec::with_capacity(ids.len());
        for id in ids {
            zones.push(require(&self.pool, project_id, id).await?);
        }
        Ok(zones)
    }

    /// Create apartment_unit zones one by one, collecting per-item errors
    ///
    /// Infrastructure failures still abort the whole import.
    pub async fn import_batch(&self, project_id: i64, import: ZoneImport) -> ServiceResult<ImportReport> {
        project::require_building(&self.pool, project_id, import.building_id).await?;

        let mut report = ImportReport::default();
        for (index, item) in import.items.into_iter().enumerate() {
            match self
                .import_item(project_id, import.building_id, import.floor_number, item)
                .await
            {
                Ok(write) => report.created.push(write.zone.id),
                Err(ServiceError::App(e)) => report.errors.push(ImportItemError {
                    index,
                    code: e.code,
                    message: e.message,
                }),
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            project_id,
            building_id = import.building_id,
            floor_number = import.floor_number,
            created = report.created.len(),
            failed = report.errors.len(),
            "Zone import finished"
        );
        Ok(report)
    }

    async fn import_item(
        &self,
        project_id: i64,
        building_id: i64,
        floor_number: i32,
        item: ZoneImportItem,
    ) -> ServiceResult<ZoneWrite> {
        let apartment = apartment::require(&self.pool, item.apartment_id).await?;
        if apartment.floor_number != floor_number {
            return Err(AppError::with_message(
                ErrorCode::InvalidZoneContext,
                format!(
                    "apartment {} is on floor {}, not {floor_number}",
                    apartment.id, apartment.floor_number
                ),
            )
            .with_detail("field", "apartment_id")
            .into());
        }

        self.create(
            project_id,
            ZoneCreate {
                zone_type: ZoneType::ApartmentUnit,
                building_id: Some(building_id),
                entity: EntityRef::Apartment(item.apartment_id),
                polygon: item.polygon,
                label: item.label,
                fill_color: None,
                stroke_color: None,
                hover_color: None,
                sort_order: None,
                is_active: None,
            },
        )
        .await
    }
}
