//! Zone API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::models::{
    BoundingBox, BulkDeleteFilter, BulkDeleteResult, ImportReport, LevelType, TemplateReplication,
    Zone, ZoneCreate, ZoneImport, ZoneUpdate, ZoneWrite,
};
use tracing::instrument;

use crate::core::ServerState;
use crate::geometry;
use crate::navigation::LevelContext;
use crate::utils::{ApiResult, ok};

#[derive(Debug, Default, Deserialize)]
pub struct ZoneListQuery {
    pub level: Option<LevelType>,
    pub building_id: Option<i64>,
    pub floor_number: Option<i32>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Serialize)]
pub struct ZoneOutline {
    pub zone_id: i64,
    pub path: String,
    pub bounding_box: BoundingBox,
}

/// GET /api/projects/{project_id}/zones - 某一层级上下文的区域
#[instrument(skip(state))]
pub async fn list(
    State(state): State<ServerState>,
    Path(project_id): Path<i64>,
    Query(query): Query<ZoneListQuery>,
) -> ApiResult<Vec<Zone>> {
    let context = LevelContext::new(
        query.level.unwrap_or(LevelType::Overview),
        query.building_id,
        query.floor_number,
    )?;
    let zones = state
        .zones
        .list_for_context(project_id, &context, !query.include_inactive)
        .await?;
    Ok(ok(zones))
}

/// GET /api/projects/{project_id}/zones/{zone_id}
#[instrument(skip(state))]
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path((project_id, zone_id)): Path<(i64, i64)>,
) -> ApiResult<Zone> {
    let zone = state.zones.find_by_id(project_id, zone_id).await?;
    Ok(ok(zone))
}

/// POST /api/projects/{project_id}/zones - 创建区域，返回重叠提示
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<ServerState>,
    Path(project_id): Path<i64>,
    Json(payload): Json<ZoneCreate>,
) -> ApiResult<ZoneWrite> {
    let write = state.zones.create(project_id, payload).await?;
    Ok(ok(write))
}

/// PUT /api/projects/{project_id}/zones/{zone_id} - 部分更新
#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<ServerState>,
    Path((project_id, zone_id)): Path<(i64, i64)>,
    Json(payload): Json<ZoneUpdate>,
) -> ApiResult<ZoneWrite> {
    let write = state.zones.update(project_id, zone_id, payload).await?;
    Ok(ok(write))
}

/// DELETE /api/projects/{project_id}/zones/{zone_id}
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<ServerState>,
    Path((project_id, zone_id)): Path<(i64, i64)>,
) -> ApiResult<bool> {
    state.zones.delete(project_id, zone_id).await?;
    Ok(ok(true))
}

/// GET /api/projects/{project_id}/zones/{zone_id}/outline
#[instrument(skip(state))]
pub async fn outline(
    State(state): State<ServerState>,
    Path((project_id, zone_id)): Path<(i64, i64)>,
) -> ApiResult<ZoneOutline> {
    let zone = state.zones.find_by_id(project_id, zone_id).await?;
    Ok(ok(ZoneOutline {
        zone_id: zone.id,
        path: geometry::outline_path(&zone.polygon),
        bounding_box: zone.bounding_box,
    }))
}

/// POST /api/projects/{project_id}/zones/bulk-delete
#[instrument(skip(state))]
pub async fn bulk_delete(
    State(state): State<ServerState>,
    Path(project_id): Path<i64>,
    Json(filter): Json<BulkDeleteFilter>,
) -> ApiResult<BulkDeleteResult> {
    let deleted = state.zones.bulk_delete(project_id, filter).await?;
    Ok(ok(BulkDeleteResult { deleted }))
}

/// POST /api/projects/{project_id}/zones/bulk-template - 全部成功或全部回滚
#[instrument(skip(state, payload))]
pub async fn bulk_template(
    State(state): State<ServerState>,
    Path(project_id): Path<i64>,
    Json(payload): Json<TemplateReplication>,
) -> ApiResult<Vec<Zone>> {
    let zones = state
        .zones
        .bulk_create_from_template(project_id, payload)
        .await?;
    Ok(ok(zones))
}

/// POST /api/projects/{project_id}/zones/import - 逐项导入，失败项汇总返回
#[instrument(skip(state, payload))]
pub async fn import(
    State(state): State<ServerState>,
    Path(project_id): Path<i64>,
    Json(payload): Json<ZoneImport>,
) -> ApiResult<ImportReport> {
    let report = state.zones.import_batch(project_id, payload).await?;
    Ok(ok(report))
}
