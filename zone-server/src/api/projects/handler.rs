//! Project API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Apartment, ApartmentCreate, Building, BuildingCreate, Project, ProjectCreate};
use tracing::instrument;

use crate::core::ServerState;
use crate::db::repository::project;
use crate::utils::{ApiResult, ok};

/// POST /api/projects - 创建项目
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProjectCreate>,
) -> ApiResult<Project> {
    let project = project::create_project(state.pool(), payload).await?;
    tracing::info!(project_id = project.id, "Project created");
    Ok(ok(project))
}

/// GET /api/projects/{project_id} - 获取项目
#[instrument(skip(state))]
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(project_id): Path<i64>,
) -> ApiResult<Project> {
    let project = project::require_project(state.pool(), project_id).await?;
    Ok(ok(project))
}

/// GET /api/projects/{project_id}/buildings - 项目下的所有楼栋
#[instrument(skip(state))]
pub async fn list_buildings(
    State(state): State<ServerState>,
    Path(project_id): Path<i64>,
) -> ApiResult<Vec<Building>> {
    project::require_project(state.pool(), project_id).await?;
    let buildings = project::list_buildings(state.pool(), project_id).await?;
    Ok(ok(buildings))
}

/// POST /api/projects/{project_id}/buildings - 创建楼栋
#[instrument(skip(state, payload))]
pub async fn create_building(
    State(state): State<ServerState>,
    Path(project_id): Path<i64>,
    Json(payload): Json<BuildingCreate>,
) -> ApiResult<Building> {
    let building = project::create_building(state.pool(), project_id, payload).await?;
    // The overview's has_multiple_buildings depends on the building count
    state.navigation.invalidate_project(project_id);
    Ok(ok(building))
}

/// POST /api/projects/{project_id}/buildings/{building_id}/apartments - 创建房源
#[instrument(skip(state, payload))]
pub async fn create_apartment(
    State(state): State<ServerState>,
    Path((project_id, building_id)): Path<(i64, i64)>,
    Json(payload): Json<ApartmentCreate>,
) -> ApiResult<Apartment> {
    let apartment = state
        .apartments
        .create(project_id, building_id, payload)
        .await?;
    Ok(ok(apartment))
}
