//! Apartment API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Apartment, ApartmentStatusUpdate, ApartmentUpdate};
use tracing::instrument;

use crate::core::ServerState;
use crate::utils::{ApiResult, ok};

/// PATCH /api/apartments/{id} - 部分更新
#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ApartmentUpdate>,
) -> ApiResult<Apartment> {
    let apartment = state.apartments.update(id, payload).await?;
    Ok(ok(apartment))
}

/// PUT /api/apartments/{id}/status - 快速修改销售状态
#[instrument(skip(state, payload))]
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ApartmentStatusUpdate>,
) -> ApiResult<Apartment> {
    let apartment = state.apartments.update_status(id, payload.status).await?;
    Ok(ok(apartment))
}

/// DELETE /api/apartments/{id} - 删除房源及其绑定的区域
#[instrument(skip(state))]
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> ApiResult<bool> {
    state.apartments.delete(id).await?;
    Ok(ok(true))
}
