//! Catalogue API Handlers

use std::sync::Arc;

use axum::extract::{Query, State};
use shared::models::{CataloguePage, CatalogueQuery};
use tracing::instrument;

use crate::core::ServerState;
use crate::utils::{ApiResult, ok};

/// GET /api/catalogue/apartments - 可售房源列表 (版本轮换缓存)
#[instrument(skip(state))]
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<CatalogueQuery>,
) -> ApiResult<Arc<CataloguePage>> {
    let page = state.catalogue.list(query).await?;
    Ok(ok(page))
}
