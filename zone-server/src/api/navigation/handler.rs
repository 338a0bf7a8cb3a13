//! Navigation API Handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use shared::models::{NavigationQuery, NavigationView};
use tracing::instrument;

use crate::core::ServerState;
use crate::navigation::LevelContext;
use crate::utils::{ApiResult, ok};

/// GET /api/projects/{project_id}/navigation?level&building_id&floor_number
#[instrument(skip(state))]
pub async fn navigate(
    State(state): State<ServerState>,
    Path(project_id): Path<i64>,
    Query(query): Query<NavigationQuery>,
) -> ApiResult<Arc<NavigationView>> {
    let context = LevelContext::try_from(&query)?;
    let view = state.navigation.resolve(project_id, context).await?;
    Ok(ok(view))
}
