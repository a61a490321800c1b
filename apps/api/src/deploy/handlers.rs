use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::deploy::{
    create_deployment, delete_all_deployments, get_deployment, list_deployments, public_snapshot,
    DeploymentStatusView,
};
use crate::errors::AppError;
use crate::profile::aggregator::resolve_profile;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateDeploymentRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// POST /api/v1/deployments
///
/// Freezes the identity's current aggregated profile into a new job and
/// kicks off the build. Returns the job in `pending`.
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<CreateDeploymentRequest>,
) -> Result<Json<DeploymentStatusView>, AppError> {
    let view = resolve_profile(&state, Some(req.user_id)).await?;
    let snapshot = serde_json::to_value(&view)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Snapshot serialization failed: {e}")))?;
    let row = create_deployment(&state, req.user_id, snapshot).await?;
    Ok(Json(row.into()))
}

/// GET /api/v1/deployments/:id — owner status view, including `error`.
pub async fn handle_get_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeploymentStatusView>, AppError> {
    let row = get_deployment(&state.db, id).await?;
    Ok(Json(row.into()))
}

/// GET /api/v1/deployments?user_id= — all jobs for an identity, newest first.
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<DeploymentStatusView>>, AppError> {
    let rows = list_deployments(&state.db, params.user_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// DELETE /api/v1/deployments?user_id= — bulk hard delete; zero rows is
/// still a success.
pub async fn handle_delete_all(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    let deleted = delete_all_deployments(&state.db, params.user_id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// GET /api/v1/portfolio/:id — public frozen snapshot; anything but a
/// `ready` job reports not-ready or not-found, with no internal detail.
pub async fn handle_public_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let snapshot = public_snapshot(&state.db, id).await?;
    Ok(Json(snapshot))
}
