use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::profile::aggregator::resolve_profile;
use crate::profile::view::ProfileView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub user_id: Option<Uuid>,
}

/// GET /api/v1/profile
///
/// With `user_id`: that identity's profile exactly. Without: the public
/// (featured) profile.
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<ProfileQuery>,
) -> Result<Json<ProfileView>, AppError> {
    let view = resolve_profile(&state, params.user_id).await?;
    Ok(Json(view))
}
