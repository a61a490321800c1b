use axum::{extract::State, Json};
use chrono::Utc;
use tracing::warn;

use crate::errors::AppError;
use crate::projects::classifier::{process_repositories, RepositoryProject};
use crate::state::AppState;

/// GET /api/v1/projects
///
/// Classified public repositories for the configured handle. A GitHub
/// outage degrades to an empty list rather than an error.
pub async fn handle_list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<RepositoryProject>>, AppError> {
    let repos = match state.github.fetch_repositories().await {
        Ok(repos) => repos,
        Err(e) => {
            warn!("Failed to fetch repositories for {}: {e}", state.github.handle());
            Vec::new()
        }
    };
    Ok(Json(process_repositories(repos, Utc::now())))
}
