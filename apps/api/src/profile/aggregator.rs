//! Profile resolution: picks the canonical profile row, loads its
//! relational children, queries GitHub fresh (no caching) and merges
//! everything through `build_view`. External failures degrade to nulls
//! and never abort the aggregation.

use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{EducationRow, ExperienceRow, ProfileRow, SkillRow};
use crate::profile::view::{build_view, ProfileView};
use crate::state::AppState;

pub async fn resolve_profile(
    state: &AppState,
    user_id: Option<Uuid>,
) -> Result<ProfileView, AppError> {
    let row = match user_id {
        // Exact fetch, no fallback search.
        Some(id) => fetch_by_id(&state.db, id).await?,
        None => fetch_featured(&state.db, &state.config.github_handle).await?,
    };

    let (experiences, educations, skills) = match &row {
        Some(r) => fetch_children(&state.db, r.id).await?,
        None => (vec![], vec![], vec![]),
    };

    let github_user = match state.github.fetch_user().await {
        Ok(user) => Some(user),
        Err(e) => {
            warn!("GitHub backfill unavailable for {}: {e}", state.github.handle());
            None
        }
    };

    Ok(build_view(row, experiences, educations, skills, github_user))
}

async fn fetch_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ProfileRow>, AppError> {
    Ok(sqlx::query_as("SELECT * FROM profiles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

/// Anonymous resolution: newest row whose GitHub handle matches the
/// configured featured handle, else the newest row overall.
async fn fetch_featured(pool: &PgPool, handle: &str) -> Result<Option<ProfileRow>, AppError> {
    let featured: Option<ProfileRow> = sqlx::query_as(
        "SELECT * FROM profiles WHERE github ILIKE $1 ORDER BY updated_at DESC LIMIT 1",
    )
    .bind(format!("%{handle}%"))
    .fetch_optional(pool)
    .await?;
    if featured.is_some() {
        return Ok(featured);
    }
    Ok(
        sqlx::query_as("SELECT * FROM profiles ORDER BY updated_at DESC LIMIT 1")
            .fetch_optional(pool)
            .await?,
    )
}

async fn fetch_children(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<(Vec<ExperienceRow>, Vec<EducationRow>, Vec<SkillRow>), AppError> {
    let experiences = sqlx::query_as(
        "SELECT * FROM experiences WHERE user_id = $1 ORDER BY order_index ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    let educations = sqlx::query_as(
        "SELECT * FROM educations WHERE user_id = $1 ORDER BY order_index ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    let skills = sqlx::query_as("SELECT * FROM skills WHERE user_id = $1 ORDER BY order_index ASC")
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok((experiences, educations, skills))
}
