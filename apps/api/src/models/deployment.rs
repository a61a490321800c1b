use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeploymentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_name: String,
    /// One of `pending`, `building`, `ready`, `error`. See
    /// [`crate::deploy::DeployStatus`] for the transition rules.
    pub status: String,
    pub live_url: Option<String>,
    /// Frozen `ProfileView` snapshot captured during the build. Once the
    /// row reaches `ready` this is the sole source for the public view.
    pub profile_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
