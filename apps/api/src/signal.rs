//! Cross-view refresh signal: one shared flag in Redis. Write paths
//! raise it; any open view consumes it exactly once (GETDEL) and
//! re-aggregates with a full re-fetch. A Redis outage degrades to "no
//! signal" and never fails the surrounding request.

use anyhow::Result;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

const REFRESH_KEY: &str = "portfolio:refresh";

pub async fn raise(client: &redis::Client) -> Result<()> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    redis::cmd("SET")
        .arg(REFRESH_KEY)
        .arg("1")
        .query_async::<_, ()>(&mut conn)
        .await?;
    Ok(())
}

/// Consumes the flag atomically; true at most once per raise.
pub async fn consume(client: &redis::Client) -> Result<bool> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    let value: Option<String> = redis::cmd("GETDEL")
        .arg(REFRESH_KEY)
        .query_async(&mut conn)
        .await?;
    Ok(value.is_some())
}

/// POST /api/v1/refresh — request that all open views re-aggregate.
pub async fn handle_raise(State(state): State<AppState>) -> StatusCode {
    if let Err(e) = raise(&state.redis).await {
        warn!("Failed to raise refresh signal: {e}");
    }
    StatusCode::NO_CONTENT
}

/// GET /api/v1/refresh — consume-and-clear.
pub async fn handle_consume(State(state): State<AppState>) -> Json<Value> {
    let refresh = match consume(&state.redis).await {
        Ok(refresh) => refresh,
        Err(e) => {
            warn!("Failed to consume refresh signal: {e}");
            false
        }
    };
    Json(json!({ "refresh": refresh }))
}
