//! Deployment job manager. Jobs move `pending → building → ready` or
//! `pending → building → error`; terminal states only leave the table by
//! hard delete. The profile snapshot frozen during the build is the sole
//! source of truth for the job's public view — later profile edits never
//! touch it.

pub mod handlers;
pub mod publisher;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::deploy::publisher::Publisher;
use crate::errors::AppError;
use crate::models::deployment::DeploymentRow;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStatus {
    Pending,
    Building,
    Ready,
    Error,
}

impl DeployStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeployStatus::Pending => "pending",
            DeployStatus::Building => "building",
            DeployStatus::Ready => "ready",
            DeployStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DeployStatus::Pending),
            "building" => Some(DeployStatus::Building),
            "ready" => Some(DeployStatus::Ready),
            "error" => Some(DeployStatus::Error),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DeployStatus::Ready | DeployStatus::Error)
    }

    /// The transition table. No transition skips `building`; terminal
    /// states admit none.
    pub fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (DeployStatus::Pending, DeployStatus::Building)
                | (DeployStatus::Building, DeployStatus::Ready)
                | (DeployStatus::Building, DeployStatus::Error)
        )
    }
}

impl std::fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner-facing status view (camelCase to match the frontend contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatusView {
    pub id: Uuid,
    pub status: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DeploymentRow> for DeploymentStatusView {
    fn from(row: DeploymentRow) -> Self {
        Self {
            id: row.id,
            status: row.status,
            url: row.live_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Inserts a `pending` job and spawns its build pipeline. The project
/// name embeds the identity and the creation timestamp, so concurrent
/// creations stay unique without coordination; duplicates are independent
/// rows by design.
pub async fn create_deployment(
    state: &AppState,
    user_id: Uuid,
    snapshot: Value,
) -> Result<DeploymentRow, AppError> {
    let project_name = format!("portfolio-{}-{}", user_id, Utc::now().timestamp_millis());

    let row: DeploymentRow = sqlx::query_as(
        r#"
        INSERT INTO deployments (id, user_id, project_name, status)
        VALUES ($1, $2, $3, 'pending')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&project_name)
    .fetch_one(&state.db)
    .await?;

    info!("Created deployment {} ({project_name})", row.id);

    let state = state.clone();
    let id = row.id;
    tokio::spawn(async move {
        if let Err(e) = run_build(&state.db, state.publisher.as_ref(), id, snapshot).await {
            error!("Deployment {id} failed: {e}");
            if let Err(e) = state.db.mark_failed(id).await {
                error!("Could not mark deployment {id} as failed: {e}");
            }
        }
    });

    Ok(row)
}

/// Status writes behind the build pipeline. The Postgres implementation
/// guards every write on the expected current state, so a concurrent
/// writer loses the race instead of overwriting it.
#[async_trait]
pub trait DeployStore: Send + Sync {
    async fn transition(
        &self,
        id: Uuid,
        from: DeployStatus,
        to: DeployStatus,
        url: Option<&str>,
    ) -> Result<(), AppError>;

    /// Freezes the profile snapshot while the job is building.
    async fn freeze_snapshot(&self, id: Uuid, snapshot: &Value) -> Result<(), AppError>;

    /// Flips a non-terminal job to `error`. Terminal rows are never touched.
    async fn mark_failed(&self, id: Uuid) -> Result<(), AppError>;
}

/// The build pipeline: strictly sequential transitions, each write
/// awaited before the next step. Any error surfaces to the caller, which
/// flips the job to `error` with no URL set.
async fn run_build(
    store: &dyn DeployStore,
    publisher: &dyn Publisher,
    id: Uuid,
    snapshot: Value,
) -> Result<(), AppError> {
    store
        .transition(id, DeployStatus::Pending, DeployStatus::Building, None)
        .await?;
    store.freeze_snapshot(id, &snapshot).await?;
    let url = publisher.publish(id, &snapshot).await?;
    store
        .transition(id, DeployStatus::Building, DeployStatus::Ready, Some(&url))
        .await?;
    info!("Deployment {id} ready at {url}");
    Ok(())
}

#[async_trait]
impl DeployStore for PgPool {
    /// Guarded status write: rejects transitions outside the table and
    /// races where the row is no longer in the expected `from` state.
    async fn transition(
        &self,
        id: Uuid,
        from: DeployStatus,
        to: DeployStatus,
        url: Option<&str>,
    ) -> Result<(), AppError> {
        if !from.can_transition(to) {
            return Err(AppError::Validation(format!(
                "Illegal deployment transition {from} -> {to}"
            )));
        }
        let result = sqlx::query(
            r#"
            UPDATE deployments
            SET status = $2, live_url = COALESCE($3, live_url), updated_at = now()
            WHERE id = $1 AND status = $4
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .bind(url)
        .bind(from.as_str())
        .execute(self)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::Validation(format!(
                "Deployment {id} is not in state {from}"
            )));
        }
        Ok(())
    }

    async fn freeze_snapshot(&self, id: Uuid, snapshot: &Value) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE deployments SET profile_data = $2, updated_at = now() \
             WHERE id = $1 AND status = 'building'",
        )
        .bind(id)
        .bind(snapshot)
        .execute(self)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::Validation(format!(
                "Deployment {id} is not building"
            )));
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE deployments SET status = 'error', updated_at = now() \
             WHERE id = $1 AND status IN ('pending', 'building')",
        )
        .bind(id)
        .execute(self)
        .await?;
        Ok(())
    }
}

/// Public read path. Only `ready` jobs render their frozen snapshot;
/// `error` and missing ids collapse into the same "not found" outcome so
/// viewers cannot tell them apart.
pub async fn public_snapshot(pool: &PgPool, id: Uuid) -> Result<Value, AppError> {
    let not_found = || AppError::NotFound("Portfolio not found".to_string());

    let row: Option<DeploymentRow> = sqlx::query_as("SELECT * FROM deployments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let row = row.ok_or_else(not_found)?;

    match DeployStatus::parse(&row.status) {
        Some(DeployStatus::Ready) => row.profile_data.ok_or_else(not_found),
        Some(DeployStatus::Pending) | Some(DeployStatus::Building) => Err(AppError::NotReady(
            "Portfolio is not ready yet".to_string(),
        )),
        _ => Err(not_found()),
    }
}

/// Owner read path: the raw status row, including `error`.
pub async fn get_deployment(pool: &PgPool, id: Uuid) -> Result<DeploymentRow, AppError> {
    let row: Option<DeploymentRow> = sqlx::query_as("SELECT * FROM deployments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.ok_or_else(|| AppError::NotFound(format!("Deployment {id} not found")))
}

/// All jobs for an identity, newest first.
pub async fn list_deployments(pool: &PgPool, user_id: Uuid) -> Result<Vec<DeploymentRow>, AppError> {
    Ok(sqlx::query_as(
        "SELECT * FROM deployments WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

/// Hard-deletes every job for an identity. Zero existing jobs is a
/// success with count 0, not an error.
pub async fn delete_all_deployments(pool: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM deployments WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    let deleted = result.rows_affected();
    info!("Deleted {deleted} deployments for {user_id}");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [DeployStatus; 4] = [
        DeployStatus::Pending,
        DeployStatus::Building,
        DeployStatus::Ready,
        DeployStatus::Error,
    ];

    #[test]
    fn transition_table_is_exactly_the_three_legal_edges() {
        for from in ALL {
            for to in ALL {
                let legal = matches!(
                    (from, to),
                    (DeployStatus::Pending, DeployStatus::Building)
                        | (DeployStatus::Building, DeployStatus::Ready)
                        | (DeployStatus::Building, DeployStatus::Error)
                );
                assert_eq!(from.can_transition(to), legal, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn terminal_states_admit_no_transition() {
        for terminal in [DeployStatus::Ready, DeployStatus::Error] {
            assert!(terminal.is_terminal());
            for to in ALL {
                assert!(!terminal.can_transition(to));
            }
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in ALL {
            assert_eq!(DeployStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(DeployStatus::parse("deployed"), None);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DeployStatus::Building).unwrap(),
            "\"building\""
        );
    }

    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::json;

    use crate::deploy::publisher::ViewerPublisher;

    /// In-memory store with the same guarded-write semantics as the
    /// Postgres implementation, plus a write log for ordering asserts.
    struct MemStore {
        status: Mutex<DeployStatus>,
        url: Mutex<Option<String>>,
        snapshot: Mutex<Option<Value>>,
        log: Mutex<Vec<String>>,
    }

    impl MemStore {
        fn pending() -> Self {
            Self {
                status: Mutex::new(DeployStatus::Pending),
                url: Mutex::new(None),
                snapshot: Mutex::new(None),
                log: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DeployStore for MemStore {
        async fn transition(
            &self,
            _id: Uuid,
            from: DeployStatus,
            to: DeployStatus,
            url: Option<&str>,
        ) -> Result<(), AppError> {
            if !from.can_transition(to) {
                return Err(AppError::Validation(format!(
                    "Illegal deployment transition {from} -> {to}"
                )));
            }
            let mut status = self.status.lock().unwrap();
            if *status != from {
                return Err(AppError::Validation(format!("not in state {from}")));
            }
            *status = to;
            if let Some(url) = url {
                *self.url.lock().unwrap() = Some(url.to_string());
            }
            self.log.lock().unwrap().push(format!("{from}->{to}"));
            Ok(())
        }

        async fn freeze_snapshot(&self, _id: Uuid, snapshot: &Value) -> Result<(), AppError> {
            if *self.status.lock().unwrap() != DeployStatus::Building {
                return Err(AppError::Validation("not building".to_string()));
            }
            *self.snapshot.lock().unwrap() = Some(snapshot.clone());
            self.log.lock().unwrap().push("freeze".to_string());
            Ok(())
        }

        async fn mark_failed(&self, _id: Uuid) -> Result<(), AppError> {
            let mut status = self.status.lock().unwrap();
            if !status.is_terminal() {
                *status = DeployStatus::Error;
            }
            Ok(())
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl Publisher for FailingPublisher {
        async fn publish(&self, _id: Uuid, _snapshot: &Value) -> Result<String, AppError> {
            Err(AppError::Storage("build backend unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn build_pipeline_freezes_snapshot_then_goes_ready_with_url() {
        let store = MemStore::pending();
        let publisher = ViewerPublisher::new("https://example.com".to_string(), Duration::ZERO);
        let id = Uuid::new_v4();
        let snapshot = json!({"fullName": "A", "experiences": []});

        run_build(&store, &publisher, id, snapshot.clone())
            .await
            .unwrap();

        assert_eq!(*store.status.lock().unwrap(), DeployStatus::Ready);
        assert_eq!(
            store.url.lock().unwrap().as_deref(),
            Some(format!("https://example.com/portfolio/{id}").as_str())
        );
        // The snapshot was frozen after entering `building`, before the
        // ready transition, and holds the value captured at creation.
        assert_eq!(store.snapshot.lock().unwrap().as_ref(), Some(&snapshot));
        assert_eq!(
            *store.log.lock().unwrap(),
            vec!["pending->building", "freeze", "building->ready"]
        );
    }

    #[tokio::test]
    async fn publish_failure_ends_in_error_with_no_url() {
        let store = MemStore::pending();
        let id = Uuid::new_v4();

        let result = run_build(&store, &FailingPublisher, id, json!({})).await;
        assert!(result.is_err());
        // The cleanup the spawn path performs on a failed build.
        store.mark_failed(id).await.unwrap();

        assert_eq!(*store.status.lock().unwrap(), DeployStatus::Error);
        assert!(store.url.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn build_is_rejected_when_job_is_no_longer_pending() {
        let store = MemStore::pending();
        let publisher = ViewerPublisher::new("https://example.com".to_string(), Duration::ZERO);
        let id = Uuid::new_v4();

        run_build(&store, &publisher, id, json!({})).await.unwrap();
        // A second build hits the state guard at the first transition.
        let result = run_build(&store, &publisher, id, json!({"edited": true})).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        // The frozen snapshot and URL from the first build are untouched.
        assert_eq!(*store.status.lock().unwrap(), DeployStatus::Ready);
        assert_eq!(store.snapshot.lock().unwrap().as_ref(), Some(&json!({})));
    }

    #[tokio::test]
    async fn mark_failed_never_touches_terminal_jobs() {
        let store = MemStore::pending();
        let publisher = ViewerPublisher::new("https://example.com".to_string(), Duration::ZERO);
        let id = Uuid::new_v4();

        run_build(&store, &publisher, id, json!({})).await.unwrap();
        store.mark_failed(id).await.unwrap();
        assert_eq!(*store.status.lock().unwrap(), DeployStatus::Ready);
    }
}
