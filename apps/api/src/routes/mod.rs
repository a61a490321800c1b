pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::deploy::handlers as deploy_handlers;
use crate::profile::handlers as profile_handlers;
use crate::projects::handlers as project_handlers;
use crate::resume::handlers as resume_handlers;
use crate::signal;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Aggregated profile
        .route("/api/v1/profile", get(profile_handlers::handle_get_profile))
        // Résumé ingestion
        .route("/api/v1/resume", post(resume_handlers::handle_ingest))
        .route("/api/v1/resume/pdf", post(resume_handlers::handle_upload_pdf))
        // Repository-derived projects
        .route("/api/v1/projects", get(project_handlers::handle_list_projects))
        // Deployment jobs
        .route(
            "/api/v1/deployments",
            post(deploy_handlers::handle_create)
                .get(deploy_handlers::handle_list)
                .delete(deploy_handlers::handle_delete_all),
        )
        .route(
            "/api/v1/deployments/:id",
            get(deploy_handlers::handle_get_status),
        )
        // Public frozen-snapshot viewer
        .route("/api/v1/portfolio/:id", get(deploy_handlers::handle_public_view))
        // Cross-view refresh signal
        .route(
            "/api/v1/refresh",
            post(signal::handle_raise).get(signal::handle_consume),
        )
        .with_state(state)
}
