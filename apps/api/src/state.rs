use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::deploy::publisher::Publisher;
use crate::github::GithubClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Redis carries the cross-view refresh signal.
    pub redis: RedisClient,
    /// S3/MinIO bucket for uploaded résumé PDFs.
    pub s3: S3Client,
    pub github: GithubClient,
    pub config: Config,
    /// Pluggable deployment backend. Default: ViewerPublisher (simulated
    /// build, in-app viewer URL).
    pub publisher: Arc<dyn Publisher>,
}
