//! The publish step behind the deployment state machine. The build is
//! simulated today; a real static-site or edge-deploy backend slots in
//! by implementing `Publisher`, without touching the state machine.
//!
//! Carried in `AppState` as `Arc<dyn Publisher>`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes a frozen profile snapshot and returns its live URL.
    async fn publish(&self, deployment_id: Uuid, snapshot: &Value) -> Result<String, AppError>;
}

/// Default backend: a fixed build delay, then a deterministic URL onto
/// the in-app portfolio viewer keyed by the deployment id.
pub struct ViewerPublisher {
    base_url: String,
    build_delay: Duration,
}

impl ViewerPublisher {
    pub fn new(base_url: String, build_delay: Duration) -> Self {
        Self {
            base_url,
            build_delay,
        }
    }
}

#[async_trait]
impl Publisher for ViewerPublisher {
    async fn publish(&self, deployment_id: Uuid, _snapshot: &Value) -> Result<String, AppError> {
        debug!("Simulating build for deployment {deployment_id}");
        tokio::time::sleep(self.build_delay).await;
        Ok(format!(
            "{}/portfolio/{deployment_id}",
            self.base_url.trim_end_matches('/')
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn viewer_publisher_yields_deterministic_url() {
        let publisher =
            ViewerPublisher::new("https://example.com/".to_string(), Duration::ZERO);
        let id = Uuid::new_v4();
        let url = publisher.publish(id, &json!({})).await.unwrap();
        assert_eq!(url, format!("https://example.com/portfolio/{id}"));
        // Same id, same URL.
        assert_eq!(url, publisher.publish(id, &json!({})).await.unwrap());
    }
}
