use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::error::PublishError;
use crate::publisher::Publisher;

/// Logs instead of posting. Ids look like `dry-run-<unix millis>`.
#[derive(Debug, Default)]
pub struct DryRunPublisher;

#[async_trait]
impl Publisher for DryRunPublisher {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn is_dry_run(&self) -> bool {
        true
    }

    async fn post_text(&self, text: &str) -> Result<String, PublishError> {
        info!(chars = text.chars().count(), text = %text, "dry run: would post");
        Ok(format!("dry-run-{}", Utc::now().timestamp_millis()))
    }
}
