use async_trait::async_trait;

use crate::error::PublishError;

/// Common interface implemented by every posting backend.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &str;

    /// Whether posts are only logged rather than sent.
    fn is_dry_run(&self) -> bool {
        false
    }

    /// Publish `text` and return the platform's id for the new post.
    async fn post_text(&self, text: &str) -> Result<String, PublishError>;
}
