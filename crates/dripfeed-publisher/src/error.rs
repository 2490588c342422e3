use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    /// Every endpoint refused the post.
    #[error("post rejected: {0}")]
    Rejected(String),
}

impl PublishError {
    pub fn code(&self) -> &'static str {
        match self {
            PublishError::Http(_) => "PUBLISH_HTTP_ERROR",
            PublishError::Api { .. } => "PUBLISH_API_ERROR",
            PublishError::Parse(_) => "PUBLISH_PARSE_ERROR",
            PublishError::Rejected(_) => "PUBLISH_REJECTED",
        }
    }
}
