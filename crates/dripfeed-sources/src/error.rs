use thiserror::Error;

/// Errors that can occur within any ingestion adapter.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The local source file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The adapter's own cursor document could not be loaded or saved.
    #[error("Cursor store error: {0}")]
    Store(#[from] dripfeed_store::StoreError),
}

impl SourceError {
    pub fn code(&self) -> &'static str {
        match self {
            SourceError::Http(_) => "SOURCE_HTTP_ERROR",
            SourceError::Api { .. } => "SOURCE_API_ERROR",
            SourceError::Parse(_) => "SOURCE_PARSE_ERROR",
            SourceError::Io(_) => "SOURCE_IO_ERROR",
            SourceError::Store(e) => e.code(),
        }
    }
}
