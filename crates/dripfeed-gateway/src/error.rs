use dripfeed_sources::SourceError;
use dripfeed_store::StoreError;
use thiserror::Error;

/// Failures of a pipeline operation, as reported to HTTP callers and logs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Source(#[from] SourceError),

    /// Manual add or edit with no text after trimming.
    #[error("post text is required")]
    BlankText,
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Store(e) => e.code(),
            PipelineError::Source(e) => e.code(),
            PipelineError::BlankText => "BLANK_TEXT",
        }
    }
}
