use thiserror::Error;

#[derive(Debug, Error)]
pub enum DripfeedError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    #[error("Invalid post time {value:?}: expected HH:MM")]
    InvalidPostTime { value: String },
}

impl DripfeedError {
    /// Short error code string returned to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            DripfeedError::Config(_) => "CONFIG_ERROR",
            DripfeedError::MissingConfig(_) => "MISSING_CONFIG",
            DripfeedError::InvalidPostTime { .. } => "INVALID_POST_TIME",
        }
    }
}

pub type Result<T> = std::result::Result<T, DripfeedError>;
