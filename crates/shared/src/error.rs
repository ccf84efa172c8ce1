use thiserror::Error;

/// Failures inside a syndication run.
///
/// None of these escape [`Pipeline::run`](crate::pipeline::Pipeline::run):
/// each one has a local fallback where it is raised.
#[derive(Debug, Error)]
pub enum SyndicationError {
    #[error("{capability} is not configured (missing {credential})")]
    ConfigurationGap {
        capability: &'static str,
        credential: &'static str,
    },

    #[error("Are.na feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("caption service unavailable: {0}")]
    CaptionUnavailable(String),

    #[error("screenshot service unavailable: {0}")]
    ScreenshotUnavailable(String),

    #[error("processed-set storage failed: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for SyndicationError {
    fn from(e: rusqlite::Error) -> Self {
        SyndicationError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for SyndicationError {
    fn from(e: serde_json::Error) -> Self {
        SyndicationError::Storage(format!("corrupt processed-id record: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, SyndicationError>;
