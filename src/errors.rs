use axum::http::StatusCode;
use thiserror::Error;

/// Failures of the sync job and the document pipeline.
#[derive(Error, Debug)]
pub enum StepsError {
    /// The fitness API could not be reached or answered with an error.
    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(String),

    /// A stored or fetched day does not have the `{steps, km}` shape.
    #[error("malformed record for {date}: {reason}")]
    MalformedRecord { date: String, reason: String },

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StepsError>;

impl StepsError {
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamFetch(msg.into())
    }

    pub fn malformed(date: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            date: date.into(),
            reason: reason.into(),
        }
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the sync job should fall back to degraded mode instead of
    /// aborting.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamFetch(_) | Self::Http(_))
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<StepsError> for AppError {
    fn from(err: StepsError) -> Self {
        match err {
            StepsError::Persistence(_) => Self::unavailable(err.to_string()),
            other => Self::internal(other),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
