use serde::ser::SerializeStruct;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication required")]
    Authentication,
    #[error("document load failed: {0}")]
    LoadFailure(String),
    #[error("annotation {id} rejected: {message}")]
    AnnotationFailure { id: String, message: String },
    #[error("stream transport error: {0}")]
    StreamTransport(String),
    #[error("stream decode error: {0}")]
    StreamDecode(String),
    #[error("request timed out")]
    Timeout,
    #[error("rate limited")]
    RateLimited,
    #[error("network error: {0}")]
    Network(String),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("invalid session state: {0}")]
    InvalidState(String),
    #[error("viewer error: {0}")]
    Viewer(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AppError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::LoadFailure(_) => "LOAD_FAILURE",
            Self::AnnotationFailure { .. } => "ANNOTATION_FAILURE",
            Self::StreamTransport(_) => "STREAM_TRANSPORT",
            Self::StreamDecode(_) => "STREAM_DECODE",
            Self::Timeout => "TIMEOUT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Viewer(_) => "VIEWER_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::RateLimited | Self::Network(_) => true,
            Self::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidPayload(value.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else if value.is_decode() {
            Self::InvalidPayload(value.to_string())
        } else {
            Self::Network(value.to_string())
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
