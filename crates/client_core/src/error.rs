use reqwest::StatusCode;
use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("record has no id; only persisted records can be updated")]
    MissingId,
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: StatusCode,
        body: String,
    },
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GatewayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidBaseUrl { .. } | Self::MissingId => ErrorCode::Validation,
            Self::Transport { .. } => ErrorCode::Transport,
            Self::Status { .. } => ErrorCode::Status,
            Self::Decode { .. } => ErrorCode::Decode,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        ApiError::new(self.code(), self.to_string())
    }
}
