//! User-visible failure notices raised by the controller.

use shared::error::{ApiError, ErrorCode};

use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeCategory {
    Transport,
    Backend,
    Decode,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeContext {
    Refresh,
    Save,
    Delete,
}

impl NoticeContext {
    fn describe(self) -> &'static str {
        match self {
            Self::Refresh => "Could not load averages",
            Self::Save => "Could not save the average",
            Self::Delete => "Could not delete the average",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    category: NoticeCategory,
    context: NoticeContext,
    error: ApiError,
}

impl Notice {
    pub fn from_gateway_error(context: NoticeContext, err: &GatewayError) -> Self {
        let error = err.to_api_error();
        let category = match error.code {
            ErrorCode::Transport => NoticeCategory::Transport,
            ErrorCode::Status => NoticeCategory::Backend,
            ErrorCode::Decode => NoticeCategory::Decode,
            ErrorCode::Validation => NoticeCategory::Validation,
        };
        Self {
            category,
            context,
            error,
        }
    }

    pub fn category(&self) -> NoticeCategory {
        self.category
    }

    pub fn context(&self) -> NoticeContext {
        self.context
    }

    pub fn error(&self) -> &ApiError {
        &self.error
    }

    /// One-line text suitable for a status bar or stderr.
    pub fn summary(&self) -> String {
        let hint = match self.category {
            NoticeCategory::Transport => "server unreachable; check the URL/network and retry",
            NoticeCategory::Backend => "the server rejected the request",
            NoticeCategory::Decode => "the server sent an unexpected response",
            NoticeCategory::Validation => "the request was not sent",
        };
        format!(
            "{}: {hint} ({})",
            self.context.describe(),
            self.error.message
        )
    }
}
