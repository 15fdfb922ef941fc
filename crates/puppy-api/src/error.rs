use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database connection not available")]
    Unavailable,
    #[error("{message}: {detail}")]
    BadRequest {
        message: &'static str,
        detail: String,
    },
    #[error("Event not found")]
    NotFound,
    #[error("{message}: {detail}")]
    Internal {
        message: &'static str,
        detail: String,
    },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl AppError {
    pub fn bad_request(message: &'static str, detail: impl Into<String>) -> Self {
        Self::BadRequest {
            message,
            detail: detail.into(),
        }
    }

    /// Map a store failure for the operation described by `message`
    /// (e.g. "Error creating event").
    pub fn store(message: &'static str, error: puppy_core::Error) -> Self {
        use puppy_core::Error;

        match error {
            Error::Unavailable => Self::Unavailable,
            Error::NotFound(_) => Self::NotFound,
            error if error.is_unexpected() => Self::Internal {
                message,
                detail: error.to_string(),
            },
            error => Self::bad_request(message, error.to_string()),
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = match self {
            Self::Unavailable | Self::NotFound => ErrorBody {
                message: self.to_string(),
                error: None,
            },
            Self::BadRequest { message, detail } | Self::Internal { message, detail } => {
                ErrorBody {
                    message: message.to_string(),
                    error: Some(detail),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puppy_core::EventId;

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (puppy_core::Error::Unavailable, StatusCode::SERVICE_UNAVAILABLE),
            (
                puppy_core::Error::Conflict(EventId::new(1)),
                StatusCode::BAD_REQUEST,
            ),
            (
                puppy_core::Error::InvalidInput("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                puppy_core::Error::NotFound(EventId::new(1)),
                StatusCode::NOT_FOUND,
            ),
            (
                puppy_core::Error::Database("corrupt row".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(AppError::store("Error creating event", error).status(), expected);
        }
    }

    #[test]
    fn conflict_keeps_operation_message_and_detail() {
        let error = AppError::store(
            "Error creating event",
            puppy_core::Error::Conflict(EventId::new(9)),
        );
        let text = error.to_string();
        assert!(text.starts_with("Error creating event: "));
        assert!(text.contains('9'));
    }
}
