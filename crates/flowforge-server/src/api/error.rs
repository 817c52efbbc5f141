// ABOUTME: Maps store, compile and run failures onto HTTP status codes with a JSON error body.
// ABOUTME: Every handler returns ApiError so the response shape is always {"error": message}.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use flowforge_runner::RunError;
use flowforge_store::{ManagerError, StoreError};

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    fn internal(message: String) -> Self {
        tracing::error!("{}", message);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let status = match &e {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::AlreadyExists { .. } => StatusCode::CONFLICT,
            StoreError::Mismatch { .. } | StoreError::InvalidName { .. } => StatusCode::BAD_REQUEST,
            StoreError::Malformed { .. } | StoreError::Io(_) | StoreError::Yaml(_) => {
                return Self::internal(e.to_string());
            }
        };
        Self::new(status, e.to_string())
    }
}

impl From<ManagerError> for ApiError {
    fn from(e: ManagerError) -> Self {
        match e {
            ManagerError::Store(e) => e.into(),
            ManagerError::Compile(e) => {
                tracing::warn!("compile failed: {}", e);
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<RunError> for ApiError {
    fn from(e: RunError) -> Self {
        match e {
            RunError::NotCompiled => Self::conflict(e.to_string()),
            RunError::Timeout(_) => Self::new(StatusCode::GATEWAY_TIMEOUT, e.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Malformed request bodies are the caller's fault, whatever axum decided.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}
