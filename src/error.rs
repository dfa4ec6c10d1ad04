use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::services::{
    card_store::CardStoreError, deck_store::DeckStoreError, processor::ProcessError,
};

/// Error returned by route handlers, rendered as `{"error": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad input: malformed body, non-PDF upload, missing file.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Export subprocess failure. `details` is returned verbatim.
    #[error("{message}")]
    ExternalTool { message: String, details: Value },

    #[error("{0}")]
    Persistence(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ExternalTool { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = match self {
            ApiError::ExternalTool { message, details } => json!({
                "error": message,
                "details": details,
            }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<CardStoreError> for ApiError {
    fn from(e: CardStoreError) -> Self {
        match e {
            CardStoreError::NotFound(_) => ApiError::not_found("CSV file not found"),
            CardStoreError::InvalidName(_) => ApiError::validation(e.to_string()),
            CardStoreError::Csv(_) | CardStoreError::Io(_) => ApiError::Persistence(e.to_string()),
        }
    }
}

impl From<DeckStoreError> for ApiError {
    fn from(e: DeckStoreError) -> Self {
        match e {
            DeckStoreError::DeckNotFound(_) => ApiError::not_found("Deck not found"),
            DeckStoreError::CardNotFound(_) => ApiError::not_found("Card not found"),
            DeckStoreError::Json(_) | DeckStoreError::Io(_) => ApiError::Persistence(e.to_string()),
        }
    }
}

impl From<ProcessError> for ApiError {
    fn from(e: ProcessError) -> Self {
        match e {
            ProcessError::EmptyBatch => ApiError::validation("No files to process"),
            ProcessError::Registry(e) => {
                ApiError::Persistence(format!("Failed to start processing: {e}"))
            }
        }
    }
}

impl From<garde::Report> for ApiError {
    fn from(report: garde::Report) -> Self {
        ApiError::Validation(report.to_string())
    }
}
