use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::document::ExtractError;
use crate::llm_client::LlmError;
use crate::matching::interpreter::InterpretError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The first six variants are the matching pipeline's failure taxonomy. All of
/// them are terminal for the request that produced them and are never retried.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Document unreadable: {0}")]
    DocumentUnreadable(String),

    #[error("Document contains no extractable text")]
    EmptyDocument,

    #[error("No resume on file")]
    NoResumeOnFile,

    #[error("Model '{0}' is not available")]
    ModelUnavailable(String),

    #[error("Model communication error: {0}")]
    CommunicationError(String),

    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code used in error bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DocumentUnreadable(_) => "DOCUMENT_UNREADABLE",
            AppError::EmptyDocument => "EMPTY_DOCUMENT",
            AppError::NoResumeOnFile => "NO_RESUME_ON_FILE",
            AppError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            AppError::CommunicationError(_) => "COMMUNICATION_ERROR",
            AppError::MalformedModelOutput(_) => "MALFORMED_MODEL_OUTPUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DocumentUnreadable(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::EmptyDocument => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NoResumeOnFile => StatusCode::BAD_REQUEST,
            AppError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::CommunicationError(_) | AppError::MalformedModelOutput(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short user-facing message. Internal diagnostics are logged, never returned.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DocumentUnreadable(_) => {
                "The uploaded file could not be read. Please upload a PDF.".to_string()
            }
            AppError::EmptyDocument => "No text could be extracted from the document.".to_string(),
            AppError::NoResumeOnFile => "No resume found for the current user. \
                Please upload a resume in your account settings."
                .to_string(),
            AppError::ModelUnavailable(model) => {
                format!("The language model '{model}' is not ready yet.")
            }
            AppError::CommunicationError(_) => {
                "The language model could not be reached.".to_string()
            }
            AppError::MalformedModelOutput(_) => {
                "The language model returned an answer that could not be interpreted.".to_string()
            }
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Unauthorized => "Authentication required".to_string(),
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Storage(_) => "A storage error occurred".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    fn log(&self) {
        match self {
            AppError::Database(e) => tracing::error!("Database error: {e}"),
            AppError::Storage(msg) => tracing::error!("Storage error: {msg}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            AppError::CommunicationError(msg) => tracing::error!("LLM communication error: {msg}"),
            AppError::MalformedModelOutput(msg) => tracing::warn!("Malformed model output: {msg}"),
            AppError::DocumentUnreadable(msg) => tracing::warn!("Unreadable document: {msg}"),
            AppError::ModelUnavailable(model) => tracing::warn!("Model {model} not loaded"),
            _ => {}
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::Unreadable(msg) => AppError::DocumentUnreadable(msg),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::ModelUnavailable(model) => AppError::ModelUnavailable(model),
            other => AppError::CommunicationError(other.to_string()),
        }
    }
}

impl From<InterpretError> for AppError {
    fn from(e: InterpretError) -> Self {
        AppError::MalformedModelOutput(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.user_message()
            }
        }));

        (self.status(), body).into_response()
    }
}
