use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Debt not found: {0}")]
    DebtNotFound(String),

    #[error("Bill not found: {0}")]
    BillNotFound(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    State(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<plan_engine::EngineError> for ApiError {
    fn from(err: plan_engine::EngineError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::UserNotFound(_)
            | ApiError::PaymentNotFound(_)
            | ApiError::DebtNotFound(_)
            | ApiError::BillNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::InvalidReference(_) | ApiError::Validation(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::State(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::IoError(_) | ApiError::JsonError(_) | ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
