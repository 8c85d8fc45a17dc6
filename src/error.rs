use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("Insufficient savings balance")]
    InsufficientBalance { available: Decimal },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized | ApiError::InvalidToken | ApiError::InvalidCredentials => {
                tracing::warn!("Auth failure: {}", self);
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden => {
                tracing::warn!("Role check failed");
                StatusCode::FORBIDDEN
            }
            ApiError::Validation(msg) => {
                tracing::warn!("Validation failure: {}", msg);
                StatusCode::BAD_REQUEST
            }
            ApiError::InsufficientBalance { available } => {
                tracing::warn!("Insufficient balance, available={}", available);
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(what) => {
                tracing::warn!("Not found: {}", what);
                StatusCode::NOT_FOUND
            }
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // clients only ever see {error}, plus the available balance on a
        // rejected withdrawal; internals stay in the logs
        let body = match &self {
            ApiError::InsufficientBalance { available } => Json(json!({
                "error": self.to_string(),
                "available_balance": available,
            })),
            ApiError::Database(_) | ApiError::Internal(_) => Json(json!({
                "error": "Internal server error",
            })),
            _ => Json(json!({ "error": self.to_string() })),
        };

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::Database(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(error: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("password hashing failed: {error}"))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
