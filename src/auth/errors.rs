use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Incorrect old password")]
    IncorrectPassword,
    #[error("User not found")]
    UserNotFound,
    #[error("Email already exists")]
    EmailAlreadyExists,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid or expired reset token")]
    InvalidResetToken,
    #[error("Missing authorization header")]
    MissingAuthHeader,
    #[error("Invalid authorization header format")]
    InvalidAuthHeaderFormat,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Password validation failed: {0}")]
    PasswordValidation(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing error: {0}")]
    PasswordHashing(crate::auth::password::PasswordError),
}

impl From<crate::auth::password::PasswordError> for AuthError {
    fn from(err: crate::auth::password::PasswordError) -> Self {
        if err.is_policy_violation() {
            AuthError::PasswordValidation(err.to_string())
        } else {
            AuthError::PasswordHashing(err)
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::Validation(errors.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthError::IncorrectPassword => (StatusCode::BAD_REQUEST, "Incorrect old password"),
            AuthError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AuthError::EmailAlreadyExists => (StatusCode::CONFLICT, "Email already exists"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
            AuthError::InvalidResetToken => (StatusCode::BAD_REQUEST, "Invalid or expired reset token"),
            AuthError::MissingAuthHeader => (StatusCode::UNAUTHORIZED, "Missing authorization header"),
            AuthError::InvalidAuthHeaderFormat => (StatusCode::UNAUTHORIZED, "Invalid authorization header format"),
            AuthError::InsufficientPermissions => (StatusCode::FORBIDDEN, "Insufficient permissions"),
            AuthError::PasswordValidation(_) => (StatusCode::BAD_REQUEST, "Password validation failed"),
            AuthError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
            AuthError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
            AuthError::Jwt(_) => (StatusCode::UNAUTHORIZED, "Token error"),
            AuthError::PasswordHashing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Password processing error"),
        };

        if status.is_server_error() {
            tracing::error!("Auth request failed: {}", self);
        }

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
