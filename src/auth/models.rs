use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthError;
use crate::models::{Gender, UserResponse};

/// User roles for role-based access control
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Athlete,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Athlete => "athlete",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_is_admin(is_admin: bool) -> Self {
        if is_admin {
            UserRole::Admin
        } else {
            UserRole::Athlete
        }
    }
}

/// JWT token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // Subject (user ID)
    pub email: String,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub weight: f64,
    pub height: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub weight: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHeightRequest {
    pub height: f64,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Fields an administrator may change on any account
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: usize,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
    /// Only filled in development, where no mail delivery exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserUpdateResponse {
    pub message: String,
    pub user: UserResponse,
}

/// User session information
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub jti: String,
}

impl UserSession {
    pub fn from_claims(claims: &Claims) -> Result<Self, uuid::Error> {
        Ok(Self {
            user_id: Uuid::parse_str(&claims.sub)?,
            email: claims.email.clone(),
            role: claims.role,
            jti: claims.jti.clone(),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Body weight in kilograms, `0 < weight <= 500`
pub fn validate_weight(weight: f64) -> Result<(), AuthError> {
    if weight.is_finite() && weight > 0.0 && weight <= 500.0 {
        Ok(())
    } else {
        Err(AuthError::Validation("Invalid weight value".to_string()))
    }
}

/// Body height in centimetres, `50 < height <= 300`
pub fn validate_height(height: f64) -> Result<(), AuthError> {
    if height.is_finite() && height > 50.0 && height <= 300.0 {
        Ok(())
    } else {
        Err(AuthError::Validation("Invalid height value".to_string()))
    }
}
