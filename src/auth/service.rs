use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::{
    generate_reset_token, hash_password, hash_reset_token, verify_password,
    RESET_TOKEN_TTL_MINUTES,
};
use crate::auth::{
    validate_height, validate_weight, AdminUpdateUserRequest, AuthError, AuthResponse,
    ChangePasswordRequest, ForgotPasswordRequest, ForgotPasswordResponse, JwtService,
    LoginRequest, MessageResponse, RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
    UserRole, UserSession,
};
use crate::models::{User, UserResponse};

const USER_COLUMNS: &str = "id, email, password_hash, date_of_birth, gender, weight_kg, height_cm, \
     is_admin, reset_token_hash, reset_token_expires_at, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    db: PgPool,
    expose_reset_tokens: bool,
}

impl AuthService {
    pub fn new(db: PgPool, jwt_secret: &str) -> Self {
        Self {
            jwt_service: JwtService::new(jwt_secret),
            db,
            expose_reset_tokens: false,
        }
    }

    /// Return reset tokens in the forgot-password response instead of only storing them.
    pub fn with_exposed_reset_tokens(mut self, expose: bool) -> Self {
        self.expose_reset_tokens = expose;
        self
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt_service
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AuthError> {
        request.validate()?;
        validate_weight(request.weight)?;
        if let Some(height) = request.height {
            validate_height(height)?;
        }

        let email = normalize_email(&request.email);
        if self.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&request.password)?;
        let now = Utc::now();

        let query = format!(
            "INSERT INTO users (id, email, password_hash, date_of_birth, gender, weight_kg, height_cm,
                                is_admin, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, false, $8, $8)
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&email)
            .bind(&password_hash)
            .bind(request.date_of_birth)
            .bind(request.gender.as_str())
            .bind(request.weight)
            .bind(request.height)
            .bind(now)
            .fetch_one(&self.db)
            .await
            .map_err(map_unique_violation)?;

        info!("Registered user {}", user.id);
        Ok(user.into())
    }

    /// Login user
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = self
            .get_user_by_email(&normalize_email(&request.email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let role = UserRole::from_is_admin(user.is_admin);
        let token = self
            .jwt_service
            .create_access_token(user.id, &user.email, role)?;

        Ok(AuthResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
            user: user.into(),
        })
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse, AuthError> {
        if let Some(weight) = request.weight {
            validate_weight(weight)?;
        }
        if let Some(height) = request.height {
            validate_height(height)?;
        }

        let query = format!(
            "UPDATE users
             SET weight_kg = COALESCE($2, weight_kg),
                 height_cm = COALESCE($3, height_cm),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .bind(request.weight)
            .bind(request.height)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user.into())
    }

    pub async fn update_height(&self, user_id: Uuid, height: f64) -> Result<UserResponse, AuthError> {
        self.update_profile(
            user_id,
            UpdateProfileRequest {
                weight: None,
                height: Some(height),
            },
        )
        .await
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<MessageResponse, AuthError> {
        let user = self.get_user_by_id(user_id).await?.ok_or(AuthError::UserNotFound)?;

        if !verify_password(&request.old_password, &user.password_hash)? {
            return Err(AuthError::IncorrectPassword);
        }

        let password_hash = hash_password(&request.new_password)?;
        self.set_password(user.id, &password_hash).await?;

        Ok(MessageResponse::new("Password changed successfully"))
    }

    /// Issue a one hour reset token. Unknown addresses get the same answer.
    pub async fn forgot_password(
        &self,
        request: ForgotPasswordRequest,
    ) -> Result<ForgotPasswordResponse, AuthError> {
        request.validate()?;

        let message = "If the address is registered, a password reset link has been sent".to_string();

        let Some(user) = self.get_user_by_email(&normalize_email(&request.email)).await? else {
            return Ok(ForgotPasswordResponse {
                message,
                reset_token: None,
            });
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        sqlx::query(
            "UPDATE users SET reset_token_hash = $2, reset_token_expires_at = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(hash_reset_token(&token))
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        info!("Issued password reset token for user {}", user.id);

        Ok(ForgotPasswordResponse {
            message,
            reset_token: self.expose_reset_tokens.then_some(token),
        })
    }

    pub async fn reset_password(
        &self,
        request: ResetPasswordRequest,
    ) -> Result<MessageResponse, AuthError> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE reset_token_hash = $1 AND reset_token_expires_at > NOW()"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(hash_reset_token(&request.token))
            .fetch_optional(&self.db)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let password_hash = hash_password(&request.new_password)?;
        self.set_password(user.id, &password_hash).await?;

        Ok(MessageResponse::new("Password reset successfully"))
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, AuthError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");

        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.db)
            .await?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn admin_update_user(
        &self,
        user_id: Uuid,
        request: AdminUpdateUserRequest,
    ) -> Result<UserResponse, AuthError> {
        request.validate()?;
        if let Some(weight) = request.weight {
            validate_weight(weight)?;
        }
        if let Some(height) = request.height {
            validate_height(height)?;
        }

        let query = format!(
            "UPDATE users
             SET email = COALESCE($2, email),
                 date_of_birth = COALESCE($3, date_of_birth),
                 gender = COALESCE($4, gender),
                 weight_kg = COALESCE($5, weight_kg),
                 height_cm = COALESCE($6, height_cm),
                 is_admin = COALESCE($7, is_admin),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .bind(request.email.as_deref().map(normalize_email))
            .bind(request.date_of_birth)
            .bind(request.gender.map(|gender| gender.as_str()))
            .bind(request.weight)
            .bind(request.height)
            .bind(request.is_admin)
            .fetch_optional(&self.db)
            .await
            .map_err(map_unique_violation)?
            .ok_or(AuthError::UserNotFound)?;

        info!("Admin updated user {}", user.id);
        Ok(user.into())
    }

    pub async fn delete_user(&self, user_id: Uuid) -> Result<MessageResponse, AuthError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }

        info!("Deleted user {}", user_id);
        Ok(MessageResponse::new("User deleted successfully"))
    }

    /// Validate user session from token
    pub fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        self.jwt_service.extract_user_session(token)
    }

    /// Check the stored admin flag; token claims can outlive a demotion or deletion
    pub async fn require_admin(&self, user_id: Uuid) -> Result<(), AuthError> {
        let user = self.get_user_by_id(user_id).await?;
        ensure_admin(user.as_ref())
    }

    // Private helper methods

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AuthError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// Also clears any outstanding reset token
    async fn set_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AuthError> {
        sqlx::query(
            "UPDATE users
             SET password_hash = $2, reset_token_hash = NULL, reset_token_expires_at = NULL,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

fn ensure_admin(user: Option<&User>) -> Result<(), AuthError> {
    match user {
        Some(user) if user.is_admin => Ok(()),
        _ => Err(AuthError::InsufficientPermissions),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn map_unique_violation(err: sqlx::Error) -> AuthError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AuthError::EmailAlreadyExists
        }
        _ => AuthError::Database(err),
    }
}
