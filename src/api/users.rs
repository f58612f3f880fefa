use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{
    admin_only_middleware, jwt_auth_middleware, AdminUpdateUserRequest, AuthError, AuthResponse,
    AuthService, ChangePasswordRequest, ForgotPasswordRequest, ForgotPasswordResponse,
    LoginRequest, MessageResponse, RegisterRequest, ResetPasswordRequest, UpdateHeightRequest,
    UpdateProfileRequest, UserSession, UserUpdateResponse,
};
use crate::models::UserResponse;

/// Account routes, mounted under `/api/users`
pub fn user_routes(auth_service: AuthService) -> Router {
    let authenticated = Router::new()
        .route("/update-profile", put(update_profile))
        .route("/update-height", put(update_height))
        .route("/change-password", put(change_password))
        .route_layer(middleware::from_fn_with_state(
            auth_service.clone(),
            jwt_auth_middleware,
        ));

    // Layers run outermost-last, so authentication wraps the admin check
    let admin = Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", put(admin_update_user).delete(delete_user))
        .route_layer(middleware::from_fn_with_state(
            auth_service.clone(),
            admin_only_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            auth_service.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .merge(authenticated)
        .merge(admin)
        .with_state(auth_service)
}

#[tracing::instrument(skip(auth_service, request))]
async fn register(
    State(auth_service): State<AuthService>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AuthError> {
    let user = auth_service.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": user,
        })),
    ))
}

#[tracing::instrument(skip(auth_service, request))]
async fn login(
    State(auth_service): State<AuthService>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = auth_service.login(request).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(auth_service, session, request), fields(user_id = %session.user_id))]
async fn update_profile(
    State(auth_service): State<AuthService>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserUpdateResponse>, AuthError> {
    let user = auth_service.update_profile(session.user_id, request).await?;
    Ok(Json(UserUpdateResponse {
        message: "Profile updated successfully".to_string(),
        user,
    }))
}

#[tracing::instrument(skip(auth_service, session, request), fields(user_id = %session.user_id))]
async fn update_height(
    State(auth_service): State<AuthService>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<UpdateHeightRequest>,
) -> Result<Json<UserUpdateResponse>, AuthError> {
    let user = auth_service.update_height(session.user_id, request.height).await?;
    Ok(Json(UserUpdateResponse {
        message: "Height updated successfully".to_string(),
        user,
    }))
}

#[tracing::instrument(skip(auth_service, session, request), fields(user_id = %session.user_id))]
async fn change_password(
    State(auth_service): State<AuthService>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let response = auth_service.change_password(session.user_id, request).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(auth_service, request))]
async fn forgot_password(
    State(auth_service): State<AuthService>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AuthError> {
    let response = auth_service.forgot_password(request).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(auth_service, request))]
async fn reset_password(
    State(auth_service): State<AuthService>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let response = auth_service.reset_password(request).await?;
    Ok(Json(response))
}

/// List all users (admin only)
async fn list_users(
    State(auth_service): State<AuthService>,
) -> Result<Json<Vec<UserResponse>>, AuthError> {
    let users = auth_service.list_users().await?;
    Ok(Json(users))
}

#[tracing::instrument(skip(auth_service, request))]
async fn admin_update_user(
    State(auth_service): State<AuthService>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<AdminUpdateUserRequest>,
) -> Result<Json<UserUpdateResponse>, AuthError> {
    let user = auth_service.admin_update_user(user_id, request).await?;
    Ok(Json(UserUpdateResponse {
        message: "User updated successfully".to_string(),
        user,
    }))
}

#[tracing::instrument(skip(auth_service))]
async fn delete_user(
    State(auth_service): State<AuthService>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AuthError> {
    let response = auth_service.delete_user(user_id).await?;
    Ok(Json(response))
}
