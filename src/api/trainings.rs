use axum::{
    extract::{
        multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit, Multipart, Path,
        Query, State,
    },
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Router,
};
use axum_extra::extract::WithRejection;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::api::routes::AppState;
use crate::auth::{jwt_auth_middleware, UserSession};
use crate::models::{
    CreateTrainingSessionRequest, SummaryReport, TrainingSession, UpdateTrainingSession,
};
use crate::services::summary_service::monthly_summary;
use crate::services::unit_conversion::speed_from_seconds;
use crate::services::{IngestionError, StoreError, SummaryError, TrainingSessionStore};

/// Largest accepted console photo
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum TrainingApiError {
    #[error("Training session not found")]
    NotFound,
    #[error("Not allowed to access this training session")]
    Forbidden,
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
    #[error(transparent)]
    Ingestion(#[from] IngestionError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<MultipartError> for TrainingApiError {
    fn from(err: MultipartError) -> Self {
        TrainingApiError::InvalidUpload(err.body_text())
    }
}

impl From<validator::ValidationErrors> for TrainingApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        TrainingApiError::Validation(errors.to_string())
    }
}

impl From<SummaryError> for TrainingApiError {
    fn from(err: SummaryError) -> Self {
        match err {
            SummaryError::Store(store) => TrainingApiError::Store(store),
            invalid @ SummaryError::InvalidMonth { .. } => {
                TrainingApiError::Validation(invalid.to_string())
            }
        }
    }
}

impl IntoResponse for TrainingApiError {
    fn into_response(self) -> Response {
        // Upload failures carry their own `error_code` body
        if let TrainingApiError::Ingestion(err) = self {
            return err.into_response();
        }

        let (status, error_message) = match &self {
            TrainingApiError::Ingestion(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Ingestion failed"),
            TrainingApiError::NotFound => (StatusCode::NOT_FOUND, "Training session not found"),
            TrainingApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            TrainingApiError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
            TrainingApiError::InvalidBody(rejection) => (rejection.status(), "Invalid request body"),
            TrainingApiError::InvalidUpload(_) => (StatusCode::BAD_REQUEST, "Invalid upload"),
            TrainingApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
        };

        if status.is_server_error() {
            tracing::error!("Training request failed: {}", self);
        }

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    /// Maximum number of items to return (default: 50, max: 100)
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    pub offset: Option<i64>,
}

impl PaginationQuery {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(limit) = self.limit {
            if !(1..=100).contains(&limit) {
                return Err("Limit must be between 1 and 100");
            }
        }
        if let Some(offset) = self.offset {
            if offset < 0 {
                return Err("Offset must be non-negative");
            }
        }
        Ok(())
    }

    pub fn get_limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }

    pub fn get_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Training routes, mounted under `/api/trainings`; every route requires a bearer token
pub fn training_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/upload-image",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/", post(create_session).get(list_sessions))
        .route("/summary/:month/:year", get(summary))
        .route(
            "/:id",
            get(get_session).put(update_session).delete(delete_session),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

/// Run an uploaded console photo through OCR and store the recognized session
#[tracing::instrument(skip(state, session, multipart), fields(user_id = %session.user_id))]
async fn upload_image(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<TrainingSession>), TrainingApiError> {
    let mut image: Option<Bytes> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            image = Some(field.bytes().await?);
            break;
        }
    }

    let image = image
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| TrainingApiError::InvalidUpload("Missing image field".to_string()))?;

    let created = state.ingestion.ingest(&image, session.user_id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn create_session(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    WithRejection(Json(request), _): WithRejection<Json<CreateTrainingSessionRequest>, TrainingApiError>,
) -> Result<(StatusCode, Json<TrainingSession>), TrainingApiError> {
    request.validate()?;

    let created = state
        .sessions
        .save(request.into_new_session(session.user_id))
        .await?;

    info!("Created training session {}", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn list_sessions(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Vec<TrainingSession>>, TrainingApiError> {
    pagination
        .validate()
        .map_err(|e| TrainingApiError::Validation(e.to_string()))?;

    let sessions = state
        .sessions
        .list_for_user(session.user_id, pagination.get_limit(), pagination.get_offset())
        .await?;

    Ok(Json(sessions))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn get_session(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<TrainingSession>, TrainingApiError> {
    let training = load_owned(state.sessions.as_ref(), session_id, &session).await?;
    Ok(Json(training))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn update_session(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(session_id): Path<Uuid>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateTrainingSession>, TrainingApiError>,
) -> Result<Json<TrainingSession>, TrainingApiError> {
    request.validate()?;

    let mut training = load_owned(state.sessions.as_ref(), session_id, &session).await?;
    request.apply_to(&mut training);

    let moved = request.distance_km.is_some() || request.duration_seconds.is_some();
    if moved && request.avg_speed_kmh.is_none() {
        training.avg_speed_kmh = speed_from_seconds(training.distance_km, training.duration_seconds);
    }

    let updated = state
        .sessions
        .update(&training)
        .await?
        .ok_or(TrainingApiError::NotFound)?;

    Ok(Json(updated))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn delete_session(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, TrainingApiError> {
    load_owned(state.sessions.as_ref(), session_id, &session).await?;

    if !state.sessions.delete(session_id).await? {
        return Err(TrainingApiError::NotFound);
    }

    info!("Deleted training session {}", session_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Monthly totals for the calling user
#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn summary(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path((month, year)): Path<(u32, i32)>,
) -> Result<Json<SummaryReport>, TrainingApiError> {
    let report = monthly_summary(state.sessions.as_ref(), session.user_id, month, year).await?;
    Ok(Json(report))
}

async fn load_owned(
    store: &dyn TrainingSessionStore,
    session_id: Uuid,
    caller: &UserSession,
) -> Result<TrainingSession, TrainingApiError> {
    let training = store
        .find_by_id(session_id)
        .await?
        .ok_or(TrainingApiError::NotFound)?;

    if training.user_id != caller.user_id {
        return Err(TrainingApiError::Forbidden);
    }

    Ok(training)
}
