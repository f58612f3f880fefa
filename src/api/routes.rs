use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health::health_check;
use super::trainings::training_routes;
use super::users::user_routes;
use crate::auth::{cors_layer, security_headers_layer, AuthService};
use crate::services::{IngestionPipeline, TrainingSessionStore};

/// Shared handles for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub sessions: Arc<dyn TrainingSessionStore>,
    pub ingestion: IngestionPipeline,
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/users", user_routes(state.auth.clone()))
        .nest("/api/trainings", training_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(security_headers_layer())
        .layer(cors_layer())
}
