//! Turns a photo of an exercise machine console into a stored training session.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::{CreateTrainingSession, ExtractedTrainingData, HeartRate, TrainingSession};
use crate::services::capture_timestamp::CaptureTimestampReader;
use crate::services::device_classifier::classify;
use crate::services::image_codec::{ImageCodec, ImageCodecError, ImageKind, PreprocessOptions};
use crate::services::ocr_service::TextRecognizer;
use crate::services::training_data_extractor::extract;
use crate::services::training_session_service::{StoreError, TrainingSessionStore};
use crate::services::unit_conversion::{average_speed, duration_to_seconds};
use crate::services::upload_staging::StagedUpload;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Unsupported image format, expected JPEG, PNG or GIF")]
    UnsupportedFormat,
    #[error("No training data could be extracted from the image")]
    NoTrainingDataExtracted,
    #[error("Failed to store training session: {0}")]
    Persistence(#[from] StoreError),
    #[error("Failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),
    #[error("Image could not be processed: {0}")]
    ImageProcessing(#[from] ImageCodecError),
    #[error("Image worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl IngestionError {
    /// Stable code clients can branch on
    pub fn kind(&self) -> &'static str {
        match self {
            IngestionError::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            IngestionError::NoTrainingDataExtracted => "NO_TRAINING_DATA_EXTRACTED",
            IngestionError::Persistence(_) => "PERSISTENCE_ERROR",
            IngestionError::Staging(_) => "STAGING_ERROR",
            IngestionError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            IngestionError::Worker(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            IngestionError::UnsupportedFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            IngestionError::NoTrainingDataExtracted => StatusCode::UNPROCESSABLE_ENTITY,
            IngestionError::ImageProcessing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            IngestionError::Persistence(_)
            | IngestionError::Staging(_)
            | IngestionError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IngestionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Ingestion failed: {}", self);
        }

        let body = Json(json!({
            "error_code": self.kind(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[derive(Debug, Clone)]
pub struct IngestionSettings {
    pub upload_dir: PathBuf,
    pub ocr_timeout: Duration,
    pub preprocess: PreprocessOptions,
}

impl IngestionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            ocr_timeout: config.ocr.timeout,
            preprocess: PreprocessOptions {
                resize_width: config.ocr.resize_width,
                ..Default::default()
            },
        }
    }
}

#[derive(Clone)]
pub struct IngestionPipeline {
    codec: Arc<dyn ImageCodec>,
    recognizer: Arc<dyn TextRecognizer>,
    timestamps: Arc<dyn CaptureTimestampReader>,
    store: Arc<dyn TrainingSessionStore>,
    settings: IngestionSettings,
}

impl IngestionPipeline {
    pub fn new(
        codec: Arc<dyn ImageCodec>,
        recognizer: Arc<dyn TextRecognizer>,
        timestamps: Arc<dyn CaptureTimestampReader>,
        store: Arc<dyn TrainingSessionStore>,
        settings: IngestionSettings,
    ) -> Self {
        Self {
            codec,
            recognizer,
            timestamps,
            store,
            settings,
        }
    }

    /// Run one upload through the whole pipeline and persist the result.
    ///
    /// OCR problems never fail the upload on their own; they surface as
    /// `NoTrainingDataExtracted` when nothing usable was recognized.
    #[tracing::instrument(skip(self, image), fields(size = image.len()))]
    pub async fn ingest(
        &self,
        image: &[u8],
        user_id: Uuid,
    ) -> Result<TrainingSession, IngestionError> {
        let staged = StagedUpload::stage(&self.settings.upload_dir, image).await?;
        let original = staged.read().await?;

        let kind = self.codec.detect_format(&original);
        if !kind.is_supported() {
            warn!("Rejected upload with unsupported format");
            return Err(IngestionError::UnsupportedFormat);
        }

        // Transcoding drops metadata, so read it from the original bytes
        let captured_at = self.timestamps.read_capture_timestamp(&original);

        let prepared = self.prepare_image(original, kind).await?;
        let text = self.recognize(&prepared).await;

        let extracted = extract(&text);
        if extracted.lacks_core_metrics() {
            warn!("No duration, calories or distance recognized in upload");
            return Err(IngestionError::NoTrainingDataExtracted);
        }

        let session = build_session(user_id, &extracted, captured_at.unwrap_or_else(Utc::now));
        let saved = self.store.save(session).await?;

        info!(
            "Ingested {} session {} for user {}",
            saved.device.as_str(),
            saved.id,
            user_id
        );
        Ok(saved)
    }

    async fn prepare_image(
        &self,
        original: Vec<u8>,
        kind: ImageKind,
    ) -> Result<Vec<u8>, IngestionError> {
        let codec = Arc::clone(&self.codec);
        let options = self.settings.preprocess.clone();

        let prepared = tokio::task::spawn_blocking(move || {
            let canonical = if kind == ImageKind::CANONICAL {
                original
            } else {
                codec.transcode(&original, ImageKind::CANONICAL)?
            };
            codec.preprocess(&canonical, &options)
        })
        .await??;

        Ok(prepared)
    }

    async fn recognize(&self, image: &[u8]) -> String {
        let timeout = self.settings.ocr_timeout;

        match tokio::time::timeout(timeout, self.recognizer.recognize_text(image)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                warn!("OCR returned no text");
                String::new()
            }
            Ok(Err(e)) => {
                warn!("OCR failed, continuing without text: {}", e);
                String::new()
            }
            Err(_) => {
                warn!("OCR timed out after {:?}, continuing without text", timeout);
                String::new()
            }
        }
    }
}

/// Normalize extracted metrics into a session record.
pub fn build_session(
    user_id: Uuid,
    data: &ExtractedTrainingData,
    date: DateTime<Utc>,
) -> CreateTrainingSession {
    let duration = data.duration.as_deref();

    CreateTrainingSession {
        user_id,
        date,
        duration_seconds: duration_to_seconds(duration),
        calories_burned: data.calories.unwrap_or(0),
        distance_km: data.distance_km.unwrap_or(0.0),
        avg_speed_kmh: average_speed(data.distance_km, duration),
        elevation: data.floors.unwrap_or(0),
        power_watts: data.power_watts.unwrap_or(0),
        heart_rate: HeartRate {
            max: data.max_heart_rate.unwrap_or(0),
            avg: data.avg_heart_rate.unwrap_or(0),
        },
        device: classify(data),
    }
}
