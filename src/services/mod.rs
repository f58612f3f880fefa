// Business logic services

pub mod capture_timestamp;
pub mod device_classifier;
pub mod image_codec;
pub mod ingestion_service;
pub mod ocr_service;
pub mod summary_service;
pub mod training_data_extractor;
pub mod training_session_service;
pub mod unit_conversion;
pub mod upload_staging;

pub use capture_timestamp::{CaptureTimestampReader, ExifTimestampReader};
pub use image_codec::{ImageCodec, ImageKind, PreprocessOptions, RasterImageCodec};
pub use ingestion_service::{IngestionError, IngestionPipeline, IngestionSettings};
pub use ocr_service::{HttpOcrClient, OcrError, TextRecognizer};
pub use summary_service::{monthly_summary, SummaryError};
pub use training_session_service::{StoreError, TrainingSessionService, TrainingSessionStore};
