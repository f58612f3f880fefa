use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::OcrConfig;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR provider unavailable: {0}")]
    Unavailable(String),
    #[error("OCR request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OCR request timed out")]
    Timeout,
}

/// Turns an image into the text printed on it.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize_text(&self, image: &[u8]) -> Result<String, OcrError>;
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    text: String,
}

/// OCR provider reached over HTTP.
///
/// The image is posted as multipart field `image` together with the
/// recognition language; the provider answers with `{"text": "..."}`.
#[derive(Clone)]
pub struct HttpOcrClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    language: String,
}

impl HttpOcrClient {
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }
}

#[async_trait]
impl TextRecognizer for HttpOcrClient {
    async fn recognize_text(&self, image: &[u8]) -> Result<String, OcrError> {
        let part = Part::bytes(image.to_vec())
            .file_name("console.png")
            .mime_str(mime::IMAGE_PNG.as_ref())?;
        let form = Form::new()
            .part("image", part)
            .text("language", self.language.clone());

        let mut request = self.client.post(&self.api_url).multipart(form);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                OcrError::Timeout
            } else {
                OcrError::Http(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("OCR provider returned {}: {}", status, error_text);
            return Err(OcrError::Unavailable(format!("status {}", status)));
        }

        let body = response.json::<OcrResponse>().await?;
        debug!("OCR provider returned {} characters", body.text.len());

        Ok(body.text)
    }
}
