use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_JWT_SECRET: &str = "your-secret-key-change-in-production";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    /// Echo raw password-reset tokens back to the caller (development only)
    pub expose_reset_tokens: bool,
    pub ocr: OcrConfig,
}

/// Settings for the OCR provider and the image preprocessing that feeds it
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub resize_width: u32,
    pub language: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Unset values fall back to
    /// production defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("PORT")
            .and_then(|port| port.parse().ok())
            .unwrap_or(3000);
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "production".to_string());
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string());
        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("fitness-tracker-uploads"));
        let expose_reset_tokens = lookup("EXPOSE_RESET_TOKENS")
            .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let config = AppConfig {
            host,
            port,
            environment,
            log_level,
            jwt_secret,
            upload_dir,
            expose_reset_tokens,
            ocr: OcrConfig::from_lookup(&lookup),
        };
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.is_development() && self.jwt_secret == DEFAULT_JWT_SECRET {
            bail!("JWT_SECRET must be set outside development");
        }
        if self.expose_reset_tokens && !self.is_development() {
            bail!("EXPOSE_RESET_TOKENS is only allowed in development");
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl OcrConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        OcrConfig {
            api_url: lookup("OCR_API_URL").unwrap_or(defaults.api_url),
            api_key: lookup("OCR_API_KEY").filter(|key| !key.is_empty()),
            timeout: lookup("OCR_TIMEOUT_SECS")
                .and_then(|secs| secs.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            resize_width: lookup("OCR_RESIZE_WIDTH")
                .and_then(|width| width.parse().ok())
                .unwrap_or(defaults.resize_width),
            language: lookup("OCR_LANGUAGE").unwrap_or(defaults.language),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8884/ocr".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            resize_width: 1600,
            language: "eng".to_string(),
        }
    }
}
