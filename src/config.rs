use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://pollinations.ai/p";

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub image_base_url: String,
    pub image_model: String,
    pub image_timeout: Duration,
    pub tts_language: String,
    pub cache_dir: PathBuf,
    pub static_dir: PathBuf,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is honoured if present. A
    /// missing or blank `GEMINI_API_KEY` is an error.
    pub fn from_env() -> Result<Self, AppError> {
        // Absent .env is fine; real environment variables still apply.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let gemini_api_key = lookup("GEMINI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Config("GEMINI_API_KEY is not set".into()))?;

        let port = var("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("PORT must be a number: {}", e)))?;

        let timeout_secs = var("IMAGE_TIMEOUT_SECS", "15")
            .parse::<u64>()
            .map_err(|e| AppError::Config(format!("IMAGE_TIMEOUT_SECS must be a number: {}", e)))?;

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port,
            gemini_api_key,
            gemini_model: var("GEMINI_MODEL", "gemini-pro"),
            gemini_base_url: var("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            image_base_url: var("IMAGE_BASE_URL", DEFAULT_IMAGE_BASE_URL),
            image_model: var("IMAGE_MODEL", "flux"),
            image_timeout: Duration::from_secs(timeout_secs),
            tts_language: var("TTS_LANGUAGE", "en"),
            cache_dir: var("CACHE_DIR", ".cache").into(),
            static_dir: var("STATIC_DIR", "static").into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn blank_api_key_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "secret")])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.gemini_model, "gemini-pro");
        assert_eq!(config.image_model, "flux");
        assert_eq!(config.image_timeout, Duration::from_secs(15));
        assert_eq!(config.tts_language, "en");
        assert_eq!(config.cache_dir, PathBuf::from(".cache"));
    }

    #[test]
    fn overrides_apply() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("PORT", "8080"),
            ("IMAGE_TIMEOUT_SECS", "3"),
            ("CACHE_DIR", "/tmp/tales"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.image_timeout, Duration::from_secs(3));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/tales"));
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k"), ("PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
