use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use super::ImageSource;
use crate::error::AppError;

pub const STYLE_SUFFIX: &str = ", digital art style";
pub const IMAGE_WIDTH: u32 = 512;
pub const IMAGE_HEIGHT: u32 = 512;

/// Parameters for one rendered image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub seed: u32,
    pub model: String,
}

impl ImageRequest {
    pub fn for_scene(description: &str, seed: u32, model: &str) -> Self {
        Self {
            prompt: format!("{}{}", description, STYLE_SUFFIX),
            width: IMAGE_WIDTH,
            height: IMAGE_HEIGHT,
            seed,
            model: model.to_string(),
        }
    }

    /// The prompt becomes a single percent-encoded path segment.
    pub fn to_url(&self, base_url: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(base_url)
            .map_err(|e| AppError::ImageGeneration(format!("invalid base URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| AppError::ImageGeneration("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .push(&self.prompt);

        url.query_pairs_mut()
            .append_pair("width", &self.width.to_string())
            .append_pair("height", &self.height.to_string())
            .append_pair("seed", &self.seed.to_string())
            .append_pair("model", &self.model);

        Ok(url)
    }
}

pub struct PollinationsClient {
    client: Client,
    base_url: String,
}

impl PollinationsClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl ImageSource for PollinationsClient {
    #[instrument(skip_all, fields(seed = request.seed))]
    async fn render(&self, request: &ImageRequest) -> Result<(Url, Vec<u8>), AppError> {
        let url = request.to_url(&self.base_url)?;
        debug!(url = %url, "Requesting image");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::ImageGeneration("image request timed out".into())
                } else {
                    AppError::ImageGeneration(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ImageGeneration(format!(
                "image endpoint returned {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::ImageGeneration(format!("failed to read body: {}", e)))?;

        Ok((url, bytes.to_vec()))
    }
}
