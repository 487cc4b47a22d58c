pub mod pollinations;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;
use reqwest::Url;

use crate::error::AppError;

pub use pollinations::{ImageRequest, PollinationsClient};

/// Produces raw image bytes for a render request.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn render(&self, request: &ImageRequest) -> Result<(Url, Vec<u8>), AppError>;
}

/// A decoded, validated image for one scene description.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub seed: u32,
    pub source_url: String,
}

impl GeneratedImage {
    pub fn decode(bytes: Vec<u8>, seed: u32, source_url: String) -> Result<Self, AppError> {
        let format = ::image::guess_format(&bytes)?;
        let decoded = ::image::load_from_memory_with_format(&bytes, format)?;

        Ok(Self {
            mime: format.to_mime_type().to_string(),
            width: decoded.width(),
            height: decoded.height(),
            bytes,
            seed,
            source_url,
        })
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Process-wide memo of generated images, keyed by scene description.
#[derive(Default)]
pub struct ImageCache {
    entries: RwLock<HashMap<String, Arc<GeneratedImage>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, description: &str) -> Option<Arc<GeneratedImage>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(description).cloned()
    }

    /// Insert unless another caller got there first; returns the stored value.
    pub fn insert(&self, description: &str, image: GeneratedImage) -> Arc<GeneratedImage> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            entries
                .entry(description.to_string())
                .or_insert_with(|| Arc::new(image)),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

pub struct ImageSynthesizer {
    source: Arc<dyn ImageSource>,
    cache: Arc<ImageCache>,
    model: String,
}

impl ImageSynthesizer {
    pub fn new(source: Arc<dyn ImageSource>, cache: Arc<ImageCache>, model: String) -> Self {
        Self {
            source,
            cache,
            model,
        }
    }

    /// Illustrate a scene. Successful results are memoized for the life of
    /// the cache, seed included; failures are not.
    pub async fn synthesize(&self, description: &str) -> Result<Arc<GeneratedImage>, AppError> {
        if let Some(image) = self.cache.get(description) {
            tracing::debug!("Image cache hit");
            return Ok(image);
        }

        let seed = rand::thread_rng().gen_range(1..=1000);
        let request = ImageRequest::for_scene(description, seed, &self.model);
        let (url, bytes) = self.source.render(&request).await?;

        let image = GeneratedImage::decode(bytes, seed, url.to_string())
            .map_err(|e| AppError::ImageGeneration(e.to_string()))?;

        let image = self.cache.insert(description, image);
        tracing::debug!(cached = self.cache.len(), seed = image.seed, "Image generated");
        Ok(image)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn tiny_png() -> Vec<u8> {
        let img = ::image::RgbImage::from_pixel(4, 3, ::image::Rgb([200, 100, 50]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ::image::ImageFormat::Png)
            .unwrap();
        out
    }

    pub(crate) struct FakeSource {
        pub calls: AtomicUsize,
        pub body: Option<Vec<u8>>,
    }

    impl FakeSource {
        pub(crate) fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                body: Some(tiny_png()),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                body: None,
            }
        }
    }

    #[async_trait]
    impl ImageSource for FakeSource {
        async fn render(&self, request: &ImageRequest) -> Result<(Url, Vec<u8>), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let url = request.to_url("http://images.test/p")?;
            match &self.body {
                Some(body) => Ok((url, body.clone())),
                None => Err(AppError::ImageGeneration("image request timed out".into())),
            }
        }
    }

    fn synthesizer(source: Arc<FakeSource>) -> (ImageSynthesizer, Arc<ImageCache>) {
        let cache = Arc::new(ImageCache::new());
        let synth = ImageSynthesizer::new(source, Arc::clone(&cache), "flux".into());
        (synth, cache)
    }

    #[test]
    fn decodes_png_metadata() {
        let image = GeneratedImage::decode(tiny_png(), 9, "u".into()).unwrap();
        assert_eq!(image.mime, "image/png");
        assert_eq!((image.width, image.height), (4, 3));
        assert_eq!(image.seed, 9);
        assert!(image.data_uri().starts_with("data:image/png;base64,iVBOR"));
    }

    #[test]
    fn rejects_non_image_bytes() {
        assert!(GeneratedImage::decode(b"<html>oops</html>".to_vec(), 1, "u".into()).is_err());
    }

    #[tokio::test]
    async fn identical_descriptions_are_memoized() {
        let source = Arc::new(FakeSource::ok());
        let (synth, cache) = synthesizer(Arc::clone(&source));

        let first = synth.synthesize("A quiet harbour").await.unwrap();
        let second = synth.synthesize("A quiet harbour").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.seed, second.seed);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn different_descriptions_are_fetched_separately() {
        let source = Arc::new(FakeSource::ok());
        let (synth, cache) = synthesizer(Arc::clone(&source));

        synth.synthesize("one").await.unwrap();
        synth.synthesize("two").await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn seed_is_in_range_and_in_url() {
        let (synth, _) = synthesizer(Arc::new(FakeSource::ok()));
        let image = synth.synthesize("forest").await.unwrap();
        assert!((1..=1000).contains(&image.seed));
        assert!(image.source_url.contains(&format!("seed={}", image.seed)));
        assert!(image.source_url.contains("model=flux"));
    }

    #[tokio::test]
    async fn failures_are_returned_and_not_cached() {
        let source = Arc::new(FakeSource::failing());
        let (synth, cache) = synthesizer(Arc::clone(&source));

        assert!(synth.synthesize("storm").await.is_err());
        assert!(synth.synthesize("storm").await.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn first_insert_wins() {
        let cache = ImageCache::new();
        let a = GeneratedImage::decode(tiny_png(), 1, "a".into()).unwrap();
        let b = GeneratedImage::decode(tiny_png(), 2, "b".into()).unwrap();

        let stored_a = cache.insert("k", a);
        let stored_b = cache.insert("k", b);
        assert!(Arc::ptr_eq(&stored_a, &stored_b));
        assert_eq!(stored_b.seed, 1);
    }
}
