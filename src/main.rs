use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod illustration;
mod story;
mod storyteller;
mod tts;

use api::routes::{create_router, AppState};
use config::Config;
use illustration::{ImageCache, ImageSynthesizer, PollinationsClient};
use story::GeminiClient;
use storyteller::Storyteller;
use tts::{GoogleTts, NarrationService};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Configuration from environment; a missing API key stops here
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = std::fs::create_dir_all(&config.cache_dir) {
        tracing::error!("Failed to create cache directory {}: {}", config.cache_dir.display(), e);
        std::process::exit(1);
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid address");

    tracing::info!("SpeakTales Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Starting server on http://{}", addr);
    tracing::info!("Story model: {}", config.gemini_model);
    tracing::info!("Cache directory: {}", config.cache_dir.display());

    // Create pipeline services
    let model = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    ));

    let image_source = match PollinationsClient::new(config.image_base_url.clone(), config.image_timeout) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to build image client: {}", e);
            std::process::exit(1);
        }
    };
    let images = ImageSynthesizer::new(
        image_source,
        Arc::new(ImageCache::new()),
        config.image_model.clone(),
    );

    let narration = NarrationService::new(
        Arc::new(GoogleTts::new()),
        config.cache_dir.clone(),
        config.tts_language.clone(),
    );

    // Create app state
    let state = Arc::new(AppState {
        storyteller: Storyteller::new(model, images, narration),
        static_dir: config.static_dir.clone(),
    });

    // Create router
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
