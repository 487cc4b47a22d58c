//! Runs one story request end to end: validate, write, split, then
//! illustrate and narrate each scene in order.
//!
//! Stage failures arrive as typed errors; this module decides what the
//! reader is told about them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppError;
use crate::illustration::{GeneratedImage, ImageSynthesizer};
use crate::story::{self, Scene, StoryModel, DEFAULT_SCENES, MAX_SCENES, MIN_SCENES};
use crate::tts::{Accent, NarrationService};

#[derive(Debug, Clone, Deserialize)]
pub struct StoryRequest {
    #[serde(default)]
    pub theme: String,
    #[serde(default = "default_scenes")]
    pub scenes: usize,
    #[serde(default)]
    pub accent: Accent,
}

fn default_scenes() -> usize {
    DEFAULT_SCENES
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub level: Level,
    pub message: String,
}

impl Feedback {
    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Validating,
    GeneratingStory,
    SplittingScenes,
    RenderingScene(usize),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => write!(f, "idle"),
            Stage::Validating => write!(f, "validating"),
            Stage::GeneratingStory => write!(f, "generating story"),
            Stage::SplittingScenes => write!(f, "splitting scenes"),
            Stage::RenderingScene(n) => write!(f, "rendering scene {}", n),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedScene {
    pub scene: Scene,
    pub image: Option<Arc<GeneratedImage>>,
    /// Base64 MP3.
    pub audio: Option<String>,
    /// Notes shown beside the image.
    pub image_feedback: Vec<Feedback>,
    /// Notes shown beside the text and audio player.
    pub audio_feedback: Vec<Feedback>,
}

#[derive(Debug, Clone)]
pub struct StoryReport {
    pub theme: String,
    pub accent: Accent,
    pub requested_scenes: usize,
    pub feedback: Vec<Feedback>,
    pub scenes: Vec<RenderedScene>,
}

impl StoryReport {
    fn new(request: &StoryRequest, theme: &str) -> Self {
        Self {
            theme: theme.to_string(),
            accent: request.accent,
            requested_scenes: request.scenes,
            feedback: Vec::new(),
            scenes: Vec::new(),
        }
    }

    fn push(&mut self, level: Level, message: impl Into<String>) {
        self.feedback.push(Feedback::new(level, message));
    }
}

pub struct Storyteller {
    model: Arc<dyn StoryModel>,
    images: ImageSynthesizer,
    narration: NarrationService,
}

impl Storyteller {
    pub fn new(
        model: Arc<dyn StoryModel>,
        images: ImageSynthesizer,
        narration: NarrationService,
    ) -> Self {
        Self {
            model,
            images,
            narration,
        }
    }

    /// Handle one submission. Only malformed input is an `Err`; everything
    /// else ends up as feedback in the report.
    pub async fn tell(&self, request: StoryRequest) -> Result<StoryReport, AppError> {
        let mut stage = Stage::Validating;
        info!(%stage, "Story request received");

        if !(MIN_SCENES..=MAX_SCENES).contains(&request.scenes) {
            return Err(AppError::BadRequest(format!(
                "Scene count must be between {} and {}",
                MIN_SCENES, MAX_SCENES
            )));
        }

        let theme = request.theme.trim();
        let mut report = StoryReport::new(&request, theme);

        if theme.is_empty() {
            report.push(Level::Warning, "Please enter a theme or topic for your story.");
            return Ok(finish(report));
        }

        stage = Stage::GeneratingStory;
        info!(%stage, scenes = request.scenes, "Writing story");
        let story = match story::generate_story(self.model.as_ref(), theme, request.scenes).await {
            Ok(story) => story,
            Err(e) => {
                warn!(%stage, "Story generation failed: {}", e);
                report.push(Level::Error, format!("Error generating story: {}", e.detail()));
                report.push(Level::Error, "Failed to generate story. Please try again.");
                return Ok(finish(report));
            }
        };

        stage = Stage::SplittingScenes;
        info!(%stage, chars = story.len(), "Splitting story");
        let scenes = story::split_into_scenes(&story, request.scenes);
        if scenes.is_empty() {
            report.push(
                Level::Warning,
                "No valid scenes were generated. Please try again with a different prompt.",
            );
            return Ok(finish(report));
        }

        report.push(Level::Success, "Story generated successfully!");
        if scenes.len() < request.scenes {
            report.push(
                Level::Info,
                format!(
                    "The story came back with {} of the {} scenes requested.",
                    scenes.len(),
                    request.scenes
                ),
            );
        }

        for scene in scenes {
            stage = Stage::RenderingScene(scene.number);
            info!(%stage, "Rendering scene");
            let rendered = self.render_scene(scene, request.accent).await;
            report.scenes.push(rendered);
        }

        Ok(finish(report))
    }

    async fn render_scene(&self, scene: Scene, accent: Accent) -> RenderedScene {
        let mut image_feedback = Vec::new();
        let mut audio_feedback = Vec::new();

        let image = match self.images.synthesize(&scene.text).await {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(scene = scene.number, "Image generation failed: {}", e);
                image_feedback.push(Feedback::new(
                    Level::Error,
                    format!("Error generating image: {}", e.detail()),
                ));
                image_feedback.push(Feedback::new(
                    Level::Error,
                    "Unable to generate image for this scene.",
                ));
                None
            }
        };

        let audio = if scene.text.trim().is_empty() {
            audio_feedback.push(Feedback::new(Level::Warning, "This scene has no content."));
            None
        } else {
            match self.narration.narrate(&scene.text, accent).await {
                Ok(audio) => Some(audio),
                Err(e) => {
                    warn!(scene = scene.number, "Narration failed: {}", e);
                    audio_feedback.push(Feedback::new(
                        Level::Error,
                        format!("Error saving audio: {}", e.detail()),
                    ));
                    audio_feedback.push(Feedback::new(
                        Level::Warning,
                        "Audio narration unavailable for this scene.",
                    ));
                    None
                }
            }
        };

        RenderedScene {
            scene,
            image,
            audio,
            image_feedback,
            audio_feedback,
        }
    }
}

fn finish(report: StoryReport) -> StoryReport {
    info!(stage = %Stage::Idle, scenes = report.scenes.len(), "Story request finished");
    report
}
