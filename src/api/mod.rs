pub mod handlers;
pub mod routes;

use serde::Serialize;

use crate::storyteller::{Feedback, RenderedScene, StoryReport};
use crate::tts::{Accent, AccentInfo};

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub theme: String,
    pub accent: Accent,
    pub requested_scenes: usize,
    pub feedback: Vec<Feedback>,
    pub scenes: Vec<SceneView>,
}

#[derive(Debug, Serialize)]
pub struct SceneView {
    pub number: usize,
    pub text: String,
    pub image: Option<ImageView>,
    /// `data:audio/mp3;base64,...`
    pub audio: Option<String>,
    pub image_feedback: Vec<Feedback>,
    pub audio_feedback: Vec<Feedback>,
}

#[derive(Debug, Serialize)]
pub struct ImageView {
    pub src: String,
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub seed: u32,
    pub source_url: String,
}

#[derive(Debug, Serialize)]
pub struct AccentsResponse {
    pub accents: Vec<AccentInfo>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl From<StoryReport> for StoryResponse {
    fn from(report: StoryReport) -> Self {
        Self {
            theme: report.theme,
            accent: report.accent,
            requested_scenes: report.requested_scenes,
            feedback: report.feedback,
            scenes: report.scenes.into_iter().map(SceneView::from).collect(),
        }
    }
}

impl From<RenderedScene> for SceneView {
    fn from(rendered: RenderedScene) -> Self {
        Self {
            number: rendered.scene.number,
            text: rendered.scene.text,
            image: rendered.image.map(|image| ImageView {
                src: image.data_uri(),
                mime: image.mime.clone(),
                width: image.width,
                height: image.height,
                seed: image.seed,
                source_url: image.source_url.clone(),
            }),
            audio: rendered
                .audio
                .map(|b64| format!("data:audio/mp3;base64,{}", b64)),
            image_feedback: rendered.image_feedback,
            audio_feedback: rendered.audio_feedback,
        }
    }
}
