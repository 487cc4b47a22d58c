pub mod gemini;
pub mod splitter;

use async_trait::async_trait;

use crate::error::AppError;

pub use gemini::GeminiClient;
pub use splitter::{split_into_scenes, Scene};

pub const MIN_SCENES: usize = 3;
pub const MAX_SCENES: usize = 10;
pub const DEFAULT_SCENES: usize = 5;

/// A text-generation backend that turns a prompt into prose.
#[async_trait]
pub trait StoryModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

/// Build the instruction sent to the text model.
pub fn build_prompt(theme: &str, num_scenes: usize) -> String {
    format!(
        "Write a short story based on the theme: '{}'. \
         The story should be divided into {} scenes. \
         Each scene should be a paragraph long. \
         Do not include 'Scene 1:', 'Scene 2:', etc. in the text.",
        theme, num_scenes
    )
}

/// Ask the model for a story. Blank output counts as a failure.
pub async fn generate_story(
    model: &dyn StoryModel,
    theme: &str,
    num_scenes: usize,
) -> Result<String, AppError> {
    let prompt = build_prompt(theme, num_scenes);
    let story = model.complete(&prompt).await?;

    if story.trim().is_empty() {
        return Err(AppError::StoryGeneration("model returned no text".into()));
    }

    Ok(story)
}
