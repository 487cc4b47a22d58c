use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    /// 1-based position in the story.
    pub number: usize,
    pub text: String,
}

lazy_static! {
    static ref BLANK_LINE: Regex = Regex::new(
        r"(?x)
        \r?\n          # end of a paragraph line
        [\ \t]*        # whitespace-only line content
        \r?\n          # end of the blank line
        "
    )
    .unwrap();
}

/// Split raw prose into at most `num_scenes` paragraphs.
pub fn split_into_scenes(story: &str, num_scenes: usize) -> Vec<Scene> {
    BLANK_LINE
        .split(story)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .take(num_scenes)
        .enumerate()
        .map(|(i, text)| Scene {
            number: i + 1,
            text: text.to_string(),
        })
        .collect()
}
