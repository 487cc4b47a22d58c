use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, instrument};

use super::{Accent, SpeechProvider};
use crate::error::AppError;

pub const DEFAULT_ENDPOINT: &str = "https://translate.google.{tld}/translate_tts";

/// The endpoint rejects requests with more text than this.
pub const MAX_CHUNK_CHARS: usize = 100;

lazy_static! {
    static ref SENTENCE_PIECE: Regex = Regex::new(
        r"(?x)
        [^.!?;:,\n]+[.!?;:,]*   # text run with its trailing punctuation
        |
        [.!?;:,]+               # stray punctuation
        "
    )
    .unwrap();
}

/// Speech from Google Translate's TTS endpoint, one request per chunk.
pub struct GoogleTts {
    client: Client,
    endpoint: String,
}

impl GoogleTts {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT.to_string())
    }

    /// `endpoint` may contain `{tld}`, replaced by the accent's domain.
    pub fn with_endpoint(endpoint: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    fn endpoint_for(&self, accent: Accent) -> String {
        self.endpoint.replace("{tld}", accent.tld())
    }
}

impl Default for GoogleTts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechProvider for GoogleTts {
    #[instrument(skip_all, fields(accent = accent.label(), lang = language))]
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        accent: Accent,
    ) -> Result<Vec<u8>, AppError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(AppError::Narration("no speakable text".into()));
        }

        let url = self.endpoint_for(accent);
        let total = chunks.len().to_string();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            debug!(idx, total = chunks.len(), "Requesting speech chunk");
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();

            let response = self
                .client
                .get(&url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("q", chunk.as_str()),
                    ("tl", language),
                    ("client", "tw-ob"),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await
                .map_err(|e| AppError::Narration(format!("request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(AppError::Narration(format!(
                    "speech endpoint returned {}",
                    status.as_u16()
                )));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| AppError::Narration(format!("failed to read audio: {}", e)))?;
            audio.extend_from_slice(&bytes);
        }

        Ok(audio)
    }
}

/// Break text into pieces of at most `max_chars` characters, preferring
/// punctuation boundaries, then whitespace, then a hard cut.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    let pieces = SENTENCE_PIECE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|p| p.chars().any(char::is_alphanumeric));

    for piece in pieces {
        if fits(&current, piece, max_chars) {
            append(&mut current, piece);
            continue;
        }

        flush(&mut current, &mut chunks);

        for word in piece.split_whitespace() {
            if word.chars().count() > max_chars {
                flush(&mut current, &mut chunks);
                let chars: Vec<char> = word.chars().collect();
                for part in chars.chunks(max_chars) {
                    chunks.push(part.iter().collect());
                }
            } else if fits(&current, word, max_chars) {
                append(&mut current, word);
            } else {
                flush(&mut current, &mut chunks);
                current.push_str(word);
            }
        }
    }

    flush(&mut current, &mut chunks);
    chunks
}

fn fits(current: &str, next: &str, max_chars: usize) -> bool {
    let sep = usize::from(!current.is_empty());
    current.chars().count() + sep + next.chars().count() <= max_chars
}

fn append(current: &mut String, next: &str) {
    if !current.is_empty() {
        current.push(' ');
    }
    current.push_str(next);
}

fn flush(current: &mut String, chunks: &mut Vec<String>) {
    if !current.is_empty() {
        chunks.push(std::mem::take(current));
    }
}
