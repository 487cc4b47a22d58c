pub mod accent;
pub mod google;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::AppError;

pub use accent::{Accent, AccentInfo};
pub use google::GoogleTts;

/// A text-to-speech backend returning MP3 bytes.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        accent: Accent,
    ) -> Result<Vec<u8>, AppError>;
}

pub struct NarrationService {
    provider: Arc<dyn SpeechProvider>,
    scratch_dir: PathBuf,
    language: String,
}

impl NarrationService {
    pub fn new(provider: Arc<dyn SpeechProvider>, scratch_dir: PathBuf, language: String) -> Self {
        Self {
            provider,
            scratch_dir,
            language,
        }
    }

    /// Narrate `text` and return the audio base64-encoded for a data URI.
    pub async fn narrate(&self, text: &str, accent: Accent) -> Result<String, AppError> {
        // 1. Synthesize
        let audio = self.provider.synthesize(text, &self.language, accent).await?;

        // 2. Round-trip through a scratch file; removed when `scratch` drops
        let scratch = ScratchFile::new(&self.scratch_dir);
        tokio::fs::write(scratch.path(), &audio)
            .await
            .map_err(|e| AppError::Narration(format!("failed to write audio: {}", e)))?;
        let bytes = tokio::fs::read(scratch.path())
            .await
            .map_err(|e| AppError::Narration(format!("failed to read audio: {}", e)))?;
        drop(scratch);

        // 3. Encode
        Ok(STANDARD.encode(bytes))
    }
}

/// A uniquely named file in the scratch directory, deleted on drop.
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("audio_{}.mp3", uuid::Uuid::new_v4().simple())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!("Could not remove {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    pub(crate) struct FakeSpeech {
        pub fail_on: Option<&'static str>,
        pub calls: Mutex<Vec<(String, String, Accent)>>,
    }

    impl FakeSpeech {
        pub(crate) fn ok() -> Self {
            Self {
                fail_on: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing_on(text: &'static str) -> Self {
            Self {
                fail_on: Some(text),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SpeechProvider for FakeSpeech {
        async fn synthesize(
            &self,
            text: &str,
            language: &str,
            accent: Accent,
        ) -> Result<Vec<u8>, AppError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), language.to_string(), accent));
            if self.fail_on.map(|f| text.contains(f)).unwrap_or(false) {
                return Err(AppError::Narration("speech endpoint returned 503".into()));
            }
            Ok(format!("mp3:{}", text).into_bytes())
        }
    }

    fn dir_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn returns_base64_and_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeSpeech::ok());
        let service = NarrationService::new(provider.clone(), dir.path().to_path_buf(), "en".into());

        let encoded = service.narrate("Hello", Accent::Canada).await.unwrap();

        assert_eq!(STANDARD.decode(encoded).unwrap(), b"mp3:Hello".to_vec());
        assert_eq!(dir_entries(dir.path()), 0);
        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[0], ("Hello".to_string(), "en".to_string(), Accent::Canada));
    }

    #[tokio::test]
    async fn provider_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let service = NarrationService::new(
            Arc::new(FakeSpeech::failing_on("Hello")),
            dir.path().to_path_buf(),
            "en".into(),
        );

        let err = service.narrate("Hello", Accent::Us).await.unwrap_err();
        assert!(matches!(err, AppError::Narration(_)));
        assert_eq!(dir_entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn missing_scratch_dir_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let service = NarrationService::new(Arc::new(FakeSpeech::ok()), missing.clone(), "en".into());

        let err = service.narrate("Hello", Accent::Us).await.unwrap_err();
        assert!(matches!(err, AppError::Narration(msg) if msg.contains("write")));
        assert!(!missing.exists());
    }

    #[test]
    fn scratch_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchFile::new(dir.path());
        std::fs::write(scratch.path(), b"data").unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.exists());

        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn scratch_file_drop_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchFile::new(dir.path());
        let name = scratch.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("audio_") && name.ends_with(".mp3"));
        drop(scratch);
    }

    #[test]
    fn scratch_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = ScratchFile::new(dir.path());
        let b = ScratchFile::new(dir.path());
        assert_ne!(a.path(), b.path());
    }
}
