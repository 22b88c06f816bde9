/*!
 * Transcription provider implementations.
 *
 * A transcriber turns a video into raw model output that should contain a
 * `{ "subtitles": [...] }` document:
 * - Gemini: Google generative language API, video sent inline
 * - Fallback: deterministic placeholder subtitles, no network
 * - Mock: scripted behaviours for tests
 */

use std::fmt::Debug;
use std::path::PathBuf;
use async_trait::async_trait;

use crate::errors::ProviderError;

pub mod fallback;
pub mod gemini;
pub mod mock;

/// One transcription request
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    /// Video to transcribe
    pub video_path: PathBuf,
    /// MIME type sent along with the video bytes
    pub mime_type: String,
    /// Instruction prompt
    pub prompt: String,
}

impl TranscriptionRequest {
    pub fn new(video_path: impl Into<PathBuf>, prompt: impl Into<String>) -> Self {
        let video_path = video_path.into();
        let mime_type = mime_type_for(&video_path).to_string();
        Self {
            video_path,
            mime_type,
            prompt: prompt.into(),
        }
    }
}

/// Common trait for all transcription providers
///
/// Implementations return the model's raw text. Extracting and validating the
/// subtitle document is left to the transcription service so every provider is
/// held to the same contract.
#[async_trait]
pub trait Transcriber: Send + Sync + Debug {
    /// Transcribe a video
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<String, ProviderError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// MIME type from the video file extension
pub fn mime_type_for(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("mpeg") | Some("mpg") => "video/mpeg",
        _ => "video/mp4",
    }
}
