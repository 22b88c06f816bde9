use async_trait::async_trait;
use log::warn;
use serde_json::json;

use crate::errors::ProviderError;
use crate::providers::{Transcriber, TranscriptionRequest};

/// Deterministic transcriber used when no API key is configured
///
/// Always answers with the same three lines so the rest of the pipeline, fonts
/// and encoding can be exercised offline.
#[derive(Debug, Clone, Default)]
pub struct FallbackTranscriber;

impl FallbackTranscriber {
    pub fn new() -> Self {
        Self
    }

    /// The placeholder document as JSON text
    pub fn document_json() -> String {
        json!({
            "subtitles": [
                { "speaker": "Speaker 1", "line": "Hello this is a test subtitle", "startTime": 0.20, "endTime": 2.80 },
                { "speaker": "Speaker 1", "line": "The second line shows up here", "startTime": 3.00, "endTime": 5.50 },
                { "speaker": "Speaker 1", "line": "Good enough for font and encoding checks", "startTime": 6.00, "endTime": 9.00 }
            ]
        })
        .to_string()
    }
}

#[async_trait]
impl Transcriber for FallbackTranscriber {
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<String, ProviderError> {
        warn!(
            "Using placeholder subtitles for {} (no transcription API key configured)",
            request.video_path.display()
        );
        Ok(Self::document_json())
    }

    fn name(&self) -> &str {
        "fallback"
    }
}
