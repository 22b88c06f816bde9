use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use log::{debug, info, warn};

use crate::app_config::{TranscriptionConfig, TranscriptionProvider, API_KEY_ENV};
use crate::errors::ProviderError;
use crate::providers::fallback::FallbackTranscriber;
use crate::providers::gemini::Gemini;
use crate::providers::{Transcriber, TranscriptionRequest};
use crate::subtitle_processor::SubtitleDocument;

// @module: Transcription service turning a video into a subtitle document

// @struct: Transcription service
pub struct TranscriptionService {
    // @field: Provider implementation
    transcriber: Arc<dyn Transcriber>,

    // @field: Configuration
    config: TranscriptionConfig,
}

impl TranscriptionService {
    /// Create a service for the configured provider
    ///
    /// Gemini without an API key in the config or the environment degrades to
    /// the fallback transcriber with a warning instead of failing.
    pub fn new(config: TranscriptionConfig) -> Self {
        let transcriber: Arc<dyn Transcriber> = match config.provider {
            TranscriptionProvider::Gemini => {
                let api_key = config.get_api_key();
                if api_key.is_empty() {
                    warn!(
                        "No Gemini API key configured (set transcription.api_key or {}), using placeholder subtitles",
                        API_KEY_ENV
                    );
                    Arc::new(FallbackTranscriber::new())
                } else {
                    Arc::new(Gemini::new(api_key, &config.endpoint, &config.model, config.timeout_secs))
                }
            }
            TranscriptionProvider::Fallback => Arc::new(FallbackTranscriber::new()),
        };

        Self { transcriber, config }
    }

    /// Create a service around an existing transcriber
    pub fn with_transcriber(transcriber: Arc<dyn Transcriber>, config: TranscriptionConfig) -> Self {
        Self { transcriber, config }
    }

    pub fn provider_name(&self) -> &str {
        self.transcriber.name()
    }

    /// Transcribe a video into a validated subtitle document
    ///
    /// Retryable failures, including answers without a usable document, are
    /// retried `retry_count` times with exponential backoff.
    pub async fn transcribe(&self, video_path: &Path) -> Result<SubtitleDocument, ProviderError> {
        let request = TranscriptionRequest::new(video_path, self.config.get_prompt());
        let max_attempts = self.config.retry_count + 1;
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = match self.transcriber.transcribe(&request).await {
                Ok(text) => parse_transcription(&text),
                Err(e) => Err(e),
            };

            match result {
                Ok(document) => {
                    info!(
                        "Transcribed {} line(s) with {} in {:.1}s",
                        document.len(),
                        self.transcriber.name(),
                        started.elapsed().as_secs_f64()
                    );
                    return Ok(document);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay_ms = self.config.retry_backoff_ms.saturating_mul(1 << (attempt - 1).min(16));
                    warn!(
                        "Transcription attempt {}/{} failed: {}. Retrying in {}ms",
                        attempt, max_attempts, e, delay_ms
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// The outermost JSON object in a model answer, first `{` to last `}`
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Extract and validate the subtitle document from a model answer
pub fn parse_transcription(text: &str) -> Result<SubtitleDocument, ProviderError> {
    let json = extract_json_object(text).ok_or_else(|| {
        ProviderError::ParseError("no JSON object found in transcription response".to_string())
    })?;
    debug!("Extracted {} bytes of JSON from transcription response", json.len());

    Ok(SubtitleDocument::from_json_str(json)?)
}
