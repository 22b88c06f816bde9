/*!
 * Mock transcriber for testing.
 *
 * This module provides a scripted transcriber that simulates different behaviors:
 * - `MockTranscriber::working()` - Always answers with a valid subtitle document
 * - `MockTranscriber::wrapped()` - Valid document surrounded by chatter and code fences
 * - `MockTranscriber::intermittent(n)` - Fails every nth request
 * - `MockTranscriber::failing()` - Always fails with an error
 */

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{Transcriber, TranscriptionRequest};

/// Behavior mode for the mock transcriber
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with bare JSON
    Working,
    /// Succeeds with JSON wrapped in prose and a markdown fence
    Wrapped,
    /// Answers without any JSON object
    Malformed,
    /// Answers with JSON that lacks the `subtitles` array
    MissingSubtitles,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with a retryable server error
    Failing,
    /// Always fails with a non-retryable authentication error
    Unauthorized,
}

/// Mock transcriber for testing workflow behavior
#[derive(Debug)]
pub struct MockTranscriber {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&TranscriptionRequest) -> String>,
}

impl MockTranscriber {
    /// Create a new mock transcriber with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn wrapped() -> Self {
        Self::new(MockBehavior::Wrapped)
    }

    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn unauthorized() -> Self {
        Self::new(MockBehavior::Unauthorized)
    }

    /// Set a custom response generator used by the working behaviours
    pub fn with_custom_response(mut self, generator: fn(&TranscriptionRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Two speakers, three lines
    pub fn sample_json() -> String {
        json!({
            "subtitles": [
                { "speaker": "Host", "line": "Welcome back to the show", "startTime": 0.0, "endTime": 2.0 },
                { "speaker": "Guest", "line": "Thanks for having me", "startTime": 2.1, "endTime": 3.9 },
                { "speaker": "Host", "line": "Let's get started", "startTime": 4.0, "endTime": 5.5 }
            ]
        })
        .to_string()
    }

    fn body(&self, request: &TranscriptionRequest) -> String {
        match self.custom_response {
            Some(generator) => generator(request),
            None => Self::sample_json(),
        }
    }
}

impl Clone for MockTranscriber {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(self.body(request)),

            MockBehavior::Wrapped => Ok(format!(
                "Sure! Here are the subtitles:\n```json\n{}\n```\nLet me know if you need changes.",
                self.body(request)
            )),

            MockBehavior::Malformed => Ok("I could not find any speech in this video.".to_string()),

            MockBehavior::MissingSubtitles => Ok(r#"{ "lines": [] }"#.to_string()),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(self.body(request))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Unauthorized => Err(ProviderError::AuthenticationError("Simulated invalid API key".to_string())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
