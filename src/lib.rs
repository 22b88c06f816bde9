/*!
 * # reelsub - speaker-coloured subtitles burned into vertical videos
 *
 * A Rust library that turns a subtitle document into an ffmpeg filter graph
 * and burns it into a 1080x1920 copy of a video.
 *
 * ## Features
 *
 * - Transcribe videos with Gemini into `{ "subtitles": [...] }` documents
 * - Three rendering modes:
 *   - `overlay`: one drawtext stage per wrapped display line
 *   - `track`: a styled ASS track rendered by the subtitles filter
 *   - `captions`: plain SRT captions with per-line font colours
 * - Deterministic per-speaker colours with explicit overrides
 * - Timing repair so every line stays visible for a minimum duration
 * - Single escaping authority for filter-graph text
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `render`: the pure compiler:
 *   - `render::timing`, `render::color`, `render::sanitize`, `render::wrap`
 *   - `render::style`: style resolution and the font registry
 *   - `render::filter`: filter descriptors and graph serialization
 *   - `render::overlay` and `render::track`: the two compilers
 * - `subtitle_processor`: subtitle document model and validation
 * - `providers`: transcription backends (Gemini, fallback, mock)
 * - `transcription_service`: provider selection and retries
 * - `transcoder`: ffmpeg invocation
 * - `app_config`: configuration management
 * - `app_controller`: the end-to-end workflow
 * - `file_utils`: file system operations
 * - `errors`: custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod providers;
pub mod render;
pub mod subtitle_processor;
pub mod transcoder;
pub mod transcription_service;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, CompileError, ProviderError, TranscodeError};
pub use render::{compile, Artifact, RenderMode, StyleConfig, StyleOptions};
pub use subtitle_processor::{SubtitleDocument, SubtitleLine};
