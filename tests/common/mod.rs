/*!
 * Common test utilities for the reelsub test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use tempfile::TempDir;

use reelsub::render::style::{FontRegistry, StyleConfig, StyleOptions};
use reelsub::subtitle_processor::{SubtitleDocument, SubtitleLine};

/// Font path used by styles that never touch the disk
pub const TEST_FONT: &str = "/fonts/Test-Regular.ttf";

/// Routes library log output through the test harness
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Writes a placeholder font file so on-disk font checks pass
pub fn create_test_font(dir: &Path) -> Result<PathBuf> {
    create_test_file(dir, "TestFont.ttf", "not really a font")
}

/// Creates a sample subtitles JSON file
pub fn create_test_subtitles(dir: &Path, filename: &str) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(&sample_document())?;
    create_test_file(dir, filename, &json)
}

/// Two speakers, three lines, one of them with an override colour
pub fn sample_document() -> SubtitleDocument {
    SubtitleDocument::new(vec![
        SubtitleLine::new("Hello world", 0.0, 2.0).with_speaker("A"),
        SubtitleLine::new("Hi there, how are you?", 2.0, 4.5).with_speaker("B"),
        SubtitleLine::new("Fine", 4.5, 5.0).with_speaker("A").with_override_color("#FF0000"),
    ])
}

/// Resolved default style pointing at a fixed font path
pub fn default_style() -> StyleConfig {
    style_with(StyleOptions::default())
}

/// Resolved style from options, with the test font filled in when absent
pub fn style_with(mut options: StyleOptions) -> StyleConfig {
    if options.font_file.is_none() {
        options.font_file = Some(PathBuf::from(TEST_FONT));
    }
    StyleConfig::resolve(&options, &FontRegistry::default()).unwrap()
}
