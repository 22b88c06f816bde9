/*!
 * Tests for the subtitle document model and its validation
 */

use anyhow::Result;
use serde_json::json;
use reelsub::errors::CompileError;
use reelsub::render::timing::DEFAULT_MIN_DURATION_SECS;
use reelsub::subtitle_processor::{SubtitleDocument, SubtitleLine};
use crate::common;

fn invalid_message(result: Result<SubtitleDocument, CompileError>) -> String {
    match result {
        Err(CompileError::InvalidInput(message)) => message,
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

#[test]
fn test_from_json_str_withValidDocument_shouldParseAllFields() -> Result<()> {
    let document = SubtitleDocument::from_json_str(
        r##"{ "subtitles": [
            { "speaker": "Host", "line": "Hi", "startTime": 0.5, "endTime": 1.5, "overrideColor": "#00FF00" },
            { "text": "Alias", "startTime": 2, "endTime": 3 }
        ] }"##,
    )?;

    assert_eq!(document.len(), 2);
    assert_eq!(document.lines[0].speaker.as_deref(), Some("Host"));
    assert_eq!(document.lines[0].override_color.as_deref(), Some("#00FF00"));
    assert_eq!(document.lines[1].text, "Alias");
    assert_eq!(document.lines[1].start_time, 2.0);
    Ok(())
}

#[test]
fn test_from_json_str_withInvalidJson_shouldFail() {
    let message = invalid_message(SubtitleDocument::from_json_str("{ not json"));
    assert!(message.contains("not valid JSON"));
}

#[test]
fn test_from_value_withMissingSubtitles_shouldFail() {
    let message = invalid_message(SubtitleDocument::from_value(&json!({ "lines": [] })));
    assert!(message.contains("missing `subtitles`"));
}

#[test]
fn test_from_value_withNonArraySubtitles_shouldFail() {
    let message = invalid_message(SubtitleDocument::from_value(&json!({ "subtitles": "nope" })));
    assert!(message.contains("must be an array"));
}

#[test]
fn test_from_value_withNonObjectRoot_shouldFail() {
    invalid_message(SubtitleDocument::from_value(&json!([1, 2, 3])));
}

#[test]
fn test_from_value_withBadEntries_shouldReportIndex() {
    let message = invalid_message(SubtitleDocument::from_value(&json!({ "subtitles": [ { "line": "ok" }, 42 ] })));
    assert!(message.contains("subtitle 1"));

    let message = invalid_message(SubtitleDocument::from_value(&json!({ "subtitles": [ { "speaker": "A" } ] })));
    assert!(message.contains("no `line`"));

    let message = invalid_message(SubtitleDocument::from_value(&json!({ "subtitles": [ { "line": 5 } ] })));
    assert!(message.contains("non-string"));

    let message =
        invalid_message(SubtitleDocument::from_value(&json!({ "subtitles": [ { "line": "x", "startTime": "soon" } ] })));
    assert!(message.contains("non-numeric"));
}

#[test]
fn test_from_value_withNumericSpeaker_shouldStringify() -> Result<()> {
    let document = SubtitleDocument::from_value(&json!({ "subtitles": [ { "speaker": 2, "line": "x" } ] }))?;
    assert_eq!(document.lines[0].speaker.as_deref(), Some("2"));
    assert_eq!(document.lines[0].start_time, 0.0);
    assert_eq!(document.lines[0].end_time, 0.0);
    Ok(())
}

#[test]
fn test_from_value_withEmptyArray_shouldBeEmptyDocument() -> Result<()> {
    let document = SubtitleDocument::from_value(&json!({ "subtitles": [] }))?;
    assert!(document.is_empty());
    Ok(())
}

#[test]
fn test_save_and_load_withSampleDocument_shouldPreserveLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("clip.subtitles.json");
    let document = common::sample_document();

    document.save(&path)?;
    let content = std::fs::read_to_string(&path)?;
    assert!(content.contains("\"subtitles\""));
    assert!(content.contains("\"startTime\""));
    assert!(content.contains("\"line\": \"Hello world\""));

    let loaded = SubtitleDocument::load(&path)?;
    assert_eq!(loaded, document);
    Ok(())
}

#[test]
fn test_load_withMissingFile_shouldFail() {
    assert!(SubtitleDocument::load("/definitely/not/here.json").is_err());
}

#[test]
fn test_span_withInvertedTimes_shouldRepair() {
    let line = SubtitleLine::new("x", 4.0, 2.0);
    let span = line.span(DEFAULT_MIN_DURATION_SECS);
    assert_eq!(span.start, 4.0);
    assert_eq!(span.end, 4.5);
}

#[test]
fn test_display_withSpeaker_shouldIncludeTimesAndSpeaker() {
    let line = SubtitleLine::new("Hello", 1.0, 2.5).with_speaker("A");
    assert_eq!(line.to_string(), "[1.00 -> 2.50] A: Hello");
    assert_eq!(SubtitleLine::new("x", 0.0, 1.0).to_string(), "[0.00 -> 1.00] -: x");
}
