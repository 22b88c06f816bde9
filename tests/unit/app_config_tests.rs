/*!
 * Tests for application configuration
 */

use std::path::PathBuf;
use anyhow::Result;
use reelsub::app_config::{Config, LogLevel, TranscriptionProvider};
use reelsub::render::style::StyleOptions;
use reelsub::render::RenderMode;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_shouldHaveExpectedValues() {
    let config = Config::default();

    assert_eq!(config.transcription.provider, TranscriptionProvider::Gemini);
    assert_eq!(config.transcription.model, "gemini-2.5-flash");
    assert_eq!(config.transcription.retry_count, 3);
    assert_eq!(config.render.mode, RenderMode::Overlay);
    assert_eq!(config.render.min_duration_secs, 0.5);
    assert!(!config.render.use_filter_complex);
    assert_eq!(config.transcoder.video_codec, "libx264");
    assert_eq!(config.transcoder.preset, "ultrafast");
    assert_eq!(config.transcoder.crf, 28);
    assert_eq!(config.transcoder.audio_bitrate, "96k");
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_file_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r##"{
            "render": { "mode": "track", "fonts": { "Brand": "/opt/brand.ttf" } },
            "style": { "fontFamily": "Brand", "fontSize": 52, "speakerColors": { "Host": "#FF8800" } },
            "log_level": "debug"
        }"##,
    )?;

    let config = Config::from_file(&path)?;
    assert_eq!(config.render.mode, RenderMode::Track);
    assert_eq!(config.render.min_duration_secs, 0.5);
    assert_eq!(config.style.font_size, Some(52));
    assert_eq!(config.style.speaker_colors.as_ref().unwrap()["Host"], "#FF8800");
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.transcoder.crf, 28);
    assert!(config.validate().is_ok());

    let registry = config.render.font_registry();
    assert_eq!(registry.resolve("Brand")?, PathBuf::from("/opt/brand.ttf"));
    Ok(())
}

#[test]
fn test_save_withDefaultConfig_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.render.mode = RenderMode::Captions;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded.render.mode, RenderMode::Captions);
    assert_eq!(loaded.transcription.endpoint, config.transcription.endpoint);
    Ok(())
}

#[test]
fn test_validate_withUnknownFontFamily_shouldFail() {
    let mut config = Config::default();
    config.style = StyleOptions {
        font_family: Some("Papyrus".to_string()),
        ..StyleOptions::default()
    };
    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("Papyrus"));

    // a font file makes the family a plain label
    config.style.font_file = Some(PathBuf::from("/tmp/papyrus.ttf"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withOutOfRangeStyle_shouldFail() {
    let mut config = Config::default();
    config.style.font_size = Some(1000);
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.style.background_opacity = Some(-0.1);
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withBadTranscoderOrRenderValues_shouldFail() {
    let mut config = Config::default();
    config.transcoder.crf = 60;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.render.min_duration_secs = f64::NAN;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.transcription.model = "  ".to_string();
    assert!(config.validate().is_err());
    config.transcription.provider = TranscriptionProvider::Fallback;
    assert!(config.validate().is_ok());
}

#[test]
fn test_get_api_key_withConfiguredKey_shouldPreferConfig() {
    let mut config = Config::default();
    config.transcription.api_key = "from-config".to_string();
    assert_eq!(config.transcription.get_api_key(), "from-config");
    assert!(config.has_api_key());
}

#[test]
fn test_get_prompt_withLanguage_shouldSubstitutePlaceholder() {
    let mut config = Config::default();
    config.transcription.language = "French".to_string();
    let prompt = config.transcription.get_prompt();
    assert!(prompt.contains("in French"));
    assert!(prompt.contains("\"subtitles\""));

    config.transcription.prompt = Some("Subtitle this in {language} please".to_string());
    assert_eq!(config.transcription.get_prompt(), "Subtitle this in French please");
}

#[test]
fn test_provider_fromStr_withAliases_shouldParse() {
    assert_eq!("Gemini".parse::<TranscriptionProvider>().unwrap(), TranscriptionProvider::Gemini);
    assert_eq!("fake".parse::<TranscriptionProvider>().unwrap(), TranscriptionProvider::Fallback);
    assert!("openai".parse::<TranscriptionProvider>().is_err());
    assert_eq!(TranscriptionProvider::Fallback.to_string(), "fallback");
}

#[test]
fn test_log_level_withEachVariant_shouldMapToFilter() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
