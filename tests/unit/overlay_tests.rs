/*!
 * Tests for the drawtext overlay compiler
 */

use std::path::PathBuf;
use anyhow::Result;
use reelsub::errors::CompileError;
use reelsub::render::filter::{self, FilterValue};
use reelsub::render::overlay::{self, OverlayCompiler};
use reelsub::render::sanitize;
use reelsub::render::style::{AnimationStyle, StyleOptions, TextAlign};
use reelsub::render::timing::TimeSpan;
use reelsub::render::SpeakerColorMap;
use reelsub::subtitle_processor::{SubtitleDocument, SubtitleLine};
use crate::common;

fn single_line(text: &str, start: f64, end: f64) -> SubtitleDocument {
    SubtitleDocument::new(vec![SubtitleLine::new(text, start, end).with_speaker("A")])
}

fn option<'a>(stage: &'a filter::FilterDescriptor, key: &str) -> &'a str {
    stage.get(key).map(FilterValue::as_str).unwrap_or_default()
}

#[test]
fn test_compile_graph_withSingleLine_shouldEmitCanvasThenOneDrawtext() -> Result<()> {
    let document = single_line("Hello world", 0.0, 2.0);
    let graph = OverlayCompiler::default().compile_graph(&document, &common::default_style(), &SpeakerColorMap::new())?;

    let names: Vec<&str> = graph.stages().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["scale", "pad", "drawtext"]);

    let drawtext = &graph.stages()[2];
    assert_eq!(drawtext.get("text"), Some(&FilterValue::Text("Hello world".to_string())));
    assert_eq!(option(drawtext, "fontcolor"), "0xFFFF00");
    assert_eq!(option(drawtext, "enable"), "between(t,0.000,2.000)");
    assert_eq!(option(drawtext, "fontfile"), common::TEST_FONT);
    assert_eq!(option(drawtext, "fontsize"), "44");
    assert_eq!(option(drawtext, "x"), "(w-text_w)/2");
    assert_eq!(option(drawtext, "y"), "h-th-255");

    // the serialized chain decodes to the same text
    let parsed = filter::parse_chain(&graph.render_chain());
    assert_eq!(parsed.len(), 3);
    assert_eq!(sanitize::unexpand_text(option(&parsed[2], "text")), "Hello world");
    Ok(())
}

#[test]
fn test_compile_graph_withDefaults_shouldEmitOptionsInFixedOrder() -> Result<()> {
    let document = single_line("Hi", 1.0, 2.0);
    let graph = OverlayCompiler::default().compile_graph(&document, &common::default_style(), &SpeakerColorMap::new())?;

    let keys: Vec<&str> = graph.stages()[2].options.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "text", "fontfile", "fontsize", "fontcolor", "x", "y", "box", "boxcolor", "boxborderw", "shadowcolor",
            "shadowx", "shadowy", "borderw", "bordercolor", "enable",
        ]
    );
    assert_eq!(option(&graph.stages()[2], "boxcolor"), "0x00000080");
    Ok(())
}

#[test]
fn test_compile_graph_withSameInput_shouldBeDeterministic() -> Result<()> {
    let document = common::sample_document();
    let style = common::default_style();
    let compiler = OverlayCompiler::default();

    let first = compiler.compile_graph(&document, &style, &SpeakerColorMap::new())?.render_chain();
    let second = compiler.compile_graph(&document, &style, &SpeakerColorMap::new())?.render_chain();
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_compile_graph_withEmptyDocument_shouldOnlyFitCanvas() -> Result<()> {
    let graph = OverlayCompiler::default().compile_graph(
        &SubtitleDocument::default(),
        &common::default_style(),
        &SpeakerColorMap::new(),
    )?;
    assert_eq!(graph.len(), 2);
    Ok(())
}

#[test]
fn test_compile_graph_withLongLine_shouldStackDisplayLinesUpwards() -> Result<()> {
    let document = single_line("This sentence is definitely long enough to wrap twice", 0.0, 3.0);
    let graph = OverlayCompiler::default().compile_graph(&document, &common::default_style(), &SpeakerColorMap::new())?;

    assert_eq!(graph.len(), 4);
    let top = &graph.stages()[2];
    let bottom = &graph.stages()[3];
    assert_eq!(option(top, "text"), "This sentence is definitely long");
    assert_eq!(option(bottom, "text"), "enough to wrap twice");
    // step is round(44 * 1.2) + 5 = 58
    assert_eq!(option(top, "y"), "h-th-313");
    assert_eq!(option(bottom, "y"), "h-th-255");
    assert_eq!(option(top, "enable"), option(bottom, "enable"));
    Ok(())
}

#[test]
fn test_compile_graph_withInvertedTiming_shouldRepairWindow() -> Result<()> {
    let document = single_line("late", 3.0, 1.0);
    let graph = OverlayCompiler::new(0.5).compile_graph(&document, &common::default_style(), &SpeakerColorMap::new())?;
    assert_eq!(option(&graph.stages()[2], "enable"), "between(t,3.000,3.500)");
    Ok(())
}

#[test]
fn test_compile_graph_withFadeIn_shouldUseAlphaInsteadOfEnable() -> Result<()> {
    let style = common::style_with(StyleOptions {
        animation_style: Some(AnimationStyle::FadeIn),
        ..StyleOptions::default()
    });
    let document = single_line("fade", 0.0, 2.0);
    let graph = OverlayCompiler::default().compile_graph(&document, &style, &SpeakerColorMap::new())?;

    let drawtext = &graph.stages()[2];
    assert!(drawtext.get("enable").is_none());
    assert_eq!(
        option(drawtext, "alpha"),
        "if(lt(t,0.000),0,if(lt(t,0.500),(t-0.000)/0.500,if(lt(t,2.000),1,0)))"
    );
    Ok(())
}

#[test]
fn test_fade_in_expression_withShortSpan_shouldClampRamp() {
    let expression = overlay::fade_in_expression(TimeSpan { start: 1.0, end: 1.2 });
    assert_eq!(expression, "if(lt(t,1.000),0,if(lt(t,1.200),(t-1.000)/0.200,if(lt(t,1.200),1,0)))");
}

#[test]
fn test_horizontal_position_withEachAlignment_shouldUseMargin() {
    assert_eq!(overlay::horizontal_position(TextAlign::Left, 20), "20");
    assert_eq!(overlay::horizontal_position(TextAlign::Center, 20), "(w-text_w)/2");
    assert_eq!(overlay::horizontal_position(TextAlign::Right, 20), "w-text_w-20");
}

#[test]
fn test_compile_graph_withDecorationsOff_shouldOmitTheirOptions() -> Result<()> {
    let style = common::style_with(StyleOptions {
        shadow: Some(false),
        outline: Some(false),
        background_opacity: Some(0.0),
        ..StyleOptions::default()
    });
    let graph = OverlayCompiler::default().compile_graph(&single_line("x", 0.0, 1.0), &style, &SpeakerColorMap::new())?;

    let drawtext = &graph.stages()[2];
    for key in ["box", "boxcolor", "shadowcolor", "borderw"] {
        assert!(drawtext.get(key).is_none(), "{} should be absent", key);
    }
    Ok(())
}

#[test]
fn test_compile_graph_withColorArgument_shouldOverrideStyleSpeakerColors() -> Result<()> {
    let mut style_colors = SpeakerColorMap::new();
    style_colors.insert("A".to_string(), "blue".to_string());
    let style = common::style_with(StyleOptions {
        speaker_colors: Some(style_colors),
        ..StyleOptions::default()
    });
    let document = single_line("x", 0.0, 1.0);

    let graph = OverlayCompiler::default().compile_graph(&document, &style, &SpeakerColorMap::new())?;
    assert_eq!(option(&graph.stages()[2], "fontcolor"), "0x0000FF");

    let mut colors = SpeakerColorMap::new();
    colors.insert("A".to_string(), "#00FF00".to_string());
    let graph = OverlayCompiler::default().compile_graph(&document, &style, &colors)?;
    assert_eq!(option(&graph.stages()[2], "fontcolor"), "0x00FF00");
    Ok(())
}

#[test]
fn test_compile_graph_withoutFontFile_shouldFailWithFontNotFound() {
    let mut style = common::default_style();
    style.font_file = PathBuf::new();

    let result = OverlayCompiler::default().compile_graph(&single_line("x", 0.0, 1.0), &style, &SpeakerColorMap::new());
    assert!(matches!(result, Err(CompileError::FontNotFound { .. })));
}

#[test]
fn test_compile_graph_withHostileText_shouldNotBreakStageBoundaries() -> Result<()> {
    let text = "a,b;c [d] e:f 'g' 100% \\h";
    let graph = OverlayCompiler::default().compile_graph(&single_line(text, 0.0, 1.0), &common::default_style(), &SpeakerColorMap::new())?;

    let parsed = filter::parse_chain(&graph.render_chain());
    assert_eq!(parsed.len(), graph.len());
    assert_eq!(sanitize::unexpand_text(option(&parsed[2], "text")), text);
    assert_eq!(option(&parsed[2], "enable"), "between(t,0.000,1.000)");
    Ok(())
}

#[test]
fn test_compile_graph_withUnvalidatedHugeSpacing_shouldSaturateOffsets() -> Result<()> {
    let mut style = common::default_style();
    style.line_spacing = u32::MAX;
    let document = single_line("This sentence is definitely long enough to wrap twice", 0.0, 3.0);

    let graph = OverlayCompiler::default().compile_graph(&document, &style, &SpeakerColorMap::new())?;
    assert_eq!(graph.len(), 4);
    assert_eq!(option(&graph.stages()[2], "y"), format!("h-th-{}", u32::MAX));
    assert_eq!(option(&graph.stages()[3], "y"), "h-th-255");
    Ok(())
}

#[test]
fn test_compile_graph_withSubPrecisionFloor_shouldKeepVisibleWindow() -> Result<()> {
    let graph = OverlayCompiler::new(0.0004).compile_graph(
        &single_line("hi", 1.0, 1.0),
        &common::default_style(),
        &SpeakerColorMap::new(),
    )?;
    assert_eq!(option(&graph.stages()[2], "enable"), "between(t,1.000,1.010)");
    Ok(())
}
