/*!
 * Subtitle track compiler.
 *
 * Produces a standalone subtitle document that ffmpeg's `subtitles` filter
 * composites onto the canvas. Two sub-formats exist and they are not
 * interchangeable:
 *
 * - ASS: header, one style record per line (`Sub0`, `Sub1`, ...), dialogue
 *   events with `H:MM:SS.CC` timestamps
 * - SRT: numbered cues with `HH:MM:SS,mmm` timestamps, colour carried in a
 *   `<font>` tag and the rest of the style passed through `force_style`
 */

use std::fmt;
use std::fmt::Write as _;
use std::path::Path;
use log::debug;
use crate::errors::CompileError;
use crate::render::color::{ColorResolver, Rgb, SpeakerColorMap};
use crate::render::filter::{FilterDescriptor, FilterGraph, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::render::overlay::{BOX_BORDER_WIDTH, FADE_IN_SECS};
use crate::render::sanitize;
use crate::render::style::{AnimationStyle, StyleConfig, TextAlign};
use crate::render::timing::{self, DEFAULT_MIN_DURATION_SECS};
use crate::subtitle_processor::SubtitleDocument;

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

const EVENT_FORMAT: &str = "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Style name used when the document has no lines
pub const FALLBACK_STYLE_NAME: &str = "Default";

/// Script height libass assumes for SRT input
pub const SRT_PLAY_RES_Y: u32 = 288;

/// Opacity of the drop shadow
const SHADOW_OPACITY: f64 = 0.8;

/// Secondary colour, unused by static subtitles
const SECONDARY_COLOUR: &str = "&H000000FF";

/// Track sub-format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFormat {
    /// Styled track with centisecond timestamps
    Ass,
    /// Plain caption track with millisecond timestamps
    Srt,
}

impl TrackFormat {
    /// File extension for the written artifact
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ass => "ass",
            Self::Srt => "srt",
        }
    }
}

impl fmt::Display for TrackFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// A compiled subtitle track document
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleTrack {
    pub format: TrackFormat,
    pub content: String,
    /// Style records in the header, always 0 for SRT
    pub style_count: usize,
    pub event_count: usize,
}

/// Compiles a subtitle document into an ASS or SRT track
#[derive(Debug, Clone)]
pub struct TrackCompiler {
    format: TrackFormat,
    min_duration: f64,
}

impl TrackCompiler {
    pub fn new(format: TrackFormat, min_duration: f64) -> Self {
        TrackCompiler {
            format,
            min_duration: timing::effective_floor(min_duration),
        }
    }

    pub fn ass() -> Self {
        Self::new(TrackFormat::Ass, DEFAULT_MIN_DURATION_SECS)
    }

    pub fn srt() -> Self {
        Self::new(TrackFormat::Srt, DEFAULT_MIN_DURATION_SECS)
    }

    pub fn format(&self) -> TrackFormat {
        self.format
    }

    /// Build the track document
    pub fn compile_track(
        &self,
        document: &SubtitleDocument,
        style: &StyleConfig,
        colors: &SpeakerColorMap,
    ) -> Result<SubtitleTrack, CompileError> {
        let mut speaker_colors = style.speaker_colors.clone();
        speaker_colors.extend(colors.iter().map(|(k, v)| (k.clone(), v.clone())));
        let resolver = ColorResolver::new(document, &speaker_colors);

        let track = match self.format {
            TrackFormat::Ass => self.compile_ass(document, style, &resolver),
            TrackFormat::Srt => self.compile_srt(document, style, &resolver),
        };

        debug!(
            "Compiled {} track: {} style(s), {} event(s)",
            track.format, track.style_count, track.event_count
        );
        Ok(track)
    }

    fn compile_ass(&self, document: &SubtitleDocument, style: &StyleConfig, resolver: &ColorResolver) -> SubtitleTrack {
        let mut styles = String::new();
        let mut events = String::new();

        for (index, line) in document.iter().enumerate() {
            let name = format!("Sub{}", index);
            let color = resolver.resolve(line);
            let span = line.span(self.min_duration);

            styles.push_str(&ass_style_record(&name, style, color));
            styles.push('\n');

            let mut text = String::new();
            if style.animation_style == AnimationStyle::FadeIn {
                let fade_ms = (FADE_IN_SECS.min(span.duration()) * 1000.0).round() as u64;
                let _ = write!(text, "{{\\fad({},0)}}", fade_ms);
            }
            text.push_str(&sanitize::ass_text(line.text.as_str()));

            let (start, end) = timing::format_ass_span(span);
            let _ = writeln!(
                events,
                "Dialogue: 0,{},{},{},{},0,0,0,,{}",
                start,
                end,
                name,
                sanitize::ass_field(line.speaker_name().unwrap_or("")),
                text
            );
        }

        let style_count = if document.is_empty() {
            styles.push_str(&ass_style_record(FALLBACK_STYLE_NAME, style, Rgb::WHITE));
            styles.push('\n');
            1
        } else {
            document.len()
        };

        let mut content = String::new();
        content.push_str("[Script Info]\n");
        content.push_str("Title: Generated Subtitles\n");
        content.push_str("ScriptType: v4.00+\n");
        content.push_str("WrapStyle: 0\n");
        content.push_str("ScaledBorderAndShadow: yes\n");
        let _ = writeln!(content, "PlayResX: {}", CANVAS_WIDTH);
        let _ = writeln!(content, "PlayResY: {}", CANVAS_HEIGHT);
        content.push('\n');
        content.push_str("[V4+ Styles]\n");
        content.push_str(STYLE_FORMAT);
        content.push('\n');
        content.push_str(&styles);
        content.push('\n');
        content.push_str("[Events]\n");
        content.push_str(EVENT_FORMAT);
        content.push('\n');
        content.push_str(&events);

        SubtitleTrack {
            format: TrackFormat::Ass,
            content,
            style_count,
            event_count: document.len(),
        }
    }

    fn compile_srt(&self, document: &SubtitleDocument, _style: &StyleConfig, resolver: &ColorResolver) -> SubtitleTrack {
        let mut content = String::new();

        for (index, line) in document.iter().enumerate() {
            let span = line.span(self.min_duration);
            let color = resolver.resolve(line);
            let mut text = sanitize::srt_text(line.text.as_str());
            if text.is_empty() {
                text.push(' ');
            }

            let _ = writeln!(content, "{}", index + 1);
            let _ = writeln!(
                content,
                "{} --> {}",
                timing::format_srt_timestamp(span.start),
                timing::format_srt_timestamp(span.end)
            );
            let _ = writeln!(content, "<font color=\"{}\">{}</font>", color.to_html(), text);
            content.push('\n');
        }

        SubtitleTrack {
            format: TrackFormat::Srt,
            content,
            style_count: 0,
            event_count: document.len(),
        }
    }
}

impl Default for TrackCompiler {
    fn default() -> Self {
        Self::ass()
    }
}

/// ASS numpad alignment on the bottom row
fn ass_alignment(align: TextAlign) -> u8 {
    match align {
        TextAlign::Left => 1,
        TextAlign::Center => 2,
        TextAlign::Right => 3,
    }
}

/// Side margin that narrows the text area to `maxWidth` percent
fn side_margin(style: &StyleConfig) -> u32 {
    let unused = CANVAS_WIDTH as f64 * (100.0 - style.max_width) / 200.0;
    (unused.max(0.0).round() as u32).saturating_add(style.margin_h)
}

// BorderStyle 3 draws an opaque box in OutlineColour, 1 draws outline and shadow
fn border_fields(style: &StyleConfig) -> (u8, String, String, u32, u32) {
    let shadow = if style.shadow { style.shadow_offset } else { 0 };
    if style.has_background() {
        let box_color = style.background_color.to_ass_with_alpha(style.background_opacity);
        (3, box_color.clone(), box_color, BOX_BORDER_WIDTH, shadow)
    } else {
        let outline = if style.outline { style.outline_width } else { 0 };
        (1, Rgb::BLACK.to_ass(), Rgb::BLACK.to_ass_with_alpha(SHADOW_OPACITY), outline, shadow)
    }
}

fn ass_style_record(name: &str, style: &StyleConfig, color: Rgb) -> String {
    let (border_style, outline_colour, back_colour, outline, shadow) = border_fields(style);
    let margin = side_margin(style);

    format!(
        "Style: {},{},{},{},{},{},{},0,{},0,0,100,100,0,0,{},{},{},{},{},{},{},1",
        name,
        sanitize::ass_field(&style.font_family),
        style.font_size,
        color.to_ass(),
        SECONDARY_COLOUR,
        outline_colour,
        back_colour,
        if style.italic { -1 } else { 0 },
        border_style,
        outline,
        shadow,
        ass_alignment(style.text_align),
        margin,
        margin,
        style.margin_v
    )
}

/// `force_style` override for SRT input, scaled to the SRT script height
pub fn srt_force_style(style: &StyleConfig) -> String {
    let scale = |px: u32| -> u32 { (px as f64 * SRT_PLAY_RES_Y as f64 / CANVAS_HEIGHT as f64).round() as u32 };
    let (border_style, outline_colour, back_colour, outline, shadow) = border_fields(style);

    let fields = [
        format!("FontName={}", sanitize::ass_field(&style.font_family)),
        format!("FontSize={}", scale(style.font_size).max(1)),
        format!("Italic={}", if style.italic { 1 } else { 0 }),
        format!("Alignment={}", ass_alignment(style.text_align)),
        format!("MarginL={}", scale(side_margin(style))),
        format!("MarginR={}", scale(side_margin(style))),
        format!("MarginV={}", scale(style.margin_v)),
        format!("BorderStyle={}", border_style),
        format!("Outline={}", scale(outline)),
        format!("Shadow={}", scale(shadow)),
        format!("OutlineColour={}", outline_colour),
        format!("BackColour={}", back_colour),
    ];
    fields.join(",")
}

/// Filter graph that composites a written track file onto the canvas
pub fn track_filter_graph(
    track_path: &Path,
    fonts_dir: Option<&Path>,
    format: TrackFormat,
    style: &StyleConfig,
) -> FilterGraph {
    let mut stage = FilterDescriptor::new("subtitles").expr("filename", track_path.display());
    if let Some(dir) = fonts_dir {
        stage = stage.expr("fontsdir", dir.display());
    }
    if format == TrackFormat::Srt {
        stage = stage.expr("force_style", srt_force_style(style));
    }

    let mut graph = FilterGraph::with_canvas();
    graph.push(stage);
    graph
}
