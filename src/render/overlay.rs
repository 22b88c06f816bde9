/*!
 * Per-line drawtext overlay compiler.
 *
 * Every subtitle line is wrapped, and each display line becomes one drawtext
 * stage gated to the line's repaired time window. Stages are appended after the
 * canvas fit-and-pad stages in document order, top display line first.
 */

use log::debug;
use crate::errors::CompileError;
use crate::render::color::{ColorResolver, Rgb, SpeakerColorMap};
use crate::render::filter::{FilterDescriptor, FilterGraph, CANVAS_WIDTH};
use crate::render::style::{AnimationStyle, StyleConfig, TextAlign};
use crate::render::timing::{self, TimeSpan, DEFAULT_MIN_DURATION_SECS};
use crate::render::wrap;
use crate::subtitle_processor::{SubtitleDocument, SubtitleLine};

/// Fade-in ramp length in seconds
pub const FADE_IN_SECS: f64 = 0.5;

/// Padding around the text inside the background box
pub const BOX_BORDER_WIDTH: u32 = 5;

/// Shadow colour with its opacity, in drawtext syntax
pub const SHADOW_COLOR: &str = "black@0.8";

/// Outline colour
pub const OUTLINE_COLOR: &str = "black";

/// Compiles a subtitle document into a drawtext filter graph
#[derive(Debug, Clone)]
pub struct OverlayCompiler {
    min_duration: f64,
}

impl OverlayCompiler {
    pub fn new(min_duration: f64) -> Self {
        OverlayCompiler {
            min_duration: timing::effective_floor(min_duration),
        }
    }

    pub fn min_duration(&self) -> f64 {
        self.min_duration
    }

    /// Build the full filter graph
    ///
    /// `colors` entries win over `style.speaker_colors` for the same speaker. Fails
    /// with `FontNotFound` when the style carries no font file.
    pub fn compile_graph(
        &self,
        document: &SubtitleDocument,
        style: &StyleConfig,
        colors: &SpeakerColorMap,
    ) -> Result<FilterGraph, CompileError> {
        if style.font_file.as_os_str().is_empty() {
            return Err(CompileError::FontNotFound {
                family: style.font_family.clone(),
                reason: "no font file resolved for overlay rendering".to_string(),
            });
        }
        if style.italic {
            debug!("Italic is not supported by drawtext overlays, rendering upright");
        }

        let mut speaker_colors = style.speaker_colors.clone();
        speaker_colors.extend(colors.iter().map(|(k, v)| (k.clone(), v.clone())));
        let resolver = ColorResolver::new(document, &speaker_colors);

        let budget = style.char_budget(CANVAS_WIDTH);
        let mut graph = FilterGraph::with_canvas();

        for (index, line) in document.iter().enumerate() {
            let color = resolver.resolve(line);
            let span = line.span(self.min_duration);
            debug!("Overlay line {}: colour {}, {:.3}s -> {:.3}s", index, color, span.start, span.end);

            for stage in self.line_stages(line, style, color, span, budget) {
                graph.push(stage);
            }
        }

        Ok(graph)
    }

    /// Stages for one subtitle line, top display line first
    pub fn line_stages(
        &self,
        line: &SubtitleLine,
        style: &StyleConfig,
        color: Rgb,
        span: TimeSpan,
        budget: usize,
    ) -> Vec<FilterDescriptor> {
        let display_lines = wrap::wrap_text(&line.text, budget);
        let count = display_lines.len();

        display_lines
            .into_iter()
            .enumerate()
            .map(|(k, text)| {
                let rows_below = (count - 1 - k) as u32;
                let offset = style.margin_v.saturating_add(rows_below.saturating_mul(style.line_step()));
                self.stage(text, style, color, span, offset)
            })
            .collect()
    }

    fn stage(&self, text: String, style: &StyleConfig, color: Rgb, span: TimeSpan, offset: u32) -> FilterDescriptor {
        let mut stage = FilterDescriptor::new("drawtext")
            .text("text", text)
            .expr("fontfile", style.font_file.display())
            .expr("fontsize", style.font_size)
            .expr("fontcolor", color.to_drawtext())
            .expr("x", horizontal_position(style.text_align, style.margin_h))
            .expr("y", format!("h-th-{}", offset));

        if style.has_background() {
            stage = stage
                .expr("box", 1)
                .expr("boxcolor", style.background_color.to_drawtext_with_alpha(style.background_opacity))
                .expr("boxborderw", BOX_BORDER_WIDTH);
        }

        if style.shadow {
            stage = stage
                .expr("shadowcolor", SHADOW_COLOR)
                .expr("shadowx", style.shadow_offset)
                .expr("shadowy", style.shadow_offset);
        }

        if style.outline {
            stage = stage
                .expr("borderw", style.outline_width)
                .expr("bordercolor", OUTLINE_COLOR);
        }

        match style.animation_style {
            AnimationStyle::FadeIn => stage.expr("alpha", fade_in_expression(span)),
            AnimationStyle::None => stage.expr("enable", enable_expression(span)),
        }
    }
}

impl Default for OverlayCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DURATION_SECS)
    }
}

/// drawtext `x` expression for an alignment
pub fn horizontal_position(align: TextAlign, margin_h: u32) -> String {
    match align {
        TextAlign::Left => margin_h.to_string(),
        TextAlign::Center => "(w-text_w)/2".to_string(),
        TextAlign::Right => format!("w-text_w-{}", margin_h),
    }
}

/// Visibility predicate, `between(t,S,E)`
pub fn enable_expression(span: TimeSpan) -> String {
    format!(
        "between(t,{},{})",
        timing::format_expr_seconds(span.start),
        timing::format_expr_seconds(span.end)
    )
}

/// Opacity ramp: 0 before start, linear to 1 over the ramp, 1 until end, then 0
pub fn fade_in_expression(span: TimeSpan) -> String {
    let ramp = FADE_IN_SECS.min(span.duration()).max(0.001);
    let start = timing::format_expr_seconds(span.start);
    let ramp_end = timing::format_expr_seconds(span.start + ramp);
    let end = timing::format_expr_seconds(span.end);
    let ramp = timing::format_expr_seconds(ramp);

    format!(
        "if(lt(t,{start}),0,if(lt(t,{ramp_end}),(t-{start})/{ramp},if(lt(t,{end}),1,0)))",
        start = start,
        ramp_end = ramp_end,
        ramp = ramp,
        end = end
    )
}
