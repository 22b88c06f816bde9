/*!
 * Subtitle-to-filter-graph compiler.
 *
 * Pure and synchronous: given the same document, style and speaker colours the
 * output is byte-identical. No I/O happens here; writing track files and
 * checking fonts on disk belong to the application layer.
 */

use std::fmt;
use std::str::FromStr;
use anyhow::anyhow;
use log::debug;
use serde::{Deserialize, Serialize};
use crate::errors::CompileError;
use crate::subtitle_processor::SubtitleDocument;

pub mod color;
pub mod filter;
pub mod overlay;
pub mod sanitize;
pub mod style;
pub mod timing;
pub mod track;
pub mod wrap;

pub use color::{Rgb, SpeakerColorMap};
pub use filter::{FilterDescriptor, FilterGraph, FilterValue};
pub use overlay::OverlayCompiler;
pub use style::{FontRegistry, StyleConfig, StyleOptions};
pub use track::{SubtitleTrack, TrackCompiler, TrackFormat};

/// Rendering strategy selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// One drawtext stage per display line
    #[default]
    Overlay,
    /// Styled ASS track rendered by the subtitles filter
    Track,
    /// Plain SRT captions rendered by the subtitles filter
    Captions,
}

impl RenderMode {
    /// Compiler implementing this mode
    pub fn strategy(&self, min_duration: f64) -> Box<dyn RenderStrategy> {
        match self {
            Self::Overlay => Box::new(OverlayCompiler::new(min_duration)),
            Self::Track => Box::new(TrackCompiler::new(TrackFormat::Ass, min_duration)),
            Self::Captions => Box::new(TrackCompiler::new(TrackFormat::Srt, min_duration)),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Overlay => "overlay",
            Self::Track => "track",
            Self::Captions => "captions",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for RenderMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "overlay" | "drawtext" => Ok(Self::Overlay),
            "track" | "ass" => Ok(Self::Track),
            "captions" | "srt" => Ok(Self::Captions),
            _ => Err(anyhow!("Invalid render mode: {}", s)),
        }
    }
}

/// Output of a compilation
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// Filter graph ready for the transcoder
    FilterGraph(FilterGraph),
    /// Track document, written to a file and referenced by a `subtitles` stage
    Track(SubtitleTrack),
}

impl Artifact {
    /// The artifact as text, a filter chain or a track document
    pub fn render(&self) -> String {
        match self {
            Self::FilterGraph(graph) => graph.render_chain(),
            Self::Track(track) => track.content.clone(),
        }
    }
}

/// Common interface of the rendering strategies
pub trait RenderStrategy: Send + Sync {
    /// Compile a document, either fully succeeding or returning a typed error
    fn compile(
        &self,
        document: &SubtitleDocument,
        style: &StyleConfig,
        colors: &SpeakerColorMap,
    ) -> Result<Artifact, CompileError>;

    /// Mode name for logging
    fn name(&self) -> &'static str;
}

impl RenderStrategy for OverlayCompiler {
    fn compile(
        &self,
        document: &SubtitleDocument,
        style: &StyleConfig,
        colors: &SpeakerColorMap,
    ) -> Result<Artifact, CompileError> {
        self.compile_graph(document, style, colors).map(Artifact::FilterGraph)
    }

    fn name(&self) -> &'static str {
        "overlay"
    }
}

impl RenderStrategy for TrackCompiler {
    fn compile(
        &self,
        document: &SubtitleDocument,
        style: &StyleConfig,
        colors: &SpeakerColorMap,
    ) -> Result<Artifact, CompileError> {
        self.compile_track(document, style, colors).map(Artifact::Track)
    }

    fn name(&self) -> &'static str {
        match self.format() {
            TrackFormat::Ass => "track",
            TrackFormat::Srt => "captions",
        }
    }
}

/// Compile a document with the strategy for `mode`
pub fn compile(
    mode: RenderMode,
    document: &SubtitleDocument,
    style: &StyleConfig,
    colors: &SpeakerColorMap,
    min_duration: f64,
) -> Result<Artifact, CompileError> {
    let strategy = mode.strategy(min_duration);
    debug!("Compiling {} line(s) with the {} strategy", document.len(), strategy.name());
    strategy.compile(document, style, colors)
}
