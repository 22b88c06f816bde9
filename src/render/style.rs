/*!
 * Style configuration resolution.
 *
 * Callers supply a partial [`StyleOptions`]; [`StyleConfig::resolve`] fills every
 * field with the caller's value or its documented default and looks the font
 * family up in a [`FontRegistry`]. A family missing from the registry is a hard
 * `FontNotFound`, never a silent substitution.
 */

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use anyhow::anyhow;
use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use crate::errors::CompileError;
use crate::render::color::{self, Rgb, SpeakerColorMap};
use crate::render::filter::CANVAS_HEIGHT;
use crate::render::wrap;

pub const DEFAULT_FONT_FAMILY: &str = "Roboto";
pub const DEFAULT_FONT_SIZE: u32 = 44;
pub const DEFAULT_MARGIN_V: u32 = 255;
pub const DEFAULT_MARGIN_H: u32 = 20;
pub const DEFAULT_MAX_WIDTH: f64 = 80.0;
pub const DEFAULT_LINE_SPACING: u32 = 5;
pub const DEFAULT_SHADOW_OFFSET: u32 = 2;
pub const DEFAULT_OUTLINE_WIDTH: u32 = 2;

/// Largest accepted font size in pixels
pub const MAX_FONT_SIZE: u32 = 400;

/// Largest accepted margin, spacing, outline or shadow in pixels
pub const MAX_PIXEL_OFFSET: u32 = CANVAS_HEIGHT;

/// Line height as a multiple of the font size
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

// Built-in family to file table, paths are relative to the fonts directory
static BUILTIN_FONTS: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut fonts = BTreeMap::new();
    fonts.insert("Roboto", "Roboto-Regular.ttf");
    fonts.insert("Avenir", "Avenir.otf");
    fonts.insert("DejaVuSans", "DejaVuSans.ttf");
    fonts.insert("LiberationSans", "LiberationSans-Regular.ttf");
    fonts
});

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl fmt::Display for TextAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TextAlign {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" | "centre" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            _ => Err(anyhow!("Invalid text alignment: {}", s)),
        }
    }
}

/// Entrance animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum AnimationStyle {
    #[default]
    None,
    FadeIn,
}

impl FromStr for AnimationStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "fadein" | "fade-in" | "fade" => Ok(Self::FadeIn),
            _ => Err(anyhow!("Invalid animation style: {}", s)),
        }
    }
}

/// A partially specified style, every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,

    // @field: Explicit font file, bypasses the family lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,

    // @field: Distance from the canvas bottom to the lowest line
    #[serde(default, alias = "verticalPosition", rename = "marginV", skip_serializing_if = "Option::is_none")]
    pub margin_v: Option<u32>,

    #[serde(default, rename = "marginH", skip_serializing_if = "Option::is_none")]
    pub margin_h: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,

    // @field: Percent of the canvas width available for text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_offset: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline_width: Option<u32>,

    // @field: Colour reference, may carry an inline opacity as in `black@0.35`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_opacity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_style: Option<AnimationStyle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_colors: Option<SpeakerColorMap>,
}

impl StyleOptions {
    /// Overlay `other` on top of `self`, fields set in `other` win
    pub fn merge(&self, other: &StyleOptions) -> StyleOptions {
        StyleOptions {
            font_family: other.font_family.clone().or_else(|| self.font_family.clone()),
            font_file: other.font_file.clone().or_else(|| self.font_file.clone()),
            font_size: other.font_size.or(self.font_size),
            margin_v: other.margin_v.or(self.margin_v),
            margin_h: other.margin_h.or(self.margin_h),
            italic: other.italic.or(self.italic),
            max_width: other.max_width.or(self.max_width),
            line_spacing: other.line_spacing.or(self.line_spacing),
            text_align: other.text_align.or(self.text_align),
            shadow: other.shadow.or(self.shadow),
            shadow_offset: other.shadow_offset.or(self.shadow_offset),
            outline: other.outline.or(self.outline),
            outline_width: other.outline_width.or(self.outline_width),
            background_color: other.background_color.clone().or_else(|| self.background_color.clone()),
            background_opacity: other.background_opacity.or(self.background_opacity),
            animation_style: other.animation_style.or(self.animation_style),
            speaker_colors: match (&self.speaker_colors, &other.speaker_colors) {
                (Some(base), Some(over)) => {
                    let mut merged = base.clone();
                    merged.extend(over.iter().map(|(k, v)| (k.clone(), v.clone())));
                    Some(merged)
                }
                (base, over) => over.clone().or_else(|| base.clone()),
            },
        }
    }

    /// Check the ranges of the numeric fields that are set
    pub fn validate(&self) -> Result<(), CompileError> {
        if let Some(size) = self.font_size {
            if size == 0 || size > MAX_FONT_SIZE {
                return Err(CompileError::invalid(format!(
                    "fontSize must be between 1 and {}, got {}",
                    MAX_FONT_SIZE, size
                )));
            }
        }
        let pixel_fields = [
            ("marginV", self.margin_v),
            ("marginH", self.margin_h),
            ("lineSpacing", self.line_spacing),
            ("shadowOffset", self.shadow_offset),
            ("outlineWidth", self.outline_width),
        ];
        for (name, value) in pixel_fields {
            if let Some(px) = value.filter(|px| *px > MAX_PIXEL_OFFSET) {
                return Err(CompileError::invalid(format!(
                    "{} must be between 0 and {}, got {}",
                    name, MAX_PIXEL_OFFSET, px
                )));
            }
        }
        if let Some(width) = self.max_width {
            if !width.is_finite() || !(1.0..=100.0).contains(&width) {
                return Err(CompileError::invalid(format!("maxWidth must be between 1 and 100, got {}", width)));
            }
        }
        if let Some(opacity) = self.background_opacity {
            if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
                return Err(CompileError::invalid(format!(
                    "backgroundOpacity must be between 0 and 1, got {}",
                    opacity
                )));
            }
        }
        if let Some(reference) = self.background_color.as_deref() {
            if Rgb::parse_with_opacity(reference).0.is_none() {
                return Err(CompileError::invalid(format!("unrecognised backgroundColor {:?}", reference)));
            }
        }
        Ok(())
    }
}

/// Maps font family names to font files
#[derive(Debug, Clone)]
pub struct FontRegistry {
    fonts_dir: PathBuf,
    entries: BTreeMap<String, PathBuf>,
}

impl FontRegistry {
    /// Registry holding the built-in families, resolved against `fonts_dir`
    pub fn new<P: Into<PathBuf>>(fonts_dir: P) -> Self {
        let entries = BUILTIN_FONTS
            .iter()
            .map(|(family, file)| (family.to_string(), PathBuf::from(file)))
            .collect();
        FontRegistry {
            fonts_dir: fonts_dir.into(),
            entries,
        }
    }

    /// Add or replace a family
    pub fn register<S: Into<String>, P: Into<PathBuf>>(&mut self, family: S, file: P) {
        self.entries.insert(family.into(), file.into());
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_font<S: Into<String>, P: Into<PathBuf>>(mut self, family: S, file: P) -> Self {
        self.register(family, file);
        self
    }

    pub fn fonts_dir(&self) -> &Path {
        &self.fonts_dir
    }

    /// Registered family names, sorted
    pub fn families(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, family: &str) -> bool {
        self.lookup(family).is_some()
    }

    fn lookup(&self, family: &str) -> Option<&PathBuf> {
        let family = family.trim();
        self.entries.get(family).or_else(|| {
            self.entries
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(family))
                .map(|(_, path)| path)
        })
    }

    /// Resolve a family to a font file path
    pub fn resolve(&self, family: &str) -> Result<PathBuf, CompileError> {
        let file = self.lookup(family).ok_or_else(|| CompileError::FontNotFound {
            family: family.to_string(),
            reason: format!("not registered, known families: {}", self.families().join(", ")),
        })?;

        if file.is_absolute() {
            Ok(file.clone())
        } else {
            Ok(self.fonts_dir.join(file))
        }
    }

    /// Check that a resolved font file exists on disk
    pub fn verify_font_file(family: &str, path: &Path) -> Result<(), CompileError> {
        if path.is_file() {
            Ok(())
        } else {
            Err(CompileError::FontNotFound {
                family: family.to_string(),
                reason: format!("font file does not exist: {}", path.display()),
            })
        }
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new("fonts")
    }
}

/// A fully resolved, immutable style snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct StyleConfig {
    pub font_family: String,
    pub font_file: PathBuf,
    pub font_size: u32,
    pub margin_v: u32,
    pub margin_h: u32,
    pub italic: bool,
    pub max_width: f64,
    pub line_spacing: u32,
    pub text_align: TextAlign,
    pub shadow: bool,
    pub shadow_offset: u32,
    pub outline: bool,
    pub outline_width: u32,
    pub background_color: Rgb,
    pub background_opacity: f64,
    pub animation_style: AnimationStyle,
    pub speaker_colors: SpeakerColorMap,
}

impl StyleConfig {
    /// Resolve partial options against documented defaults and the font registry
    pub fn resolve(options: &StyleOptions, fonts: &FontRegistry) -> Result<Self, CompileError> {
        options.validate()?;

        let font_family = options
            .font_family
            .clone()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string());

        let font_file = match &options.font_file {
            Some(path) if !path.as_os_str().is_empty() => path.clone(),
            _ => fonts.resolve(&font_family)?,
        };

        let (background_color, inline_opacity) = match options.background_color.as_deref() {
            Some(reference) => Rgb::parse_with_opacity(reference),
            None => (None, None),
        };
        let background_color = background_color
            .or_else(|| Rgb::parse(color::DEFAULT_BOX_COLOR))
            .unwrap_or(Rgb::BLACK);
        let background_opacity = options
            .background_opacity
            .or(inline_opacity)
            .unwrap_or(color::DEFAULT_BOX_OPACITY);

        let style = StyleConfig {
            font_family,
            font_file,
            font_size: options.font_size.unwrap_or(DEFAULT_FONT_SIZE),
            margin_v: options.margin_v.unwrap_or(DEFAULT_MARGIN_V),
            margin_h: options.margin_h.unwrap_or(DEFAULT_MARGIN_H),
            italic: options.italic.unwrap_or(false),
            max_width: options.max_width.unwrap_or(DEFAULT_MAX_WIDTH),
            line_spacing: options.line_spacing.unwrap_or(DEFAULT_LINE_SPACING),
            text_align: options.text_align.unwrap_or_default(),
            shadow: options.shadow.unwrap_or(true),
            shadow_offset: options.shadow_offset.unwrap_or(DEFAULT_SHADOW_OFFSET),
            outline: options.outline.unwrap_or(true),
            outline_width: options.outline_width.unwrap_or(DEFAULT_OUTLINE_WIDTH),
            background_color,
            background_opacity,
            animation_style: options.animation_style.unwrap_or_default(),
            speaker_colors: options.speaker_colors.clone().unwrap_or_default(),
        };

        debug!(
            "Resolved style: font {} ({}), size {}, align {}",
            style.font_family,
            style.font_file.display(),
            style.font_size,
            style.text_align
        );
        Ok(style)
    }

    /// Characters per display line on a canvas of `canvas_width` pixels
    pub fn char_budget(&self, canvas_width: u32) -> usize {
        wrap::char_budget(self.font_size, self.max_width, self.margin_h, canvas_width)
    }

    /// Vertical distance between the baselines of two wrapped lines
    pub fn line_step(&self) -> u32 {
        ((self.font_size as f64 * LINE_HEIGHT_FACTOR).round() as u32).saturating_add(self.line_spacing)
    }

    /// Whether a background box is drawn
    pub fn has_background(&self) -> bool {
        self.background_opacity > 0.0
    }
}
