/*!
 * Colour resolution.
 *
 * Colour references arrive as names, `#RGB`/`#RRGGBB` hex, or tokens already in
 * a backend's own syntax. Everything is parsed into an [`Rgb`] first and then
 * rendered into the token the target grammar expects:
 *
 * - drawtext: `0xRRGGBB`, optionally followed by a lowercase alpha byte
 * - ASS: `&HAABBGGRR` (byte order reversed, alpha is transparency)
 * - SRT captions: `#RRGGBB` inside a `<font>` tag
 */

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use log::warn;
use once_cell::sync::Lazy;
use crate::subtitle_processor::{SubtitleDocument, SubtitleLine};

/// Speaker identifier to colour reference
pub type SpeakerColorMap = BTreeMap<String, String>;

/// Palette used when neither an override nor a speaker mapping applies
pub const DEFAULT_PALETTE: [&str; 5] = ["yellow", "white", "cyan", "magenta", "green"];

/// Default text colour for absent references
pub const DEFAULT_TEXT_COLOR: &str = "white";

/// Default box colour for absent references
pub const DEFAULT_BOX_COLOR: &str = "black";

/// Default box opacity
pub const DEFAULT_BOX_OPACITY: f64 = 0.5;

static NAMED_COLORS: Lazy<HashMap<&'static str, Rgb>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert("white", Rgb::new(0xFF, 0xFF, 0xFF));
    map.insert("black", Rgb::new(0x00, 0x00, 0x00));
    map.insert("yellow", Rgb::new(0xFF, 0xFF, 0x00));
    map.insert("red", Rgb::new(0xFF, 0x00, 0x00));
    map.insert("green", Rgb::new(0x00, 0xFF, 0x00));
    map.insert("blue", Rgb::new(0x00, 0x00, 0xFF));
    map.insert("cyan", Rgb::new(0x00, 0xFF, 0xFF));
    map.insert("magenta", Rgb::new(0xFF, 0x00, 0xFF));
    map.insert("orange", Rgb::new(0xFF, 0xA5, 0x00));
    map.insert("gray", Rgb::new(0x80, 0x80, 0x80));
    map.insert("grey", Rgb::new(0x80, 0x80, 0x80));
    map.insert("pink", Rgb::new(0xFF, 0xC0, 0xCB));
    map
});

/// An opaque RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 0xFF, g: 0xFF, b: 0xFF };
    pub const BLACK: Rgb = Rgb { r: 0x00, g: 0x00, b: 0x00 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Parse a colour reference
    ///
    /// Accepts names from the fixed table (case-insensitive), `#RGB`, `#RRGGBB`,
    /// bare 3 or 6 digit hex, drawtext `0xRRGGBB[AA]` and ASS `&H[AA]BBGGRR[&]`.
    /// Returns `None` for anything else.
    pub fn parse(reference: &str) -> Option<Rgb> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        let lower = reference.to_ascii_lowercase();
        if !lower.is_ascii() {
            return None;
        }
        if let Some(rgb) = NAMED_COLORS.get(lower.as_str()) {
            return Some(*rgb);
        }

        if let Some(hex) = lower.strip_prefix("&h") {
            return Self::parse_ass_digits(hex.trim_end_matches('&'));
        }

        if let Some(hex) = lower.strip_prefix("0x") {
            return match hex.len() {
                6 => Self::parse_rrggbb(hex),
                8 => Self::parse_rrggbb(&hex[..6]),
                _ => None,
            };
        }

        let hex = lower.strip_prefix('#').unwrap_or(&lower);
        match hex.len() {
            3 => Self::parse_rrggbb(&expand_short_hex(hex)?),
            6 => Self::parse_rrggbb(hex),
            _ => None,
        }
    }

    /// Parse a reference carrying an inline opacity, as in `black@0.35`
    pub fn parse_with_opacity(reference: &str) -> (Option<Rgb>, Option<f64>) {
        match reference.split_once('@') {
            Some((color, opacity)) => {
                let opacity = opacity
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|o| o.is_finite())
                    .map(|o| o.clamp(0.0, 1.0));
                (Self::parse(color), opacity)
            }
            None => (Self::parse(reference), None),
        }
    }

    fn parse_rrggbb(hex: &str) -> Option<Rgb> {
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Rgb { r, g, b })
    }

    // ASS stores blue-green-red, with an optional leading alpha byte
    fn parse_ass_digits(hex: &str) -> Option<Rgb> {
        let bgr = match hex.len() {
            6 => hex,
            8 => &hex[2..],
            _ => return None,
        };
        let reversed = Self::parse_rrggbb(bgr)?;
        Some(Rgb { r: reversed.b, g: reversed.g, b: reversed.r })
    }

    /// drawtext colour token, `0xRRGGBB`
    pub fn to_drawtext(&self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// drawtext colour token with an alpha byte derived from `opacity`
    pub fn to_drawtext_with_alpha(&self, opacity: f64) -> String {
        format!("{}{}", self.to_drawtext(), alpha_hex(opacity))
    }

    /// Opaque ASS colour token, `&H00BBGGRR`
    pub fn to_ass(&self) -> String {
        format!("&H00{:02X}{:02X}{:02X}", self.b, self.g, self.r)
    }

    /// ASS colour token whose transparency byte is derived from `opacity`
    pub fn to_ass_with_alpha(&self, opacity: f64) -> String {
        format!(
            "&H{:02X}{:02X}{:02X}{:02X}",
            ass_alpha_byte(opacity),
            self.b,
            self.g,
            self.r
        )
    }

    /// HTML colour, `#RRGGBB`
    pub fn to_html(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_html())
    }
}

fn expand_short_hex(hex: &str) -> Option<String> {
    if hex.len() != 3 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(hex.chars().flat_map(|c| [c, c]).collect())
}

/// Opacity in `[0,1]` to an alpha byte, `round(opacity * 255)`
pub fn alpha_byte(opacity: f64) -> u8 {
    let opacity = if opacity.is_finite() { opacity.clamp(0.0, 1.0) } else { 1.0 };
    (opacity * 255.0).round() as u8
}

/// Alpha byte as two lowercase hex digits
pub fn alpha_hex(opacity: f64) -> String {
    format!("{:02x}", alpha_byte(opacity))
}

/// ASS alpha is transparency, the inverse of opacity
pub fn ass_alpha_byte(opacity: f64) -> u8 {
    255 - alpha_byte(opacity)
}

/// Resolve a reference to a drawtext token, white when absent or unknown
pub fn hex_to_color(reference: Option<&str>) -> String {
    reference
        .and_then(Rgb::parse)
        .unwrap_or(Rgb::WHITE)
        .to_drawtext()
}

/// Resolve a reference to an ASS token, white when absent or unknown
pub fn hex_to_ass(reference: Option<&str>) -> String {
    reference
        .and_then(Rgb::parse)
        .unwrap_or(Rgb::WHITE)
        .to_ass()
}

/// Per-line colour resolution with `override > speakerColors > palette` precedence
///
/// Palette slots are assigned to named speakers in first-seen document order.
/// Unparseable references are skipped with a warning so the next source applies.
#[derive(Debug, Clone)]
pub struct ColorResolver<'a> {
    speaker_colors: &'a SpeakerColorMap,
    speaker_slots: HashMap<String, usize>,
}

impl<'a> ColorResolver<'a> {
    pub fn new(document: &SubtitleDocument, speaker_colors: &'a SpeakerColorMap) -> Self {
        let speaker_slots = document
            .speakers()
            .into_iter()
            .enumerate()
            .map(|(index, speaker)| (speaker.to_string(), index))
            .collect();

        ColorResolver {
            speaker_colors,
            speaker_slots,
        }
    }

    /// Palette entry for a speaker, slot 0 for lines without one
    pub fn palette_color(&self, speaker: Option<&str>) -> Rgb {
        let slot = speaker
            .and_then(|s| self.speaker_slots.get(s).copied())
            .unwrap_or(0);
        let name = DEFAULT_PALETTE[slot % DEFAULT_PALETTE.len()];
        Rgb::parse(name).unwrap_or(Rgb::WHITE)
    }

    /// Resolve the text colour for one line
    pub fn resolve(&self, line: &SubtitleLine) -> Rgb {
        let speaker = line.speaker_name();

        if let Some(reference) = line.override_color.as_deref() {
            match Rgb::parse(reference) {
                Some(rgb) => return rgb,
                None => warn!("Ignoring unrecognised override colour {:?}", reference),
            }
        }

        if let Some(reference) = speaker.and_then(|s| self.speaker_colors.get(s)) {
            match Rgb::parse(reference) {
                Some(rgb) => return rgb,
                None => warn!("Ignoring unrecognised colour {:?} for speaker {:?}", reference, speaker),
            }
        }

        self.palette_color(speaker)
    }
}
