/*!
 * Tests for colour parsing and speaker colour resolution
 */

use reelsub::render::color::{self, ColorResolver, Rgb, SpeakerColorMap};
use reelsub::subtitle_processor::{SubtitleDocument, SubtitleLine};

#[test]
fn test_parse_withShortHex_shouldMatchLongForm() {
    assert_eq!(Rgb::parse("#abc"), Rgb::parse("#aabbcc"));
    assert_eq!(Rgb::parse("#abc"), Some(Rgb::new(0xAA, 0xBB, 0xCC)));
    assert_eq!(Rgb::parse("abc"), Some(Rgb::new(0xAA, 0xBB, 0xCC)));
}

#[test]
fn test_parse_withNames_shouldBeCaseInsensitive() {
    assert_eq!(Rgb::parse("Yellow"), Some(Rgb::new(0xFF, 0xFF, 0x00)));
    assert_eq!(Rgb::parse("  WHITE "), Some(Rgb::WHITE));
    assert_eq!(Rgb::parse("grey"), Rgb::parse("gray"));
}

#[test]
fn test_parse_withDrawtextToken_shouldIgnoreAlpha() {
    assert_eq!(Rgb::parse("0x112233"), Some(Rgb::new(0x11, 0x22, 0x33)));
    assert_eq!(Rgb::parse("0x11223380"), Some(Rgb::new(0x11, 0x22, 0x33)));
}

#[test]
fn test_parse_withNonAscii_shouldReturnNone() {
    assert_eq!(Rgb::parse("#ééé"), None);
    assert_eq!(Rgb::parse("黄色"), None);
}

#[test]
fn test_to_ass_withRgb_shouldReverseByteOrder() {
    let rgb = Rgb::parse("#112233").unwrap();
    assert_eq!(rgb.to_ass(), "&H00332211");
}

#[test]
fn test_to_drawtext_withRgb_shouldUseUppercaseHex() {
    let rgb = Rgb::parse("#ffff00").unwrap();
    assert_eq!(rgb.to_drawtext(), "0xFFFF00");
    assert_eq!(rgb.to_html(), "#FFFF00");
    assert_eq!(rgb.to_string(), "#FFFF00");
}

#[test]
fn test_alpha_withHalfOpacity_shouldRoundAndInvertForAss() {
    assert_eq!(color::alpha_byte(0.5), 128);
    assert_eq!(color::ass_alpha_byte(0.5), 127);
    assert_eq!(Rgb::BLACK.to_drawtext_with_alpha(0.5), "0x00000080");
    assert_eq!(Rgb::BLACK.to_ass_with_alpha(0.5), "&H7F000000");
    assert_eq!(Rgb::BLACK.to_ass_with_alpha(1.0), "&H00000000");
}

#[test]
fn test_alpha_withOutOfRangeOpacity_shouldClamp() {
    assert_eq!(color::alpha_byte(3.0), 255);
    assert_eq!(color::alpha_byte(-1.0), 0);
    assert_eq!(color::alpha_hex(0.0), "00");
}

#[test]
fn test_parse_with_opacity_withInlineOpacity_shouldSplit() {
    let (rgb, opacity) = Rgb::parse_with_opacity("black@0.35");
    assert_eq!(rgb, Some(Rgb::BLACK));
    assert_eq!(opacity, Some(0.35));

    let (rgb, opacity) = Rgb::parse_with_opacity("#202020");
    assert_eq!(rgb, Some(Rgb::new(0x20, 0x20, 0x20)));
    assert_eq!(opacity, None);
}

#[test]
fn test_hex_to_color_withAbsentOrInvalid_shouldDefaultToWhite() {
    assert_eq!(color::hex_to_color(None), "0xFFFFFF");
    assert_eq!(color::hex_to_color(Some("not-a-colour")), "0xFFFFFF");
    assert_eq!(color::hex_to_color(Some("#00ff00")), "0x00FF00");
    assert_eq!(color::hex_to_ass(Some("red")), "&H000000FF");
}

#[test]
fn test_resolver_withNoMapping_shouldAssignPaletteInFirstSeenOrder() {
    let document = SubtitleDocument::new(vec![
        SubtitleLine::new("one", 0.0, 1.0).with_speaker("Bob"),
        SubtitleLine::new("two", 1.0, 2.0).with_speaker("Alice"),
        SubtitleLine::new("three", 2.0, 3.0).with_speaker("Bob"),
        SubtitleLine::new("four", 3.0, 4.0),
    ]);
    let colors = SpeakerColorMap::new();
    let resolver = ColorResolver::new(&document, &colors);

    let yellow = Rgb::parse(color::DEFAULT_PALETTE[0]).unwrap();
    let white = Rgb::parse(color::DEFAULT_PALETTE[1]).unwrap();
    assert_eq!(resolver.resolve(&document.lines[0]), yellow);
    assert_eq!(resolver.resolve(&document.lines[1]), white);
    assert_eq!(resolver.resolve(&document.lines[2]), yellow);
    // no speaker falls back to the first palette slot
    assert_eq!(resolver.resolve(&document.lines[3]), yellow);
}

#[test]
fn test_resolver_withManySpeakers_shouldWrapPalette() {
    let lines = (0..6)
        .map(|i| SubtitleLine::new("x", i as f64, i as f64 + 1.0).with_speaker(format!("S{}", i)))
        .collect();
    let document = SubtitleDocument::new(lines);
    let colors = SpeakerColorMap::new();
    let resolver = ColorResolver::new(&document, &colors);

    assert_eq!(resolver.resolve(&document.lines[5]), resolver.resolve(&document.lines[0]));
}

#[test]
fn test_resolver_withAllSources_shouldPreferOverrideThenSpeakerMap() {
    let document = SubtitleDocument::new(vec![
        SubtitleLine::new("a", 0.0, 1.0).with_speaker("A").with_override_color("#FF0000"),
        SubtitleLine::new("b", 1.0, 2.0).with_speaker("A"),
        SubtitleLine::new("c", 2.0, 3.0).with_speaker("A").with_override_color("bogus"),
    ]);
    let mut colors = SpeakerColorMap::new();
    colors.insert("A".to_string(), "#0000FF".to_string());
    let resolver = ColorResolver::new(&document, &colors);

    assert_eq!(resolver.resolve(&document.lines[0]), Rgb::new(0xFF, 0, 0));
    assert_eq!(resolver.resolve(&document.lines[1]), Rgb::new(0, 0, 0xFF));
    // unparseable override falls through to the speaker mapping
    assert_eq!(resolver.resolve(&document.lines[2]), Rgb::new(0, 0, 0xFF));
}

#[test]
fn test_resolver_withInvalidSpeakerColor_shouldFallBackToPalette() {
    let document = SubtitleDocument::new(vec![SubtitleLine::new("a", 0.0, 1.0).with_speaker("A")]);
    let mut colors = SpeakerColorMap::new();
    colors.insert("A".to_string(), "#12".to_string());
    let resolver = ColorResolver::new(&document, &colors);

    assert_eq!(resolver.resolve(&document.lines[0]), Rgb::parse("yellow").unwrap());
}
