/*!
 * Tests for line wrapping
 */

use reelsub::render::wrap::{char_budget, wrap_text};

#[test]
fn test_wrap_text_withShortText_shouldReturnSingleLine() {
    assert_eq!(wrap_text("Hello world", 30), vec!["Hello world"]);
}

#[test]
fn test_wrap_text_withLongText_shouldPackGreedily() {
    let lines = wrap_text("the quick brown fox jumps over the lazy dog", 10);
    assert_eq!(lines, vec!["the quick", "brown fox", "jumps over", "the lazy", "dog"]);
    assert!(lines.iter().all(|l| l.chars().count() <= 10));
}

#[test]
fn test_wrap_text_withAnyText_shouldPreserveWordsInOrder() {
    let text = "a bb ccc dddd eeeee ffffff ggggggg";
    for budget in 1..12 {
        let joined = wrap_text(text, budget).join(" ");
        let original: Vec<&str> = text.split_whitespace().collect();
        let rejoined: String = joined.split_whitespace().collect::<Vec<_>>().concat();
        assert_eq!(rejoined, original.concat(), "budget {}", budget);
    }
}

#[test]
fn test_wrap_text_withOverlongWord_shouldHardSplit() {
    let lines = wrap_text("abcdefghij xy", 4);
    assert_eq!(lines, vec!["abcd", "efgh", "ij", "xy"]);
}

#[test]
fn test_wrap_text_withRemainderRoom_shouldAppendToRemainder() {
    let lines = wrap_text("abcdef g", 4);
    assert_eq!(lines, vec!["abcd", "ef g"]);
}

#[test]
fn test_wrap_text_withEmptyInput_shouldNeverReturnEmpty() {
    assert_eq!(wrap_text("", 10), vec![String::new()]);
    assert_eq!(wrap_text("   ", 10), vec![String::new()]);
    assert_eq!(wrap_text("word", 0), vec!["w", "o", "r", "d"]);
}

#[test]
fn test_wrap_text_withEmbeddedNewline_shouldHardBreak() {
    assert_eq!(wrap_text("first\nsecond", 40), vec!["first", "second"]);
}

#[test]
fn test_wrap_text_withMultibyteText_shouldCountChars() {
    let lines = wrap_text("ééééé", 2);
    assert_eq!(lines, vec!["éé", "éé", "é"]);
}

#[test]
fn test_char_budget_withDefaults_shouldDeriveFromLayout() {
    // (1080 * 0.8 - 40) / (44 * 0.55) = 824 / 24.2 = 34.05
    assert_eq!(char_budget(44, 80.0, 20, 1080), 34);
}

#[test]
fn test_char_budget_withLargerFont_shouldShrink() {
    assert!(char_budget(88, 80.0, 20, 1080) < char_budget(44, 80.0, 20, 1080));
}

#[test]
fn test_char_budget_withNoRoom_shouldBeAtLeastOne() {
    assert_eq!(char_budget(400, 1.0, 500, 1080), 1);
}
