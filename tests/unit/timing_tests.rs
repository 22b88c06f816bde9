/*!
 * Tests for timing repair and timestamp formatting
 */

use reelsub::render::timing::{self, DEFAULT_MIN_DURATION_SECS};

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "expected {}, got {}", expected, actual);
}

#[test]
fn test_repair_withValidSpan_shouldKeepIt() {
    let span = timing::repair(1.0, 3.0, DEFAULT_MIN_DURATION_SECS);
    assert_close(span.start, 1.0);
    assert_close(span.end, 3.0);
}

#[test]
fn test_repair_withInvertedSpan_shouldExtendToFloor() {
    let span = timing::repair(5.0, 4.0, DEFAULT_MIN_DURATION_SECS);
    assert_close(span.start, 5.0);
    assert_close(span.end, 5.5);
}

#[test]
fn test_repair_withNegativeStart_shouldClampToZero() {
    let span = timing::repair(-2.0, 1.0, DEFAULT_MIN_DURATION_SECS);
    assert_close(span.start, 0.0);
    assert_close(span.end, 1.0);
}

#[test]
fn test_repair_withNonFiniteTimes_shouldStillProduceWindow() {
    let span = timing::repair(f64::NAN, f64::INFINITY, 0.5);
    assert_close(span.start, 0.0);
    assert_close(span.end, 0.5);
}

#[test]
fn test_repair_withAnyInput_shouldLastAtLeastFloor() {
    let samples = [(0.0, 0.0), (3.0, 3.1), (10.0, 2.0), (-1.0, -5.0), (7.25, 9.0)];
    for (start, end) in samples {
        let span = timing::repair(start, end, 0.5);
        assert!(span.start >= 0.0);
        assert!(span.duration() >= 0.5 - 1e-9, "{:?} -> {:?}", (start, end), span);
    }
}

#[test]
fn test_effective_floor_withNonPositive_shouldUseLowerBound() {
    assert_close(timing::effective_floor(0.0), timing::MIN_DURATION_LOWER_BOUND);
    assert_close(timing::effective_floor(-3.0), timing::MIN_DURATION_LOWER_BOUND);
    assert_close(timing::effective_floor(f64::NAN), timing::MIN_DURATION_LOWER_BOUND);
    assert_close(timing::effective_floor(1.5), 1.5);
}

#[test]
fn test_effective_floor_withSubPrecisionFloor_shouldRaiseToLowerBound() {
    assert_close(timing::effective_floor(0.0004), timing::MIN_DURATION_LOWER_BOUND);
    assert_close(timing::effective_floor(0.004), timing::MIN_DURATION_LOWER_BOUND);

    let span = timing::repair(1.0, 1.0, 0.004);
    assert_close(span.end, 1.01);
}

#[test]
fn test_format_ass_span_withEndsRoundingTogether_shouldKeepOneCentisecond() {
    let span = timing::TimeSpan { start: 1.001, end: 1.004 };
    assert_eq!(
        timing::format_ass_span(span),
        ("0:00:01.00".to_string(), "0:00:01.01".to_string())
    );

    let span = timing::TimeSpan { start: 2.0, end: 3.5 };
    assert_eq!(
        timing::format_ass_span(span),
        ("0:00:02.00".to_string(), "0:00:03.50".to_string())
    );
}

#[test]
fn test_format_ass_timestamp_withFractions_shouldUseCentiseconds() {
    assert_eq!(timing::format_ass_timestamp(0.0), "0:00:00.00");
    assert_eq!(timing::format_ass_timestamp(2.5), "0:00:02.50");
    assert_eq!(timing::format_ass_timestamp(75.123), "0:01:15.12");
}

#[test]
fn test_format_srt_timestamp_withFractions_shouldUseMilliseconds() {
    assert_eq!(timing::format_srt_timestamp(0.0), "00:00:00,000");
    assert_eq!(timing::format_srt_timestamp(3723.456), "01:02:03,456");
    assert_eq!(timing::format_srt_timestamp(-1.0), "00:00:00,000");
}

#[test]
fn test_format_expr_seconds_withAnyValue_shouldUseThreeDecimals() {
    assert_eq!(timing::format_expr_seconds(0.0), "0.000");
    assert_eq!(timing::format_expr_seconds(2.0), "2.000");
    assert_eq!(timing::format_expr_seconds(1.23456), "1.235");
}
