/*!
 * Timing repair and timestamp formatting.
 *
 * Upstream timestamps are untrusted: negative starts, inverted windows and
 * zero-length spans all occur. Every renderer goes through `repair` so a line
 * is never dropped and always stays on screen for at least the floor duration.
 */

/// Default minimum on-screen duration in seconds
pub const DEFAULT_MIN_DURATION_SECS: f64 = 0.5;

/// Smallest floor accepted from configuration
pub const MIN_DURATION_LOWER_BOUND: f64 = 0.01;

/// A repaired display window in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSpan {
    /// Start in seconds, never negative
    pub start: f64,
    /// End in seconds, at least `start + floor`
    pub end: f64,
}

impl TimeSpan {
    /// Display duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Clamp a configured floor to a usable value
///
/// Floors below one centisecond would round away in ASS timestamps.
pub fn effective_floor(min_duration: f64) -> f64 {
    if min_duration.is_finite() {
        min_duration.max(MIN_DURATION_LOWER_BOUND)
    } else {
        MIN_DURATION_LOWER_BOUND
    }
}

/// Repair a raw start/end pair
///
/// Non-finite starts become 0, negative starts are clamped to 0, and the end is
/// pushed out so the span lasts at least `min_duration` seconds.
pub fn repair(start: f64, end: f64, min_duration: f64) -> TimeSpan {
    let floor = effective_floor(min_duration);
    let start = if start.is_finite() { start.max(0.0) } else { 0.0 };
    let end = if end.is_finite() { end.max(start + floor) } else { start + floor };
    TimeSpan { start, end }
}

/// Format seconds as an ASS timestamp, `H:MM:SS.CC`
pub fn format_ass_timestamp(seconds: f64) -> String {
    format_centiseconds(to_units(seconds, 100.0))
}

/// ASS start and end timestamps for a span, the end at least one centisecond later
pub fn format_ass_span(span: TimeSpan) -> (String, String) {
    let start = to_units(span.start, 100.0);
    let end = to_units(span.end, 100.0).max(start + 1);
    (format_centiseconds(start), format_centiseconds(end))
}

fn format_centiseconds(total_cs: u64) -> String {
    let hours = total_cs / 360_000;
    let minutes = (total_cs % 360_000) / 6_000;
    let secs = (total_cs % 6_000) / 100;
    let centis = total_cs % 100;

    format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, centis)
}

/// Format seconds as an SRT timestamp, `HH:MM:SS,mmm`
pub fn format_srt_timestamp(seconds: f64) -> String {
    let ms = to_units(seconds, 1000.0);
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Format seconds with millisecond precision for filter expressions
pub fn format_expr_seconds(seconds: f64) -> String {
    format!("{:.3}", seconds)
}

// Rounded integer units, negative and non-finite inputs count as zero
fn to_units(seconds: f64, per_second: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * per_second).round() as u64
}
