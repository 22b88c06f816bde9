/*!
 * Text sanitizing for the two target grammars.
 *
 * ffmpeg reads a drawtext `text` value through three layers, innermost first:
 * drawtext's own `%{...}` expansion, the filter option parser, then the
 * filtergraph parser. Each layer has one escape function here and the filter
 * serializer applies them in order, so a call site never escapes by hand.
 *
 * ASS dialogue text has its own rules: no backslash escapes exist, `{` opens an
 * override block and `\N` is the hard line break.
 */

/// Characters the filter option parser treats specially
const OPTION_SPECIAL: &[char] = &['\\', '\'', ':'];

/// Characters the filtergraph parser treats specially
const GRAPH_SPECIAL: &[char] = &['\\', '\'', '[', ']', ',', ';'];

/// Sanitize raw text for a drawtext `text` value
///
/// Absent input becomes an empty string. The result is still subject to the
/// option and graph levels, which the filter serializer applies.
pub fn drawtext_text<'a>(input: impl Into<Option<&'a str>>) -> String {
    input.into().map(expand_text).unwrap_or_default()
}

/// drawtext expansion level: `\` and `%` are escaped, newlines become `\n`
pub fn expand_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '%' => out.push_str("\\%"),
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    out.push_str("\\n");
                }
            }
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Filter option level
pub fn escape_option_value(value: &str) -> String {
    backslash_escape(value, OPTION_SPECIAL)
}

/// Filtergraph level
pub fn escape_graph_value(value: &str) -> String {
    backslash_escape(value, GRAPH_SPECIAL)
}

fn backslash_escape(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Inverse of a backslash escaping level, used to check serialized graphs
pub fn unescape_level(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Inverse of [`expand_text`], the `\n` token decodes to a newline
pub fn unexpand_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Sanitize raw text for an ASS dialogue event
///
/// Backslashes are stripped, braces are escaped so user text cannot open an
/// override block, and newlines become the `\N` break token.
pub fn ass_text<'a>(input: impl Into<Option<&'a str>>) -> String {
    let Some(text) = input.into() else {
        return String::new();
    };

    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\\' | '\r' => {}
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\n' => out.push_str("\\N"),
            other => out.push(other),
        }
    }
    out
}

/// Sanitize a value for a comma-separated ASS field such as a style name
pub fn ass_field(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            ',' | '\n' | '\r' => ' ',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitize raw text for an SRT cue
///
/// Angle brackets are dropped so text cannot open markup and blank lines are
/// removed because a blank line terminates the cue.
pub fn srt_text<'a>(input: impl Into<Option<&'a str>>) -> String {
    let Some(text) = input.into() else {
        return String::new();
    };

    text.lines()
        .map(|line| line.replace(['<', '>', '\r'], ""))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
