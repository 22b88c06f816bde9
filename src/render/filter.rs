/*!
 * Typed filter-graph descriptors and their serializer.
 *
 * A stage is an operation name plus an ordered option list. Values are either
 * user text or expressions, and [`FilterValue::serialize`] is the only place
 * where either is escaped for ffmpeg. Builders never format option strings
 * themselves.
 */

use std::fmt;
use crate::render::sanitize;

/// Output canvas width in pixels
pub const CANVAS_WIDTH: u32 = 1080;

/// Output canvas height in pixels
pub const CANVAS_HEIGHT: u32 = 1920;

/// Default input pad label for `-filter_complex`
pub const INPUT_LABEL: &str = "0:v";

/// Final output pad label for `-filter_complex`
pub const OUTPUT_LABEL: &str = "vout";

/// How a value is escaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// drawtext text, gets expansion escaping on top of the option and graph levels
    Text,
    /// Expressions, numbers, colours and paths
    Expr,
}

/// A single option value
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Expr(String),
}

impl FilterValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Expr(_) => ValueKind::Expr,
        }
    }

    /// The unescaped value
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Expr(s) => s,
        }
    }

    /// Escape the value for direct use in a filtergraph string
    pub fn serialize(&self) -> String {
        let option_level = match self {
            Self::Text(text) => sanitize::escape_option_value(&sanitize::drawtext_text(text.as_str())),
            Self::Expr(expr) => sanitize::escape_option_value(expr),
        };
        sanitize::escape_graph_value(&option_level)
    }
}

/// Undo [`FilterValue::serialize`] for one value
pub fn unescape_value(serialized: &str, kind: ValueKind) -> String {
    let value = sanitize::unescape_level(&sanitize::unescape_level(serialized));
    match kind {
        ValueKind::Text => sanitize::unexpand_text(&value),
        ValueKind::Expr => value,
    }
}

/// One filter stage
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDescriptor {
    pub name: String,
    pub options: Vec<(String, FilterValue)>,
}

impl FilterDescriptor {
    pub fn new<S: Into<String>>(name: S) -> Self {
        FilterDescriptor {
            name: name.into(),
            options: Vec::new(),
        }
    }

    /// Append a text option
    pub fn text<K: Into<String>, V: Into<String>>(self, key: K, value: V) -> Self {
        self.option(key, FilterValue::Text(value.into()))
    }

    /// Append an expression option
    pub fn expr<K: Into<String>, V: ToString>(self, key: K, value: V) -> Self {
        self.option(key, FilterValue::Expr(value.to_string()))
    }

    pub fn option<K: Into<String>>(mut self, key: K, value: FilterValue) -> Self {
        self.options.push((key.into(), value));
        self
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.options.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Serialize to `name=key=value:key=value`
    pub fn render(&self) -> String {
        if self.options.is_empty() {
            return self.name.clone();
        }
        let options = self
            .options
            .iter()
            .map(|(key, value)| format!("{}={}", key, value.serialize()))
            .collect::<Vec<_>>()
            .join(":");
        format!("{}={}", self.name, options)
    }
}

impl fmt::Display for FilterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Ordered stages forming one linear pipeline
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterGraph {
    stages: Vec<FilterDescriptor>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph starting with the fit-and-pad stages for the output canvas
    pub fn with_canvas() -> Self {
        let mut graph = Self::new();
        graph.push(
            FilterDescriptor::new("scale")
                .expr("w", CANVAS_WIDTH)
                .expr("h", CANVAS_HEIGHT)
                .expr("force_original_aspect_ratio", "decrease"),
        );
        graph.push(
            FilterDescriptor::new("pad")
                .expr("w", CANVAS_WIDTH)
                .expr("h", CANVAS_HEIGHT)
                .expr("x", "(ow-iw)/2")
                .expr("y", "(oh-ih)/2")
                .expr("color", "black"),
        );
        graph
    }

    pub fn push(&mut self, stage: FilterDescriptor) {
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[FilterDescriptor] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Comma-joined chain for `-vf`
    pub fn render_chain(&self) -> String {
        if self.stages.is_empty() {
            return "null".to_string();
        }
        self.stages
            .iter()
            .map(FilterDescriptor::render)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Labelled chain for `-filter_complex`, `[in]s0[v0];[v0]s1[v1];...[out]`
    pub fn render_labeled(&self, input: &str, output: &str) -> String {
        if self.stages.is_empty() {
            return format!("[{}]null[{}]", input, output);
        }

        let last = self.stages.len() - 1;
        self.stages
            .iter()
            .enumerate()
            .map(|(index, stage)| {
                let source = if index == 0 { input.to_string() } else { format!("v{}", index - 1) };
                let sink = if index == last { output.to_string() } else { format!("v{}", index) };
                format!("[{}]{}[{}]", source, stage.render(), sink)
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_chain())
    }
}

/// Parse a linear chain back into stages
///
/// Values come back as the filter itself receives them, so drawtext text is
/// still in expansion form. Pass it through [`sanitize::unexpand_text`] to get
/// the displayed text.
pub fn parse_chain(chain: &str) -> Vec<FilterDescriptor> {
    split_unescaped(chain, ',')
        .into_iter()
        .map(|stage| {
            let option_level = sanitize::unescape_level(&stage);
            let (name, rest) = match option_level.split_once('=') {
                Some((name, rest)) => (name.to_string(), rest.to_string()),
                None => (option_level.clone(), String::new()),
            };
            let mut descriptor = FilterDescriptor::new(name);
            if !rest.is_empty() {
                for pair in split_unescaped(&rest, ':') {
                    let (key, value) = pair.split_once('=').unwrap_or((pair.as_str(), ""));
                    descriptor = descriptor.expr(key, sanitize::unescape_level(value));
                }
            }
            descriptor
        })
        .collect()
}

// Split on a separator that is not preceded by a backslash escape
fn split_unescaped(input: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            current.push(c);
            if let Some(next) = chars.next() {
                current.push(next);
            }
        } else if c == separator {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}
