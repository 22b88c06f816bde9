use std::fmt;
use std::fs;
use std::path::Path;
use anyhow::{Result, Context};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::errors::CompileError;
use crate::render::timing::{self, TimeSpan};

// @module: Subtitle document model and validation of the transcription payload

// @struct: One spoken utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleLine {
    // @field: Speaker identifier, groups lines for colour assignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,

    // @field: Display text, may contain hard line breaks
    #[serde(rename = "line", alias = "text")]
    pub text: String,

    // @field: Start time in seconds
    pub start_time: f64,

    // @field: End time in seconds, not guaranteed to be after start_time
    pub end_time: f64,

    // @field: Explicit colour that wins over the speaker colour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_color: Option<String>,
}

impl SubtitleLine {
    /// Creates a new line without speaker or colour override
    pub fn new(text: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        SubtitleLine {
            speaker: None,
            text: text.into(),
            start_time,
            end_time,
            override_color: None,
        }
    }

    /// Sets the speaker
    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    /// Sets the colour override
    pub fn with_override_color(mut self, color: impl Into<String>) -> Self {
        self.override_color = Some(color.into());
        self
    }

    /// Repaired display window, at least `min_duration` long
    pub fn span(&self, min_duration: f64) -> TimeSpan {
        timing::repair(self.start_time, self.end_time, min_duration)
    }

    /// Speaker name, treating an empty string as absent
    pub fn speaker_name(&self) -> Option<&str> {
        self.speaker.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

impl fmt::Display for SubtitleLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{:.2} -> {:.2}] {}: {}",
            self.start_time,
            self.end_time,
            self.speaker_name().unwrap_or("-"),
            self.text
        )
    }
}

/// Ordered subtitle lines, insertion order is rendering order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtitleDocument {
    /// The lines, in chronological order by caller convention
    #[serde(rename = "subtitles")]
    pub lines: Vec<SubtitleLine>,
}

impl SubtitleDocument {
    /// Create a document from lines
    pub fn new(lines: Vec<SubtitleLine>) -> Self {
        SubtitleDocument { lines }
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the document has no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate over the lines
    pub fn iter(&self) -> std::slice::Iter<'_, SubtitleLine> {
        self.lines.iter()
    }

    /// Named speakers in first-seen order
    pub fn speakers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for line in &self.lines {
            if let Some(speaker) = line.speaker_name() {
                if !seen.contains(&speaker) {
                    seen.push(speaker);
                }
            }
        }
        seen
    }

    /// Parse and validate a `{ "subtitles": [...] }` JSON string
    pub fn from_json_str(json: &str) -> Result<Self, CompileError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| CompileError::invalid(format!("subtitle document is not valid JSON: {}", e)))?;
        Self::from_value(&value)
    }

    /// Validate the consumed data contract and build a document
    ///
    /// The `subtitles` field must exist and be an array, and every entry must be an
    /// object with a string `line` (or `text`). Times may be numbers or numeric
    /// strings; a missing start becomes 0 and a missing end collapses onto the
    /// start so timing repair can widen it later.
    pub fn from_value(value: &Value) -> Result<Self, CompileError> {
        let root = value
            .as_object()
            .ok_or_else(|| CompileError::invalid("subtitle document must be a JSON object"))?;

        let entries = match root.get("subtitles") {
            Some(Value::Array(entries)) => entries,
            Some(_) => return Err(CompileError::invalid("`subtitles` must be an array")),
            None => return Err(CompileError::invalid("missing `subtitles` field")),
        };

        let mut lines = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let object = entry
                .as_object()
                .ok_or_else(|| CompileError::invalid(format!("subtitle {} is not an object", index)))?;
            lines.push(Self::parse_line(index, object)?);
        }

        debug!("Validated subtitle document with {} line(s)", lines.len());
        Ok(SubtitleDocument { lines })
    }

    fn parse_line(index: usize, object: &Map<String, Value>) -> Result<SubtitleLine, CompileError> {
        let text = match object.get("line").or_else(|| object.get("text")) {
            Some(Value::String(text)) => text.clone(),
            Some(_) => {
                return Err(CompileError::invalid(format!("subtitle {} has a non-string `line`", index)));
            }
            None => return Err(CompileError::invalid(format!("subtitle {} has no `line`", index))),
        };

        let speaker = Self::optional_string(index, object, "speaker")?;
        let override_color = Self::optional_string(index, object, "overrideColor")?;
        let start_time = Self::optional_seconds(index, object, "startTime")?.unwrap_or(0.0);
        let end_time = Self::optional_seconds(index, object, "endTime")?.unwrap_or(start_time);

        Ok(SubtitleLine {
            speaker,
            text,
            start_time,
            end_time,
            override_color,
        })
    }

    fn optional_string(index: usize, object: &Map<String, Value>, key: &str) -> Result<Option<String>, CompileError> {
        match object.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(CompileError::invalid(format!("subtitle {} has a non-string `{}`", index, key))),
        }
    }

    fn optional_seconds(index: usize, object: &Map<String, Value>, key: &str) -> Result<Option<f64>, CompileError> {
        match object.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| CompileError::invalid(format!("subtitle {} has a non-numeric `{}`: {:?}", index, key, s))),
            Some(_) => Err(CompileError::invalid(format!("subtitle {} has a non-numeric `{}`", index, key))),
        }
    }

    /// Load and validate a document from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle document: {}", path.display()))?;
        let document = Self::from_json_str(&content)
            .with_context(|| format!("Invalid subtitle document: {}", path.display()))?;
        Ok(document)
    }

    /// Write the document as pretty JSON so it can be edited and re-burned
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize subtitle document")?;
        fs::write(path, json).with_context(|| format!("Failed to write subtitle document: {}", path.display()))?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a SubtitleDocument {
    type Item = &'a SubtitleLine;
    type IntoIter = std::slice::Iter<'a, SubtitleLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
