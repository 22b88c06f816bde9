use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

// @module: File and directory utilities

/// Suffix of the editable subtitle document written next to each output
pub const SIDECAR_SUFFIX: &str = "subtitles";

// Common video file extensions supported by ffmpeg
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ogv", "ts", "mts", "m2ts",
];

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

static SUBTITLE_DOCUMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""subtitles"\s*:\s*\["#).expect("valid subtitle document pattern"));

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    // @generates: Output path for a processed video
    // @params: input_file, output_dir, suffix, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let output_dir = output_dir.as_ref();

        let stem = input_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        if !suffix.is_empty() {
            output_filename.push('.');
            output_filename.push_str(suffix);
        }
        output_filename.push('.');
        output_filename.push_str(extension.trim_start_matches('.'));

        output_dir.join(output_filename)
    }

    // @generates: Subtitle document path stored next to an output video
    pub fn sidecar_path<P: AsRef<Path>>(output_video: P) -> PathBuf {
        let output_video = output_video.as_ref();
        let dir = output_video.parent().unwrap_or_else(|| Path::new(""));
        Self::generate_output_path(output_video, dir, SIDECAR_SUFFIX, "json")
    }

    /// Find video files below a directory, sorted for stable processing order
    pub fn find_videos<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if path.is_file() && Self::has_extension(path, VIDEO_EXTENSIONS) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    fn has_extension(path: &Path, extensions: &[&str]) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| extensions.contains(&ext.as_str()))
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Write content to a temporary file that is deleted when the handle drops
    pub fn write_temp_file(content: &str, extension: &str) -> Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("reelsub-")
            .suffix(&format!(".{}", extension.trim_start_matches('.')))
            .tempfile()
            .context("Failed to create temporary file")?;
        file.write_all(content.as_bytes())
            .context("Failed to write temporary file")?;
        file.flush().context("Failed to flush temporary file")?;
        Ok(file)
    }

    /// Detect whether a file is a video, a subtitle document or a font
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow!("File does not exist: {:?}", path));
        }

        if Self::has_extension(path, VIDEO_EXTENSIONS) {
            return Ok(FileType::Video);
        }
        if Self::has_extension(path, FONT_EXTENSIONS) {
            return Ok(FileType::Font);
        }

        if let Ok(content) = fs::read_to_string(path) {
            if SUBTITLE_DOCUMENT_PATTERN.is_match(&content) {
                return Ok(FileType::SubtitleDocument);
            }
        }

        // If extension check doesn't work, try to examine the file with ffprobe
        let output = Command::new("ffprobe")
            .args(["-v", "error", "-show_entries", "format=format_name", "-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path)
            .output();

        if let Ok(output) = output {
            if output.status.success() && !String::from_utf8_lossy(&output.stdout).trim().is_empty() {
                return Ok(FileType::Video);
            }
        }

        Ok(FileType::Unknown)
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Video file supported by ffmpeg
    Video,
    /// `{ "subtitles": [...] }` JSON document
    SubtitleDocument,
    /// TrueType or OpenType font
    Font,
    /// Unknown file type
    Unknown,
}
