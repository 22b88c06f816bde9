/*!
 * ffmpeg collaborator.
 *
 * Takes a compiled filter graph and burns it into a re-encoded copy of the
 * input. The compiler's only contract with this module is a finished graph
 * string; everything here is process plumbing.
 */

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::app_config::TranscoderConfig;
use crate::errors::TranscodeError;
use crate::render::filter::{FilterGraph, INPUT_LABEL, OUTPUT_LABEL};

/// How the filter graph is handed to ffmpeg
#[derive(Debug, Clone, PartialEq)]
pub enum FilterArgument {
    /// Linear chain passed with `-vf`
    Chain(String),
    /// Labelled graph passed with `-filter_complex`, video taken from `output_label`
    Complex { graph: String, output_label: String },
}

impl FilterArgument {
    /// Serialize a graph in the requested form
    pub fn from_graph(graph: &FilterGraph, use_filter_complex: bool) -> Self {
        if use_filter_complex {
            Self::Complex {
                graph: graph.render_labeled(INPUT_LABEL, OUTPUT_LABEL),
                output_label: OUTPUT_LABEL.to_string(),
            }
        } else {
            Self::Chain(graph.render_chain())
        }
    }
}

/// One burn-in job
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub filter: FilterArgument,
}

/// Runs ffmpeg and ffprobe
#[derive(Debug, Clone)]
pub struct Transcoder {
    config: TranscoderConfig,
}

impl Transcoder {
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranscoderConfig {
        &self.config
    }

    /// ffmpeg arguments for a job, progress is reported on stdout
    pub fn build_args(&self, job: &TranscodeJob) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-y".into(),
            "-i".into(),
            job.input.to_string_lossy().into_owned(),
        ];

        match &job.filter {
            FilterArgument::Chain(chain) => {
                args.push("-vf".into());
                args.push(chain.clone());
            }
            FilterArgument::Complex { graph, output_label } => {
                args.push("-filter_complex".into());
                args.push(graph.clone());
                args.push("-map".into());
                args.push(format!("[{}]", output_label));
                args.push("-map".into());
                args.push("0:a?".into());
            }
        }

        args.extend([
            "-c:v".to_string(),
            self.config.video_codec.clone(),
            "-preset".to_string(),
            self.config.preset.clone(),
            "-crf".to_string(),
            self.config.crf.to_string(),
            "-c:a".to_string(),
            self.config.audio_codec.clone(),
            "-b:a".to_string(),
            self.config.audio_bitrate.clone(),
        ]);
        if self.config.faststart {
            args.push("-movflags".into());
            args.push("+faststart".into());
        }
        args.extend(["-progress".to_string(), "pipe:1".to_string(), "-nostats".to_string()]);
        args.push(job.output.to_string_lossy().into_owned());
        args
    }

    /// Input duration in seconds, `None` when ffprobe is unavailable or fails
    pub async fn probe_duration(&self, input: &Path) -> Option<f64> {
        let ffprobe_future = Command::new(&self.config.ffprobe_path)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(input)
            .output();

        let output = tokio::select! {
            result = ffprobe_future => result.ok()?,
            _ = tokio::time::sleep(Duration::from_secs(30)) => {
                debug!("ffprobe timed out for {}", input.display());
                return None;
            }
        };

        if !output.status.success() {
            debug!("ffprobe failed for {}", input.display());
            return None;
        }
        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d > 0.0)
    }

    /// Run ffmpeg for a job, killing it after the configured timeout
    pub async fn burn(&self, job: &TranscodeJob) -> Result<(), TranscodeError> {
        let args = self.build_args(job);
        debug!("Running {} {}", self.config.ffmpeg_path, args.join(" "));

        let duration = self.probe_duration(&job.input).await;
        let progress_bar = progress_bar_for(duration);
        progress_bar.set_message(
            job.output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TranscodeError::Spawn(format!("{}: {}", self.config.ffmpeg_path, e)))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buffer = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buffer).await;
            }
            buffer
        });

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let outcome = {
            let run = async {
                if let Some(stdout) = stdout {
                    let mut lines = BufReader::new(stdout).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        if let Some(seconds) = parse_progress_line(&line) {
                            progress_bar.set_position((seconds * 1000.0) as u64);
                        }
                    }
                }
                child.wait().await
            };

            tokio::select! {
                status = run => Some(status),
                _ = tokio::time::sleep(timeout) => None,
            }
        };

        let status = match outcome {
            Some(status) => status.map_err(|e| TranscodeError::Spawn(format!("Failed to wait for ffmpeg: {}", e)))?,
            None => {
                let _ = child.kill().await;
                progress_bar.abandon_with_message("timed out");
                error!("ffmpeg timed out after {} seconds", self.config.timeout_secs);
                return Err(TranscodeError::Timeout(self.config.timeout_secs));
            }
        };

        let stderr = stderr_task.await.unwrap_or_default();
        if !status.success() {
            progress_bar.abandon_with_message("failed");
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("Burning subtitles failed: {}", filtered);
            return Err(TranscodeError::Failed {
                status: status.code().unwrap_or(-1),
                stderr: filtered,
            });
        }

        progress_bar.finish_and_clear();
        info!("Encoded {}", job.output.display());
        Ok(())
    }
}

fn progress_bar_for(duration: Option<f64>) -> ProgressBar {
    match duration {
        Some(seconds) => {
            let bar = ProgressBar::new((seconds * 1000.0) as u64);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg} {eta}")
                .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {percent}% {msg}"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style.progress_chars("█▓▒░"));
            bar
        }
        None => {
            let spinner = ProgressBar::new_spinner();
            let style = ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner
        }
    }
}

/// Encoded position in seconds from an ffmpeg `-progress` line
pub fn parse_progress_line(line: &str) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    let micros = match key {
        // both keys carry microseconds despite the name
        "out_time_us" | "out_time_ms" => value.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (micros >= 0).then(|| micros as f64 / 1_000_000.0)
}

/// Drop ffmpeg's banner, stream listing and metadata noise from stderr
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    const NOISE_PREFIXES: &[&str] = &[
        "ffmpeg version",
        "  built with",
        "  configuration:",
        "  lib",
        "Input #",
        "  Metadata:",
        "  Duration:",
        "  Stream #",
        "    Metadata:",
        "      handler_name",
        "      vendor_id",
        "      encoder",
        "Output #",
        "Stream mapping:",
        "Press [q]",
        "frame=",
        "[libx264 @",
    ];

    let filtered: Vec<&str> = stderr
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !NOISE_PREFIXES.iter().any(|prefix| line.starts_with(prefix)))
        .map(str::trim)
        .collect();

    if filtered.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        filtered.join("\n")
    }
}
