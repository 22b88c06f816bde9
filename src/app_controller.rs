use anyhow::{Result, Context, anyhow};
use log::{error, warn, info, debug};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use indicatif::{ProgressBar, ProgressStyle};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::app_config::Config;
use crate::file_utils::{FileManager, FileType};
use crate::providers::Transcriber;
use crate::render::{self, Artifact, FontRegistry, SpeakerColorMap, StyleConfig, StyleOptions};
use crate::render::filter::FilterGraph;
use crate::render::track::track_filter_graph;
use crate::subtitle_processor::SubtitleDocument;
use crate::transcoder::{FilterArgument, TranscodeJob, Transcoder};
use crate::transcription_service::TranscriptionService;

// @module: Application controller for subtitle burn-in

// @const: Suffix inserted between the input stem and the output extension
pub const OUTPUT_SUFFIX: &str = "subtitled";

// @const: Container of rendered videos
pub const OUTPUT_EXTENSION: &str = "mp4";

/// A compiled burn-in filter, plus the track file it may reference
///
/// The track file is deleted when this value drops, so it must outlive the
/// ffmpeg run.
pub struct CompiledFilter {
    /// What the compiler produced
    pub artifact: Artifact,
    /// Graph handed to ffmpeg
    pub graph: FilterGraph,
    // @field: Track document on disk, for track and caption modes
    track_file: Option<NamedTempFile>,
}

impl CompiledFilter {
    /// Path of the written track file, if any
    pub fn track_path(&self) -> Option<&Path> {
        self.track_file.as_ref().map(|f| f.path())
    }
}

/// Main application controller for subtitle burn-in
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Turns videos into subtitle documents
    transcription: TranscriptionService,

    // @field: Runs ffmpeg
    transcoder: Transcoder,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let transcription = TranscriptionService::new(config.transcription.clone());
        let transcoder = Transcoder::new(config.transcoder.clone());

        Ok(Self {
            config,
            transcription,
            transcoder,
        })
    }

    /// Create a controller that transcribes with the given provider
    pub fn with_transcriber(config: Config, transcriber: Arc<dyn Transcriber>) -> Result<Self> {
        let transcription = TranscriptionService::with_transcriber(transcriber, config.transcription.clone());
        let transcoder = Transcoder::new(config.transcoder.clone());

        Ok(Self {
            config,
            transcription,
            transcoder,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Output video path for an input
    pub fn output_path(input_file: &Path, output_dir: &Path) -> PathBuf {
        FileManager::generate_output_path(input_file, output_dir, OUTPUT_SUFFIX, OUTPUT_EXTENSION)
    }

    /// Whether a path is a video this tool rendered
    fn is_rendered_output(path: &Path) -> bool {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().ends_with(&format!(".{}", OUTPUT_SUFFIX)))
            .unwrap_or(false)
    }

    /// Style options from the config, with the family defaulted from a custom font file
    pub fn style_options(&self) -> StyleOptions {
        let mut options = self.config.style.clone();
        if options.font_family.is_none() {
            if let Some(stem) = options.font_file.as_ref().and_then(|f| f.file_stem()) {
                options.font_family = Some(stem.to_string_lossy().to_string());
            }
        }
        options
    }

    /// Resolve the configured style against the font registry
    pub fn resolve_style(&self) -> Result<StyleConfig> {
        let registry: FontRegistry = self.config.render.font_registry();
        let style = StyleConfig::resolve(&self.style_options(), &registry)
            .context("Failed to resolve subtitle style")?;
        Ok(style)
    }

    /// Compile a document into the graph ffmpeg will run
    ///
    /// Track artifacts are written to a temporary file first and composited
    /// with a `subtitles` stage; overlay graphs are used as they are.
    pub fn compile_filter(&self, document: &SubtitleDocument, style: &StyleConfig) -> Result<CompiledFilter> {
        let mode = self.config.render.mode;
        let artifact = render::compile(
            mode,
            document,
            style,
            &SpeakerColorMap::new(),
            self.config.render.min_duration_secs,
        )
        .with_context(|| format!("Failed to compile subtitles in {} mode", mode))?;

        match &artifact {
            Artifact::FilterGraph(graph) => {
                let graph = graph.clone();
                Ok(CompiledFilter {
                    artifact,
                    graph,
                    track_file: None,
                })
            }
            Artifact::Track(track) => {
                let file = FileManager::write_temp_file(&track.content, track.format.extension())?;
                debug!(
                    "Wrote {} track with {} event(s) to {}",
                    track.format,
                    track.event_count,
                    file.path().display()
                );
                let graph = track_filter_graph(file.path(), style.font_file.parent(), track.format, style);
                Ok(CompiledFilter {
                    artifact,
                    graph,
                    track_file: Some(file),
                })
            }
        }
    }

    /// Compile a subtitle document file without running ffmpeg
    ///
    /// Returns the filter chain in overlay mode and the track document
    /// otherwise. A missing font file is only warned about here.
    pub fn compile_only(&self, subtitles_file: &Path) -> Result<String> {
        let document = SubtitleDocument::load(subtitles_file)?;
        let style = self.resolve_style()?;
        if let Err(e) = FontRegistry::verify_font_file(&style.font_family, &style.font_file) {
            warn!("{}", e);
        }

        let artifact = render::compile(
            self.config.render.mode,
            &document,
            &style,
            &SpeakerColorMap::new(),
            self.config.render.min_duration_secs,
        )?;
        Ok(artifact.render())
    }

    /// Get a subtitle document for a video, from a file or from the transcriber
    pub async fn load_or_transcribe(&self, input_file: &Path, subtitles_file: Option<&Path>) -> Result<SubtitleDocument> {
        match subtitles_file {
            Some(path) => {
                info!("Using subtitles from {}", path.display());
                SubtitleDocument::load(path)
            }
            None => {
                info!("Transcribing with {}", self.transcription.provider_name());
                let document = self
                    .transcription
                    .transcribe(input_file)
                    .await
                    .with_context(|| format!("Transcription failed for {}", input_file.display()))?;
                Ok(document)
            }
        }
    }

    /// Run the main workflow with input video file and output directory
    pub async fn run(
        &self,
        input_file: PathBuf,
        output_dir: PathBuf,
        subtitles_file: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<()> {
        let start_time = std::time::Instant::now();
        let job_id = Uuid::new_v4().simple().to_string();
        let job_id = &job_id[..8];

        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        if FileManager::detect_file_type(&input_file)? != FileType::Video {
            warn!("[{}] {} does not look like a video, trying anyway", job_id, input_file.display());
        }

        FileManager::ensure_dir(&output_dir)?;

        let output_path = Self::output_path(&input_file, &output_dir);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, output already exists (use -f to force overwrite): {}", output_path.display());
            return Ok(());
        }

        info!("[{}] Processing {}", job_id, input_file.display());

        let document = self.load_or_transcribe(&input_file, subtitles_file.as_deref()).await?;
        info!(
            "[{}] {} subtitle line(s), {} speaker(s)",
            job_id,
            document.len(),
            document.speakers().len()
        );

        let sidecar = FileManager::sidecar_path(&output_path);
        document.save(&sidecar)?;
        debug!("[{}] Subtitle document saved to {}", job_id, sidecar.display());

        let style = self.resolve_style()?;
        FontRegistry::verify_font_file(&style.font_family, &style.font_file)
            .context("Font check failed")?;

        let compiled = self.compile_filter(&document, &style)?;
        debug!("[{}] Filter graph has {} stage(s)", job_id, compiled.graph.len());

        let job = TranscodeJob {
            input: input_file.clone(),
            output: output_path.clone(),
            filter: FilterArgument::from_graph(&compiled.graph, self.config.render.use_filter_complex),
        };
        self.transcoder
            .burn(&job)
            .await
            .with_context(|| format!("Failed to burn subtitles into {}", input_file.display()))?;

        // The track file must survive until ffmpeg has read it
        drop(compiled);

        info!(
            "[{}] Wrote {} in {}",
            job_id,
            output_path.display(),
            Self::format_duration(start_time.elapsed())
        );
        Ok(())
    }

    /// Format a duration for log output
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    /// Run the workflow in folder mode, processing all video files in a directory
    /// Videos that were already rendered are skipped
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        let start_time = std::time::Instant::now();

        if !input_dir.exists() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let video_files: Vec<PathBuf> = FileManager::find_videos(&input_dir)?
            .into_iter()
            .filter(|path| !Self::is_rendered_output(path))
            .collect();

        if video_files.is_empty() {
            return Err(anyhow!("No video files found in directory: {:?}", input_dir));
        }

        let folder_pb = ProgressBar::new(video_files.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing files");

        let mut success_count = 0;
        let mut error_count = 0;
        let mut skip_count = 0;

        for video_file in video_files.iter() {
            let file_name = video_file.file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = match video_file.parent() {
                Some(parent) => parent.to_path_buf(),
                None => input_dir.clone(),
            };

            if Self::output_path(video_file, &output_dir).exists() && !force_overwrite {
                warn!("Skipping {}, output already exists (use -f to force overwrite)", file_name);
                skip_count += 1;
                folder_pb.inc(1);
                continue;
            }

            match self.run(video_file.clone(), output_dir, None, force_overwrite).await {
                Ok(_) => {
                    success_count += 1;
                }
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    error_count += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        info!(
            "Folder processing completed in {}: {} processed, {} skipped, {} errors",
            Self::format_duration(start_time.elapsed()),
            success_count,
            skip_count,
            error_count
        );

        if error_count > 0 && success_count == 0 {
            return Err(anyhow!("All {} file(s) failed", error_count));
        }
        Ok(())
    }
}
