// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use reelsub::app_config::{self, Config, TranscriptionProvider};
use reelsub::app_controller::Controller;
use reelsub::file_utils::FileManager;
use reelsub::render::RenderMode;
use reelsub::render::style::{AnimationStyle, StyleOptions, TextAlign};

/// CLI Wrapper for RenderMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliRenderMode {
    /// One drawtext overlay per display line
    Overlay,
    /// Styled ASS subtitle track
    Track,
    /// Plain SRT captions
    Captions,
}

impl From<CliRenderMode> for RenderMode {
    fn from(cli_mode: CliRenderMode) -> Self {
        match cli_mode {
            CliRenderMode::Overlay => RenderMode::Overlay,
            CliRenderMode::Track => RenderMode::Track,
            CliRenderMode::Captions => RenderMode::Captions,
        }
    }
}

/// CLI Wrapper for TranscriptionProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliProvider {
    Gemini,
    Fallback,
}

impl From<CliProvider> for TranscriptionProvider {
    fn from(cli_provider: CliProvider) -> Self {
        match cli_provider {
            CliProvider::Gemini => TranscriptionProvider::Gemini,
            CliProvider::Fallback => TranscriptionProvider::Fallback,
        }
    }
}

/// CLI Wrapper for TextAlign to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTextAlign {
    Left,
    Center,
    Right,
}

impl From<CliTextAlign> for TextAlign {
    fn from(cli_align: CliTextAlign) -> Self {
        match cli_align {
            CliTextAlign::Left => TextAlign::Left,
            CliTextAlign::Center => TextAlign::Center,
            CliTextAlign::Right => TextAlign::Right,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transcribe a video and burn the subtitles in (default command)
    #[command(alias = "run")]
    Burn(BurnArgs),

    /// Print the compiled filter graph or track for a subtitles file, without ffmpeg
    Compile(CompileArgs),

    /// Generate shell completions for reelsub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by every command that reads the configuration
#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Rendering overrides applied on top of the configuration file
#[derive(Args, Debug, Clone)]
struct RenderArgs {
    /// Rendering mode
    #[arg(short, long, value_enum)]
    mode: Option<CliRenderMode>,

    /// JSON file with style options (camelCase keys)
    #[arg(long, value_name = "STYLE_JSON")]
    style: Option<PathBuf>,

    /// Font family registered in the font table
    #[arg(long)]
    font_family: Option<String>,

    /// Font file to use instead of a registered family
    #[arg(long)]
    font_file: Option<PathBuf>,

    /// Font size in pixels
    #[arg(long)]
    font_size: Option<u32>,

    /// Horizontal text alignment
    #[arg(long, value_enum)]
    text_align: Option<CliTextAlign>,

    /// Fade each line in
    #[arg(long)]
    fade_in: bool,
}

#[derive(Parser, Debug)]
struct BurnArgs {
    /// Input video file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Burn an existing subtitles JSON file instead of transcribing
    #[arg(short, long)]
    subtitles: Option<PathBuf>,

    /// Output directory, defaults to the input's directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Transcription provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliProvider>,

    /// Transcription model name
    #[arg(long)]
    model: Option<String>,

    /// Pass a labelled graph with -filter_complex instead of -vf
    #[arg(long)]
    filter_complex: bool,

    #[command(flatten)]
    render: RenderArgs,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Subtitles JSON file (`{ "subtitles": [...] }`)
    #[arg(value_name = "SUBTITLES")]
    subtitles: PathBuf,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    render: RenderArgs,

    #[command(flatten)]
    config: ConfigArgs,
}

/// reelsub - burn speaker-coloured subtitles into vertical videos
///
/// Transcribes a video with Gemini, compiles the subtitles into an ffmpeg
/// filter graph or subtitle track, and re-encodes the video at 1080x1920.
#[derive(Parser, Debug)]
#[command(name = "reelsub")]
#[command(version)]
#[command(about = "Burn speaker-coloured subtitles into 9:16 videos")]
#[command(long_about = "reelsub transcribes a video and burns the subtitles into a 1080x1920 copy with ffmpeg.

EXAMPLES:
    reelsub clip.mp4                              # Transcribe and burn with the default config
    reelsub -f clip.mp4                           # Force overwrite existing output
    reelsub -s clip.subtitled.subtitles.json clip.mp4
                                                  # Re-burn from an edited subtitles file
    reelsub -m track --font-size 60 clip.mp4      # Styled ASS track instead of overlays
    reelsub compile subs.json                     # Print the compiled filter graph
    reelsub --log-level debug /videos/            # Process an entire directory
    reelsub completions bash > reelsub.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. The Gemini API key is read from the config or
    from the GEMINI_API_KEY environment variable; without one, placeholder
    subtitles are used.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input video file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Burn an existing subtitles JSON file instead of transcribing
    #[arg(short, long)]
    subtitles: Option<PathBuf>,

    /// Output directory, defaults to the input's directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Transcription provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliProvider>,

    /// Transcription model name
    #[arg(long)]
    model: Option<String>,

    /// Pass a labelled graph with -filter_complex instead of -vf
    #[arg(long)]
    filter_complex: bool,

    #[command(flatten)]
    render: RenderArgs,

    #[command(flatten)]
    config: ConfigArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with trace so the level can be raised or lowered later
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "reelsub", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Burn(args)) => run_burn(args).await,
        Some(Commands::Compile(args)) => run_compile(args),
        None => {
            // Default behavior - top-level args are the burn command
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;

            let burn_args = BurnArgs {
                input_path,
                force_overwrite: cli.force_overwrite,
                subtitles: cli.subtitles,
                output_dir: cli.output_dir,
                provider: cli.provider,
                model: cli.model,
                filter_complex: cli.filter_complex,
                render: cli.render,
                config: cli.config,
            };
            run_burn(burn_args).await
        }
    }
}

/// Load the configuration file, creating a default one when it is missing
fn load_config(options: &ConfigArgs) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config_path = Path::new(&options.config_path);
    let mut config = if config_path.exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", options.config_path);
        let config = Config::default();
        config.save(config_path)?;
        config
    };

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}

/// Apply rendering overrides from the command line
fn apply_render_args(config: &mut Config, args: &RenderArgs) -> Result<()> {
    if let Some(mode) = &args.mode {
        config.render.mode = mode.clone().into();
    }

    if let Some(style_path) = &args.style {
        let content = FileManager::read_to_string(style_path)?;
        let file_style: StyleOptions = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse style file: {}", style_path.display()))?;
        config.style = config.style.merge(&file_style);
    }

    let cli_style = StyleOptions {
        font_family: args.font_family.clone(),
        font_file: args.font_file.clone(),
        font_size: args.font_size,
        text_align: args.text_align.clone().map(Into::into),
        animation_style: args.fade_in.then_some(AnimationStyle::FadeIn),
        ..StyleOptions::default()
    };
    config.style = config.style.merge(&cli_style);

    Ok(())
}

/// Validate the final configuration and apply its log level
fn finalize_config(config: &Config, options: &ConfigArgs) -> Result<()> {
    config.validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }
    Ok(())
}

async fn run_burn(options: BurnArgs) -> Result<()> {
    let mut config = load_config(&options.config)?;
    apply_render_args(&mut config, &options.render)?;

    if let Some(provider) = &options.provider {
        config.transcription.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.transcription.model = model.clone();
    }
    if options.filter_complex {
        config.render.use_filter_complex = true;
    }

    finalize_config(&config, &options.config)?;

    let controller = Controller::with_config(config)?;

    if options.input_path.is_file() {
        let output_dir = match &options.output_dir {
            Some(dir) => dir.clone(),
            None => options.input_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        };
        controller.run(
            options.input_path.clone(),
            output_dir,
            options.subtitles.clone(),
            options.force_overwrite,
        ).await?;
    } else if options.input_path.is_dir() {
        if options.subtitles.is_some() {
            warn!("--subtitles is ignored in folder mode");
        }
        if options.output_dir.is_some() {
            warn!("--output-dir is ignored in folder mode, outputs are written next to each video");
        }
        controller.run_folder(
            options.input_path.clone(),
            options.force_overwrite,
        ).await?;
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    Ok(())
}

fn run_compile(options: CompileArgs) -> Result<()> {
    let mut config = load_config(&options.config)?;
    apply_render_args(&mut config, &options.render)?;
    finalize_config(&config, &options.config)?;

    let controller = Controller::with_config(config)?;
    let compiled = controller.compile_only(&options.subtitles)?;

    match &options.output {
        Some(path) => {
            FileManager::write_to_file(path, &compiled)?;
            info!("Compiled {} mode output written to {}", controller.config().render.mode, path.display());
        }
        None => println!("{}", compiled),
    }

    Ok(())
}
