use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use seekflate::process::extract::ExtractOptions;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ngit:       ",
    env!("VERGEN_GIT_DESCRIBE"),
    "\nbuilt:     ",
    env!("BUILD_TIMESTAMP"),
    "\nseekflate: ",
    env!("SEEKFLATE_VERSION"),
);

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    author     = env!("CARGO_PKG_AUTHORS"),
    about      = "Extract single blocks from raw DEFLATE streams using recorded checkpoints",
    long_about = None,
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat warnings as fatal errors (fail on first warning).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Realigned bytes pulled beyond the recorded block length.
    #[arg(long, global = true, value_name = "BYTES", default_value_t = 1)]
    pub margin: u64,

    /// Retries with a larger margin when the block input runs short.
    #[arg(long, global = true, value_name = "COUNT", default_value_t = 0)]
    pub retries: u32,

    /// Skip the CRC-32 check against the recorded checksum.
    #[arg(long, global = true)]
    pub no_verify: bool,

    #[command(flatten)]
    pub extract: ExtractArgs,

    /// Choose an operation other than extraction.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn fail_level(&self) -> log::Level {
        if self.strict {
            log::Level::Warn
        } else {
            log::Level::Error
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            margin_bytes: self.margin,
            retries: self.retries,
            verify_checksum: !self.no_verify,
            fail_level: self.fail_level(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the checkpoints recorded in a checkpoint database.
    Info(InfoArgs),

    /// Extract every recorded block and check it against its CRC-32.
    Verify(VerifyArgs),
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Raw DEFLATE stream the checkpoints were recorded from.
    #[arg(value_name = "SOURCE", required = true)]
    pub source: Option<PathBuf>,

    /// Checkpoint database.
    #[arg(value_name = "CHECKPOINTS", required = true)]
    pub checkpoints: Option<PathBuf>,

    /// Id of the block to extract.
    #[arg(value_name = "BLOCK_ID", required = true)]
    pub block_id: Option<i64>,

    /// Write the block here instead of stdout (use "-" for stdout).
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Checkpoint database.
    #[arg(value_name = "CHECKPOINTS")]
    pub checkpoints: PathBuf,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Raw DEFLATE stream the checkpoints were recorded from.
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Checkpoint database.
    #[arg(value_name = "CHECKPOINTS")]
    pub checkpoints: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}
