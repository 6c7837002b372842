use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use opuspkt::structs::packet::Framing;

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = concat!(
        env!("CARGO_PKG_VERSION"),
        " (opuspkt ", env!("OPUSPKT_VERSION"),
        ", built ", env!("BUILD_TIMESTAMP"), ")"
    ),
    about      = "Tools for inspecting and repacketizing Opus packet streams",
    long_about = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat invalid packets as fatal errors (fail on the first one).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress spinners during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the layout of every packet in a stream.
    Info(InfoArgs),

    /// Split multistream packets into their elementary streams.
    Multistream(MultistreamArgs),

    /// Rewrite packets with different framing or padding.
    Repack(RepackArgs),
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input packet stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// How packets are delimited in the input.
    #[arg(long, value_enum, default_value_t = Container::LengthPrefixed)]
    pub container: Container,

    /// Sampling rate for sample counts, in Hz.
    #[arg(long, value_name = "HZ", default_value_t = 48000)]
    pub sample_rate: u32,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Plain)]
    pub format: ReportFormat,
}

#[derive(Debug, Args)]
pub struct MultistreamArgs {
    /// Input multistream packet stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Number of elementary streams in each packet.
    #[arg(long, value_name = "N")]
    pub streams: usize,

    /// How multistream packets are delimited in the input.
    #[arg(long, value_enum, default_value_t = Container::LengthPrefixed)]
    pub container: Container,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Plain)]
    pub format: ReportFormat,
}

#[derive(Debug, Args)]
pub struct RepackArgs {
    /// Input packet stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file.
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// How packets are delimited in the input.
    #[arg(long, value_enum, default_value_t = Container::LengthPrefixed)]
    pub container: Container,

    /// How packets are delimited in the output (defaults to the input container).
    #[arg(long, value_enum)]
    pub output_container: Option<Container>,

    /// Pad every packet to this many bytes.
    #[arg(long, value_name = "BYTES", conflicts_with = "unpad")]
    pub pad_to: Option<usize>,

    /// Strip padding from every packet.
    #[arg(long)]
    pub unpad: bool,

    /// Merge up to this many consecutive compatible packets into one.
    #[arg(long, value_name = "COUNT", default_value_t = 1)]
    pub merge: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Container {
    /// The whole input is a single packet.
    Raw,
    /// Each packet is preceded by its length and encoder final range,
    /// both 32-bit big-endian.
    LengthPrefixed,
    /// Back-to-back self-delimited packets.
    SelfDelimited,
}

impl Container {
    /// Framing of the packets stored in this container.
    pub fn framing(self) -> Framing {
        match self {
            Container::SelfDelimited => Framing::SelfDelimited,
            Container::Raw | Container::LengthPrefixed => Framing::Standard,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ReportFormat {
    /// Aligned human-readable text.
    Plain,
    /// YAML document.
    Yaml,
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
