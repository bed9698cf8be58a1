//! Stderr logger setup.

use std::io::Write;

use clap::ValueEnum;
use env_logger::{Builder, Target, fmt::Formatter};
use log::{Level, LevelFilter};

/// Verbosity selected with `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    #[value(alias = "warning")]
    Warn,
    /// Stage summaries.
    Info,
    /// Per-stage details.
    Debug,
    /// Everything.
    Trace,
    /// No logging.
    Off,
}

impl LogLevel {
    const fn to_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
            Self::Off => LevelFilter::Off,
        }
    }
}

/// Install a compact `LEVEL message` logger on stderr.
///
/// Stdout stays reserved for reports and JSON.
pub fn init_logger(level: LogLevel) -> Result<(), String> {
    Builder::new()
        .filter_level(level.to_filter())
        .write_style(env_logger::WriteStyle::Never)
        .target(Target::Stderr)
        .format(|buf: &mut Formatter, record| {
            writeln!(buf, "{} {}", level_tag(record.level()), record.args())
        })
        .try_init()
        .map_err(|e| format!("logger init failed: {e}"))
}

const fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}
