use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::{LevelFilter, SetLoggerError};
use simple_logger::SimpleLogger;
use subleq_core::{
    CaptureConfig, DumpWindow, EngineConfig, OverflowPolicy, ADDRESS_LIMIT, DEFAULT_DUMP_LEN,
    DEFAULT_DUMP_START,
};

/// Full-buffer behaviour of the keystroke ring.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Overflow {
    /// Overwrite in place; unread bytes collapse when the writer laps.
    #[default]
    Wrap,
    /// Evict the oldest unread byte.
    DropOldest,
    /// Discard the incoming byte.
    DropNewest,
}

impl From<Overflow> for OverflowPolicy {
    fn from(value: Overflow) -> Self {
        match value {
            Overflow::Wrap => Self::Wrap,
            Overflow::DropOldest => Self::DropOldest,
            Overflow::DropNewest => Self::DropNewest,
        }
    }
}

/// Arguments of the `subleq` binary.
#[derive(Parser, Debug)]
#[command(
    name = "subleq",
    about = "Run a SUBLEQ program image with the terminal as its console."
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Args {
    /// Program image: a header line followed by hex cell values.
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Any value here enables the per-instruction trace.
    #[arg(value_name = "TRACE")]
    pub trace_arg: Option<String>,

    /// Print a trace line before every instruction.
    #[arg(short = 't', long = "trace")]
    pub trace: bool,

    /// Run the lenient variant: no negative-operand faults, writable device
    /// region, and a higher interrupt threshold.
    #[arg(long)]
    pub lenient: bool,

    /// Consecutive Ctrl-C presses tolerated before the run is terminated.
    #[arg(long, value_name = "N")]
    pub interrupt_threshold: Option<u32>,

    /// First cell of the Ctrl-D memory dump, in hex.
    #[arg(long, value_name = "ADDR", value_parser = parse_hex_address)]
    pub dump_start: Option<i32>,

    /// Number of cells in the Ctrl-D memory dump.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_DUMP_LEN)]
    pub dump_len: usize,

    /// What to do with keystrokes that arrive while the buffer is full.
    #[arg(long, value_enum, default_value_t = Overflow::Wrap)]
    pub overflow: Overflow,

    /// Log load statistics and run summaries to stderr.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// True when either trace form was given.
    #[must_use]
    pub const fn tracing_enabled(&self) -> bool {
        self.trace || self.trace_arg.is_some()
    }

    /// Engine policy selected by the flags.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        let base = if self.lenient {
            EngineConfig::lenient()
        } else {
            EngineConfig::default()
        };
        EngineConfig {
            tracing_enabled: self.tracing_enabled(),
            dump_window: DumpWindow {
                start: self.dump_start.unwrap_or(DEFAULT_DUMP_START),
                len: self.dump_len,
            },
            ..base
        }
    }

    /// Keystroke capture policy selected by the flags.
    #[must_use]
    pub fn capture_config(&self) -> CaptureConfig {
        let mut config = if self.lenient {
            CaptureConfig::lenient()
        } else {
            CaptureConfig::default()
        };
        if let Some(threshold) = self.interrupt_threshold {
            config.terminate_threshold = threshold;
        }
        config.overflow = self.overflow.into();
        config
    }

    /// Log level selected by `-v` / `-q`.
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Info
        } else if self.quiet {
            LevelFilter::Error
        } else {
            LevelFilter::Warn
        }
    }
}

/// Installs the stderr logger at `level`.
///
/// # Errors
///
/// Fails when a logger is already installed.
pub fn init_logging(level: LevelFilter) -> Result<(), SetLoggerError> {
    SimpleLogger::new().with_level(level).init()
}

fn parse_hex_address(text: &str) -> Result<i32, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    let value =
        i32::from_str_radix(digits, 16).map_err(|err| format!("invalid hex address: {err}"))?;
    if (0..ADDRESS_LIMIT).contains(&value) {
        Ok(value)
    } else {
        Err(format!("address {value:#X} is outside 0..{ADDRESS_LIMIT:#X}"))
    }
}
