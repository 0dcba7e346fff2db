//! Command line options and logging setup.

use crate::input::Keymap;
use crate::loader::ProgramFormat;
use clap::Parser;
use log::LevelFilter;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_KEY_HOLD_MS: u64 = 150;

#[derive(clap::ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    /// every instruction executed
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "chip8-vm", version, about = "Run a CHIP-8 program in the terminal", long_about = None)]
pub struct Args {
    /// program to run: raw bytes, or hex text with one 0x word per line
    #[arg(value_name = "PROGRAM")]
    pub program: PathBuf,

    #[arg(long, value_enum, default_value_t = ProgramFormat::Auto)]
    pub format: ProgramFormat,

    #[arg(long, value_enum, default_value_t = Keymap::Conventional)]
    pub keymap: Keymap,

    /// how long a key stays down after the terminal last reported it
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_KEY_HOLD_MS)]
    pub key_hold_ms: u64,

    /// no sound
    #[arg(long, default_value_t = false)]
    pub mute: bool,

    /// seed for RND, for repeatable runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// RUST_LOG can refine this further
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// write the log here instead of stderr, which the screen is using
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// everything needed to set up a run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub program: PathBuf,
    pub format: ProgramFormat,
    pub keymap: Keymap,
    pub key_hold: Duration,
    pub mute: bool,
    pub seed: Option<u64>,
    pub log_level: LevelFilter,
    pub log_file: Option<PathBuf>,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            program: args.program,
            format: args.format,
            keymap: args.keymap,
            key_hold: Duration::from_millis(args.key_hold_ms),
            mute: args.mute,
            seed: args.seed,
            log_level: args.log_level.into(),
            log_file: args.log_file,
        }
    }
}

/// start env_logger at the configured level, writing to the log file if
/// there is one
pub fn init_logging(config: &Config) -> Result<(), io::Error> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(config.log_level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    if let Some(path) = &config.log_file {
        let file = File::create(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        let argv = std::iter::once("chip8-vm").chain(args.iter().copied());
        Args::try_parse_from(argv).map(Config::from)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["pong.ch8"]).unwrap();
        assert_eq!(config.program, PathBuf::from("pong.ch8"));
        assert_eq!(config.format, ProgramFormat::Auto);
        assert_eq!(config.keymap, Keymap::Conventional);
        assert_eq!(config.key_hold, Duration::from_millis(150));
        assert!(!config.mute);
        assert_eq!(config.seed, None);
        assert_eq!(config.log_level, LevelFilter::Warn);
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn test_all_options() {
        let config = parse(&[
            "--format",
            "hex",
            "--keymap",
            "literal",
            "--key-hold-ms",
            "80",
            "--mute",
            "--seed",
            "42",
            "--log-level",
            "trace",
            "--log-file",
            "vm.log",
            "demo.txt",
        ])
        .unwrap();
        assert_eq!(config.format, ProgramFormat::Hex);
        assert_eq!(config.keymap, Keymap::Literal);
        assert_eq!(config.key_hold, Duration::from_millis(80));
        assert!(config.mute);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.log_level, LevelFilter::Trace);
        assert_eq!(config.log_file, Some(PathBuf::from("vm.log")));
        assert_eq!(config.program, PathBuf::from("demo.txt"));
    }

    #[test]
    fn test_program_is_required() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_only_one_program() {
        assert!(parse(&["a.ch8", "b.ch8"]).is_err());
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(parse(&["--format", "elf", "a.ch8"]).is_err());
        assert!(parse(&["--key-hold-ms", "soon", "a.ch8"]).is_err());
    }
}
