//! CLI arguments and subcommands for herakles-meminfo.
//!
//! Every flag is optional; without arguments the tool prints the full report
//! for the live process table.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-meminfo",
    about = "Report per-process unique resident set size (URES) and grouped memory usage",
    long_about = "Report per-process unique resident set size (URES) and grouped memory usage.\n\n\
                  Takes one snapshot of the Linux process table and prints processes ranked by \
                  resident memory not shared with other processes, followed by per-user, \
                  per-command and per-CPU totals.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = env!("CARGO_PKG_VERSION"),
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (built ",
        env!("VERGEN_BUILD_TIMESTAMP"),
        ")"
    ),
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (logs go to stderr)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Process table root
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Repeat the process table header every N rows (0 = never)
    #[arg(long)]
    pub header_every: Option<usize>,

    /// Commands below this many KiB of URES are folded into "Rest"
    #[arg(long)]
    pub rest_threshold_kb: Option<u64>,

    /// Parallel processing threads (0 = auto)
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Read processes one after another instead of on a thread pool
    #[arg(long)]
    pub sequential: bool,

    /// Report output format
    #[arg(short = 'o', long, value_enum)]
    pub output: Option<OutputFormat>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate that the process table and system sources are readable
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let args = Args::try_parse_from(["herakles-meminfo"]).unwrap();
        assert!(args.command.is_none());
        assert!(args.log_level.is_none());
        assert!(!args.sequential);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_report_flags() {
        let args = Args::try_parse_from([
            "herakles-meminfo",
            "--proc-root",
            "/tmp/proc",
            "--header-every",
            "10",
            "--output",
            "json",
            "--log-level",
            "debug",
            "--sequential",
        ])
        .unwrap();
        assert_eq!(args.proc_root, Some(PathBuf::from("/tmp/proc")));
        assert_eq!(args.header_every, Some(10));
        assert_eq!(args.output, Some(OutputFormat::Json));
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert!(args.sequential);
    }

    #[test]
    fn test_check_subcommand() {
        let args = Args::try_parse_from(["herakles-meminfo", "check"]).unwrap();
        assert!(matches!(args.command, Some(Commands::Check)));
    }
}
