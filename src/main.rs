//! herakles-meminfo - version 0.1.0
//!
//! Per-process unique resident memory report with tracing logging.
//! This is the main entry point that resolves configuration, takes one
//! snapshot of the process table and writes the report to stdout.

mod cli;
mod commands;
mod config;

use anyhow::{anyhow, Context};
use clap::Parser;
use std::io::{self, Write};
use std::time::Instant;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};

use herakles_meminfo::{
    aggregate, read_system_memory, render_json, render_text, scan_process_table, Report,
    UserNameCache,
};

use cli::{Args, Commands, LogLevel, OutputFormat};
use commands::command_check;
use config::{resolve_config, show_config, validate_effective_config, Config};

/// Initializes tracing logging subsystem with the effective log level.
/// Logs go to stderr so they never interleave with the report.
fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let log_level = config.log_level();
    let filter = match log_level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Logging initialized with level: {:?}", log_level);
    Ok(())
}

/// Config helpers return boxed errors that are not `Send`; keep their message.
fn config_error(e: Box<dyn std::error::Error>) -> anyhow::Error {
    anyhow!("{}", e)
}

/// Writes the rendered report. A closed reader is not an error.
fn write_report(rendered: &str) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match out.write_all(rendered.as_bytes()).and_then(|_| out.flush()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("Reader closed stdout, report truncated");
            Ok(())
        }
        other => other.context("Failed to write report"),
    }
}

/// Takes the snapshot and renders the full report in memory.
fn build_report(config: &Config) -> anyhow::Result<String> {
    let proc_root = config.proc_root();
    let start = Instant::now();

    let memory = read_system_memory(&proc_root).context("Failed to read system memory")?;
    let table = scan_process_table(&proc_root, config.parallel_scan())
        .context("Failed to scan process table")?;

    let views = aggregate(&table, config.rest_threshold_kb());
    let report = Report::new(memory, views);

    let names = UserNameCache::new();
    names.prefetch(&report.uids());

    let rendered = match config.output_format() {
        OutputFormat::Text => render_text(&report, &names, config.header_every()),
        OutputFormat::Json => render_json(&report, &names).context("Failed to serialize report")?,
    };

    info!(
        "Report built in {:.2} ms: {} processes, {} users",
        start.elapsed().as_secs_f64() * 1000.0,
        table.len(),
        names.len()
    );
    Ok(rendered)
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args).map_err(config_error)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format).map_err(config_error);
    }

    let config = resolve_config(&args)
        .map_err(config_error)
        .context("Failed to load configuration")?;

    // Handle subcommands; check reports configuration problems itself
    if let Some(command) = &args.command {
        return match command {
            Commands::Check => command_check(&config).map_err(config_error),
        };
    }

    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }

    setup_logging(&config)?;

    // Configure parallel processing
    if let Some(threads) = config.parallelism {
        if threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .unwrap_or_else(|e| error!("Failed to set rayon thread pool: {}", e));
            debug!("Rayon thread pool configured with {} threads", threads);
        }
    }

    let rendered = build_report(&config)?;
    write_report(&rendered)
}
