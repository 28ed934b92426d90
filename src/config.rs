//! Configuration management for herakles-meminfo.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use clap::ValueEnum;
use herakles_meminfo::aggregate::DEFAULT_REST_THRESHOLD_KB;
use herakles_meminfo::report::DEFAULT_HEADER_EVERY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::{Args, ConfigFormat, LogLevel, OutputFormat};

// Default configuration constants
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Warn;

/// Configuration structure. Unset fields fall back to the defaults above.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Data sources
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,

    // Report layout
    #[serde(alias = "header-every")]
    pub header_every: Option<usize>,
    #[serde(alias = "rest-threshold-kb")]
    pub rest_threshold_kb: Option<u64>,
    /// "text" | "json"
    pub output: Option<String>,

    // Performance tuning
    pub parallelism: Option<usize>,
    #[serde(alias = "parallel-scan")]
    pub parallel_scan: Option<bool>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            header_every: Some(DEFAULT_HEADER_EVERY),
            rest_threshold_kb: Some(DEFAULT_REST_THRESHOLD_KB),
            output: Some(OutputFormat::Text.as_str().into()),
            parallelism: None,
            parallel_scan: Some(true),
            log_level: Some("warn".into()),
        }
    }
}

impl Config {
    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn header_every(&self) -> usize {
        self.header_every.unwrap_or(DEFAULT_HEADER_EVERY)
    }

    pub fn rest_threshold_kb(&self) -> u64 {
        self.rest_threshold_kb.unwrap_or(DEFAULT_REST_THRESHOLD_KB)
    }

    pub fn parallel_scan(&self) -> bool {
        self.parallel_scan.unwrap_or(true)
    }

    /// Output format; an unparsable value falls back to text (rejected by
    /// [`validate_effective_config`] before a report is produced).
    pub fn output_format(&self) -> OutputFormat {
        self.output
            .as_deref()
            .and_then(|s| OutputFormat::from_str(s, true).ok())
            .unwrap_or(OutputFormat::Text)
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(|s| LogLevel::from_str(s, true).ok())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let root = cfg.proc_root();
    if root.as_os_str().is_empty() {
        return Err("proc_root must not be empty".into());
    }
    if !root.is_dir() {
        return Err(format!("proc_root '{}' is not a directory", root.display()).into());
    }

    if let Some(output) = cfg.output.as_deref() {
        if OutputFormat::from_str(output, true).is_err() {
            return Err(format!(
                "Invalid output '{}', expected 'text' or 'json'",
                output
            )
            .into());
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::from_str(level, true).is_err() {
            return Err(format!(
                "Invalid log_level '{}', expected off/error/warn/info/debug/trace",
                level
            )
            .into());
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(n) = args.header_every {
        config.header_every = Some(n);
    }
    if let Some(kb) = args.rest_threshold_kb {
        config.rest_threshold_kb = Some(kb);
    }
    if let Some(output) = args.output {
        config.output = Some(output.as_str().into());
    }

    // Performance settings
    if let Some(threads) = args.parallelism {
        config.parallelism = Some(threads);
    }
    if args.sequential {
        config.parallel_scan = Some(false);
    }

    if let Some(level) = args.log_level {
        config.log_level = level
            .to_possible_value()
            .map(|v| v.get_name().to_string());
    }

    Ok(config)
}

/// Configuration loading with multiple format support.
///
/// Without an explicit path the default locations are probed; if none of
/// them exists the defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        if !p.exists() {
            return Err(format!("Config file not found: {}", p.display()).into());
        }
        p.to_path_buf()
    } else {
        let defaults = [
            "/etc/herakles/meminfo.yaml",
            "/etc/herakles/meminfo.yml",
            "/etc/herakles/meminfo.json",
            "./herakles-meminfo.yaml",
            "./herakles-meminfo.yml",
            "./herakles-meminfo.json",
        ];

        match defaults.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        }
    };

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };

    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["herakles-meminfo"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_arguments() {
        let config = resolve_config(&parse(&["--no-config"])).unwrap();
        assert_eq!(config.proc_root(), PathBuf::from("/proc"));
        assert_eq!(config.header_every(), 25);
        assert_eq!(config.rest_threshold_kb(), 1024);
        assert!(config.parallel_scan());
        assert_eq!(config.output_format(), OutputFormat::Text);
        assert_eq!(config.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("meminfo.yaml");
        fs::write(
            &path,
            "header_every: 10\nrest-threshold-kb: 2048\noutput: json\nlog_level: info\n",
        )
        .unwrap();

        let path_str = path.to_str().unwrap();
        let config = resolve_config(&parse(&["-c", path_str])).unwrap();
        assert_eq!(config.header_every(), 10);
        assert_eq!(config.rest_threshold_kb(), 2048);
        assert_eq!(config.output_format(), OutputFormat::Json);
        assert_eq!(config.log_level(), LogLevel::Info);

        let config = resolve_config(&parse(&[
            "-c",
            path_str,
            "--header-every",
            "0",
            "--output",
            "text",
            "--log-level",
            "trace",
            "--sequential",
        ]))
        .unwrap();
        assert_eq!(config.header_every(), 0);
        assert_eq!(config.rest_threshold_kb(), 2048);
        assert_eq!(config.output_format(), OutputFormat::Text);
        assert_eq!(config.log_level(), LogLevel::Trace);
        assert!(!config.parallel_scan());
    }

    #[test]
    fn test_load_json_and_toml() {
        let dir = tempdir().expect("Failed to create temp dir");

        let json = dir.path().join("meminfo.json");
        fs::write(&json, r#"{"parallelism": 4, "parallel_scan": false}"#).unwrap();
        let config = load_config(Some(&json)).unwrap();
        assert_eq!(config.parallelism, Some(4));
        assert!(!config.parallel_scan());

        let toml_path = dir.path().join("meminfo.toml");
        fs::write(&toml_path, "header_every = 5\n").unwrap();
        let config = load_config(Some(&toml_path)).unwrap();
        assert_eq!(config.header_every(), 5);
        // Fields absent from the file are unset, and getters supply defaults
        assert_eq!(config.proc_root, None);
        assert_eq!(config.proc_root(), PathBuf::from("/proc"));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert!(load_config(Some(&dir.path().join("absent.yaml"))).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let dir = tempdir().expect("Failed to create temp dir");

        let mut config = Config {
            proc_root: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_ok());

        config.output = Some("xml".into());
        assert!(validate_effective_config(&config).is_err());

        config.output = None;
        config.log_level = Some("loud".into());
        assert!(validate_effective_config(&config).is_err());

        config.log_level = None;
        config.proc_root = Some(dir.path().join("missing"));
        assert!(validate_effective_config(&config).is_err());
    }
}
