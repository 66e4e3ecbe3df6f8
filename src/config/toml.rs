//! TOML configuration file parsing

use crate::config::cli::Cli;
use crate::config::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse a TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from a string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config =
        ::toml::from_str(contents).context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with a base configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    if let Some(operation) = cli.operation {
        config.filter.operation = operation;
        // A preset named on the command line beats a custom kernel from
        // the file
        config.filter.kernel = None;
    }
    if let Some(boundary) = cli.boundary {
        config.filter.boundary = boundary;
    }
    if let Some(workers) = cli.workers {
        config.workers.count = workers;
    }
    if let Some(ref timeout_str) = cli.timeout {
        config.runtime.timeout_secs = Some(parse_duration(timeout_str).context("Invalid timeout")?);
    }
    if cli.debug {
        config.runtime.debug = true;
    }

    Ok(config)
}

/// Build the effective configuration: file (if given) overridden by CLI
pub fn build_config(cli: &Cli) -> Result<Config> {
    let base = match cli.config {
        Some(ref path) => parse_toml_file(path)?,
        None => Config::default(),
    };
    merge_cli_with_config(cli, base)
}

/// Parse a duration string (e.g., "60s", "5m", "1h") to seconds
pub fn parse_duration(s: &str) -> Result<u64> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty duration string");
    }

    let (num_str, unit) = match s.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&s[..i], &s[i..]),
        _ => (s, "s"),
    };

    let num: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid number in duration: {}", num_str))?;

    let seconds = match unit {
        "s" => num,
        "m" => num * 60,
        "h" => num * 3600,
        _ => anyhow::bail!("Invalid duration unit: {}. Use s, m, or h", unit),
    };

    Ok(seconds)
}
