//! Configuration validation
//!
//! Structural checks run before any work starts, so a bad kernel or an
//! impossible worker count never reaches the network.

use crate::config::Config;
use anyhow::{Context, Result};

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    // Resolving the kernel applies the odd/square rules
    config
        .filter
        .resolve_kernel()
        .context("Configuration has an invalid kernel")?;

    if config.workers.count < 1 {
        anyhow::bail!("workers.count must be at least 1, got {}", config.workers.count);
    }

    if let Some(0) = config.runtime.timeout_secs {
        anyhow::bail!("runtime.timeout_secs must be positive when set");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;

    #[test]
    fn test_default_config_validates() {
        validate_config(&Config::default()).unwrap();
    }

    #[test]
    fn test_even_kernel_rejected() {
        let mut config = Config::default();
        config.filter = FilterConfig {
            kernel: Some(vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
            ..Config::default().filter
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default();
        config.workers.count = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.runtime.timeout_secs = Some(0);
        assert!(validate_config(&config).is_err());
    }
}
