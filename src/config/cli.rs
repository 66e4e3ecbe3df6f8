//! CLI argument parsing using clap

use crate::config::Operation;
use crate::filter::BoundaryPolicy;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExecutionMode {
    /// Single-threaded convolution (default)
    Sequential,
    /// Row-parallel convolution within one process
    Parallel,
    /// Coordinate a distributed run across worker services
    Distributed,
    /// Run a worker service (accepts coordinator connections)
    Service,
}

/// Rastermill - Distributed image-convolution filtering
#[derive(Parser, Debug)]
#[command(name = "rastermill")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Execution mode: sequential, parallel, distributed, or service
    #[arg(long, value_enum, default_value = "sequential")]
    pub mode: ExecutionMode,

    /// Input image path
    ///
    /// Not required in service mode (the coordinator sends the work)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output image path
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Filter operation (defaults to edge-detection)
    #[arg(short = 'p', long, value_enum)]
    pub operation: Option<Operation>,

    /// Boundary policy for out-of-range neighbors (defaults to zero)
    #[arg(long, value_enum)]
    pub boundary: Option<BoundaryPolicy>,

    /// Number of workers for distributed mode (defaults to CPU count)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Comma-separated list of worker addresses for distributed mode
    /// (e.g., "10.0.1.10:9900,10.0.1.11:9900"); when absent, local worker
    /// services are launched automatically
    #[arg(long)]
    pub host_list: Option<String>,

    /// Port for the worker service to listen on (service mode only)
    #[arg(long, default_value = "9900")]
    pub listen_port: u16,

    /// Port to connect to on workers without an explicit port (distributed mode)
    #[arg(long, default_value = "9900")]
    pub worker_port: u16,

    /// Deadline for every distributed send/receive (e.g., 30s, 5m);
    /// absent = wait indefinitely
    #[arg(long)]
    pub timeout: Option<String>,

    /// TOML configuration file; CLI arguments take precedence
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Extra diagnostics on stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Cross-argument validation clap cannot express
    pub fn validate(&self) -> Result<()> {
        match self.mode {
            ExecutionMode::Service => {
                if self.input.is_some() || self.output.is_some() {
                    anyhow::bail!("Service mode takes no input/output paths (the coordinator sends the work)");
                }
            }
            _ => {
                if self.input.is_none() {
                    anyhow::bail!("Input image path required in {:?} mode", self.mode);
                }
                if self.output.is_none() {
                    anyhow::bail!("Output image path required in {:?} mode", self.mode);
                }
            }
        }

        if let Some(0) = self.workers {
            anyhow::bail!("Worker count must be at least 1");
        }

        if self.host_list.is_some() && self.mode != ExecutionMode::Distributed {
            anyhow::bail!("--host-list only applies to distributed mode");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rastermill").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["in.png", "out.png"]);
        assert_eq!(cli.mode, ExecutionMode::Sequential);
        assert!(cli.operation.is_none());
        assert!(cli.boundary.is_none());
        assert_eq!(cli.listen_port, 9900);
        cli.validate().unwrap();
    }

    #[test]
    fn test_operation_and_boundary_flags() {
        let cli = parse(&["--operation", "blur", "--boundary", "clamp", "in.png", "out.png"]);
        assert_eq!(cli.operation, Some(Operation::Blur));
        assert_eq!(cli.boundary, Some(BoundaryPolicy::Clamp));
    }

    #[test]
    fn test_service_mode_rejects_paths() {
        let cli = parse(&["--mode", "service", "in.png"]);
        assert!(cli.validate().is_err());

        let cli = parse(&["--mode", "service"]);
        cli.validate().unwrap();
    }

    #[test]
    fn test_filter_modes_require_paths() {
        let cli = parse(&["--mode", "parallel", "in.png"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let cli = parse(&["--mode", "distributed", "--workers", "0", "in.png", "out.png"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_host_list_requires_distributed() {
        let cli = parse(&["--host-list", "10.0.0.1:9900", "in.png", "out.png"]);
        assert!(cli.validate().is_err());
    }
}
