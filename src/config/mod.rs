//! Configuration types
//!
//! A `Config` is assembled from CLI arguments, optionally seeded from a
//! TOML file (CLI takes precedence). Kernel presets are configuration,
//! not computation: the filter section names an operation or supplies a
//! custom weight matrix.

pub mod cli;
pub mod toml;
pub mod validator;

use crate::error::FilterError;
use crate::filter::BoundaryPolicy;
use crate::kernel::{self, Kernel};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Named filter operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Discrete Laplacian edge detection
    #[default]
    EdgeDetection,
    /// Gaussian blur
    Blur,
    /// Sharpen
    Sharpen,
    /// Identity (output equals input; useful for pipeline checks)
    Identity,
}

impl Operation {
    /// The preset kernel for this operation
    pub fn kernel(&self) -> Kernel {
        match self {
            Operation::EdgeDetection => kernel::edge_detection(),
            Operation::Blur => kernel::gaussian_blur(),
            Operation::Sharpen => kernel::sharpen(),
            Operation::Identity => kernel::identity(),
        }
    }
}

/// Filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Preset operation
    pub operation: Operation,

    /// Boundary policy applied uniformly across all execution modes
    pub boundary: BoundaryPolicy,

    /// Custom kernel rows; overrides `operation` when present
    pub kernel: Option<Vec<Vec<f64>>>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            operation: Operation::default(),
            boundary: BoundaryPolicy::default(),
            kernel: None,
        }
    }
}

impl FilterConfig {
    /// Resolve the kernel this run will apply
    pub fn resolve_kernel(&self) -> Result<Kernel, FilterError> {
        match &self.kernel {
            Some(rows) => Kernel::new(rows.clone()),
            None => Ok(self.operation.kernel()),
        }
    }
}

/// Worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Worker count for distributed mode
    pub count: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: num_cpus::get(),
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Deadline for every distributed send/receive, in seconds.
    /// Absent = block indefinitely (the reference behavior).
    pub timeout_secs: Option<u64>,

    /// Extra diagnostics on stderr
    pub debug: bool,
}

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub filter: FilterConfig,
    pub workers: WorkerConfig,
    pub runtime: RuntimeConfig,
}
