//! Rastermill - Distributed image-convolution filtering
//!
//! Rastermill applies convolution filters (edge detection, blur, sharpen) to
//! raster images in three execution modes: single-threaded, row-parallel
//! within one process, and distributed across worker processes.
//!
//! # Architecture
//!
//! - **Convolution core**: one per-row kernel loop shared by every mode
//! - **Chunk planning**: row-band partitioning with halo padding sized to
//!   the kernel radius
//! - **Distributed mode**: coordinator scatters halo-padded chunks to
//!   worker services over TCP, barrier-collects the valid regions, and
//!   reassembles a lossless full-resolution image
//! - **Row-parallel mode**: rayon fan-out over disjoint output rows

pub mod config;
pub mod distributed;
pub mod error;
pub mod filter;
pub mod kernel;
pub mod plan;
pub mod raster;

// Re-export commonly used types
pub use error::FilterError;
pub use filter::BoundaryPolicy;
pub use kernel::Kernel;
pub use raster::PixelBuffer;

/// Result type used throughout rastermill
pub type Result<T> = anyhow::Result<T>;
