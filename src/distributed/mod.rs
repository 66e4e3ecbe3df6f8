//! Distributed mode
//!
//! Multi-process scatter/gather: a coordinator partitions the image into
//! halo-padded row bands, ships them to worker services over TCP, and
//! reassembles the processed valid regions into a lossless output.

pub mod coordinator;
pub mod protocol;
pub mod worker;
pub mod worker_service;

pub use coordinator::DistributedCoordinator;
pub use worker_service::WorkerService;
