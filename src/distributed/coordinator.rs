//! Distributed coordinator
//!
//! Orchestrates a scatter/gather convolution run:
//! - Connects to all workers
//! - Broadcasts the kernel and boundary policy
//! - Scatters halo-padded row-band chunks
//! - Blocks until every worker has replied (a barrier; arrival order is
//!   irrelevant since each result lands at its own row offset)
//! - Assembles the full-resolution output
//!
//! Any send/receive failure aborts the run and discards partial results;
//! nothing is retried. An optional deadline turns an indefinite wait into
//! a `Cancelled` failure without changing the happy-path protocol.

use crate::distributed::protocol::*;
use crate::error::FilterError;
use crate::filter::BoundaryPolicy;
use crate::kernel::Kernel;
use crate::plan;
use crate::raster::PixelBuffer;
use anyhow::Result;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

/// Distributed coordinator
///
/// Owns the kernel, boundary policy, and worker endpoints for one or more
/// runs; each [`run`](Self::run) is a complete scatter/gather exchange.
#[derive(Debug)]
pub struct DistributedCoordinator {
    kernel: Kernel,
    boundary: BoundaryPolicy,
    worker_addresses: Vec<String>,
    deadline: Option<Duration>,
}

impl DistributedCoordinator {
    /// Create a new distributed coordinator
    pub fn new(
        kernel: Kernel,
        boundary: BoundaryPolicy,
        worker_addresses: Vec<String>,
        deadline: Option<Duration>,
    ) -> Result<Self> {
        if worker_addresses.is_empty() {
            return Err(FilterError::NoWorkersAvailable.into());
        }

        Ok(Self {
            kernel,
            boundary,
            worker_addresses,
            deadline,
        })
    }

    /// Run one distributed convolution
    pub async fn run(&self, image: &PixelBuffer) -> Result<PixelBuffer> {
        let total_start = Instant::now();

        println!(
            "Distributed convolution: {}x{} image across {} workers",
            image.width(),
            image.height(),
            self.worker_addresses.len()
        );

        // Plan before touching the network so partition errors surface
        // without opening a single connection
        let setup_start = Instant::now();
        let chunks = plan::plan(
            image.height(),
            self.worker_addresses.len(),
            self.kernel.radius() as u32,
        )?;
        let setup_elapsed = setup_start.elapsed();

        // Connect to all workers
        println!("Connecting to {} workers...", self.worker_addresses.len());
        let mut connections = Vec::new();
        for (i, addr) in self.worker_addresses.iter().enumerate() {
            let stream = TcpStream::connect(addr).await.map_err(|e| {
                FilterError::Transport {
                    worker: i,
                    message: format!("connect to {} failed: {}", addr, e),
                }
            })?;
            connections.push((i, stream));
        }
        println!("All {} workers connected", connections.len());

        // Broadcast the kernel, then scatter one chunk per worker
        let distribution_start = Instant::now();

        let kernel_msg = Message::Kernel(KernelMessage {
            protocol_version: PROTOCOL_VERSION,
            side: self.kernel.side(),
            weights: self.kernel.weights().to_vec(),
            boundary: self.boundary,
        });
        for (worker, stream) in &mut connections {
            self.send(*worker, stream, &kernel_msg).await?;
        }

        for ((worker, stream), chunk_plan) in connections.iter_mut().zip(&chunks) {
            let band = image.copy_rows(chunk_plan.padded_start, chunk_plan.padded_end);
            let chunk_msg = Message::Chunk(ChunkMessage {
                width: image.width(),
                padded_height: chunk_plan.padded_height(),
                valid_start: chunk_plan.valid_start,
                padding_top: chunk_plan.padding_top(),
                valid_height: chunk_plan.valid_height(),
                pixels: band.into_pixels(),
            });
            self.send(*worker, stream, &chunk_msg).await?;

            println!(
                "Sent rows {}-{} (padded {}-{}) to worker {}",
                chunk_plan.valid_start,
                chunk_plan.valid_end,
                chunk_plan.padded_start,
                chunk_plan.padded_end,
                worker
            );
        }
        let distribution_elapsed = distribution_start.elapsed();

        // Collect: block until every worker has replied. Results carry
        // their own destination offset, so per-stream order never matters.
        let collection_start = Instant::now();
        let mut output = PixelBuffer::new(image.width(), image.height());

        for (worker, stream) in &mut connections {
            let result = match self.recv(*worker, stream).await? {
                Message::ChunkResult(result) => result,
                Message::Error(err) => {
                    return Err(FilterError::Transport {
                        worker: *worker,
                        message: format!("worker {} reported: {}", err.node_id, err.error),
                    }
                    .into());
                }
                other => {
                    return Err(FilterError::Transport {
                        worker: *worker,
                        message: format!("expected CHUNK_RESULT, got {:?}", other),
                    }
                    .into());
                }
            };

            self.check_result(*worker, image, &result)?;
            output.paste_rows(result.valid_start, &result.pixels);
            println!("Received rows {}+ from worker {}", result.valid_start, worker);
        }
        let collection_elapsed = collection_start.elapsed();

        let total_elapsed = total_start.elapsed();
        println!();
        println!("=== TIMING BREAKDOWN ===");
        println!("Setup (planning):      {:8.3} ms", setup_elapsed.as_secs_f64() * 1000.0);
        println!("Distribution (send):   {:8.3} ms", distribution_elapsed.as_secs_f64() * 1000.0);
        println!("Collection (receive):  {:8.3} ms", collection_elapsed.as_secs_f64() * 1000.0);
        println!("Total:                 {:8.3} ms", total_elapsed.as_secs_f64() * 1000.0);

        Ok(output)
    }

    /// Validate a result's shape before pasting it into the output
    fn check_result(&self, worker: usize, image: &PixelBuffer, result: &ResultMessage) -> Result<()> {
        let expected = result.width as usize * result.valid_height as usize;
        if result.width != image.width()
            || result.valid_start + result.valid_height > image.height()
            || result.pixels.len() != expected
        {
            return Err(FilterError::Transport {
                worker,
                message: format!(
                    "malformed result: {}x{} at row {} ({} pixels) for a {}x{} image",
                    result.width,
                    result.valid_height,
                    result.valid_start,
                    result.pixels.len(),
                    image.width(),
                    image.height()
                ),
            }
            .into());
        }
        Ok(())
    }

    async fn send(&self, worker: usize, stream: &mut TcpStream, msg: &Message) -> Result<()> {
        let write = write_message(stream, msg);
        let outcome = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, write)
                .await
                .map_err(|_| FilterError::Cancelled(deadline, worker))?,
            None => write.await,
        };

        outcome.map_err(|e| {
            FilterError::Transport {
                worker,
                message: format!("{:#}", e),
            }
            .into()
        })
    }

    async fn recv(&self, worker: usize, stream: &mut TcpStream) -> Result<Message> {
        let read = read_message(stream);
        let outcome = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, read)
                .await
                .map_err(|_| FilterError::Cancelled(deadline, worker))?,
            None => read.await,
        };

        outcome.map_err(|e| {
            FilterError::Transport {
                worker,
                message: format!("{:#}", e),
            }
            .into()
        })
    }
}
