//! Worker service for distributed mode
//!
//! Runs on each worker in distributed mode. The service:
//! - Listens for a coordinator connection
//! - Installs the broadcast kernel (version-checked)
//! - Convolves each received chunk and returns the valid region
//! - Reports processing failures with an ERROR message

use crate::distributed::protocol::*;
use crate::distributed::worker;
use crate::filter::BoundaryPolicy;
use crate::kernel::Kernel;
use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpStream};

/// Worker service
///
/// Accepts coordinator connections and processes chunks until the
/// coordinator disconnects, then waits for the next connection.
pub struct WorkerService {
    listen_port: u16,
    node_id: String,
}

impl WorkerService {
    /// Create a new worker service
    pub fn new(listen_port: u16) -> Result<Self> {
        Ok(Self {
            listen_port,
            node_id: node_id()?,
        })
    }

    /// Run the worker service
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.listen_port);
        let listener = TcpListener::bind(&addr)
            .await
            .context("Failed to bind worker service")?;

        println!("Worker service listening on port {}", self.listen_port);
        println!("Worker ID: {}", self.node_id);

        serve(listener, self.node_id).await
    }
}

/// Accept-loop over an already-bound listener
///
/// Split from [`WorkerService::run`] so tests can serve on an
/// OS-assigned port.
pub async fn serve(listener: TcpListener, node_id: String) -> Result<()> {
    loop {
        let (stream, addr) = listener
            .accept()
            .await
            .context("Failed to accept connection")?;

        println!("Coordinator connected from: {}", addr);

        if let Err(e) = handle_session(stream, &node_id).await {
            eprintln!("Session failed: {:#}", e);
        }

        println!("Session complete. Waiting for next connection...");
    }
}

/// Handle one coordinator session: kernel broadcast, then chunks until
/// the coordinator hangs up
async fn handle_session(mut stream: TcpStream, node_id: &str) -> Result<()> {
    let mut installed: Option<(Kernel, BoundaryPolicy)> = None;

    loop {
        let msg = match read_message(&mut stream).await {
            Ok(msg) => msg,
            // Coordinator closed the connection: session is over
            Err(e) if is_disconnect(&e) => return Ok(()),
            Err(e) => return Err(e),
        };

        match msg {
            Message::Kernel(kernel_msg) => {
                if kernel_msg.protocol_version != PROTOCOL_VERSION {
                    let error = ErrorMessage {
                        node_id: node_id.to_string(),
                        error: format!(
                            "Protocol version mismatch: coordinator={}, worker={}",
                            kernel_msg.protocol_version, PROTOCOL_VERSION
                        ),
                    };
                    write_message(&mut stream, &Message::Error(error)).await?;
                    anyhow::bail!("Protocol version mismatch");
                }

                let kernel = match Kernel::from_flat(kernel_msg.side, kernel_msg.weights) {
                    Ok(kernel) => kernel,
                    Err(e) => {
                        let error = ErrorMessage {
                            node_id: node_id.to_string(),
                            error: e.to_string(),
                        };
                        write_message(&mut stream, &Message::Error(error)).await?;
                        anyhow::bail!(e);
                    }
                };

                println!(
                    "Installed {}x{} kernel, boundary {:?}",
                    kernel.side(),
                    kernel.side(),
                    kernel_msg.boundary
                );
                installed = Some((kernel, kernel_msg.boundary));
            }
            Message::Chunk(chunk) => {
                let Some((kernel, boundary)) = installed.as_ref() else {
                    let error = ErrorMessage {
                        node_id: node_id.to_string(),
                        error: "Received chunk before kernel broadcast".to_string(),
                    };
                    write_message(&mut stream, &Message::Error(error)).await?;
                    anyhow::bail!("Received chunk before kernel broadcast");
                };

                println!(
                    "Processing chunk: {}x{} (valid {}x{} at row {})",
                    chunk.width, chunk.padded_height, chunk.width, chunk.valid_height, chunk.valid_start
                );

                let started = std::time::Instant::now();
                match worker::process_chunk(kernel, *boundary, chunk) {
                    Ok(result) => {
                        println!(
                            "Chunk processed in {:.3} ms",
                            started.elapsed().as_secs_f64() * 1000.0
                        );
                        write_message(&mut stream, &Message::ChunkResult(result)).await?;
                    }
                    Err(e) => {
                        let error = ErrorMessage {
                            node_id: node_id.to_string(),
                            error: format!("{:#}", e),
                        };
                        write_message(&mut stream, &Message::Error(error)).await?;
                        return Err(e);
                    }
                }
            }
            other => {
                anyhow::bail!("Unexpected message from coordinator: {}", message_name(&other))
            }
        }
    }
}

fn message_name(msg: &Message) -> &'static str {
    match msg {
        Message::Kernel(_) => "KERNEL",
        Message::Chunk(_) => "CHUNK",
        Message::ChunkResult(_) => "CHUNK_RESULT",
        Message::Error(_) => "ERROR",
    }
}

/// A clean disconnect surfaces as EOF on the length-prefix read
fn is_disconnect(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .map(|io| {
            matches!(
                io.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::BrokenPipe
            )
        })
        .unwrap_or(false)
}

/// Worker identifier for error reports
fn node_id() -> Result<String> {
    let name = hostname::get().context("Failed to resolve hostname")?;
    Ok(name.to_string_lossy().into_owned())
}
