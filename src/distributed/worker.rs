//! Chunk processing
//!
//! The payload operation a worker performs: rebuild the padded chunk as an
//! image, convolve the FULL padded chunk, then trim the halo. The order is
//! the correctness property of the whole pipeline: convolving first lets
//! rows at the valid-region edges read real neighbor data from the halo;
//! trimming first would reintroduce the synthetic-boundary artifact the
//! halo exists to avoid. Workers hold no state across chunks.

use crate::distributed::protocol::{ChunkMessage, ResultMessage};
use crate::filter::{self, BoundaryPolicy};
use crate::kernel::Kernel;
use crate::raster::PixelBuffer;
use anyhow::Result;

/// Convolve one padded chunk and return only its valid rows
pub fn process_chunk(
    kernel: &Kernel,
    boundary: BoundaryPolicy,
    chunk: ChunkMessage,
) -> Result<ResultMessage> {
    if chunk.padding_top + chunk.valid_height > chunk.padded_height {
        anyhow::bail!(
            "chunk metadata inconsistent: padding_top {} + valid_height {} exceeds padded_height {}",
            chunk.padding_top,
            chunk.valid_height,
            chunk.padded_height
        );
    }

    let padded = PixelBuffer::from_raw(chunk.width, chunk.padded_height, chunk.pixels)?;

    // Convolve the whole padded band, halo included
    let processed = filter::convolve(&padded, kernel, boundary);

    // Trim the halo: keep only the rows this worker owns
    let valid = processed.copy_rows(chunk.padding_top, chunk.padding_top + chunk.valid_height);

    Ok(ResultMessage {
        width: chunk.width,
        valid_height: chunk.valid_height,
        valid_start: chunk.valid_start,
        pixels: valid.into_pixels(),
    })
}
