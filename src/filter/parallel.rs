//! Row-parallel convolution engine
//!
//! In-process baseline for the distributed path: the same per-row kernel
//! loop as the sequential engine, fanned across rayon's pool. Rows are
//! independent; each task reads the shared source and writes only its own
//! row slice of the pre-allocated output buffer, so no locking is needed.

use crate::filter::{convolve_row, BoundaryPolicy};
use crate::kernel::Kernel;
use crate::raster::PixelBuffer;
use rayon::prelude::*;

/// Apply `kernel` to every pixel of `src` with per-row parallelism
///
/// Pixel-identical to [`crate::filter::convolve`] for every kernel and
/// boundary policy.
pub fn convolve_parallel(
    src: &PixelBuffer,
    kernel: &Kernel,
    boundary: BoundaryPolicy,
) -> PixelBuffer {
    let width = src.width();
    let mut out = vec![0u32; width as usize * src.height() as usize];

    out.par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            convolve_row(src, kernel, boundary, y as u32, row);
        });

    PixelBuffer::from_vec(width, src.height(), out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::convolve;
    use crate::kernel;
    use crate::raster::pack;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height);
        for y in 0..height {
            let row: Vec<u32> = (0..width)
                .map(|x| pack((x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8))
                .collect();
            buf.paste_rows(y, &row);
        }
        buf
    }

    #[test]
    fn test_matches_sequential_engine() {
        let src = gradient(17, 11);
        for k in [kernel::edge_detection(), kernel::gaussian_blur(), kernel::sharpen()] {
            for boundary in [BoundaryPolicy::Zero, BoundaryPolicy::Clamp] {
                assert_eq!(
                    convolve_parallel(&src, &k, boundary),
                    convolve(&src, &k, boundary),
                    "kernel {:?} boundary {:?}",
                    k,
                    boundary
                );
            }
        }
    }

    #[test]
    fn test_single_row_image() {
        let src = gradient(9, 1);
        let k = kernel::gaussian_blur();
        assert_eq!(
            convolve_parallel(&src, &k, BoundaryPolicy::Zero),
            convolve(&src, &k, BoundaryPolicy::Zero)
        );
    }
}
