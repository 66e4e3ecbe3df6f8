//! Convolution core
//!
//! One per-row kernel loop (`convolve_row`) drives every execution mode:
//! the sequential path here, the rayon fan-out in [`parallel`], and the
//! distributed workers. Keeping a single loop is what makes the three
//! paths pixel-identical.

pub mod parallel;

use crate::kernel::Kernel;
use crate::raster::{self, PixelBuffer};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Treatment of neighbor coordinates outside the image
///
/// The policy is a named option rather than a baked-in choice, applied
/// uniformly across the sequential, row-parallel, and distributed paths.
/// It travels with the kernel broadcast so every worker agrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Out-of-range neighbors contribute zero
    #[default]
    Zero,
    /// Out-of-range coordinates clamp to the nearest edge pixel
    Clamp,
}

/// Convolve one output row; `out` is the row's slice of the output buffer
///
/// Each RGB channel is summed independently, truncated to integer, and
/// clamped to [0, 255]. The clamp is mandatory regardless of policy;
/// sharpen's center weight of 5 overshoots the channel range.
pub(crate) fn convolve_row(
    src: &PixelBuffer,
    kernel: &Kernel,
    boundary: BoundaryPolicy,
    y: u32,
    out: &mut [u32],
) {
    let width = src.width() as i64;
    let height = src.height() as i64;
    let side = kernel.side();
    let radius = kernel.radius() as i64;

    for x in 0..width {
        let mut r = 0.0f64;
        let mut g = 0.0f64;
        let mut b = 0.0f64;

        for ky in 0..side {
            for kx in 0..side {
                let sx = x + kx as i64 - radius;
                let sy = y as i64 + ky as i64 - radius;

                let sample = match boundary {
                    BoundaryPolicy::Zero => {
                        if sx < 0 || sx >= width || sy < 0 || sy >= height {
                            continue;
                        }
                        src.get(sx as u32, sy as u32)
                    }
                    BoundaryPolicy::Clamp => {
                        src.get(sx.clamp(0, width - 1) as u32, sy.clamp(0, height - 1) as u32)
                    }
                };

                let weight = kernel.weight(ky, kx);
                r += raster::red(sample) as f64 * weight;
                g += raster::green(sample) as f64 * weight;
                b += raster::blue(sample) as f64 * weight;
            }
        }

        out[x as usize] = raster::pack(clamp_channel(r), clamp_channel(g), clamp_channel(b));
    }
}

#[inline]
fn clamp_channel(value: f64) -> u8 {
    (value as i32).clamp(0, 255) as u8
}

/// Apply `kernel` to every pixel of `src`, producing a buffer of identical
/// dimensions
pub fn convolve(src: &PixelBuffer, kernel: &Kernel, boundary: BoundaryPolicy) -> PixelBuffer {
    let width = src.width();
    let mut out = vec![0u32; width as usize * src.height() as usize];

    for (y, row) in out.chunks_mut(width as usize).enumerate() {
        convolve_row(src, kernel, boundary, y as u32, row);
    }

    PixelBuffer::from_vec(width, src.height(), out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{self, Kernel};
    use crate::raster::pack;

    fn solid(width: u32, height: u32, pixel: u32) -> PixelBuffer {
        PixelBuffer::from_raw(width, height, vec![pixel; (width * height) as usize]).unwrap()
    }

    #[test]
    fn test_output_dimensions_match_input() {
        let src = solid(7, 5, pack(10, 20, 30));
        for boundary in [BoundaryPolicy::Zero, BoundaryPolicy::Clamp] {
            let out = convolve(&src, &kernel::gaussian_blur(), boundary);
            assert_eq!(out.width(), 7);
            assert_eq!(out.height(), 5);
        }
    }

    #[test]
    fn test_identity_kernel_is_noop() {
        let mut src = PixelBuffer::new(4, 4);
        for y in 0..4u32 {
            let row: Vec<u32> = (0..4u32).map(|x| pack((x * 17) as u8, (y * 31) as u8, 77)).collect();
            src.paste_rows(y, &row);
        }

        for boundary in [BoundaryPolicy::Zero, BoundaryPolicy::Clamp] {
            assert_eq!(convolve(&src, &kernel::identity(), boundary), src);
        }
    }

    #[test]
    fn test_single_pixel_image() {
        // A 1x1 image under a 3x3 kernel: with the zero policy only the
        // center weight sees a real sample.
        let src = solid(1, 1, pack(100, 100, 100));

        let out = convolve(&src, &kernel::sharpen(), BoundaryPolicy::Zero);
        // 5 * 100 = 500, clamped to 255
        assert_eq!(out.get(0, 0), pack(255, 255, 255));

        // With clamp, every neighbor resolves to the pixel itself:
        // (5 - 4) * 100 = 100
        let out = convolve(&src, &kernel::sharpen(), BoundaryPolicy::Clamp);
        assert_eq!(out.get(0, 0), pack(100, 100, 100));
    }

    #[test]
    fn test_uniform_gray_has_zero_gradient() {
        let src = solid(6, 6, pack(128, 128, 128));

        // Clamp policy: every neighborhood is uniform, so the Laplacian is
        // zero everywhere including borders.
        let out = convolve(&src, &kernel::edge_detection(), BoundaryPolicy::Clamp);
        assert!(out.pixels().iter().all(|&p| p == 0));

        // Zero policy: interior is zero; borders see missing neighbors and
        // light up.
        let out = convolve(&src, &kernel::edge_detection(), BoundaryPolicy::Zero);
        for y in 1..5u32 {
            for x in 1..5u32 {
                assert_eq!(out.get(x, y), 0, "interior pixel ({}, {})", x, y);
            }
        }
        assert_ne!(out.get(0, 0), 0);
    }

    #[test]
    fn test_negative_sums_clamp_to_zero() {
        // All-negative kernel on a bright image drives every channel below
        // zero; the clamp must floor at 0, not wrap.
        let k = Kernel::new(vec![
            vec![0.0, 0.0, 0.0],
            vec![0.0, -1.0, 0.0],
            vec![0.0, 0.0, 0.0],
        ])
        .unwrap();
        let src = solid(3, 3, pack(200, 200, 200));
        let out = convolve(&src, &k, BoundaryPolicy::Zero);
        assert!(out.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_blur_preserves_uniform_regions() {
        // Normalized blur over a uniform image reproduces it under clamp;
        // the interior is preserved under zero too.
        let src = solid(5, 5, pack(64, 128, 192));
        let out = convolve(&src, &kernel::gaussian_blur(), BoundaryPolicy::Clamp);
        assert_eq!(out, src);
    }

    #[test]
    fn test_boundary_policies_agree_on_interior() {
        let mut src = PixelBuffer::new(6, 6);
        for y in 0..6u32 {
            let row: Vec<u32> = (0..6u32).map(|x| pack((x * 40) as u8, (y * 40) as u8, 99)).collect();
            src.paste_rows(y, &row);
        }

        let zero = convolve(&src, &kernel::gaussian_blur(), BoundaryPolicy::Zero);
        let clamp = convolve(&src, &kernel::gaussian_blur(), BoundaryPolicy::Clamp);
        for y in 1..5u32 {
            for x in 1..5u32 {
                assert_eq!(zero.get(x, y), clamp.get(x, y));
            }
        }
    }
}
