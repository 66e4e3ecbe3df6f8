//! Convolution kernels
//!
//! A kernel is a square matrix of weights with an odd side length. The
//! system never normalizes weights; presets carry already-normalized
//! values (e.g. 1/16 per cell for the Gaussian blur), and custom kernels
//! are taken from configuration as-is.

use crate::error::FilterError;

/// Square convolution kernel with odd side length
///
/// Weights are stored row-major. `radius` is the maximum row/column offset
/// the convolution reads relative to the output pixel. Construction always
/// goes through validation, so a held `Kernel` is square and odd-sided;
/// on the wire kernels travel as flattened weights and are re-validated
/// with [`Kernel::from_flat`] on receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    side: usize,
    weights: Vec<f64>,
}

impl Kernel {
    /// Build a kernel from a row matrix, rejecting non-square or
    /// even-sided input
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, FilterError> {
        let side = rows.len();
        if side == 0 || side % 2 == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "side length must be odd and >= 1, got {}",
                side
            )));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != side {
                return Err(FilterError::InvalidKernel(format!(
                    "row {} has {} weights, expected {} (kernel must be square)",
                    i,
                    row.len(),
                    side
                )));
            }
        }

        Ok(Self {
            side,
            weights: rows.into_iter().flatten().collect(),
        })
    }

    /// Rebuild a kernel from a flattened weight list (wire format)
    pub fn from_flat(side: usize, weights: Vec<f64>) -> Result<Self, FilterError> {
        if side == 0 || side % 2 == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "side length must be odd and >= 1, got {}",
                side
            )));
        }
        if weights.len() != side * side {
            return Err(FilterError::InvalidKernel(format!(
                "flat kernel of side {} needs {} weights, got {}",
                side,
                side * side,
                weights.len()
            )));
        }
        Ok(Self { side, weights })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    /// Maximum row/column offset read relative to the output pixel
    pub fn radius(&self) -> usize {
        self.side / 2
    }

    /// Weight at (row, col) offset within the kernel window
    #[inline]
    pub fn weight(&self, row: usize, col: usize) -> f64 {
        self.weights[row * self.side + col]
    }

    /// Flattened row-major weights
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// Edge detection (discrete Laplacian)
pub fn edge_detection() -> Kernel {
    Kernel {
        side: 3,
        weights: vec![0.0, -1.0, 0.0, -1.0, 4.0, -1.0, 0.0, -1.0, 0.0],
    }
}

/// Gaussian blur, weights normalized to sum to 1
pub fn gaussian_blur() -> Kernel {
    let w = |n: f64| n / 16.0;
    Kernel {
        side: 3,
        weights: vec![
            w(1.0), w(2.0), w(1.0),
            w(2.0), w(4.0), w(2.0),
            w(1.0), w(2.0), w(1.0),
        ],
    }
}

/// Sharpen; the center weight of 5 overshoots, relying on the output clamp
pub fn sharpen() -> Kernel {
    Kernel {
        side: 3,
        weights: vec![0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0],
    }
}

/// Identity kernel; output equals input byte-for-byte
pub fn identity() -> Kernel {
    Kernel {
        side: 3,
        weights: vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
    }
}
