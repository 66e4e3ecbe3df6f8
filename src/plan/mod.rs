//! Row-band partition planning
//!
//! Divides an image's rows into one contiguous band per worker and pads
//! each band with halo rows sized to the kernel radius. The halo is what
//! lets a worker produce convolution-correct output for every row it owns
//! without reaching into a neighbor's band: the padded range covers the
//! kernel's full vertical reach for every valid row, clamped to the image.

use crate::error::FilterError;

/// One worker's share of the image
///
/// `[valid_start, valid_end)` are the rows this worker owns in the final
/// image; `[padded_start, padded_end)` is the range actually shipped.
/// Valid ranges of a plan exactly partition `[0, height)`; padded ranges
/// of neighboring chunks may overlap (shared halo rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    pub valid_start: u32,
    pub valid_end: u32,
    pub padded_start: u32,
    pub padded_end: u32,
}

impl ChunkPlan {
    /// Halo rows shipped above the valid region
    pub fn padding_top(&self) -> u32 {
        self.valid_start - self.padded_start
    }

    pub fn valid_height(&self) -> u32 {
        self.valid_end - self.valid_start
    }

    pub fn padded_height(&self) -> u32 {
        self.padded_end - self.padded_start
    }
}

/// Partition `height` rows across `worker_count` bands with halo padding
///
/// Every band gets `height / worker_count` rows; the last band absorbs the
/// remainder, so all bands are non-empty whenever `height >= worker_count`.
pub fn plan(
    height: u32,
    worker_count: usize,
    kernel_radius: u32,
) -> Result<Vec<ChunkPlan>, FilterError> {
    if worker_count < 1 {
        return Err(FilterError::InvalidPartition(
            "worker count must be at least 1".to_string(),
        ));
    }
    if (height as usize) < worker_count {
        return Err(FilterError::InvalidPartition(format!(
            "{} workers requested but only {} rows available",
            worker_count, height
        )));
    }

    let base = height / worker_count as u32;
    let remainder = height % worker_count as u32;

    let mut chunks = Vec::with_capacity(worker_count);
    for i in 0..worker_count as u32 {
        let valid_start = i * base;
        let valid_end = if i == worker_count as u32 - 1 {
            valid_start + base + remainder
        } else {
            valid_start + base
        };

        chunks.push(ChunkPlan {
            valid_start,
            valid_end,
            padded_start: valid_start.saturating_sub(kernel_radius),
            padded_end: (valid_end + kernel_radius).min(height),
        });
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partitions(chunks: &[ChunkPlan], height: u32) {
        // Valid ranges must be contiguous, disjoint, and cover [0, height)
        let mut next = 0;
        for chunk in chunks {
            assert_eq!(chunk.valid_start, next);
            assert!(chunk.valid_end > chunk.valid_start, "empty band");
            next = chunk.valid_end;
        }
        assert_eq!(next, height);
    }

    #[test]
    fn test_even_split() {
        let chunks = plan(12, 3, 1).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_partitions(&chunks, 12);
        assert!(chunks.iter().all(|c| c.valid_height() == 4));
    }

    #[test]
    fn test_last_band_absorbs_remainder() {
        let chunks = plan(10, 3, 1).unwrap();
        assert_partitions(&chunks, 10);
        assert_eq!(chunks[0].valid_height(), 3);
        assert_eq!(chunks[1].valid_height(), 3);
        assert_eq!(chunks[2].valid_height(), 4);
    }

    #[test]
    fn test_padding_clamped_to_image() {
        let chunks = plan(10, 2, 2).unwrap();

        // First chunk: no rows above to pad with
        assert_eq!(chunks[0].padded_start, 0);
        assert_eq!(chunks[0].padding_top(), 0);
        assert_eq!(chunks[0].padded_end, 7);

        // Second chunk: padded on top, clamped at the bottom
        assert_eq!(chunks[1].padded_start, 3);
        assert_eq!(chunks[1].padding_top(), 2);
        assert_eq!(chunks[1].padded_end, 10);
    }

    #[test]
    fn test_padded_ranges_overlap_valid_ranges_do_not() {
        let chunks = plan(9, 3, 1).unwrap();
        assert_partitions(&chunks, 9);
        // Neighboring padded ranges share halo rows
        assert!(chunks[0].padded_end > chunks[1].padded_start);
        assert!(chunks[1].padded_end > chunks[2].padded_start);
    }

    #[test]
    fn test_one_row_per_worker() {
        let chunks = plan(4, 4, 1).unwrap();
        assert_partitions(&chunks, 4);
        assert!(chunks.iter().all(|c| c.valid_height() == 1));
        // Every padded band still fits in the image
        assert!(chunks.iter().all(|c| c.padded_end <= 4));
    }

    #[test]
    fn test_single_worker_owns_everything() {
        let chunks = plan(100, 1, 1).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].valid_start, 0);
        assert_eq!(chunks[0].valid_end, 100);
        assert_eq!(chunks[0].padded_start, 0);
        assert_eq!(chunks[0].padded_end, 100);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            plan(10, 0, 1),
            Err(FilterError::InvalidPartition(_))
        ));
    }

    #[test]
    fn test_more_workers_than_rows_rejected() {
        assert!(matches!(
            plan(3, 4, 1),
            Err(FilterError::InvalidPartition(_))
        ));
    }

    #[test]
    fn test_zero_radius_ships_exactly_valid_rows() {
        let chunks = plan(8, 2, 0).unwrap();
        for chunk in &chunks {
            assert_eq!(chunk.padded_start, chunk.valid_start);
            assert_eq!(chunk.padded_end, chunk.valid_end);
        }
    }
}
