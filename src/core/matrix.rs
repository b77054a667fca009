//! Matrix zoom records and the block grid index
//!
//! A chromosome-pair matrix holds one zoom record per stored resolution.
//! Each record carries the grid geometry (bins per block, columns per
//! row) and the byte ranges of its compressed blocks. Only the record
//! matching the requested unit and bin size is retained; the others are
//! parsed and discarded to keep the cursor moving.
//!
//! Block numbers are `row * block_column_count + col`. For an
//! intra-chromosomal matrix only the upper triangle is stored, so region
//! queries probe both orientations.

use crate::core::error::{HicError, LookupError, Result};
use crate::core::footer::IndexEntry;
use crate::core::io::HicReadExt;
use crate::core::query::Unit;
use log::debug;
use std::collections::{BTreeSet, HashMap};
use std::io::{BufRead, Seek, SeekFrom};

/// Block table and grid geometry for one resolution of one
/// chromosome pair
///
/// Owned by a single query and read-only after construction, which is
/// what allows blocks to be decoded concurrently.
#[derive(Debug, Clone)]
pub struct BlockIndex {
    /// Bin width in unit coordinates
    pub bin_size: u32,
    /// Bins covered by one block along each axis
    pub block_bin_count: u32,
    /// Blocks per grid row
    pub block_column_count: u32,
    blocks: HashMap<u32, IndexEntry>,
}

impl BlockIndex {
    /// Read the zoom record matching `(unit, bin_size)` at the matrix
    /// offset resolved from the footer
    ///
    /// Zoom records are visited in file order; each is consumed in full
    /// but only the first match keeps its block entries, and iteration
    /// stops there.
    pub fn read<R: BufRead + Seek>(
        reader: &mut R,
        matrix_position: u64,
        unit: Unit,
        bin_size: u32,
    ) -> Result<Self> {
        reader.seek(SeekFrom::Start(matrix_position))?;
        let _chr1 = reader.read_i32_le()?;
        let _chr2 = reader.read_i32_le()?;
        let n_resolutions = reader.read_i32_le()?;

        for _ in 0..n_resolutions.max(0) {
            let record_unit = reader.read_cstring()?;
            let _legacy_zoom = reader.read_i32_le()?;
            let _sum_counts = reader.read_f32_le()?;
            let _occupied_cells = reader.read_f32_le()?;
            let _std_dev = reader.read_f32_le()?;
            let _percentile95 = reader.read_f32_le()?;
            let record_bin_size = reader.read_i32_le()? as u32;
            let block_bin_count = reader.read_i32_le()? as u32;
            let block_column_count = reader.read_i32_le()? as u32;
            let n_blocks = reader.read_i32_le()?.max(0);

            if record_unit == unit.as_str() && record_bin_size == bin_size {
                let mut blocks = HashMap::with_capacity(n_blocks as usize);
                for _ in 0..n_blocks {
                    let block_number = reader.read_i32_le()? as u32;
                    let position = reader.read_i64_le()? as u64;
                    let size = reader.read_i32_le()?.max(0) as u32;
                    blocks.insert(block_number, IndexEntry { position, size });
                }
                debug!(
                    "matrix: {} blocks at bin size {}, {} bins/block, {} columns",
                    blocks.len(),
                    bin_size,
                    block_bin_count,
                    block_column_count
                );
                return Ok(Self {
                    bin_size,
                    block_bin_count,
                    block_column_count,
                    blocks,
                });
            }

            // each block entry is int32 + int64 + int32
            reader.seek(SeekFrom::Current(n_blocks as i64 * 16))?;
        }

        Err(HicError::from(LookupError::BlockDataNotFound {
            unit: unit.as_str().to_string(),
            bin_size,
        }))
    }

    /// Byte range of a block, if it is stored
    pub fn get(&self, block_number: u32) -> Option<IndexEntry> {
        self.blocks.get(&block_number).copied()
    }

    /// Number of stored blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if no blocks are stored
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate over all stored block entries
    pub fn entries(&self) -> impl Iterator<Item = (u32, IndexEntry)> + '_ {
        self.blocks.iter().map(|(n, e)| (*n, *e))
    }

    /// Block numbers covering a bin-range query
    ///
    /// `x_bins` spans the first (column) axis and `y_bins` the second
    /// (row) axis, both inclusive and in canonical chromosome order.
    /// For intra-chromosomal queries the mirrored rectangle is added as
    /// well, since only the upper triangle is stored on disk.
    pub fn block_numbers_for_region(
        &self,
        x_bins: (u32, u32),
        y_bins: (u32, u32),
        intra: bool,
    ) -> BTreeSet<u32> {
        let col1 = x_bins.0 / self.block_bin_count;
        let col2 = (x_bins.1 + 1) / self.block_bin_count;
        let row1 = y_bins.0 / self.block_bin_count;
        let row2 = (y_bins.1 + 1) / self.block_bin_count;

        let mut block_numbers = BTreeSet::new();
        for row in row1..=row2 {
            for col in col1..=col2 {
                block_numbers.insert(row * self.block_column_count + col);
            }
        }
        if intra {
            for row in col1..=col2 {
                for col in row1..=row2 {
                    block_numbers.insert(row * self.block_column_count + col);
                }
            }
        }
        block_numbers
    }
}
