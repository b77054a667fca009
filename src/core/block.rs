//! Block decompression and record decoding
//!
//! Blocks are zlib streams. The inflated payload starts with a record
//! count; what follows depends on the file version. Version 6 files
//! store flat `(binX, binY, counts)` triples. Version 7+ files store a
//! bin offset pair, a value-width flag and a record type byte selecting
//! one of two layouts: a list of rows or a dense grid.
//!
//! The inflate output buffer grows to whatever the stream declares; the
//! codec's reported length is authoritative and a corrupt stream
//! surfaces as a decode error.

use crate::core::error::{BlockError, BlockResult};
use crate::core::footer::IndexEntry;
use crate::core::io::HicReadExt;
use flate2::bufread::ZlibDecoder;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// A decoded matrix cell at bin granularity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactRecord {
    /// Bin number along the first (canonical min-chromosome) axis
    pub bin_x: i32,
    /// Bin number along the second axis
    pub bin_y: i32,
    /// Raw stored count
    pub counts: f32,
}

/// Record layout of an inflated block payload, selected by the file
/// version and (for version 7+) the record type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockLayout {
    /// Version < 7: flat `(i32, i32, f32)` triples
    Flat,
    /// Version >= 7, type 1: rows of relative coordinates
    RowList {
        bin_x_offset: i32,
        bin_y_offset: i32,
        use_short: u8,
    },
    /// Version >= 7, type 2: dense grid with sentinel-marked gaps
    DenseGrid {
        bin_x_offset: i32,
        bin_y_offset: i32,
        use_short: u8,
    },
}

/// Empty cell marker in the dense-grid short layout
const DENSE_SHORT_SENTINEL: i16 = -32768;

/// Empty cell marker in the dense-grid float layout
///
/// The comparison below is an ordinary numeric equality against this
/// bit pattern promoted to f32 (2143289344.0), not a NaN test. No known
/// file exercises the float dense-grid path, so the check is kept
/// exactly as-is and remains unverified.
const DENSE_FLOAT_SENTINEL: f32 = 0x7fc0_0000u32 as f32;

/// Read a block's byte range and decode its records
///
/// A block absent from the index, or indexed with size 0, decodes to no
/// records; the grid is sparse and such holes are normal.
pub fn read_block<R: Read + Seek>(
    reader: &mut R,
    entry: Option<IndexEntry>,
    version: i32,
) -> crate::core::error::Result<Vec<ContactRecord>> {
    let entry = match entry {
        Some(e) if e.size > 0 => e,
        _ => return Ok(Vec::new()),
    };
    reader.seek(SeekFrom::Start(entry.position))?;
    let mut compressed = vec![0u8; entry.size as usize];
    reader.read_exact(&mut compressed)?;
    Ok(decode_block(&compressed, version, entry.position)?)
}

/// Inflate a compressed block and decode its records
pub fn decode_block(
    compressed: &[u8],
    version: i32,
    offset: u64,
) -> BlockResult<Vec<ContactRecord>> {
    let mut payload = Vec::with_capacity(compressed.len() * 4);
    ZlibDecoder::new(compressed)
        .read_to_end(&mut payload)
        .map_err(|e| BlockError::Inflate {
            offset,
            message: e.to_string(),
        })?;
    decode_records(&payload, version)
}

/// Decode the inflated payload under the layout selected by
/// `(version, recordType)`
fn decode_records(payload: &[u8], version: i32) -> BlockResult<Vec<ContactRecord>> {
    let mut cursor = Cursor::new(payload);
    let result = (|| -> io::Result<BlockResult<Vec<ContactRecord>>> {
        let n_records = cursor.read_i32_le()?.max(0) as usize;
        // capacity bounded by what the payload can actually hold
        let mut records = Vec::with_capacity(n_records.min(payload.len() / 8));

        let layout = if version < 7 {
            BlockLayout::Flat
        } else {
            let bin_x_offset = cursor.read_i32_le()?;
            let bin_y_offset = cursor.read_i32_le()?;
            // 0 means the per-cell values ARE 16-bit integers (inverted sense)
            let use_short = cursor.read_u8()?;
            match cursor.read_u8()? {
                1 => BlockLayout::RowList {
                    bin_x_offset,
                    bin_y_offset,
                    use_short,
                },
                2 => BlockLayout::DenseGrid {
                    bin_x_offset,
                    bin_y_offset,
                    use_short,
                },
                other => return Ok(Err(BlockError::UnknownRecordType(other))),
            }
        };

        match layout {
            BlockLayout::Flat => {
                for _ in 0..n_records {
                    let bin_x = cursor.read_i32_le()?;
                    let bin_y = cursor.read_i32_le()?;
                    let counts = cursor.read_f32_le()?;
                    records.push(ContactRecord {
                        bin_x,
                        bin_y,
                        counts,
                    });
                }
            }
            BlockLayout::RowList {
                bin_x_offset,
                bin_y_offset,
                use_short,
            } => {
                let row_count = cursor.read_i16_le()?;
                for _ in 0..row_count {
                    let y = cursor.read_i16_le()?;
                    let bin_y = y as i32 + bin_y_offset;
                    let col_count = cursor.read_i16_le()?;
                    for _ in 0..col_count {
                        let x = cursor.read_i16_le()?;
                        let bin_x = bin_x_offset + x as i32;
                        let counts = if use_short == 0 {
                            cursor.read_i16_le()? as f32
                        } else {
                            cursor.read_f32_le()?
                        };
                        records.push(ContactRecord {
                            bin_x,
                            bin_y,
                            counts,
                        });
                    }
                }
            }
            BlockLayout::DenseGrid {
                bin_x_offset,
                bin_y_offset,
                use_short,
            } => {
                let n_points = cursor.read_i32_le()?.max(0);
                let width = cursor.read_i16_le()?;
                if width <= 0 {
                    return Ok(Err(BlockError::Truncated(
                        "dense grid width must be positive".to_string(),
                    )));
                }
                let width = width as i32;
                for i in 0..n_points {
                    let row = i / width;
                    let col = i - row * width;
                    let bin_x = bin_x_offset + col;
                    let bin_y = bin_y_offset + row;
                    if use_short == 0 {
                        let c = cursor.read_i16_le()?;
                        if c != DENSE_SHORT_SENTINEL {
                            records.push(ContactRecord {
                                bin_x,
                                bin_y,
                                counts: c as f32,
                            });
                        }
                    } else {
                        let counts = cursor.read_f32_le()?;
                        if counts != DENSE_FLOAT_SENTINEL {
                            records.push(ContactRecord {
                                bin_x,
                                bin_y,
                                counts,
                            });
                        }
                    }
                }
            }
        }
        Ok(Ok(records))
    })();

    match result {
        Ok(inner) => inner,
        Err(e) => Err(BlockError::Truncated(e.to_string())),
    }
}
