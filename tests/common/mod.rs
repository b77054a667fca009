//! Shared test support: writes minimal but byte-accurate contact files
//! to temporary storage so queries can run end to end.

#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::io::Write;
use tempfile::NamedTempFile;

/// One chromosome-pair matrix at a single resolution
pub struct MatrixSpec {
    pub c1: usize,
    pub c2: usize,
    pub bin_size: u32,
    pub block_bin_count: u32,
    pub block_column_count: u32,
    /// `(block number, records as (binX, binY, counts))`
    pub blocks: Vec<(u32, Vec<(i32, i32, f32)>)>,
}

/// One stored normalization vector
pub struct NormSpec {
    pub norm: &'static str,
    pub chrom_index: i32,
    pub bin_size: u32,
    pub values: Vec<f64>,
}

/// In-memory description of a whole test file
pub struct TestFile {
    pub version: i32,
    pub chroms: Vec<(String, u32)>,
    pub matrices: Vec<MatrixSpec>,
    pub norm_vectors: Vec<NormSpec>,
}

impl TestFile {
    /// Serialize and write to a temp file; the handle keeps it alive
    pub fn write(&self) -> NamedTempFile {
        let mut buf = Vec::new();

        // header
        buf.extend_from_slice(b"HIC\0");
        buf.extend_from_slice(&self.version.to_le_bytes());
        let master_field = buf.len();
        buf.extend_from_slice(&0i64.to_le_bytes()); // patched below
        buf.extend_from_slice(b"test\0");
        buf.extend_from_slice(&0i32.to_le_bytes()); // no attributes
        buf.extend_from_slice(&(self.chroms.len() as i32).to_le_bytes());
        for (name, length) in &self.chroms {
            buf.extend_from_slice(name.as_bytes());
            buf.push(0);
            buf.extend_from_slice(&(*length as i32).to_le_bytes());
        }

        // block payloads, then the matrix section that points at them
        let mut matrix_positions = Vec::new();
        for matrix in &self.matrices {
            let mut entries = Vec::new();
            for (number, records) in &matrix.blocks {
                let compressed = encode_block(self.version, records);
                entries.push((*number, buf.len() as u64, compressed.len() as u32));
                buf.extend_from_slice(&compressed);
            }

            matrix_positions.push(buf.len() as u64);
            buf.extend_from_slice(&(matrix.c1 as i32).to_le_bytes());
            buf.extend_from_slice(&(matrix.c2 as i32).to_le_bytes());
            buf.extend_from_slice(&1i32.to_le_bytes()); // one resolution
            buf.extend_from_slice(b"BP\0");
            buf.extend_from_slice(&1i32.to_le_bytes()); // legacy zoom index
            for stat in [0.0f32; 4] {
                buf.extend_from_slice(&stat.to_le_bytes());
            }
            buf.extend_from_slice(&(matrix.bin_size as i32).to_le_bytes());
            buf.extend_from_slice(&(matrix.block_bin_count as i32).to_le_bytes());
            buf.extend_from_slice(&(matrix.block_column_count as i32).to_le_bytes());
            buf.extend_from_slice(&(entries.len() as i32).to_le_bytes());
            for (number, position, size) in &entries {
                buf.extend_from_slice(&(*number as i32).to_le_bytes());
                buf.extend_from_slice(&(*position as i64).to_le_bytes());
                buf.extend_from_slice(&(*size as i32).to_le_bytes());
            }
        }

        // normalization vector payloads
        let mut norm_positions = Vec::new();
        for spec in &self.norm_vectors {
            norm_positions.push(buf.len() as u64);
            buf.extend_from_slice(&(spec.values.len() as i32).to_le_bytes());
            for value in &spec.values {
                buf.extend_from_slice(&value.to_le_bytes());
            }
        }

        // master footer
        let master = buf.len() as u64;
        buf[master_field..master_field + 8].copy_from_slice(&(master as i64).to_le_bytes());
        buf.extend_from_slice(&0i32.to_le_bytes()); // byte count, unread
        buf.extend_from_slice(&(self.matrices.len() as i32).to_le_bytes());
        for (matrix, position) in self.matrices.iter().zip(&matrix_positions) {
            let key = format!("{}_{}", matrix.c1, matrix.c2);
            buf.extend_from_slice(key.as_bytes());
            buf.push(0);
            buf.extend_from_slice(&(*position as i64).to_le_bytes());
            buf.extend_from_slice(&0i32.to_le_bytes());
        }
        // both expected-value sections, empty
        buf.extend_from_slice(&0i32.to_le_bytes());
        buf.extend_from_slice(&0i32.to_le_bytes());
        // normalization vector index
        buf.extend_from_slice(&(self.norm_vectors.len() as i32).to_le_bytes());
        for (spec, position) in self.norm_vectors.iter().zip(&norm_positions) {
            buf.extend_from_slice(spec.norm.as_bytes());
            buf.push(0);
            buf.extend_from_slice(&spec.chrom_index.to_le_bytes());
            buf.extend_from_slice(b"BP\0");
            buf.extend_from_slice(&(spec.bin_size as i32).to_le_bytes());
            buf.extend_from_slice(&(*position as i64).to_le_bytes());
            buf.extend_from_slice(&((4 + 8 * spec.values.len()) as i32).to_le_bytes());
        }

        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(&buf).expect("write temp file");
        file.flush().expect("flush temp file");
        file
    }
}

/// Encode one block payload and deflate it
///
/// Version 6 uses the flat triple layout; version 7+ uses the
/// list-of-rows layout with zero bin offsets and float values.
fn encode_block(version: i32, records: &[(i32, i32, f32)]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&(records.len() as i32).to_le_bytes());
    if version < 7 {
        for (x, y, counts) in records {
            payload.extend_from_slice(&x.to_le_bytes());
            payload.extend_from_slice(&y.to_le_bytes());
            payload.extend_from_slice(&counts.to_le_bytes());
        }
    } else {
        payload.extend_from_slice(&0i32.to_le_bytes()); // binXOffset
        payload.extend_from_slice(&0i32.to_le_bytes()); // binYOffset
        payload.push(1); // float values
        payload.push(1); // list of rows

        let mut rows: BTreeMap<i32, Vec<(i32, f32)>> = BTreeMap::new();
        for (x, y, counts) in records {
            rows.entry(*y).or_default().push((*x, *counts));
        }
        payload.extend_from_slice(&(rows.len() as i16).to_le_bytes());
        for (y, cols) in rows {
            payload.extend_from_slice(&(y as i16).to_le_bytes());
            payload.extend_from_slice(&(cols.len() as i16).to_le_bytes());
            for (x, counts) in cols {
                payload.extend_from_slice(&(x as i16).to_le_bytes());
                payload.extend_from_slice(&counts.to_le_bytes());
            }
        }
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&payload).expect("deflate block");
    encoder.finish().expect("finish block")
}

/// Assign intra-chromosomal records to blocks by grid position
///
/// Records must already be upper-triangular (`binX <= binY`).
pub fn blocks_from_records(
    records: &[(i32, i32, f32)],
    block_bin_count: u32,
    block_column_count: u32,
) -> Vec<(u32, Vec<(i32, i32, f32)>)> {
    let mut by_block: BTreeMap<u32, Vec<(i32, i32, f32)>> = BTreeMap::new();
    for record in records {
        let col = record.0 as u32 / block_bin_count;
        let row = record.1 as u32 / block_bin_count;
        by_block
            .entry(row * block_column_count + col)
            .or_default()
            .push(*record);
    }
    by_block.into_iter().collect()
}

/// Sort rows for order-insensitive comparison
pub fn sorted_rows(contacts: &[fast_hicdump::Contact]) -> Vec<(u64, u64, u64)> {
    let mut rows: Vec<(u64, u64, u64)> = contacts
        .iter()
        .map(|c| (c.x, c.y, c.counts.to_bits()))
        .collect();
    rows.sort_unstable();
    rows
}
