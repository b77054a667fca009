//! Master footer parsing
//!
//! The footer is the file's top-level directory: a table mapping
//! chromosome-pair keys to matrix offsets, two expected-value sections
//! (consumed only to keep the cursor aligned), and the index of
//! normalization vectors. Pair keys use canonical order,
//! `"min(idx1,idx2)_max(idx1,idx2)"`.

use crate::core::error::{HicError, LookupError, Result};
use crate::core::io::HicReadExt;
use crate::core::query::{Normalization, Unit};
use log::debug;
use std::io::{BufRead, Seek, SeekFrom};

/// Byte range of a stored object (block or normalization vector)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexEntry {
    /// Absolute file offset
    pub position: u64,
    /// Size in bytes
    pub size: u32,
}

/// Resolved footer pointers for one query
#[derive(Debug, Clone)]
pub struct Footer {
    /// Offset of the chromosome-pair matrix
    pub matrix_position: u64,
    /// Normalization vector locations for (axis1, axis2), canonical
    /// chromosome order; `None` when no normalization was requested
    pub norm_entries: Option<(IndexEntry, IndexEntry)>,
}

impl Footer {
    /// Read the footer at `master_offset` and resolve the pair key
    /// `(c1, c2)` (canonical order, `c1 <= c2`)
    ///
    /// The pair table is scanned to the end even after the key matches,
    /// so the cursor always lands on the section that follows it. When
    /// `norm` is `NONE` the normalization sections are never read.
    pub fn read<R: BufRead + Seek>(
        reader: &mut R,
        master_offset: u64,
        c1: usize,
        c2: usize,
        norm: Normalization,
        unit: Unit,
        bin_size: u32,
    ) -> Result<Self> {
        reader.seek(SeekFrom::Start(master_offset))?;
        let _n_bytes = reader.read_i32_le()?;

        let key = format!("{}_{}", c1, c2);
        let n_entries = reader.read_i32_le()?;
        let mut matrix_position = None;
        for _ in 0..n_entries.max(0) {
            let entry_key = reader.read_cstring()?;
            let position = reader.read_i64_le()? as u64;
            let _size = reader.read_i32_le()?;
            if entry_key == key {
                matrix_position = Some(position);
            }
        }
        let matrix_position = matrix_position
            .ok_or_else(|| HicError::from(LookupError::ChrPairNotFound(key.clone())))?;
        debug!("footer: matrix for pair {} at {}", key, matrix_position);

        if norm == Normalization::None {
            return Ok(Self {
                matrix_position,
                norm_entries: None,
            });
        }

        // Two expected-value sections sit between the pair table and the
        // normalization vector index; their content is unused here.
        skip_expected_values(reader, false)?;
        skip_expected_values(reader, true)?;

        let n_entries = reader.read_i32_le()?;
        let mut entry1 = None;
        let mut entry2 = None;
        for _ in 0..n_entries.max(0) {
            let norm_type = reader.read_cstring()?;
            let chrom_index = reader.read_i32_le()?;
            let entry_unit = reader.read_cstring()?;
            let resolution = reader.read_i32_le()?;
            let position = reader.read_i64_le()? as u64;
            let size = reader.read_i32_le()?.max(0) as u32;

            if norm_type != norm.as_str()
                || entry_unit != unit.as_str()
                || resolution as u32 != bin_size
            {
                continue;
            }
            if chrom_index as usize == c1 {
                entry1 = Some(IndexEntry { position, size });
            }
            if chrom_index as usize == c2 {
                entry2 = Some(IndexEntry { position, size });
            }
        }

        let missing = |chrom_index| {
            HicError::from(LookupError::NormalizationNotFound {
                chrom_index,
                norm: norm.as_str().to_string(),
                unit: unit.as_str().to_string(),
                bin_size,
            })
        };
        let entry1 = entry1.ok_or_else(|| missing(c1))?;
        let entry2 = entry2.ok_or_else(|| missing(c2))?;
        debug!(
            "footer: {} vectors at {} ({} bytes) and {} ({} bytes)",
            norm.as_str(),
            entry1.position,
            entry1.size,
            entry2.position,
            entry2.size
        );

        Ok(Self {
            matrix_position,
            norm_entries: Some((entry1, entry2)),
        })
    }
}

/// Consume one expected-value section without retaining its content
///
/// Each record is `[type label,] unit, bin size, values, per-chromosome
/// scale factors`; the byte count is exact so later reads stay aligned.
fn skip_expected_values<R: BufRead + Seek>(reader: &mut R, has_type_label: bool) -> Result<()> {
    let n_records = reader.read_i32_le()?;
    for _ in 0..n_records.max(0) {
        if has_type_label {
            let _norm_type = reader.read_cstring()?;
        }
        let _unit = reader.read_cstring()?;
        let _bin_size = reader.read_i32_le()?;

        let n_values = reader.read_i32_le()?.max(0) as i64;
        reader.seek(SeekFrom::Current(n_values * 8))?;

        let n_factors = reader.read_i32_le()?.max(0) as i64;
        reader.seek(SeekFrom::Current(n_factors * 12))?;
    }
    Ok(())
}

/// Read a normalization vector: a value count followed by doubles,
/// indexed by bin number
pub fn read_normalization_vector<R: BufRead + Seek>(
    reader: &mut R,
    entry: IndexEntry,
) -> Result<Vec<f64>> {
    reader.seek(SeekFrom::Start(entry.position))?;
    let n_values = reader.read_i32_le()?.max(0) as usize;
    let mut values = Vec::with_capacity(n_values);
    for _ in 0..n_values {
        values.push(reader.read_f64_le()?);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn push_cstring(buf: &mut Vec<u8>, s: &str) {
        buf.extend_from_slice(s.as_bytes());
        buf.push(0);
    }

    /// One expected-value record with the given counts
    fn push_expected_record(buf: &mut Vec<u8>, type_label: Option<&str>, n_values: i32) {
        if let Some(label) = type_label {
            push_cstring(buf, label);
        }
        push_cstring(buf, "BP");
        buf.extend_from_slice(&10_000i32.to_le_bytes());
        buf.extend_from_slice(&n_values.to_le_bytes());
        for i in 0..n_values {
            buf.extend_from_slice(&(i as f64).to_le_bytes());
        }
        // two per-chromosome scale factors
        buf.extend_from_slice(&2i32.to_le_bytes());
        for i in 0..2i32 {
            buf.extend_from_slice(&i.to_le_bytes());
            buf.extend_from_slice(&1.5f64.to_le_bytes());
        }
    }

    /// Footer with pairs 0_0 and 0_1, expected values, and VC vectors
    fn footer_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0i32.to_le_bytes()); // nBytes, discarded
        buf.extend_from_slice(&2i32.to_le_bytes());
        push_cstring(&mut buf, "0_0");
        buf.extend_from_slice(&111i64.to_le_bytes());
        buf.extend_from_slice(&9i32.to_le_bytes());
        push_cstring(&mut buf, "0_1");
        buf.extend_from_slice(&222i64.to_le_bytes());
        buf.extend_from_slice(&9i32.to_le_bytes());

        // legacy-labeled then type-labeled expected values
        buf.extend_from_slice(&1i32.to_le_bytes());
        push_expected_record(&mut buf, None, 3);
        buf.extend_from_slice(&2i32.to_le_bytes());
        push_expected_record(&mut buf, Some("VC"), 1);
        push_expected_record(&mut buf, Some("KR"), 4);

        // normalization vector index
        buf.extend_from_slice(&3i32.to_le_bytes());
        for (chrom_index, position) in [(0i32, 1000i64), (1, 2000)] {
            push_cstring(&mut buf, "VC");
            buf.extend_from_slice(&chrom_index.to_le_bytes());
            push_cstring(&mut buf, "BP");
            buf.extend_from_slice(&10_000i32.to_le_bytes());
            buf.extend_from_slice(&position.to_le_bytes());
            buf.extend_from_slice(&84i32.to_le_bytes());
        }
        // decoy at a different resolution
        push_cstring(&mut buf, "VC");
        buf.extend_from_slice(&0i32.to_le_bytes());
        push_cstring(&mut buf, "BP");
        buf.extend_from_slice(&5_000i32.to_le_bytes());
        buf.extend_from_slice(&3000i64.to_le_bytes());
        buf.extend_from_slice(&84i32.to_le_bytes());
        buf
    }

    #[test]
    fn test_pair_lookup_none_norm() {
        let mut cursor = Cursor::new(footer_bytes());
        let footer = Footer::read(
            &mut cursor,
            0,
            0,
            1,
            Normalization::None,
            Unit::Bp,
            10_000,
        )
        .unwrap();
        assert_eq!(footer.matrix_position, 222);
        assert!(footer.norm_entries.is_none());
    }

    #[test]
    fn test_pair_not_found() {
        let mut cursor = Cursor::new(footer_bytes());
        let err = Footer::read(
            &mut cursor,
            0,
            1,
            1,
            Normalization::None,
            Unit::Bp,
            10_000,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            HicError::Lookup(LookupError::ChrPairNotFound(_))
        ));
    }

    #[test]
    fn test_norm_entries_resolved_past_expected_values() {
        let mut cursor = Cursor::new(footer_bytes());
        let footer =
            Footer::read(&mut cursor, 0, 0, 1, Normalization::Vc, Unit::Bp, 10_000).unwrap();
        let (e1, e2) = footer.norm_entries.unwrap();
        assert_eq!(e1.position, 1000);
        assert_eq!(e2.position, 2000);
    }

    #[test]
    fn test_norm_not_found_wrong_resolution() {
        let mut cursor = Cursor::new(footer_bytes());
        let err = Footer::read(&mut cursor, 0, 0, 1, Normalization::Vc, Unit::Bp, 25_000)
            .unwrap_err();
        assert!(matches!(
            err,
            HicError::Lookup(LookupError::NormalizationNotFound { .. })
        ));
    }

    #[test]
    fn test_intra_pair_uses_one_entry_for_both_axes() {
        let mut cursor = Cursor::new(footer_bytes());
        let footer =
            Footer::read(&mut cursor, 0, 0, 0, Normalization::Vc, Unit::Bp, 10_000).unwrap();
        let (e1, e2) = footer.norm_entries.unwrap();
        assert_eq!(e1, e2);
    }

    #[test]
    fn test_read_normalization_vector() {
        let mut buf = vec![0u8; 16]; // padding before the vector
        buf.extend_from_slice(&3i32.to_le_bytes());
        for v in [1.0f64, 0.5, 2.0] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        let entry = IndexEntry {
            position: 16,
            size: 28,
        };
        let values = read_normalization_vector(&mut Cursor::new(buf), entry).unwrap();
        assert_eq!(values, vec![1.0, 0.5, 2.0]);
    }
}
