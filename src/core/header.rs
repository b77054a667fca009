//! File header parsing
//!
//! The header opens with a magic string, the format version and the
//! offset of the master footer, followed by the genome id, an ignored
//! attribute dictionary, and the chromosome table. Chromosome indices
//! are assigned by declaration order and key everything downstream:
//! matrix pair keys, normalization vector entries and axis assignment.

use crate::core::error::{FormatError, HicError, LookupError, Result};
use crate::core::io::HicReadExt;
use log::debug;
use std::io::BufRead;

/// Minimum supported file format version
pub const MIN_VERSION: i32 = 6;

/// A chromosome as declared in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chromosome {
    /// Name exactly as stored in the file (e.g. "1", "chrX", "ALL")
    pub name: String,
    /// Length in base pairs
    pub length: u32,
    /// 0-based position in file declaration order
    pub index: usize,
}

/// Parsed file header
#[derive(Debug, Clone)]
pub struct Header {
    /// Format version (>= 6)
    pub version: i32,
    /// Absolute offset of the master footer
    pub master_offset: u64,
    /// Genome identifier (e.g. "hg19")
    pub genome_id: String,
    /// Chromosome table in declaration order
    pub chromosomes: Vec<Chromosome>,
}

impl Header {
    /// Parse the header from the start of the file
    ///
    /// The reader must be positioned at offset 0. The attribute
    /// dictionary is consumed but not retained.
    pub fn read<R: BufRead>(reader: &mut R) -> Result<Self> {
        let magic = reader.read_cstring()?;
        if !magic.starts_with("HIC") {
            return Err(FormatError::BadMagic.into());
        }

        let version = reader.read_i32_le()?;
        if version < MIN_VERSION {
            return Err(FormatError::UnsupportedVersion(version).into());
        }

        let master_offset = reader.read_i64_le()? as u64;
        let genome_id = reader.read_cstring()?;

        let n_attributes = reader.read_i32_le()?;
        for _ in 0..n_attributes {
            let _key = reader.read_cstring()?;
            let _value = reader.read_cstring()?;
        }

        let n_chromosomes = reader.read_i32_le()?;
        let mut chromosomes = Vec::with_capacity(n_chromosomes.max(0) as usize);
        for index in 0..n_chromosomes.max(0) as usize {
            let name = reader.read_cstring()?;
            let length = reader.read_i32_le()? as u32;
            chromosomes.push(Chromosome { name, length, index });
        }

        debug!(
            "header: version {}, genome {}, {} chromosomes, master footer at {}",
            version,
            genome_id,
            chromosomes.len(),
            master_offset
        );

        Ok(Self {
            version,
            master_offset,
            genome_id,
            chromosomes,
        })
    }

    /// Look up a chromosome by its exact name
    pub fn chromosome(&self, name: &str) -> Result<&Chromosome> {
        self.chromosomes
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| HicError::from(LookupError::ChromosomeNotFound(name.to_string())))
    }
}
