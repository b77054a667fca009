//! Query orchestration
//!
//! Composes header, footer, block index and block decoding into the one
//! exposed operation: extract the contact records inside a rectangular
//! sub-region of a chromosome-pair matrix, optionally divided by
//! normalization factors.
//!
//! Chromosome order is canonicalized by header index, never by argument
//! order; all block and bin math happens in canonical order while the
//! base-pair rectangle retained for the final containment test decides
//! which records survive. Blocks may be decoded on a worker pool: the
//! block index is read-only by then and every worker owns its own
//! positioned file handle.

use crate::core::block::{read_block, ContactRecord};
use crate::core::error::{HicError, Result};
use crate::core::footer::{read_normalization_vector, Footer};
use crate::core::header::{Chromosome, Header};
use crate::core::io::SmartReader;
use crate::core::matrix::BlockIndex;
use log::debug;
use rayon::prelude::*;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use thread_local::ThreadLocal;

/// Normalization scheme applied to raw counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Raw counts, no correction
    #[default]
    None,
    /// Vanilla coverage
    Vc,
    /// Square root of vanilla coverage
    VcSqrt,
    /// Knight-Ruiz (balanced)
    Kr,
}

impl Normalization {
    /// Parse from string (for CLI argument)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NONE" => Some(Normalization::None),
            "VC" => Some(Normalization::Vc),
            "VC_SQRT" => Some(Normalization::VcSqrt),
            "KR" => Some(Normalization::Kr),
            _ => None,
        }
    }

    /// The label used in normalization vector index entries
    pub fn as_str(&self) -> &'static str {
        match self {
            Normalization::None => "NONE",
            Normalization::Vc => "VC",
            Normalization::VcSqrt => "VC_SQRT",
            Normalization::Kr => "KR",
        }
    }
}

impl std::fmt::Display for Normalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolution unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    /// Base pairs
    #[default]
    Bp,
    /// Restriction enzyme fragments
    Frag,
}

impl Unit {
    /// Parse from string (for CLI argument)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BP" => Some(Unit::Bp),
            "FRAG" => Some(Unit::Frag),
            _ => None,
        }
    }

    /// The label used in zoom and normalization records
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Bp => "BP",
            Unit::Frag => "FRAG",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed locus specification: `"name"` or `"name:start:end"`
///
/// With fewer than two bounds the region is left unset and later
/// defaults to the whole chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locus {
    /// Chromosome name as given
    pub name: String,
    /// Inclusive coordinate bounds, if both were specified
    pub region: Option<(u32, u32)>,
}

impl Locus {
    /// Parse a locus specification
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |message: &str| HicError::InvalidLocus {
            locus: spec.to_string(),
            message: message.to_string(),
        };

        let mut parts = spec.split(':');
        let name = parts.next().unwrap_or("").to_string();
        if name.is_empty() {
            return Err(invalid("empty chromosome name"));
        }
        let region = match (parts.next(), parts.next()) {
            (Some(start), Some(end)) => {
                let start = start
                    .parse::<u32>()
                    .map_err(|_| invalid("start is not a non-negative integer"))?;
                let end = end
                    .parse::<u32>()
                    .map_err(|_| invalid("end is not a non-negative integer"))?;
                Some((start, end))
            }
            _ => None,
        };
        Ok(Self { name, region })
    }
}

/// One result row: genome coordinates and (possibly normalized) count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Genome coordinate along the canonical first axis
    pub x: u64,
    /// Genome coordinate along the canonical second axis
    pub y: u64,
    /// Contact count, divided by normalization factors if requested
    pub counts: f64,
}

/// An open contact matrix file
///
/// Holds the parsed header; everything else (footer pointers, block
/// index, normalization vectors) is constructed fresh per query and
/// discarded at its end.
pub struct HicFile {
    path: PathBuf,
    reader: SmartReader,
    header: Header,
}

impl HicFile {
    /// Open a file and parse its header
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = SmartReader::open_auto(path.as_ref())?;
        let header = Header::read(&mut reader)?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            reader,
            header,
        })
    }

    /// The parsed file header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Chromosomes in file declaration order
    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.header.chromosomes
    }

    /// Extract the contact records inside the rectangle spanned by two
    /// loci, at the given unit and resolution
    pub fn query(
        &mut self,
        norm: Normalization,
        locus1: &str,
        locus2: &str,
        unit: Unit,
        bin_size: u32,
    ) -> Result<Vec<Contact>> {
        self.query_with_threads(norm, locus1, locus2, unit, bin_size, 1)
    }

    /// Like [`HicFile::query`], decoding blocks on a worker pool when
    /// `threads > 1`
    ///
    /// Each worker opens its own positioned read handle; per-block
    /// results are merged in ascending block-number order, so the output
    /// does not depend on the thread count.
    pub fn query_with_threads(
        &mut self,
        norm: Normalization,
        locus1: &str,
        locus2: &str,
        unit: Unit,
        bin_size: u32,
        threads: usize,
    ) -> Result<Vec<Contact>> {
        let locus1 = Locus::parse(locus1)?;
        let locus2 = Locus::parse(locus2)?;

        let chrom1 = self.header.chromosome(&locus1.name)?.clone();
        let chrom2 = self.header.chromosome(&locus2.name)?.clone();
        let region1 = locus1.region.unwrap_or((0, chrom1.length));
        let region2 = locus2.region.unwrap_or((0, chrom2.length));

        // canonical order: axis1 is the lower header index; output axes
        // still follow argument order, so swapped arguments yield the
        // same rows with x and y exchanged
        let swapped = chrom1.index > chrom2.index;
        let (chrom_x, region_x, chrom_y, region_y) = if swapped {
            (&chrom2, region2, &chrom1, region1)
        } else {
            (&chrom1, region1, &chrom2, region2)
        };
        let intra = chrom_x.index == chrom_y.index;

        let footer = Footer::read(
            &mut self.reader,
            self.header.master_offset,
            chrom_x.index,
            chrom_y.index,
            norm,
            unit,
            bin_size,
        )?;

        let norm_vectors = match footer.norm_entries {
            Some((entry1, entry2)) => {
                let v1 = read_normalization_vector(&mut self.reader, entry1)?;
                let v2 = read_normalization_vector(&mut self.reader, entry2)?;
                Some((v1, v2))
            }
            None => None,
        };

        let index = BlockIndex::read(&mut self.reader, footer.matrix_position, unit, bin_size)?;

        let x_bins = (region_x.0 / bin_size, region_x.1 / bin_size);
        let y_bins = (region_y.0 / bin_size, region_y.1 / bin_size);
        let block_numbers: Vec<u32> = index
            .block_numbers_for_region(x_bins, y_bins, intra)
            .into_iter()
            .collect();
        debug!(
            "query: {} candidate blocks for {}:{}-{} x {}:{}-{}",
            block_numbers.len(),
            chrom_x.name,
            region_x.0,
            region_x.1,
            chrom_y.name,
            region_y.0,
            region_y.1
        );

        let version = self.header.version;
        let per_block: Vec<Vec<ContactRecord>> = if threads > 1 {
            self.decode_blocks_parallel(&index, &block_numbers, version, threads)?
        } else {
            let mut decoded = Vec::with_capacity(block_numbers.len());
            for number in &block_numbers {
                decoded.push(read_block(&mut self.reader, index.get(*number), version)?);
            }
            decoded
        };

        let decoded_total: usize = per_block.iter().map(Vec::len).sum();
        let mut contacts = Vec::new();
        for record in per_block.into_iter().flatten() {
            let x = record.bin_x as i64 * bin_size as i64;
            let y = record.bin_y as i64 * bin_size as i64;
            let in_x = x >= region_x.0 as i64 && x <= region_x.1 as i64;
            let in_y = y >= region_y.0 as i64 && y <= region_y.1 as i64;
            // the mirrored block pass yields records with swapped axes
            let mirrored = intra
                && y >= region_x.0 as i64
                && y <= region_x.1 as i64
                && x >= region_y.0 as i64
                && x <= region_y.1 as i64;
            if (in_x && in_y) || mirrored {
                let counts = match &norm_vectors {
                    Some((v1, v2)) => {
                        record.counts as f64
                            / (norm_factor(v1, record.bin_x) * norm_factor(v2, record.bin_y))
                    }
                    None => record.counts as f64,
                };
                let (x, y) = if swapped { (y, x) } else { (x, y) };
                contacts.push(Contact {
                    x: x as u64,
                    y: y as u64,
                    counts,
                });
            }
        }
        debug!(
            "query: {} records decoded, {} inside the requested rectangle",
            decoded_total,
            contacts.len()
        );
        Ok(contacts)
    }

    fn decode_blocks_parallel(
        &self,
        index: &BlockIndex,
        block_numbers: &[u32],
        version: i32,
        threads: usize,
    ) -> Result<Vec<Vec<ContactRecord>>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| {
                HicError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to create thread pool: {}", e),
                ))
            })?;

        let path = self.path.clone();
        let readers: ThreadLocal<RefCell<SmartReader>> = ThreadLocal::new();
        pool.install(|| {
            block_numbers
                .par_iter()
                .map(|number| {
                    let cell = readers.get_or_try(|| -> Result<_> {
                        Ok(RefCell::new(SmartReader::open_auto(&path)?))
                    })?;
                    let mut reader = cell.borrow_mut();
                    read_block(&mut *reader, index.get(*number), version)
                })
                .collect()
        })
    }
}

/// Divide-by factor for one axis; bins past the end of the vector
/// behave like the NaN entries balancing vectors already contain
fn norm_factor(values: &[f64], bin: i32) -> f64 {
    usize::try_from(bin)
        .ok()
        .and_then(|i| values.get(i).copied())
        .unwrap_or(f64::NAN)
}

/// One-shot query against a file path
///
/// Opens the file, parses the header and runs a single query; every
/// lookup table lives only for the duration of the call.
pub fn query<P: AsRef<Path>>(
    norm: Normalization,
    path: P,
    locus1: &str,
    locus2: &str,
    unit: Unit,
    bin_size: u32,
) -> Result<Vec<Contact>> {
    HicFile::open(path)?.query(norm, locus1, locus2, unit, bin_size)
}
