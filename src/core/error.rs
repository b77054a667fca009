//! Error types for FastHicDump
//!
//! Defines all error types used throughout the library.

use thiserror::Error;

/// Main error type for FastHicDump operations
#[derive(Debug, Error)]
pub enum HicError {
    /// File structure errors (bad signature, unsupported version)
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Index lookup errors
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Block decompression/decoding errors
    #[error("Block error: {0}")]
    Block(#[from] BlockError),

    /// Invalid locus specification (e.g. "chr1:abc:100")
    #[error("Invalid locus '{locus}': {message}")]
    InvalidLocus { locus: String, message: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while validating the file structure
#[derive(Debug, Error)]
pub enum FormatError {
    /// The magic string at the start of the file is not "HIC"
    #[error("magic string is missing, does not appear to be a hic file")]
    BadMagic,

    /// File version is older than the minimum this reader handles
    #[error("version {0} is no longer supported (minimum is 6)")]
    UnsupportedVersion(i32),
}

/// Errors raised while resolving names and keys against the file indexes
#[derive(Debug, Error)]
pub enum LookupError {
    /// Chromosome name absent from the header table
    #[error("chromosome not found in file: {0}")]
    ChromosomeNotFound(String),

    /// Chromosome pair absent from the master footer
    #[error("file does not contain a matrix for chromosome pair {0}")]
    ChrPairNotFound(String),

    /// No normalization vector for the requested combination
    #[error("no {norm} normalization vector for chromosome index {chrom_index} at {unit} {bin_size}")]
    NormalizationNotFound {
        chrom_index: usize,
        norm: String,
        unit: String,
        bin_size: u32,
    },

    /// No zoom record matches the requested unit/resolution
    #[error("no block data for unit {unit} at bin size {bin_size}")]
    BlockDataNotFound { unit: String, bin_size: u32 },
}

/// Errors raised while decompressing or decoding a single block
#[derive(Debug, Error)]
pub enum BlockError {
    /// zlib stream could not be inflated
    #[error("block at offset {offset} failed to inflate: {message}")]
    Inflate { offset: u64, message: String },

    /// Record type byte is not one of the known layouts
    #[error("unrecognized block record type {0}")]
    UnknownRecordType(u8),

    /// Decoded payload ended before all declared records were read
    #[error("block payload truncated: {0}")]
    Truncated(String),
}

/// Result type alias for FastHicDump operations
pub type Result<T> = std::result::Result<T, HicError>;

/// Result type alias for block decoding operations
pub type BlockResult<T> = std::result::Result<T, BlockError>;
