//! FastHicDump - High-performance Hi-C contact matrix extraction
//!
//! A reader and query engine for the indexed, block-compressed binary
//! format used to store genome-wide contact matrices.
//!
//! # Features
//!
//! - Memory-mapped or buffered reading, selected by file size
//! - Optional parallel block decoding with rayon
//! - VC, VC_SQRT and KR normalization
//!
//! # Example
//!
//! ```ignore
//! use fast_hicdump::{query, Normalization, Unit};
//!
//! // Raw counts for an intra-chromosomal slice at 10kb resolution
//! let contacts = query(
//!     Normalization::None,
//!     "inter_30.hic",
//!     "1:0:5000000",
//!     "1:0:5000000",
//!     Unit::Bp,
//!     10_000,
//! )?;
//! for c in &contacts {
//!     println!("{}\t{}\t{}", c.x, c.y, c.counts);
//! }
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use core::{
    query, BlockError, BlockIndex, Chromosome, Contact, ContactRecord, FormatError, Header,
    HicError, HicFile, LookupError, Locus, Normalization, Result, Unit,
};
pub use formats::{write_contacts, DumpStats};
