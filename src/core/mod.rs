//! Core contact matrix reading functionality
//!
//! This module contains the binary I/O layer, the header/footer/matrix
//! index parsers, the block decoder and the query orchestrator.

mod block;
mod error;
mod footer;
mod header;
pub mod io;
mod matrix;
mod query;

pub use block::{decode_block, read_block, ContactRecord};
pub use error::{BlockError, BlockResult, FormatError, HicError, LookupError, Result};
pub use footer::{read_normalization_vector, Footer, IndexEntry};
pub use header::{Chromosome, Header, MIN_VERSION};
pub use io::{HicReadExt, IoStrategy, SmartReader, DEFAULT_BUFFER_SIZE, LARGE_BUFFER_SIZE, MMAP_THRESHOLD};
pub use matrix::BlockIndex;
pub use query::{query, Contact, HicFile, Locus, Normalization, Unit};
