//! Tab-separated text output
//!
//! Writes query results as `x<TAB>y<TAB>count` rows, to a file or to
//! stdout when no output path is given.

use crate::core::Contact;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Dump statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpStats {
    /// Rows written
    pub records: usize,
    /// Rows whose count is NaN (normalization factor unavailable)
    pub nan_records: usize,
}

/// Write contacts to `output`, or stdout if `None`
pub fn write_contacts(contacts: &[Contact], output: Option<&Path>) -> io::Result<DumpStats> {
    match output {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            write_to(contacts, writer)
        }
        None => {
            let stdout = io::stdout();
            write_to(contacts, BufWriter::new(stdout.lock()))
        }
    }
}

fn write_to<W: Write>(contacts: &[Contact], mut writer: W) -> io::Result<DumpStats> {
    let mut stats = DumpStats::default();
    for contact in contacts {
        writeln!(writer, "{}\t{}\t{}", contact.x, contact.y, contact.counts)?;
        stats.records += 1;
        if contact.counts.is_nan() {
            stats.nan_records += 1;
        }
    }
    writer.flush()?;
    Ok(stats)
}
