//! Output adapters
//!
//! Adapters for materializing query results (tab-separated text).

pub mod text;

pub use text::{write_contacts, DumpStats};
