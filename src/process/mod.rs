//! Process-related modules for discovering processes and reading their state.
//!
//! This module provides:
//! - `record`: The per-process record and its extended status fields
//! - `stat`: Parsers for /proc/<pid>/statm and /proc/<pid>/stat
//! - `status`: Extended `Vm*` fields from /proc/<pid>/status
//! - `extractor`: Assembling one record from the per-process files
//! - `scanner`: Process discovery and whole-table scans

pub mod extractor;
pub mod record;
pub mod scanner;
pub mod stat;
pub mod status;

// Re-export commonly used types
pub use extractor::{
    extract_process, extract_process_at, Extraction, ScanContext, SkipReason, PAGE_SIZE_KB,
};
pub use record::{ProcessRecord, StatusField, StatusFields, StatusValue};
pub use scanner::{collect_proc_entries, scan_process_table, scan_with_context, ProcEntry, ProcessTable};
pub use status::{InvalidVmValue, STATUS_SANITY_CEILING_KB};

/// Parses kilobyte values from `Label: value kB` lines.
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}
