//! Process scanning utilities for discovering and reading process entries from /proc.
//!
//! This module lists the numeric entries of the process table root and runs
//! the extractor for each of them, sequentially or on the rayon pool.

use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::process::extractor::{extract_process_at, Extraction, ScanContext};
use crate::process::record::ProcessRecord;
use crate::system::read_uptime_ticks;

/// Snapshot of all live user-space processes, keyed by pid.
pub type ProcessTable = HashMap<u32, ProcessRecord, ahash::RandomState>;

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Scans the process table root for entries with numeric names.
pub fn collect_proc_entries(root: &Path, max: Option<usize>) -> Vec<ProcEntry> {
    let mut out = Vec::new();
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let p = entry.path();
            let name = match p.file_name().and_then(|s| s.to_str()) {
                Some(v) => v,
                None => continue,
            };
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let pid: u32 = match name.parse() {
                Ok(v) => v,
                Err(_) => continue,
            };
            out.push(ProcEntry { pid, proc_path: p });
            if let Some(maxp) = max {
                if out.len() >= maxp {
                    break;
                }
            }
        }
    }
    out
}

/// Extracts a record for every entry using an existing scan context.
///
/// Entries that yield no record are dropped; they are processes that exited
/// (or kernel threads) and not errors.
pub fn scan_with_context(
    entries: &[ProcEntry],
    ctx: &ScanContext,
    parallel: bool,
) -> ProcessTable {
    let skipped = AtomicUsize::new(0);

    let extract = |entry: &ProcEntry| {
        match extract_process_at(entry.pid, &entry.proc_path, ctx) {
            Extraction::Record(record) => Some((entry.pid, record)),
            Extraction::Vanished(reason) => {
                debug!("Skipping process {}: {}", entry.pid, reason);
                skipped.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    };

    let table: ProcessTable = if parallel {
        entries.par_iter().filter_map(extract).collect()
    } else {
        entries.iter().filter_map(extract).collect()
    };

    info!(
        "Process scan completed: {} visible, {} collected, {} skipped",
        entries.len(),
        table.len(),
        skipped.load(Ordering::Relaxed)
    );

    table
}

/// Reads the uptime once, then scans every process under `proc_root`.
///
/// Only a missing or malformed uptime source fails the scan.
#[instrument]
pub fn scan_process_table(proc_root: &Path, parallel: bool) -> Result<ProcessTable> {
    let uptime_ticks = read_uptime_ticks(proc_root)?;
    let ctx = ScanContext::new(proc_root, uptime_ticks);

    let entries = collect_proc_entries(proc_root, None);
    debug!(
        "Collected {} process entries from {}",
        entries.len(),
        proc_root.display()
    );

    Ok(scan_with_context(&entries, &ctx, parallel))
}
