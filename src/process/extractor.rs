//! Builds one [`ProcessRecord`] from the files under `/proc/<pid>`.
//!
//! Every file of one process is read back-to-back so its fields describe the
//! same moment. A process can exit at any point during the reads; that is an
//! expected outcome and yields [`Extraction::Vanished`], never an error.

use once_cell::sync::Lazy;
use std::fmt;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::process::record::ProcessRecord;
use crate::process::stat::{parse_stat, parse_statm};
use crate::process::status::parse_vm_status;

/// Get system page size in KiB (usually 4).
fn get_page_size_kb() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_PAGESIZE
        // Returns -1 on error, handled by the >= 1024 check
        unsafe {
            let size = libc::sysconf(libc::_SC_PAGESIZE);
            if size >= 1024 {
                return size as u64 / 1024;
            }
        }
    }
    4
}

/// System page size in KiB (for statm page counts).
pub static PAGE_SIZE_KB: Lazy<u64> = Lazy::new(get_page_size_kb);

/// Values shared read-only by every extraction of one scan.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub proc_root: PathBuf,
    /// Elapsed ticks since boot, read once per scan.
    pub uptime_ticks: u64,
    pub page_size_kb: u64,
}

impl ScanContext {
    pub fn new(proc_root: impl Into<PathBuf>, uptime_ticks: u64) -> Self {
        Self {
            proc_root: proc_root.into(),
            uptime_ticks,
            page_size_kb: *PAGE_SIZE_KB,
        }
    }
}

/// Why a process id produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The process directory could not be stat'ed.
    Ownership,
    /// statm was unreadable or malformed.
    Statm,
    /// Zero virtual size.
    KernelThread,
    /// status was unreadable.
    Status,
    /// stat was unreadable or malformed.
    Stat,
    /// Shared size above resident size, a torn read.
    NegativeUres,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ownership => "process directory vanished",
            Self::Statm => "statm unreadable",
            Self::KernelThread => "kernel thread",
            Self::Status => "status unreadable",
            Self::Stat => "stat unreadable",
            Self::NegativeUres => "shared size exceeds resident size",
        };
        f.write_str(s)
    }
}

/// Outcome of reading one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Record(ProcessRecord),
    Vanished(SkipReason),
}

impl Extraction {
    pub fn into_record(self) -> Option<ProcessRecord> {
        match self {
            Self::Record(r) => Some(r),
            Self::Vanished(_) => None,
        }
    }
}

/// Reads every source for `pid` and assembles a record, or reports why not.
pub fn extract_process(pid: u32, ctx: &ScanContext) -> Extraction {
    extract_process_at(pid, &ctx.proc_root.join(pid.to_string()), ctx)
}

/// Same as [`extract_process`] for a process directory that is already known.
pub fn extract_process_at(pid: u32, proc_path: &Path, ctx: &ScanContext) -> Extraction {
    match read_record(pid, proc_path, ctx) {
        Ok(record) => Extraction::Record(record),
        Err(reason) => Extraction::Vanished(reason),
    }
}

/// Reads a per-process text file. The command name inside `stat` and
/// `status` is arbitrary bytes, so invalid UTF-8 is replaced, not rejected.
fn read_lossy(path: &Path) -> Option<String> {
    fs::read(path)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

fn read_record(
    pid: u32,
    proc_path: &Path,
    ctx: &ScanContext,
) -> Result<ProcessRecord, SkipReason> {
    let meta = fs::metadata(proc_path).map_err(|_| SkipReason::Ownership)?;

    let statm = read_lossy(&proc_path.join("statm")).ok_or(SkipReason::Statm)?;
    let (vm_size_kb, resident_kb, shared_kb) =
        parse_statm(&statm, ctx.page_size_kb).ok_or(SkipReason::Statm)?;
    if vm_size_kb == 0 {
        return Err(SkipReason::KernelThread);
    }
    let ures_kb = resident_kb
        .checked_sub(shared_kb)
        .ok_or(SkipReason::NegativeUres)?;

    let status = read_lossy(&proc_path.join("status")).ok_or(SkipReason::Status)?;
    let status = parse_vm_status(&status).map_err(|e| {
        debug!("Malformed status for process {}: {}", pid, e);
        SkipReason::Status
    })?;

    let stat = read_lossy(&proc_path.join("stat")).ok_or(SkipReason::Stat)?;
    let stat = parse_stat(&stat).ok_or(SkipReason::Stat)?;

    Ok(ProcessRecord {
        pid,
        ppid: stat.ppid,
        uid: meta.uid(),
        gid: meta.gid(),
        vm_size_kb,
        resident_kb,
        shared_kb,
        ures_kb,
        command: stat.command,
        state: stat.state,
        minor_faults: stat.minor_faults,
        major_faults: stat.major_faults,
        utime_ticks: stat.utime_ticks,
        stime_ticks: stat.stime_ticks,
        cpu: stat.cpu,
        age_ticks: ctx.uptime_ticks.saturating_sub(stat.start_ticks),
        threads: count_threads(proc_path),
        status,
    })
}

/// Number of entries under `task/`, or 0 on kernels without it.
fn count_threads(proc_path: &Path) -> usize {
    fs::read_dir(proc_path.join("task"))
        .map(|entries| entries.flatten().count())
        .unwrap_or(0)
}
