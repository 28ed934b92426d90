//! Herakles Memory Info Library
//!
//! This library takes one snapshot of the Linux process table and reports how
//! much resident memory each process holds that is not shared with any other
//! process (unique resident set size, URES).
//!
//! # Features
//!
//! - **Per-process records**: sizes, faults, CPU times and start age from `/proc/<pid>`
//! - **Grouped views**: totals per user, per command name and per last-run CPU
//! - **Parallel scan**: per-process reads run on the rayon pool
//! - **Text and JSON output**: the full report is rendered in memory first
//!
//! # Usage
//!
//! ```no_run
//! use herakles_meminfo::{aggregate, read_system_memory, render_text, scan_process_table};
//! use herakles_meminfo::{Report, UserNameCache, DEFAULT_HEADER_EVERY, DEFAULT_REST_THRESHOLD_KB};
//! use std::path::Path;
//!
//! let proc_root = Path::new("/proc");
//! let memory = read_system_memory(proc_root)?;
//! let table = scan_process_table(proc_root, true)?;
//! let report = Report::new(memory, aggregate(&table, DEFAULT_REST_THRESHOLD_KB));
//!
//! let names = UserNameCache::new();
//! print!("{}", render_text(&report, &names, DEFAULT_HEADER_EVERY));
//! # Ok::<(), herakles_meminfo::MeminfoError>(())
//! ```

pub mod aggregate;
pub mod error;
pub mod identity;
pub mod process;
pub mod report;
pub mod system;

// Re-export main types for convenience
pub use aggregate::{aggregate, Totals, Views, DEFAULT_REST_THRESHOLD_KB};
pub use error::{MeminfoError, Result};
pub use identity::UserNameCache;
pub use process::{scan_process_table, ProcessRecord, ProcessTable};
pub use report::{render_json, render_text, Report, DEFAULT_HEADER_EVERY};
pub use system::{read_system_memory, SystemMemory};
