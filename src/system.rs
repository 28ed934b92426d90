//! System-wide figures read from the process table root.
//!
//! This module provides the whole-machine memory snapshot from `meminfo`
//! and the elapsed-ticks-since-boot value from `uptime`.

use ahash::AHashMap as HashMap;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{MeminfoError, Result};

/// Ticks per second used by the kernel for every `/proc` time field (USER_HZ).
pub const USER_HZ: u64 = 100;

/// Whole-machine memory and swap totals, all in KiB as reported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystemMemory {
    pub total_kb: u64,
    pub free_kb: u64,
    pub buffers_kb: u64,
    pub cached_kb: u64,
    pub swap_total_kb: u64,
    pub swap_free_kb: u64,
}

impl SystemMemory {
    /// Builds a snapshot from a parsed meminfo map.
    ///
    /// Every label the report depends on must be present; a missing one is
    /// reported by name instead of being read as zero.
    pub fn from_fields(fields: &HashMap<String, u64>, path: &Path) -> Result<Self> {
        let get = |field: &'static str| {
            fields
                .get(field)
                .copied()
                .ok_or_else(|| MeminfoError::MissingField {
                    field,
                    path: path.to_path_buf(),
                })
        };

        Ok(Self {
            total_kb: get("MemTotal")?,
            free_kb: get("MemFree")?,
            buffers_kb: get("Buffers")?,
            cached_kb: get("Cached")?,
            swap_total_kb: get("SwapTotal")?,
            swap_free_kb: get("SwapFree")?,
        })
    }

    /// Memory available to userspace: free plus buffers plus page cache.
    pub fn usable_free_kb(&self) -> u64 {
        (self.free_kb + self.buffers_kb + self.cached_kb).min(self.total_kb)
    }

    pub fn swap_used_kb(&self) -> u64 {
        self.swap_total_kb.saturating_sub(self.swap_free_kb)
    }

    /// Usable-free memory as a percentage of total memory.
    pub fn free_percent(&self) -> f64 {
        if self.total_kb == 0 {
            return 0.0;
        }
        100.0 * self.usable_free_kb() as f64 / self.total_kb as f64
    }

    /// Free swap as a percentage of total swap, `None` when there is no swap.
    pub fn swap_free_percent(&self) -> Option<f64> {
        if self.swap_total_kb == 0 {
            return None;
        }
        Some(100.0 * self.swap_free_kb as f64 / self.swap_total_kb as f64)
    }
}

/// Parses `Label: Value [Unit]` lines into a label -> value map.
///
/// The colon is stripped from labels. Lines without a colon-terminated label
/// or a numeric value are skipped, as is the `total:` aggregate line that
/// 2.4 kernels put at the top of the file.
pub fn parse_meminfo(content: &str) -> HashMap<String, u64> {
    let mut out = HashMap::new();

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let (Some(label), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        if label == "total:" {
            continue;
        }
        let Some(label) = label.strip_suffix(':') else {
            continue;
        };
        match value.parse::<u64>() {
            Ok(v) => {
                out.insert(label.to_string(), v);
            }
            Err(_) => debug!("Skipping meminfo line with non-numeric value: {}", line),
        }
    }

    out
}

/// Reads `<proc_root>/meminfo` into a [`SystemMemory`] snapshot.
pub fn read_system_memory(proc_root: &Path) -> Result<SystemMemory> {
    let path = proc_root.join("meminfo");
    let content = fs::read_to_string(&path).map_err(|e| MeminfoError::io(&path, e))?;
    SystemMemory::from_fields(&parse_meminfo(&content), &path)
}

/// Parses the first value of an uptime line (seconds, fractional) into ticks.
pub fn parse_uptime_ticks(content: &str) -> Option<u64> {
    let seconds: f64 = content.split_whitespace().next()?.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds * USER_HZ as f64).round() as u64)
}

/// Reads `<proc_root>/uptime` and returns the elapsed ticks since boot.
pub fn read_uptime_ticks(proc_root: &Path) -> Result<u64> {
    let path = proc_root.join("uptime");
    let content = fs::read_to_string(&path).map_err(|e| MeminfoError::io(&path, e))?;
    parse_uptime_ticks(&content).ok_or_else(|| MeminfoError::Malformed {
        path,
        detail: format!("expected '<uptime> <idle>' seconds, got '{}'", content.trim()),
    })
}
