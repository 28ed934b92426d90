//! The per-process record assembled by the extractor.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Memory fields from the `Vm*` lines of `/proc/<pid>/status`.
///
/// Variants are declared in report column order (alphabetical by column
/// name), so iterating a [`StatusFields`] map yields report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StatusField {
    /// `VmData`: data segment size.
    Data,
    /// `VmExe`: text segment size.
    Exe,
    /// `VmHWM`: peak resident set size.
    Hwm,
    /// `VmLck`: locked memory.
    Lck,
    /// `VmLib`: shared library code size.
    Lib,
    /// `VmPTE`: page table entries size.
    Pte,
    /// `VmStk`: stack size.
    Stk,
    /// `VmPeak`: peak virtual memory size.
    Peak,
}

impl StatusField {
    pub const ALL: [StatusField; 8] = [
        StatusField::Data,
        StatusField::Exe,
        StatusField::Hwm,
        StatusField::Lck,
        StatusField::Lib,
        StatusField::Pte,
        StatusField::Stk,
        StatusField::Peak,
    ];

    /// Maps the part of a status label after `Vm` (colon stripped) to a field.
    pub fn from_vm_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "Peak" => Some(Self::Peak),
            "Lck" => Some(Self::Lck),
            "HWM" => Some(Self::Hwm),
            "Data" => Some(Self::Data),
            "Stk" => Some(Self::Stk),
            "Exe" => Some(Self::Exe),
            "Lib" => Some(Self::Lib),
            "PTE" => Some(Self::Pte),
            _ => None,
        }
    }

    /// Report column name.
    pub fn column(self) -> &'static str {
        match self {
            Self::Data => "DATA",
            Self::Exe => "EXE",
            Self::Hwm => "HWRES",
            Self::Lck => "LCKD",
            Self::Lib => "LIB",
            Self::Pte => "PTE",
            Self::Stk => "STACK",
            Self::Peak => "VIRT-P",
        }
    }
}

/// A status field value in KiB, or `Unknown` when the kernel reported a value
/// above the sanity ceiling. `Unknown` is written as `-1` in text and JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusValue {
    Kib(u64),
    Unknown,
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kib(v) => write!(f, "{v}"),
            Self::Unknown => f.write_str("-1"),
        }
    }
}

impl Serialize for StatusValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Kib(v) => serializer.serialize_u64(*v),
            Self::Unknown => serializer.serialize_i64(-1),
        }
    }
}

/// Extended memory fields present on this kernel.
pub type StatusFields = BTreeMap<StatusField, StatusValue>;

/// One live user-space process at scan time. Sizes are KiB, times are ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub ppid: u32,
    pub uid: u32,
    pub gid: u32,
    pub vm_size_kb: u64,
    pub resident_kb: u64,
    pub shared_kb: u64,
    /// Unique resident size: `resident_kb - shared_kb`.
    pub ures_kb: u64,
    pub command: String,
    pub state: char,
    pub minor_faults: u64,
    pub major_faults: u64,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
    /// CPU the process last ran on.
    pub cpu: u32,
    /// Ticks elapsed since the process started.
    pub age_ticks: u64,
    pub threads: usize,
    /// `None` when the kernel exposes none of the extended fields.
    pub status: Option<StatusFields>,
}
