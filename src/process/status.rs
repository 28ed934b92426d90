//! Extended memory fields from `/proc/<pid>/status`.
//!
//! The set of `Vm*` lines differs between kernel releases, so the result is
//! a map of whatever this kernel exposes rather than a fixed schema.

use std::fmt;
use tracing::debug;

use crate::process::parse_kb_value;
use crate::process::record::{StatusField, StatusFields, StatusValue};

/// Values above 4 GiB (in KiB) are mis-encoded by some kernel/arch
/// combinations and are reported as [`StatusValue::Unknown`].
pub const STATUS_SANITY_CEILING_KB: u64 = 4 * 1024 * 1024;

/// A known `Vm*` line whose value is not a KiB count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidVmValue {
    pub label: String,
    pub value: String,
}

impl fmt::Display for InvalidVmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: unparsable value '{}'", self.label, self.value)
    }
}

/// Collects the known `Vm*` fields of a status file.
///
/// Returns `Ok(None)` when none of them are present, so callers can tell
/// "this kernel has no such data" apart from a process whose fields are all
/// zero. A known field with a non-numeric value is an error.
pub fn parse_vm_status(content: &str) -> Result<Option<StatusFields>, InvalidVmValue> {
    let mut fields = StatusFields::new();

    for line in content.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let Some(field) = label
            .strip_prefix("Vm")
            .and_then(StatusField::from_vm_suffix)
        else {
            continue;
        };

        let value = match parse_kb_value(value) {
            Some(v) if v <= STATUS_SANITY_CEILING_KB => StatusValue::Kib(v),
            Some(v) => {
                debug!("{} value {} kB above sanity ceiling", label, v);
                StatusValue::Unknown
            }
            None => {
                return Err(InvalidVmValue {
                    label: label.to_string(),
                    value: value.trim().to_string(),
                })
            }
        };
        fields.insert(field, value);
    }

    if fields.is_empty() {
        Ok(None)
    } else {
        Ok(Some(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "\
Name:\tbash
State:\tS (sleeping)
Uid:\t1000\t1000\t1000\t1000
VmPeak:\t   23456 kB
VmSize:\t   23400 kB
VmLck:\t       0 kB
VmHWM:\t    5120 kB
VmRSS:\t    5000 kB
VmData:\t    2048 kB
VmStk:\t     132 kB
VmExe:\t     900 kB
VmLib:\t    2300 kB
VmPTE:\t      64 kB
VmSwap:\t       0 kB
Threads:\t1
";

    #[test]
    fn test_parse_vm_status_known_fields() {
        let fields = parse_vm_status(STATUS)
            .unwrap()
            .expect("fields should be present");
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[&StatusField::Peak], StatusValue::Kib(23456));
        assert_eq!(fields[&StatusField::Lck], StatusValue::Kib(0));
        assert_eq!(fields[&StatusField::Hwm], StatusValue::Kib(5120));
        assert_eq!(fields[&StatusField::Pte], StatusValue::Kib(64));
    }

    #[test]
    fn test_parse_vm_status_above_ceiling_is_unknown() {
        let fields = parse_vm_status("VmPeak:\t5000000000 kB\nVmData:\t4194304 kB\n")
            .unwrap()
            .expect("fields should be present");
        assert_eq!(fields[&StatusField::Peak], StatusValue::Unknown);
        // The ceiling itself is still trusted
        assert_eq!(fields[&StatusField::Data], StatusValue::Kib(4194304));
    }

    #[test]
    fn test_parse_vm_status_absent_vs_zero() {
        // Older kernels: no Vm lines at all
        assert_eq!(parse_vm_status("Name:\tinit\nState:\tS (sleeping)\n"), Ok(None));

        let fields = parse_vm_status("VmLck:\t0 kB\n")
            .unwrap()
            .expect("zero is still present");
        assert_eq!(fields[&StatusField::Lck], StatusValue::Kib(0));
    }

    #[test]
    fn test_parse_vm_status_ignores_unmapped_vm_lines() {
        assert_eq!(
            parse_vm_status("VmSize:\t100 kB\nVmRSS:\t50 kB\nVmSwap:\t0 kB\n"),
            Ok(None)
        );
    }

    #[test]
    fn test_parse_vm_status_rejects_garbled_value() {
        let err = parse_vm_status("VmPeak:\t1000 kB\nVmHWM:\tgarbage kB\n").unwrap_err();
        assert_eq!(err.label, "VmHWM");
        assert_eq!(err.value, "garbage kB");

        // An empty value is not a reading either
        assert!(parse_vm_status("VmLck:\n").is_err());

        // Unmapped Vm lines are never inspected
        assert_eq!(parse_vm_status("VmSwap:\tgarbage\n"), Ok(None));
    }
}
