//! Parsers for `/proc/<pid>/statm` and `/proc/<pid>/stat`.

/// Fields taken from the single-line `/proc/<pid>/stat` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFields {
    pub command: String,
    pub state: char,
    pub ppid: u32,
    pub minor_faults: u64,
    pub major_faults: u64,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
    /// Ticks since boot at which the process started.
    pub start_ticks: u64,
    pub cpu: u32,
}

// Offsets into the fields that follow the closing parenthesis of the
// command name (field 3 of proc(5), `state`, is offset 0).
const STATE: usize = 0;
const PPID: usize = 1;
const MINFLT: usize = 7;
const MAJFLT: usize = 9;
const UTIME: usize = 11;
const STIME: usize = 12;
const STARTTIME: usize = 19;
const PROCESSOR: usize = 36;

/// Parses the first three page counts of statm (size, resident, shared) and
/// converts them to KiB. Remaining fields are ignored.
pub fn parse_statm(content: &str, page_size_kb: u64) -> Option<(u64, u64, u64)> {
    let mut fields = content.split_whitespace().map(|v| v.parse::<u64>());
    let size = fields.next()?.ok()?;
    let resident = fields.next()?.ok()?;
    let shared = fields.next()?.ok()?;
    Some((
        size * page_size_kb,
        resident * page_size_kb,
        shared * page_size_kb,
    ))
}

/// Parses a stat line.
///
/// The command name sits between the first `(` and the last `)` so that
/// names containing spaces or parentheses do not shift the numeric fields.
pub fn parse_stat(content: &str) -> Option<StatFields> {
    let open = content.find('(')?;
    let close = content.rfind(')')?;
    if close < open {
        return None;
    }
    let command = content[open + 1..close].to_string();

    let rest: Vec<&str> = content[close + 1..].split_whitespace().collect();
    if rest.len() <= PROCESSOR {
        return None;
    }

    Some(StatFields {
        command,
        state: rest[STATE].chars().next()?,
        ppid: rest[PPID].parse().ok()?,
        minor_faults: rest[MINFLT].parse().ok()?,
        major_faults: rest[MAJFLT].parse().ok()?,
        utime_ticks: rest[UTIME].parse().ok()?,
        stime_ticks: rest[STIME].parse().ok()?,
        start_ticks: rest[STARTTIME].parse().ok()?,
        cpu: rest[PROCESSOR].parse().ok()?,
    })
}
