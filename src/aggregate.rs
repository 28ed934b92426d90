//! Aggregated views over one process table snapshot.
//!
//! Every view is a pure function of the table. Orderings never depend on the
//! table's iteration order: each sort has an explicit tie-break key.

use ahash::AHashMap as HashMap;
use serde::Serialize;
use std::hash::Hash;

use crate::process::{ProcessRecord, ProcessTable};

/// Commands whose summed URES is below this many KiB are folded into `Rest`.
pub const DEFAULT_REST_THRESHOLD_KB: u64 = 1024;

/// Summed figures of a group of processes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub count: usize,
    pub ures_kb: u64,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
}

impl Totals {
    pub fn add(&mut self, record: &ProcessRecord) {
        self.count += 1;
        self.ures_kb += record.ures_kb;
        self.utime_ticks += record.utime_ticks;
        self.stime_ticks += record.stime_ticks;
    }

    pub fn merge(&mut self, other: &Totals) {
        self.count += other.count;
        self.ures_kb += other.ures_kb;
        self.utime_ticks += other.utime_ticks;
        self.stime_ticks += other.stime_ticks;
    }
}

/// Totals for one key (user id, command name or CPU id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket<K> {
    pub key: K,
    #[serde(flatten)]
    pub totals: Totals,
}

pub type UserBucket = Bucket<u32>;
pub type CommandBucket = Bucket<String>;
pub type CpuBucket = Bucket<u32>;

/// Per-command totals split at the rest threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandView {
    /// Commands at or above the threshold, largest first.
    pub entries: Vec<CommandBucket>,
    /// Everything below the threshold. Always present, possibly all zero.
    pub rest: Totals,
}

/// All four views of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Views<'a> {
    pub ranked: Vec<&'a ProcessRecord>,
    pub users: Vec<UserBucket>,
    pub commands: CommandView,
    /// `None` when no process reports a CPU other than 0.
    pub cpus: Option<Vec<CpuBucket>>,
}

impl Views<'_> {
    pub fn cpu_view_enabled(&self) -> bool {
        self.cpus.is_some()
    }
}

/// Computes every view of `table`.
pub fn aggregate(table: &ProcessTable, rest_threshold_kb: u64) -> Views<'_> {
    Views {
        ranked: ranked_processes(table),
        users: per_user(table),
        commands: per_command(table, rest_threshold_kb),
        cpus: per_cpu(table),
    }
}

fn fold_by<K, F>(table: &ProcessTable, key_fn: F) -> Vec<Bucket<K>>
where
    K: Hash + Eq,
    F: Fn(&ProcessRecord) -> K,
{
    let mut groups: HashMap<K, Totals> = HashMap::new();
    for record in table.values() {
        groups.entry(key_fn(record)).or_default().add(record);
    }
    groups
        .into_iter()
        .map(|(key, totals)| Bucket { key, totals })
        .collect()
}

/// All records by URES descending, equal URES by pid ascending.
pub fn ranked_processes(table: &ProcessTable) -> Vec<&ProcessRecord> {
    let mut ranked: Vec<&ProcessRecord> = table.values().collect();
    ranked.sort_by(|a, b| b.ures_kb.cmp(&a.ures_kb).then(a.pid.cmp(&b.pid)));
    ranked
}

/// Totals per owner uid, by summed URES descending then uid ascending.
pub fn per_user(table: &ProcessTable) -> Vec<UserBucket> {
    let mut users = fold_by(table, |r| r.uid);
    users.sort_by(|a, b| {
        b.totals
            .ures_kb
            .cmp(&a.totals.ures_kb)
            .then(a.key.cmp(&b.key))
    });
    users
}

/// Totals per command name, by summed URES descending then name ascending.
///
/// Commands whose summed URES is below `rest_threshold_kb` are folded into
/// [`CommandView::rest`].
pub fn per_command(table: &ProcessTable, rest_threshold_kb: u64) -> CommandView {
    let (mut entries, small): (Vec<CommandBucket>, Vec<CommandBucket>) =
        fold_by(table, |r| r.command.clone())
            .into_iter()
            .partition(|b| b.totals.ures_kb >= rest_threshold_kb);

    entries.sort_by(|a, b| {
        b.totals
            .ures_kb
            .cmp(&a.totals.ures_kb)
            .then_with(|| a.key.cmp(&b.key))
    });

    let mut rest = Totals::default();
    for bucket in &small {
        rest.merge(&bucket.totals);
    }

    CommandView { entries, rest }
}

/// Whether any record reports a CPU id other than 0.
pub fn has_nonzero_cpu(table: &ProcessTable) -> bool {
    table.values().any(|r| r.cpu > 0)
}

/// Totals per last-run CPU in CPU id order, or `None` when every process
/// reports CPU 0. Threads are attributed to the CPU of their main thread.
pub fn per_cpu(table: &ProcessTable) -> Option<Vec<CpuBucket>> {
    if !has_nonzero_cpu(table) {
        return None;
    }
    let mut cpus = fold_by(table, |r| r.cpu);
    cpus.sort_by_key(|b| b.key);
    Some(cpus)
}
