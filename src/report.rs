//! Text and JSON rendering of a snapshot.
//!
//! The whole report is rendered into memory before anything is written, so a
//! failure to gather system-wide data never leaves a half-printed report.

use chrono::{DateTime, Local, TimeDelta};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write;

use crate::aggregate::{Bucket, CommandBucket, CpuBucket, Totals, Views};
use crate::identity::UserNameCache;
use crate::process::{ProcessRecord, StatusField};
use crate::system::{SystemMemory, USER_HZ};

/// Repeat the process-table header every this many rows by default.
pub const DEFAULT_HEADER_EVERY: usize = 25;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Everything one report shows.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub generated_at: DateTime<Local>,
    pub memory: SystemMemory,
    pub views: Views<'a>,
}

impl<'a> Report<'a> {
    pub fn new(memory: SystemMemory, views: Views<'a>) -> Self {
        Self {
            generated_at: Local::now(),
            memory,
            views,
        }
    }

    /// Distinct uids the report will print names for.
    pub fn uids(&self) -> Vec<u32> {
        self.views.users.iter().map(|u| u.key).collect()
    }
}

/// Table whose columns are right-justified to their widest cell, except the
/// last column which is printed as is.
#[derive(Debug, Default)]
pub struct JustifiedTable {
    rows: Vec<Vec<String>>,
    widths: Vec<usize>,
}

impl JustifiedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a row; the first row added is the header.
    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = cells.into_iter().map(Into::into).collect();
        if self.widths.len() < row.len() {
            self.widths.resize(row.len(), 0);
        }
        for (width, cell) in self.widths.iter_mut().zip(&row) {
            *width = (*width).max(cell.chars().count());
        }
        self.rows.push(row);
    }

    fn write_row(&self, out: &mut String, row: &[String]) {
        if let Some((last, cells)) = row.split_last() {
            for (cell, width) in cells.iter().zip(&self.widths) {
                write!(out, "{:>width$} ", cell, width = width).ok();
            }
            out.push_str(last);
        }
        out.push('\n');
    }

    /// Writes the table. With `header_every > 0` the header is repeated after
    /// a blank line every `header_every` data rows.
    pub fn render(&self, out: &mut String, header_every: usize) {
        let Some((header, data)) = self.rows.split_first() else {
            return;
        };
        self.write_row(out, header);
        for (idx, row) in data.iter().enumerate() {
            self.write_row(out, row);
            let shown = idx + 1;
            if header_every > 0 && shown % header_every == 0 && shown < data.len() {
                out.push('\n');
                self.write_row(out, header);
            }
        }
    }
}

/// Formats CPU time given in ticks: `42s`, `3m07s` or `2h05m09s`.
pub fn format_cpu_time(ticks: u64) -> String {
    let total = ticks / USER_HZ;
    if total < 60 {
        return format!("{}s", total);
    }
    let secs = total % 60;
    let minutes = total / 60;
    if minutes < 60 {
        return format!("{}m{:02}s", minutes, secs);
    }
    format!("{}h{:02}m{:02}s", minutes / 60, minutes % 60, secs)
}

/// Formats the wall-clock start of a process `age_ticks` old: time of day
/// when younger than a day, otherwise the date. An age too large to subtract
/// from `now` prints the date of `now`.
pub fn format_started(age_ticks: u64, now: DateTime<Local>) -> String {
    let secs = age_ticks / USER_HZ;
    let started = i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|age| now.checked_sub_signed(age));
    match started {
        Some(started) if secs < SECONDS_PER_DAY => started.format("%H:%M:%S").to_string(),
        Some(started) => started.format("%Y-%m-%d").to_string(),
        None => now.format("%Y-%m-%d").to_string(),
    }
}

/// Formats KiB as MiB with two decimals.
pub fn format_mib(kb: u64) -> String {
    format!("{:.2} MiB", kb as f64 / 1024.0)
}

fn write_label(out: &mut String, label: &str) {
    writeln!(out).ok();
    writeln!(out, "{}", label).ok();
    writeln!(out, "{}", "-".repeat(label.chars().count())).ok();
}

fn totals_row(key: String, totals: &Totals) -> Vec<String> {
    vec![
        key,
        totals.count.to_string(),
        format_cpu_time(totals.utime_ticks),
        format_cpu_time(totals.stime_ticks),
        format_mib(totals.ures_kb),
    ]
}

/// Extended status columns present in any of `records`, in column order.
pub fn status_columns(records: &[&ProcessRecord]) -> Vec<StatusField> {
    records
        .iter()
        .filter_map(|r| r.status.as_ref())
        .flat_map(|fields| fields.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn process_row(
    record: &ProcessRecord,
    columns: &[StatusField],
    with_cpu: bool,
    names: &UserNameCache,
    now: DateTime<Local>,
) -> Vec<String> {
    let mut row = vec![
        record.pid.to_string(),
        names.name(record.uid),
        record.ures_kb.to_string(),
        record.shared_kb.to_string(),
        record.vm_size_kb.to_string(),
    ];
    for field in columns {
        let cell = record
            .status
            .as_ref()
            .and_then(|fields| fields.get(field))
            .map(|v| v.to_string())
            .unwrap_or_default();
        row.push(cell);
    }
    row.push(record.minor_faults.to_string());
    row.push(record.major_faults.to_string());
    if with_cpu {
        row.push(record.cpu.to_string());
    }
    row.push(format_started(record.age_ticks, now));
    row.push(record.state.to_string());
    if record.threads > 1 {
        row.push(format!("{} ({} T)", record.command, record.threads));
    } else {
        row.push(record.command.clone());
    }
    row
}

fn render_memory(out: &mut String, memory: &SystemMemory) {
    write_label(out, "System wide memory information:");
    writeln!(
        out,
        "RAM: {:.2} MiB ({:.2} free [{:.2}%])",
        memory.total_kb as f64 / 1024.0,
        memory.usable_free_kb() as f64 / 1024.0,
        memory.free_percent()
    )
    .ok();
    match memory.swap_free_percent() {
        Some(pct) => {
            writeln!(
                out,
                "Swap: {:.2} MiB ({:.2} free [{:.2}%])",
                memory.swap_total_kb as f64 / 1024.0,
                memory.swap_free_kb as f64 / 1024.0,
                pct
            )
            .ok();
        }
        None => {
            writeln!(out, "Swap: None").ok();
        }
    }
}

fn render_processes(
    out: &mut String,
    report: &Report<'_>,
    names: &UserNameCache,
    header_every: usize,
) {
    write_label(
        out,
        "Process memory usage sorted by unique resident set size (in KiB):",
    );

    let ranked = &report.views.ranked;
    let with_cpu = report.views.cpu_view_enabled();
    let columns = status_columns(ranked);

    let mut header: Vec<String> = ["PID", "USER", "URES", "SHR", "VIRT"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(columns.iter().map(|f| f.column().to_lowercase()));
    header.push("MINFLT".into());
    header.push("MAJFLT".into());
    if with_cpu {
        header.push("C#".into());
    }
    header.push("Started".into());
    header.push("S".into());
    header.push("CMD (n threads)".into());

    let mut table = JustifiedTable::new();
    table.add_row(header);
    for record in ranked {
        table.add_row(process_row(
            record,
            &columns,
            with_cpu,
            names,
            report.generated_at,
        ));
    }
    table.render(out, header_every);
}

fn render_users(
    out: &mut String,
    users: &[Bucket<u32>],
    names: &UserNameCache,
    header_every: usize,
) {
    write_label(out, "Memory usage per user:");
    let mut table = JustifiedTable::new();
    table.add_row(["USER", "COUNT", "USER-TIME", "SYS-TIME", "MEM-TOTAL"]);
    for user in users {
        table.add_row(totals_row(names.name(user.key), &user.totals));
    }
    table.render(out, header_every);
}

fn render_commands(out: &mut String, commands: &[CommandBucket], rest: &Totals) {
    write_label(out, "Memory usage by processes with same names:");
    let mut table = JustifiedTable::new();
    table.add_row(["CMD", "COUNT", "USER-TIME", "SYS-TIME", "MEM-TOTAL"]);
    for command in commands {
        table.add_row(totals_row(command.key.clone(), &command.totals));
    }
    table.add_row(totals_row("Rest".to_string(), rest));
    table.render(out, 0);
}

fn render_cpus(out: &mut String, cpus: &[CpuBucket]) {
    writeln!(out).ok();
    writeln!(out, "Process information per CPU (main-threads only):").ok();
    let mut table = JustifiedTable::new();
    table.add_row(["CPU", "Count", "USER-TIME", "SYS-TIME", "MEM-TOTAL"]);
    for cpu in cpus {
        table.add_row(totals_row(cpu.key.to_string(), &cpu.totals));
    }
    table.render(out, 0);
}

/// Renders the plain-text report.
pub fn render_text(report: &Report<'_>, names: &UserNameCache, header_every: usize) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "Report generated at {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    )
    .ok();

    render_memory(&mut out, &report.memory);
    render_processes(&mut out, report, names, header_every);
    render_users(&mut out, &report.views.users, names, header_every);
    render_commands(
        &mut out,
        &report.views.commands.entries,
        &report.views.commands.rest,
    );
    if let Some(cpus) = &report.views.cpus {
        render_cpus(&mut out, cpus);
    }
    out
}

#[derive(Serialize)]
struct JsonMemory<'a> {
    #[serde(flatten)]
    raw: &'a SystemMemory,
    usable_free_kb: u64,
    swap_used_kb: u64,
    free_percent: f64,
}

#[derive(Serialize)]
struct JsonProcess<'a> {
    user: String,
    #[serde(flatten)]
    record: &'a ProcessRecord,
}

#[derive(Serialize)]
struct JsonUser {
    user: String,
    uid: u32,
    #[serde(flatten)]
    totals: Totals,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    memory: JsonMemory<'a>,
    processes: Vec<JsonProcess<'a>>,
    users: Vec<JsonUser>,
    commands: &'a [CommandBucket],
    rest: &'a Totals,
    cpus: Option<&'a [CpuBucket]>,
}

/// Renders the report as one pretty-printed JSON document.
pub fn render_json(report: &Report<'_>, names: &UserNameCache) -> serde_json::Result<String> {
    let doc = JsonReport {
        generated_at: report.generated_at.to_rfc3339(),
        memory: JsonMemory {
            raw: &report.memory,
            usable_free_kb: report.memory.usable_free_kb(),
            swap_used_kb: report.memory.swap_used_kb(),
            free_percent: report.memory.free_percent(),
        },
        processes: report
            .views
            .ranked
            .iter()
            .map(|&record| JsonProcess {
                user: names.name(record.uid),
                record,
            })
            .collect(),
        users: report
            .views
            .users
            .iter()
            .map(|u| JsonUser {
                user: names.name(u.key),
                uid: u.key,
                totals: u.totals,
            })
            .collect(),
        commands: &report.views.commands.entries,
        rest: &report.views.commands.rest,
        cpus: report.views.cpus.as_deref(),
    };
    serde_json::to_string_pretty(&doc)
}
