//! Text and JSON rendering of complete reports.

use herakles_meminfo::process::{StatusField, StatusFields, StatusValue};
use herakles_meminfo::{
    aggregate, render_json, render_text, ProcessRecord, ProcessTable, Report, SystemMemory,
    UserNameCache,
};

fn memory(swap_total_kb: u64) -> SystemMemory {
    SystemMemory {
        total_kb: 1_000_000,
        free_kb: 200_000,
        buffers_kb: 50_000,
        cached_kb: 100_000,
        swap_total_kb,
        swap_free_kb: swap_total_kb / 4,
    }
}

fn record(pid: u32, uid: u32, command: &str, ures_kb: u64, cpu: u32) -> ProcessRecord {
    ProcessRecord {
        pid,
        ppid: 1,
        uid,
        command: command.to_string(),
        vm_size_kb: ures_kb + 1000,
        resident_kb: ures_kb + 100,
        shared_kb: 100,
        ures_kb,
        state: 'S',
        threads: 1,
        cpu,
        ..Default::default()
    }
}

fn table(records: Vec<ProcessRecord>) -> ProcessTable {
    records.into_iter().map(|r| (r.pid, r)).collect()
}

fn names() -> UserNameCache {
    UserNameCache::with_resolver(|uid| match uid {
        0 => Some("root".to_string()),
        1000 => Some("alice".to_string()),
        _ => None,
    })
}

#[test]
fn test_text_sections_in_order() {
    let t = table(vec![
        record(1, 0, "init", 4096, 0),
        record(2, 1000, "editor", 2048, 0),
        record(3, 1000, "sh", 12, 0),
    ]);
    let report = Report::new(memory(0), aggregate(&t, 1024));
    let text = render_text(&report, &names(), 25);

    let sections = [
        "Report generated at ",
        "System wide memory information:",
        "Process memory usage sorted by unique resident set size (in KiB):",
        "Memory usage per user:",
        "Memory usage by processes with same names:",
    ];
    let mut last = 0;
    for section in sections {
        let pos = text.find(section).unwrap_or_else(|| panic!("missing {section}"));
        assert!(pos >= last, "{section} out of order");
        last = pos;
    }

    assert!(text.contains("RAM: 976.56 MiB (341.80 free [35.00%])"));
    assert!(text.contains("Swap: None"));
    assert!(!text.contains("Process information per CPU"));
    assert!(text.contains("alice"));
}

#[test]
fn test_rest_row_is_last_command_row() {
    let t = table(vec![
        record(1, 0, "big", 4096, 0),
        record(2, 0, "small", 10, 0),
    ]);
    let report = Report::new(memory(1000), aggregate(&t, 1024));
    let text = render_text(&report, &names(), 25);

    let commands = text
        .split("Memory usage by processes with same names:")
        .nth(1)
        .expect("command section");
    let rows: Vec<&str> = commands.lines().filter(|l| !l.trim().is_empty()).collect();
    assert!(rows.last().unwrap().trim_start().starts_with("Rest"));
    assert!(rows.iter().any(|l| l.trim_start().starts_with("big")));
    assert!(!rows.iter().any(|l| l.trim_start().starts_with("small")));
    assert!(text.contains("Swap: 0.98 MiB (0.24 free [25.00%])"));
}

#[test]
fn test_cpu_section_when_any_cpu_nonzero() {
    let t = table(vec![record(1, 0, "a", 2000, 1), record(2, 0, "b", 3000, 0)]);
    let report = Report::new(memory(0), aggregate(&t, 1024));
    let text = render_text(&report, &names(), 25);

    let cpu_section = text
        .split("Process information per CPU (main-threads only):")
        .nth(1)
        .expect("cpu section expected");
    assert!(cpu_section.contains("Count"));
    assert!(text.contains("C#"));
}

#[test]
fn test_unknown_status_value_printed_as_minus_one() {
    let mut status = StatusFields::new();
    status.insert(StatusField::Peak, StatusValue::Unknown);
    status.insert(StatusField::Data, StatusValue::Kib(640));

    let mut odd = record(9, 0, "odd", 2000, 0);
    odd.status = Some(status);
    let t = table(vec![odd, record(10, 0, "plain", 1000, 0)]);

    let report = Report::new(memory(0), aggregate(&t, 1024));
    let text = render_text(&report, &names(), 25);

    let row = text
        .lines()
        .find(|l| l.trim_end().ends_with("odd"))
        .expect("process row");
    assert!(row.contains(" -1 "));
    assert!(row.contains(" 640 "));
    assert!(text.contains("virt-p"));
    assert!(text.contains("data"));
}

#[test]
fn test_header_repeats_every_n_rows() {
    let records = (1..=7).map(|pid| record(pid, 0, "w", 2000 + u64::from(pid), 0)).collect();
    let t = table(records);
    let report = Report::new(memory(0), aggregate(&t, 1024));

    let count_headers = |text: &str| text.lines().filter(|l| l.contains("CMD (n threads)")).count();
    assert_eq!(count_headers(&render_text(&report, &names(), 3)), 3);
    assert_eq!(count_headers(&render_text(&report, &names(), 7)), 1);
    assert_eq!(count_headers(&render_text(&report, &names(), 0)), 1);
}

#[test]
fn test_threads_shown_after_command() {
    let mut threaded = record(4, 0, "java", 9000, 0);
    threaded.threads = 12;
    let t = table(vec![threaded]);
    let report = Report::new(memory(0), aggregate(&t, 1024));
    assert!(render_text(&report, &names(), 25).contains("java (12 T)"));
}

#[test]
fn test_json_document() {
    let mut status = StatusFields::new();
    status.insert(StatusField::Hwm, StatusValue::Unknown);
    let mut first = record(1, 1000, "editor", 5000, 2);
    first.status = Some(status);
    let t = table(vec![first, record(2, 4242, "tiny", 3, 0)]);

    let report = Report::new(memory(0), aggregate(&t, 1024));
    let json = render_json(&report, &names()).expect("serializable report");
    let doc: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    assert_eq!(doc["memory"]["total_kb"], 1_000_000);
    assert_eq!(doc["memory"]["usable_free_kb"], 350_000);
    assert_eq!(doc["processes"][0]["pid"], 1);
    assert_eq!(doc["processes"][0]["user"], "alice");
    assert_eq!(doc["processes"][0]["ures_kb"], 5000);
    assert_eq!(doc["processes"][0]["status"]["Hwm"], -1);
    assert_eq!(doc["processes"][1]["user"], "4242");
    assert_eq!(doc["commands"][0]["key"], "editor");
    assert_eq!(doc["rest"]["count"], 1);
    assert_eq!(doc["cpus"].as_array().map(Vec::len), Some(2));
    assert!(doc["generated_at"].is_string());
}
