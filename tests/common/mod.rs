//! Fake process table roots for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const MEMINFO: &str = "MemTotal:        1000000 kB\n\
                           MemFree:          200000 kB\n\
                           Buffers:           50000 kB\n\
                           Cached:           100000 kB\n\
                           SwapTotal:             0 kB\n\
                           SwapFree:              0 kB\n";

/// One fake process; sizes in pages of 4 KiB.
pub struct FakeProcess<'a> {
    pub pid: u32,
    pub comm: &'a str,
    pub size_pages: u64,
    pub resident_pages: u64,
    pub shared_pages: u64,
    pub cpu: u32,
    pub start_ticks: u64,
    pub threads: usize,
    pub status: &'a str,
}

impl<'a> FakeProcess<'a> {
    pub fn new(pid: u32, comm: &'a str, resident_pages: u64, shared_pages: u64) -> Self {
        Self {
            pid,
            comm,
            size_pages: resident_pages + 1000,
            resident_pages,
            shared_pages,
            cpu: 0,
            start_ticks: 0,
            threads: 1,
            status: "Name:\tfake\nVmPeak:\t9000 kB\nVmLck:\t0 kB\n",
        }
    }
}

/// A temporary directory laid out like `/proc`.
pub struct FakeProcRoot {
    pub dir: TempDir,
}

impl FakeProcRoot {
    pub fn new(meminfo: &str, uptime: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("meminfo"), meminfo).expect("Failed to write meminfo");
        fs::write(dir.path().join("uptime"), uptime).expect("Failed to write uptime");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn add(&self, p: &FakeProcess<'_>) {
        let dir = self.path().join(p.pid.to_string());
        fs::create_dir_all(&dir).expect("Failed to create pid dir");
        fs::write(
            dir.join("statm"),
            format!(
                "{} {} {} 1 0 10 0\n",
                p.size_pages, p.resident_pages, p.shared_pages
            ),
        )
        .expect("Failed to write statm");
        fs::write(dir.join("status"), p.status).expect("Failed to write status");
        fs::write(
            dir.join("stat"),
            format!(
                "{pid} ({comm}) S 1 {pid} {pid} 0 -1 4194560 120 0 3 0 250 50 0 0 20 0 {threads} 0 \
                 {start} 9999 99 18446744073709551615 1 1 1 0 0 0 0 0 0 0 0 0 17 {cpu} 0 0 0 0 0\n",
                pid = p.pid,
                comm = p.comm,
                threads = p.threads,
                start = p.start_ticks,
                cpu = p.cpu
            ),
        )
        .expect("Failed to write stat");
        for tid in 0..p.threads {
            fs::create_dir_all(dir.join("task").join((p.pid as usize + tid).to_string()))
                .expect("Failed to create task dir");
        }
    }

    /// Lists a pid whose files are already gone.
    pub fn add_vanished(&self, pid: u32) {
        fs::create_dir_all(self.path().join(pid.to_string())).expect("Failed to create pid dir");
    }
}
