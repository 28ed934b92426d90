//! Check command implementation.
//!
//! Validates that every source the report reads is accessible.

use herakles_meminfo::process::{collect_proc_entries, extract_process, Extraction, ScanContext};
use herakles_meminfo::system::{read_system_memory, read_uptime_ticks};

use crate::config::{validate_effective_config, Config};

/// Validates the process table root, system sources and configuration.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Memory Info - System Check");
    println!("======================================");

    let proc_root = config.proc_root();
    let mut all_ok = true;

    println!("\n📁 Checking process table at {}...", proc_root.display());
    if proc_root.is_dir() {
        let entries = collect_proc_entries(&proc_root, Some(5));
        if entries.is_empty() {
            println!("   ❌ Cannot read any process entries");
            all_ok = false;
        } else {
            println!("   ✅ Can read {} process entries", entries.len());
        }
    } else {
        println!("   ❌ Process table root not found");
        all_ok = false;
    }

    println!("\n💾 Checking system memory sources...");
    match read_system_memory(&proc_root) {
        Ok(memory) => {
            println!(
                "   ✅ meminfo readable: total={}MiB, free={:.2}%",
                memory.total_kb / 1024,
                memory.free_percent()
            );
        }
        Err(e) => {
            println!("   ❌ meminfo unusable: {}", e);
            all_ok = false;
        }
    }

    let uptime_ticks = match read_uptime_ticks(&proc_root) {
        Ok(ticks) => {
            println!("   ✅ uptime readable: {} ticks", ticks);
            Some(ticks)
        }
        Err(e) => {
            println!("   ❌ uptime unusable: {}", e);
            all_ok = false;
            None
        }
    };

    // Reading our own process proves the per-process files are parsable
    if let Some(ticks) = uptime_ticks {
        println!("\n🧪 Checking per-process extraction...");
        let ctx = ScanContext::new(&proc_root, ticks);
        let pid = std::process::id();
        match extract_process(pid, &ctx) {
            Extraction::Record(record) => {
                println!(
                    "   ✅ Extraction successful: pid={}, URES={}KiB, threads={}",
                    record.pid, record.ures_kb, record.threads
                );
            }
            Extraction::Vanished(reason) => {
                println!("   ❌ Extraction of pid {} failed: {}", pid, reason);
                all_ok = false;
            }
        }
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
