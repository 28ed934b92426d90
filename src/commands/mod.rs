//! CLI command implementations for herakles-meminfo.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Validation of the process table and system sources

pub mod check;

// Re-export command functions
pub use check::command_check;
