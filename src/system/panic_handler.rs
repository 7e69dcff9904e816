//! Panic handler module
//!
//! Worker processes usually run unattended, so a panic is written to
//! `crash.log` next to the working directory as well as to stderr:
//! - Worker mode: detailed colored report with backtrace
//! - CLI mode: one-line message

use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic;
use std::path::Path;

/// File receiving crash reports
pub const CRASH_LOG: &str = "crash.log";

/// Running mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Worker,
    Cli,
}

/// Install custom panic hook
pub fn install_panic_hook(mode: RunMode) {
    panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "Unknown location".to_string());

        let backtrace = std::backtrace::Backtrace::force_capture();
        let report = CrashReport {
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            message,
            location,
            backtrace: format!("{:?}", backtrace),
        };

        if let Err(e) = report.append_to(Path::new(CRASH_LOG)) {
            eprintln!("Failed to write crash log: {}", e);
        }

        match mode {
            RunMode::Worker => display_worker_panic(&report),
            RunMode::Cli => display_simple_panic(&report.message),
        }
    }));
}

/// One panic occurrence
#[derive(Debug, Clone)]
pub struct CrashReport {
    pub timestamp: String,
    pub message: String,
    pub location: String,
    pub backtrace: String,
}

impl CrashReport {
    pub fn append_to(&self, path: &Path) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "==========================================")?;
        writeln!(file, "Crash Report - {}", self.timestamp)?;
        writeln!(file, "==========================================")?;
        writeln!(file, "Message: {}", self.message)?;
        writeln!(file, "Location: {}", self.location)?;
        writeln!(file, "\nBacktrace:")?;
        writeln!(file, "{}", self.backtrace)?;
        writeln!(file, "==========================================\n")?;

        Ok(())
    }
}

fn display_worker_panic(report: &CrashReport) {
    use colored::Colorize;

    let rule = "═══════════════════════════════════════════════════";
    eprintln!();
    eprintln!("{}", rule.red().bold());
    eprintln!("{}", "PANIC".red().bold());
    eprintln!("{}", rule.red().bold());
    eprintln!();
    eprintln!("{} {}", "Reason:".yellow().bold(), report.message.white());
    eprintln!("{} {}", "Location:".yellow().bold(), report.location.white());
    eprintln!();
    eprintln!("{}", "Backtrace:".yellow().bold());
    eprintln!("{}", report.backtrace.dimmed());
    eprintln!();
    eprintln!("{}", format!("Details saved to {}", CRASH_LOG).cyan());
    eprintln!("{}", rule.red().bold());
    eprintln!();
}

fn display_simple_panic(message: &str) {
    eprintln!();
    eprintln!("Program panicked: {}", message);
    eprintln!("Details saved to {}, please check the log file", CRASH_LOG);
    eprintln!();
}
