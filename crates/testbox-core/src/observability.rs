//! Observability: tracing init and command audit log.
//!
//! Uses config::ObservabilityConfig for TESTBOX_QUIET, TESTBOX_LOG_LEVEL, TESTBOX_AUDIT_LOG, etc.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

use chrono::Utc;
use serde_json::json;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

/// Initialize tracing. Call at process startup.
/// When TESTBOX_QUIET=1, only WARN and above are logged. `RUST_LOG` overrides the level.
pub fn init_tracing() {
    let cfg = ObservabilityConfig::from_env();
    let level = if cfg.quiet {
        "testbox=warn,testbox_sandbox=warn,testbox_core=warn".to_string()
    } else {
        cfg.log_level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    // Logs go to stderr so command output relayed on stdout stays clean.
    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    };
}

fn get_audit_path() -> Option<&'static str> {
    static AUDIT_PATH: OnceLock<Option<String>> = OnceLock::new();
    AUDIT_PATH
        .get_or_init(|| {
            let path = ObservabilityConfig::from_env().audit_log.clone()?;
            if let Some(parent) = Path::new(&path).parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            Some(path)
        })
        .as_deref()
}

fn append_jsonl(path: &str, record: &serde_json::Value) {
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(path) {
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(f, "{}", line);
        }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Audit: command_started (right before spawn)
pub fn audit_command_started(index: usize, binary: &str, args: &[String], cwd: &str) {
    if let Some(path) = get_audit_path() {
        let record = json!({
            "ts": now_rfc3339(),
            "event": "command_started",
            "index": index,
            "binary": binary,
            "args": args,
            "cwd": cwd,
        });
        append_jsonl(path, &record);
    }
}

/// Audit: command_completed
pub fn audit_command_completed(index: usize, binary: &str, success: bool, duration_ms: u64) {
    if let Some(path) = get_audit_path() {
        let record = json!({
            "ts": now_rfc3339(),
            "event": "command_completed",
            "index": index,
            "binary": binary,
            "success": success,
            "duration_ms": duration_ms,
        });
        append_jsonl(path, &record);
    }
}
