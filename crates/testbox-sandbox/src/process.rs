//! ProcessRunner trait: spawns one command and reports whether it succeeded.
//!
//! Child stdout/stderr are relayed live by inheriting the parent's streams.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use testbox_core::config::EnvSnapshot;

/// Extension point for process execution.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `binary` with `args` in `cwd` using exactly `env`. Returns the success flag.
    async fn run(
        &self,
        binary: &Path,
        args: &[String],
        cwd: &Path,
        env: &EnvSnapshot,
    ) -> std::io::Result<bool>;
}

/// Default runner: `tokio::process` with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct InheritStdioRunner;

#[async_trait]
impl ProcessRunner for InheritStdioRunner {
    async fn run(
        &self,
        binary: &Path,
        args: &[String],
        cwd: &Path,
        env: &EnvSnapshot,
    ) -> std::io::Result<bool> {
        let status = tokio::process::Command::new(binary)
            .args(args)
            .current_dir(cwd)
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;
        if !status.success() {
            tracing::debug!(binary = %binary.display(), code = ?status.code(), "Command exited unsuccessfully");
        }
        Ok(status.success())
    }
}
