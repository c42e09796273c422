//! 按领域分组的配置结构体
//!
//! 可观测性配置从进程环境加载（启动阶段）；沙箱配置从注入的快照加载。

use super::env_keys::{observability as obv_keys, sandbox as sandbox_keys};
use super::loader::{env_bool, env_optional, env_optional_in, env_or};
use super::snapshot::EnvSnapshot;
use std::path::PathBuf;

/// 可观测性配置：quiet、log_level、log_json、audit_log
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
    pub audit_log: Option<String>,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| Self {
            quiet: env_bool(obv_keys::TESTBOX_QUIET, &[], false),
            log_level: env_or(obv_keys::TESTBOX_LOG_LEVEL, &[], || {
                "testbox=info,testbox_sandbox=info,testbox_core=info".to_string()
            }),
            log_json: env_bool(obv_keys::TESTBOX_LOG_JSON, &[], false),
            audit_log: env_optional(obv_keys::TESTBOX_AUDIT_LOG, &[]),
        })
    }
}

/// Sandbox inputs read from the environment.
#[derive(Debug, Clone, Default)]
pub struct SandboxEnvConfig {
    /// Harness-managed temporary directory. When set it is used verbatim and the
    /// harness owns its cleanup.
    pub managed_tmp_dir: Option<PathBuf>,
    /// System temporary root (`TMPDIR`, or `TEMP`/`TMP` on Windows).
    pub system_tmp_dir: Option<PathBuf>,
    /// Root for workspace-relative binary lookup.
    pub workspace_root: Option<PathBuf>,
}

impl SandboxEnvConfig {
    pub fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        Self {
            managed_tmp_dir: env_optional_in(snapshot, sandbox_keys::TEST_TMPDIR, &[])
                .map(PathBuf::from),
            system_tmp_dir: env_optional_in(
                snapshot,
                sandbox_keys::TMPDIR,
                sandbox_keys::TMPDIR_ALIASES,
            )
            .map(PathBuf::from),
            workspace_root: env_optional_in(
                snapshot,
                sandbox_keys::TESTBOX_WORKSPACE,
                sandbox_keys::WORKSPACE_ALIASES,
            )
            .map(PathBuf::from),
        }
    }
}
