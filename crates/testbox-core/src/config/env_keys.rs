//! 环境变量 key 常量与别名定义
//!
//! 主变量优先使用 `TESTBOX_*`，兼容测试框架（Bazel 等）注入的通用变量。

/// 搜索路径
pub const PATH: &str = "PATH";

/// 沙箱目录与工作区
pub mod sandbox {
    /// Managed temporary directory provided by a test harness. Used verbatim.
    pub const TEST_TMPDIR: &str = "TEST_TMPDIR";

    /// System temporary root for self-created scratch directories.
    pub const TMPDIR: &str = "TMPDIR";
    pub const TMPDIR_ALIASES: &[&str] = &["TEMP", "TMP"];

    /// Root for workspace-relative binary lookup.
    pub const TESTBOX_WORKSPACE: &str = "TESTBOX_WORKSPACE";
    pub const WORKSPACE_ALIASES: &[&str] = &["RUNFILES_DIR"];
}

/// 可观测性与日志
pub mod observability {
    pub const TESTBOX_QUIET: &str = "TESTBOX_QUIET";

    pub const TESTBOX_LOG_LEVEL: &str = "TESTBOX_LOG_LEVEL";

    pub const TESTBOX_LOG_JSON: &str = "TESTBOX_LOG_JSON";

    pub const TESTBOX_AUDIT_LOG: &str = "TESTBOX_AUDIT_LOG";
}
