//! 统一环境变量加载逻辑
//!
//! 集中维护 fallback 链，避免在业务代码中重复 `or_else` 调用。
//! 进程环境版本供启动阶段使用；`*_in` 版本读取注入的 [`EnvSnapshot`]，供沙箱运行使用。

use std::env;

use super::snapshot::EnvSnapshot;

/// 从主变量或别名链读取环境变量，失败时使用默认值
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    lookup(|k| env::var(k).ok(), primary, aliases)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default)
}

/// 从主变量或别名链读取，返回 Option（空值视为未设置）
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    lookup(|k| env::var(k).ok(), primary, aliases).and_then(non_empty)
}

/// 解析布尔型环境变量：0/false/no/off 为 false，其余为 true
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    parse_bool(lookup(|k| env::var(k).ok(), primary, aliases), default)
}

/// Snapshot-backed [`env_optional`].
pub fn env_optional_in(snapshot: &EnvSnapshot, primary: &str, aliases: &[&str]) -> Option<String> {
    lookup(|k| snapshot.get(k).map(str::to_string), primary, aliases).and_then(non_empty)
}

fn lookup<F>(get: F, primary: &str, aliases: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    get(primary).or_else(|| aliases.iter().find_map(|a| get(*a)))
}

fn non_empty(s: String) -> Option<String> {
    let s = s.trim().to_string();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value.as_deref() {
        Some(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}
