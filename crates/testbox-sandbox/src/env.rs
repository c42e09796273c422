//! Environment composition for test commands.
//!
//! - `prepend_to_path`: put the shim directory in front of the inherited search path
//! - `expand_placeholders`: substitute `${VAR}` in arguments from the parent snapshot

use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;
use testbox_core::config::EnvSnapshot;

use crate::error::{RunnerError, RunnerResult};

#[cfg(windows)]
const PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_SEPARATOR: &str = ":";

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{(\w+)\}").expect("placeholder regex is valid"))
}

/// Prefix `dir` onto a search-path value. An empty or missing value yields just `dir`.
pub fn prepend_to_path(dir: &Path, current: Option<&str>) -> String {
    let dir = dir.to_string_lossy();
    match current {
        Some(existing) if !existing.is_empty() => format!("{dir}{PATH_SEPARATOR}{existing}"),
        _ => dir.to_string(),
    }
}

/// Extend the snapshot's search path in place, keeping its existing key spelling.
pub fn prepend_path_in(env: &mut EnvSnapshot, dir: &Path) {
    let key = env.path_key();
    let value = prepend_to_path(dir, env.get(&key));
    env.set(key, value);
}

/// Expand every `${VAR}` in `arg` against `source`.
///
/// A variable missing from `source` fails with `UnresolvedPlaceholder`; `binary`
/// only labels the error.
pub fn expand_placeholders(arg: &str, source: &EnvSnapshot, binary: &str) -> RunnerResult<String> {
    let mut missing: Option<String> = None;
    let expanded = placeholder_regex().replace_all(arg, |caps: &Captures| {
        let name = &caps[1];
        match source.get(name) {
            Some(value) => value.to_string(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });
    if let Some(name) = missing {
        return Err(RunnerError::UnresolvedPlaceholder {
            name,
            binary: binary.to_string(),
        });
    }
    Ok(expanded.into_owned())
}

/// Expand placeholders in a full argument list.
pub fn expand_args(args: &[String], source: &EnvSnapshot, binary: &str) -> RunnerResult<Vec<String>> {
    args.iter()
        .map(|arg| expand_placeholders(arg, source, binary))
        .collect()
}
