//! Resolver traits.
//!
//! - `FileResolver`: maps a path from the test definition to an absolute source path
//! - `BinaryResolver`: maps a logical binary name to a runnable path
//!
//! The runner resolves every command binary through `BinaryResolver` before
//! spawning, so shimmed tools, workspace-relative binaries and system binaries
//! all work the same way.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::{RunnerError, RunnerResult};

/// Resolve `path` against `base` when it is relative.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Make a workspace root absolute against the current directory.
fn absolute_root(root: PathBuf) -> PathBuf {
    std::path::absolute(&root).unwrap_or(root)
}

/// Extension point for locating input files. Must not touch the file itself.
pub trait FileResolver: Send + Sync {
    fn resolve_file(&self, path: &Path) -> PathBuf;
}

/// Relative paths are taken from the workspace root, which is kept absolute.
#[derive(Debug, Clone)]
pub struct WorkspaceFileResolver {
    pub workspace_root: PathBuf,
}

impl WorkspaceFileResolver {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: absolute_root(workspace_root.into()),
        }
    }
}

impl FileResolver for WorkspaceFileResolver {
    fn resolve_file(&self, path: &Path) -> PathBuf {
        absolutize(path, &self.workspace_root)
    }
}

/// Extension point for binary lookup.
pub trait BinaryResolver: Send + Sync {
    /// Resolve `name` to an executable path.
    ///
    /// `search_path` is the composed `PATH` the command will run with and `cwd`
    /// is the scratch directory.
    fn resolve(&self, name: &str, search_path: Option<&OsStr>, cwd: &Path) -> RunnerResult<PathBuf>;
}

/// Default resolver.
///
/// - absolute paths are used as-is and must exist
/// - names containing a path separator are joined to the workspace root
/// - bare names are searched on `PATH` (shim directory first)
#[derive(Debug, Clone)]
pub struct WorkspaceBinaryResolver {
    pub workspace_root: PathBuf,
}

impl WorkspaceBinaryResolver {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: absolute_root(workspace_root.into()),
        }
    }
}

fn has_separator(name: &str) -> bool {
    name.contains('/') || (cfg!(windows) && name.contains('\\'))
}

impl BinaryResolver for WorkspaceBinaryResolver {
    fn resolve(&self, name: &str, search_path: Option<&OsStr>, cwd: &Path) -> RunnerResult<PathBuf> {
        let not_found = |reason: String| RunnerError::BinaryResolution {
            binary: name.to_string(),
            reason,
        };

        let path = Path::new(name);
        if path.is_absolute() || has_separator(name) {
            let candidate = if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.workspace_root.join(path)
            };
            if candidate.is_file() {
                return Ok(candidate);
            }
            return Err(not_found(format!(
                "{} does not exist",
                candidate.display()
            )));
        }

        which::which_in(name, search_path, cwd).map_err(|e| not_found(e.to_string()))
    }
}
