//! Scratch directory acquisition.
//!
//! A harness-managed directory (`TEST_TMPDIR`) is reused in place and the harness
//! owns its cleanup. Otherwise a fresh temporary directory is created under the
//! snapshot's temporary root and kept after the run so it can be inspected.
//!
//! The returned path is always absolute.

use std::path::{Path, PathBuf};
use testbox_core::config::SandboxEnvConfig;

use crate::error::{RunnerError, RunnerResult};

/// Name template prefix for self-created scratch directories.
pub const SCRATCH_DIR_PREFIX: &str = "testbox-integration-";

/// Temporary root used when the environment names none.
#[cfg(windows)]
const DEFAULT_TMP_ROOT: &str = r"C:\Windows\Temp";
#[cfg(not(windows))]
const DEFAULT_TMP_ROOT: &str = "/tmp";

/// Where the scratch directory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchOrigin {
    Managed,
    Created,
}

#[derive(Debug, Clone)]
pub struct ScratchDir {
    pub path: PathBuf,
    pub origin: ScratchOrigin,
}

fn absolute_dir(path: &Path) -> RunnerResult<PathBuf> {
    std::path::absolute(path).map_err(|source| RunnerError::DirectoryCreation {
        path: path.to_path_buf(),
        source,
    })
}

pub fn acquire_scratch_dir(cfg: &SandboxEnvConfig) -> RunnerResult<ScratchDir> {
    if let Some(managed) = &cfg.managed_tmp_dir {
        let managed = absolute_dir(managed)?;
        std::fs::create_dir_all(&managed).map_err(|source| RunnerError::DirectoryCreation {
            path: managed.clone(),
            source,
        })?;
        return Ok(ScratchDir {
            path: managed,
            origin: ScratchOrigin::Managed,
        });
    }

    let root = match &cfg.system_tmp_dir {
        Some(root) => absolute_dir(root)?,
        None => PathBuf::from(DEFAULT_TMP_ROOT),
    };
    let dir = tempfile::Builder::new()
        .prefix(SCRATCH_DIR_PREFIX)
        .tempdir_in(&root)
        .map_err(|source| RunnerError::DirectoryCreation {
            path: root.clone(),
            source,
        })?;
    // Keep the directory on disk after the run.
    Ok(ScratchDir {
        path: dir.keep(),
        origin: ScratchOrigin::Created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_dir_used_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let managed = tmp.path().join("harness");
        let cfg = SandboxEnvConfig {
            managed_tmp_dir: Some(managed.clone()),
            ..Default::default()
        };
        let scratch = acquire_scratch_dir(&cfg).unwrap();
        assert_eq!(scratch.path, managed);
        assert_eq!(scratch.origin, ScratchOrigin::Managed);
        assert!(managed.is_dir());
    }

    #[test]
    fn test_created_dir_is_kept_under_snapshot_tmp_root() {
        let root = tempfile::tempdir().unwrap();
        let cfg = SandboxEnvConfig {
            system_tmp_dir: Some(root.path().to_path_buf()),
            ..Default::default()
        };
        let scratch = acquire_scratch_dir(&cfg).unwrap();
        assert_eq!(scratch.origin, ScratchOrigin::Created);
        assert!(scratch.path.is_dir());
        assert_eq!(scratch.path.parent(), Some(root.path()));
        assert!(scratch
            .path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(SCRATCH_DIR_PREFIX));
    }

    #[test]
    fn test_relative_managed_dir_is_made_absolute() {
        let cwd = std::env::current_dir().unwrap();
        let tmp = tempfile::tempdir_in(&cwd).unwrap();
        let relative = tmp.path().strip_prefix(&cwd).unwrap().join("harness");
        assert!(relative.is_relative());

        let cfg = SandboxEnvConfig {
            managed_tmp_dir: Some(relative),
            ..Default::default()
        };
        let scratch = acquire_scratch_dir(&cfg).unwrap();
        assert!(scratch.path.is_absolute());
        assert_eq!(scratch.path, tmp.path().join("harness"));
        assert!(scratch.path.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_uncreatable_managed_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("file");
        std::fs::write(&file, "x").unwrap();
        let cfg = SandboxEnvConfig {
            managed_tmp_dir: Some(file.join("sub")),
            ..Default::default()
        };
        let err = acquire_scratch_dir(&cfg).unwrap_err();
        assert!(matches!(err, RunnerError::DirectoryCreation { .. }));
    }
}
