//! Path validation utilities.
//!
//! Staged files keep their layout relative to the test package, so every
//! declared path must live under the package root and must not climb out of it.

use anyhow::Result;
use std::path::{Component, Path, PathBuf};

/// Strip `package_root` from `declared` and return the package-relative path.
pub fn relative_to_package(declared: &Path, package_root: &Path) -> Result<PathBuf> {
    let relative = declared.strip_prefix(package_root).map_err(|_| {
        anyhow::anyhow!(
            "Declared path {} is outside test package {}",
            declared.display(),
            package_root.display()
        )
    })?;
    validate_relative(relative)
        .map_err(|e| anyhow::anyhow!("Declared path {}: {}", declared.display(), e))?;
    Ok(relative.to_path_buf())
}

/// Reject absolute, empty and parent-escaping relative paths.
pub fn validate_relative(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        anyhow::bail!("path is empty");
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => anyhow::bail!("path escapes its root via '..'"),
            Component::RootDir | Component::Prefix(_) => anyhow::bail!("path is absolute"),
        }
    }
    Ok(())
}
