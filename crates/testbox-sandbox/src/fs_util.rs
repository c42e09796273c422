//! Path & permission helpers.
//!
//! Inputs coming out of a build system are commonly read-only; anything staged
//! into the sandbox must be writable so test code can mutate fixtures.

use std::io;
use std::path::Path;

/// Mode for generated launchers: rwxr-xr-x.
#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o755;

/// Owner write bit.
#[cfg(unix)]
const OWNER_WRITE: u32 = 0o200;

/// Write `content` to `path` (creating parent directories) and mark it executable.
pub async fn write_executable_file(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(EXECUTABLE_MODE))
            .await?;
    }
    Ok(())
}

/// Restore the owner write permission on `path`, keeping every other bit.
pub async fn add_write_permission(path: &Path) -> io::Result<()> {
    let mut perms = tokio::fs::metadata(path).await?.permissions();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = perms.mode();
        if mode & OWNER_WRITE != 0 {
            return Ok(());
        }
        perms.set_mode(mode | OWNER_WRITE);
    }
    #[cfg(not(unix))]
    {
        if !perms.readonly() {
            return Ok(());
        }
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
    }

    tokio::fs::set_permissions(path, perms).await
}
