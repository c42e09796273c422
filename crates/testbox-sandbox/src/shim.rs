//! Tool shim generator.
//!
//! For each logical tool name, three launchers are written into one directory:
//! `<name>.sh`, `<name>.cmd` and an extensionless `<name>` identical to the `.sh`
//! variant. Putting that directory on `PATH` lets commands call tools by name.
//! Every launcher forwards all arguments and the exit status to the real binary.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{RunnerError, RunnerResult};
use crate::fs_util::write_executable_file;

/// Name of the shim directory inside the scratch directory.
pub const SHIM_DIR_NAME: &str = ".testbox-tool-bins";

/// Launcher contents for a single tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimScripts {
    pub posix: String,
    pub windows: String,
}

/// Quote `value` for a POSIX shell using single quotes.
fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Generate launcher contents for an absolute binary path.
pub fn generate_shim_scripts(binary: &Path) -> ShimScripts {
    let target = binary.to_string_lossy();
    let posix = format!("#!/usr/bin/env sh\nexec {} \"$@\"\n", sh_quote(&target));
    let windows = format!("@echo off\r\n\"{target}\" %*\r\nexit /b %ERRORLEVEL%\r\n");
    ShimScripts { posix, windows }
}

/// File names of the three launchers for `name`, in write order.
pub fn shim_file_names(name: &str) -> [String; 3] {
    [format!("{name}.sh"), format!("{name}.cmd"), name.to_string()]
}

/// Write all launchers into `shim_dir`, sequentially. Returns every written path.
///
/// `tools` maps each logical name to an already resolved, absolute binary path.
pub async fn write_tool_shims(
    shim_dir: &Path,
    tools: &BTreeMap<String, PathBuf>,
) -> RunnerResult<Vec<PathBuf>> {
    tokio::fs::create_dir_all(shim_dir)
        .await
        .map_err(|source| RunnerError::ToolShim {
            path: shim_dir.to_path_buf(),
            source,
        })?;

    let mut written = Vec::with_capacity(tools.len() * 3);
    for (name, binary) in tools {
        let scripts = generate_shim_scripts(binary);
        let [sh_name, cmd_name, default_name] = shim_file_names(name);
        for (file_name, content) in [
            (sh_name, &scripts.posix),
            (cmd_name, &scripts.windows),
            (default_name, &scripts.posix),
        ] {
            let path = shim_dir.join(file_name);
            write_executable_file(&path, content)
                .await
                .map_err(|source| RunnerError::ToolShim {
                    path: path.clone(),
                    source,
                })?;
            written.push(path);
        }
        tracing::debug!(tool = %name, binary = %binary.display(), "Wrote tool shims");
    }
    Ok(written)
}
