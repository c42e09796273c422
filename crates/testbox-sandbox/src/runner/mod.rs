//! Test runner: the single entry point that turns a [`TestDefinition`] into a
//! finished run.
//!
//! Steps, in order: scratch directory → tool shims → file staging (concurrent)
//! → manifest patch → commands (sequential, stop on first failure). The only
//! state carried between steps is the scratch path and the shim directory,
//! threaded explicitly through each call.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use testbox_core::config::{EnvSnapshot, SandboxEnvConfig};
use testbox_core::observability;
use testbox_core::test_def::{CommandSpec, TestDefinition, TMP_DIR_PLACEHOLDER};

use crate::env::{expand_args, prepend_path_in};
use crate::error::{RunnerError, RunnerResult};
use crate::manifest::{apply_mappings, manifest_path, read_manifest, write_manifest};
use crate::process::{InheritStdioRunner, ProcessRunner};
use crate::resolver::{
    BinaryResolver, FileResolver, WorkspaceBinaryResolver, WorkspaceFileResolver,
};
use crate::scratch::acquire_scratch_dir;
use crate::shim::{write_tool_shims, SHIM_DIR_NAME};
use crate::staging::stage_files;

#[cfg(test)]
mod tests;

/// Directory under the scratch directory holding `<TMP>` environment directories.
pub const ENV_TMP_DIR_NAME: &str = ".testbox-tmp";

/// External collaborators of a run.
pub struct RunnerServices {
    /// Locates test files, tool binaries and package artifacts named in the definition.
    pub file_resolver: Box<dyn FileResolver>,
    pub binary_resolver: Box<dyn BinaryResolver>,
    pub process_runner: Box<dyn ProcessRunner>,
}

impl RunnerServices {
    /// Workspace-relative file and binary lookup, inherited-stdio process execution.
    pub fn native(workspace_root: impl Into<PathBuf>) -> Self {
        let workspace_root = workspace_root.into();
        Self {
            file_resolver: Box::new(WorkspaceFileResolver::new(workspace_root.clone())),
            binary_resolver: Box::new(WorkspaceBinaryResolver::new(workspace_root)),
            process_runner: Box::new(InheritStdioRunner),
        }
    }
}

/// Run one integration test to completion.
///
/// `env` is the parent environment snapshot: it is the base of the command
/// environment and the only source for `${VAR}` expansion.
pub async fn run_test(
    def: &TestDefinition,
    env: &EnvSnapshot,
    services: &RunnerServices,
) -> RunnerResult<()> {
    def.validate()
        .map_err(|e| RunnerError::InvalidDefinition(format!("{e:#}")))?;

    let scratch = acquire_scratch_dir(&SandboxEnvConfig::from_snapshot(env))?;
    let scratch_dir = scratch.path.as_path();
    tracing::info!(
        scratch = %scratch_dir.display(),
        origin = ?scratch.origin,
        "Using scratch directory"
    );

    let resolver = services.file_resolver.as_ref();
    let shim_dir = setup_tool_shims(scratch_dir, def, resolver).await?;

    let staged = stage_files(
        scratch_dir,
        &def.test_package_root,
        &def.test_files,
        resolver,
    )
    .await?;
    tracing::info!(files = staged.len(), "Staged test files");

    let mappings = resolve_package_mappings(def, resolver);
    patch_manifest(scratch_dir, &mappings).await?;

    let command_env =
        compose_command_env(env, shim_dir.as_deref(), &def.environment, scratch_dir)?;

    execute_commands(&def.commands, env, &command_env, scratch_dir, services).await?;
    tracing::info!(commands = def.commands.len(), "All commands succeeded");
    Ok(())
}

/// Package mapping targets keyed by package name.
fn resolve_package_mappings(
    def: &TestDefinition,
    resolver: &dyn FileResolver,
) -> BTreeMap<String, PathBuf> {
    def.npm_package_mappings
        .iter()
        .map(|(name, m)| (name.clone(), resolver.resolve_file(&m.resolved_path)))
        .collect()
}

/// Write tool launchers. Returns the shim directory, or `None` when no tools are mapped.
async fn setup_tool_shims(
    scratch_dir: &Path,
    def: &TestDefinition,
    resolver: &dyn FileResolver,
) -> RunnerResult<Option<PathBuf>> {
    if def.tool_mappings.is_empty() {
        return Ok(None);
    }
    let shim_dir = scratch_dir.join(SHIM_DIR_NAME);
    let tools: BTreeMap<String, PathBuf> = def
        .tool_mappings
        .iter()
        .map(|(name, m)| (name.clone(), resolver.resolve_file(&m.resolved_path)))
        .collect();
    let written = write_tool_shims(&shim_dir, &tools).await?;
    tracing::info!(
        tools = tools.len(),
        launchers = written.len(),
        dir = %shim_dir.display(),
        "Tool shims ready"
    );
    Ok(Some(shim_dir))
}

/// Rewrite the staged `package.json` so mapped packages point at local artifacts.
async fn patch_manifest(
    scratch_dir: &Path,
    mappings: &BTreeMap<String, PathBuf>,
) -> RunnerResult<()> {
    let path = manifest_path(scratch_dir);
    let Some(manifest) = read_manifest(&path).await? else {
        if mappings.is_empty() {
            tracing::debug!("No package manifest staged; nothing to patch");
            return Ok(());
        }
        return Err(RunnerError::MissingManifest {
            path,
            mappings: mappings.len(),
        });
    };
    if mappings.is_empty() {
        return Ok(());
    }

    let (updated, report) = apply_mappings(&manifest, mappings);
    // Unmatched mappings are tolerated; they usually point at a typo in the definition.
    for name in &report.unused {
        tracing::warn!(
            package = %name,
            "Package mapping matched no dependency in package.json; not applied"
        );
    }
    write_manifest(&path, &updated).await?;
    tracing::info!(
        applied = report.applied.len(),
        manifest = %path.display(),
        "Patched package manifest"
    );
    Ok(())
}

/// Parent environment + shim directory on `PATH` + definition overrides.
fn compose_command_env(
    parent: &EnvSnapshot,
    shim_dir: Option<&Path>,
    overrides: &BTreeMap<String, String>,
    scratch_dir: &Path,
) -> RunnerResult<EnvSnapshot> {
    let mut env = parent.clone();
    if let Some(dir) = shim_dir {
        prepend_path_in(&mut env, dir);
    }
    for (key, value) in overrides {
        let value = if value == TMP_DIR_PLACEHOLDER {
            create_env_tmp_dir(scratch_dir, key)?
                .to_string_lossy()
                .to_string()
        } else {
            value.clone()
        };
        env.set(key.clone(), value);
    }
    Ok(env)
}

fn create_env_tmp_dir(scratch_dir: &Path, key: &str) -> RunnerResult<PathBuf> {
    let base = scratch_dir.join(ENV_TMP_DIR_NAME);
    let tmp_dir_err = |source: std::io::Error| RunnerError::EnvTmpDir {
        name: key.to_string(),
        path: base.clone(),
        source,
    };
    std::fs::create_dir_all(&base).map_err(tmp_dir_err)?;
    let dir = tempfile::Builder::new()
        .prefix(&format!("{}-", key.to_lowercase()))
        .tempdir_in(&base)
        .map_err(tmp_dir_err)?;
    Ok(dir.keep())
}

/// Run commands one after another; the first unsuccessful one aborts the rest.
async fn execute_commands(
    commands: &[CommandSpec],
    parent_env: &EnvSnapshot,
    command_env: &EnvSnapshot,
    cwd: &Path,
    services: &RunnerServices,
) -> RunnerResult<()> {
    let search_path = command_env.path().map(OsStr::new);
    let cwd_str = cwd.to_string_lossy();

    for (idx, cmd) in commands.iter().enumerate() {
        let args = expand_args(&cmd.args, parent_env, &cmd.binary)?;
        let binary = services
            .binary_resolver
            .resolve(&cmd.binary, search_path, cwd)?;

        tracing::info!(
            step = idx + 1,
            total = commands.len(),
            binary = %cmd.binary,
            resolved = %binary.display(),
            args = ?args,
            "Running command"
        );
        observability::audit_command_started(idx, &cmd.binary, &args, &cwd_str);
        let started = Instant::now();

        let success = services
            .process_runner
            .run(&binary, &args, cwd, command_env)
            .await
            .map_err(|source| RunnerError::CommandSpawn {
                binary: cmd.binary.clone(),
                source,
            })?;

        let duration_ms = started.elapsed().as_millis() as u64;
        observability::audit_command_completed(idx, &cmd.binary, success, duration_ms);
        if !success {
            return Err(RunnerError::CommandExecution {
                binary: cmd.binary.clone(),
                args,
            });
        }
        tracing::debug!(binary = %cmd.binary, duration_ms, "Command succeeded");
    }
    Ok(())
}
