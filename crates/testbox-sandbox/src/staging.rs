//! File staging: copy every test file into the scratch directory, preserving its
//! layout relative to the test package root.
//!
//! Copies run concurrently. The first failure is reported; copies already in
//! flight are not awaited further. Files staged before a failure stay in place.

use futures_util::future::try_join_all;
use std::path::{Path, PathBuf};
use testbox_core::path_validation;
use testbox_core::test_def::StagedFile;

use crate::error::{RunnerError, RunnerResult};
use crate::fs_util::add_write_permission;
use crate::resolver::FileResolver;

/// Destination of `file` inside `scratch`.
pub fn staged_destination(
    scratch: &Path,
    package_root: &Path,
    file: &StagedFile,
) -> RunnerResult<PathBuf> {
    let relative = path_validation::relative_to_package(&file.declared_path, package_root)
        .map_err(|e| RunnerError::InvalidDefinition(e.to_string()))?;
    Ok(scratch.join(relative))
}

fn staging_err(path: &Path) -> impl FnOnce(std::io::Error) -> RunnerError {
    let path = path.to_path_buf();
    move |source| RunnerError::FileStaging { path, source }
}

async fn stage_one(source: &Path, dest: PathBuf) -> RunnerResult<PathBuf> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(staging_err(parent))?;
    }
    tokio::fs::copy(source, &dest).await.map_err(staging_err(source))?;
    add_write_permission(&dest).await.map_err(staging_err(&dest))?;
    tracing::debug!(from = %source.display(), to = %dest.display(), "Staged file");
    Ok(dest)
}

/// Stage all `files` into `scratch`. Returns the destination paths in input order.
pub async fn stage_files(
    scratch: &Path,
    package_root: &Path,
    files: &[StagedFile],
    resolver: &dyn FileResolver,
) -> RunnerResult<Vec<PathBuf>> {
    let destinations = files
        .iter()
        .map(|file| staged_destination(scratch, package_root, file))
        .collect::<RunnerResult<Vec<_>>>()?;

    let sources: Vec<PathBuf> = files
        .iter()
        .map(|file| resolver.resolve_file(&file.resolved_path))
        .collect();

    try_join_all(
        sources
            .iter()
            .zip(destinations)
            .map(|(source, dest)| stage_one(source, dest)),
    )
    .await
}
