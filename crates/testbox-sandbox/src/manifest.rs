//! Package manifest (`package.json`) reading and mapping application.
//!
//! Mapping application is permissive: a mapping whose package appears in no
//! dependency section is reported as unused but never fails the run.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{RunnerError, RunnerResult};

pub const MANIFEST_FILE_NAME: &str = "package.json";

/// Sections whose entries map package name → version specifier.
const DEPENDENCY_SECTIONS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "optionalDependencies",
    "peerDependencies",
];

/// Package-manager override tables. Only plain string entries are rewritten.
const OVERRIDE_SECTIONS: &[&str] = &["resolutions", "overrides"];

/// Outcome of [`apply_mappings`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingReport {
    /// `(section, package)` pairs whose value was rewritten.
    pub applied: Vec<(String, String)>,
    /// Mapped packages that matched no entry in any section.
    pub unused: Vec<String>,
}

pub fn manifest_path(package_dir: &Path) -> PathBuf {
    package_dir.join(MANIFEST_FILE_NAME)
}

/// Parse manifest bytes. Absent input (no file) is handled by [`read_manifest`].
pub fn parse_manifest(path: &Path, bytes: &[u8]) -> RunnerResult<Value> {
    serde_json::from_slice(bytes).map_err(|source| RunnerError::ManifestParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the manifest at `path`. Returns `Ok(None)` when no file exists.
pub async fn read_manifest(path: &Path) -> RunnerResult<Option<Value>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => parse_manifest(path, &bytes).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(RunnerError::ManifestRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Rewrite every dependency entry whose package name has a mapping so that it
/// points at the mapped local path. All other content is left untouched.
pub fn apply_mappings(manifest: &Value, mappings: &BTreeMap<String, PathBuf>) -> (Value, MappingReport) {
    let mut updated = manifest.clone();
    let mut report = MappingReport::default();

    if let Value::Object(root) = &mut updated {
        for section in DEPENDENCY_SECTIONS.iter().chain(OVERRIDE_SECTIONS) {
            let Some(Value::Object(entries)) = root.get_mut(*section) else {
                continue;
            };
            for (name, target) in mappings {
                let Some(entry) = entries.get_mut(name) else {
                    continue;
                };
                // Nested override objects have no single specifier to replace.
                if OVERRIDE_SECTIONS.contains(section) && !entry.is_string() {
                    continue;
                }
                *entry = Value::String(target.to_string_lossy().to_string());
                report.applied.push((section.to_string(), name.clone()));
            }
        }
    }

    report.unused = mappings
        .keys()
        .filter(|name| !report.applied.iter().any(|(_, applied)| applied == *name))
        .cloned()
        .collect();
    (updated, report)
}

/// Serialize with 2-space indentation and a trailing newline.
pub fn serialize_manifest(path: &Path, manifest: &Value) -> RunnerResult<String> {
    let mut out =
        serde_json::to_string_pretty(manifest).map_err(|source| RunnerError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;
    out.push('\n');
    Ok(out)
}

pub async fn write_manifest(path: &Path, manifest: &Value) -> RunnerResult<()> {
    let content = serialize_manifest(path, manifest)?;
    tokio::fs::write(path, content)
        .await
        .map_err(|source| RunnerError::ManifestWrite {
            path: path.to_path_buf(),
            source,
        })
}
