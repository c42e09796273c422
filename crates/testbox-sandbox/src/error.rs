//! Errors returned by a test run. Every variant is fatal to the run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type RunnerResult<T> = std::result::Result<T, RunnerError>;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Invalid test definition: {0}")]
    InvalidDefinition(String),

    #[error("Failed to create scratch directory {}: {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Failed to create temporary directory for environment variable '{name}' under {}: {source}",
        .path.display()
    )]
    EnvTmpDir {
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to stage test file {}: {source}", .path.display())]
    FileStaging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write tool shim {}: {source}", .path.display())]
    ToolShim {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "No package manifest found at {} but {mappings} package mapping(s) were requested",
        .path.display()
    )]
    MissingManifest { path: PathBuf, mappings: usize },

    #[error("Failed to read package manifest {}: {source}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse package manifest {}: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write package manifest {}: {source}", .path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to resolve binary '{binary}': {reason}")]
    BinaryResolution { binary: String, reason: String },

    #[error("Environment variable '{name}' referenced by command '{binary}' is not set")]
    UnresolvedPlaceholder { name: String, binary: String },

    #[error("Failed to spawn command '{binary}': {source}")]
    CommandSpawn {
        binary: String,
        #[source]
        source: io::Error,
    },

    #[error("Command failed: {}", command_line(.binary, .args))]
    CommandExecution { binary: String, args: Vec<String> },
}

fn command_line(binary: &str, args: &[String]) -> String {
    if args.is_empty() {
        binary.to_string()
    } else {
        format!("{} {}", binary, args.join(" "))
    }
}
