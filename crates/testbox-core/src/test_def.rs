//! Test definition: the frozen input record of a single integration test run.
//!
//! Loaded from a JSON file with camelCase keys, e.g.
//!
//! ```json
//! {
//!   "testPackageRoot": "packages/demo/test",
//!   "testFiles": [{ "declaredPath": "packages/demo/test/src/index.ts", "resolvedPath": "/out/src/index.ts" }],
//!   "toolMappings": { "yarn": { "resolvedPath": "/out/yarn.js" } },
//!   "npmPackageMappings": { "@scope/lib": { "resolvedPath": "/out/lib" } },
//!   "commands": [["node", "index.js"], { "binary": "yarn", "args": ["test"] }]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::path_validation;

/// Placeholder value in `environment` that is replaced with a fresh temporary directory.
pub const TMP_DIR_PLACEHOLDER: &str = "<TMP>";

/// One input file to copy into the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedFile {
    /// Path within the source tree; staged relative to the test package root.
    pub declared_path: PathBuf,
    /// Real filesystem location of the file contents.
    pub resolved_path: PathBuf,
}

/// Logical tool name → real binary. The name is the map key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMapping {
    pub resolved_path: PathBuf,
}

/// Package name → locally built artifact. The package name is the map key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMapping {
    pub resolved_path: PathBuf,
}

/// One command invocation. Deserializes from `{"binary", "args"}` or a bare argv array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCommand")]
pub struct CommandSpec {
    pub binary: String,
    pub args: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCommand {
    Argv(Vec<String>),
    Spec {
        binary: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl TryFrom<RawCommand> for CommandSpec {
    type Error = String;

    fn try_from(raw: RawCommand) -> Result<Self, Self::Error> {
        match raw {
            RawCommand::Argv(mut argv) => {
                if argv.is_empty() {
                    return Err("command array must not be empty".to_string());
                }
                let binary = argv.remove(0);
                Ok(Self { binary, args: argv })
            }
            RawCommand::Spec { binary, args } => Ok(Self { binary, args }),
        }
    }
}

impl CommandSpec {
    pub fn new(binary: impl Into<String>, args: &[&str]) -> Self {
        Self {
            binary: binary.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDefinition {
    #[serde(default)]
    pub test_files: Vec<StagedFile>,
    #[serde(default)]
    pub test_package_root: PathBuf,
    #[serde(default)]
    pub tool_mappings: BTreeMap<String, ToolMapping>,
    #[serde(default)]
    pub npm_package_mappings: BTreeMap<String, PackageMapping>,
    pub commands: Vec<CommandSpec>,
    /// Extra variables for the commands. A value of `<TMP>` becomes a fresh directory.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

impl TestDefinition {
    /// Check the invariants the orchestrator relies on.
    pub fn validate(&self) -> Result<()> {
        if self.commands.is_empty() {
            anyhow::bail!("Test definition has no commands");
        }
        for (idx, cmd) in self.commands.iter().enumerate() {
            if cmd.binary.trim().is_empty() {
                anyhow::bail!("Command #{} has an empty binary", idx + 1);
            }
        }
        for file in &self.test_files {
            path_validation::relative_to_package(&file.declared_path, &self.test_package_root)?;
        }
        for name in self.tool_mappings.keys() {
            if matches!(name.as_str(), "" | "." | "..") || name.contains(['/', '\\']) {
                anyhow::bail!("Invalid tool name '{}'", name);
            }
        }
        Ok(())
    }
}

/// Read and parse a test definition file.
pub fn load_test_definition(path: &Path) -> Result<TestDefinition> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read test definition: {}", path.display()))?;
    let def: TestDefinition = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse test definition JSON: {}", path.display()))?;
    Ok(def)
}
