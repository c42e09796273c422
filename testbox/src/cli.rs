use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// testbox - run a package integration test inside an isolated scratch directory
#[derive(Parser, Debug)]
#[command(name = "testbox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stage the test files, patch package.json and run the test commands
    Run {
        /// Path to the test definition JSON file
        #[arg(value_name = "DEFINITION")]
        definition: PathBuf,

        /// Workspace root for relative tool, package and binary paths (default: current dir)
        #[arg(long, value_name = "DIR", env = "TESTBOX_WORKSPACE")]
        workspace: Option<PathBuf>,
    },

    /// Print the POSIX launcher that would be generated for a tool binary
    Shim {
        /// Logical tool name
        #[arg(value_name = "NAME")]
        name: String,

        /// Path to the real binary (relative paths resolve against the current dir)
        #[arg(value_name = "BINARY")]
        binary: PathBuf,
    },
}
