//! Sandboxed integration-test orchestrator.
//!
//! Reconstructs a test package inside a scratch directory, rewires its
//! `package.json` to locally built artifacts, exposes tool shims on `PATH` and
//! runs the test commands in sequence.

pub mod env;
pub mod error;
pub mod fs_util;
pub mod manifest;
pub mod process;
pub mod resolver;
pub mod runner;
pub mod scratch;
pub mod shim;
pub mod staging;

pub use error::{RunnerError, RunnerResult};
pub use runner::{run_test, RunnerServices};
