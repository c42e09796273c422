mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use testbox_core::config::{EnvSnapshot, SandboxEnvConfig};
use testbox_core::observability;
use testbox_core::test_def::load_test_definition;
use testbox_sandbox::resolver::absolutize;
use testbox_sandbox::shim::generate_shim_scripts;
use testbox_sandbox::{run_test, RunnerServices};

fn main() -> ExitCode {
    observability::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            definition,
            workspace,
        } => run(&definition, workspace),
        Commands::Shim { name, binary } => print_shim(&name, &binary),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "testbox failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(definition: &Path, workspace: Option<PathBuf>) -> Result<()> {
    let def = load_test_definition(definition)?;
    let env = EnvSnapshot::capture();
    let workspace_root = match workspace.or(SandboxEnvConfig::from_snapshot(&env).workspace_root) {
        Some(root) => std::path::absolute(&root)
            .with_context(|| format!("Invalid workspace root: {}", root.display()))?,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    tracing::debug!(
        definition = %definition.display(),
        workspace = %workspace_root.display(),
        commands = def.commands.len(),
        "Loaded test definition"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let services = RunnerServices::native(workspace_root);
    runtime.block_on(run_test(&def, &env, &services))?;
    Ok(())
}

fn print_shim(name: &str, binary: &Path) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let scripts = generate_shim_scripts(&absolutize(binary, &cwd));
    tracing::debug!(tool = %name, "Generated launcher");
    print!("{}", scripts.posix);
    Ok(())
}
