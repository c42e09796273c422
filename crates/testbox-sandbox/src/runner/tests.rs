//! Tests for the test runner pipeline, with fake collaborators.

use super::*;
use crate::resolver::WorkspaceFileResolver;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use testbox_core::test_def::{PackageMapping, StagedFile, ToolMapping};

#[derive(Debug, Clone)]
struct Invocation {
    binary: PathBuf,
    args: Vec<String>,
    cwd: PathBuf,
    env: EnvSnapshot,
}

#[derive(Clone, Default)]
struct RecordingRunner {
    calls: Arc<Mutex<Vec<Invocation>>>,
    failing: HashSet<String>,
}

impl RecordingRunner {
    fn failing_on(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(
        &self,
        binary: &Path,
        args: &[String],
        cwd: &Path,
        env: &EnvSnapshot,
    ) -> std::io::Result<bool> {
        self.calls.lock().unwrap().push(Invocation {
            binary: binary.to_path_buf(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
            env: env.clone(),
        });
        let name = binary
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(!self.failing.contains(&name))
    }
}

/// Resolves every name to `/fake/bin/<name>` unless listed as unknown.
#[derive(Default)]
struct FakeResolver {
    unknown: HashSet<String>,
}

impl BinaryResolver for FakeResolver {
    fn resolve(&self, name: &str, _search_path: Option<&OsStr>, _cwd: &Path) -> RunnerResult<PathBuf> {
        if self.unknown.contains(name) {
            return Err(RunnerError::BinaryResolution {
                binary: name.to_string(),
                reason: "not found".to_string(),
            });
        }
        Ok(PathBuf::from("/fake/bin").join(name))
    }
}

struct Fixture {
    _tmp: tempfile::TempDir,
    out: PathBuf,
    scratch: PathBuf,
    env: EnvSnapshot,
}

impl Fixture {
    /// Build output dir with `files` (relative path, content), and a managed scratch dir.
    fn new(files: &[(&str, &str)]) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        for (rel, content) in files {
            let path = out.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        std::fs::create_dir_all(&out).unwrap();
        let scratch = tmp.path().join("scratch");
        let env = EnvSnapshot::from_pairs([
            ("PATH".to_string(), "/usr/bin".to_string()),
            ("TEST_TMPDIR".to_string(), scratch.to_string_lossy().to_string()),
            ("FOO".to_string(), "bar".to_string()),
        ]);
        Self {
            _tmp: tmp,
            out,
            scratch,
            env,
        }
    }

    fn staged(&self, rel: &str) -> StagedFile {
        StagedFile {
            declared_path: PathBuf::from("pkg/test").join(rel),
            resolved_path: self.out.join(rel),
        }
    }

    fn definition(&self, files: &[&str], commands: Vec<CommandSpec>) -> TestDefinition {
        TestDefinition {
            test_files: files.iter().map(|f| self.staged(f)).collect(),
            test_package_root: PathBuf::from("pkg/test"),
            commands,
            ..Default::default()
        }
    }

    fn services(&self, runner: &RecordingRunner) -> RunnerServices {
        self.services_with(runner, FakeResolver::default())
    }

    fn services_with(&self, runner: &RecordingRunner, resolver: FakeResolver) -> RunnerServices {
        RunnerServices {
            file_resolver: Box::new(WorkspaceFileResolver::new(self.out.clone())),
            binary_resolver: Box::new(resolver),
            process_runner: Box::new(runner.clone()),
        }
    }
}

fn mapping(path: &str) -> PackageMapping {
    PackageMapping {
        resolved_path: PathBuf::from(path),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_end_to_end_scenario() {
    let fx = Fixture::new(&[
        ("src/index.ts", "console.log('hi');\n"),
        (
            "package.json",
            r#"{"name": "demo", "scripts": {"test": "node index.js"}, "dependencies": {"@scope/lib": "^1.0.0"}}"#,
        ),
        ("yarn.js", "// yarn\n"),
    ]);
    let mut def = fx.definition(
        &["src/index.ts", "package.json"],
        vec![CommandSpec::new("node", &["index.js"])],
    );
    def.npm_package_mappings
        .insert("@scope/lib".to_string(), mapping("/out/lib"));
    def.tool_mappings.insert(
        "yarn".to_string(),
        ToolMapping {
            resolved_path: PathBuf::from("yarn.js"),
        },
    );

    let runner = RecordingRunner::default();
    run_test(&def, &fx.env, &fx.services(&runner)).await.unwrap();

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(fx.scratch.join("package.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["dependencies"]["@scope/lib"], "/out/lib");
    assert_eq!(manifest["scripts"]["test"], "node index.js");
    assert!(fx.scratch.join("src/index.ts").is_file());

    let shim_dir = fx.scratch.join(SHIM_DIR_NAME);
    let shim = std::fs::read_to_string(shim_dir.join("yarn")).unwrap();
    assert!(shim.contains(&fx.out.join("yarn.js").to_string_lossy().to_string()));

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].binary, PathBuf::from("/fake/bin/node"));
    assert_eq!(calls[0].args, vec!["index.js"]);
    assert_eq!(calls[0].cwd, fx.scratch);
    assert_eq!(
        calls[0].env.get("PATH").unwrap(),
        format!("{}:/usr/bin", shim_dir.display())
    );
}

#[tokio::test]
async fn test_stops_at_first_failing_command() {
    let fx = Fixture::new(&[]);
    let def = fx.definition(
        &[],
        vec![
            CommandSpec::new("a", &[]),
            CommandSpec::new("b", &["--flag", "${FOO}"]),
            CommandSpec::new("c", &[]),
        ],
    );
    let runner = RecordingRunner::failing_on(&["b"]);
    let err = run_test(&def, &fx.env, &fx.services(&runner))
        .await
        .unwrap_err();

    match err {
        RunnerError::CommandExecution { binary, args } => {
            assert_eq!(binary, "b");
            assert_eq!(args, vec!["--flag", "bar"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    let invoked: Vec<PathBuf> = runner.calls().into_iter().map(|c| c.binary).collect();
    assert_eq!(
        invoked,
        vec![PathBuf::from("/fake/bin/a"), PathBuf::from("/fake/bin/b")]
    );
}

#[tokio::test]
async fn test_missing_manifest_with_mappings_is_fatal() {
    let fx = Fixture::new(&[("src/index.ts", "")]);
    let mut def = fx.definition(&["src/index.ts"], vec![CommandSpec::new("node", &[])]);
    def.npm_package_mappings
        .insert("@scope/lib".to_string(), mapping("/out/lib"));

    let runner = RecordingRunner::default();
    let err = run_test(&def, &fx.env, &fx.services(&runner))
        .await
        .unwrap_err();
    match err {
        RunnerError::MissingManifest { path, mappings } => {
            assert_eq!(path, fx.scratch.join("package.json"));
            assert_eq!(mappings, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_missing_manifest_without_mappings_is_noop() {
    let fx = Fixture::new(&[("src/index.ts", "")]);
    let def = fx.definition(&["src/index.ts"], vec![CommandSpec::new("node", &[])]);
    let runner = RecordingRunner::default();
    run_test(&def, &fx.env, &fx.services(&runner)).await.unwrap();
    assert!(!fx.scratch.join("package.json").exists());
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn test_unmatched_mapping_is_not_fatal() {
    let fx = Fixture::new(&[("package.json", r#"{"dependencies": {"a": "1.0.0"}}"#)]);
    let mut def = fx.definition(&["package.json"], vec![CommandSpec::new("node", &[])]);
    def.npm_package_mappings
        .insert("typo".to_string(), mapping("/out/typo"));

    let runner = RecordingRunner::default();
    run_test(&def, &fx.env, &fx.services(&runner)).await.unwrap();
    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(fx.scratch.join("package.json")).unwrap())
            .unwrap();
    assert_eq!(manifest, serde_json::json!({"dependencies": {"a": "1.0.0"}}));
}

#[tokio::test]
async fn test_placeholders_expand_from_parent_env() {
    let fx = Fixture::new(&[]);
    let def = fx.definition(&[], vec![CommandSpec::new("echo", &["${FOO}", "x${FOO}y"])]);
    let runner = RecordingRunner::default();
    run_test(&def, &fx.env, &fx.services(&runner)).await.unwrap();
    assert_eq!(runner.calls()[0].args, vec!["bar", "xbary"]);
}

#[tokio::test]
async fn test_placeholders_ignore_definition_environment() {
    let fx = Fixture::new(&[]);
    let mut def = fx.definition(&[], vec![CommandSpec::new("echo", &["${ONLY_IN_DEF}"])]);
    def.environment
        .insert("ONLY_IN_DEF".to_string(), "value".to_string());
    let runner = RecordingRunner::default();
    let err = run_test(&def, &fx.env, &fx.services(&runner))
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::UnresolvedPlaceholder { ref name, .. } if name == "ONLY_IN_DEF"));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_environment_overrides_and_tmp_dirs() {
    let fx = Fixture::new(&[]);
    let mut def = fx.definition(&[], vec![CommandSpec::new("node", &[])]);
    def.environment.insert("HOME".to_string(), "<TMP>".to_string());
    def.environment.insert("CI".to_string(), "1".to_string());
    let runner = RecordingRunner::default();
    run_test(&def, &fx.env, &fx.services(&runner)).await.unwrap();

    let env = &runner.calls()[0].env;
    assert_eq!(env.get("CI"), Some("1"));
    let home = PathBuf::from(env.get("HOME").unwrap());
    assert!(home.is_dir());
    assert!(home.starts_with(fx.scratch.join(ENV_TMP_DIR_NAME)));
}

#[tokio::test]
async fn test_no_tools_leaves_path_untouched() {
    let fx = Fixture::new(&[]);
    let def = fx.definition(&[], vec![CommandSpec::new("node", &[])]);
    let runner = RecordingRunner::default();
    run_test(&def, &fx.env, &fx.services(&runner)).await.unwrap();
    assert_eq!(runner.calls()[0].env.get("PATH"), Some("/usr/bin"));
    assert!(!fx.scratch.join(SHIM_DIR_NAME).exists());
}

#[tokio::test]
async fn test_binary_resolution_error_surfaces_unchanged() {
    let fx = Fixture::new(&[]);
    let def = fx.definition(
        &[],
        vec![CommandSpec::new("ok", &[]), CommandSpec::new("ghost", &[])],
    );
    let runner = RecordingRunner::default();
    let resolver = FakeResolver {
        unknown: ["ghost".to_string()].into_iter().collect(),
    };
    let err = run_test(&def, &fx.env, &fx.services_with(&runner, resolver))
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::BinaryResolution { ref binary, .. } if binary == "ghost"));
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn test_staging_failure_aborts_before_commands() {
    let fx = Fixture::new(&[]);
    let def = fx.definition(&["missing.txt"], vec![CommandSpec::new("node", &[])]);
    let runner = RecordingRunner::default();
    let err = run_test(&def, &fx.env, &fx.services(&runner))
        .await
        .unwrap_err();
    match err {
        RunnerError::FileStaging { path, .. } => assert_eq!(path, fx.out.join("missing.txt")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_definition_rejected() {
    let fx = Fixture::new(&[]);
    let def = fx.definition(&[], Vec::new());
    let runner = RecordingRunner::default();
    let err = run_test(&def, &fx.env, &fx.services(&runner))
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::InvalidDefinition(_)));
    assert!(!fx.scratch.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_relative_roots_produce_absolute_paths() {
    let cwd = std::env::current_dir().unwrap();
    let tmp = tempfile::tempdir_in(&cwd).unwrap();
    let abs = tmp.path().to_path_buf();
    let rel = abs.strip_prefix(&cwd).unwrap().to_path_buf();

    let out = abs.join("ws/out");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("package.json"), r#"{"dependencies": {"lib": "1.0.0"}}"#).unwrap();
    std::fs::write(out.join("yarn.js"), "// yarn\n").unwrap();

    let mut def = TestDefinition {
        test_files: vec![StagedFile {
            declared_path: PathBuf::from("pkg/test/package.json"),
            resolved_path: PathBuf::from("out/package.json"),
        }],
        test_package_root: PathBuf::from("pkg/test"),
        commands: vec![CommandSpec::new("yarn", &["test"])],
        ..Default::default()
    };
    def.tool_mappings.insert(
        "yarn".to_string(),
        ToolMapping {
            resolved_path: PathBuf::from("out/yarn.js"),
        },
    );
    def.npm_package_mappings
        .insert("lib".to_string(), mapping("out/lib"));

    let env = EnvSnapshot::from_pairs([
        ("PATH".to_string(), "/usr/bin".to_string()),
        (
            "TEST_TMPDIR".to_string(),
            rel.join("scratch").to_string_lossy().to_string(),
        ),
    ]);
    let runner = RecordingRunner::default();
    let services = RunnerServices {
        file_resolver: Box::new(WorkspaceFileResolver::new(rel.join("ws"))),
        binary_resolver: Box::new(FakeResolver::default()),
        process_runner: Box::new(runner.clone()),
    };
    run_test(&def, &env, &services).await.unwrap();

    let scratch = abs.join("scratch");
    let shim_dir = scratch.join(SHIM_DIR_NAME);
    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(scratch.join("package.json")).unwrap())
            .unwrap();
    assert_eq!(
        manifest["dependencies"]["lib"],
        abs.join("ws/out/lib").to_string_lossy().to_string()
    );

    let shim = std::fs::read_to_string(shim_dir.join("yarn")).unwrap();
    assert!(shim.contains(&format!("exec '{}'", abs.join("ws/out/yarn.js").display())));

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].cwd.is_absolute());
    assert_eq!(calls[0].cwd, scratch);
    assert_eq!(
        calls[0].env.get("PATH").unwrap(),
        format!("{}:/usr/bin", shim_dir.display())
    );
}

#[tokio::test]
async fn test_env_tmp_dir_failure_names_variable() {
    let fx = Fixture::new(&[]);
    std::fs::create_dir_all(&fx.scratch).unwrap();
    std::fs::write(fx.scratch.join(ENV_TMP_DIR_NAME), "not a directory").unwrap();

    let mut def = fx.definition(&[], vec![CommandSpec::new("node", &[])]);
    def.environment.insert("HOME".to_string(), "<TMP>".to_string());
    let runner = RecordingRunner::default();
    let err = run_test(&def, &fx.env, &fx.services(&runner))
        .await
        .unwrap_err();
    match err {
        RunnerError::EnvTmpDir { name, path, .. } => {
            assert_eq!(name, "HOME");
            assert_eq!(path, fx.scratch.join(ENV_TMP_DIR_NAME));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(runner.calls().is_empty());
}
