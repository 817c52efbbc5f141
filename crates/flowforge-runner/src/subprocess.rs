// ABOUTME: Runs a compiled workflow program in a child Python interpreter via tokio::process.
// ABOUTME: A small driver imports the program by path, calls run(), and prints the result as JSON.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use crate::runtime::{RunError, WorkflowRunner, parse_output};

/// Driver passed to `python -c`. The artifact path arrives as `sys.argv[1]`.
pub const PYTHON_DRIVER: &str = r#"import asyncio, importlib.util, inspect, json, sys
spec = importlib.util.spec_from_file_location("compiled_workflow", sys.argv[1])
module = importlib.util.module_from_spec(spec)
spec.loader.exec_module(module)
result = module.run()
if inspect.isawaitable(result):
    result = asyncio.run(result)
print(json.dumps(result, default=str))
"#;

const DEFAULT_PYTHON: &str = "python3";

/// Executes `<program> <args..> <artifact>` and parses the final stdout line.
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    program: String,
    args: Vec<String>,
    python_path: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl SubprocessRunner {
    /// A runner using `python3` and the built-in driver.
    pub fn python() -> Self {
        Self::with_interpreter(DEFAULT_PYTHON)
    }

    /// A runner using the given interpreter and the built-in driver.
    pub fn with_interpreter(interpreter: &str) -> Self {
        Self::new(interpreter, vec!["-c".to_string(), PYTHON_DRIVER.to_string()])
    }

    /// A runner for an arbitrary command. The artifact path is appended as
    /// the final argument.
    pub fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
            python_path: None,
            timeout: None,
        }
    }

    /// Prepend `dir` to the child's PYTHONPATH so the tool module resolves.
    pub fn with_python_path(mut self, dir: PathBuf) -> Self {
        self.python_path = Some(dir);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn build_command(&self, artifact: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(artifact);

        if let Some(dir) = artifact.parent()
            && !dir.as_os_str().is_empty()
        {
            cmd.current_dir(dir);
        }

        if let Some(python_path) = &self.python_path {
            cmd.env("PYTHONPATH", prepend_path(python_path));
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }
}

fn prepend_path(dir: &Path) -> OsString {
    let mut paths = vec![dir.to_path_buf()];
    if let Some(existing) = env::var_os("PYTHONPATH") {
        paths.extend(env::split_paths(&existing));
    }
    env::join_paths(paths).unwrap_or_else(|_| dir.as_os_str().to_os_string())
}

#[async_trait]
impl WorkflowRunner for SubprocessRunner {
    async fn run(&self, artifact: &Path) -> Result<Value, RunError> {
        if !artifact.is_file() {
            return Err(RunError::NotCompiled);
        }
        // The child runs in the artifact's directory, so hand it an absolute path.
        let artifact = artifact.canonicalize()?;

        tracing::debug!(
            program = %self.program,
            artifact = %artifact.display(),
            "spawning workflow"
        );
        let child = self
            .build_command(&artifact)
            .spawn()
            .map_err(|e| RunError::Spawn(format!("{}: {e}", self.program)))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| RunError::Timeout(limit))??,
            None => child.wait_with_output().await?,
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(RunError::Exit {
                code: output.status.code(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            tracing::debug!("workflow stderr: {}", stderr);
        }

        parse_output(&String::from_utf8_lossy(&output.stdout))
    }

    fn name(&self) -> &str {
        "subprocess"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// A runner whose "interpreter" is a shell script. With `sh -c script
    /// artifact`, the artifact path is `$0`.
    fn shell(script: &str) -> SubprocessRunner {
        SubprocessRunner::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    fn artifact(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("compiled_workflow.py");
        fs::write(&path, contents).unwrap();
        path
    }

    fn python_available() -> bool {
        std::process::Command::new("python3")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    #[tokio::test]
    async fn python_driver_calls_run() {
        if !python_available() {
            eprintln!("python3 not found; skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let path = artifact(
            &dir,
            "print(\"starting\")\n\n\ndef run():\n    return {\"message\": \"ok\"}\n",
        );

        let value = SubprocessRunner::python().run(&path).await.unwrap();

        assert_eq!(value, serde_json::json!({"message": "ok"}));
    }

    #[tokio::test]
    async fn python_driver_awaits_async_run() {
        if !python_available() {
            eprintln!("python3 not found; skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let path = artifact(&dir, "async def run():\n    return {\"message\": 42}\n");

        let value = SubprocessRunner::python().run(&path).await.unwrap();

        assert_eq!(value["message"], 42);
    }

    #[tokio::test]
    async fn python_driver_reports_import_errors() {
        if !python_available() {
            eprintln!("python3 not found; skipping");
            return;
        }
        let dir = TempDir::new().unwrap();
        let path = artifact(&dir, "import flowforge_missing_module\n\n\ndef run():\n    return {}\n");

        let err = SubprocessRunner::python().run(&path).await.unwrap_err();

        assert!(matches!(err, RunError::Exit { ref stderr, .. } if stderr.contains("flowforge_missing_module")));
    }

    #[tokio::test]
    async fn returns_payload_from_last_line() {
        let dir = TempDir::new().unwrap();
        let path = artifact(&dir, "{\"message\": \"Approved\"}\n");

        let value = shell("echo running; cat \"$0\"").run(&path).await.unwrap();

        assert_eq!(value, serde_json::json!({"message": "Approved"}));
    }

    #[tokio::test]
    async fn runs_in_artifact_directory() {
        let dir = TempDir::new().unwrap();
        let path = artifact(&dir, "");
        let expected = dir.path().canonicalize().unwrap();

        let value = shell("printf '{\"message\": \"%s\"}\\n' \"$(pwd -P)\"")
            .run(&path)
            .await
            .unwrap();

        assert_eq!(value["message"], expected.display().to_string());
    }

    #[tokio::test]
    async fn python_path_is_prepended() {
        let dir = TempDir::new().unwrap();
        let path = artifact(&dir, "");
        let home = dir.path().join("home");

        let value = shell("printf '{\"message\": \"%s\"}\\n' \"$PYTHONPATH\"")
            .with_python_path(home.clone())
            .run(&path)
            .await
            .unwrap();

        let message = value["message"].as_str().unwrap();
        assert!(message.starts_with(&home.display().to_string()));
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let dir = TempDir::new().unwrap();
        let path = artifact(&dir, "");

        let err = shell("echo 'NameError: scorer' >&2; exit 3")
            .run(&path)
            .await
            .unwrap_err();

        match err {
            RunError::Exit { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "NameError: scorer");
            }
            other => panic!("expected Exit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_output_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = artifact(&dir, "");

        let err = shell("echo done").run(&path).await.unwrap_err();

        assert!(matches!(err, RunError::InvalidOutput(_)));
    }

    #[tokio::test]
    async fn missing_result_field_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = artifact(&dir, "{\"output\": \"Approved\"}\n");

        let err = shell("cat \"$0\"").run(&path).await.unwrap_err();

        assert!(matches!(err, RunError::MissingResultField));
    }

    #[tokio::test]
    async fn missing_artifact_is_not_compiled() {
        let dir = TempDir::new().unwrap();

        let err = shell("cat \"$0\"")
            .run(&dir.path().join("compiled_workflow.py"))
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::NotCompiled));
    }

    #[tokio::test]
    async fn unknown_interpreter_fails_to_spawn() {
        let dir = TempDir::new().unwrap();
        let path = artifact(&dir, "");

        let err = SubprocessRunner::with_interpreter("flowforge-no-such-python")
            .run(&path)
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Spawn(_)));
    }

    #[tokio::test]
    async fn slow_workflow_times_out() {
        let dir = TempDir::new().unwrap();
        let path = artifact(&dir, "");

        let err = shell("sleep 5")
            .with_timeout(Duration::from_millis(100))
            .run(&path)
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Timeout(d) if d == Duration::from_millis(100)));
    }
}
