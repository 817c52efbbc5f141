// ABOUTME: Test utilities for flowforge-runner, including a stub workflow runner.
// ABOUTME: Used in server and smoke tests to simulate runs without a Python interpreter.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::runtime::{RESULT_FIELD, RunError, WorkflowRunner};

/// A stub runner that returns a pre-configured result.
///
/// Like the real runner it refuses to run when no artifact exists, so
/// callers still see `RunError::NotCompiled` before the first compile.
#[derive(Debug)]
pub struct StubRunner {
    outcome: Result<Value, String>,
    calls: AtomicUsize,
}

impl StubRunner {
    /// A stub whose runs succeed with `{"message": message}`.
    pub fn new(message: &str) -> Self {
        Self {
            outcome: Ok(json!({ RESULT_FIELD: message })),
            calls: AtomicUsize::new(0),
        }
    }

    /// A stub whose runs fail as if the program exited with status 1.
    pub fn failing(stderr: &str) -> Self {
        Self {
            outcome: Err(stderr.to_owned()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of runs attempted against an existing artifact.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkflowRunner for StubRunner {
    async fn run(&self, artifact: &Path) -> Result<Value, RunError> {
        if !artifact.is_file() {
            return Err(RunError::NotCompiled);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(value) => Ok(value.clone()),
            Err(stderr) => Err(RunError::Exit {
                code: Some(1),
                stderr: stderr.clone(),
            }),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn stub_returns_configured_message() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("compiled_workflow.py");
        std::fs::write(&path, "def run(): ...\n").unwrap();

        let runner = StubRunner::new("Approved");
        let value = runner.run(&path).await.unwrap();

        assert_eq!(value["message"], "Approved");
        assert_eq!(runner.calls(), 1);
    }

    #[tokio::test]
    async fn stub_requires_artifact() {
        let dir = TempDir::new().unwrap();
        let runner = StubRunner::new("Approved");

        let err = runner
            .run(&dir.path().join("compiled_workflow.py"))
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::NotCompiled));
        assert_eq!(runner.calls(), 0);
    }
}
