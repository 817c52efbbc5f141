// ABOUTME: Defines the WorkflowRunner trait that every way of executing a compiled program implements.
// ABOUTME: Also defines RunError and the parsing of a program's final JSON result line.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Key every successful run result must carry.
pub const RESULT_FIELD: &str = "message";

/// Errors that can occur while running a compiled workflow.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("workflow has not been compiled")]
    NotCompiled,

    #[error("failed to start workflow interpreter: {0}")]
    Spawn(String),

    #[error("workflow exited with status {}: {stderr}", .code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    Exit { code: Option<i32>, stderr: String },

    #[error("workflow produced invalid output: {0}")]
    InvalidOutput(String),

    #[error("workflow result has no 'message' field")]
    MissingResultField,

    #[error("workflow did not finish within {0:?}")]
    Timeout(Duration),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Executes the program at `artifact` once and returns its result payload,
/// a JSON object holding at least [`RESULT_FIELD`].
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    async fn run(&self, artifact: &Path) -> Result<Value, RunError>;

    /// Runner name for logging (e.g. "python", "stub").
    fn name(&self) -> &str;
}

/// Parse the last non-empty line of a program's stdout as its result.
/// Earlier lines are whatever the program printed while running.
pub fn parse_output(stdout: &str) -> Result<Value, RunError> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| RunError::InvalidOutput("no output".to_string()))?;

    let value: Value = serde_json::from_str(line)
        .map_err(|e| RunError::InvalidOutput(format!("{e}: {line}")))?;

    match value.as_object() {
        Some(obj) if obj.contains_key(RESULT_FIELD) => Ok(value),
        Some(_) => Err(RunError::MissingResultField),
        None => Err(RunError::InvalidOutput(format!(
            "expected a JSON object, got {line}"
        ))),
    }
}
