// ABOUTME: Workflow handlers: compile definitions into the artifact, run it, and inspect its state.
// ABOUTME: Compile holds the storage lock; run releases it before the program executes.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use flowforge_runner::RunError;
use flowforge_store::ArtifactState;
use serde_json::{Value, json};
use ulid::Ulid;

use crate::api::error::ApiError;
use crate::app_state::SharedState;

/// Set to "true" on run responses produced by an out-of-date artifact.
pub const STALE_HEADER: &str = "x-flowforge-stale";

/// POST /compile_workflow - Render the current definitions and replace the artifact.
pub async fn compile_workflow(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let storage = state.storage.lock().await;
    let artifact = storage.compile(state.renderer.as_ref(), &state.tools)?;

    Ok(Json(json!({
        "message": "workflow compiled",
        "target": artifact.target,
        "artifact": artifact,
    })))
}

/// POST /run_workflow - Execute the most recently compiled artifact and
/// return its result payload unchanged.
pub async fn run_workflow(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let run_id = Ulid::new();

    let (artifact, artifact_state) = {
        let storage = state.storage.lock().await;
        let status = storage.artifact_status(state.renderer.as_ref(), &state.tools)?;
        (storage.artifact_path(), status.state)
    };

    let stale = match artifact_state {
        ArtifactState::Absent => return Err(RunError::NotCompiled.into()),
        ArtifactState::Stale if state.block_stale => {
            return Err(ApiError::conflict(
                "compiled workflow is stale; compile again before running",
            ));
        }
        ArtifactState::Stale => {
            tracing::warn!(%run_id, "running a stale workflow; definitions changed since the last compile");
            true
        }
        ArtifactState::Current => false,
    };

    tracing::info!(%run_id, runner = state.runner.name(), "running workflow");
    let result = state.runner.run(&artifact).await.map_err(|e| {
        tracing::warn!(%run_id, "workflow run failed: {}", e);
        ApiError::from(e)
    })?;
    tracing::info!(%run_id, "workflow finished");

    let mut response = Json(result).into_response();
    if stale {
        response
            .headers_mut()
            .insert(STALE_HEADER, HeaderValue::from_static("true"));
    }
    Ok(response)
}

/// GET /workflow - Whether the artifact is absent, current or stale.
pub async fn workflow_status(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let storage = state.storage.lock().await;
    let status = storage.artifact_status(state.renderer.as_ref(), &state.tools)?;

    Ok(Json(json!({
        "state": status.state,
        "target": state.renderer.target(),
        "artifact": status.artifact,
    })))
}

/// GET /workflow/source - The emitted program text.
pub async fn workflow_source(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let storage = state.storage.lock().await;
    let source = storage.read_artifact()?.ok_or(RunError::NotCompiled)?;

    Ok((
        [(header::CONTENT_TYPE, "text/x-python; charset=utf-8")],
        source,
    )
        .into_response())
}
