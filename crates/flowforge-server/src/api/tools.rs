// ABOUTME: Read-only handlers exposing the tool registry loaded from the manifest.
// ABOUTME: Tools are declared in tools.yaml and cannot be created over HTTP.

use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};

use crate::api::error::ApiError;
use crate::app_state::SharedState;

/// GET /tools - The tool module and every registered tool name.
pub async fn list_tools(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "module": state.tools.module(),
        "tools": state.tools.names(),
    }))
}

/// GET /tools/{name} - A single tool with its input arguments.
pub async fn get_tool(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let tool = state
        .tools
        .get(&name)
        .ok_or_else(|| ApiError::not_found(format!("tool '{name}' does not exist")))?;
    Ok(Json(json!({ "tool": tool })))
}
