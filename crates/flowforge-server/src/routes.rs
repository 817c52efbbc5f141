// ABOUTME: Route definitions for the flowforge HTTP API.
// ABOUTME: Assembles definition, tool and workflow routes into a single Axum Router with request tracing.

use axum::Router;
use axum::routing::{get, post};
use flowforge_core::{AgentDefinition, TaskDefinition};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    use crate::api::definitions::{create, get as fetch, list, update};

    Router::new()
        .route("/health", get(health))
        .route(
            "/agents",
            get(list::<AgentDefinition>).post(create::<AgentDefinition>),
        )
        .route(
            "/agents/{name}",
            get(fetch::<AgentDefinition>).post(update::<AgentDefinition>),
        )
        .route(
            "/tasks",
            get(list::<TaskDefinition>).post(create::<TaskDefinition>),
        )
        .route(
            "/tasks/{name}",
            get(fetch::<TaskDefinition>).post(update::<TaskDefinition>),
        )
        .route("/tools", get(api::tools::list_tools))
        .route("/tools/{name}", get(api::tools::get_tool))
        .route("/compile_workflow", post(api::workflow::compile_workflow))
        .route("/run_workflow", post(api::workflow::run_workflow))
        .route("/workflow", get(api::workflow::workflow_status))
        .route("/workflow/source", get(api::workflow::workflow_source))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
