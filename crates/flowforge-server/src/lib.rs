// ABOUTME: HTTP server for flowforge, exposing definition CRUD plus workflow compile and run.
// ABOUTME: Uses Axum with a shared storage manager, tool registry, renderer and runner.

pub mod api;
pub mod app_state;
pub mod config;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, FlowforgeConfig};
pub use routes::create_router;
