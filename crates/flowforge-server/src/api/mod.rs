// ABOUTME: API module containing all HTTP handler functions for the flowforge REST API.
// ABOUTME: Organized into sub-modules for definition CRUD, the tool registry, and workflow compile/run.

pub mod definitions;
pub mod error;
pub mod tools;
pub mod workflow;

pub use error::ApiError;
