// ABOUTME: Shared application state for the flowforge HTTP server.
// ABOUTME: Holds the storage manager behind a lock plus the tool registry, renderer and runner.

use std::sync::Arc;

use flowforge_core::{Renderer, ToolRegistry, renderer_for};
use flowforge_runner::{SubprocessRunner, WorkflowRunner};
use flowforge_store::{ManagerError, StorageManager};
use tokio::sync::Mutex;

use crate::config::FlowforgeConfig;

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    /// Serializes every read-modify-write of the definition files and compile.
    pub storage: Mutex<StorageManager>,
    pub tools: ToolRegistry,
    pub renderer: Box<dyn Renderer>,
    pub runner: Arc<dyn WorkflowRunner>,
    /// Refuse to run an artifact that no longer matches the definitions.
    pub block_stale: bool,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        storage: StorageManager,
        tools: ToolRegistry,
        renderer: Box<dyn Renderer>,
        runner: Arc<dyn WorkflowRunner>,
    ) -> Self {
        Self {
            storage: Mutex::new(storage),
            tools,
            renderer,
            runner,
            block_stale: false,
        }
    }

    pub fn with_block_stale(mut self, block_stale: bool) -> Self {
        self.block_stale = block_stale;
        self
    }

    /// Build the production state: open the home, load the tool manifest
    /// once, and run workflows with the configured Python interpreter.
    pub fn from_config(config: &FlowforgeConfig) -> Result<Self, ManagerError> {
        let storage = StorageManager::new(config.home.clone())?;
        let tools = storage.load_tools()?;
        tracing::info!(
            "loaded {} tools from module '{}'",
            tools.tools().len(),
            tools.module()
        );

        let mut runner = SubprocessRunner::with_interpreter(&config.python)
            .with_python_path(storage.home().canonicalize()?);
        if let Some(timeout) = config.run_timeout {
            runner = runner.with_timeout(timeout);
        }

        Ok(Self::new(storage, tools, renderer_for(config.target), Arc::new(runner))
            .with_block_stale(config.block_stale))
    }
}
