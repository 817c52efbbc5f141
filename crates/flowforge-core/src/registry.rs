// ABOUTME: Explicit registry of the tools an agent may bind, populated from a manifest at startup.
// ABOUTME: Records the importable module the tools live in and each tool's parameter list.

use thiserror::Error;

use crate::model::ToolDefinition;

/// Module imported by generated programs when a manifest does not name one.
pub const DEFAULT_TOOL_MODULE: &str = "custom_tools";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool '{0}' is registered twice")]
    Duplicate(String),
}

/// Ordered set of known tools plus the module that implements them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRegistry {
    module: String,
    tools: Vec<ToolDefinition>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_MODULE)
    }
}

impl ToolRegistry {
    /// Create an empty registry for the given tool module.
    pub fn new(module: &str) -> Self {
        Self {
            module: module.to_string(),
            tools: Vec::new(),
        }
    }

    /// Add a tool at the end of the listing. Names must be unique.
    pub fn register(&mut self, tool: ToolDefinition) -> Result<(), RegistryError> {
        if self.contains(&tool.name) {
            return Err(RegistryError::Duplicate(tool.name));
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }
}
