// ABOUTME: Core library for flowforge, containing the definition model and the workflow compiler.
// ABOUTME: Renders agent, task and tool definitions into a runnable program for a target framework.

pub mod assemble;
pub mod model;
pub mod registry;
pub mod render;

pub use assemble::{CompileError, Workflow, assemble};
pub use model::{AgentDefinition, Definition, DefinitionKind, TaskDefinition, ToolDefinition, is_identifier};
pub use registry::{DEFAULT_TOOL_MODULE, RegistryError, ToolRegistry};
pub use render::{Renderer, Target, UnknownTarget, renderer_for};
