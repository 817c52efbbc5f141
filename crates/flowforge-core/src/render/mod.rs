// ABOUTME: Renderer trait mapping single definitions to source fragments for a target framework.
// ABOUTME: One implementation per target; the assembler is shared across all of them.

pub mod crewai;
pub mod pydantic_ai;
pub mod python;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assemble::Workflow;
use crate::model::{AgentDefinition, TaskDefinition, ToolDefinition};

pub use crewai::CrewAiRenderer;
pub use pydantic_ai::PydanticAiRenderer;

/// Agent frameworks a workflow can be compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    PydanticAi,
    #[serde(rename = "crewai")]
    CrewAi,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::PydanticAi => "pydantic-ai",
            Target::CrewAi => "crewai",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown target '{0}' (expected pydantic-ai or crewai)")]
pub struct UnknownTarget(pub String);

impl FromStr for Target {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pydantic-ai" | "pydantic_ai" | "pydanticai" => Ok(Target::PydanticAi),
            "crewai" | "crew-ai" | "crew_ai" => Ok(Target::CrewAi),
            other => Err(UnknownTarget(other.to_string())),
        }
    }
}

/// Produces source fragments in one target framework's idiom.
///
/// Every method must be a pure function of its arguments: the same
/// definitions always render to byte-identical text, which is what makes
/// recompiling unchanged definitions a no-op.
pub trait Renderer: Send + Sync {
    fn target(&self) -> Target;

    /// Returns true if `ident` cannot be used as a generated name, either
    /// because the target language reserves it or because the header or
    /// entry point already binds it.
    fn is_reserved(&self, ident: &str) -> bool;

    /// Imports, model construction and helper bindings.
    fn file_header(&self, workflow: &Workflow<'_>) -> String;

    /// Declaration exposing `module.<tool>` under the tool's name.
    fn render_tool(&self, tool: &ToolDefinition, module: &str) -> String;

    /// Declaration constructing the agent with its prompt and tools.
    fn render_agent(&self, agent: &AgentDefinition) -> String;

    /// Declaration of the task's instruction for its bound agent.
    fn render_task(&self, task: &TaskDefinition) -> String;

    /// The `run()` entry point executing every task in declared order.
    fn render_entry_point(&self, workflow: &Workflow<'_>) -> String;
}

/// Construct the renderer for a target.
pub fn renderer_for(target: Target) -> Box<dyn Renderer> {
    match target {
        Target::PydanticAi => Box::new(PydanticAiRenderer),
        Target::CrewAi => Box::new(CrewAiRenderer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_parses_common_spellings() {
        assert_eq!("pydantic-ai".parse::<Target>().unwrap(), Target::PydanticAi);
        assert_eq!("pydantic_ai".parse::<Target>().unwrap(), Target::PydanticAi);
        assert_eq!("CrewAI".parse::<Target>().unwrap(), Target::CrewAi);
        assert!("langgraph".parse::<Target>().is_err());
    }

    #[test]
    fn renderer_for_matches_target() {
        assert_eq!(renderer_for(Target::PydanticAi).target(), Target::PydanticAi);
        assert_eq!(renderer_for(Target::CrewAi).target(), Target::CrewAi);
    }
}
