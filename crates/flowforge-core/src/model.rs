// ABOUTME: Defines the agent, task and tool definition records that a workflow is compiled from.
// ABOUTME: Also provides the Definition trait the store uses to persist records generically.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The three kinds of definition a workflow is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Agent,
    Task,
    Tool,
}

impl DefinitionKind {
    /// Singular lowercase name, used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionKind::Agent => "agent",
            DefinitionKind::Task => "task",
            DefinitionKind::Tool => "tool",
        }
    }

    /// Plural name, used as the listing key in API responses.
    pub fn plural(&self) -> &'static str {
        match self {
            DefinitionKind::Agent => "agents",
            DefinitionKind::Task => "tasks",
            DefinitionKind::Tool => "tools",
        }
    }

    /// Name of the YAML file backing this kind inside the home directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            DefinitionKind::Agent => "agents.yaml",
            DefinitionKind::Task => "tasks.yaml",
            DefinitionKind::Tool => "tools.yaml",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that the definition store can persist under its name.
pub trait Definition: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: DefinitionKind;

    fn name(&self) -> &str;
}

/// An agent: a model bound to instructions and an ordered set of tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    #[serde(alias = "role")]
    pub system_prompt: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backstory: Option<String>,
    /// Extra model parameters (temperature, max_tokens, ...). Sorted by key
    /// so rendering stays deterministic.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub model_settings: BTreeMap<String, serde_json::Value>,
}

impl AgentDefinition {
    /// Create an agent with the required fields and no optional extras.
    pub fn new(name: &str, system_prompt: &str, tools: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            system_prompt: system_prompt.to_string(),
            tools: tools.iter().map(|t| t.to_string()).collect(),
            goal: None,
            backstory: None,
            model_settings: BTreeMap::new(),
        }
    }
}

impl Definition for AgentDefinition {
    const KIND: DefinitionKind = DefinitionKind::Agent;

    fn name(&self) -> &str {
        &self.name
    }
}

/// A unit of work assigned to one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub name: String,
    pub description: String,
    pub expected_output: String,
    pub agent: String,
    /// Earlier tasks whose output this task builds on.
    #[serde(default)]
    pub context: Vec<String>,
}

impl TaskDefinition {
    /// Create a task with an empty context.
    pub fn new(name: &str, description: &str, expected_output: &str, agent: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            expected_output: expected_output.to_string(),
            agent: agent.to_string(),
            context: Vec::new(),
        }
    }

    /// The instruction handed to the bound agent: description, then expected output.
    pub fn instruction(&self) -> String {
        format!("{}\n{}", self.description, self.expected_output)
    }
}

impl Definition for TaskDefinition {
    const KIND: DefinitionKind = DefinitionKind::Task;

    fn name(&self) -> &str {
        &self.name
    }
}

/// A callable exposed by the external tool module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub input_args: Vec<String>,
}

impl ToolDefinition {
    pub fn new(name: &str, input_args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            input_args: input_args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Returns true if `name` is usable as a generated variable or function name:
/// an ASCII letter or underscore followed by letters, digits or underscores.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
