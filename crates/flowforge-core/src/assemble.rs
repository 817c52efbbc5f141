// ABOUTME: Workflow assembler: validates definition references and stitches rendered fragments together.
// ABOUTME: Output order is header, tools, agents, tasks, then the run() entry point.

use std::collections::HashMap;

use thiserror::Error;

use crate::model::{AgentDefinition, DefinitionKind, TaskDefinition, is_identifier};
use crate::registry::ToolRegistry;
use crate::render::Renderer;

/// Errors that abort a compile. Each names the record at fault.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("{kind} name '{name}' is not a valid identifier")]
    InvalidIdentifier { kind: DefinitionKind, name: String },

    #[error("{kind} name '{name}' is reserved by the {target} target")]
    ReservedIdentifier {
        kind: DefinitionKind,
        name: String,
        target: String,
    },

    #[error("tool '{tool}' has invalid argument '{arg}'")]
    InvalidToolArgument { tool: String, arg: String },

    #[error("tool module '{0}' is not a valid module path")]
    InvalidModule(String),

    #[error("name '{name}' is used by both {first} and {second} definitions")]
    DuplicateIdentifier {
        name: String,
        first: DefinitionKind,
        second: DefinitionKind,
    },

    #[error("agent '{agent}' references unknown tool '{tool}'")]
    UnknownTool { agent: String, tool: String },

    #[error("task '{task}' references unknown agent '{agent}'")]
    UnknownAgent { task: String, agent: String },

    #[error("task '{task}' has unknown context task '{context}'")]
    UnknownContext { task: String, context: String },

    #[error("task '{task}' has context task '{context}' which is not declared before it")]
    ForwardContext { task: String, context: String },

    #[error("workflow has no tasks")]
    NoTasks,
}

/// Borrowed view of everything a compile reads.
#[derive(Debug, Clone, Copy)]
pub struct Workflow<'a> {
    pub tools: &'a ToolRegistry,
    pub agents: &'a [AgentDefinition],
    pub tasks: &'a [TaskDefinition],
}

impl<'a> Workflow<'a> {
    pub fn new(
        tools: &'a ToolRegistry,
        agents: &'a [AgentDefinition],
        tasks: &'a [TaskDefinition],
    ) -> Self {
        Self {
            tools,
            agents,
            tasks,
        }
    }

    pub fn agent(&self, name: &str) -> Option<&'a AgentDefinition> {
        self.agents.iter().find(|a| a.name == name)
    }
}

/// Validate the workflow and render it into one program.
///
/// Rendering is all-or-nothing: any validation failure returns before a
/// single fragment is produced.
pub fn assemble(renderer: &dyn Renderer, workflow: &Workflow<'_>) -> Result<String, CompileError> {
    validate(renderer, workflow)?;

    let module = workflow.tools.module();
    let mut fragments = Vec::with_capacity(
        2 + workflow.tools.tools().len() + workflow.agents.len() + workflow.tasks.len(),
    );

    fragments.push(renderer.file_header(workflow));
    for tool in workflow.tools.tools() {
        fragments.push(renderer.render_tool(tool, module));
    }
    for agent in workflow.agents {
        fragments.push(renderer.render_agent(agent));
    }
    for task in workflow.tasks {
        fragments.push(renderer.render_task(task));
    }
    fragments.push(renderer.render_entry_point(workflow));

    tracing::debug!(
        target_framework = %renderer.target(),
        tools = workflow.tools.tools().len(),
        agents = workflow.agents.len(),
        tasks = workflow.tasks.len(),
        "assembled workflow"
    );

    Ok(join_fragments(&fragments))
}

/// Fragments are separated by exactly one blank line and the program ends
/// with a single newline.
fn join_fragments(fragments: &[String]) -> String {
    let trimmed: Vec<&str> = fragments.iter().map(|f| f.trim_end_matches('\n')).collect();
    let mut out = trimmed.join("\n\n");
    out.push('\n');
    out
}

/// Check every invariant the renderers rely on.
pub fn validate(renderer: &dyn Renderer, workflow: &Workflow<'_>) -> Result<(), CompileError> {
    let module = workflow.tools.module();
    if module.is_empty() || !module.split('.').all(is_identifier) {
        return Err(CompileError::InvalidModule(module.to_string()));
    }

    let mut seen: HashMap<&str, DefinitionKind> = HashMap::new();
    for tool in workflow.tools.tools() {
        claim(renderer, &mut seen, DefinitionKind::Tool, &tool.name)?;
        let mut args: Vec<&str> = Vec::new();
        for arg in &tool.input_args {
            if !is_identifier(arg) || renderer.is_reserved(arg) || args.contains(&arg.as_str()) {
                return Err(CompileError::InvalidToolArgument {
                    tool: tool.name.clone(),
                    arg: arg.clone(),
                });
            }
            args.push(arg);
        }
    }
    for agent in workflow.agents {
        claim(renderer, &mut seen, DefinitionKind::Agent, &agent.name)?;
    }
    for task in workflow.tasks {
        claim(renderer, &mut seen, DefinitionKind::Task, &task.name)?;
    }

    for agent in workflow.agents {
        for tool in &agent.tools {
            if !workflow.tools.contains(tool) {
                return Err(CompileError::UnknownTool {
                    agent: agent.name.clone(),
                    tool: tool.clone(),
                });
            }
        }
    }

    for (position, task) in workflow.tasks.iter().enumerate() {
        if workflow.agent(&task.agent).is_none() {
            return Err(CompileError::UnknownAgent {
                task: task.name.clone(),
                agent: task.agent.clone(),
            });
        }
        for context in &task.context {
            match workflow.tasks.iter().position(|t| &t.name == context) {
                Some(index) if index < position => {}
                Some(_) => {
                    return Err(CompileError::ForwardContext {
                        task: task.name.clone(),
                        context: context.clone(),
                    });
                }
                None => {
                    return Err(CompileError::UnknownContext {
                        task: task.name.clone(),
                        context: context.clone(),
                    });
                }
            }
        }
    }

    if workflow.tasks.is_empty() {
        return Err(CompileError::NoTasks);
    }

    Ok(())
}

/// Record a generated name, rejecting invalid, reserved and already-used ones.
fn claim<'a>(
    renderer: &dyn Renderer,
    seen: &mut HashMap<&'a str, DefinitionKind>,
    kind: DefinitionKind,
    name: &'a str,
) -> Result<(), CompileError> {
    check_identifier(renderer, kind, name)?;
    if let Some(first) = seen.get(name) {
        return Err(CompileError::DuplicateIdentifier {
            name: name.to_string(),
            first: *first,
            second: kind,
        });
    }
    seen.insert(name, kind);
    Ok(())
}

fn check_identifier(
    renderer: &dyn Renderer,
    kind: DefinitionKind,
    name: &str,
) -> Result<(), CompileError> {
    if !is_identifier(name) {
        return Err(CompileError::InvalidIdentifier {
            kind,
            name: name.to_string(),
        });
    }
    if renderer.is_reserved(name) {
        return Err(CompileError::ReservedIdentifier {
            kind,
            name: name.to_string(),
            target: renderer.target().to_string(),
        });
    }
    Ok(())
}
