// ABOUTME: Renderer for the pydantic-ai agent framework.
// ABOUTME: Emits module-level agents and a run() that chains tasks, threading message history forward.

use std::fmt::Write;

use crate::assemble::Workflow;
use crate::model::{AgentDefinition, TaskDefinition, ToolDefinition};
use crate::render::python::{dict_literal, is_keyword, string_literal};
use crate::render::{Renderer, Target};

/// Names bound by the header and entry point.
const RESERVED: &[&str] = &[
    "Agent",
    "OpenAIModel",
    "OpenAIProvider",
    "Tool",
    "_call",
    "_run_workflow",
    "_tools",
    "asyncio",
    "history",
    "inspect",
    "load_dotenv",
    "model",
    "os",
    "result",
    "run",
];

pub struct PydanticAiRenderer;

impl Renderer for PydanticAiRenderer {
    fn target(&self) -> Target {
        Target::PydanticAi
    }

    fn is_reserved(&self, ident: &str) -> bool {
        is_keyword(ident) || RESERVED.contains(&ident)
    }

    fn file_header(&self, workflow: &Workflow<'_>) -> String {
        let mut out = String::new();
        writeln!(
            out,
            "# Generated by flowforge (target: {}). Do not edit by hand; recompile instead.",
            self.target()
        )
        .unwrap();
        out.push_str("import asyncio\nimport inspect\nimport os\n\n");
        out.push_str("from dotenv import load_dotenv\n");
        out.push_str("from pydantic_ai import Agent, Tool\n");
        out.push_str("from pydantic_ai.models.openai import OpenAIModel\n");
        out.push_str("from pydantic_ai.providers.openai import OpenAIProvider\n\n");
        writeln!(out, "import {} as _tools", workflow.tools.module()).unwrap();
        out.push('\n');
        out.push_str("load_dotenv()\n\n");
        out.push_str("model = OpenAIModel(\n");
        out.push_str("    os.getenv(\"MODEL_NAME\"),\n");
        out.push_str("    provider=OpenAIProvider(\n");
        out.push_str("        base_url=os.getenv(\"BASE_URL\"),\n");
        out.push_str("        api_key=os.getenv(\"API_KEY\"),\n");
        out.push_str("    ),\n");
        out.push_str(")\n\n\n");
        out.push_str("async def _call(fn, *args):\n");
        out.push_str("    result = fn(*args)\n");
        out.push_str("    if inspect.isawaitable(result):\n");
        out.push_str("        result = await result\n");
        out.push_str("    return result\n");
        out
    }

    fn render_tool(&self, tool: &ToolDefinition, module: &str) -> String {
        let params = tool.input_args.join(", ");
        let mut call_args = String::new();
        for arg in &tool.input_args {
            write!(call_args, ", {}", arg).unwrap();
        }

        let mut out = String::new();
        writeln!(out, "async def {}({}):", tool.name, params).unwrap();
        writeln!(out, "    \"\"\"Forwards to {}.{}.\"\"\"", module, tool.name).unwrap();
        writeln!(out, "    return await _call(_tools.{}{})", tool.name, call_args).unwrap();
        out
    }

    fn render_agent(&self, agent: &AgentDefinition) -> String {
        let tools: Vec<String> = agent
            .tools
            .iter()
            .map(|t| format!("Tool({}, takes_ctx=False)", t))
            .collect();

        let mut out = String::new();
        writeln!(out, "{} = Agent(", agent.name).unwrap();
        writeln!(out, "    model,").unwrap();
        writeln!(out, "    system_prompt={},", string_literal(&agent.system_prompt)).unwrap();
        writeln!(out, "    tools=[{}],", tools.join(", ")).unwrap();
        writeln!(out, "    model_settings={},", dict_literal(&agent.model_settings)).unwrap();
        writeln!(out, ")").unwrap();
        out
    }

    fn render_task(&self, task: &TaskDefinition) -> String {
        format!("{} = {}\n", task.name, string_literal(&task.instruction()))
    }

    /// Tasks run as a strict chain: every task after the first receives the
    /// accumulated message history of the task immediately before it.
    fn render_entry_point(&self, workflow: &Workflow<'_>) -> String {
        let mut out = String::new();
        writeln!(out, "async def _run_workflow():").unwrap();
        for (i, task) in workflow.tasks.iter().enumerate() {
            if i == 0 {
                writeln!(out, "    result = await {}.run({})", task.agent, task.name).unwrap();
            } else {
                writeln!(out, "    history = result.all_messages()").unwrap();
                writeln!(
                    out,
                    "    result = await {}.run({}, message_history=history)",
                    task.agent, task.name
                )
                .unwrap();
            }
        }
        writeln!(out, "    return {{\"message\": result.output}}").unwrap();
        out.push_str("\n\n");
        writeln!(out, "def run():").unwrap();
        writeln!(out, "    return asyncio.run(_run_workflow())").unwrap();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ToolRegistry;
    use serde_json::json;

    #[test]
    fn tool_forwards_declared_arguments() {
        let tool = ToolDefinition::new("generate_random_number", &["max_value"]);
        let out = PydanticAiRenderer.render_tool(&tool, "custom_tools");

        assert!(out.starts_with("async def generate_random_number(max_value):\n"));
        assert!(out.contains("return await _call(_tools.generate_random_number, max_value)"));
    }

    #[test]
    fn tool_without_arguments() {
        let tool = ToolDefinition::new("now", &[]);
        let out = PydanticAiRenderer.render_tool(&tool, "custom_tools");

        assert!(out.starts_with("async def now():\n"));
        assert!(out.contains("return await _call(_tools.now)\n"));
    }

    #[test]
    fn agent_binds_tools_in_declared_order() {
        let mut agent = AgentDefinition::new("scorer", "You score \"everything\"", &["b", "a"]);
        agent.model_settings.insert("temperature".to_string(), json!(0.5));
        let out = PydanticAiRenderer.render_agent(&agent);

        assert!(out.starts_with("scorer = Agent(\n    model,\n"));
        assert!(out.contains("system_prompt=\"You score \\\"everything\\\"\","));
        assert!(out.contains("tools=[Tool(b, takes_ctx=False), Tool(a, takes_ctx=False)],"));
        assert!(out.contains("model_settings={\"temperature\": 0.5},"));
    }

    #[test]
    fn task_is_instruction_string() {
        let task = TaskDefinition::new("approve_task", "Decide.", "Approved or Denied.", "approver");
        assert_eq!(
            PydanticAiRenderer.render_task(&task),
            "approve_task = \"Decide.\\nApproved or Denied.\"\n"
        );
    }

    #[test]
    fn entry_point_threads_history_linearly() {
        let tools = ToolRegistry::default();
        let agents = vec![AgentDefinition::new("scorer", "s", &[])];
        let tasks = vec![
            TaskDefinition::new("first", "a", "b", "scorer"),
            TaskDefinition::new("second", "c", "d", "scorer"),
        ];
        let workflow = Workflow::new(&tools, &agents, &tasks);
        let out = PydanticAiRenderer.render_entry_point(&workflow);

        let first = out.find("result = await scorer.run(first)").unwrap();
        let history = out.find("history = result.all_messages()").unwrap();
        let second = out
            .find("result = await scorer.run(second, message_history=history)")
            .unwrap();
        assert!(first < history && history < second);
        assert!(out.contains("return {\"message\": result.output}"));
        assert!(out.contains("def run():\n    return asyncio.run(_run_workflow())\n"));
    }

    #[test]
    fn header_imports_tool_module() {
        let tools = ToolRegistry::new("insurance_tools");
        let workflow = Workflow::new(&tools, &[], &[]);
        let out = PydanticAiRenderer.file_header(&workflow);

        assert!(out.starts_with("# Generated by flowforge (target: pydantic-ai)."));
        assert!(out.contains("import insurance_tools as _tools\n"));
        assert!(out.contains("os.getenv(\"MODEL_NAME\")"));
    }

    #[test]
    fn reserved_names() {
        assert!(PydanticAiRenderer.is_reserved("model"));
        assert!(PydanticAiRenderer.is_reserved("lambda"));
        assert!(!PydanticAiRenderer.is_reserved("approver"));
    }
}
