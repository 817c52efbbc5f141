// ABOUTME: Renderer for the crewai agent framework.
// ABOUTME: Emits @tool functions, Agent and Task objects, and a run() that kicks off a sequential crew.

use std::fmt::Write;

use crate::assemble::Workflow;
use crate::model::{AgentDefinition, TaskDefinition, ToolDefinition};
use crate::render::python::{dict_literal, is_keyword, string_literal};
use crate::render::{Renderer, Target};

/// Names bound by the header and entry point, plus the builtins run() calls.
const RESERVED: &[&str] = &[
    "Agent",
    "Crew",
    "LLM",
    "Process",
    "Task",
    "_call",
    "_llm",
    "_tools",
    "asyncio",
    "crew",
    "inspect",
    "load_dotenv",
    "os",
    "result",
    "run",
    "str",
    "tool",
];

pub struct CrewAiRenderer;

impl Renderer for CrewAiRenderer {
    fn target(&self) -> Target {
        Target::CrewAi
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
        out.push_str("from crewai import Agent, Crew, LLM, Process, Task\n");
        out.push_str("from crewai.tools import tool\n");
        out.push_str("from dotenv import load_dotenv\n\n");
        writeln!(out, "import {} as _tools", workflow.tools.module()).unwrap();
        out.push('\n');
        out.push_str("load_dotenv()\n\n\n");
        out.push_str("def _llm(**settings):\n");
        out.push_str("    return LLM(\n");
        out.push_str("        model=os.getenv(\"MODEL_NAME\"),\n");
        out.push_str("        api_key=os.getenv(\"API_KEY\"),\n");
        out.push_str("        base_url=os.getenv(\"BASE_URL\"),\n");
        out.push_str("        **settings,\n");
        out.push_str("    )\n\n\n");
        out.push_str("def _call(fn, *args):\n");
        out.push_str("    result = fn(*args)\n");
        out.push_str("    if inspect.isawaitable(result):\n");
        out.push_str("        result = asyncio.run(result)\n");
        out.push_str("    return result\n");
        out
    }

    fn render_tool(&self, tool: &ToolDefinition, module: &str) -> String {
        let mut call_args = String::new();
        for arg in &tool.input_args {
            write!(call_args, ", {}", arg).unwrap();
        }

        // crewai refuses tools without a docstring; it becomes the tool description.
        let mut out = String::new();
        writeln!(out, "@tool({})", string_literal(&tool.name)).unwrap();
        writeln!(out, "def {}({}):", tool.name, tool.input_args.join(", ")).unwrap();
        writeln!(out, "    \"\"\"Forwards to {}.{}.\"\"\"", module, tool.name).unwrap();
        writeln!(out, "    return _call(_tools.{}{})", tool.name, call_args).unwrap();
        out
    }

    fn render_agent(&self, agent: &AgentDefinition) -> String {
        let goal = agent.goal.as_deref().unwrap_or(&agent.system_prompt);
        let backstory = agent.backstory.as_deref().unwrap_or(&agent.system_prompt);
        let llm = if agent.model_settings.is_empty() {
            "_llm()".to_string()
        } else {
            format!("_llm(**{})", dict_literal(&agent.model_settings))
        };

        let mut out = String::new();
        writeln!(out, "{} = Agent(", agent.name).unwrap();
        writeln!(out, "    role={},", string_literal(&agent.system_prompt)).unwrap();
        writeln!(out, "    goal={},", string_literal(goal)).unwrap();
        writeln!(out, "    backstory={},", string_literal(backstory)).unwrap();
        writeln!(out, "    tools=[{}],", agent.tools.join(", ")).unwrap();
        writeln!(out, "    llm={},", llm).unwrap();
        writeln!(out, "    verbose=True,").unwrap();
        writeln!(out, ")").unwrap();
        out
    }

    fn render_task(&self, task: &TaskDefinition) -> String {
        let mut out = String::new();
        writeln!(out, "{} = Task(", task.name).unwrap();
        writeln!(out, "    description={},", string_literal(&task.description)).unwrap();
        writeln!(
            out,
            "    expected_output={},",
            string_literal(&task.expected_output)
        )
        .unwrap();
        writeln!(out, "    agent={},", task.agent).unwrap();
        writeln!(out, "    context=[{}],", task.context.join(", ")).unwrap();
        writeln!(out, ")").unwrap();
        out
    }

    fn render_entry_point(&self, workflow: &Workflow<'_>) -> String {
        let agents: Vec<&str> = workflow.agents.iter().map(|a| a.name.as_str()).collect();
        let tasks: Vec<&str> = workflow.tasks.iter().map(|t| t.name.as_str()).collect();

        let mut out = String::new();
        writeln!(out, "def run():").unwrap();
        writeln!(out, "    crew = Crew(").unwrap();
        writeln!(out, "        agents=[{}],", agents.join(", ")).unwrap();
        writeln!(out, "        tasks=[{}],", tasks.join(", ")).unwrap();
        writeln!(out, "        process=Process.sequential,").unwrap();
        writeln!(out, "        verbose=True,").unwrap();
        writeln!(out, "    )").unwrap();
        writeln!(out, "    result = crew.kickoff()").unwrap();
        writeln!(out, "    return {{\"message\": str(result)}}").unwrap();
        out
    }
}
