// ABOUTME: Entry point for the flowforge binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and serves the API or runs one-shot commands.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use flowforge_core::Target;
use flowforge_server::{AppState, FlowforgeConfig, create_router};
use flowforge_store::{ArtifactState, StorageManager};

#[derive(Debug, Parser)]
#[command(name = "flowforge", version, about = "Compile agent, task and tool definitions into a runnable workflow")]
struct Cli {
    /// Home directory holding definitions and compiled output (overrides FLOWFORGE_HOME).
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Agent framework to emit: pydantic-ai or crewai (overrides FLOWFORGE_TARGET).
    #[arg(long, global = true)]
    target: Option<Target>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP API.
    Serve {
        /// Socket address to bind (overrides FLOWFORGE_BIND).
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Compile the current definitions into the workflow artifact.
    Compile,
    /// Run the compiled workflow and print its result.
    Run,
    /// Report whether the compiled workflow is absent, current or stale.
    Status,
    /// Seed the home directory with a sample workflow.
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowforge=debug,tower_http=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = FlowforgeConfig::from_env()?;
    if let Some(home) = cli.home {
        config.home = home;
    }
    if let Some(target) = cli.target {
        config.target = target;
    }

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            serve(config).await
        }
        Command::Compile => compile(&config).await,
        Command::Run => run(&config).await,
        Command::Status => status(&config).await,
        Command::Init => init(&config),
    }
}

async fn serve(config: FlowforgeConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)
        .with_context(|| format!("failed to open home {}", config.home.display()))?;
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(
        "flowforge listening on {} (home {}, target {})",
        config.bind,
        config.home.display(),
        config.target
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn compile(config: &FlowforgeConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let storage = state.storage.lock().await;
    let artifact = storage.compile(state.renderer.as_ref(), &state.tools)?;
    println!("{}", serde_json::to_string_pretty(&artifact)?);
    Ok(())
}

async fn run(config: &FlowforgeConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let artifact = {
        let storage = state.storage.lock().await;
        let status = storage.artifact_status(state.renderer.as_ref(), &state.tools)?;
        match status.state {
            ArtifactState::Absent => bail!("workflow has not been compiled; run `flowforge compile` first"),
            ArtifactState::Stale if state.block_stale => {
                bail!("compiled workflow is stale; compile again before running")
            }
            ArtifactState::Stale => {
                tracing::warn!("running a stale workflow; definitions changed since the last compile")
            }
            ArtifactState::Current => {}
        }
        storage.artifact_path()
    };

    let result = state.runner.run(&artifact).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn status(config: &FlowforgeConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let storage = state.storage.lock().await;
    let status = storage.artifact_status(state.renderer.as_ref(), &state.tools)?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn init(config: &FlowforgeConfig) -> anyhow::Result<()> {
    let storage = StorageManager::new(config.home.clone())?;
    let written = storage.init_home()?;
    if written.is_empty() {
        println!("{} is already initialized", config.home.display());
    }
    for path in written {
        println!("created {}", path.display());
    }
    Ok(())
}
