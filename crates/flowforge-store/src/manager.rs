// ABOUTME: High-level storage manager for the flowforge home directory layout.
// ABOUTME: Compiles definitions into the fixed artifact location and reports whether that artifact is stale.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flowforge_core::{
    AgentDefinition, CompileError, DefinitionKind, Renderer, Target, TaskDefinition,
    ToolDefinition, ToolRegistry, Workflow, assemble,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::atomic::write_atomic;
use crate::definitions::{DefinitionStore, StoreError};
use crate::manifest::{ManifestError, encode_manifest, load_manifest};

/// Subdirectory of the home holding compiled output.
pub const COMPILED_DIR: &str = "compiled";
/// Fixed file name of the emitted program.
pub const ARTIFACT_FILE: &str = "compiled_workflow.py";
/// Sidecar describing the last successful compile.
pub const ARTIFACT_META_FILE: &str = "compiled_workflow.json";
/// File name of the sample tool module written by `init_home`.
pub const SAMPLE_TOOL_MODULE_FILE: &str = "custom_tools.py";

const SAMPLE_TOOL_MODULE: &str = r#"import random


async def generate_random_number(max_value: int) -> int:
    return random.randint(0, max_value)


async def is_approved(score: int) -> str:
    return "Approved" if score > 50 else "Denied"
"#;

/// Errors that can occur during storage management operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("tool manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Metadata recorded alongside the emitted program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledArtifact {
    pub target: Target,
    pub path: PathBuf,
    pub compiled_at: DateTime<Utc>,
    pub bytes: usize,
}

/// Lifecycle of the emitted program: absent until the first compile, then
/// current or stale depending on whether the definitions still render to
/// the same text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactState {
    Absent,
    Current,
    Stale,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactStatus {
    pub state: ArtifactState,
    pub artifact: Option<CompiledArtifact>,
}

/// Manages the flowforge home directory:
///
/// ```text
/// <home>/agents.yaml
/// <home>/tasks.yaml
/// <home>/tools.yaml
/// <home>/compiled/compiled_workflow.py
/// <home>/compiled/compiled_workflow.json
/// ```
#[derive(Debug, Clone)]
pub struct StorageManager {
    home: PathBuf,
    definitions: DefinitionStore,
}

impl StorageManager {
    /// Create a StorageManager rooted at `home`, creating the home and
    /// compiled directories if they do not exist.
    pub fn new(home: PathBuf) -> Result<Self, ManagerError> {
        fs::create_dir_all(home.join(COMPILED_DIR))?;
        Ok(Self {
            definitions: DefinitionStore::new(home.clone()),
            home,
        })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn definitions(&self) -> &DefinitionStore {
        &self.definitions
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.home.join(DefinitionKind::Tool.file_name())
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.home.join(COMPILED_DIR).join(ARTIFACT_FILE)
    }

    fn meta_path(&self) -> PathBuf {
        self.home.join(COMPILED_DIR).join(ARTIFACT_META_FILE)
    }

    pub fn load_tools(&self) -> Result<ToolRegistry, ManagerError> {
        Ok(load_manifest(&self.manifest_path())?)
    }

    /// Render the current definitions without writing anything.
    pub fn render(&self, renderer: &dyn Renderer, tools: &ToolRegistry) -> Result<String, ManagerError> {
        let agents = self.definitions.load::<AgentDefinition>()?;
        let tasks = self.definitions.load::<TaskDefinition>()?;
        let workflow = Workflow::new(tools, &agents, &tasks);
        Ok(assemble(renderer, &workflow)?)
    }

    /// Regenerate the program from the current definitions and replace the
    /// artifact. On any error the previous artifact is left as it was.
    pub fn compile(
        &self,
        renderer: &dyn Renderer,
        tools: &ToolRegistry,
    ) -> Result<CompiledArtifact, ManagerError> {
        let program = self.render(renderer, tools)?;

        let path = self.artifact_path();
        write_atomic(&path, program.as_bytes())?;

        let artifact = CompiledArtifact {
            target: renderer.target(),
            path,
            compiled_at: Utc::now(),
            bytes: program.len(),
        };
        write_atomic(
            &self.meta_path(),
            serde_json::to_string_pretty(&artifact)?.as_bytes(),
        )?;

        tracing::info!(
            "compiled {} workflow to {} ({} bytes)",
            artifact.target,
            artifact.path.display(),
            artifact.bytes
        );
        Ok(artifact)
    }

    /// The emitted program text, if a compile has ever succeeded.
    pub fn read_artifact(&self) -> Result<Option<String>, ManagerError> {
        match fs::read_to_string(self.artifact_path()) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_meta(&self) -> Option<CompiledArtifact> {
        let text = fs::read_to_string(self.meta_path()).ok()?;
        match serde_json::from_str(&text) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!("ignoring unreadable artifact metadata: {}", e);
                None
            }
        }
    }

    /// Compare the artifact on disk with what the definitions render to now.
    /// Definitions that no longer load or compile make the artifact stale.
    pub fn artifact_status(
        &self,
        renderer: &dyn Renderer,
        tools: &ToolRegistry,
    ) -> Result<ArtifactStatus, ManagerError> {
        let Some(on_disk) = self.read_artifact()? else {
            return Ok(ArtifactStatus {
                state: ArtifactState::Absent,
                artifact: None,
            });
        };

        let state = match self.render(renderer, tools) {
            Ok(program) if program == on_disk => ArtifactState::Current,
            Ok(_) => ArtifactState::Stale,
            Err(ManagerError::Compile(e)) => {
                tracing::debug!("definitions no longer compile: {}", e);
                ArtifactState::Stale
            }
            Err(ManagerError::Store(e)) => {
                tracing::debug!("definitions no longer load: {}", e);
                ArtifactState::Stale
            }
            Err(e) => return Err(e),
        };

        Ok(ArtifactStatus {
            state,
            artifact: self.read_meta(),
        })
    }

    /// Seed the home with the sample approver/scorer workflow. Files that
    /// already exist are left alone. Returns the paths that were written.
    pub fn init_home(&self) -> Result<Vec<PathBuf>, ManagerError> {
        let mut written = Vec::new();

        let manifest_path = self.manifest_path();
        if !manifest_path.exists() {
            let mut registry = ToolRegistry::default();
            registry
                .register(ToolDefinition::new("generate_random_number", &["max_value"]))
                .map_err(ManifestError::from)?;
            registry
                .register(ToolDefinition::new("is_approved", &["score"]))
                .map_err(ManifestError::from)?;
            write_atomic(&manifest_path, encode_manifest(&registry)?.as_bytes())?;
            written.push(manifest_path);
        }

        let module_path = self.home.join(SAMPLE_TOOL_MODULE_FILE);
        if !module_path.exists() {
            write_atomic(&module_path, SAMPLE_TOOL_MODULE.as_bytes())?;
            written.push(module_path);
        }

        let agents_path = self.definitions.path_of(DefinitionKind::Agent);
        if !agents_path.exists() {
            self.definitions.create(AgentDefinition::new(
                "scorer",
                "You score insurance applicants. Use the random number tool with a maximum of 100.",
                &["generate_random_number"],
            ))?;
            self.definitions.create(AgentDefinition::new(
                "approver",
                "You approve everything above 50.",
                &["is_approved"],
            ))?;
            written.push(agents_path);
        }

        let tasks_path = self.definitions.path_of(DefinitionKind::Task);
        if !tasks_path.exists() {
            self.definitions.create(TaskDefinition::new(
                "score_task",
                "Score the applicant.",
                "A single integer score between 0 and 100.",
                "scorer",
            ))?;
            let mut approve = TaskDefinition::new(
                "approve_task",
                "Decide whether the applicant is approved based on the score.",
                "Approved or Denied.",
                "approver",
            );
            approve.context = vec!["score_task".to_string()];
            self.definitions.create(approve)?;
            written.push(tasks_path);
        }

        for path in &written {
            tracing::info!("wrote {}", path.display());
        }
        Ok(written)
    }
}
