// ABOUTME: Loads the tool manifest (tools.yaml) into an explicit ToolRegistry.
// ABOUTME: The manifest names the importable tool module and each tool's ordered input arguments.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use flowforge_core::{DEFAULT_TOOL_MODULE, RegistryError, ToolDefinition, ToolRegistry};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("malformed tool entry '{entry}': {reason}")]
    Malformed { entry: String, reason: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// On-disk shape of tools.yaml:
///
/// ```yaml
/// module: custom_tools
/// tools:
///   is_approved:
///     input_args: [score]
/// ```
#[derive(Debug, Serialize, Deserialize)]
struct ManifestFile {
    #[serde(default = "default_module")]
    module: String,
    #[serde(default)]
    tools: Mapping,
}

#[derive(Debug, Serialize, Deserialize)]
struct ToolEntry {
    #[serde(default)]
    input_args: Vec<String>,
}

fn default_module() -> String {
    DEFAULT_TOOL_MODULE.to_string()
}

/// Load the manifest at `path`. A missing file yields an empty registry for
/// the default module.
pub fn load_manifest(path: &Path) -> Result<ToolRegistry, ManifestError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("no tool manifest at {}; no tools available", path.display());
            return Ok(ToolRegistry::default());
        }
        Err(e) => return Err(e.into()),
    };
    parse_manifest(&contents)
}

pub fn parse_manifest(contents: &str) -> Result<ToolRegistry, ManifestError> {
    if contents.trim().is_empty() {
        return Ok(ToolRegistry::default());
    }

    let file: ManifestFile = serde_yaml::from_str(contents)?;
    let mut registry = ToolRegistry::new(&file.module);

    for (key, body) in file.tools {
        let name = match key {
            Value::String(name) => name,
            other => {
                return Err(ManifestError::Malformed {
                    entry: format!("{:?}", other),
                    reason: "tool name must be a string".to_string(),
                });
            }
        };
        let entry: ToolEntry = match body {
            Value::Null => ToolEntry {
                input_args: Vec::new(),
            },
            body => serde_yaml::from_value(body).map_err(|e| ManifestError::Malformed {
                entry: name.clone(),
                reason: e.to_string(),
            })?,
        };
        registry.register(ToolDefinition {
            name,
            input_args: entry.input_args,
        })?;
    }

    tracing::debug!(
        module = registry.module(),
        tools = registry.tools().len(),
        "loaded tool manifest"
    );
    Ok(registry)
}

/// Serialize a registry back into manifest form.
pub fn encode_manifest(registry: &ToolRegistry) -> Result<String, ManifestError> {
    let mut tools = Mapping::new();
    for tool in registry.tools() {
        tools.insert(
            Value::String(tool.name.clone()),
            serde_yaml::to_value(ToolEntry {
                input_args: tool.input_args.clone(),
            })?,
        );
    }
    let file = ManifestFile {
        module: registry.module().to_string(),
        tools,
    };
    Ok(serde_yaml::to_string(&file)?)
}
