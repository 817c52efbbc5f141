// ABOUTME: YAML-backed definition store for agents and tasks, keyed by name in declaration order.
// ABOUTME: Every write reads the whole file, mutates it in memory, and atomically rewrites it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use flowforge_core::{Definition, DefinitionKind, is_identifier};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::atomic::write_atomic;

/// Errors that can occur during definition store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} '{name}' does not exist")]
    NotFound { kind: DefinitionKind, name: String },

    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: DefinitionKind, name: String },

    #[error("names must match: path names {kind} '{path_name}' but the record is named '{record_name}'")]
    Mismatch {
        kind: DefinitionKind,
        path_name: String,
        record_name: String,
    },

    #[error("'{name}' is not a valid {kind} name; use letters, digits and underscores, not starting with a digit")]
    InvalidName { kind: DefinitionKind, name: String },

    #[error("malformed {kind} entry '{entry}' in {file}: {reason}")]
    Malformed {
        kind: DefinitionKind,
        file: String,
        entry: String,
        reason: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Definition files live side by side in one directory, one file per kind:
///
/// ```yaml
/// approver:
///   system_prompt: You approve everything above 50.
///   tools:
///   - is_approved
/// ```
///
/// The mapping key is the record's name; key order is declaration order.
/// A missing file is an empty collection.
#[derive(Debug, Clone)]
pub struct DefinitionStore {
    dir: PathBuf,
}

impl DefinitionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Path of the file backing the given kind.
    pub fn path_of(&self, kind: DefinitionKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Load every record of a kind, in declaration order.
    pub fn load<T: Definition>(&self) -> Result<Vec<T>, StoreError> {
        let path = self.path_of(T::KIND);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        decode_collection(&path, &contents)
    }

    /// Names of every record of a kind, in declaration order.
    pub fn list<T: Definition>(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .load::<T>()?
            .iter()
            .map(|r| r.name().to_string())
            .collect())
    }

    pub fn get<T: Definition>(&self, name: &str) -> Result<T, StoreError> {
        self.load::<T>()?
            .into_iter()
            .find(|r| r.name() == name)
            .ok_or_else(|| StoreError::NotFound {
                kind: T::KIND,
                name: name.to_string(),
            })
    }

    /// Append a new record. Existing records are never touched.
    pub fn create<T: Definition>(&self, record: T) -> Result<(), StoreError> {
        if !is_identifier(record.name()) {
            return Err(StoreError::InvalidName {
                kind: T::KIND,
                name: record.name().to_string(),
            });
        }

        let mut records = self.load::<T>()?;
        if records.iter().any(|r| r.name() == record.name()) {
            return Err(StoreError::AlreadyExists {
                kind: T::KIND,
                name: record.name().to_string(),
            });
        }

        let kind = T::KIND;
        tracing::info!(%kind, name = record.name(), "creating definition");
        records.push(record);
        self.save(&records)
    }

    /// Replace the record named `name` in place. The record's own name must
    /// equal `name`: names are immutable once created.
    pub fn update<T: Definition>(&self, name: &str, record: T) -> Result<(), StoreError> {
        if record.name() != name {
            return Err(StoreError::Mismatch {
                kind: T::KIND,
                path_name: name.to_string(),
                record_name: record.name().to_string(),
            });
        }

        let mut records = self.load::<T>()?;
        let slot = records
            .iter_mut()
            .find(|r| r.name() == name)
            .ok_or_else(|| StoreError::NotFound {
                kind: T::KIND,
                name: name.to_string(),
            })?;
        *slot = record;

        let kind = T::KIND;
        tracing::info!(%kind, name, "updating definition");
        self.save(&records)
    }

    fn save<T: Definition>(&self, records: &[T]) -> Result<(), StoreError> {
        let yaml = encode_collection(records)?;
        write_atomic(&self.path_of(T::KIND), yaml.as_bytes())?;
        Ok(())
    }
}

fn decode_collection<T: Definition>(path: &Path, contents: &str) -> Result<Vec<T>, StoreError> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    let malformed = |entry: &str, reason: String| StoreError::Malformed {
        kind: T::KIND,
        file: path.display().to_string(),
        entry: entry.to_string(),
        reason,
    };

    let mapping: Option<Mapping> = serde_yaml::from_str(contents)?;
    let mut records = Vec::new();

    for (key, body) in mapping.unwrap_or_default() {
        let name = match key {
            Value::String(name) => name,
            other => {
                return Err(malformed(
                    &format!("{:?}", other),
                    "entry name must be a string".to_string(),
                ));
            }
        };

        let mut fields = match body {
            Value::Mapping(fields) => fields,
            Value::Null => Mapping::new(),
            _ => return Err(malformed(&name, "entry must be a mapping of fields".to_string())),
        };
        fields.insert(Value::String("name".to_string()), Value::String(name.clone()));

        let record: T = serde_yaml::from_value(Value::Mapping(fields))
            .map_err(|e| malformed(&name, e.to_string()))?;
        records.push(record);
    }

    Ok(records)
}

fn encode_collection<T: Definition>(records: &[T]) -> Result<String, StoreError> {
    let mut out = Mapping::new();
    for record in records {
        let fields: Mapping = match serde_yaml::to_value(record)? {
            Value::Mapping(fields) => fields
                .into_iter()
                .filter(|(key, _)| key.as_str() != Some("name"))
                .collect(),
            _ => Mapping::new(),
        };
        out.insert(
            Value::String(record.name().to_string()),
            Value::Mapping(fields),
        );
    }
    Ok(serde_yaml::to_string(&out)?)
}
