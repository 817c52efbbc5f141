// ABOUTME: Persistence layer for flowforge, keeping definitions and compiled programs on disk.
// ABOUTME: Provides the YAML definition store, tool manifest loader, atomic writes, and the storage manager.

pub mod atomic;
pub mod definitions;
pub mod manager;
pub mod manifest;

pub use atomic::write_atomic;
pub use definitions::{DefinitionStore, StoreError};
pub use manager::{ArtifactState, ArtifactStatus, CompiledArtifact, ManagerError, StorageManager};
pub use manifest::{ManifestError, encode_manifest, load_manifest, parse_manifest};
