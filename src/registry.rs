//! @ai:module:intent Hold the project-wide table of known specification entries
//! @ai:module:layer domain
//! @ai:module:public_api Registry, RegistryEntry
//! @ai:module:depends_on annotation, error
//! @ai:module:stateless true
//! @ai:module:thread_safe true

use crate::annotation::RegistryKey;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// @ai:intent One specification entry that code markers may reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub marker_type: String,
    pub scope_id: String,
    pub phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl RegistryEntry {
    pub fn key(&self) -> RegistryKey {
        RegistryKey::new(&self.marker_type, &self.scope_id, &self.phase)
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    entries: Vec<RegistryEntry>,
}

/// @ai:intent Read-only lookup of valid `(markerType, scopeId, phase)` triples
///
/// Built once before scanning starts and shared by reference across threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    entries: BTreeMap<RegistryKey, RegistryEntry>,
}

impl Registry {
    /// @ai:intent Build a registry from entries, rejecting duplicates
    /// @ai:post every key appears once
    /// @ai:effects pure
    pub fn from_entries(entries: impl IntoIterator<Item = RegistryEntry>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for entry in entries {
            let key = entry.key();
            if key.marker_type.is_empty() || key.scope_id.is_empty() || key.phase.is_empty() {
                return Err(Error::Config(format!(
                    "registry entry `{key}` has an empty field"
                )));
            }
            if map.insert(key.clone(), entry).is_some() {
                return Err(Error::Config(format!("duplicate registry entry `{key}`")));
            }
        }
        Ok(Self { entries: map })
    }

    /// @ai:intent Build a registry from bare keys, ignoring duplicates
    /// @ai:effects pure
    pub fn from_keys(keys: impl IntoIterator<Item = RegistryKey>) -> Self {
        let entries = keys
            .into_iter()
            .map(|key| {
                let entry = RegistryEntry {
                    marker_type: key.marker_type.clone(),
                    scope_id: key.scope_id.clone(),
                    phase: key.phase.clone(),
                    title: None,
                };
                (key, entry)
            })
            .collect();
        Self { entries }
    }

    /// @ai:intent Parse a registry from `{"entries": [...]}` JSON
    /// @ai:effects pure
    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(content)?;
        Self::from_entries(file.entries)
    }

    /// @ai:intent Parse a registry from `[[entries]]` TOML
    /// @ai:effects pure
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(content)?;
        Self::from_entries(file.entries)
    }

    /// @ai:intent Load a registry file, choosing the format by extension
    /// @ai:pre path exists and is readable
    /// @ai:post Err(RegistryLoad) on any read or parse failure
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let load_error = |message: String| Error::RegistryLoad {
            path: path.to_path_buf(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let registry = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => {
                return Err(load_error(format!(
                    "unsupported registry format `{}` (expected .json or .toml)",
                    other.unwrap_or("")
                )))
            }
        };
        let registry = registry.map_err(|e| load_error(e.to_string()))?;

        tracing::debug!("Loaded {} registry entries from {}", registry.len(), path.display());
        Ok(registry)
    }

    pub fn contains(&self, key: &RegistryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &RegistryKey) -> Option<&RegistryEntry> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &RegistryKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
