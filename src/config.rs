//! @ai:module:intent Load scan configuration from scopetrace.toml
//! @ai:module:layer infrastructure
//! @ai:module:public_api ScanConfig, ScanSection, LanguageOverride
//! @ai:module:depends_on language, error
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::language::{LanguageProfile, MarkerSyntax, ProfileTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// @ai:intent Main configuration for a scan run
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Registry file (.json or .toml) with the known specification entries.
    #[serde(default)]
    pub registry: Option<PathBuf>,
    #[serde(default)]
    pub markers: MarkerSyntax,
    #[serde(default)]
    pub scan: ScanSection,
    /// Per-extension comment syntax overrides.
    #[serde(default)]
    pub languages: BTreeMap<String, LanguageOverride>,
}

/// @ai:intent Which paths to scan and how strictly to judge them
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSection {
    #[serde(default = "default_paths")]
    pub paths: Vec<PathBuf>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub fail_on_gaps: bool,
}

/// @ai:intent Comment delimiters for one extension, replacing the built-in entry
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageOverride {
    #[serde(default)]
    pub line: Vec<String>,
    #[serde(default)]
    pub block_open: Option<String>,
    #[serde(default)]
    pub block_close: Option<String>,
    #[serde(default)]
    pub block_line: Option<String>,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            paths: default_paths(),
            exclude: default_exclude(),
            fail_on_gaps: false,
        }
    }
}

fn default_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_exclude() -> Vec<String> {
    [".git", "target", "node_modules", "vendor"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl LanguageOverride {
    /// @ai:intent Turn the override into a profile, checking delimiters
    /// @ai:post Err if no opener is given or block delimiters are unpaired
    /// @ai:effects pure
    pub fn to_profile(&self, extension: &str) -> Result<LanguageProfile> {
        if self.block_open.is_some() != self.block_close.is_some() {
            return Err(Error::Config(format!(
                "language `{extension}`: block_open and block_close must be set together"
            )));
        }

        let profile = LanguageProfile {
            name: format!("{extension} (override)"),
            line_prefixes: self.line.clone(),
            block_open: self.block_open.clone(),
            block_close: self.block_close.clone(),
            block_line_prefix: self.block_line.clone(),
        };
        if profile.openers().is_empty() {
            return Err(Error::Config(format!(
                "language `{extension}`: at least one comment delimiter is required"
            )));
        }
        Ok(profile)
    }
}

impl ScanConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config: Self = toml::from_str(&content)?;

        // Relative registry paths are resolved against the config file.
        if let (Some(registry), Some(dir)) = (config.registry.as_mut(), path.parent()) {
            if registry.is_relative() {
                *registry = dir.join(&*registry);
            }
        }

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// @ai:intent Marker syntax with an empty namespace treated as none
    /// @ai:effects pure
    pub fn marker_syntax(&self) -> MarkerSyntax {
        match &self.markers.namespace {
            Some(ns) => MarkerSyntax::with_namespace(ns.trim()),
            None => MarkerSyntax::default(),
        }
    }

    /// @ai:intent Built-in profile table with this config's overrides applied
    /// @ai:effects pure
    pub fn profile_table(&self) -> Result<ProfileTable> {
        let mut table = ProfileTable::builtin();
        for (extension, language) in &self.languages {
            table.insert(extension, language.to_profile(extension)?);
        }
        Ok(table)
    }
}
