//! Configuration management and loading for casematrix.

pub mod matrix;

pub use matrix::{DetailedRow, MatrixFile, MatrixRow, MethodMatrix, load_matrix_file, parse_matrix};

use anyhow::Context;
use casematrix_ids::MethodId;
use casematrix_logging::LoggingConfig;
use casematrix_store::ScenarioStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration format types supported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    #[default]
    Yaml,
}

/// `.json` is JSON, everything else YAML.
pub fn detect_format(path: &Path) -> ConfigFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => ConfigFormat::Json,
        Some("yaml") | Some("yml") => ConfigFormat::Yaml,
        _ => ConfigFormat::default(),
    }
}

/// Settings shared by the engine, the simulation harness and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Print debug items after each simulated test
    #[serde(default = "default_true")]
    pub debug_enabled: bool,

    /// Side-by-side EXPECT/ACTUAL on assertion failures
    #[serde(default)]
    pub horizontal_logs: bool,

    /// Base directory for file-backed expectations and actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_dir: Option<PathBuf>,

    /// Matrix files merged, in order, by [`EngineConfig::load_matrices`]
    #[serde(default)]
    pub matrices: Vec<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            debug_enabled: true,
            horizontal_logs: false,
            resource_dir: None,
            matrices: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load every listed matrix. Later files overwrite methods (and their
    /// templates) registered by earlier ones.
    pub fn load_matrices(&self) -> anyhow::Result<LoadedMatrices> {
        let mut loaded = LoadedMatrices::default();
        for path in &self.matrices {
            loaded
                .merge(&load_matrix_file(path)?)
                .with_context(|| format!("invalid matrix file {}", path.display()))?;
        }
        Ok(loaded)
    }

    pub fn load_store(&self) -> anyhow::Result<ScenarioStore> {
        Ok(self.load_matrices()?.store)
    }
}

/// Store built from matrix files, plus the naming template of each method.
#[derive(Debug, Default)]
pub struct LoadedMatrices {
    pub store: ScenarioStore,
    pub templates: HashMap<MethodId, String>,
}

impl LoadedMatrices {
    pub fn merge(&mut self, file: &MatrixFile) -> casematrix_error::Result<()> {
        file.register_into(&mut self.store)?;
        for method in &file.methods {
            self.templates
                .insert(method.method.clone(), method.template().to_string());
        }
        Ok(())
    }

    /// Template declared for `method`, or the method id itself.
    pub fn template_for<'a>(&'a self, method: &'a str) -> &'a str {
        self.templates.get(method).map_or(method, String::as_str)
    }
}

/// Load configuration from a file
pub fn load_config<P: Into<PathBuf>>(path: P) -> anyhow::Result<EngineConfig> {
    let path = path.into();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;

    match detect_format(&path) {
        ConfigFormat::Json => serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse JSON config: {e}")),
        ConfigFormat::Yaml => serde_yaml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse YAML config: {e}")),
    }
}

/// Save configuration to a file
pub fn save_config<P: Into<PathBuf>>(config: &EngineConfig, path: P) -> anyhow::Result<()> {
    let path = path.into();
    let contents = match detect_format(&path) {
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map_err(|e| anyhow::anyhow!("Failed to serialize JSON config: {e}"))?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)
            .map_err(|e| anyhow::anyhow!("Failed to serialize YAML config: {e}"))?,
    };

    std::fs::write(&path, contents).with_context(|| format!("writing config {}", path.display()))?;
    Ok(())
}
