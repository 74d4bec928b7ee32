//! Declarative scenario matrices.
//!
//! ```yaml
//! methods:
//!   - method: sum
//!     template: "sum scenarios - #scenario"
//!     columns: [scenario, x, y, sum]
//!     rows:
//!       - ["2+3=5", 2, 3, 5]
//!       - values: ["5+6=11", 5, 6, 11]
//!         isolate: true
//! ```
//!
//! Rows go through the regular [`ScenarioGroup`] builder, so a matrix file
//! obeys exactly the same rules as code-built groups.

use crate::{ConfigFormat, detect_format};
use anyhow::Context;
use casematrix_error::{Result, configuration_error};
use casematrix_group::ScenarioGroup;
use casematrix_ids::MethodId;
use casematrix_store::ScenarioStore;
use casematrix_value::Value;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixFile {
    #[serde(default)]
    pub methods: Vec<MethodMatrix>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodMatrix {
    pub method: MethodId,
    /// Naming template; the method id when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

/// A bare list of cells, or cells plus flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatrixRow {
    Values(Vec<serde_json::Value>),
    Detailed(DetailedRow),
}

/// Row with flags. Unknown keys are rejected so a misspelled flag cannot
/// silently leave a row un-isolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedRow {
    pub values: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub isolate: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ignore: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl MatrixRow {
    pub fn values(&self) -> &[serde_json::Value] {
        match self {
            MatrixRow::Values(values) | MatrixRow::Detailed(DetailedRow { values, .. }) => values,
        }
    }

    pub fn isolate(&self) -> bool {
        matches!(self, MatrixRow::Detailed(DetailedRow { isolate: true, .. }))
    }

    pub fn ignore(&self) -> bool {
        matches!(self, MatrixRow::Detailed(DetailedRow { ignore: true, .. }))
    }
}

impl MethodMatrix {
    pub fn template(&self) -> &str {
        self.template.as_deref().unwrap_or(self.method.as_str())
    }

    pub fn build_group(&self) -> Result<ScenarioGroup> {
        if self.method.as_str().trim().is_empty() {
            return Err(configuration_error("method id must not be empty"));
        }

        let mut group = ScenarioGroup::vars(self.columns.iter().cloned())?;
        for (i, row) in self.rows.iter().enumerate() {
            if row.isolate() && row.ignore() {
                return Err(configuration_error(format!(
                    "method {}: row {} sets both isolate and ignore",
                    self.method,
                    i + 1
                )));
            }
            group = group.with(row.values().iter().cloned().map(Value::from))?;
            if row.isolate() {
                group = group.isolate()?;
            }
            if row.ignore() {
                group = group.ignore()?;
            }
        }
        Ok(group)
    }
}

impl MatrixFile {
    /// Later entries for the same method replace earlier ones.
    pub fn build_store(&self) -> Result<ScenarioStore> {
        let mut store = ScenarioStore::new();
        self.register_into(&mut store)?;
        Ok(store)
    }

    pub fn register_into(&self, store: &mut ScenarioStore) -> Result<()> {
        for method in &self.methods {
            store.register(&method.method, method.build_group()?);
        }
        Ok(())
    }

    /// Template of the last entry for `method`.
    pub fn template_for(&self, method: &str) -> Option<&str> {
        self.methods
            .iter()
            .rev()
            .find(|m| m.method.as_str() == method)
            .map(MethodMatrix::template)
    }
}

pub fn parse_matrix(text: &str, format: ConfigFormat) -> anyhow::Result<MatrixFile> {
    match format {
        ConfigFormat::Json => {
            serde_json::from_str(text).map_err(|e| anyhow::anyhow!("Failed to parse JSON matrix: {e}"))
        }
        ConfigFormat::Yaml => {
            serde_yaml::from_str(text).map_err(|e| anyhow::anyhow!("Failed to parse YAML matrix: {e}"))
        }
    }
}

/// Load a matrix file; the format follows the extension (YAML by default).
pub fn load_matrix_file(path: impl AsRef<Path>) -> anyhow::Result<MatrixFile> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading matrix file {}", path.display()))?;
    parse_matrix(&contents, detect_format(path))
        .with_context(|| format!("loading matrix file {}", path.display()))
}
