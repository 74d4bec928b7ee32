//! Scenario matrices.
//!
//! A [`ScenarioGroup`] declares its columns once, then accumulates rows with
//! [`ScenarioGroup::with`]. Each row becomes a [`Scenario`] keyed by a label
//! derived from its first cell.
//!
//! ```
//! use casematrix_group::ScenarioGroup;
//! use casematrix_value::row;
//!
//! # fn main() -> casematrix_error::Result<()> {
//! let group = ScenarioGroup::vars(["scenario", "x", "y", "sum"])?
//!     .with(row!["2+3=5", 2, 3, 5])?
//!     .with(row!["5+6=11", 5, 6, 11])?
//!     .isolate()?;
//!
//! assert_eq!(group.labels().collect::<Vec<_>>(), ["2+3=5", "5+6=11"]);
//! assert!(group.get("5+6=11").unwrap().is_isolated());
//! # Ok(())
//! # }
//! ```

use casematrix_error::{MatrixError, Result, configuration_error};
use casematrix_value::Value;
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::HashSet;
use std::fmt;

/// Conventional name of the label column. It labels the row but is not a
/// test-method parameter.
pub const LABEL_COLUMN: &str = "scenario";

/// One row of named values.
#[derive(Clone, Debug, PartialEq)]
pub struct Scenario {
    content: IndexMap<String, Value>,
    isolated: bool,
}

impl Scenario {
    pub fn new(content: IndexMap<String, Value>) -> Self {
        Self {
            content,
            isolated: false,
        }
    }

    /// Values in column order.
    pub fn content(&self) -> &IndexMap<String, Value> {
        &self.content
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.content.get(property)
    }

    pub fn is_isolated(&self) -> bool {
        self.isolated
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scenario(content={{{}}})",
            self.content
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .join(", ")
        )
    }
}

/// A matrix of scenarios for one test method.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioGroup {
    properties: Vec<String>,
    scenarios: IndexMap<String, Scenario>,
    last_label: Option<String>,
}

impl ScenarioGroup {
    /// Declare the matrix columns. Names must be distinct and non-empty as a list.
    pub fn vars<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let properties: Vec<String> = names.into_iter().map(Into::into).collect();
        if properties.is_empty() {
            return Err(configuration_error(
                "a scenario group needs at least one column",
            ));
        }

        let mut seen = HashSet::new();
        for name in &properties {
            if !seen.insert(name.as_str()) {
                return Err(configuration_error(format!(
                    "duplicate column name {name:?}"
                )));
            }
        }

        Ok(Self {
            properties,
            scenarios: IndexMap::new(),
            last_label: None,
        })
    }

    /// Append one row.
    ///
    /// The label is the first cell stringified, or the 1-based row number when
    /// that cell is null. A row whose label already exists replaces the
    /// earlier scenario in place.
    pub fn with<I>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.len() != self.properties.len() {
            return Err(MatrixError::ArityMismatch {
                expected: self.properties.len(),
                actual: values.len(),
            });
        }

        let label = values[0]
            .label()
            .unwrap_or_else(|| (self.scenarios.len() + 1).to_string());

        let content = self.properties.iter().cloned().zip(values).collect();
        self.scenarios.insert(label.clone(), Scenario::new(content));
        self.last_label = Some(label);

        Ok(self)
    }

    /// Mark the most recently appended scenario as isolated.
    pub fn isolate(mut self) -> Result<Self> {
        self.last_mut("isolate")?.isolated = true;
        Ok(self)
    }

    /// Exclude the most recently appended scenario.
    ///
    /// With no isolation yet, every other scenario becomes isolated. Isolation
    /// set up earlier is kept as is. Either way the last scenario ends up not
    /// isolated.
    pub fn ignore(mut self) -> Result<Self> {
        let last = self
            .last_label
            .clone()
            .ok_or(MatrixError::EmptyGroup { operation: "ignore" })?;

        if !self.any_isolated() {
            for (label, scenario) in self.scenarios.iter_mut() {
                if *label != last {
                    scenario.isolated = true;
                }
            }
        }

        self.last_mut("ignore")?.isolated = false;
        Ok(self)
    }

    fn last_mut(&mut self, operation: &'static str) -> Result<&mut Scenario> {
        let label = self
            .last_label
            .as_ref()
            .ok_or(MatrixError::EmptyGroup { operation })?;
        self.scenarios
            .get_mut(label)
            .ok_or(MatrixError::EmptyGroup { operation })
    }

    /// Isolated scenarios, in insertion order.
    pub fn extract_isolated(&self) -> IndexMap<String, Scenario> {
        self.scenarios
            .iter()
            .filter(|(_, scenario)| scenario.isolated)
            .map(|(label, scenario)| (label.clone(), scenario.clone()))
            .collect()
    }

    pub fn any_isolated(&self) -> bool {
        self.scenarios.values().any(|scenario| scenario.isolated)
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn scenarios(&self) -> &IndexMap<String, Scenario> {
        &self.scenarios
    }

    pub fn get(&self, label: &str) -> Option<&Scenario> {
        self.scenarios.get(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.scenarios.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Scenario> {
        self.scenarios.iter()
    }

    pub fn last_label(&self) -> Option<&str> {
        self.last_label.as_deref()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

impl fmt::Display for ScenarioGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.scenarios
                .iter()
                .map(|(label, scenario)| format!("{label}={scenario}"))
                .join(", ")
        )
    }
}
