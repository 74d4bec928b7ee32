//! Invocation contexts.
//!
//! Each selected scenario becomes one [`InvocationDistributor`]: it names the
//! invocation and hands the host one resolver per parameter column.

use casematrix_group::{LABEL_COLUMN, Scenario};
use casematrix_ids::InvocationId;
use casematrix_resolver::ValueResolver;

/// Placeholder replaced by the scenario label in a naming template.
pub const SCENARIO_TOKEN: &str = "#scenario";

/// What the host needs to run one invocation.
pub trait InvocationContext {
    /// Display name for the invocation at `invocation_index` (1-based).
    fn display_name(&self, invocation_index: usize) -> String;

    /// One resolver per parameter column, in column order.
    fn parameter_resolvers(&self) -> Vec<ValueResolver>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct InvocationDistributor {
    label: String,
    scenario: Scenario,
    template: String,
}

impl InvocationDistributor {
    pub fn new(label: impl Into<String>, scenario: Scenario, template: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            scenario,
            template: template.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Stable across runs: depends on template and label only.
    pub fn invocation_id(&self) -> InvocationId {
        InvocationId::from_parts([self.template.as_str(), self.label.as_str()])
    }
}

impl InvocationContext for InvocationDistributor {
    fn display_name(&self, _invocation_index: usize) -> String {
        if self.template.contains(SCENARIO_TOKEN) {
            self.template.replace(SCENARIO_TOKEN, &self.label)
        } else {
            self.template.clone()
        }
    }

    fn parameter_resolvers(&self) -> Vec<ValueResolver> {
        let mut index = 0;
        let mut resolvers = Vec::with_capacity(self.scenario.content().len());
        for (name, value) in self.scenario.content() {
            if name == LABEL_COLUMN {
                continue;
            }
            resolvers.push(ValueResolver::for_value(index, value.clone()));
            index += 1;
        }
        resolvers
    }
}
