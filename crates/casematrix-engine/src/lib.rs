//! Invocation provider for scenario-driven test methods.
//!
//! Given a method identifier, [`ScenarioEngine`] looks up the registered
//! group, applies isolation, and lazily yields one
//! [`InvocationDistributor`] per selected scenario. [`runner`] drives those
//! invocations against a test body the way a test host would.

pub mod runner;

pub use runner::{
    InvocationOutcome, InvocationStatus, RunReport, ScenarioRunner, TestMethod,
};

use casematrix_distributor::InvocationDistributor;
use casematrix_error::Result;
use casematrix_group::ScenarioGroup;
use casematrix_logging::Logger;
use casematrix_store::SharedStore;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

const COMPONENT: &str = "engine";

/// Which scenarios of a group are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    All,
    /// At least one scenario is isolated; only isolated ones run.
    IsolatedOnly,
}

impl SelectionMode {
    pub fn for_group(group: &ScenarioGroup) -> Self {
        if group.any_isolated() {
            SelectionMode::IsolatedOnly
        } else {
            SelectionMode::All
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::All => f.write_str("all"),
            SelectionMode::IsolatedOnly => f.write_str("isolated-only"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioEngine {
    store: SharedStore,
    logger: Logger,
}

impl ScenarioEngine {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            logger: Logger::default(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn supports_method(&self, method: &str) -> bool {
        self.store.contains(method)
    }

    /// Invocations named after the method itself.
    pub fn provide_invocations(&self, method: &str) -> Result<Invocations> {
        self.provide_invocations_with_template(method, method)
    }

    pub fn provide_invocations_with_template(
        &self,
        method: &str,
        template: impl Into<String>,
    ) -> Result<Invocations> {
        let group = self.store.lookup_shared(method)?;
        let mode = SelectionMode::for_group(&group);
        let selected = match mode {
            SelectionMode::All => group.len(),
            SelectionMode::IsolatedOnly => group.iter().filter(|(_, s)| s.is_isolated()).count(),
        };
        self.logger.debug(
            COMPONENT,
            format!("{method}: {selected} of {} scenarios selected ({mode})", group.len()),
        );

        Ok(Invocations {
            group,
            template: template.into(),
            mode,
            cursor: 0,
        })
    }
}

/// Lazy, one-shot sequence of invocation contexts in insertion order.
///
/// Call the engine again for a fresh sequence.
#[derive(Debug, Clone)]
pub struct Invocations {
    group: Arc<ScenarioGroup>,
    template: String,
    mode: SelectionMode,
    cursor: usize,
}

impl Invocations {
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn group(&self) -> &ScenarioGroup {
        &self.group
    }
}

impl Iterator for Invocations {
    type Item = InvocationDistributor;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((label, scenario)) = self.group.scenarios().get_index(self.cursor) {
            self.cursor += 1;
            if self.mode == SelectionMode::IsolatedOnly && !scenario.is_isolated() {
                continue;
            }
            return Some(InvocationDistributor::new(
                label.clone(),
                scenario.clone(),
                self.template.clone(),
            ));
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.group.len().saturating_sub(self.cursor);
        match self.mode {
            SelectionMode::All => (remaining, Some(remaining)),
            SelectionMode::IsolatedOnly => (0, Some(remaining)),
        }
    }
}

impl FusedIterator for Invocations {}
