//! Host-side driver: one call per test method, one body run per invocation.

use crate::{ScenarioEngine, SelectionMode};
use casematrix_distributor::InvocationContext;
use casematrix_error::{MatrixError, Result};
use casematrix_ids::{InvocationId, MethodId};
use casematrix_logging::{Logger, panic_message};
use casematrix_resolver::{Arguments, resolve_arguments};
use casematrix_value::ParamType;
use std::panic::{AssertUnwindSafe, catch_unwind};

const COMPONENT: &str = "runner";

/// Signature of a scenario-driven test method.
#[derive(Debug, Clone, PartialEq)]
pub struct TestMethod {
    pub id: MethodId,
    pub template: String,
    pub params: Vec<ParamType>,
}

impl TestMethod {
    /// Named after its identifier unless a template is set.
    pub fn new(id: impl Into<MethodId>, params: impl IntoIterator<Item = ParamType>) -> Self {
        let id = id.into();
        Self {
            template: id.to_string(),
            id,
            params: params.into_iter().collect(),
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvocationStatus {
    Passed,
    /// The body returned an error or panicked.
    Failed(String),
    /// Arguments could not be bound; the body never ran.
    ResolutionFailed(MatrixError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvocationOutcome {
    /// 1-based position among the emitted invocations.
    pub index: usize,
    pub display_name: String,
    pub invocation_id: InvocationId,
    pub status: InvocationStatus,
}

impl InvocationOutcome {
    pub fn is_passed(&self) -> bool {
        self.status == InvocationStatus::Passed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub method: MethodId,
    pub mode: SelectionMode,
    pub outcomes: Vec<InvocationOutcome>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Collapse every failure into one error.
    pub fn into_result(self) -> anyhow::Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let details: Vec<String> = self
            .outcomes
            .iter()
            .filter_map(|o| match &o.status {
                InvocationStatus::Passed => None,
                InvocationStatus::Failed(msg) => Some(format!("  [{}] {}: {msg}", o.index, o.display_name)),
                InvocationStatus::ResolutionFailed(err) => {
                    Some(format!("  [{}] {}: {err}", o.index, o.display_name))
                }
            })
            .collect();
        anyhow::bail!(
            "{} of {} invocations failed for {}\n{}",
            self.failed(),
            self.outcomes.len(),
            self.method,
            details.join("\n")
        )
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    engine: ScenarioEngine,
    logger: Logger,
}

impl ScenarioRunner {
    /// Shares the engine's logger.
    pub fn new(engine: ScenarioEngine) -> Self {
        let logger = engine.logger().clone();
        Self { engine, logger }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn engine(&self) -> &ScenarioEngine {
        &self.engine
    }

    /// Run `body` once per selected scenario.
    ///
    /// Lookup failure fails the whole method. Each invocation failure is
    /// recorded and the remaining invocations still run.
    pub fn run<F>(&self, method: &TestMethod, body: F) -> Result<RunReport>
    where
        F: Fn(&Arguments) -> anyhow::Result<()>,
    {
        let invocations = self
            .engine
            .provide_invocations_with_template(method.id.as_str(), method.template.as_str())
            .inspect_err(|err| self.logger.error(COMPONENT, format!("{}: {err}", method.id)))?;
        let mode = invocations.mode();

        let mut outcomes = Vec::new();
        for (offset, context) in invocations.enumerate() {
            let index = offset + 1;
            let display_name = context.display_name(index);
            let status = match resolve_arguments(&context.parameter_resolvers(), &method.params) {
                Ok(args) => run_body(&body, &args),
                Err(err) => InvocationStatus::ResolutionFailed(err),
            };

            match &status {
                InvocationStatus::Passed => {
                    self.logger.info(COMPONENT, format!("[{index}] {display_name} ... ok"));
                }
                InvocationStatus::Failed(msg) => {
                    self.logger
                        .error(COMPONENT, format!("[{index}] {display_name} ... FAILED: {msg}"));
                }
                InvocationStatus::ResolutionFailed(err) => {
                    self.logger
                        .error(COMPONENT, format!("[{index}] {display_name} ... UNRESOLVED: {err}"));
                }
            }

            outcomes.push(InvocationOutcome {
                index,
                display_name,
                invocation_id: context.invocation_id(),
                status,
            });
        }

        Ok(RunReport {
            method: method.id.clone(),
            mode,
            outcomes,
        })
    }
}

fn run_body<F>(body: &F, args: &Arguments) -> InvocationStatus
where
    F: Fn(&Arguments) -> anyhow::Result<()>,
{
    match catch_unwind(AssertUnwindSafe(|| body(args))) {
        Ok(Ok(())) => InvocationStatus::Passed,
        Ok(Err(err)) => InvocationStatus::Failed(format!("{err:#}")),
        Err(payload) => {
            InvocationStatus::Failed(format!("panicked: {}", panic_message(payload.as_ref())))
        }
    }
}
