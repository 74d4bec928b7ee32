//! Mocking seam.
//!
//! The harness never creates doubles itself. It records [`MockTask`]s during
//! the mock-setup phase, applies them to a [`MockSubstrate`], and asks the
//! substrate to verify them once the test body has run.

use casematrix_logging::MockMetrics;
use std::fmt;

/// A mocking backend: something that can stub call sites and later verify
/// that they were used.
pub trait MockSubstrate {
    /// Identifies one stubbed call.
    type CallSite: Clone + fmt::Debug;
    /// Value a stubbed call returns.
    type Output;
    /// Error a stubbed call fails with.
    type Failure;

    fn stub_return(&mut self, call: &Self::CallSite, output: Self::Output);

    /// Stub a call that returns nothing.
    fn stub_unit(&mut self, _call: &Self::CallSite) {}

    fn stub_throw(&mut self, call: &Self::CallSite, failure: Self::Failure);

    fn verify_invoked(&self, call: &Self::CallSite) -> anyhow::Result<()>;

    /// Fails when a stub was invoked without a matching verification, or
    /// when an unstubbed call was made.
    fn verify_all_consumed(&self) -> anyhow::Result<()>;
}

/// Substrate for tests without collaborators.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMocks;

impl MockSubstrate for NoMocks {
    type CallSite = ();
    type Output = ();
    type Failure = ();

    fn stub_return(&mut self, _call: &(), _output: ()) {}

    fn stub_throw(&mut self, _call: &(), _failure: ()) {}

    fn verify_invoked(&self, _call: &()) -> anyhow::Result<()> {
        Ok(())
    }

    fn verify_all_consumed(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// One expected interaction: a call site plus what it should do.
pub struct MockTask<M: MockSubstrate> {
    call: M::CallSite,
    returned: Option<M::Output>,
    failure: Option<M::Failure>,
}

impl<M: MockSubstrate> MockTask<M> {
    fn new(call: M::CallSite) -> Self {
        Self {
            call,
            returned: None,
            failure: None,
        }
    }

    pub fn call(&self) -> &M::CallSite {
        &self.call
    }

    pub fn returns(&mut self, output: M::Output) -> &mut Self {
        self.returned = Some(output);
        self
    }

    pub fn throws(&mut self, failure: M::Failure) -> &mut Self {
        self.failure = Some(failure);
        self
    }
}

impl<M: MockSubstrate> fmt::Debug for MockTask<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTask")
            .field("call", &self.call)
            .field("returns", &self.returned.is_some())
            .field("throws", &self.failure.is_some())
            .finish()
    }
}

/// Tasks registered during the mock-setup phase.
pub struct MockRegistry<M: MockSubstrate> {
    tasks: Vec<MockTask<M>>,
}

impl<M: MockSubstrate> Default for MockRegistry<M> {
    fn default() -> Self {
        Self { tasks: Vec::new() }
    }
}

impl<M: MockSubstrate> fmt::Debug for MockRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.tasks).finish()
    }
}

impl<M: MockSubstrate> MockRegistry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect `call`; configure the result on the returned task.
    pub fn every(&mut self, call: M::CallSite) -> &mut MockTask<M> {
        self.tasks.push(MockTask::new(call));
        let last = self.tasks.len() - 1;
        &mut self.tasks[last]
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stub every task on `substrate`. Failing tasks are thrown, tasks
    /// without a return value are unit calls, the rest return.
    ///
    /// Returns the counts plus the call sites left to verify.
    pub fn apply(self, substrate: &mut M) -> (MockMetrics, Vec<M::CallSite>) {
        let mut metrics = MockMetrics::default();
        let mut calls = Vec::with_capacity(self.tasks.len());

        for task in self.tasks {
            calls.push(task.call.clone());
            match (task.failure, task.returned) {
                (Some(failure), _) => {
                    metrics.thrown += 1;
                    substrate.stub_throw(&task.call, failure);
                }
                (None, None) => {
                    metrics.called += 1;
                    metrics.null += 1;
                    substrate.stub_unit(&task.call);
                }
                (None, Some(output)) => {
                    metrics.called += 1;
                    metrics.returned += 1;
                    substrate.stub_return(&task.call, output);
                }
            }
        }

        (metrics, calls)
    }
}
