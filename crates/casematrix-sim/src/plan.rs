//! The six phases of a simulated test.
//!
//! Phases run in a fixed order no matter how they were declared:
//! setup, expect, mock setup, action, assertion, teardown. Teardown runs
//! even when an earlier phase failed; the first failure is reported.

use crate::harness::SimSettings;
use crate::mock::{MockRegistry, MockSubstrate};
use crate::properties::Properties;
use anyhow::Context;
use casematrix_logging::{DebugItems, Logger, assertion_log, panic_message};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tokio::runtime::Runtime;

const SIM: &str = "sim";
const MOCKS: &str = "mocks";

pub(crate) type SetupFn<'a, T> = Box<dyn FnOnce(&mut Properties<T>) -> anyhow::Result<()> + 'a>;
pub(crate) type ProduceFn<'a, T> = Box<dyn FnOnce(&Properties<T>) -> anyhow::Result<Option<T>> + 'a>;
type MockSetupFn<'a, T, M> = Box<dyn FnOnce(&Properties<T>, &mut MockRegistry<M>) + 'a>;
type InspectFn<'a, T> = Box<dyn FnOnce(&Properties<T>) + 'a>;
pub(crate) type CompareFn<'a, T> =
    Box<dyn FnOnce(Option<&T>, Option<&T>) -> anyhow::Result<()> + 'a>;

pub(crate) enum Assertion<'a, T> {
    /// `expected == actual`, optionally after a check on the properties.
    Equals {
        message: Option<String>,
        before: Option<InspectFn<'a, T>>,
    },
    Custom(CompareFn<'a, T>),
}

/// Declared phases of one test. Filled in by the closure passed to
/// [`crate::SimHarness::test`].
pub struct TestPlan<'a, T, M: MockSubstrate> {
    resource_dir: Option<PathBuf>,
    /// Drives the `co_*` phases; only set by [`crate::SimHarness::test_blocking`].
    pub(crate) runtime: Option<Rc<Runtime>>,
    pub(crate) setup: Option<SetupFn<'a, T>>,
    pub(crate) expect: Option<ProduceFn<'a, T>>,
    mocks: Option<MockSetupFn<'a, T, M>>,
    pub(crate) action: Option<ProduceFn<'a, T>>,
    pub(crate) assertion: Assertion<'a, T>,
    pub(crate) teardown: Option<SetupFn<'a, T>>,
}

impl<'a, T: 'a, M: MockSubstrate + 'a> TestPlan<'a, T, M> {
    pub(crate) fn new(resource_dir: Option<PathBuf>, runtime: Option<Rc<Runtime>>) -> Self {
        Self {
            resource_dir,
            runtime,
            setup: None,
            expect: None,
            mocks: None,
            action: None,
            assertion: Assertion::Equals {
                message: None,
                before: None,
            },
            teardown: None,
        }
    }

    pub fn setup(&mut self, f: impl FnOnce(&mut Properties<T>) + 'a) -> &mut Self {
        self.setup = Some(Box::new(move |props: &mut Properties<T>| {
            f(props);
            Ok(())
        }));
        self
    }

    /// Same as [`TestPlan::setup`].
    pub fn given(&mut self, f: impl FnOnce(&mut Properties<T>) + 'a) -> &mut Self {
        self.setup(f)
    }

    pub fn expect(&mut self, f: impl FnOnce(&Properties<T>) -> Option<T> + 'a) -> &mut Self {
        self.expect = Some(Box::new(move |props: &Properties<T>| Ok(f(props))));
        self
    }

    pub fn expect_value(&mut self, value: T) -> &mut Self {
        self.expect(move |_| Some(value))
    }

    pub fn expect_none(&mut self) -> &mut Self {
        self.expect(|_| None)
    }

    /// Derive the expectation from a file under the resource directory.
    pub fn expect_from_file_content(
        &mut self,
        filename: impl Into<String>,
        f: impl FnOnce(String, &Properties<T>) -> Option<T> + 'a,
    ) -> &mut Self {
        let filename = filename.into();
        let dir = self.resource_dir.clone();
        self.expect = Some(Box::new(move |props: &Properties<T>| {
            let path = resource_path(dir.as_deref(), &filename)?;
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(f(content, props))
        }));
        self
    }

    pub fn setup_mocks(
        &mut self,
        f: impl FnOnce(&Properties<T>, &mut MockRegistry<M>) + 'a,
    ) -> &mut Self {
        self.mocks = Some(Box::new(f));
        self
    }

    pub fn whenever(&mut self, f: impl FnOnce(&Properties<T>) -> Option<T> + 'a) -> &mut Self {
        self.action = Some(Box::new(move |props: &Properties<T>| Ok(f(props))));
        self
    }

    /// Act on a file under the resource directory.
    pub fn whenever_with_file(
        &mut self,
        filename: impl Into<String>,
        f: impl FnOnce(&Path, &Properties<T>) -> Option<T> + 'a,
    ) -> &mut Self {
        let filename = filename.into();
        let dir = self.resource_dir.clone();
        self.action = Some(Box::new(move |props: &Properties<T>| {
            let path = resource_path(dir.as_deref(), &filename)?;
            Ok(f(&path, props))
        }));
        self
    }

    /// The action must fail. The actual value stays `None`.
    pub fn whenever_err<E: 'a>(
        &mut self,
        f: impl FnOnce(&Properties<T>) -> Result<T, E> + 'a,
    ) -> &mut Self
    where
        T: fmt::Debug,
    {
        self.whenever_err_and(f, |_, _| {})
    }

    /// The action must fail; `inspect` receives the error.
    pub fn whenever_err_and<E: 'a>(
        &mut self,
        f: impl FnOnce(&Properties<T>) -> Result<T, E> + 'a,
        inspect: impl FnOnce(E, &Properties<T>) + 'a,
    ) -> &mut Self
    where
        T: fmt::Debug,
    {
        self.action = Some(Box::new(move |props: &Properties<T>| match f(props) {
            Ok(value) => Err(anyhow::anyhow!(
                "expected the action to fail, but it returned {value:?}"
            )),
            Err(err) => {
                inspect(err, props);
                Ok(None)
            }
        }));
        self
    }

    /// Custom assertion over (expected, actual).
    pub fn then(&mut self, f: impl FnOnce(Option<&T>, Option<&T>) + 'a) -> &mut Self {
        self.assertion = Assertion::Custom(Box::new(
            move |expected: Option<&T>, actual: Option<&T>| {
                f(expected, actual);
                Ok(())
            },
        ));
        self
    }

    /// Equality check reported with `message` on failure.
    pub fn then_equals(&mut self, message: impl Into<String>) -> &mut Self {
        self.assertion = Assertion::Equals {
            message: Some(message.into()),
            before: None,
        };
        self
    }

    /// Run `before` on the properties, then check equality.
    pub fn then_equals_after(
        &mut self,
        message: impl Into<String>,
        before: impl FnOnce(&Properties<T>) + 'a,
    ) -> &mut Self {
        self.assertion = Assertion::Equals {
            message: Some(message.into()),
            before: Some(Box::new(before)),
        };
        self
    }

    pub fn teardown(&mut self, f: impl FnOnce(&mut Properties<T>) + 'a) -> &mut Self {
        self.teardown = Some(Box::new(move |props: &mut Properties<T>| {
            f(props);
            Ok(())
        }));
        self
    }
}

impl<'a, T, M> TestPlan<'a, T, M>
where
    T: PartialEq + fmt::Debug + 'a,
    M: MockSubstrate + 'a,
{
    /// Run every phase, then verify mocks. Returns the outcome and the
    /// debug items recorded through [`Properties::debug`].
    pub(crate) fn execute(
        mut self,
        substrate: &mut M,
        settings: &SimSettings,
        logger: &Logger,
    ) -> (anyhow::Result<()>, DebugItems) {
        let teardown = self.teardown.take();
        let mut props = Properties::new();

        let phases = self.run_phases(&mut props, substrate, settings, logger);
        let torn_down = match teardown {
            Some(f) => guard("teardown", || f(&mut props)).and_then(|r| r),
            None => Ok(()),
        };

        let result = match (phases, torn_down) {
            (Ok(calls), Ok(())) => verify_mocks(substrate, &calls),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(teardown_err)) => {
                logger.warn(SIM, format!("teardown also failed: {teardown_err:#}"));
                Err(err)
            }
        };

        (result, props.take_debug_items())
    }

    fn run_phases(
        self,
        props: &mut Properties<T>,
        substrate: &mut M,
        settings: &SimSettings,
        logger: &Logger,
    ) -> anyhow::Result<Vec<M::CallSite>> {
        if let Some(setup) = self.setup {
            guard("setup", || setup(props))??;
        }

        let expected = match self.expect {
            Some(f) => guard("expect", || f(props))??,
            None => None,
        };
        props.set_expected(expected);

        let mut registry = MockRegistry::new();
        if let Some(f) = self.mocks {
            guard("mock setup", || f(props, &mut registry))?;
        }
        let (metrics, calls) = registry.apply(substrate);
        if settings.debug_enabled {
            logger.info(MOCKS, metrics.render());
        }

        let actual = match self.action {
            Some(f) => guard("action", || f(props))??,
            None => None,
        };

        match self.assertion {
            Assertion::Custom(f) => {
                guard("assertion", || f(props.expected(), actual.as_ref()))??
            }
            Assertion::Equals { message, before } => {
                if let Some(before) = before {
                    guard("assertion", || before(props))?;
                }
                if props.expected() != actual.as_ref() {
                    anyhow::bail!(
                        "{}",
                        assertion_log(
                            &render(props.expected()),
                            &render(actual.as_ref()),
                            message.as_deref(),
                            settings.horizontal_logs,
                        )
                    );
                }
            }
        }

        Ok(calls)
    }
}

fn verify_mocks<M: MockSubstrate>(substrate: &M, calls: &[M::CallSite]) -> anyhow::Result<()> {
    for call in calls {
        substrate
            .verify_invoked(call)
            .with_context(|| format!("mock {call:?} was not invoked"))?;
    }
    substrate.verify_all_consumed()
}

fn render<T: fmt::Debug>(value: Option<&T>) -> String {
    match value {
        Some(value) => format!("{value:?}"),
        None => "null".to_string(),
    }
}

pub(crate) fn resource_path(dir: Option<&Path>, name: &str) -> anyhow::Result<PathBuf> {
    let path = match dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    };
    if path.is_file() {
        Ok(path)
    } else {
        anyhow::bail!("File not available {name}")
    }
}

/// Run one phase, turning a panic into an error naming the phase.
fn guard<R>(phase: &str, f: impl FnOnce() -> R) -> anyhow::Result<R> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        anyhow::anyhow!("{phase} phase panicked: {}", panic_message(payload.as_ref()))
    })
}
