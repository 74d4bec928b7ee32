use crate::mock::{MockSubstrate, NoMocks};
use crate::plan::TestPlan;
use anyhow::Context;
use casematrix_config::EngineConfig;
use casematrix_logging::{DebugItems, Logger};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

const SIM: &str = "sim";

/// Knobs read by the harness while running a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimSettings {
    /// Base directory for file-backed phases; relative names resolve
    /// against the working directory when unset.
    pub resource_dir: Option<PathBuf>,
    pub debug_enabled: bool,
    pub horizontal_logs: bool,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            resource_dir: None,
            debug_enabled: true,
            horizontal_logs: false,
        }
    }
}

impl From<&EngineConfig> for SimSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            resource_dir: config.resource_dir.clone(),
            debug_enabled: config.debug_enabled,
            horizontal_logs: config.horizontal_logs,
        }
    }
}

/// Runs six-phase tests against one mocking substrate.
///
/// Each call to [`SimHarness::test`] is independent: properties start empty
/// and debug items are cleared once the test has finished.
pub struct SimHarness<M: MockSubstrate = NoMocks> {
    mocks: M,
    settings: SimSettings,
    logger: Logger,
    debug_items: DebugItems,
}

impl SimHarness<NoMocks> {
    pub fn new() -> Self {
        Self::with_mocks(NoMocks)
    }
}

impl Default for SimHarness<NoMocks> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MockSubstrate + fmt::Debug> fmt::Debug for SimHarness<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimHarness")
            .field("mocks", &self.mocks)
            .field("settings", &self.settings)
            .field("debug_items", &self.debug_items)
            .finish()
    }
}

impl<M: MockSubstrate> SimHarness<M> {
    pub fn with_mocks(mocks: M) -> Self {
        Self {
            mocks,
            settings: SimSettings::default(),
            logger: Logger::default(),
            debug_items: DebugItems::new(),
        }
    }

    /// Harness configured from the shared engine config.
    pub fn from_config(config: &EngineConfig, mocks: M) -> Self {
        Self {
            mocks,
            settings: SimSettings::from(config),
            logger: Logger::new(config.logging.clone()),
            debug_items: DebugItems::new(),
        }
    }

    pub fn with_settings(mut self, settings: SimSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.resource_dir = Some(dir.into());
        self
    }

    pub fn with_debug_enabled(mut self, enabled: bool) -> Self {
        self.settings.debug_enabled = enabled;
        self
    }

    pub fn with_horizontal_logs(mut self, horizontal: bool) -> Self {
        self.settings.horizontal_logs = horizontal;
        self
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn mocks(&self) -> &M {
        &self.mocks
    }

    pub fn mocks_mut(&mut self) -> &mut M {
        &mut self.mocks
    }

    /// Record a debug item outside any phase; returns `value`.
    pub fn debug<V: fmt::Debug>(&mut self, value: V) -> V {
        self.debug_items.push(&value);
        value
    }

    pub fn debug_as<V: fmt::Debug>(&mut self, key: impl Into<String>, value: V) -> V {
        self.debug_items.insert(key, &value);
        value
    }

    /// Items recorded since the last test finished.
    pub fn debug_items(&self) -> &DebugItems {
        &self.debug_items
    }

    /// Build a plan with `build`, run it, verify the mocks, then print and
    /// clear debug items.
    ///
    /// Errors carry the failing phase, the assertion log, or the mock
    /// verification failure.
    pub fn test<'a, T, F>(&mut self, build: F) -> anyhow::Result<()>
    where
        T: PartialEq + fmt::Debug + 'a,
        M: 'a,
        F: FnOnce(&mut TestPlan<'a, T, M>),
    {
        let mut plan = TestPlan::new(self.settings.resource_dir.clone(), None);
        build(&mut plan);
        self.run(plan)
    }

    /// Like [`SimHarness::test`], but the plan may also use the async
    /// `co_*` phases. They run on a current-thread tokio runtime owned by
    /// this test, so this must not be called from inside another runtime.
    pub fn test_blocking<'a, T, F>(&mut self, build: F) -> anyhow::Result<()>
    where
        T: PartialEq + fmt::Debug + 'a,
        M: 'a,
        F: FnOnce(&mut TestPlan<'a, T, M>),
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("building the test runtime")?;
        let runtime = Some(Rc::new(runtime));
        let mut plan = TestPlan::new(self.settings.resource_dir.clone(), runtime);
        build(&mut plan);
        self.run(plan)
    }

    fn run<'a, T>(&mut self, plan: TestPlan<'a, T, M>) -> anyhow::Result<()>
    where
        T: PartialEq + fmt::Debug + 'a,
        M: 'a,
    {
        let (result, items) = plan.execute(&mut self.mocks, &self.settings, &self.logger);
        self.debug_items.append(items);

        if let Err(err) = &result {
            self.logger.error(SIM, format!("{err:#}"));
        }
        if self.settings.debug_enabled {
            self.logger.info(SIM, self.debug_items.render());
        }
        self.debug_items.clear();

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casematrix_logging::{LogLevel, LoggingConfig};

    fn quiet() -> SimHarness {
        SimHarness::new().with_logger(Logger::in_memory(LoggingConfig::new()))
    }

    #[test]
    fn passing_plan() {
        let mut harness = quiet();
        harness
            .test(|plan| {
                plan.setup(|p| {
                    p.set("a", 2).set("b", 3);
                })
                .expect_value(5)
                .whenever(|p| {
                    let a = p.require("a").ok()?.as_i64()?;
                    let b = p.require("b").ok()?.as_i64()?;
                    Some(a + b)
                });
            })
            .unwrap();
    }

    #[test]
    fn mismatch_reports_expect_and_actual() {
        let mut harness = quiet();
        let err = harness
            .test(|plan| {
                plan.expect_value(1).whenever(|_| Some(2)).then_equals("sum");
            })
            .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @r"
        FAILED sum
        EXPECT: 1
        ACTUAL: 2
        ");
    }

    #[test]
    fn horizontal_mismatch() {
        let mut harness = quiet().with_horizontal_logs(true);
        let err = harness
            .test(|plan| {
                plan.expect_value("ab".to_string())
                    .whenever(|_| Some("ac".to_string()));
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "EXPECT    ACTUAL\n\"ab\"      \"ac\"");
    }

    #[test]
    fn missing_sides_render_as_null() {
        let mut harness = quiet();
        let err = harness
            .test(|plan| {
                plan.expect_none().whenever(|_| Some(4));
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "EXPECT: null\nACTUAL: 4");
    }

    #[test]
    fn setup_is_visible_to_expect() {
        let mut harness = quiet();
        harness
            .test(|plan| {
                plan.expect(|p| p.get("x").and_then(|v| v.as_i64()))
                    .setup(|p| {
                        p.set("x", 9);
                    })
                    .whenever(|_| Some(9));
            })
            .unwrap();
    }

    #[test]
    fn expected_is_visible_to_action() {
        let mut harness = quiet();
        harness
            .test(|plan| {
                plan.expect_value(11).whenever(|p| p.expected().copied());
            })
            .unwrap();
    }

    #[test]
    fn teardown_runs_after_a_panicking_action() {
        let mut harness = quiet();
        let torn_down = std::cell::Cell::new(false);
        let err = harness
            .test(|plan| {
                plan.expect_value(1)
                    .whenever(|_| panic!("exploded"))
                    .teardown(|_| torn_down.set(true));
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "action phase panicked: exploded");
        assert!(torn_down.get());
    }

    #[test]
    fn teardown_failure_fails_a_passing_test() {
        let mut harness = quiet();
        let err = harness
            .test(|plan| {
                plan.expect_value(1)
                    .whenever(|_| Some(1))
                    .teardown(|_| panic!("cleanup"));
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "teardown phase panicked: cleanup");
    }

    #[test]
    fn first_failure_wins_over_teardown() {
        let mut harness = quiet();
        let err = harness
            .test(|plan| {
                plan.setup(|_| panic!("setup broke"))
                    .teardown(|_| panic!("cleanup"))
                    .expect_value(1);
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "setup phase panicked: setup broke");
        assert!(
            harness
                .logger()
                .messages()
                .iter()
                .any(|m| m == "teardown also failed: teardown phase panicked: cleanup")
        );
    }

    #[test]
    fn whenever_err_requires_failure() {
        let mut harness = quiet();
        harness
            .test(|plan| {
                plan.expect_none()
                    .whenever_err(|_| "x".parse::<i64>());
            })
            .unwrap();

        let err = harness
            .test(|plan| {
                plan.expect_none().whenever_err(|_| "7".parse::<i64>());
            })
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected the action to fail, but it returned 7"
        );
    }

    #[test]
    fn whenever_err_and_inspects_the_error() {
        let mut harness = quiet();
        let seen = std::cell::RefCell::new(String::new());
        harness
            .test(|plan| {
                plan.expect_none().whenever_err_and(
                    |_| Err::<i64, _>("denied".to_string()),
                    |err, _| *seen.borrow_mut() = err,
                );
            })
            .unwrap();
        assert_eq!(*seen.borrow(), "denied");
    }

    #[test]
    fn custom_then_replaces_equality() {
        let mut harness = quiet();
        harness
            .test(|plan| {
                plan.expect_value(10).whenever(|_| Some(12)).then(|e, a| {
                    let (e, a): (i32, i32) = (e.copied().unwrap(), a.copied().unwrap());
                    assert!((e - a).abs() <= 2);
                });
            })
            .unwrap();

        let err = harness
            .test(|plan| {
                plan.expect_value(0).then(|_, _| panic!("custom check failed"));
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "assertion phase panicked: custom check failed");
    }

    #[test]
    fn then_equals_after_runs_before_comparison() {
        let mut harness = quiet();
        let ran = std::cell::Cell::new(false);
        harness
            .test(|plan| {
                plan.expect_value(3)
                    .whenever(|_| Some(3))
                    .then_equals_after("three", |p| {
                        assert_eq!(p.expected(), Some(&3));
                        ran.set(true);
                    });
            })
            .unwrap();
        assert!(ran.get());
    }

    #[test]
    fn file_phases_resolve_against_resource_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("expected.txt"), "42\n").unwrap();
        std::fs::write(dir.path().join("input.txt"), "40").unwrap();

        let mut harness = quiet().with_resource_dir(dir.path());
        harness
            .test(|plan| {
                plan.expect_from_file_content("expected.txt", |content, _| {
                    content.trim().parse::<i64>().ok()
                })
                .whenever_with_file("input.txt", |path, _| {
                    let n: i64 = std::fs::read_to_string(path).ok()?.parse().ok()?;
                    Some(n + 2)
                });
            })
            .unwrap();
    }

    #[test]
    fn missing_file_fails_the_test() {
        let dir = tempfile::tempdir().unwrap();
        let mut harness = quiet().with_resource_dir(dir.path());
        let err = harness
            .test(|plan| {
                plan.expect_from_file_content("nope.txt", |c, _| Some(c));
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "File not available nope.txt");
    }

    #[test]
    fn debug_items_are_logged_then_cleared() {
        let logger = Logger::in_memory(LoggingConfig::new());
        let mut harness = SimHarness::new().with_logger(logger.clone());
        harness.debug_as("before", 1);

        harness
            .test(|plan| {
                plan.expect_value(2).whenever(|p| Some(p.debug(2)));
            })
            .unwrap();

        assert!(harness.debug_items().is_empty());
        let messages = logger.messages();
        let last = messages.last().unwrap();
        assert!(last.contains("DEBUG ITEMS"));
        assert!(last.contains("{before=1, 0=2}"));
    }

    #[test]
    fn debug_items_are_cleared_on_failure_too() {
        let mut harness = quiet();
        let _ = harness.test(|plan| {
            plan.expect_value(1).whenever(|p| Some(p.debug(3)));
        });
        assert!(harness.debug_items().is_empty());
    }

    #[test]
    fn disabled_debug_prints_nothing() {
        let logger = Logger::in_memory(LoggingConfig::new().with_level(LogLevel::Trace));
        let mut harness = SimHarness::new()
            .with_logger(logger.clone())
            .with_debug_enabled(false);
        harness
            .test(|plan| {
                plan.expect_value(1).whenever(|p| Some(p.debug(1)));
            })
            .unwrap();
        assert!(logger.messages().is_empty());
    }

    #[test]
    fn every_async_phase_is_awaited() {
        let mut harness = quiet();
        let phases = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let log = |name: &'static str| {
            let phases = phases.clone();
            async move {
                tokio::task::yield_now().await;
                phases.borrow_mut().push(name);
            }
        };

        harness
            .test_blocking(|plan| {
                plan.co_teardown(move |p| async move {
                    log("teardown").await;
                    p
                })
                .co_then(move |e: Option<&i64>, a: Option<&i64>| {
                    let same = e == a;
                    async move {
                        log("then").await;
                        assert!(same);
                    }
                })
                .co_whenever(move |p| {
                    let x = p.get("x").and_then(|v| v.as_i64());
                    async move {
                        log("whenever").await;
                        x.map(|x| x * 2)
                    }
                })
                .co_expect(move |p| {
                    let x = p.get("x").and_then(|v| v.as_i64());
                    async move {
                        log("expect").await;
                        x.map(|x| x + x)
                    }
                })
                .co_given(move |mut p| async move {
                    log("setup").await;
                    p.set("x", 21);
                    p
                });
            })
            .unwrap();

        assert_eq!(
            *phases.borrow(),
            ["setup", "expect", "whenever", "then", "teardown"]
        );
    }

    #[test]
    fn async_json_phases_compact_their_output() {
        let mut harness = quiet();
        harness
            .test_blocking::<String, _>(|plan| {
                plan.co_expect_json(|_| async { r#"{"b": 2, "a": 1}"#.to_string() })
                    .co_whenever_json(|_| async {
                        tokio::task::yield_now().await;
                        "{\n  \"a\": 1,\n  \"b\": 2\n}".to_string()
                    });
            })
            .unwrap();
    }

    #[test]
    fn async_phase_failures_still_tear_down() {
        let mut harness = quiet();
        let torn_down = std::cell::Cell::new(false);
        let err = harness
            .test_blocking(|plan| {
                plan.expect_value(1)
                    .co_whenever(|_| async {
                        tokio::task::yield_now().await;
                        None.or_else(|| panic!("async boom"))
                    })
                    .teardown(|_| torn_down.set(true));
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "action phase panicked: async boom");
        assert!(torn_down.get());
    }

    #[test]
    fn async_phases_need_test_blocking() {
        let mut harness = quiet();
        let err = harness
            .test(|plan| {
                plan.expect_value(1).co_whenever(|_| async { Some(1) });
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "async phases need SimHarness::test_blocking");
    }

    #[test]
    fn settings_follow_engine_config() {
        let config = EngineConfig {
            debug_enabled: false,
            horizontal_logs: true,
            resource_dir: Some(PathBuf::from("fixtures")),
            ..EngineConfig::default()
        };
        let harness = SimHarness::from_config(&config, NoMocks);
        assert_eq!(
            harness.settings(),
            &SimSettings {
                resource_dir: Some(PathBuf::from("fixtures")),
                debug_enabled: false,
                horizontal_logs: true,
            }
        );
    }
}
