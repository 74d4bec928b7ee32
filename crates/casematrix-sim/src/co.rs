//! Async variants of the plan phases.
//!
//! Each `co_*` builder takes a closure returning a future. The closure runs
//! synchronously with access to the properties; the future it returns is
//! driven to completion on the current-thread runtime that
//! [`crate::SimHarness::test_blocking`] creates for the test. Futures own
//! their data, so copy what they need out of the properties first:
//!
//! ```
//! use casematrix_sim::SimHarness;
//!
//! let mut harness = SimHarness::new().with_debug_enabled(false);
//! harness
//!     .test_blocking(|plan| {
//!         plan.co_setup(|mut p| async move {
//!             p.set("n", 20);
//!             p
//!         })
//!         .expect_value(21)
//!         .co_whenever(|p| {
//!             let n = p.get("n").and_then(|v| v.as_i64());
//!             async move { n.map(|n| n + 1) }
//!         });
//!     })
//!     .unwrap();
//! ```

use crate::mock::MockSubstrate;
use crate::plan::{Assertion, TestPlan};
use crate::properties::Properties;
use std::future::Future;
use tokio::runtime::Runtime;

pub(crate) fn require_runtime(runtime: Option<&Runtime>) -> anyhow::Result<&Runtime> {
    runtime.ok_or_else(|| anyhow::anyhow!("async phases need SimHarness::test_blocking"))
}

impl<'a, T: 'a, M: MockSubstrate + 'a> TestPlan<'a, T, M> {
    /// Async setup. The future receives the properties by value and hands
    /// them back.
    pub fn co_setup<Fut>(&mut self, f: impl FnOnce(Properties<T>) -> Fut + 'a) -> &mut Self
    where
        Fut: Future<Output = Properties<T>> + 'a,
    {
        let runtime = self.runtime.clone();
        self.setup = Some(Box::new(move |props: &mut Properties<T>| {
            let runtime = require_runtime(runtime.as_deref())?;
            let owned = std::mem::take(props);
            *props = runtime.block_on(f(owned));
            Ok(())
        }));
        self
    }

    /// Same as [`TestPlan::co_setup`].
    pub fn co_given<Fut>(&mut self, f: impl FnOnce(Properties<T>) -> Fut + 'a) -> &mut Self
    where
        Fut: Future<Output = Properties<T>> + 'a,
    {
        self.co_setup(f)
    }

    pub fn co_expect<Fut>(&mut self, f: impl FnOnce(&Properties<T>) -> Fut + 'a) -> &mut Self
    where
        Fut: Future<Output = Option<T>> + 'a,
    {
        let runtime = self.runtime.clone();
        self.expect = Some(Box::new(move |props: &Properties<T>| {
            Ok(require_runtime(runtime.as_deref())?.block_on(f(props)))
        }));
        self
    }

    pub fn co_whenever<Fut>(&mut self, f: impl FnOnce(&Properties<T>) -> Fut + 'a) -> &mut Self
    where
        Fut: Future<Output = Option<T>> + 'a,
    {
        let runtime = self.runtime.clone();
        self.action = Some(Box::new(move |props: &Properties<T>| {
            Ok(require_runtime(runtime.as_deref())?.block_on(f(props)))
        }));
        self
    }

    /// Async custom assertion over (expected, actual).
    pub fn co_then<Fut>(
        &mut self,
        f: impl FnOnce(Option<&T>, Option<&T>) -> Fut + 'a,
    ) -> &mut Self
    where
        Fut: Future<Output = ()> + 'a,
    {
        let runtime = self.runtime.clone();
        self.assertion = Assertion::Custom(Box::new(
            move |expected: Option<&T>, actual: Option<&T>| {
                require_runtime(runtime.as_deref())?.block_on(f(expected, actual));
                Ok(())
            },
        ));
        self
    }

    /// Async teardown; runs even when an earlier phase failed.
    pub fn co_teardown<Fut>(&mut self, f: impl FnOnce(Properties<T>) -> Fut + 'a) -> &mut Self
    where
        Fut: Future<Output = Properties<T>> + 'a,
    {
        let runtime = self.runtime.clone();
        self.teardown = Some(Box::new(move |props: &mut Properties<T>| {
            let runtime = require_runtime(runtime.as_deref())?;
            let owned = std::mem::take(props);
            *props = runtime.block_on(f(owned));
            Ok(())
        }));
        self
    }
}
