//! Six-phase unit test harness.
//!
//! A test is declared as a [`TestPlan`] (setup, expect, mock setup, action,
//! assertion, teardown) and executed by a [`SimHarness`], which owns the
//! mocking substrate, prints debug items and mock metrics through the
//! casematrix logger, and reports failures as `anyhow` errors.
//! [`SimHarness::test_blocking`] additionally accepts async (`co_*`) phases.
//!
//! ```
//! use casematrix_sim::SimHarness;
//!
//! let mut harness = SimHarness::new().with_debug_enabled(false);
//! harness
//!     .test(|plan| {
//!         plan.setup(|p| {
//!             p.set("name", "casematrix");
//!         })
//!         .expect_value(10)
//!         .whenever(|p| p.get("name")?.as_str().map(|s| s.len()));
//!     })
//!     .unwrap();
//! ```

mod co;
pub mod harness;
mod json;
pub mod mock;
pub mod plan;
mod properties;

pub use harness::{SimHarness, SimSettings};
pub use json::compact_json;
pub use mock::{MockRegistry, MockSubstrate, MockTask, NoMocks};
pub use plan::TestPlan;
pub use properties::Properties;
