//! A call-site table standing in for a real mocking library.

use casematrix_sim::MockSubstrate;
use casematrix_value::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq)]
enum Stub {
    Return(Value),
    Unit,
    Throw(String),
}

#[derive(Debug, Default)]
struct Recorder {
    stubs: HashMap<String, Stub>,
    invoked: Vec<String>,
    verified: BTreeSet<String>,
}

/// Shared stub table keyed by call-site name.
///
/// Clones share state, so the code under test can hold one clone while the
/// harness owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingMocks {
    inner: Arc<Mutex<Recorder>>,
}

impl RecordingMocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke `site` the way production code would.
    ///
    /// Unstubbed sites fail and are still recorded.
    pub fn call(&self, site: &str) -> Result<Option<Value>, String> {
        let mut recorder = self.lock();
        recorder.invoked.push(site.to_string());
        match recorder.stubs.get(site) {
            Some(Stub::Return(value)) => Ok(Some(value.clone())),
            Some(Stub::Unit) => Ok(None),
            Some(Stub::Throw(message)) => Err(message.clone()),
            None => Err(format!("no stub for {site}")),
        }
    }

    /// Every call made so far, in order.
    pub fn invocations(&self) -> Vec<String> {
        self.lock().invoked.clone()
    }

    /// Forget stubs, calls and verifications.
    pub fn reset(&self) {
        *self.lock() = Recorder::default();
    }

    fn lock(&self) -> MutexGuard<'_, Recorder> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MockSubstrate for RecordingMocks {
    type CallSite = String;
    type Output = Value;
    type Failure = String;

    fn stub_return(&mut self, call: &String, output: Value) {
        self.lock().stubs.insert(call.clone(), Stub::Return(output));
    }

    fn stub_unit(&mut self, call: &String) {
        self.lock().stubs.insert(call.clone(), Stub::Unit);
    }

    fn stub_throw(&mut self, call: &String, failure: String) {
        self.lock().stubs.insert(call.clone(), Stub::Throw(failure));
    }

    fn verify_invoked(&self, call: &String) -> anyhow::Result<()> {
        let mut recorder = self.lock();
        if !recorder.invoked.contains(call) {
            anyhow::bail!("expected a call to {call}, but it was never made");
        }
        recorder.verified.insert(call.clone());
        Ok(())
    }

    fn verify_all_consumed(&self) -> anyhow::Result<()> {
        let recorder = self.lock();
        let unverified: BTreeSet<&str> = recorder
            .invoked
            .iter()
            .filter(|site| !recorder.verified.contains(*site))
            .map(String::as_str)
            .collect();
        if unverified.is_empty() {
            Ok(())
        } else {
            let sites: Vec<&str> = unverified.into_iter().collect();
            anyhow::bail!("unverified calls: {}", sites.join(", "))
        }
    }
}
