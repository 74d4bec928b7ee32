use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Borrow;
use std::fmt;

/// Identity of a scenario-driven test method.
///
/// The rule is simple:
/// - the test author supplies the name explicitly at registration time;
/// - lookups use the same string, nothing is discovered by reflection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodId(pub String);

impl MethodId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for MethodId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MethodId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&MethodId> for MethodId {
    fn from(value: &MethodId) -> Self {
        value.clone()
    }
}

impl Borrow<str> for MethodId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Stable identifier of one generated invocation.
///
/// Derived from the naming template and the scenario label, so it survives:
/// - re-runs
/// - different machines
/// - isolation filtering (the id does not depend on the invocation index)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(pub String);

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl InvocationId {
    pub fn from_parts(parts: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self(hash_hex(parts))
    }

    /// Short prefix for human-facing listings.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

fn hash_hex(parts: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    let mut hasher = Sha256::new();
    for (i, p) in parts.into_iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(p.as_ref().as_bytes());
    }
    let out = hasher.finalize();
    hex::encode(out)
}
