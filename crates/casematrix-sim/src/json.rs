use crate::co::require_runtime;
use crate::mock::MockSubstrate;
use crate::plan::TestPlan;
use crate::properties::Properties;
use anyhow::Context;
use std::future::Future;

/// Re-serialize `text` without insignificant whitespace. Object keys come
/// out sorted, so two documents that differ only in layout or key order
/// compact to the same string.
pub fn compact_json(text: &str) -> anyhow::Result<String> {
    let value: serde_json::Value = serde_json::from_str(text).context("invalid JSON")?;
    Ok(serde_json::to_string(&value)?)
}

impl<'a, M: MockSubstrate + 'a> TestPlan<'a, String, M> {
    /// Expect a JSON document, compared after compaction.
    pub fn expect_json(
        &mut self,
        f: impl FnOnce(&Properties<String>) -> String + 'a,
    ) -> &mut Self {
        self.expect = Some(Box::new(move |props: &Properties<String>| {
            compact_json(&f(props)).map(Some)
        }));
        self
    }

    /// Produce a JSON document, compared after compaction.
    pub fn whenever_json(
        &mut self,
        f: impl FnOnce(&Properties<String>) -> String + 'a,
    ) -> &mut Self {
        self.action = Some(Box::new(move |props: &Properties<String>| {
            compact_json(&f(props)).map(Some)
        }));
        self
    }

    /// Async twin of [`TestPlan::expect_json`].
    pub fn co_expect_json<Fut>(
        &mut self,
        f: impl FnOnce(&Properties<String>) -> Fut + 'a,
    ) -> &mut Self
    where
        Fut: Future<Output = String> + 'a,
    {
        let runtime = self.runtime.clone();
        self.expect = Some(Box::new(move |props: &Properties<String>| {
            let text = require_runtime(runtime.as_deref())?.block_on(f(props));
            compact_json(&text).map(Some)
        }));
        self
    }

    /// Async twin of [`TestPlan::whenever_json`].
    pub fn co_whenever_json<Fut>(
        &mut self,
        f: impl FnOnce(&Properties<String>) -> Fut + 'a,
    ) -> &mut Self
    where
        Fut: Future<Output = String> + 'a,
    {
        let runtime = self.runtime.clone();
        self.action = Some(Box::new(move |props: &Properties<String>| {
            let text = require_runtime(runtime.as_deref())?.block_on(f(props));
            compact_json(&text).map(Some)
        }));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compaction_ignores_layout_and_key_order() {
        let a = compact_json("{\n  \"b\": 1,\n  \"a\": [1, 2]\n}").unwrap();
        let b = compact_json(r#"{"a":[1,2],"b":1}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, r#"{"a":[1,2],"b":1}"#);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert_eq!(compact_json("{").unwrap_err().to_string(), "invalid JSON");
    }
}
