//! Boxed debug printers and diff helpers used by the simulation harness.
//!
//! Everything here renders to a `String`; the caller decides where it goes
//! (usually [`crate::Logger`]).

use indexmap::IndexMap;
use itertools::Itertools;
use std::any::Any;
use std::fmt;

pub const DEBUG_ITEMS_TITLE: &str = "DEBUG ITEMS";
pub const MOCK_METRICS_TITLE: &str = "MOCK METRICS";
pub const NO_DEBUG_ITEMS: &str = "No debug items found";

/// Minimum inner width of a debug box.
pub const MIN_WIDTH: usize = 26;

/// Gap between the EXPECT and ACTUAL columns of a horizontal log.
const PADDING: usize = 4;

/// Ordered debug values recorded during one test.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebugItems {
    items: IndexMap<String, String>,
}

impl DebugItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` under `key`, replacing any earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: &impl fmt::Debug) {
        self.items.insert(key.into(), format!("{value:?}"));
    }

    /// Record `value` under the current item count. Returns the key used.
    pub fn push(&mut self, value: &impl fmt::Debug) -> String {
        let key = self.items.len().to_string();
        self.insert(key.clone(), value);
        key
    }

    /// Move every item of `other` into `self`, in order.
    pub fn append(&mut self, other: DebugItems) {
        self.items.extend(other.items);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Boxed table, or [`NO_DEBUG_ITEMS`] when empty.
    pub fn render(&self) -> String {
        if self.items.is_empty() {
            return NO_DEBUG_ITEMS.to_string();
        }
        let body = format!(
            "{{{}}}",
            self.items.iter().map(|(k, v)| format!("{k}={v}")).join(", ")
        );
        let lines: Vec<&str> = body.split('\n').collect();
        boxed(DEBUG_ITEMS_TITLE, &lines)
    }
}

/// How the registered mock tasks were applied to the substrate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockMetrics {
    pub thrown: usize,
    pub called: usize,
    pub null: usize,
    pub returned: usize,
}

impl MockMetrics {
    /// Number of tasks applied. `null` and `returned` split `called`.
    pub fn total(&self) -> usize {
        self.thrown + self.called
    }

    pub fn render(&self) -> String {
        let lines = [
            format!("# THROWN: {}", self.thrown),
            format!("# CALLED: {}", self.called),
            format!("# NULL: {}", self.null),
            format!("# RETURNED: {}", self.returned),
        ];
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        boxed(MOCK_METRICS_TITLE, &lines)
    }
}

fn boxed(title: &str, lines: &[&str]) -> String {
    let width = lines
        .iter()
        .map(|line| line.chars().count())
        .chain([title.chars().count(), MIN_WIDTH])
        .max()
        .unwrap_or(MIN_WIDTH);
    let bar = "═".repeat(width + 2);

    let title_len = title.chars().count();
    let left = (width - title_len) / 2;
    let right = width - title_len - left;

    let mut out = Vec::with_capacity(lines.len() + 4);
    out.push(format!("╔{bar}╗"));
    out.push(format!("║ {}{title}{} ║", " ".repeat(left), " ".repeat(right)));
    out.push(format!("╠{bar}╣"));
    out.extend(lines.iter().map(|line| format!("║ {line:<width$} ║")));
    out.push(format!("╚{bar}╝"));
    out.join("\n")
}

/// Failure report for an expected/actual mismatch.
pub fn assertion_log(expected: &str, actual: &str, message: Option<&str>, horizontal: bool) -> String {
    let mut out = String::new();
    if let Some(message) = message {
        out.push_str(&format!("FAILED {message}\n"));
    }
    if horizontal {
        out.push_str(&horizontal_log(expected, actual));
    } else {
        out.push_str(&format!("EXPECT: {expected}\nACTUAL: {actual}"));
    }
    out
}

/// Text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// EXPECT and ACTUAL side by side, one source line per row.
pub fn horizontal_log(expected: &str, actual: &str) -> String {
    let expected_lines: Vec<&str> = expected.split('\n').collect();
    let actual_lines: Vec<&str> = actual.split('\n').collect();

    let width = expected_lines
        .iter()
        .map(|line| line.chars().count())
        .chain(["EXPECT".len()])
        .max()
        .unwrap_or_default();
    let gap = " ".repeat(PADDING);

    let rows = expected_lines.len().max(actual_lines.len());
    let mut out = vec![format!("{:<width$}{gap}ACTUAL", "EXPECT")];
    for i in 0..rows {
        let e = expected_lines.get(i).copied().unwrap_or_default();
        let a = actual_lines.get(i).copied().unwrap_or_default();
        out.push(format!("{e:<width$}{gap}{a}").trim_end().to_string());
    }
    out.join("\n")
}

/// One side of a character-wise comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    pub original: String,
    /// `_` where both sides agree, the differing character otherwise.
    pub differences: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifferenceGroup {
    pub first: Difference,
    pub second: Difference,
}

impl fmt::Display for DifferenceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(64);
        writeln!(f, "ORIGINAL FIRST")?;
        writeln!(f, "{}", self.first.original)?;
        writeln!(f, "COMPARED")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "{}", self.first.differences)?;
        writeln!(f, "{}", self.second.differences)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "ORIGINAL SECOND")?;
        write!(f, "{}", self.second.original)
    }
}

/// Character-wise diff; the shorter side is padded with spaces.
pub fn find_differences(first: &str, second: &str) -> DifferenceGroup {
    let a: Vec<char> = first.chars().collect();
    let b: Vec<char> = second.chars().collect();
    let len = a.len().max(b.len());
    let at = |chars: &[char], i: usize| chars.get(i).copied().unwrap_or(' ');

    let diff = |this: &[char], other: &[char]| -> String {
        (0..len)
            .map(|i| {
                let c = at(this, i);
                if c == at(other, i) { '_' } else { c }
            })
            .collect()
    };

    DifferenceGroup {
        first: Difference {
            original: first.to_string(),
            differences: diff(&a, &b),
        },
        second: Difference {
            original: second.to_string(),
            differences: diff(&b, &a),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_items_render_placeholder() {
        assert_eq!(DebugItems::new().render(), "No debug items found");
    }

    #[test]
    fn push_keys_by_count() {
        let mut items = DebugItems::new();
        assert_eq!(items.push(&"a"), "0");
        assert_eq!(items.push(&2), "1");
        assert_eq!(items.get("0"), Some("\"a\""));
        assert_eq!(items.get("1"), Some("2"));
    }

    #[test]
    fn debug_items_box() {
        let mut items = DebugItems::new();
        items.push(&"hello");
        items.insert("sum", &5);
        insta::assert_snapshot!(items.render(), @r#"
        ╔════════════════════════════╗
        ║        DEBUG ITEMS         ║
        ╠════════════════════════════╣
        ║ {0="hello", sum=5}         ║
        ╚════════════════════════════╝
        "#);
    }

    #[test]
    fn wide_items_grow_the_box() {
        let mut items = DebugItems::new();
        items.insert("key", &"x".repeat(40));
        let rendered = items.render();
        let widths: Vec<usize> = rendered.lines().map(|l| l.chars().count()).collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
        assert!(widths[0] > MIN_WIDTH + 4);
    }

    #[test]
    fn mock_metrics_box() {
        let metrics = MockMetrics {
            thrown: 1,
            called: 2,
            null: 0,
            returned: 3,
        };
        assert_eq!(metrics.total(), 3);
        insta::assert_snapshot!(metrics.render(), @r"
        ╔════════════════════════════╗
        ║        MOCK METRICS        ║
        ╠════════════════════════════╣
        ║ # THROWN: 1                ║
        ║ # CALLED: 2                ║
        ║ # NULL: 0                  ║
        ║ # RETURNED: 3              ║
        ╚════════════════════════════╝
        ");
    }

    #[test]
    fn vertical_assertion_log() {
        assert_eq!(
            assertion_log("1", "2", Some("sum"), false),
            "FAILED sum\nEXPECT: 1\nACTUAL: 2"
        );
        assert_eq!(assertion_log("a", "b", None, false), "EXPECT: a\nACTUAL: b");
    }

    #[test]
    fn horizontal_columns_align() {
        let log = horizontal_log("abc\nde", "abd\nde\nextra");
        assert_eq!(
            log,
            "EXPECT    ACTUAL\nabc       abd\nde        de\n          extra"
        );
    }

    #[test]
    fn horizontal_width_follows_longest_expected_line() {
        let log = horizontal_log("a long expected line", "short");
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines[0].find("ACTUAL"), Some("a long expected line".len() + 4));
        assert_eq!(lines[1], "a long expected line    short");
    }

    #[test]
    fn differences_mark_equal_positions() {
        let group = find_differences("abc", "abd");
        assert_eq!(group.first.differences, "__c");
        assert_eq!(group.second.differences, "__d");
    }

    #[test]
    fn differences_pad_shorter_side() {
        let group = find_differences("ab", "abcd");
        assert_eq!(group.first.differences, "__  ");
        assert_eq!(group.second.differences, "__cd");
    }

    #[test]
    fn difference_group_display() {
        let rendered = find_differences("cat", "cut").to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "ORIGINAL FIRST");
        assert_eq!(lines[1], "cat");
        assert_eq!(lines[4], "_a_");
        assert_eq!(lines[5], "_u_");
        assert_eq!(lines[8], "cut");
    }

    fn caught(f: impl FnOnce()) -> Box<dyn Any + Send> {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
            Ok(()) => panic!("closure did not panic"),
            Err(payload) => payload,
        }
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        assert_eq!(panic_message(caught(|| panic!("static")).as_ref()), "static");

        let n = 3;
        assert_eq!(
            panic_message(caught(|| panic!("formatted {n}")).as_ref()),
            "formatted 3"
        );

        assert_eq!(
            panic_message(caught(|| std::panic::panic_any(7_u8)).as_ref()),
            "non-string panic payload"
        );
    }
}
