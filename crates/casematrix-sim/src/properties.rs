use casematrix_logging::DebugItems;
use casematrix_value::Value;
use indexmap::IndexMap;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;

/// Named values shared by the phases of one simulated test, plus the
/// expected result once the expect phase has run.
pub struct Properties<T> {
    values: IndexMap<String, Value>,
    expected: Option<T>,
    debug: RefCell<DebugItems>,
}

impl<T> Default for Properties<T> {
    fn default() -> Self {
        Self {
            values: IndexMap::new(),
            expected: None,
            debug: RefCell::new(DebugItems::new()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Properties<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Properties")
            .field("values", &self.values)
            .field("expected", &self.expected)
            .finish()
    }
}

impl<T> Properties<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn require(&self, name: &str) -> anyhow::Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("property {name} was never set"))
    }

    /// Borrow a domain object stored with [`Value::object`].
    pub fn object<U: Any>(&self, name: &str) -> anyhow::Result<&U> {
        let value = self.require(name)?;
        value.downcast_ref::<U>().ok_or_else(|| {
            anyhow::anyhow!(
                "property {name} holds {}, not {}",
                value.type_name(),
                std::any::type_name::<U>()
            )
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.values.iter()
    }

    /// Result of the expect phase; `None` before it ran or when it expects nothing.
    pub fn expected(&self) -> Option<&T> {
        self.expected.as_ref()
    }

    pub(crate) fn set_expected(&mut self, expected: Option<T>) {
        self.expected = expected;
    }

    /// Record a debug item keyed by the current item count; returns `value`.
    pub fn debug<V: fmt::Debug>(&self, value: V) -> V {
        self.debug.borrow_mut().push(&value);
        value
    }

    pub fn debug_as<V: fmt::Debug>(&self, key: impl Into<String>, value: V) -> V {
        self.debug.borrow_mut().insert(key, &value);
        value
    }

    pub(crate) fn take_debug_items(&mut self) -> DebugItems {
        std::mem::take(self.debug.get_mut())
    }
}
