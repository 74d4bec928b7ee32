//! Parameter resolution for scenario-driven invocations.
//!
//! One resolver is produced per non-label scenario column. The host asks each
//! resolver whether it can fill a parameter slot (index plus declared type)
//! and, if so, for the value. Two policies exist:
//!
//! - [`PositionalResolver`] binds by index only. Used for structural values
//!   (null, lists, maps, type handles) whose runtime type says little about
//!   the declared parameter type.
//! - [`TypedResolver`] binds by index *and* exact type. Used for scalars.
//!
//! [`ValueResolver::for_value`] picks the policy from the value's
//! [`ValueShape`], so the choice is made once, at construction.

use casematrix_error::{Result, resolution_error};
use casematrix_value::{ObjectType, ParamType, Value, ValueShape};
use indexmap::IndexMap;
use serde::Serialize;
use std::any::Any;

/// A parameter position as seen by the host: zero-based index plus the
/// declared type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParameterSlot {
    pub index: usize,
    pub declared: ParamType,
}

impl ParameterSlot {
    pub fn new(index: usize, declared: ParamType) -> Self {
        Self { index, declared }
    }
}

/// Inspectable description of a resolver.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolverSpec {
    pub position_index: usize,
    pub value: Value,
    pub require_type_match: bool,
}

/// Binds one scenario value to one parameter slot.
pub trait ParameterResolver {
    fn supports(&self, slot: &ParameterSlot) -> bool;
    fn resolve(&self, slot: &ParameterSlot) -> Result<Value>;
    fn spec(&self) -> ResolverSpec;
}

/// Index-only binding.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionalResolver {
    index: usize,
    value: Value,
}

impl PositionalResolver {
    pub fn new(index: usize, value: Value) -> Self {
        Self { index, value }
    }
}

impl ParameterResolver for PositionalResolver {
    fn supports(&self, slot: &ParameterSlot) -> bool {
        slot.index == self.index
    }

    fn resolve(&self, _slot: &ParameterSlot) -> Result<Value> {
        Ok(self.value.clone())
    }

    fn spec(&self) -> ResolverSpec {
        ResolverSpec {
            position_index: self.index,
            value: self.value.clone(),
            require_type_match: false,
        }
    }
}

/// Index plus exact-type binding.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedResolver {
    index: usize,
    value: Value,
}

impl TypedResolver {
    pub fn new(index: usize, value: Value) -> Self {
        Self { index, value }
    }
}

impl ParameterResolver for TypedResolver {
    fn supports(&self, slot: &ParameterSlot) -> bool {
        slot.index == self.index && slot.declared.accepts(&self.value)
    }

    fn resolve(&self, slot: &ParameterSlot) -> Result<Value> {
        if slot.declared.accepts(&self.value) {
            Ok(self.value.clone())
        } else {
            Err(resolution_error(
                slot.declared.name(),
                self.value.type_name(),
                slot.index,
            ))
        }
    }

    fn spec(&self) -> ResolverSpec {
        ResolverSpec {
            position_index: self.index,
            value: self.value.clone(),
            require_type_match: true,
        }
    }
}

/// The resolver for one scenario cell.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueResolver {
    Positional(PositionalResolver),
    Typed(TypedResolver),
}

impl ValueResolver {
    /// Structural values bind positionally, scalars bind by type.
    pub fn for_value(index: usize, value: Value) -> Self {
        match value.shape() {
            ValueShape::Structural => ValueResolver::Positional(PositionalResolver::new(index, value)),
            ValueShape::Scalar => ValueResolver::Typed(TypedResolver::new(index, value)),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ValueResolver::Positional(r) => r.index,
            ValueResolver::Typed(r) => r.index,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            ValueResolver::Positional(r) => &r.value,
            ValueResolver::Typed(r) => &r.value,
        }
    }

    pub fn is_typed(&self) -> bool {
        matches!(self, ValueResolver::Typed(_))
    }
}

impl ParameterResolver for ValueResolver {
    fn supports(&self, slot: &ParameterSlot) -> bool {
        match self {
            ValueResolver::Positional(r) => r.supports(slot),
            ValueResolver::Typed(r) => r.supports(slot),
        }
    }

    fn resolve(&self, slot: &ParameterSlot) -> Result<Value> {
        match self {
            ValueResolver::Positional(r) => r.resolve(slot),
            ValueResolver::Typed(r) => r.resolve(slot),
        }
    }

    fn spec(&self) -> ResolverSpec {
        match self {
            ValueResolver::Positional(r) => r.spec(),
            ValueResolver::Typed(r) => r.spec(),
        }
    }
}

/// Fill every slot of `signature` from `resolvers`.
///
/// The first resolver that supports a slot wins. When none does, the
/// resolver sitting at that index (if any) reports its own failure;
/// otherwise the value is reported as `<missing>`. Resolvers past the end of
/// the signature are ignored.
pub fn resolve_arguments<R: ParameterResolver>(
    resolvers: &[R],
    signature: &[ParamType],
) -> Result<Arguments> {
    let mut values = Vec::with_capacity(signature.len());
    for (index, declared) in signature.iter().enumerate() {
        let slot = ParameterSlot::new(index, *declared);
        let value = match resolvers.iter().find(|r| r.supports(&slot)) {
            Some(resolver) => resolver.resolve(&slot)?,
            None => match resolvers.iter().find(|r| r.spec().position_index == index) {
                Some(resolver) => resolver.resolve(&slot)?,
                None => return Err(resolution_error(declared.name(), "<missing>", index)),
            },
        };
        values.push(value);
    }
    Ok(Arguments { values })
}

/// Resolved argument list for one invocation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn get(&self, index: usize) -> Result<&Value> {
        self.values
            .get(index)
            .ok_or_else(|| resolution_error("argument", "<missing>", index))
    }

    pub fn int(&self, index: usize) -> Result<i64> {
        self.typed(index, ParamType::Int, Value::as_i64)
    }

    pub fn float(&self, index: usize) -> Result<f64> {
        self.typed(index, ParamType::Float, Value::as_f64)
    }

    pub fn bool(&self, index: usize) -> Result<bool> {
        self.typed(index, ParamType::Bool, Value::as_bool)
    }

    pub fn str(&self, index: usize) -> Result<&str> {
        self.typed(index, ParamType::Str, Value::as_str)
    }

    pub fn list(&self, index: usize) -> Result<&[Value]> {
        self.typed(index, ParamType::List, Value::as_list)
    }

    pub fn map(&self, index: usize) -> Result<&IndexMap<String, Value>> {
        self.typed(index, ParamType::Map, Value::as_map)
    }

    /// Borrow a domain object of type `T`.
    pub fn object<T: Any>(&self, index: usize) -> Result<&T> {
        let value = self.get(index)?;
        value
            .downcast_ref::<T>()
            .ok_or_else(|| resolution_error(ObjectType::of::<T>().name(), value.type_name(), index))
    }

    fn typed<'a, T>(
        &'a self,
        index: usize,
        expected: ParamType,
        read: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<T> {
        let value = self.get(index)?;
        read(value).ok_or_else(|| resolution_error(expected.name(), value.type_name(), index))
    }
}

impl IntoIterator for Arguments {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
