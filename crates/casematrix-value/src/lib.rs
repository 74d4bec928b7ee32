//! Scenario values and parameter type descriptors.
//!
//! A scenario cell can hold any value, including null. Instead of inspecting
//! runtime types wherever a value is consumed, every [`Value`] belongs to a
//! closed set of variants and knows its [`ValueShape`] up front.

use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Serialize, Serializer};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Identity of a domain type used as a test parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectType {
    id: TypeId,
    name: &'static str,
}

impl ObjectType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// `my_crate::fixtures::Point<my_crate::Unit>` -> `Point<my_crate::Unit>`
fn short_type_name(full: &'static str) -> &'static str {
    let base_end = full.find('<').unwrap_or(full.len());
    match full[..base_end].rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

/// Declared type of a test-method parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    /// A type-descriptor handle.
    Type,
    Object(ObjectType),
}

impl ParamType {
    pub fn object<T: Any>() -> Self {
        ParamType::Object(ObjectType::of::<T>())
    }

    /// Exact runtime type match. Null is accepted by nothing.
    pub fn accepts(&self, value: &Value) -> bool {
        value.param_type() == Some(*self)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParamType::Bool => "Bool",
            ParamType::Int => "Int",
            ParamType::Float => "Float",
            ParamType::Str => "Str",
            ParamType::List => "List",
            ParamType::Map => "Map",
            ParamType::Type => "Type",
            ParamType::Object(object) => object.name(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a value binds to a parameter slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueShape {
    /// Bound by position only: null, sequences, mappings, type handles.
    Structural,
    /// Bound by position and exact type.
    Scalar,
}

/// An opaque domain value carried through a scenario.
#[derive(Clone)]
pub struct DomainObject {
    ty: ObjectType,
    repr: String,
    payload: Arc<dyn Any + Send + Sync>,
}

impl DomainObject {
    pub fn new<T: Any + Send + Sync + fmt::Debug>(value: T) -> Self {
        Self {
            ty: ObjectType::of::<T>(),
            repr: format!("{value:?}"),
            payload: Arc::new(value),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        self.ty
    }

    /// Captured `Debug` rendering of the payload.
    pub fn repr(&self) -> &str {
        &self.repr
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for DomainObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainObject")
            .field("type", &self.ty.name())
            .field("repr", &self.repr)
            .finish()
    }
}

impl PartialEq for DomainObject {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.repr == other.repr
    }
}

/// One scenario cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Type(ParamType),
    Object(DomainObject),
}

impl Value {
    pub fn object<T: Any + Send + Sync + fmt::Debug>(value: T) -> Self {
        Value::Object(DomainObject::new(value))
    }

    /// Runtime type of the value, `None` for null.
    pub fn param_type(&self) -> Option<ParamType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ParamType::Bool),
            Value::Int(_) => Some(ParamType::Int),
            Value::Float(_) => Some(ParamType::Float),
            Value::Str(_) => Some(ParamType::Str),
            Value::List(_) => Some(ParamType::List),
            Value::Map(_) => Some(ParamType::Map),
            Value::Type(_) => Some(ParamType::Type),
            Value::Object(object) => Some(ParamType::Object(object.object_type())),
        }
    }

    pub fn shape(&self) -> ValueShape {
        match self {
            Value::Null | Value::List(_) | Value::Map(_) | Value::Type(_) => ValueShape::Structural,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) | Value::Object(_) => {
                ValueShape::Scalar
            }
        }
    }

    /// Name used in resolution errors.
    pub fn type_name(&self) -> &'static str {
        self.param_type().map(|ty| ty.name()).unwrap_or("null")
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Stringified form used to label a scenario; `None` for null.
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<ParamType> {
        match self {
            Value::Type(ty) => Some(*ty),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Object(object) => object.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Type(_) | Value::Object(_) => serde_json::Value::String(self.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => write!(f, "[{}]", items.iter().join(", ")),
            Value::Map(map) => write!(
                f,
                "{{{}}}",
                map.iter().map(|(k, v)| format!("{k}={v}")).join(", ")
            ),
            Value::Type(ty) => write!(f, "class {ty}"),
            Value::Object(object) => f.write_str(object.repr()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Str(value.clone())
    }
}

impl From<ParamType> for Value {
    fn from(value: ParamType) -> Self {
        Value::Type(value)
    }
}

impl From<DomainObject> for Value {
    fn from(value: DomainObject) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<V: Into<Value>> From<IndexMap<String, V>> for Value {
    fn from(value: IndexMap<String, V>) -> Self {
        Value::Map(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Build one scenario row from heterogeneous values.
///
/// ```
/// use casematrix_value::{row, Value};
/// let values = row!["2+3=5", 2, 3, Value::Null];
/// assert_eq!(values.len(), 4);
/// ```
#[macro_export]
macro_rules! row {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn shapes_split_structural_from_scalar() {
        assert_eq!(Value::Null.shape(), ValueShape::Structural);
        assert_eq!(Value::from(vec![1, 2]).shape(), ValueShape::Structural);
        assert_eq!(Value::Map(IndexMap::new()).shape(), ValueShape::Structural);
        assert_eq!(Value::from(ParamType::Int).shape(), ValueShape::Structural);

        assert_eq!(Value::from(1).shape(), ValueShape::Scalar);
        assert_eq!(Value::from("a").shape(), ValueShape::Scalar);
        assert_eq!(Value::from(true).shape(), ValueShape::Scalar);
        assert_eq!(Value::from(1.5).shape(), ValueShape::Scalar);
        assert_eq!(Value::object(Point { x: 1, y: 2 }).shape(), ValueShape::Scalar);
    }

    #[test]
    fn accepts_is_exact() {
        assert!(ParamType::Int.accepts(&Value::from(3)));
        assert!(!ParamType::Int.accepts(&Value::from("3")));
        assert!(!ParamType::Int.accepts(&Value::from(3.0)));
        assert!(!ParamType::Str.accepts(&Value::Null));
    }

    #[test]
    fn object_types_match_by_type_identity() {
        let value = Value::object(Point { x: 1, y: 2 });
        assert!(ParamType::object::<Point>().accepts(&value));
        assert!(!ParamType::object::<String>().accepts(&value));
        assert_eq!(ParamType::object::<Point>().name(), "Point");
        assert_eq!(value.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
        assert_eq!(value.downcast_ref::<String>(), None);
    }

    #[test]
    fn display_renders_like_a_scenario_table() {
        let mut map = IndexMap::new();
        map.insert("a".to_string(), Value::from(1));
        map.insert("b".to_string(), Value::Null);

        assert_eq!(Value::from(vec!["x", "y"]).to_string(), "[x, y]");
        assert_eq!(Value::Map(map).to_string(), "{a=1, b=null}");
        assert_eq!(Value::from(ParamType::Int).to_string(), "class Int");
        assert_eq!(Value::object(Point { x: 1, y: 2 }).to_string(), "Point { x: 1, y: 2 }");
    }

    #[test]
    fn label_is_none_only_for_null() {
        assert_eq!(Value::Null.label(), None);
        assert_eq!(Value::from("first").label(), Some("first".to_string()));
        assert_eq!(Value::from(7).label(), Some("7".to_string()));
    }

    #[test]
    fn whole_floats_keep_their_decimal_point() {
        assert_eq!(Value::from(1.0).label(), Some("1.0".to_string()));
        assert_eq!(Value::from(2.5).label(), Some("2.5".to_string()));
        assert_ne!(Value::from(1.0).label(), Value::from(1).label());
        assert_eq!(Value::List(vec![Value::from(3.0)]).to_string(), "[3.0]");
    }

    #[test]
    fn from_json_prefers_ints() {
        let json = serde_json::json!({"n": 3, "f": 1.5, "s": "x", "l": [true, null]});
        let value = Value::from(json);
        let map = value.as_map().unwrap();
        assert_eq!(map["n"], Value::Int(3));
        assert_eq!(map["f"], Value::Float(1.5));
        assert_eq!(map["s"], Value::from("x"));
        assert_eq!(map["l"], Value::List(vec![Value::Bool(true), Value::Null]));
    }

    #[test]
    fn option_none_is_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(4)), Value::Int(4));
    }

    #[test]
    fn row_macro_converts_each_cell() {
        let values = row!["first", 2, 3.5, Value::Null, vec![1, 2]];
        assert_eq!(
            values,
            vec![
                Value::from("first"),
                Value::Int(2),
                Value::Float(3.5),
                Value::Null,
                Value::List(vec![Value::Int(1), Value::Int(2)]),
            ]
        );
    }

    #[test]
    fn serializes_through_json() {
        let value = Value::from(vec![Value::from(1), Value::from("a"), Value::from(ParamType::Str)]);
        insta::assert_snapshot!(serde_json::to_string(&value).unwrap(), @r#"[1,"a","class Str"]"#);
    }
}
