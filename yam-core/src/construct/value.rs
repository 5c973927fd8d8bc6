use crate::construct::object::{DynObject, ObjectRef, YamlObject};
use crate::construct::timestamp::Timestamp;
use indexmap::{IndexMap, IndexSet};
use std::cell::RefCell;
use std::fmt::{Debug, Display, Formatter, Write};
use std::hash::{Hash, Hasher};
use std::mem::discriminant;
use std::rc::Rc;
use yam_common::{YamlError, YamlResult};

/// Mutable container handle. Aliases in a document resolve to clones of the
/// same handle, so sharing and cycles survive construction.
pub type Shared<T> = Rc<RefCell<T>>;

pub type Mapping = IndexMap<Value, Value>;

///
/// A constructed YAML value.
///
/// Collections are shared handles: cloning a [`Value::Seq`] clones the handle,
/// not the items. Equality of collections compares contents, hashing of
/// collections only looks at the variant, so a collection can be mutated while
/// it is used as a key.
///
/// # Methods
/// - [`Value::seq`], [`Value::map`] and [`Value::set`] wrap fresh collections.
/// - `as_*` accessors borrow scalar content.
/// - [`Value::identity`] gives the address of a shared container.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Binary(Vec<u8>),
    Timestamp(Timestamp),
    Seq(Shared<Vec<Value>>),
    Map(Shared<Mapping>),
    Set(Shared<IndexSet<Value>>),
    /// `!!omap`, an ordered mapping written as a sequence of single pairs.
    Omap(Shared<Mapping>),
    /// `!!pairs`, like `!!omap` but keys may repeat.
    Pairs(Shared<Vec<(Value, Value)>>),
    Object(ObjectRef),
}

impl Value {
    #[must_use]
    pub fn seq(items: Vec<Value>) -> Value {
        Value::Seq(Rc::new(RefCell::new(items)))
    }

    #[must_use]
    pub fn map<K: Into<Value>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Value {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Value::Map(Rc::new(RefCell::new(map)))
    }

    #[must_use]
    pub fn set<K: Into<Value>>(keys: impl IntoIterator<Item = K>) -> Value {
        let set = keys.into_iter().map(Into::into).collect();
        Value::Set(Rc::new(RefCell::new(set)))
    }

    #[must_use]
    pub fn omap<K: Into<Value>, V: Into<Value>>(
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Value {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Value::Omap(Rc::new(RefCell::new(map)))
    }

    #[must_use]
    pub fn pairs<K: Into<Value>, V: Into<Value>>(
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Value {
        let pairs = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Value::Pairs(Rc::new(RefCell::new(pairs)))
    }

    #[must_use]
    pub fn object<T: YamlObject>(object: T) -> Value {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up a string key in a mapping, cloning the value handle.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let key = Value::from(key);
        match self {
            Value::Map(map) | Value::Omap(map) => map.try_borrow().ok()?.get(&key).cloned(),
            _ => None,
        }
    }

    /// Item of a sequence, cloning the value handle.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<Value> {
        match self {
            Value::Seq(items) => items.try_borrow().ok()?.get(index).cloned(),
            _ => None,
        }
    }

    /// Number of entries of a collection, `0` for scalars.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Value::Seq(items) => items.borrow().len(),
            Value::Map(map) | Value::Omap(map) => map.borrow().len(),
            Value::Set(set) => set.borrow().len(),
            Value::Pairs(pairs) => pairs.borrow().len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Address of the shared container or object, `None` for scalars.
    #[must_use]
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Seq(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            Value::Map(rc) | Value::Omap(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            Value::Set(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            Value::Pairs(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            Value::Object(rc) => Some(Rc::as_ptr(rc) as *const () as usize),
            _ => None,
        }
    }

    /// `true` when both values are the same shared container.
    #[must_use]
    pub fn same_identity(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Copies a bound object out of the value.
    pub fn to_object<T: YamlObject + Clone>(&self) -> YamlResult<T> {
        match self {
            Value::Object(obj) => {
                let borrowed = obj
                    .try_borrow()
                    .map_err(|_| mismatch(std::any::type_name::<T>(), self))?;
                borrowed
                    .as_any()
                    .downcast_ref::<T>()
                    .cloned()
                    .ok_or_else(|| mismatch(std::any::type_name::<T>(), self))
            }
            _ => Err(mismatch(std::any::type_name::<T>(), self)),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Binary(_) => "binary",
            Value::Timestamp(_) => "timestamp",
            Value::Seq(_) => "seq",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Omap(_) => "omap",
            Value::Pairs(_) => "pairs",
            Value::Object(_) => "object",
        }
    }

    fn write_guarded(&self, f: &mut Formatter<'_>, seen: &mut Vec<usize>) -> std::fmt::Result {
        if let Some(id) = self.identity() {
            if seen.contains(&id) {
                return f.write_str("<cycle>");
            }
            seen.push(id);
        }
        let result = match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Value::Timestamp(ts) => write!(f, "{ts}"),
            Value::Seq(items) => match items.try_borrow() {
                Ok(items) => {
                    f.write_char('[')?;
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        item.write_guarded(f, seen)?;
                    }
                    f.write_char(']')
                }
                Err(_) => f.write_str("[..]"),
            },
            Value::Map(map) | Value::Omap(map) => match map.try_borrow() {
                Ok(map) => {
                    f.write_char('{')?;
                    for (i, (k, v)) in map.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        k.write_guarded(f, seen)?;
                        f.write_str(": ")?;
                        v.write_guarded(f, seen)?;
                    }
                    f.write_char('}')
                }
                Err(_) => f.write_str("{..}"),
            },
            Value::Set(set) => match set.try_borrow() {
                Ok(set) => {
                    f.write_char('{')?;
                    for (i, k) in set.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        k.write_guarded(f, seen)?;
                    }
                    f.write_char('}')
                }
                Err(_) => f.write_str("{..}"),
            },
            Value::Pairs(pairs) => match pairs.try_borrow() {
                Ok(pairs) => {
                    f.write_char('[')?;
                    for (i, (k, v)) in pairs.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        k.write_guarded(f, seen)?;
                        f.write_str(": ")?;
                        v.write_guarded(f, seen)?;
                    }
                    f.write_char(']')
                }
                Err(_) => f.write_str("[..]"),
            },
            Value::Object(obj) => match obj.try_borrow() {
                Ok(obj) => write!(f, "{}", obj.type_name()),
                Err(_) => f.write_str("<object>"),
            },
        };
        if self.identity().is_some() {
            seen.pop();
        }
        result
    }
}

fn mismatch(expected: &str, found: &Value) -> YamlError {
    YamlError::constructor(
        None,
        None,
        format!("expected {expected}, but found {}", found.kind_name()),
        None,
    )
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.write_guarded(f, &mut Vec::new())
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            _ => {
                write!(f, "{}(", self.kind_name())?;
                self.write_guarded(f, &mut Vec::new())?;
                f.write_char(')')
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.same_identity(other) {
            return true;
        }
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => borrowed_eq(a, b),
            (Value::Map(a), Value::Map(b)) | (Value::Omap(a), Value::Omap(b)) => {
                borrowed_eq(a, b)
            }
            (Value::Set(a), Value::Set(b)) => borrowed_eq(a, b),
            (Value::Pairs(a), Value::Pairs(b)) => borrowed_eq(a, b),
            _ => false,
        }
    }
}

/// Containers being filled compare unequal to anything but themselves.
fn borrowed_eq<T: PartialEq>(a: &RefCell<T>, b: &RefCell<T>) -> bool {
    match (a.try_borrow(), b.try_borrow()) {
        (Ok(a), Ok(b)) => *a == *b,
        _ => false,
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        discriminant(self).hash(state);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(x) => {
                let canonical = if x.is_nan() {
                    f64::NAN
                } else if *x == 0.0 {
                    0.0
                } else {
                    *x
                };
                canonical.to_bits().hash(state);
            }
            Value::Str(s) => s.hash(state),
            Value::Binary(bytes) => bytes.hash(state),
            Value::Timestamp(ts) => ts.hash(state),
            Value::Object(_) => self.identity().hash(state),
            _ => {}
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
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

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::seq(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<Value> for String {
    type Error = YamlError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(mismatch("str", &other)),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = YamlError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value.as_i64().ok_or_else(|| mismatch("int", &value))
    }
}

impl TryFrom<Value> for f64 {
    type Error = YamlError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value.as_f64().ok_or_else(|| mismatch("float", &value))
    }
}

impl TryFrom<Value> for bool {
    type Error = YamlError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        value.as_bool().ok_or_else(|| mismatch("bool", &value))
    }
}

impl TryFrom<Value> for Vec<Value> {
    type Error = YamlError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match &value {
            Value::Seq(items) => Ok(items.borrow().clone()),
            _ => Err(mismatch("seq", &value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn containers_hash_by_variant() {
        let seq = Value::seq(vec![Value::from(1)]);
        let before = hash_of(&seq);
        if let Value::Seq(items) = &seq {
            items.borrow_mut().push(Value::from(2));
        }
        assert_eq!(before, hash_of(&seq));
        assert_ne!(hash_of(&Value::from("a")), hash_of(&Value::from("b")));
        assert_eq!(hash_of(&Value::Float(0.0)), hash_of(&Value::Float(-0.0)));
    }

    #[test]
    fn equality_and_identity() {
        let a = Value::seq(vec![Value::from("x")]);
        let b = Value::seq(vec![Value::from("x")]);
        assert_eq!(a, b);
        assert!(!a.same_identity(&b));
        assert!(a.same_identity(&a.clone()));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::from(1), Value::from(1.0));
    }

    #[test]
    fn cyclic_display() {
        let seq = Value::seq(Vec::new());
        if let Value::Seq(items) = &seq {
            items.borrow_mut().push(seq.clone());
        }
        assert_eq!(seq.to_string(), "[<cycle>]");
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn lookups() {
        let map = Value::map([("a", 1), ("b", 2)]);
        assert_eq!(map.get("b"), Some(Value::Int(2)));
        assert_eq!(map.get("c"), None);
        assert_eq!(map.to_string(), "{a: 1, b: 2}");
        let s: String = Value::from("text").try_into().expect("str");
        assert_eq!(s, "text");
        assert!(i64::try_from(Value::from("text")).is_err());
    }
}
