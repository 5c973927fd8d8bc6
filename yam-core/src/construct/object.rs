//! Binding of user types to mappings, scalars and argument lists.

use crate::construct::value::Value;
use hashbrown::HashMap;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;
use yam_common::{tags, YamlError, YamlResult};

pub type ObjectRef = Rc<RefCell<dyn DynObject>>;

/// Declared type of a field. It decides which tag an untagged value is
/// constructed with, e.g. `1` bound to a [`FieldKind::Str`] field stays a string.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Any,
    Str,
    Int,
    Float,
    Bool,
    Binary,
    Timestamp,
    Seq,
    Map,
    Set,
    /// A registered object type, by tag.
    Object(&'static str),
    /// A sequence of registered objects, by tag of the items.
    SeqOf(&'static str),
}

impl FieldKind {
    /// Tag implied for a value of this kind, `None` when any tag will do.
    #[must_use]
    pub fn tag(self) -> Option<&'static str> {
        match self {
            FieldKind::Any => None,
            FieldKind::Str => Some(tags::STR),
            FieldKind::Int => Some(tags::INT),
            FieldKind::Float => Some(tags::FLOAT),
            FieldKind::Bool => Some(tags::BOOL),
            FieldKind::Binary => Some(tags::BINARY),
            FieldKind::Timestamp => Some(tags::TIMESTAMP),
            FieldKind::Seq | FieldKind::SeqOf(_) => Some(tags::SEQ),
            FieldKind::Map => Some(tags::MAP),
            FieldKind::Set => Some(tags::SET),
            FieldKind::Object(tag) => Some(tag),
        }
    }
}

pub type Getter<T> = fn(&T) -> Value;
pub type Setter<T> = fn(&mut T, Value) -> YamlResult<()>;

pub struct Field<T> {
    pub name: &'static str,
    pub kind: FieldKind,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> Field<T> {
    pub fn get(&self, target: &T) -> Value {
        (self.get)(target)
    }

    pub fn set(&self, target: &mut T, value: Value) -> YamlResult<()> {
        (self.set)(target, value)
    }
}

/// Ordered list of the properties of `T`, filled by [`YamlObject::describe`].
pub struct FieldSet<T> {
    fields: Vec<Field<T>>,
}

impl<T> Default for FieldSet<T> {
    fn default() -> Self {
        FieldSet { fields: Vec::new() }
    }
}

impl<T> FieldSet<T> {
    pub fn field(
        &mut self,
        name: &'static str,
        kind: FieldKind,
        get: Getter<T>,
        set: Setter<T>,
    ) -> &mut Self {
        self.fields.push(Field {
            name,
            kind,
            get,
            set,
        });
        self
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Field<T>> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field<T>> {
        self.fields.iter()
    }
}

///
/// A type that can be loaded from and dumped to YAML.
///
/// Mappings are bound field by field onto [`Default::default`]. A scalar goes
/// through [`YamlObject::from_scalar`], a sequence through
/// [`YamlObject::from_arguments`].
///
/// ```ignore
/// #[derive(Clone, Debug, Default)]
/// struct Point { x: i64, y: i64 }
///
/// impl YamlObject for Point {
///     fn describe(fields: &mut FieldSet<Self>) {
///         fields
///             .field("x", FieldKind::Int, |p| p.x.into(), |p, v| { p.x = v.try_into()?; Ok(()) })
///             .field("y", FieldKind::Int, |p| p.y.into(), |p, v| { p.y = v.try_into()?; Ok(()) });
///     }
/// }
/// ```
pub trait YamlObject: Default + Debug + 'static {
    fn describe(fields: &mut FieldSet<Self>);

    fn from_scalar(_value: &str) -> Option<Self> {
        None
    }

    fn from_arguments(_args: Vec<Value>) -> Option<Self> {
        None
    }

    /// Scalar form used when dumping, `None` to dump as a mapping.
    fn to_scalar(&self) -> Option<String> {
        None
    }

    fn fields() -> FieldSet<Self> {
        let mut fields = FieldSet::default();
        Self::describe(&mut fields);
        fields
    }
}

/// Object safe view of a [`YamlObject`].
pub trait DynObject: Debug {
    fn type_name(&self) -> &'static str;

    fn properties(&self) -> Vec<(&'static str, FieldKind, Value)>;

    fn field_kind(&self, name: &str) -> Option<FieldKind>;

    /// Returns `false` when there is no such property.
    fn set_property(&mut self, name: &str, value: Value) -> YamlResult<bool>;

    fn to_scalar(&self) -> Option<String>;

    fn as_any(&self) -> &dyn Any;
}

impl<T: YamlObject> DynObject for T {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn properties(&self) -> Vec<(&'static str, FieldKind, Value)> {
        T::fields()
            .iter()
            .map(|field| (field.name, field.kind, field.get(self)))
            .collect()
    }

    fn field_kind(&self, name: &str) -> Option<FieldKind> {
        T::fields().find(name).map(|field| field.kind)
    }

    fn set_property(&mut self, name: &str, value: Value) -> YamlResult<bool> {
        match T::fields().find(name) {
            Some(field) => field.set(self, value).map(|()| true),
            None => Ok(false),
        }
    }

    fn to_scalar(&self) -> Option<String> {
        YamlObject::to_scalar(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn new_default<T: YamlObject>() -> ObjectRef {
    Rc::new(RefCell::new(T::default()))
}

fn new_from_scalar<T: YamlObject>(value: &str) -> Option<ObjectRef> {
    let object: ObjectRef = Rc::new(RefCell::new(T::from_scalar(value)?));
    Some(object)
}

fn new_from_arguments<T: YamlObject>(args: Vec<Value>) -> Option<ObjectRef> {
    let object: ObjectRef = Rc::new(RefCell::new(T::from_arguments(args)?));
    Some(object)
}

/// How a registered type is created, and under which tag.
#[derive(Clone, Debug)]
pub struct TypeDescription {
    tag: String,
    type_id: TypeId,
    type_name: &'static str,
    new_default: fn() -> ObjectRef,
    from_scalar: fn(&str) -> Option<ObjectRef>,
    from_arguments: fn(Vec<Value>) -> Option<ObjectRef>,
}

impl TypeDescription {
    #[must_use]
    pub fn of<T: YamlObject>(tag: impl Into<String>) -> TypeDescription {
        TypeDescription {
            tag: tag.into(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            new_default: new_default::<T>,
            from_scalar: new_from_scalar::<T>,
            from_arguments: new_from_arguments::<T>,
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn new_default(&self) -> ObjectRef {
        (self.new_default)()
    }

    #[must_use]
    pub fn from_scalar(&self, value: &str) -> Option<ObjectRef> {
        (self.from_scalar)(value)
    }

    #[must_use]
    pub fn from_arguments(&self, args: Vec<Value>) -> Option<ObjectRef> {
        (self.from_arguments)(args)
    }
}

/// Registered object types, looked up by tag when loading and by Rust type when dumping.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    by_tag: HashMap<String, TypeDescription>,
    by_type: HashMap<TypeId, String>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// Registers a description. Registering the same tag twice is an error, a
    /// type registered again under another tag dumps with the newest one.
    pub fn register(&mut self, description: TypeDescription) -> YamlResult<()> {
        if self.by_tag.contains_key(&description.tag) {
            return Err(YamlError::Config(format!(
                "tag {} is already registered",
                description.tag
            )));
        }
        self.by_type
            .insert(description.type_id, description.tag.clone());
        self.by_tag.insert(description.tag.clone(), description);
        Ok(())
    }

    #[must_use]
    pub fn by_tag(&self, tag: &str) -> Option<&TypeDescription> {
        self.by_tag.get(tag)
    }

    #[must_use]
    pub fn by_object(&self, object: &dyn DynObject) -> Option<&TypeDescription> {
        let tag = self.by_type.get(&object.as_any().type_id())?;
        self.by_tag.get(tag)
    }

    #[must_use]
    pub fn tag_of<T: 'static>(&self) -> Option<&str> {
        self.by_type.get(&TypeId::of::<T>()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl YamlObject for Point {
        fn describe(fields: &mut FieldSet<Self>) {
            fields
                .field(
                    "x",
                    FieldKind::Int,
                    |p| p.x.into(),
                    |p, v| {
                        p.x = v.try_into()?;
                        Ok(())
                    },
                )
                .field(
                    "y",
                    FieldKind::Int,
                    |p| p.y.into(),
                    |p, v| {
                        p.y = v.try_into()?;
                        Ok(())
                    },
                );
        }
    }

    #[test]
    fn dyn_access() {
        let mut point = Point::default();
        assert!(point.set_property("x", Value::Int(3)).expect("set"));
        assert!(!point.set_property("z", Value::Int(3)).expect("unknown"));
        assert!(point.set_property("y", Value::from("no")).is_err());
        let props = point.properties();
        assert_eq!(props[0], ("x", FieldKind::Int, Value::Int(3)));
        assert_eq!(point.field_kind("y"), Some(FieldKind::Int));
    }

    #[test]
    fn registry_lookup() {
        let mut registry = TypeRegistry::new();
        registry
            .register(TypeDescription::of::<Point>("!point"))
            .expect("register");
        assert!(registry
            .register(TypeDescription::of::<Point>("!point"))
            .is_err());
        assert_eq!(registry.tag_of::<Point>(), Some("!point"));
        let object = registry.by_tag("!point").expect("known").new_default();
        let found = registry.by_object(&*object.borrow()).map(TypeDescription::tag);
        assert_eq!(found, Some("!point"));
    }
}
