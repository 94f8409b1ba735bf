//! Type references for bean properties
//!
//! A [`TypeRef`] is the declared type of a property as seen by the copy
//! compiler. It carries enough structure to classify a property (scalar,
//! nested bean, sequence, map, array) and to resolve generic element types.

use core::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::value::Value;

/// Scalar value kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// Arbitrary-size integer (held as i128)
    BigInt,
    /// Arbitrary-precision decimal
    Decimal,
}

impl ScalarKind {
    /// Whether this kind is a number
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ScalarKind::Bool | ScalarKind::Char)
    }

    /// Whether this kind is a whole number
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            ScalarKind::Byte | ScalarKind::Short | ScalarKind::Int | ScalarKind::Long | ScalarKind::BigInt
        )
    }

    /// Whether a non-nullable primitive form exists
    pub fn has_primitive(&self) -> bool {
        !matches!(self, ScalarKind::BigInt | ScalarKind::Decimal)
    }

    /// The zero value for this kind
    pub fn zero(&self) -> Value {
        match self {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::Char => Value::Char('\0'),
            ScalarKind::Byte => Value::Byte(0),
            ScalarKind::Short => Value::Short(0),
            ScalarKind::Int => Value::Int(0),
            ScalarKind::Long => Value::Long(0),
            ScalarKind::Float => Value::Float(0.0),
            ScalarKind::Double => Value::Double(0.0),
            ScalarKind::BigInt => Value::BigInt(0),
            ScalarKind::Decimal => Value::Decimal(rust_decimal::Decimal::ZERO),
        }
    }

    /// Rust-facing name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Char => "char",
            ScalarKind::Byte => "i8",
            ScalarKind::Short => "i16",
            ScalarKind::Int => "i32",
            ScalarKind::Long => "i64",
            ScalarKind::Float => "f32",
            ScalarKind::Double => "f64",
            ScalarKind::BigInt => "i128",
            ScalarKind::Decimal => "decimal",
        }
    }
}

/// Date/time representations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKind {
    /// An instant on the UTC time line
    Date,
    /// Wall-clock date and time without zone
    LocalDateTime,
    /// Calendar date without time
    LocalDate,
}

impl TemporalKind {
    pub fn name(&self) -> &'static str {
        match self {
            TemporalKind::Date => "date",
            TemporalKind::LocalDateTime => "local_date_time",
            TemporalKind::LocalDate => "local_date",
        }
    }
}

/// Homogeneous sequence kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Any sequence (abstract)
    Collection,
    /// Ordered sequence (abstract)
    List,
    /// Unique elements (abstract)
    Set,
    /// Resizable array
    Vec,
    /// Double-ended queue
    Deque,
    /// Hash-based set
    HashSet,
    /// Ordered set
    BTreeSet,
}

impl CollectionKind {
    /// Whether a container of this kind can be instantiated directly
    pub fn is_concrete(&self) -> bool {
        !matches!(self, CollectionKind::Collection | CollectionKind::List | CollectionKind::Set)
    }

    /// Whether the kind is ordered-sequence-like
    pub fn is_list_like(&self) -> bool {
        matches!(self, CollectionKind::List | CollectionKind::Vec | CollectionKind::Deque)
    }

    /// Whether the kind drops duplicate elements
    pub fn is_set_like(&self) -> bool {
        matches!(self, CollectionKind::Set | CollectionKind::HashSet | CollectionKind::BTreeSet)
    }

    /// Kind-level assignability (`self` declared, `other` provided)
    pub fn accepts(&self, other: CollectionKind) -> bool {
        match self {
            CollectionKind::Collection => true,
            CollectionKind::List => other.is_list_like(),
            CollectionKind::Set => other.is_set_like(),
            concrete => *concrete == other,
        }
    }

    /// Concrete kind to instantiate for a declared kind
    pub fn default_concrete(&self) -> CollectionKind {
        match self {
            kind if kind.is_concrete() => *kind,
            CollectionKind::Set => CollectionKind::HashSet,
            // ordered and unspecified sequences both become resizable arrays
            _ => CollectionKind::Vec,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::Collection => "Collection",
            CollectionKind::List => "List",
            CollectionKind::Set => "Set",
            CollectionKind::Vec => "Vec",
            CollectionKind::Deque => "VecDeque",
            CollectionKind::HashSet => "HashSet",
            CollectionKind::BTreeSet => "BTreeSet",
        }
    }
}

/// Key/value mapping kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    /// Any map (abstract)
    Map,
    /// Hash-based map
    HashMap,
    /// Key-ordered map
    BTreeMap,
}

impl MapKind {
    pub fn is_concrete(&self) -> bool {
        !matches!(self, MapKind::Map)
    }

    pub fn accepts(&self, other: MapKind) -> bool {
        match self {
            MapKind::Map => true,
            concrete => *concrete == other,
        }
    }

    pub fn default_concrete(&self) -> MapKind {
        match self {
            MapKind::Map => MapKind::HashMap,
            concrete => *concrete,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MapKind::Map => "Map",
            MapKind::HashMap => "HashMap",
            MapKind::BTreeMap => "BTreeMap",
        }
    }
}

/// Identity of a bean class
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeanType(Arc<str>);

impl BeanType {
    /// Name of the universal root type
    pub const ROOT_NAME: &'static str = "object";

    /// Bean type with an explicit name
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Bean type of a Rust type
    pub fn of<T: 'static>() -> Self {
        Self::named(core::any::type_name::<T>())
    }

    /// The universal root type
    pub fn root() -> Self {
        Self::named(Self::ROOT_NAME)
    }

    pub fn is_root(&self) -> bool {
        &*self.0 == Self::ROOT_NAME
    }

    /// Fully qualified name
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Last path segment of the name
    pub fn short_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(self.name())
    }
}

impl fmt::Debug for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeanType({})", self.0)
    }
}

impl fmt::Display for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for BeanType {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Declared type of a property
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    /// Universal root type, accepts any value
    Object,
    /// Non-nullable scalar
    Primitive(ScalarKind),
    /// Nullable scalar
    Boxed(ScalarKind),
    /// Text
    String,
    /// Date/time value
    Temporal(TemporalKind),
    /// Fixed-length array of a component type
    Array(Box<TypeRef>),
    /// Homogeneous sequence; `None` when the element type is unresolved
    Collection {
        kind: CollectionKind,
        element: Option<Box<TypeRef>>,
    },
    /// Key/value mapping; `None` when key/value types are unresolved
    Map {
        kind: MapKind,
        entry: Option<Box<(TypeRef, TypeRef)>>,
    },
    /// Nested bean
    Bean(BeanType),
}

impl TypeRef {
    /// Primitive scalar, or its nullable form when no primitive exists
    pub fn primitive(kind: ScalarKind) -> Self {
        if kind.has_primitive() {
            TypeRef::Primitive(kind)
        } else {
            TypeRef::Boxed(kind)
        }
    }

    pub fn boxed(kind: ScalarKind) -> Self {
        TypeRef::Boxed(kind)
    }

    pub fn collection(kind: CollectionKind, element: TypeRef) -> Self {
        TypeRef::Collection {
            kind,
            element: Some(Box::new(element)),
        }
    }

    /// Sequence whose element type cannot be resolved
    pub fn raw_collection(kind: CollectionKind) -> Self {
        TypeRef::Collection { kind, element: None }
    }

    pub fn list_of(element: TypeRef) -> Self {
        Self::collection(CollectionKind::List, element)
    }

    pub fn set_of(element: TypeRef) -> Self {
        Self::collection(CollectionKind::Set, element)
    }

    pub fn map(kind: MapKind, key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map {
            kind,
            entry: Some(Box::new((key, value))),
        }
    }

    /// Map whose key/value types cannot be resolved
    pub fn raw_map(kind: MapKind) -> Self {
        TypeRef::Map { kind, entry: None }
    }

    pub fn array_of(component: TypeRef) -> Self {
        TypeRef::Array(Box::new(component))
    }

    pub fn bean(bean_type: BeanType) -> Self {
        TypeRef::Bean(bean_type)
    }

    /// Whether the declared type is a bean.
    ///
    /// Primitives, scalars, strings, date/time values, arrays, sequences,
    /// maps and the root type are never beans.
    pub fn is_bean(&self) -> bool {
        matches!(self, TypeRef::Bean(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, TypeRef::Collection { .. })
    }

    pub fn is_map(&self) -> bool {
        matches!(self, TypeRef::Map { .. })
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, TypeRef::Temporal(_))
    }

    /// Scalar kind for primitive and boxed types
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            TypeRef::Primitive(kind) | TypeRef::Boxed(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Resolved element type of a sequence
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Collection { element, .. } => element.as_deref(),
            _ => None,
        }
    }

    /// Resolved key and value types of a map
    pub fn entry_types(&self) -> Option<(&TypeRef, &TypeRef)> {
        match self {
            TypeRef::Map { entry: Some(entry), .. } => Some((&entry.0, &entry.1)),
            _ => None,
        }
    }

    /// Component type of an array
    pub fn component_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(component) => Some(component),
            _ => None,
        }
    }

    /// The same type with null allowed
    pub fn nullable(self) -> Self {
        match self {
            TypeRef::Primitive(kind) => TypeRef::Boxed(kind),
            other => other,
        }
    }

    /// Value held by a freshly constructed slot of this type
    pub fn default_value(&self) -> Value {
        match self {
            TypeRef::Primitive(kind) => kind.zero(),
            _ => Value::Null,
        }
    }

    /// Static assignability: can a value declared as `other` be stored
    /// into a slot declared as `self`?
    ///
    /// `is_subclass(sub, ancestor)` answers bean hierarchy questions.
    pub fn is_assignable_from(
        &self,
        other: &TypeRef,
        is_subclass: &dyn Fn(&BeanType, &BeanType) -> bool,
    ) -> bool {
        match (self, other) {
            (TypeRef::Object, _) => true,
            (TypeRef::Primitive(a), TypeRef::Primitive(b)) => a == b,
            (TypeRef::Boxed(a), TypeRef::Boxed(b) | TypeRef::Primitive(b)) => a == b,
            (TypeRef::String, TypeRef::String) => true,
            (TypeRef::Temporal(a), TypeRef::Temporal(b)) => a == b,
            (TypeRef::Array(a), TypeRef::Array(b)) => {
                if a.is_primitive() || b.is_primitive() {
                    a == b
                } else {
                    a.is_assignable_from(b, is_subclass)
                }
            }
            (
                TypeRef::Collection { kind: a, element: ae },
                TypeRef::Collection { kind: b, element: be },
            ) => {
                a.accepts(*b)
                    && match (ae, be) {
                        (Some(ae), Some(be)) => ae.is_assignable_from(be, is_subclass),
                        _ => true,
                    }
            }
            (TypeRef::Map { kind: a, entry: ae }, TypeRef::Map { kind: b, entry: be }) => {
                a.accepts(*b)
                    && match (ae, be) {
                        (Some(ae), Some(be)) => {
                            ae.0.is_assignable_from(&be.0, is_subclass)
                                && ae.1.is_assignable_from(&be.1, is_subclass)
                        }
                        _ => true,
                    }
            }
            (TypeRef::Bean(a), TypeRef::Bean(b)) => a == b || is_subclass(b, a),
            _ => false,
        }
    }

    /// Runtime acceptance of a value, ignoring the boxed/primitive split.
    pub fn accepts_value(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeRef::Primitive(_), Value::Null) => false,
            (_, Value::Null) => true,
            (TypeRef::Object, _) => true,
            (TypeRef::Primitive(kind) | TypeRef::Boxed(kind), value) => value.scalar_kind() == Some(*kind),
            (TypeRef::String, Value::String(_)) => true,
            (TypeRef::Temporal(kind), value) => value.temporal_kind() == Some(*kind),
            (TypeRef::Array(component), Value::Array { element, .. }) => {
                component.as_ref() == element
                    || (!component.is_primitive()
                        && !element.is_primitive()
                        && component.is_assignable_from(element, &|_, _| false))
            }
            (TypeRef::Collection { kind, .. }, Value::Collection { kind: actual, .. }) => kind.accepts(*actual),
            (TypeRef::Map { kind, .. }, Value::Map { kind: actual, .. }) => kind.accepts(*actual),
            (TypeRef::Bean(bean_type), Value::Bean(bean)) => &bean.bean_type() == bean_type,
            _ => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Object => f.write_str("object"),
            TypeRef::Primitive(kind) => f.write_str(kind.name()),
            TypeRef::Boxed(kind) => write!(f, "Option<{}>", kind.name()),
            TypeRef::String => f.write_str("String"),
            TypeRef::Temporal(kind) => f.write_str(kind.name()),
            TypeRef::Array(component) => write!(f, "[{}]", component),
            TypeRef::Collection { kind, element } => match element {
                Some(element) => write!(f, "{}<{}>", kind.name(), element),
                None => f.write_str(kind.name()),
            },
            TypeRef::Map { kind, entry } => match entry {
                Some(entry) => write!(f, "{}<{}, {}>", kind.name(), entry.0, entry.1),
                None => f.write_str(kind.name()),
            },
            TypeRef::Bean(bean_type) => f.write_str(bean_type.short_name()),
        }
    }
}
