//! Mapping between Rust field types and dynamic values

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use crate::error::{CoreError, Result};
use crate::registry::TypeRegistry;
use crate::types::{CollectionKind, MapKind, ScalarKind, TemporalKind, TypeRef};
use crate::value::Value;

/// A Rust type usable as a bean property.
///
/// `Null` converts into a non-optional field as the type's default.
pub trait Reflect: Sized {
    /// Declared type of a slot holding `Self`
    fn type_ref() -> TypeRef;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;

    /// Register bean types reachable from `Self`
    fn register_types(_registry: &TypeRegistry) -> Result<()> {
        Ok(())
    }
}

fn mismatch<T>(expected: &TypeRef, value: &Value) -> Result<T> {
    Err(CoreError::type_mismatch(expected.to_string(), value.type_name()))
}

macro_rules! reflect_scalar {
    ($ty:ty, $variant:ident, $type_ref:expr) => {
        impl Reflect for $ty {
            fn type_ref() -> TypeRef {
                $type_ref
            }

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }

            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Null => Ok(Default::default()),
                    Value::$variant(v) => Ok(v),
                    other => mismatch(&Self::type_ref(), &other),
                }
            }
        }
    };
}

reflect_scalar!(bool, Bool, TypeRef::primitive(ScalarKind::Bool));
reflect_scalar!(char, Char, TypeRef::primitive(ScalarKind::Char));
reflect_scalar!(i8, Byte, TypeRef::primitive(ScalarKind::Byte));
reflect_scalar!(i16, Short, TypeRef::primitive(ScalarKind::Short));
reflect_scalar!(i32, Int, TypeRef::primitive(ScalarKind::Int));
reflect_scalar!(i64, Long, TypeRef::primitive(ScalarKind::Long));
reflect_scalar!(f32, Float, TypeRef::primitive(ScalarKind::Float));
reflect_scalar!(f64, Double, TypeRef::primitive(ScalarKind::Double));
reflect_scalar!(i128, BigInt, TypeRef::boxed(ScalarKind::BigInt));
reflect_scalar!(Decimal, Decimal, TypeRef::boxed(ScalarKind::Decimal));
reflect_scalar!(String, String, TypeRef::String);
reflect_scalar!(DateTime<Utc>, Date, TypeRef::Temporal(TemporalKind::Date));
reflect_scalar!(NaiveDateTime, LocalDateTime, TypeRef::Temporal(TemporalKind::LocalDateTime));
reflect_scalar!(NaiveDate, LocalDate, TypeRef::Temporal(TemporalKind::LocalDate));

impl Reflect for Value {
    fn type_ref() -> TypeRef {
        TypeRef::Object
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn type_ref() -> TypeRef {
        T::type_ref().nullable()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn register_types(registry: &TypeRegistry) -> Result<()> {
        T::register_types(registry)
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn type_ref() -> TypeRef {
        T::type_ref()
    }

    fn to_value(&self) -> Value {
        self.as_ref().to_value()
    }

    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }

    fn register_types(registry: &TypeRegistry) -> Result<()> {
        T::register_types(registry)
    }
}

impl<T: Reflect> Reflect for Box<[T]> {
    fn type_ref() -> TypeRef {
        TypeRef::array_of(T::type_ref())
    }

    fn to_value(&self) -> Value {
        Value::array(T::type_ref(), self.iter().map(Reflect::to_value))
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(sequence_items::<T>(&Self::type_ref(), value)?.into_boxed_slice())
    }

    fn register_types(registry: &TypeRegistry) -> Result<()> {
        T::register_types(registry)
    }
}

/// Items of any sequence-shaped value, converted element-wise
fn sequence_items<T: Reflect>(expected: &TypeRef, value: Value) -> Result<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Collection { items, .. } | Value::Array { items, .. } => {
            items.into_iter().map(T::from_value).collect()
        }
        other => mismatch(expected, &other),
    }
}

fn map_entries<K: Reflect, V: Reflect>(expected: &TypeRef, value: Value) -> Result<Vec<(K, V)>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Map { entries, .. } => entries
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect(),
        other => mismatch(expected, &other),
    }
}

macro_rules! reflect_collection {
    ($ty:ident, $kind:ident $(, $bound:path)*) => {
        impl<T: Reflect $(+ $bound)*> Reflect for $ty<T> {
            fn type_ref() -> TypeRef {
                TypeRef::collection(CollectionKind::$kind, T::type_ref())
            }

            fn to_value(&self) -> Value {
                Value::collection(CollectionKind::$kind, self.iter().map(Reflect::to_value))
            }

            fn from_value(value: Value) -> Result<Self> {
                Ok(sequence_items::<T>(&Self::type_ref(), value)?.into_iter().collect())
            }

            fn register_types(registry: &TypeRegistry) -> Result<()> {
                T::register_types(registry)
            }
        }
    };
}

reflect_collection!(Vec, Vec);
reflect_collection!(VecDeque, Deque);
reflect_collection!(HashSet, HashSet, Eq, Hash);
reflect_collection!(BTreeSet, BTreeSet, Ord);

macro_rules! reflect_map {
    ($ty:ident, $kind:ident $(, $bound:path)*) => {
        impl<K: Reflect $(+ $bound)*, V: Reflect> Reflect for $ty<K, V> {
            fn type_ref() -> TypeRef {
                TypeRef::map(MapKind::$kind, K::type_ref(), V::type_ref())
            }

            fn to_value(&self) -> Value {
                Value::map(
                    MapKind::$kind,
                    self.iter().map(|(k, v)| (k.to_value(), v.to_value())),
                )
            }

            fn from_value(value: Value) -> Result<Self> {
                Ok(map_entries::<K, V>(&Self::type_ref(), value)?.into_iter().collect())
            }

            fn register_types(registry: &TypeRegistry) -> Result<()> {
                K::register_types(registry)?;
                V::register_types(registry)
            }
        }
    };
}

reflect_map!(HashMap, HashMap, Eq, Hash);
reflect_map!(BTreeMap, BTreeMap, Ord);
