//! Dynamic property values
//!
//! Values are owned trees: reading a property produces an independent
//! value, so containers built from them never share identity with the
//! source instance.

use core::cmp::Ordering;
use core::fmt;
use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use crate::bean::Bean;
use crate::types::{BeanType, CollectionKind, MapKind, ScalarKind, TemporalKind, TypeRef};

/// A dynamically typed property value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInt(i128),
    Decimal(Decimal),
    String(String),
    /// UTC instant
    Date(DateTime<Utc>),
    LocalDateTime(NaiveDateTime),
    LocalDate(NaiveDate),
    /// Array with its component type
    Array {
        element: TypeRef,
        items: Vec<Value>,
    },
    /// Sequence container
    Collection {
        kind: CollectionKind,
        items: Vec<Value>,
    },
    /// Map container, entries in iteration order
    Map {
        kind: MapKind,
        entries: Vec<(Value, Value)>,
    },
    /// Nested bean instance
    Bean(BeanValue),
}

impl Value {
    /// Build a sequence honoring the container kind.
    ///
    /// Set kinds drop duplicates (first occurrence kept); `BTreeSet` sorts.
    pub fn collection(kind: CollectionKind, items: impl IntoIterator<Item = Value>) -> Self {
        let mut out: Vec<Value> = Vec::new();
        if kind.is_set_like() {
            let mut index = DedupIndex::default();
            for item in items {
                if index.find(&out, &item).is_none() {
                    index.record(&item, out.len());
                    out.push(item);
                }
            }
        } else {
            out.extend(items);
        }
        if kind == CollectionKind::BTreeSet {
            out.sort_by(Value::order_cmp);
        }
        Value::Collection { kind, items: out }
    }

    /// Build a map honoring the container kind.
    ///
    /// Duplicate keys keep the last value; `BTreeMap` sorts by key.
    pub fn map(kind: MapKind, entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut keys: Vec<Value> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        let mut index = DedupIndex::default();
        for (key, value) in entries {
            match index.find(&keys, &key) {
                Some(pos) => values[pos] = value,
                None => {
                    index.record(&key, keys.len());
                    keys.push(key);
                    values.push(value);
                }
            }
        }
        let mut out: Vec<(Value, Value)> = keys.into_iter().zip(values).collect();
        if kind == MapKind::BTreeMap {
            out.sort_by(|a, b| a.0.order_cmp(&b.0));
        }
        Value::Map { kind, entries: out }
    }

    /// Build an array with the given component type
    pub fn array(element: TypeRef, items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array {
            element,
            items: items.into_iter().collect(),
        }
    }

    /// Wrap a bean
    pub fn bean<T: Bean>(bean: T) -> Self {
        Value::Bean(BeanValue::new(bean))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value's variant
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Byte(_) => "i8",
            Value::Short(_) => "i16",
            Value::Int(_) => "i32",
            Value::Long(_) => "i64",
            Value::Float(_) => "f32",
            Value::Double(_) => "f64",
            Value::BigInt(_) => "i128",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::LocalDateTime(_) => "local_date_time",
            Value::LocalDate(_) => "local_date",
            Value::Array { .. } => "array",
            Value::Collection { .. } => "collection",
            Value::Map { .. } => "map",
            Value::Bean(_) => "bean",
        }
    }

    /// Scalar kind of a scalar value
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        Some(match self {
            Value::Bool(_) => ScalarKind::Bool,
            Value::Char(_) => ScalarKind::Char,
            Value::Byte(_) => ScalarKind::Byte,
            Value::Short(_) => ScalarKind::Short,
            Value::Int(_) => ScalarKind::Int,
            Value::Long(_) => ScalarKind::Long,
            Value::Float(_) => ScalarKind::Float,
            Value::Double(_) => ScalarKind::Double,
            Value::BigInt(_) => ScalarKind::BigInt,
            Value::Decimal(_) => ScalarKind::Decimal,
            _ => return None,
        })
    }

    /// Temporal kind of a date/time value
    pub fn temporal_kind(&self) -> Option<TemporalKind> {
        match self {
            Value::Date(_) => Some(TemporalKind::Date),
            Value::LocalDateTime(_) => Some(TemporalKind::LocalDateTime),
            Value::LocalDate(_) => Some(TemporalKind::LocalDate),
            _ => None,
        }
    }

    /// Whether the value is a number
    pub fn is_numeric(&self) -> bool {
        self.scalar_kind().map(|kind| kind.is_numeric()).unwrap_or(false)
    }

    /// Dynamic type of the value. Containers report no element types.
    pub fn runtime_type(&self) -> TypeRef {
        match self {
            Value::Null => TypeRef::Object,
            Value::String(_) => TypeRef::String,
            Value::Array { element, .. } => TypeRef::Array(Box::new(element.clone())),
            Value::Collection { kind, .. } => TypeRef::raw_collection(*kind),
            Value::Map { kind, .. } => TypeRef::raw_map(*kind),
            Value::Bean(bean) => TypeRef::Bean(bean.bean_type()),
            other => match (other.scalar_kind(), other.temporal_kind()) {
                (Some(kind), _) => TypeRef::Boxed(kind),
                (_, Some(kind)) => TypeRef::Temporal(kind),
                _ => TypeRef::Object,
            },
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral value widened to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(*v as i64),
            Value::Short(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            Value::BigInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Numeric value as an arbitrary-precision decimal
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Byte(v) => Some(Decimal::from(*v)),
            Value::Short(v) => Some(Decimal::from(*v)),
            Value::Int(v) => Some(Decimal::from(*v)),
            Value::Long(v) => Some(Decimal::from(*v)),
            Value::BigInt(v) => Decimal::try_from_i128_with_scale(*v, 0).ok(),
            Value::Float(v) => parse_decimal(&v.to_string()),
            Value::Double(v) => parse_decimal(&v.to_string()),
            Value::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bean(&self) -> Option<&BeanValue> {
        match self {
            Value::Bean(bean) => Some(bean),
            _ => None,
        }
    }

    /// Items of an array or sequence
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Value::Array { items, .. } | Value::Collection { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Ordering used by sorted containers. Values of unrelated kinds
    /// compare equal so sorting keeps their insertion order.
    pub fn order_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::LocalDateTime(a), Value::LocalDateTime(b)) => a.cmp(b),
            (Value::LocalDate(a), Value::LocalDate(b)) => a.cmp(b),
            (a, b) if a.is_numeric() && b.is_numeric() => match (a.as_decimal(), b.as_decimal()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => Ordering::Equal,
            },
            _ => Ordering::Equal,
        }
    }
}

/// Hashable projection of values whose equality is structural.
///
/// Floats, containers and beans have no projection.
#[derive(PartialEq, Eq, Hash)]
enum DedupKey {
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    BigInt(i128),
    Decimal(Decimal),
    String(String),
    Date(DateTime<Utc>),
    LocalDateTime(NaiveDateTime),
    LocalDate(NaiveDate),
}

impl DedupKey {
    fn of(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Null => DedupKey::Null,
            Value::Bool(v) => DedupKey::Bool(*v),
            Value::Char(v) => DedupKey::Char(*v),
            Value::Byte(v) => DedupKey::Byte(*v),
            Value::Short(v) => DedupKey::Short(*v),
            Value::Int(v) => DedupKey::Int(*v),
            Value::Long(v) => DedupKey::Long(*v),
            Value::BigInt(v) => DedupKey::BigInt(*v),
            Value::Decimal(v) => DedupKey::Decimal(*v),
            Value::String(v) => DedupKey::String(v.clone()),
            Value::Date(v) => DedupKey::Date(*v),
            Value::LocalDateTime(v) => DedupKey::LocalDateTime(*v),
            Value::LocalDate(v) => DedupKey::LocalDate(*v),
            _ => return None,
        })
    }
}

/// Positions of distinct values already collected.
///
/// Hashable values are looked up in a map; the rest are compared
/// against the other unhashable values only.
#[derive(Default)]
struct DedupIndex {
    hashed: HashMap<DedupKey, usize>,
    unhashed: Vec<usize>,
}

impl DedupIndex {
    fn find(&self, seen: &[Value], value: &Value) -> Option<usize> {
        match DedupKey::of(value) {
            Some(key) => self.hashed.get(&key).copied(),
            None => self.unhashed.iter().copied().find(|&pos| seen[pos] == *value),
        }
    }

    fn record(&mut self, value: &Value, pos: usize) {
        match DedupKey::of(value) {
            Some(key) => {
                self.hashed.insert(key, pos);
            }
            None => self.unhashed.push(pos),
        }
    }
}

/// Parse decimal text, accepting scientific notation
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Canonical text representation
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Date(v) => write!(f, "{}", v.to_rfc3339()),
            Value::LocalDateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::LocalDate(v) => write!(f, "{}", v),
            Value::Array { items, .. } | Value::Collection { items, .. } => {
                f.write_str("[")?;
                write_joined(f, items.iter())?;
                f.write_str("]")
            }
            Value::Map { entries, .. } => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                f.write_str("}")
            }
            Value::Bean(bean) => write!(f, "{}", bean),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// An owned bean instance inside a [`Value`]
pub struct BeanValue(Box<dyn Bean>);

impl BeanValue {
    pub fn new<T: Bean>(bean: T) -> Self {
        Self(Box::new(bean))
    }

    pub fn from_box(bean: Box<dyn Bean>) -> Self {
        Self(bean)
    }

    pub fn bean_type(&self) -> BeanType {
        self.0.bean_type()
    }

    pub fn as_bean(&self) -> &dyn Bean {
        self.0.as_ref()
    }

    pub fn as_bean_mut(&mut self) -> &mut dyn Bean {
        self.0.as_mut()
    }

    pub fn into_inner(self) -> Box<dyn Bean> {
        self.0
    }

    pub fn downcast_ref<T: Bean>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }

    /// Take the concrete bean out; on mismatch the runtime type is returned
    pub fn downcast<T: Bean>(self) -> core::result::Result<T, BeanType> {
        let found = self.0.bean_type();
        self.0.into_any().downcast::<T>().map(|bean| *bean).map_err(|_| found)
    }
}

impl Clone for BeanValue {
    fn clone(&self) -> Self {
        Self(self.0.clone_bean())
    }
}

impl PartialEq for BeanValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.bean_type() == other.0.bean_type() && self.0.snapshot() == other.0.snapshot()
    }
}

impl fmt::Debug for BeanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bean_type = self.0.bean_type();
        let mut debug = f.debug_struct(bean_type.short_name());
        for (name, value) in self.0.snapshot() {
            debug.field(&name, &value);
        }
        debug.finish()
    }
}

impl fmt::Display for BeanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.0.bean_type().short_name())?;
        for (i, (name, value)) in self.0.snapshot().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_kinds_drop_duplicates() {
        let set = Value::collection(
            CollectionKind::HashSet,
            vec![Value::from("b"), Value::from("a"), Value::from("b")],
        );
        assert_eq!(set.items().unwrap(), &[Value::from("b"), Value::from("a")]);

        let sorted = Value::collection(CollectionKind::BTreeSet, vec![Value::Int(3), Value::Int(1), Value::Int(3)]);
        assert_eq!(sorted.items().unwrap(), &[Value::Int(1), Value::Int(3)]);

        let list = Value::collection(CollectionKind::Vec, vec![Value::Int(3), Value::Int(3)]);
        assert_eq!(list.items().unwrap().len(), 2);
    }

    #[test]
    fn test_map_last_key_wins() {
        let map = Value::map(
            MapKind::BTreeMap,
            vec![
                (Value::from("b"), Value::Int(1)),
                (Value::from("a"), Value::Int(2)),
                (Value::from("b"), Value::Int(3)),
            ],
        );
        match map {
            Value::Map { entries, .. } => {
                assert_eq!(entries, vec![(Value::from("a"), Value::Int(2)), (Value::from("b"), Value::Int(3))]);
            }
            other => panic!("Expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_dedup_mixes_hashed_and_unhashed_values() {
        let set = Value::collection(
            CollectionKind::HashSet,
            vec![
                Value::Double(1.5),
                Value::Int(1),
                Value::Long(1),
                Value::Double(1.5),
                Value::Int(1),
                Value::Null,
                Value::Null,
            ],
        );
        assert_eq!(
            set.items().unwrap(),
            &[Value::Double(1.5), Value::Int(1), Value::Long(1), Value::Null]
        );
    }

    #[test]
    fn test_large_containers_build_in_linear_passes() {
        let n = 100_000;
        let map = Value::map(MapKind::HashMap, (0..n).map(|i| (Value::Int(i), Value::Int(i))));
        match map {
            Value::Map { entries, .. } => assert_eq!(entries.len(), n as usize),
            other => panic!("Expected map, got {:?}", other),
        }

        let set = Value::collection(CollectionKind::BTreeSet, (0..n).rev().map(|i| Value::from(format!("k{:06}", i))));
        let items = set.items().unwrap();
        assert_eq!(items.len(), n as usize);
        assert_eq!(items[0], Value::from("k000000"));
    }

    #[test]
    fn test_runtime_type_erases_elements() {
        let list = Value::collection(CollectionKind::Vec, vec![Value::Int(1)]);
        assert_eq!(list.runtime_type(), TypeRef::raw_collection(CollectionKind::Vec));
        assert_eq!(Value::Int(1).runtime_type(), TypeRef::Boxed(ScalarKind::Int));
        assert_eq!(Value::Null.runtime_type(), TypeRef::Object);
    }

    #[test]
    fn test_canonical_text() {
        let list = Value::collection(CollectionKind::Vec, vec![Value::from("x"), Value::Int(2)]);
        assert_eq!(list.to_string(), "[x, 2]");
        let map = Value::map(MapKind::HashMap, vec![(Value::Int(1), Value::from("a"))]);
        assert_eq!(map.to_string(), "{1=a}");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_decimal_views() {
        assert_eq!(Value::Float(1.5).as_decimal(), Some(Decimal::new(15, 1)));
        assert_eq!(Value::Long(-7).as_decimal(), Some(Decimal::from(-7)));
        assert_eq!(parse_decimal("1e3"), Some(Decimal::from(1000)));
        assert_eq!(parse_decimal("abc"), None);
    }
}
