//! Heuristic value coercion
//!
//! The smart converter backs the `smart_*` copy operations. Rules are
//! tried in order and the first match wins; values no rule handles
//! become `Null` rather than an error.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use replica_core::{parse_decimal, temporal, ScalarKind, TypeRef, Value};

use crate::converter::Converter;
use crate::error::{CopyError, Result};

/// Built-in converter covering common scalar, date and container
/// coercions
#[derive(Debug, Clone)]
pub struct SmartConverter {
    delimiter: String,
}

impl Default for SmartConverter {
    fn default() -> Self {
        Self::new(",")
    }
}

impl SmartConverter {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    fn join<'a>(&self, items: impl Iterator<Item = &'a Value>) -> String {
        items
            .map(|item| item.to_string())
            .collect::<Vec<_>>()
            .join(&self.delimiter)
    }

    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.is_empty() {
            Vec::new()
        } else {
            text.split(self.delimiter.as_str()).collect()
        }
    }

    fn coerce(&self, value: Value, target: &TypeRef) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if target.accepts_value(&value) {
            return Ok(value);
        }

        match (&value, target) {
            // arrays of strings or integers <-> delimited text
            (Value::Array { element, items }, TypeRef::String) if is_joinable_component(element) => {
                return Ok(Value::String(self.join(items.iter())));
            }
            (Value::String(text), TypeRef::Array(component)) if is_joinable_component(component) => {
                let items = self
                    .split(text)
                    .into_iter()
                    .map(|piece| parse_piece(piece, component))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(Value::array(component.as_ref().clone(), items));
            }

            // sequences <-> delimited text
            (Value::Collection { items, .. }, TypeRef::String) => {
                return Ok(Value::String(self.join(items.iter())));
            }
            (Value::String(text), TypeRef::Collection { kind, element }) => {
                let mut items = Vec::new();
                for piece in self.split(text) {
                    let piece = Value::String(piece.to_string());
                    items.push(match element {
                        Some(element) => self.coerce(piece, element)?,
                        None => piece,
                    });
                }
                return Ok(Value::collection(kind.default_concrete(), items));
            }
            _ => {}
        }

        // date/time <-> epoch milliseconds
        if value.temporal_kind().is_some() && is_long(target) {
            return Ok(temporal::to_epoch_millis(&value).map(Value::Long).unwrap_or(Value::Null));
        }
        if let (TypeRef::Temporal(kind), Some(millis)) = (target, epoch_source(&value)) {
            return temporal::from_epoch_millis(*kind, millis).map_err(CopyError::from);
        }

        if *target == TypeRef::String {
            return Ok(Value::String(value.to_string()));
        }

        let target_kind = target.scalar_kind();
        if let Some(kind) = target_kind.filter(ScalarKind::is_numeric) {
            if value.is_numeric() || matches!(value, Value::String(_)) {
                return narrow(&value, kind, target);
            }
        }

        if target_kind == Some(ScalarKind::Bool) {
            if let Value::Bool(flag) = value {
                return Ok(Value::Bool(flag));
            }
            match value {
                Value::Float(v) => return Ok(Value::Bool(v != 0.0)),
                Value::Double(v) => return Ok(Value::Bool(v != 0.0)),
                _ if value.is_numeric() => return Ok(Value::Bool(!to_decimal(&value)?.is_zero())),
                _ => {}
            }
        }

        Ok(Value::Null)
    }
}

impl Converter for SmartConverter {
    fn convert(&self, value: Value, target_type: &TypeRef, _hint: &str) -> Result<Value> {
        self.coerce(value, target_type)
    }
}

fn is_joinable_component(component: &TypeRef) -> bool {
    match component {
        TypeRef::String => true,
        other => other.scalar_kind().map(|k| k.is_integral()).unwrap_or(false),
    }
}

fn is_long(target: &TypeRef) -> bool {
    target.scalar_kind() == Some(ScalarKind::Long)
}

/// Integral values usable as epoch milliseconds
fn epoch_source(value: &Value) -> Option<i64> {
    match value {
        Value::Long(_) | Value::Int(_) | Value::BigInt(_) => value.as_i64(),
        _ => None,
    }
}

fn parse_piece(piece: &str, component: &TypeRef) -> Result<Value> {
    match component.scalar_kind() {
        Some(kind) => narrow(&Value::String(piece.to_string()), kind, component),
        None => Ok(Value::String(piece.to_string())),
    }
}

fn to_decimal(value: &Value) -> Result<Decimal> {
    match value {
        Value::String(text) => parse_decimal(text).ok_or_else(|| CopyError::InvalidNumber(text.clone())),
        other => other
            .as_decimal()
            .ok_or_else(|| CopyError::InvalidNumber(other.to_string())),
    }
}

/// Parse through a decimal intermediate and narrow to `kind`.
///
/// Integral targets truncate toward zero and keep the low-order bits.
/// Floating sources outside the decimal range skip the intermediate.
fn narrow(value: &Value, kind: ScalarKind, target: &TypeRef) -> Result<Value> {
    match (value, kind) {
        (Value::Float(v), ScalarKind::Float) => return Ok(Value::Float(*v)),
        (Value::Double(v), ScalarKind::Double) => return Ok(Value::Double(*v)),
        (Value::Double(v), ScalarKind::Float) => return Ok(Value::Float(*v as f32)),
        // shortest decimal text of the float, not its binary expansion
        (Value::Float(v), ScalarKind::Double) => {
            return v
                .to_string()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| CopyError::InvalidNumber(v.to_string()))
        }
        _ => {}
    }

    let wide = match value {
        Value::Float(v) => Some(*v as f64),
        Value::Double(v) => Some(*v),
        _ => None,
    };
    if let Some(wide) = wide {
        if !wide.is_finite() {
            return Err(CopyError::InvalidNumber(value.to_string()));
        }
        if value.as_decimal().is_none() {
            if !kind.is_integral() {
                return Err(CopyError::unsupported(value.to_string(), target));
            }
            return Ok(integral_value(wrapping_trunc(wide), kind));
        }
    }

    let number = to_decimal(value)?;
    let integral = || number.trunc().to_i128().ok_or_else(|| CopyError::unsupported(value.to_string(), target));
    Ok(match kind {
        ScalarKind::Byte | ScalarKind::Short | ScalarKind::Int | ScalarKind::Long | ScalarKind::BigInt => {
            integral_value(integral()?, kind)
        }
        ScalarKind::Float => Value::Float(
            number
                .to_f32()
                .ok_or_else(|| CopyError::unsupported(value.to_string(), target))?,
        ),
        ScalarKind::Double => Value::Double(
            number
                .to_f64()
                .ok_or_else(|| CopyError::unsupported(value.to_string(), target))?,
        ),
        ScalarKind::Decimal => Value::Decimal(number),
        ScalarKind::Bool | ScalarKind::Char => {
            return Err(CopyError::unsupported(value.type_name(), target))
        }
    })
}

fn integral_value(number: i128, kind: ScalarKind) -> Value {
    match kind {
        ScalarKind::Byte => Value::Byte(number as i8),
        ScalarKind::Short => Value::Short(number as i16),
        ScalarKind::Int => Value::Int(number as i32),
        ScalarKind::Long => Value::Long(number as i64),
        _ => Value::BigInt(number),
    }
}

/// Low-order 128 bits of the integer part of a finite double
fn wrapping_trunc(x: f64) -> i128 {
    let x = x.trunc();
    if x.abs() < 2f64.powi(127) {
        return x as i128;
    }
    let bits = x.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32 - 1075;
    let mantissa = ((bits & ((1u64 << 52) - 1)) | (1u64 << 52)) as i128;
    let magnitude = if exponent >= 128 {
        0
    } else {
        mantissa.wrapping_shl(exponent as u32)
    };
    if x < 0.0 {
        magnitude.wrapping_neg()
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replica_core::{CollectionKind, TemporalKind};

    fn convert(value: Value, target: &TypeRef) -> Value {
        SmartConverter::default().convert(value, target, "set_x").unwrap()
    }

    fn strings(items: &[&str]) -> Value {
        Value::array(TypeRef::String, items.iter().map(|s| Value::from(*s)))
    }

    #[test]
    fn test_null_and_assignable_pass_through() {
        let int = TypeRef::primitive(ScalarKind::Int);
        assert_eq!(convert(Value::Null, &int), Value::Null);
        assert_eq!(convert(Value::Int(3), &int), Value::Int(3));
        assert_eq!(convert(Value::Int(3), &TypeRef::boxed(ScalarKind::Int)), Value::Int(3));
        assert_eq!(convert(Value::Int(3), &TypeRef::Object), Value::Int(3));
    }

    #[test]
    fn test_string_array_round_trip() {
        let array_type = TypeRef::array_of(TypeRef::String);
        let original = strings(&["a", "b", "c"]);

        let joined = convert(original.clone(), &TypeRef::String);
        assert_eq!(joined, Value::from("a,b,c"));
        assert_eq!(convert(joined, &array_type), original);
        assert_eq!(convert(Value::from(""), &array_type), strings(&[]));
    }

    #[test]
    fn test_integer_array_and_text() {
        let longs = TypeRef::array_of(TypeRef::boxed(ScalarKind::Long));
        let value = convert(Value::from("1,2,3"), &longs);
        assert_eq!(
            value,
            Value::array(TypeRef::boxed(ScalarKind::Long), vec![Value::Long(1), Value::Long(2), Value::Long(3)])
        );
        assert_eq!(convert(value, &TypeRef::String), Value::from("1,2,3"));

        let err = SmartConverter::default()
            .convert(Value::from("1,x"), &longs, "set_ids")
            .unwrap_err();
        assert!(matches!(err, CopyError::InvalidNumber(_)));
    }

    #[test]
    fn test_sequence_and_text() {
        let list = Value::collection(CollectionKind::Vec, vec![Value::from("x"), Value::from("y")]);
        assert_eq!(convert(list, &TypeRef::String), Value::from("x,y"));

        let target = TypeRef::list_of(TypeRef::boxed(ScalarKind::Int));
        assert_eq!(
            convert(Value::from("4,5"), &target),
            Value::collection(CollectionKind::Vec, vec![Value::Int(4), Value::Int(5)])
        );
        assert_eq!(
            convert(Value::from(""), &target),
            Value::collection(CollectionKind::Vec, Vec::new())
        );

        let raw = TypeRef::raw_collection(CollectionKind::Set);
        assert_eq!(
            convert(Value::from("a,a"), &raw),
            Value::collection(CollectionKind::HashSet, vec![Value::from("a")])
        );
    }

    #[test]
    fn test_custom_delimiter() {
        let converter = SmartConverter::new("|");
        let joined = converter
            .convert(strings(&["a", "b"]), &TypeRef::String, "set_x")
            .unwrap();
        assert_eq!(joined, Value::from("a|b"));
    }

    #[test]
    fn test_date_epoch_millis() {
        let date = temporal::from_epoch_millis(TemporalKind::Date, 1000).unwrap();
        let long = TypeRef::boxed(ScalarKind::Long);
        assert_eq!(convert(date.clone(), &long), Value::Long(1000));
        assert_eq!(convert(Value::Long(1000), &TypeRef::Temporal(TemporalKind::Date)), date);
    }

    #[test]
    fn test_local_date_time_epoch_millis() {
        let wall = temporal::from_epoch_millis(TemporalKind::LocalDateTime, 1_700_000_000_000).unwrap();
        let millis = convert(wall.clone(), &TypeRef::primitive(ScalarKind::Long));
        assert_eq!(millis, Value::Long(1_700_000_000_000));
        assert_eq!(convert(millis, &TypeRef::Temporal(TemporalKind::LocalDateTime)), wall);
    }

    #[test]
    fn test_text_rendering() {
        assert_eq!(convert(Value::Int(7), &TypeRef::String), Value::from("7"));
        assert_eq!(convert(Value::Bool(true), &TypeRef::String), Value::from("true"));
    }

    #[test]
    fn test_numeric_narrowing() {
        assert_eq!(convert(Value::from("12.9"), &TypeRef::primitive(ScalarKind::Int)), Value::Int(12));
        assert_eq!(convert(Value::Int(300), &TypeRef::primitive(ScalarKind::Byte)), Value::Byte(44));
        assert_eq!(convert(Value::Double(2.5), &TypeRef::boxed(ScalarKind::Decimal)), Value::Decimal(Decimal::new(25, 1)));
        assert_eq!(convert(Value::Long(5), &TypeRef::boxed(ScalarKind::BigInt)), Value::BigInt(5));
        assert_eq!(convert(Value::Double(1.5), &TypeRef::primitive(ScalarKind::Float)), Value::Float(1.5));

        let err = SmartConverter::default()
            .convert(Value::from("abc"), &TypeRef::primitive(ScalarKind::Int), "set_x")
            .unwrap_err();
        assert!(matches!(err, CopyError::InvalidNumber(_)));
    }

    #[test]
    fn test_floating_sources() {
        assert_eq!(convert(Value::Float(0.1), &TypeRef::primitive(ScalarKind::Double)), Value::Double(0.1));
        assert_eq!(convert(Value::Double(-7.9), &TypeRef::primitive(ScalarKind::Long)), Value::Long(-7));

        // beyond the decimal range integral targets still keep the low-order bits
        let long = TypeRef::primitive(ScalarKind::Long);
        assert_eq!(convert(Value::Double(1e30), &long), Value::Long(5_076_964_154_930_102_272));
        assert_eq!(convert(Value::Double(-1e30), &long), Value::Long(-5_076_964_154_930_102_272));
        assert_eq!(convert(Value::Double(1e300), &long), Value::Long(0));

        let err = SmartConverter::default()
            .convert(Value::Double(f64::NAN), &long, "set_x")
            .unwrap_err();
        assert!(matches!(err, CopyError::InvalidNumber(_)));
        let err = SmartConverter::default()
            .convert(Value::Double(1e30), &TypeRef::boxed(ScalarKind::Decimal), "set_x")
            .unwrap_err();
        assert!(matches!(err, CopyError::UnsupportedConversion { .. }));
    }

    #[test]
    fn test_boolean_rules() {
        let bool_type = TypeRef::primitive(ScalarKind::Bool);
        assert_eq!(convert(Value::Int(2), &bool_type), Value::Bool(true));
        assert_eq!(convert(Value::Double(0.0), &bool_type), Value::Bool(false));
        assert_eq!(convert(Value::from("true"), &bool_type), Value::Null);
    }

    #[test]
    fn test_unconvertible_is_null() {
        let target = TypeRef::list_of(TypeRef::String);
        assert_eq!(convert(Value::Int(1), &target), Value::Null);
    }
}
