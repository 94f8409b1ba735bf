//! Per-property value converters

use replica_core::{TypeRef, Value};

use crate::error::Result;

/// Coerces a source value into a target property's declared type.
///
/// `hint` names the target mutator, e.g. `set_count`.
pub trait Converter: Send + Sync {
    fn convert(&self, value: Value, target_type: &TypeRef, hint: &str) -> Result<Value>;
}

impl<F> Converter for F
where
    F: Fn(Value, &TypeRef, &str) -> Result<Value> + Send + Sync,
{
    fn convert(&self, value: Value, target_type: &TypeRef, hint: &str) -> Result<Value> {
        self(value, target_type, hint)
    }
}

/// Returns every value unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Converter for Passthrough {
    fn convert(&self, value: Value, _: &TypeRef, _: &str) -> Result<Value> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replica_core::ScalarKind;

    #[test]
    fn test_closure_converter() {
        let doubler = |value: Value, _: &TypeRef, _: &str| -> Result<Value> {
            Ok(match value {
                Value::Int(v) => Value::Int(v * 2),
                other => other,
            })
        };
        let target = TypeRef::primitive(ScalarKind::Int);
        assert_eq!(doubler.convert(Value::Int(2), &target, "set_x").unwrap(), Value::Int(4));
        assert_eq!(Passthrough.convert(Value::Int(2), &target, "set_x").unwrap(), Value::Int(2));
    }
}
