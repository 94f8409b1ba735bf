//! Per-property copy filters
//!
//! A filter gates each scalar assignment of a copier compiled with
//! filtering enabled. It sees the source value, the source property name,
//! the current target value and the target property name.

use std::collections::HashSet;

use replica_core::Value;

/// Decides whether a scalar property is copied
pub trait Filter: Send + Sync {
    fn accept(&self, source_value: &Value, source_name: &str, target_value: &Value, target_name: &str) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&Value, &str, &Value, &str) -> bool + Send + Sync,
{
    fn accept(&self, source_value: &Value, source_name: &str, target_value: &Value, target_name: &str) -> bool {
        self(source_value, source_name, target_value, target_name)
    }
}

/// Combinators over filters
pub trait FilterExt: Filter + Sized {
    /// Accept when both accept
    fn and<F: Filter>(self, other: F) -> And<Self, F> {
        And(self, other)
    }

    /// Accept when either accepts
    fn or<F: Filter>(self, other: F) -> Or<Self, F> {
        Or(self, other)
    }

    /// Invert the decision
    fn negate(self) -> Not<Self> {
        Not(self)
    }
}

impl<T: Filter> FilterExt for T {}

pub struct And<A, B>(A, B);

impl<A: Filter, B: Filter> Filter for And<A, B> {
    fn accept(&self, source_value: &Value, source_name: &str, target_value: &Value, target_name: &str) -> bool {
        self.0.accept(source_value, source_name, target_value, target_name)
            && self.1.accept(source_value, source_name, target_value, target_name)
    }
}

pub struct Or<A, B>(A, B);

impl<A: Filter, B: Filter> Filter for Or<A, B> {
    fn accept(&self, source_value: &Value, source_name: &str, target_value: &Value, target_name: &str) -> bool {
        self.0.accept(source_value, source_name, target_value, target_name)
            || self.1.accept(source_value, source_name, target_value, target_name)
    }
}

pub struct Not<A>(A);

impl<A: Filter> Filter for Not<A> {
    fn accept(&self, source_value: &Value, source_name: &str, target_value: &Value, target_name: &str) -> bool {
        !self.0.accept(source_value, source_name, target_value, target_name)
    }
}

/// Always copies
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideFilter;

impl Filter for OverrideFilter {
    fn accept(&self, _: &Value, _: &str, _: &Value, _: &str) -> bool {
        true
    }
}

/// Copies only into properties whose current value is null
#[derive(Debug, Clone, Copy, Default)]
pub struct IfAbsent;

impl Filter for IfAbsent {
    fn accept(&self, _: &Value, _: &str, target_value: &Value, _: &str) -> bool {
        target_value.is_null()
    }
}

/// Skips null source values
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreNull;

impl Filter for IgnoreNull {
    fn accept(&self, source_value: &Value, _: &str, _: &Value, _: &str) -> bool {
        !source_value.is_null()
    }
}

/// Skips the listed source properties
#[derive(Debug, Clone, Default)]
pub struct IgnoreProperties {
    names: HashSet<String>,
}

impl IgnoreProperties {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl Filter for IgnoreProperties {
    fn accept(&self, _: &Value, source_name: &str, _: &Value, _: &str) -> bool {
        !self.names.contains(source_name)
    }
}
