//! Beans extended with extra named values

use std::collections::BTreeMap;

use replica_core::{BeanValue, TypeRef, Value};

/// A named, typed value attached to a bean from outside its class
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub declared_type: TypeRef,
    pub value: Value,
}

impl Property {
    pub fn new(name: impl Into<String>, declared_type: TypeRef, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            declared_type,
            value: value.into(),
        }
    }
}

/// A copy of a bean plus extra properties its class does not declare.
///
/// Extra properties shadow base properties of the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct Extended {
    base: BeanValue,
    extra: BTreeMap<String, Property>,
}

impl Extended {
    pub fn new(base: BeanValue, extra: impl IntoIterator<Item = Property>) -> Self {
        Self {
            base,
            extra: extra.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }

    pub fn base(&self) -> &BeanValue {
        &self.base
    }

    pub fn into_base(self) -> BeanValue {
        self.base
    }

    pub fn extra(&self, name: &str) -> Option<&Property> {
        self.extra.get(name)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(property) = self.extra.get(name) {
            return Some(property.value.clone());
        }
        self.base
            .as_bean()
            .snapshot()
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Base and extra property names, sorted
    pub fn property_names(&self) -> Vec<String> {
        self.merged().into_keys().collect()
    }

    pub fn merged(&self) -> BTreeMap<String, Value> {
        let mut merged: BTreeMap<String, Value> = self.base.as_bean().snapshot().into_iter().collect();
        merged.extend(self.extra.values().map(|p| (p.name.clone(), p.value.clone())));
        merged
    }
}
