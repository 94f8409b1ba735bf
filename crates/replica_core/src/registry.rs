//! Type registry for runtime bean introspection
//!
//! The registry owns every known [`BeanClass`] and answers the two
//! collaborator contracts the copy engine depends on: property discovery
//! ([`TypeIntrospector`]) and default construction ([`InstanceFactory`]).

use core::fmt;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bean::{Bean, BeanDescribe};
use crate::descriptor::{BeanClass, MethodDescriptor, PropertyDescriptor};
use crate::error::{CoreError, Result};
use crate::types::BeanType;

/// Property discovery for bean types. Results are deterministic per type.
pub trait TypeIntrospector: Send + Sync {
    /// Readable properties ordered by name
    fn readable_properties(&self, bean_type: &BeanType) -> Result<Vec<PropertyDescriptor>>;

    /// Writable properties ordered by name
    fn writable_properties(&self, bean_type: &BeanType) -> Result<Vec<PropertyDescriptor>>;

    /// Methods declared directly on `bean_type`
    fn declared_methods(&self, bean_type: &BeanType) -> Result<Vec<MethodDescriptor>>;

    /// Direct parent, `None` for the root
    fn parent(&self, bean_type: &BeanType) -> Option<BeanType>;

    /// Whether `bean_type` equals or descends from `ancestor`
    fn is_subclass_of(&self, bean_type: &BeanType, ancestor: &BeanType) -> bool;
}

/// Zero-argument construction of bean types
pub trait InstanceFactory: Send + Sync {
    fn new_instance(&self, bean_type: &BeanType) -> Result<Box<dyn Bean>>;
}

/// Central registry of bean classes
pub struct TypeRegistry {
    classes: RwLock<HashMap<BeanType, Arc<BeanClass>>>,
}

impl TypeRegistry {
    /// Create a registry holding only the root class
    pub fn new() -> Self {
        let mut classes = HashMap::new();
        classes.insert(BeanType::root(), Arc::new(BeanClass::root()));
        Self {
            classes: RwLock::new(classes),
        }
    }

    /// Register a compile-time bean type and every bean type reachable
    /// from its properties. Already registered types are left untouched.
    pub fn register<T: BeanDescribe>(&self) -> Result<&Self> {
        let bean_type = T::class_type();
        if self.contains(&bean_type) {
            return Ok(self);
        }
        // insert first so self-referential types terminate
        self.classes.write().insert(bean_type, Arc::new(T::describe()));
        T::register_dependencies(self)?;
        Ok(self)
    }

    /// Register or replace a class
    pub fn register_class(&self, class: BeanClass) -> &Self {
        let bean_type = class.bean_type.clone();
        let previous = self.classes.write().insert(bean_type.clone(), Arc::new(class));
        if previous.is_some() {
            log::warn!("Replacing registered class '{}'", bean_type);
        } else {
            log::debug!("Registered class '{}'", bean_type);
        }
        self
    }

    /// Check if a type is registered
    pub fn contains(&self, bean_type: &BeanType) -> bool {
        self.classes.read().contains_key(bean_type)
    }

    /// Look up a class
    pub fn class(&self, bean_type: &BeanType) -> Result<Arc<BeanClass>> {
        self.classes
            .read()
            .get(bean_type)
            .cloned()
            .ok_or_else(|| CoreError::introspection(bean_type.name(), "type is not registered"))
    }

    /// Class chain from `bean_type` up to, but excluding, the root
    pub fn ancestry(&self, bean_type: &BeanType) -> Result<Vec<Arc<BeanClass>>> {
        let mut chain = Vec::new();
        let mut current = Some(bean_type.clone());
        while let Some(ty) = current {
            if ty.is_root() {
                break;
            }
            if chain.iter().any(|c: &Arc<BeanClass>| c.bean_type == ty) {
                return Err(CoreError::introspection(bean_type.name(), "cyclic class hierarchy"));
            }
            let class = self.class(&ty)?;
            current = class.parent.clone();
            chain.push(class);
        }
        Ok(chain)
    }

    /// Every property visible on `bean_type`, subclass declarations first
    fn merged_properties(&self, bean_type: &BeanType) -> Result<Vec<PropertyDescriptor>> {
        let mut merged: BTreeMap<String, PropertyDescriptor> = BTreeMap::new();
        for class in self.ancestry(bean_type)? {
            for property in &class.properties {
                merged
                    .entry(property.name().to_string())
                    .or_insert_with(|| property.clone());
            }
        }
        Ok(merged.into_values().collect())
    }

    /// Number of registered classes, including the root
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.len())
            .finish()
    }
}

impl TypeIntrospector for TypeRegistry {
    fn readable_properties(&self, bean_type: &BeanType) -> Result<Vec<PropertyDescriptor>> {
        Ok(self
            .merged_properties(bean_type)?
            .into_iter()
            .filter(PropertyDescriptor::can_read)
            .collect())
    }

    fn writable_properties(&self, bean_type: &BeanType) -> Result<Vec<PropertyDescriptor>> {
        Ok(self
            .merged_properties(bean_type)?
            .into_iter()
            .filter(PropertyDescriptor::can_write)
            .collect())
    }

    fn declared_methods(&self, bean_type: &BeanType) -> Result<Vec<MethodDescriptor>> {
        Ok(self.class(bean_type)?.methods.clone())
    }

    fn parent(&self, bean_type: &BeanType) -> Option<BeanType> {
        if bean_type.is_root() {
            return None;
        }
        let parent = self.classes.read().get(bean_type).and_then(|c| c.parent.clone());
        Some(parent.unwrap_or_else(BeanType::root))
    }

    fn is_subclass_of(&self, bean_type: &BeanType, ancestor: &BeanType) -> bool {
        if ancestor.is_root() || bean_type == ancestor {
            return true;
        }
        self.ancestry(bean_type)
            .map(|chain| chain.iter().any(|c| &c.bean_type == ancestor))
            .unwrap_or(false)
    }
}

impl InstanceFactory for TypeRegistry {
    fn new_instance(&self, bean_type: &BeanType) -> Result<Box<dyn Bean>> {
        let class = self.class(bean_type)?;
        match (&class.constructor, class.is_abstract) {
            (Some(constructor), false) => Ok(constructor()),
            _ => Err(CoreError::no_default_constructor(bean_type.name())),
        }
    }
}
