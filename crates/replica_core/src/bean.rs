//! Bean instances and runtime-defined bean classes

use core::any::Any;
use std::collections::BTreeMap;

use crate::descriptor::BeanClass;
use crate::error::{CoreError, Result};
use crate::registry::TypeRegistry;
use crate::types::BeanType;
use crate::value::Value;

/// A mutable object with named properties.
///
/// Property access goes through the descriptors of the bean's
/// [`BeanClass`]; this trait only exposes identity, cloning and
/// downcasting.
pub trait Bean: Any + Send + Sync {
    /// Runtime class of this instance
    fn bean_type(&self) -> BeanType;

    /// Property values ordered by name
    fn snapshot(&self) -> Vec<(String, Value)>;

    /// Deep clone into a boxed trait object
    fn clone_bean(&self) -> Box<dyn Bean>;

    /// Get as Any reference (for downcasting)
    fn as_any(&self) -> &dyn Any;

    /// Get as mutable Any reference (for downcasting)
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convert into a boxed Any
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl dyn Bean {
    /// Downcast to a concrete type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Downcast to a mutable concrete type
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

/// Downcast or report the mismatch
pub fn downcast_bean<T: 'static>(bean: &dyn Bean) -> Result<&T> {
    bean.downcast_ref::<T>().ok_or_else(|| {
        CoreError::type_mismatch(core::any::type_name::<T>(), bean.bean_type().name())
    })
}

/// Mutable variant of [`downcast_bean`]
pub fn downcast_bean_mut<T: 'static>(bean: &mut dyn Bean) -> Result<&mut T> {
    let found = bean.bean_type();
    bean.downcast_mut::<T>()
        .ok_or_else(|| CoreError::type_mismatch(core::any::type_name::<T>(), found.name()))
}

/// Static description of a compile-time bean type
pub trait BeanDescribe: Bean + Sized {
    /// Class identity shared by all instances
    fn class_type() -> BeanType {
        BeanType::of::<Self>()
    }

    /// Build the class descriptor
    fn describe() -> BeanClass;

    /// Register bean types reachable from this type's properties
    fn register_dependencies(_registry: &TypeRegistry) -> Result<()> {
        Ok(())
    }
}

/// A bean whose class is defined at runtime.
///
/// Values live in a name-keyed map; unset properties read as the declared
/// default of their type.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicBean {
    bean_type: BeanType,
    values: BTreeMap<String, Value>,
}

impl DynamicBean {
    pub fn new(bean_type: BeanType) -> Self {
        Self {
            bean_type,
            values: BTreeMap::new(),
        }
    }

    /// Raw stored value, bypassing descriptors
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Raw store, bypassing descriptors
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Builder-style raw store
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value.into());
        self
    }
}

impl Bean for DynamicBean {
    fn bean_type(&self) -> BeanType {
        self.bean_type.clone()
    }

    fn snapshot(&self) -> Vec<(String, Value)> {
        self.values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn clone_bean(&self) -> Box<dyn Bean> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
