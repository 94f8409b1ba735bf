//! Property selection policies
//!
//! A selector decides which properties of a bean type take part in a
//! copy: the readable ones on the source side ("getters") and the
//! writable ones on the target side ("setters"). Results are memoized per
//! bean type.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use replica_core::{BeanType, PropertyDescriptor, ReturnType, TypeIntrospector, TypeRef};

use crate::error::Result;

/// Shared, immutable property list
pub type Properties = Arc<Vec<PropertyDescriptor>>;

/// Chooses the properties a copier reads and writes
pub trait PropertySelector: Send + Sync {
    /// Stable identity, part of the copier cache key
    fn name(&self) -> &str;

    /// Readable properties of `bean_type`
    fn select_getters(&self, introspector: &dyn TypeIntrospector, bean_type: &BeanType) -> Result<Properties>;

    /// Writable properties of `bean_type`
    fn select_setters(&self, introspector: &dyn TypeIntrospector, bean_type: &BeanType) -> Result<Properties>;
}

/// Per-type memo of selected properties.
///
/// Concurrent first lookups may both compute; the first stored result is
/// kept and returned to every caller.
#[derive(Default)]
pub struct SelectorMemo {
    getters: RwLock<HashMap<BeanType, Properties>>,
    setters: RwLock<HashMap<BeanType, Properties>>,
}

impl SelectorMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn getters(&self, bean_type: &BeanType, compute: impl FnOnce() -> Result<Vec<PropertyDescriptor>>) -> Result<Properties> {
        Self::lookup(&self.getters, bean_type, compute)
    }

    pub fn setters(&self, bean_type: &BeanType, compute: impl FnOnce() -> Result<Vec<PropertyDescriptor>>) -> Result<Properties> {
        Self::lookup(&self.setters, bean_type, compute)
    }

    fn lookup(
        map: &RwLock<HashMap<BeanType, Properties>>,
        bean_type: &BeanType,
        compute: impl FnOnce() -> Result<Vec<PropertyDescriptor>>,
    ) -> Result<Properties> {
        if let Some(found) = map.read().get(bean_type) {
            return Ok(found.clone());
        }
        let computed = Arc::new(compute()?);
        Ok(map.write().entry(bean_type.clone()).or_insert(computed).clone())
    }

    /// Number of memoized types (getters, setters)
    pub fn cached(&self) -> (usize, usize) {
        (self.getters.read().len(), self.setters.read().len())
    }
}

/// Conventional accessor pairs only
#[derive(Default)]
pub struct StandardSelector {
    memo: SelectorMemo,
}

impl StandardSelector {
    pub const NAME: &'static str = "standard";

    pub fn new() -> Self {
        Self::default()
    }
}

impl PropertySelector for StandardSelector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn select_getters(&self, introspector: &dyn TypeIntrospector, bean_type: &BeanType) -> Result<Properties> {
        self.memo.getters(bean_type, || {
            if bean_type.is_root() {
                return Ok(Vec::new());
            }
            Ok(introspector.readable_properties(bean_type)?)
        })
    }

    fn select_setters(&self, introspector: &dyn TypeIntrospector, bean_type: &BeanType) -> Result<Properties> {
        self.memo.setters(bean_type, || {
            if bean_type.is_root() {
                return Ok(Vec::new());
            }
            Ok(introspector.writable_properties(bean_type)?)
        })
    }
}

/// Also treats single-argument `set*` methods returning nothing or the
/// declaring type as setters, searching the whole ancestor chain
#[derive(Default)]
pub struct NonStandardSelector {
    memo: SelectorMemo,
}

impl NonStandardSelector {
    pub const NAME: &'static str = "non_standard";

    const SET_PREFIX: &'static str = "set";

    pub fn new() -> Self {
        Self::default()
    }

    /// `set_name`, `setName` and `setname` all map to `name`
    fn property_name(method: &str) -> Option<String> {
        let rest = method.strip_prefix(Self::SET_PREFIX)?;
        let rest = rest.strip_prefix('_').unwrap_or(rest);
        let mut chars = rest.chars();
        let first = chars.next()?;
        Some(first.to_lowercase().chain(chars).collect())
    }

    /// Mutator-style methods declared along the chain, subclass first.
    /// The first declaration of a property name wins.
    fn fluent_setters(&self, introspector: &dyn TypeIntrospector, bean_type: &BeanType) -> Result<Vec<PropertyDescriptor>> {
        let mut setters: Vec<PropertyDescriptor> = Vec::new();
        let mut current = Some(bean_type.clone());
        while let Some(class_type) = current.filter(|t| !t.is_root()) {
            for method in introspector.declared_methods(&class_type)? {
                let returns_self = match &method.returns {
                    ReturnType::Void | ReturnType::SelfType => true,
                    ReturnType::Type(ty) => *ty == TypeRef::Bean(class_type.clone()),
                };
                let (Some(name), Some(invoker), [param]) =
                    (Self::property_name(&method.name), method.invoker.clone(), method.params.as_slice())
                else {
                    continue;
                };
                if !returns_self || setters.iter().any(|s| s.name() == name) {
                    continue;
                }
                setters.push(PropertyDescriptor::new(name, param.clone()).with_writer(invoker, method.name.clone()));
            }
            current = introspector.parent(&class_type);
        }
        setters.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(setters)
    }
}

impl PropertySelector for NonStandardSelector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn select_getters(&self, introspector: &dyn TypeIntrospector, bean_type: &BeanType) -> Result<Properties> {
        self.memo.getters(bean_type, || {
            if bean_type.is_root() {
                return Ok(Vec::new());
            }
            let getters = introspector.readable_properties(bean_type)?;
            if getters.is_empty() {
                return Ok(getters);
            }
            let setters = self.fluent_setters(introspector, bean_type)?;
            Ok(getters
                .into_iter()
                .map(|getter| {
                    let fluent = setters.iter().find(|s| s.name() == getter.name());
                    match (fluent.and_then(|s| s.writer().cloned()), fluent.and_then(|s| s.write_method())) {
                        (Some(writer), Some(method)) => getter.with_writer(writer, method.to_string()),
                        _ => getter,
                    }
                })
                .collect())
        })
    }

    fn select_setters(&self, introspector: &dyn TypeIntrospector, bean_type: &BeanType) -> Result<Properties> {
        self.memo.setters(bean_type, || {
            if bean_type.is_root() {
                return Ok(Vec::new());
            }
            let setters = self.fluent_setters(introspector, bean_type)?;
            if setters.is_empty() {
                return Ok(setters);
            }
            let getters = introspector.readable_properties(bean_type)?;
            Ok(setters
                .into_iter()
                .map(|setter| {
                    match getters.iter().find(|g| g.name() == setter.name()).and_then(|g| g.reader().cloned()) {
                        Some(reader) => setter.with_reader(reader),
                        None => setter,
                    }
                })
                .collect())
        })
    }
}
