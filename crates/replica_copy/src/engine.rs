//! Copy engine
//!
//! [`CopyEngine`] ties the registry, the selectors, the compiler and the
//! copier cache together and offers the convenience copy operations. It
//! replaces process-wide state: each engine carries its own default
//! selector and cache.

use std::sync::Arc;

use parking_lot::RwLock;

use replica_core::{
    Bean, BeanDescribe, BeanType, BeanValue, CoreError, InstanceFactory, TypeRegistry,
};

use crate::cache::CopierCache;
use crate::compiler::PlanCompiler;
use crate::config::{CopyConfig, SelectorKind};
use crate::converter::Converter;
use crate::copier::CompiledCopier;
use crate::error::Result;
use crate::extension::{Extended, Property};
use crate::filter::{Filter, IgnoreNull, IgnoreProperties};
use crate::options::{CopierKey, CopySpec, NameMapping};
use crate::selector::{NonStandardSelector, PropertySelector, StandardSelector};
use crate::smart::SmartConverter;

/// Compiles, caches and runs copiers between registered bean types
pub struct CopyEngine {
    registry: Arc<TypeRegistry>,
    cache: CopierCache,
    standard: Arc<StandardSelector>,
    non_standard: Arc<NonStandardSelector>,
    default_selector: RwLock<Arc<dyn PropertySelector>>,
    smart: SmartConverter,
    config: CopyConfig,
}

impl CopyEngine {
    /// Create an engine with the default configuration
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        let config = CopyConfig::default();
        let standard = Arc::new(StandardSelector::new());
        let default_selector: Arc<dyn PropertySelector> = standard.clone();
        Self {
            registry,
            cache: CopierCache::new(),
            standard,
            non_standard: Arc::new(NonStandardSelector::new()),
            default_selector: RwLock::new(default_selector),
            smart: SmartConverter::new(config.delimiter.clone()),
            config,
        }
    }

    /// Create an engine from a validated configuration
    pub fn with_config(registry: Arc<TypeRegistry>, config: CopyConfig) -> Result<Self> {
        config.validate()?;
        let mut engine = Self::new(registry);
        engine.set_default_selector(engine.selector(config.default_selector));
        engine.smart = SmartConverter::new(config.delimiter.clone());
        engine.config = config;
        Ok(engine)
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &CopyConfig {
        &self.config
    }

    pub fn cache(&self) -> &CopierCache {
        &self.cache
    }

    /// Converter used by the `smart_*` operations
    pub fn smart_converter(&self) -> &SmartConverter {
        &self.smart
    }

    /// Shared instance of a built-in selector
    pub fn selector(&self, kind: SelectorKind) -> Arc<dyn PropertySelector> {
        match kind {
            SelectorKind::Standard => self.standard.clone(),
            SelectorKind::NonStandard => self.non_standard.clone(),
        }
    }

    pub fn default_selector(&self) -> Arc<dyn PropertySelector> {
        self.default_selector.read().clone()
    }

    /// Replace the selector used by compilations that do not name one.
    /// Copiers already cached are unaffected.
    pub fn set_default_selector(&self, selector: Arc<dyn PropertySelector>) {
        log::debug!("Default selector set to '{}'", selector.name());
        *self.default_selector.write() = selector;
    }

    pub fn set_default_selector_kind(&self, kind: SelectorKind) {
        self.set_default_selector(self.selector(kind));
    }

    /// Start describing a copier from `source` to `target`
    pub fn builder(&self, source: BeanType, target: BeanType) -> CopierBuilder<'_> {
        CopierBuilder {
            engine: self,
            spec: CopySpec::new(source, target),
        }
    }

    /// Compiled copier for `spec`, from the cache when available
    pub fn compile(&self, spec: &CopySpec) -> Result<Arc<CompiledCopier>> {
        let selector = spec.selector.clone().unwrap_or_else(|| self.default_selector());
        let key = CopierKey::new(spec, selector.as_ref());
        if let Some(copier) = self.cache.get(&key) {
            return Ok(copier);
        }

        let compilation = PlanCompiler::new(self.registry.as_ref(), selector.as_ref(), &self.cache).compile(&key)?;
        for (nested, plan) in compilation.nested {
            self.cache
                .insert(nested, Arc::new(CompiledCopier::new(plan, self.registry.clone())));
        }
        let copier = Arc::new(CompiledCopier::new(compilation.plan, self.registry.clone()));
        Ok(self.cache.insert(key, copier))
    }

    /// Copy matching properties with plain assignment
    pub fn copy(&self, source: &dyn Bean, target: &mut dyn Bean) -> Result<()> {
        self.copy_with(source, target, None, None)
    }

    /// Copy with optional hooks; the copier is compiled for the hooks given
    pub fn copy_with(
        &self,
        source: &dyn Bean,
        target: &mut dyn Bean,
        filter: Option<&dyn Filter>,
        converter: Option<&dyn Converter>,
    ) -> Result<()> {
        let copier = self
            .builder(source.bean_type(), target.bean_type())
            .filter(filter.is_some())
            .converter(converter.is_some())
            .build()?;
        copier.copy(source, target, filter, converter)
    }

    /// Copy through a target-to-source name mapping
    pub fn copy_mapped(&self, source: &dyn Bean, target: &mut dyn Bean, mapping: NameMapping) -> Result<()> {
        let copier = self
            .builder(source.bean_type(), target.bean_type())
            .mapping(mapping)
            .build()?;
        copier.copy(source, target, None, None)
    }

    /// Copy into a fresh instance of `T`
    pub fn copy_to<T: BeanDescribe>(&self, source: &dyn Bean) -> Result<T> {
        self.copy_to_with(source, None, None)
    }

    pub fn copy_to_with<T: BeanDescribe>(
        &self,
        source: &dyn Bean,
        filter: Option<&dyn Filter>,
        converter: Option<&dyn Converter>,
    ) -> Result<T> {
        self.registry.register::<T>()?;
        let instance = self.copy_to_type_with(source, &T::class_type(), filter, converter)?;
        instance
            .downcast::<T>()
            .map_err(|found| CoreError::type_mismatch(T::class_type().name(), found.name()).into())
    }

    /// Copy into a fresh instance of a registered type
    pub fn copy_to_type(&self, source: &dyn Bean, target: &BeanType) -> Result<BeanValue> {
        self.copy_to_type_with(source, target, None, None)
    }

    fn copy_to_type_with(
        &self,
        source: &dyn Bean,
        target: &BeanType,
        filter: Option<&dyn Filter>,
        converter: Option<&dyn Converter>,
    ) -> Result<BeanValue> {
        let mut instance = self.registry.new_instance(target)?;
        self.copy_with(source, instance.as_mut(), filter, converter)?;
        Ok(BeanValue::from_box(instance))
    }

    /// Copy each source into a fresh `T`, preserving order
    pub fn copy_list<S: Bean, T: BeanDescribe>(&self, sources: &[S]) -> Result<Vec<T>> {
        self.copy_list_with(sources, None, None)
    }

    pub fn copy_list_with<S: Bean, T: BeanDescribe>(
        &self,
        sources: &[S],
        filter: Option<&dyn Filter>,
        converter: Option<&dyn Converter>,
    ) -> Result<Vec<T>> {
        sources
            .iter()
            .map(|source| self.copy_to_with::<T>(source, filter, converter))
            .collect()
    }

    /// Copy everything except the named source properties
    pub fn copy_ignore_properties(&self, source: &dyn Bean, target: &mut dyn Bean, names: &[&str]) -> Result<()> {
        let filter = IgnoreProperties::new(names.iter().copied());
        self.copy_with(source, target, Some(&filter), None)
    }

    /// Copy only non-null source values
    pub fn copy_ignore_null(&self, source: &dyn Bean, target: &mut dyn Bean) -> Result<()> {
        self.copy_ignore_null_with(source, target, None)
    }

    pub fn copy_ignore_null_with(
        &self,
        source: &dyn Bean,
        target: &mut dyn Bean,
        converter: Option<&dyn Converter>,
    ) -> Result<()> {
        self.copy_with(source, target, Some(&IgnoreNull), converter)
    }

    /// Copy every matched scalar through `converter`
    pub fn copy_convert(&self, source: &dyn Bean, target: &mut dyn Bean, converter: &dyn Converter) -> Result<()> {
        self.copy_with(source, target, None, Some(converter))
    }

    /// Copy non-null values, coercing mismatched types with the smart converter
    pub fn smart_copy(&self, source: &dyn Bean, target: &mut dyn Bean) -> Result<()> {
        self.copy_ignore_null_with(source, target, Some(&self.smart))
    }

    pub fn smart_copy_to<T: BeanDescribe>(&self, source: &dyn Bean) -> Result<T> {
        self.copy_to_with(source, Some(&IgnoreNull), Some(&self.smart))
    }

    pub fn smart_copy_list<S: Bean, T: BeanDescribe>(&self, sources: &[S]) -> Result<Vec<T>> {
        self.copy_list_with(sources, Some(&IgnoreNull), Some(&self.smart))
    }

    /// Assign each property to the writable property of the same name
    /// and declared type; others are skipped. Returns the number assigned.
    pub fn set_values(&self, target: &mut dyn Bean, properties: &[Property]) -> Result<usize> {
        let setters = self
            .default_selector()
            .select_setters(self.registry.as_ref(), &target.bean_type())?;
        let mut assigned = 0;
        for property in properties {
            let setter = setters
                .iter()
                .find(|s| s.name() == property.name && *s.declared_type() == property.declared_type);
            match setter {
                Some(setter) => {
                    setter.write(target, property.value.clone())?;
                    assigned += 1;
                }
                None => log::trace!("No writable '{}' of type {}", property.name, property.declared_type),
            }
        }
        Ok(assigned)
    }

    /// Copy of `source` carrying extra properties
    pub fn extend(&self, source: &dyn Bean, properties: impl IntoIterator<Item = Property>) -> Result<Extended> {
        let properties: Vec<Property> = properties.into_iter().collect();
        for property in &properties {
            if !property.declared_type.accepts_value(&property.value) {
                return Err(CoreError::type_mismatch(property.declared_type.to_string(), property.value.type_name()).into());
            }
        }
        Ok(Extended::new(BeanValue::from_box(source.clone_bean()), properties))
    }
}

impl core::fmt::Debug for CopyEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CopyEngine")
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .field("default_selector", &self.default_selector().name())
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for a [`CopySpec`] compiled by a [`CopyEngine`]
pub struct CopierBuilder<'e> {
    engine: &'e CopyEngine,
    spec: CopySpec,
}

impl<'e> CopierBuilder<'e> {
    pub fn filter(mut self, use_filter: bool) -> Self {
        self.spec.use_filter = use_filter;
        self
    }

    pub fn converter(mut self, use_converter: bool) -> Self {
        self.spec.use_converter = use_converter;
        self
    }

    /// Replace the whole name mapping
    pub fn mapping(mut self, mapping: NameMapping) -> Self {
        self.spec.mapping = mapping;
        self
    }

    /// Read target property `target_attr` from source property `source_attr`
    pub fn append(mut self, source_attr: impl Into<String>, target_attr: impl Into<String>) -> Self {
        self.spec.mapping.insert(source_attr, target_attr);
        self
    }

    pub fn selector(mut self, selector: Arc<dyn PropertySelector>) -> Self {
        self.spec.selector = Some(selector);
        self
    }

    pub fn selector_kind(self, kind: SelectorKind) -> Self {
        let selector = self.engine.selector(kind);
        self.selector(selector)
    }

    pub fn spec(&self) -> &CopySpec {
        &self.spec
    }

    pub fn build(self) -> Result<Arc<CompiledCopier>> {
        self.engine.compile(&self.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CopyError;
    use replica_core::{BeanClass, DynamicBean, ScalarKind, TypeRef, Value};

    fn engine() -> CopyEngine {
        let registry = TypeRegistry::new();
        registry.register_class(
            BeanClass::dynamic("Account")
                .property("owner", TypeRef::String)
                .property("balance", TypeRef::primitive(ScalarKind::Long))
                .build(),
        );
        registry.register_class(
            BeanClass::dynamic("Summary")
                .property("owner", TypeRef::String)
                .property("balance", TypeRef::String)
                .build(),
        );
        CopyEngine::new(Arc::new(registry))
    }

    fn account() -> DynamicBean {
        DynamicBean::new(BeanType::named("Account"))
            .with("owner", "ada")
            .with("balance", 42i64)
    }

    #[test]
    fn test_compile_reuses_cached_copier() {
        let engine = engine();
        let first = engine
            .builder(BeanType::named("Account"), BeanType::named("Summary"))
            .build()
            .unwrap();
        let second = engine
            .builder(BeanType::named("Account"), BeanType::named("Summary"))
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let mapped = engine
            .builder(BeanType::named("Account"), BeanType::named("Summary"))
            .append("owner", "balance")
            .build()
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &mapped));
        assert_eq!(engine.cache().len(), 2);
    }

    #[test]
    fn test_default_selector_is_configurable() {
        let engine = engine();
        assert_eq!(engine.default_selector().name(), StandardSelector::NAME);
        engine.set_default_selector_kind(SelectorKind::NonStandard);
        assert_eq!(engine.default_selector().name(), NonStandardSelector::NAME);

        let config = CopyConfig::default().with_default_selector(SelectorKind::NonStandard);
        let configured = CopyEngine::with_config(Arc::new(TypeRegistry::new()), config).unwrap();
        assert_eq!(configured.default_selector().name(), NonStandardSelector::NAME);

        let invalid = CopyConfig::default().with_delimiter("");
        assert!(matches!(
            CopyEngine::with_config(Arc::new(TypeRegistry::new()), invalid),
            Err(CopyError::Config(_))
        ));
    }

    #[test]
    fn test_smart_copy_coerces_mismatched_types() {
        let engine = engine();
        let mut summary = DynamicBean::new(BeanType::named("Summary"));

        engine.copy(&account(), &mut summary).unwrap();
        assert_eq!(summary.get("owner"), Some(&Value::from("ada")));
        assert_eq!(summary.get("balance"), None);

        engine.smart_copy(&account(), &mut summary).unwrap();
        assert_eq!(summary.get("balance"), Some(&Value::from("42")));
    }

    #[test]
    fn test_set_values_requires_matching_type() {
        let engine = engine();
        let mut target = account();
        let assigned = engine
            .set_values(
                &mut target,
                &[
                    Property::new("owner", TypeRef::String, "grace"),
                    Property::new("balance", TypeRef::String, "ignored"),
                    Property::new("missing", TypeRef::String, "ignored"),
                ],
            )
            .unwrap();
        assert_eq!(assigned, 1);
        assert_eq!(target.get("owner"), Some(&Value::from("grace")));
        assert_eq!(target.get("balance"), Some(&Value::Long(42)));
    }

    #[test]
    fn test_extend_checks_declared_types() {
        let engine = engine();
        let extended = engine
            .extend(&account(), [Property::new("rank", TypeRef::primitive(ScalarKind::Int), 3)])
            .unwrap();
        assert_eq!(extended.get("rank"), Some(Value::Int(3)));
        assert_eq!(extended.get("owner"), Some(Value::from("ada")));

        let err = engine
            .extend(&account(), [Property::new("rank", TypeRef::primitive(ScalarKind::Int), "high")])
            .unwrap_err();
        assert!(matches!(err, CopyError::Core(CoreError::TypeMismatch { .. })));
    }
}
