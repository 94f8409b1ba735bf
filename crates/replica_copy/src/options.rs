//! Copy options and cache keys

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use replica_core::BeanType;

use crate::selector::PropertySelector;

/// Target property name to source property name.
///
/// An empty mapping matches properties by identical name. A non-empty
/// mapping is exclusive: unmapped target properties are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NameMapping(BTreeMap<String, String>);

impl NameMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `target_attr` to read from `source_attr`
    pub fn append(mut self, source_attr: impl Into<String>, target_attr: impl Into<String>) -> Self {
        self.insert(source_attr, target_attr);
        self
    }

    pub fn insert(&mut self, source_attr: impl Into<String>, target_attr: impl Into<String>) {
        self.0.insert(target_attr.into(), source_attr.into());
    }

    /// Add every entry of `other`, replacing existing targets
    pub fn extend(&mut self, other: &NameMapping) {
        self.0.extend(other.0.iter().map(|(t, s)| (t.clone(), s.clone())));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Source property feeding `target_name`, if any
    pub fn source_for<'a>(&'a self, target_name: &'a str) -> Option<&'a str> {
        if self.0.is_empty() {
            Some(target_name)
        } else {
            self.0.get(target_name).map(String::as_str)
        }
    }
}

impl<S: Into<String>, T: Into<String>> FromIterator<(T, S)> for NameMapping {
    /// Collect `(target, source)` pairs
    fn from_iter<I: IntoIterator<Item = (T, S)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(t, s)| (t.into(), s.into())).collect())
    }
}

/// Everything that determines a compiled copier
#[derive(Clone)]
pub struct CopySpec {
    pub source: BeanType,
    pub target: BeanType,
    pub use_filter: bool,
    pub use_converter: bool,
    pub mapping: NameMapping,
    /// `None` uses the engine's default selector
    pub selector: Option<Arc<dyn PropertySelector>>,
}

impl CopySpec {
    pub fn new(source: BeanType, target: BeanType) -> Self {
        Self {
            source,
            target,
            use_filter: false,
            use_converter: false,
            mapping: NameMapping::new(),
            selector: None,
        }
    }

    pub fn with_filter(mut self, use_filter: bool) -> Self {
        self.use_filter = use_filter;
        self
    }

    pub fn with_converter(mut self, use_converter: bool) -> Self {
        self.use_converter = use_converter;
        self
    }

    pub fn with_mapping(mut self, mapping: NameMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_selector(mut self, selector: Arc<dyn PropertySelector>) -> Self {
        self.selector = Some(selector);
        self
    }
}

impl fmt::Debug for CopySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopySpec")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("use_filter", &self.use_filter)
            .field("use_converter", &self.use_converter)
            .field("mapping", &self.mapping)
            .field("selector", &self.selector.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

/// Structural identity of a compiled copier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CopierKey {
    pub source: BeanType,
    pub target: BeanType,
    pub use_filter: bool,
    pub use_converter: bool,
    pub selector: String,
    pub mapping: NameMapping,
}

impl CopierKey {
    pub fn new(spec: &CopySpec, selector: &dyn PropertySelector) -> Self {
        Self {
            source: spec.source.clone(),
            target: spec.target.clone(),
            use_filter: spec.use_filter,
            use_converter: spec.use_converter,
            selector: selector.name().to_string(),
            mapping: spec.mapping.clone(),
        }
    }

    /// Key of a nested bean pair compiled under this key's options
    pub fn nested(&self, source: BeanType, target: BeanType) -> Self {
        Self {
            source,
            target,
            use_filter: self.use_filter,
            use_converter: self.use_converter,
            selector: self.selector.clone(),
            mapping: NameMapping::new(),
        }
    }
}

impl fmt::Display for CopierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [filter={}, converter={}, selector={}, mapped={}]",
            self.source,
            self.target,
            self.use_filter,
            self.use_converter,
            self.selector,
            self.mapping.len()
        )
    }
}
