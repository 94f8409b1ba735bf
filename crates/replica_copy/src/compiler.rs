//! Copy plan compiler
//!
//! Turns a [`CopierKey`] into a [`CopyPlan`] by matching the selected
//! source getters against the selected target setters and classifying
//! each pair. Nested bean pairs compile recursively; a pair already being
//! compiled is referenced through its pending [`PlanRef`] slot so that
//! self-referential types terminate.

use std::collections::HashMap;
use std::sync::Arc;

use replica_core::{BeanType, PropertyDescriptor, TypeIntrospector, TypeRef};

use crate::cache::CopierCache;
use crate::error::Result;
use crate::options::CopierKey;
use crate::plan::{Action, CopyPlan, ElementPlan, PlanRef, Step};
use crate::selector::PropertySelector;

/// Result of compiling one top-level pair
pub struct Compilation {
    pub plan: Arc<CopyPlan>,
    /// Nested pairs compiled along the way, ready to be cached
    pub nested: Vec<(CopierKey, Arc<CopyPlan>)>,
}

/// Single-use compiler for one top-level pair
pub struct PlanCompiler<'a> {
    introspector: &'a dyn TypeIntrospector,
    selector: &'a dyn PropertySelector,
    cache: &'a CopierCache,
    pending: HashMap<CopierKey, PlanRef>,
    nested: Vec<(CopierKey, Arc<CopyPlan>)>,
}

impl<'a> PlanCompiler<'a> {
    pub fn new(
        introspector: &'a dyn TypeIntrospector,
        selector: &'a dyn PropertySelector,
        cache: &'a CopierCache,
    ) -> Self {
        Self {
            introspector,
            selector,
            cache,
            pending: HashMap::new(),
            nested: Vec::new(),
        }
    }

    pub fn compile(mut self, key: &CopierKey) -> Result<Compilation> {
        let plan = self.compile_pair(key)?;
        Ok(Compilation {
            plan,
            nested: self.nested,
        })
    }

    fn compile_pair(&mut self, key: &CopierKey) -> Result<Arc<CopyPlan>> {
        let slot = PlanRef::default();
        self.pending.insert(key.clone(), slot.clone());

        let getters = self.selector.select_getters(self.introspector, &key.source)?;
        let setters = self.selector.select_setters(self.introspector, &key.target)?;

        let mut by_name: HashMap<&str, &PropertyDescriptor> = HashMap::with_capacity(getters.len());
        for getter in getters.iter() {
            by_name.entry(getter.name()).or_insert(getter);
        }

        let mut steps = Vec::with_capacity(setters.len());
        for setter in setters.iter() {
            let getter = key
                .mapping
                .source_for(setter.name())
                .and_then(|name| by_name.get(name).copied());
            let Some(getter) = getter else {
                log::trace!("No source property for '{}' on {}", setter.name(), key.target);
                continue;
            };
            match self.classify(key, getter, setter)? {
                Some(action) => steps.push(Step {
                    getter: getter.clone(),
                    setter: setter.clone(),
                    action,
                }),
                None => log::trace!(
                    "Skipped '{}' ({}) -> '{}' ({}): incompatible types",
                    getter.name(),
                    getter.declared_type(),
                    setter.name(),
                    setter.declared_type()
                ),
            }
        }

        log::debug!("Compiled copier {} with {} steps", key, steps.len());
        let plan = Arc::new(CopyPlan {
            source: key.source.clone(),
            target: key.target.clone(),
            use_filter: key.use_filter,
            use_converter: key.use_converter,
            steps,
        });
        slot.fill(plan.clone());
        Ok(plan)
    }

    fn classify(
        &mut self,
        key: &CopierKey,
        getter: &PropertyDescriptor,
        setter: &PropertyDescriptor,
    ) -> Result<Option<Action>> {
        let action = match (setter.declared_type(), getter.declared_type()) {
            (
                TypeRef::Collection { kind, element: Some(target) },
                TypeRef::Collection { element: Some(source), .. },
            ) => Action::Sequence {
                kind: kind.default_concrete(),
                element: self.element_plan(key, source, target)?,
            },
            (TypeRef::Map { kind, entry: Some(target) }, TypeRef::Map { entry: Some(source), .. }) => Action::Map {
                kind: kind.default_concrete(),
                key: self.element_plan(key, &source.0, &target.0)?,
                value: self.element_plan(key, &source.1, &target.1)?,
            },
            (TypeRef::Array(target), TypeRef::Array(source)) => Action::Array {
                component: (**target).clone(),
                element: self.element_plan(key, source, target)?,
            },
            (TypeRef::Bean(target), TypeRef::Bean(source)) => Action::Bean {
                target: target.clone(),
                plan: self.nested_plan(key, source, target)?,
            },
            _ => return Ok(self.scalar_action(key, getter, setter)),
        };
        Ok(Some(action))
    }

    fn scalar_action(&self, key: &CopierKey, getter: &PropertyDescriptor, setter: &PropertyDescriptor) -> Option<Action> {
        let introspector = self.introspector;
        let compatible = setter
            .declared_type()
            .is_assignable_from(getter.declared_type(), &|sub, ancestor| introspector.is_subclass_of(sub, ancestor));
        match (key.use_filter, key.use_converter) {
            (false, false) => compatible.then_some(Action::Assign),
            (false, true) => Some(Action::Convert),
            (true, false) => compatible.then_some(Action::FilterAssign),
            (true, true) => Some(Action::FilterConvert),
        }
    }

    fn element_plan(&mut self, key: &CopierKey, source: &TypeRef, target: &TypeRef) -> Result<ElementPlan> {
        Ok(match (source, target) {
            (TypeRef::Bean(source), TypeRef::Bean(target)) => ElementPlan::Bean {
                target: target.clone(),
                plan: self.nested_plan(key, source, target)?,
            },
            (TypeRef::Temporal(from), TypeRef::Temporal(to)) if from != to => ElementPlan::Temporal(*to),
            _ => ElementPlan::Direct(target.clone()),
        })
    }

    fn nested_plan(&mut self, key: &CopierKey, source: &BeanType, target: &BeanType) -> Result<PlanRef> {
        let nested = key.nested(source.clone(), target.clone());
        if let Some(slot) = self.pending.get(&nested) {
            return Ok(slot.clone());
        }
        if let Some(copier) = self.cache.get(&nested) {
            return Ok(PlanRef::ready(copier.plan().clone()));
        }
        let plan = self.compile_pair(&nested)?;
        self.nested.push((nested, plan.clone()));
        Ok(PlanRef::ready(plan))
    }
}
