//! Compiled copy plans and their executor
//!
//! A [`CopyPlan`] is the output of the compiler: an ordered list of steps,
//! one per matched property pair. Executing a plan reads each source
//! property, transforms the value as the step dictates and writes it to
//! the target. Plans hold no instance state and are shared freely.

use std::sync::{Arc, OnceLock};

use serde::Serialize;

use replica_core::{
    temporal, Bean, BeanType, BeanValue, CollectionKind, CoreError, InstanceFactory, MapKind,
    PropertyDescriptor, TemporalKind, TypeRef, Value,
};

use crate::converter::Converter;
use crate::error::{CopyError, Result};
use crate::filter::Filter;

/// Hooks supplied to a single copy invocation
#[derive(Clone, Copy, Default)]
pub struct CopyContext<'a> {
    pub filter: Option<&'a dyn Filter>,
    pub converter: Option<&'a dyn Converter>,
}

/// Slot for a nested plan, filled once its compilation finishes.
///
/// Self-referential bean types point back at a slot that is still being
/// compiled; it is always filled before the outer plan is published.
#[derive(Clone, Default)]
pub struct PlanRef(Arc<OnceLock<Arc<CopyPlan>>>);

impl PlanRef {
    pub fn ready(plan: Arc<CopyPlan>) -> Self {
        let slot = Self::default();
        slot.fill(plan);
        slot
    }

    pub fn fill(&self, plan: Arc<CopyPlan>) {
        // a slot is only filled by the compilation that created it
        let _ = self.0.set(plan);
    }

    pub fn get(&self) -> Option<&Arc<CopyPlan>> {
        self.0.get()
    }

    fn resolve(&self, target: &BeanType) -> Result<&Arc<CopyPlan>> {
        self.get()
            .ok_or_else(|| CopyError::IncompletePlan(target.to_string()))
    }
}

/// How a single container element is carried over
#[derive(Clone)]
pub enum ElementPlan {
    /// Stored as is; `Null` into a primitive slot becomes zero
    Direct(TypeRef),
    /// Re-expressed as another date/time kind through epoch milliseconds
    Temporal(TemporalKind),
    /// Copied into a fresh target bean
    Bean { target: BeanType, plan: PlanRef },
}

impl ElementPlan {
    fn apply(&self, value: Value, factory: &dyn InstanceFactory, ctx: &CopyContext<'_>) -> Result<Value> {
        match self {
            ElementPlan::Direct(ty) if value.is_null() => Ok(ty.default_value()),
            ElementPlan::Direct(_) => Ok(value),
            ElementPlan::Temporal(kind) => Ok(temporal::convert(&value, *kind)?.unwrap_or(value)),
            ElementPlan::Bean { target, plan } => match value {
                Value::Null => Ok(Value::Null),
                Value::Bean(source) => copy_bean(source.as_bean(), target, plan, factory, ctx),
                other => Err(CoreError::type_mismatch(target.name(), other.type_name()).into()),
            },
        }
    }

    fn label(&self) -> String {
        match self {
            ElementPlan::Direct(ty) => ty.to_string(),
            ElementPlan::Temporal(kind) => format!("{} via epoch millis", kind.name()),
            ElementPlan::Bean { target, .. } => format!("copy of {}", target.short_name()),
        }
    }
}

/// What a step does with the source value
#[derive(Clone)]
pub enum Action {
    /// Plain assignment of a compatible value
    Assign,
    /// Assign the converter's output
    Convert,
    /// Assign a compatible value when the filter accepts
    FilterAssign,
    /// Assign the converter's output when the filter accepts
    FilterConvert,
    /// Fresh target bean populated by a nested plan
    Bean { target: BeanType, plan: PlanRef },
    /// Fresh container of `kind`
    Sequence { kind: CollectionKind, element: ElementPlan },
    Map { kind: MapKind, key: ElementPlan, value: ElementPlan },
    Array { component: TypeRef, element: ElementPlan },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Assign => "assign",
            Action::Convert => "convert",
            Action::FilterAssign => "filter_assign",
            Action::FilterConvert => "filter_convert",
            Action::Bean { .. } => "bean",
            Action::Sequence { .. } => "sequence",
            Action::Map { .. } => "map",
            Action::Array { .. } => "array",
        }
    }
}

/// One matched property pair
#[derive(Clone)]
pub struct Step {
    pub getter: PropertyDescriptor,
    pub setter: PropertyDescriptor,
    pub action: Action,
}

impl Step {
    /// Mutator name handed to converters
    fn hint(&self) -> String {
        match self.setter.write_method() {
            Some(method) => method.to_string(),
            None => format!("set_{}", self.setter.name()),
        }
    }

    fn execute(
        &self,
        source: &dyn Bean,
        target: &mut dyn Bean,
        factory: &dyn InstanceFactory,
        ctx: &CopyContext<'_>,
    ) -> Result<()> {
        let value = self.getter.read(source)?;
        let output = match &self.action {
            Action::Assign => Some(value),
            Action::Convert => Some(self.convert(value, ctx)?),
            Action::FilterAssign => self.accepted(&value, target, ctx)?.then_some(value),
            Action::FilterConvert => match self.accepted(&value, target, ctx)? {
                true => Some(self.convert(value, ctx)?),
                false => None,
            },
            _ if value.is_null() => None,
            Action::Bean { target: bean_type, plan } => match value {
                Value::Bean(nested) => Some(copy_bean(nested.as_bean(), bean_type, plan, factory, ctx)?),
                _ => None,
            },
            Action::Sequence { kind, element } => match value {
                Value::Collection { items, .. } | Value::Array { items, .. } => {
                    let items = apply_all(items, element, factory, ctx)?;
                    Some(Value::collection(*kind, items))
                }
                _ => None,
            },
            Action::Map { kind, key, value: value_plan } => match value {
                Value::Map { entries, .. } => {
                    let mut copied = Vec::with_capacity(entries.len());
                    for (k, v) in entries {
                        copied.push((key.apply(k, factory, ctx)?, value_plan.apply(v, factory, ctx)?));
                    }
                    Some(Value::map(*kind, copied))
                }
                _ => None,
            },
            Action::Array { component, element } => match value {
                Value::Array { items, .. } | Value::Collection { items, .. } => {
                    let items = apply_all(items, element, factory, ctx)?;
                    Some(Value::array(component.clone(), items))
                }
                _ => None,
            },
        };

        match output {
            Some(value) => Ok(self.setter.write(target, value)?),
            None => {
                log::trace!("Skipped property '{}'", self.setter.name());
                Ok(())
            }
        }
    }

    fn convert(&self, value: Value, ctx: &CopyContext<'_>) -> Result<Value> {
        let converter = ctx
            .converter
            .ok_or_else(|| CopyError::IncompletePlan(format!("converter for '{}'", self.setter.name())))?;
        converter.convert(value, self.setter.declared_type(), &self.hint())
    }

    fn accepted(&self, value: &Value, target: &dyn Bean, ctx: &CopyContext<'_>) -> Result<bool> {
        let filter = ctx
            .filter
            .ok_or_else(|| CopyError::IncompletePlan(format!("filter for '{}'", self.setter.name())))?;
        let current = if self.setter.can_read() {
            self.setter.read(target)?
        } else {
            Value::Null
        };
        Ok(filter.accept(value, self.getter.name(), &current, self.setter.name()))
    }
}

fn apply_all(
    items: Vec<Value>,
    element: &ElementPlan,
    factory: &dyn InstanceFactory,
    ctx: &CopyContext<'_>,
) -> Result<Vec<Value>> {
    items
        .into_iter()
        .map(|item| element.apply(item, factory, ctx))
        .collect()
}

/// Build a fresh `target` bean and populate it from `source`
fn copy_bean(
    source: &dyn Bean,
    target: &BeanType,
    plan: &PlanRef,
    factory: &dyn InstanceFactory,
    ctx: &CopyContext<'_>,
) -> Result<Value> {
    let plan = plan.resolve(target)?;
    let mut instance = factory.new_instance(target)?;
    plan.execute(source, instance.as_mut(), factory, ctx)?;
    Ok(Value::Bean(BeanValue::from_box(instance)))
}

/// An ordered list of steps copying `source` beans into `target` beans
#[derive(Clone)]
pub struct CopyPlan {
    pub source: BeanType,
    pub target: BeanType,
    pub use_filter: bool,
    pub use_converter: bool,
    pub steps: Vec<Step>,
}

impl CopyPlan {
    /// Run every step in order. Properties written before a failing step
    /// stay written.
    pub fn execute(
        &self,
        source: &dyn Bean,
        target: &mut dyn Bean,
        factory: &dyn InstanceFactory,
        ctx: &CopyContext<'_>,
    ) -> Result<()> {
        for step in &self.steps {
            step.execute(source, target, factory, ctx)?;
        }
        Ok(())
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            source: self.source.to_string(),
            target: self.target.to_string(),
            use_filter: self.use_filter,
            use_converter: self.use_converter,
            steps: self
                .steps
                .iter()
                .map(|step| StepSummary {
                    source_property: step.getter.name().to_string(),
                    target_property: step.setter.name().to_string(),
                    action: step.action.name(),
                    target_type: step.setter.declared_type().to_string(),
                    elements: match &step.action {
                        Action::Sequence { element, .. } | Action::Array { element, .. } => {
                            vec![element.label()]
                        }
                        Action::Map { key, value, .. } => vec![key.label(), value.label()],
                        _ => Vec::new(),
                    },
                })
                .collect(),
        }
    }
}

/// Serializable description of a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub source: String,
    pub target: String,
    pub use_filter: bool,
    pub use_converter: bool,
    pub steps: Vec<StepSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSummary {
    pub source_property: String,
    pub target_property: String,
    pub action: &'static str,
    pub target_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<String>,
}
