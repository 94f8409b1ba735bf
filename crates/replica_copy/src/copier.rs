//! Compiled copiers

use std::sync::Arc;

use replica_core::{Bean, TypeIntrospector, TypeRegistry};

use crate::converter::Converter;
use crate::error::{CopyError, Result};
use crate::filter::Filter;
use crate::plan::{CopyContext, CopyPlan, PlanSummary};

/// A reusable, immutable copy procedure for one source/target pair.
///
/// Holds no instance state; filters and converters are supplied per call
/// and must match the flags the copier was compiled with.
pub struct CompiledCopier {
    plan: Arc<CopyPlan>,
    registry: Arc<TypeRegistry>,
}

impl CompiledCopier {
    pub fn new(plan: Arc<CopyPlan>, registry: Arc<TypeRegistry>) -> Self {
        Self { plan, registry }
    }

    pub fn plan(&self) -> &Arc<CopyPlan> {
        &self.plan
    }

    /// Copy the selected properties of `source` into `target`.
    ///
    /// Both instances must be of the compiled types or their subclasses.
    /// A hook the copier was not compiled for is ignored.
    pub fn copy(
        &self,
        source: &dyn Bean,
        target: &mut dyn Bean,
        filter: Option<&dyn Filter>,
        converter: Option<&dyn Converter>,
    ) -> Result<()> {
        let found = source.bean_type();
        if !self.registry.is_subclass_of(&found, &self.plan.source) {
            return Err(CopyError::SourceTypeMismatch {
                expected: self.plan.source.clone(),
                found,
            });
        }
        let found = target.bean_type();
        if !self.registry.is_subclass_of(&found, &self.plan.target) {
            return Err(CopyError::TargetTypeMismatch {
                expected: self.plan.target.clone(),
                found,
            });
        }
        if self.plan.use_filter && filter.is_none() {
            return Err(CopyError::MissingFilter {
                source_type: self.plan.source.clone(),
                target_type: self.plan.target.clone(),
            });
        }
        if self.plan.use_converter && converter.is_none() {
            return Err(CopyError::MissingConverter {
                source_type: self.plan.source.clone(),
                target_type: self.plan.target.clone(),
            });
        }

        let ctx = CopyContext {
            filter: filter.filter(|_| self.plan.use_filter),
            converter: converter.filter(|_| self.plan.use_converter),
        };
        self.plan.execute(source, target, self.registry.as_ref(), &ctx)
    }

    /// [`copy`](Self::copy) returning the target for chaining
    pub fn copy_into<'t, T: Bean>(
        &self,
        source: &dyn Bean,
        target: &'t mut T,
        filter: Option<&dyn Filter>,
        converter: Option<&dyn Converter>,
    ) -> Result<&'t mut T> {
        self.copy(source, &mut *target, filter, converter)?;
        Ok(target)
    }

    pub fn describe(&self) -> PlanSummary {
        self.plan.summary()
    }
}

impl core::fmt::Debug for CompiledCopier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompiledCopier")
            .field("source", &self.plan.source)
            .field("target", &self.plan.target)
            .field("steps", &self.plan.steps.len())
            .finish()
    }
}
