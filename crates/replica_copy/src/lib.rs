//! # replica_copy - Compiled Bean Copying
//!
//! Copies property values between bean instances of possibly different
//! types:
//! - **Selectors** decide which properties are read and written
//! - **Compiler** turns a type pair into a reusable [`CopyPlan`]
//! - **Copiers** run a plan with optional per-call filters and converters
//! - **Engine** caches copiers and offers the convenience operations,
//!   including heuristic "smart" conversion
//!
//! ## Example
//!
//! ```ignore
//! let engine = CopyEngine::new(Arc::new(registry));
//! let copier = engine.builder(source_type, target_type).filter(true).build()?;
//! copier.copy(&source, &mut target, Some(&IgnoreNull), None)?;
//! ```

pub mod cache;
pub mod compiler;
pub mod config;
pub mod converter;
pub mod copier;
pub mod engine;
pub mod error;
pub mod extension;
pub mod filter;
pub mod options;
pub mod plan;
pub mod selector;
pub mod smart;

pub use cache::CopierCache;
pub use config::{CopyConfig, SelectorKind};
pub use converter::{Converter, Passthrough};
pub use copier::CompiledCopier;
pub use engine::{CopierBuilder, CopyEngine};
pub use error::{CopyError, Result};
pub use extension::{Extended, Property};
pub use filter::{Filter, FilterExt, IfAbsent, IgnoreNull, IgnoreProperties, OverrideFilter};
pub use options::{CopierKey, CopySpec, NameMapping};
pub use plan::{CopyPlan, PlanSummary, StepSummary};
pub use selector::{NonStandardSelector, PropertySelector, StandardSelector};
pub use smart::SmartConverter;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{CopyConfig, SelectorKind};
    pub use crate::converter::Converter;
    pub use crate::copier::CompiledCopier;
    pub use crate::engine::CopyEngine;
    pub use crate::error::{CopyError, Result};
    pub use crate::extension::{Extended, Property};
    pub use crate::filter::{Filter, FilterExt, IfAbsent, IgnoreNull, IgnoreProperties, OverrideFilter};
    pub use crate::options::{CopySpec, NameMapping};
    pub use crate::selector::PropertySelector;
    pub use crate::smart::SmartConverter;
    pub use replica_core::prelude::*;
}
