//! # replica_core - Bean Type Model
//!
//! Core primitives shared by the copy engine:
//! - **Types**: declared type references and bean identities
//! - **Values**: owned, dynamically typed property values
//! - **Beans**: the object-safe [`Bean`] trait, class descriptors and the
//!   [`TypeRegistry`] that introspects and constructs them
//!
//! Compile-time beans are declared with [`bean!`]; runtime-defined ones
//! are described with [`BeanClass::dynamic`].

pub mod bean;
pub mod descriptor;
pub mod error;
pub mod macros;
pub mod reflect;
pub mod registry;
pub mod temporal;
pub mod types;
pub mod value;

pub use bean::*;
pub use descriptor::*;
pub use error::*;
pub use reflect::*;
pub use registry::*;
pub use types::*;
pub use value::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::bean::{Bean, BeanDescribe, DynamicBean};
    pub use crate::descriptor::{BeanClass, MethodDescriptor, PropertyDescriptor, ReturnType};
    pub use crate::error::{CoreError, Result};
    pub use crate::reflect::Reflect;
    pub use crate::registry::{InstanceFactory, TypeIntrospector, TypeRegistry};
    pub use crate::types::{BeanType, CollectionKind, MapKind, ScalarKind, TemporalKind, TypeRef};
    pub use crate::value::{BeanValue, Value};
}
