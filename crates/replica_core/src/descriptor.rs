//! Property and method descriptors
//!
//! A [`BeanClass`] is the runtime description of a bean type: its parent,
//! its declared properties (with optional read/write capability) and its
//! declared methods. The registry answers introspection queries from
//! these descriptors.

use core::fmt;
use std::sync::Arc;

use crate::bean::{downcast_bean, downcast_bean_mut, Bean, DynamicBean};
use crate::error::{CoreError, Result};
use crate::types::{BeanType, TypeRef};
use crate::value::Value;

/// Reads a property from a bean
pub type Reader = Arc<dyn Fn(&dyn Bean) -> Result<Value> + Send + Sync>;

/// Writes a property on a bean
pub type Writer = Arc<dyn Fn(&mut dyn Bean, Value) -> Result<()> + Send + Sync>;

/// Builds a fresh instance with default property values
pub type Constructor = Arc<dyn Fn() -> Box<dyn Bean> + Send + Sync>;

/// A named, typed property slot
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    declared_type: TypeRef,
    reader: Option<Reader>,
    writer: Option<Writer>,
    write_method: Option<String>,
}

impl PropertyDescriptor {
    /// Create a descriptor with no access capability
    pub fn new(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            declared_type,
            reader: None,
            writer: None,
            write_method: None,
        }
    }

    /// Copy with read capability
    pub fn with_reader(mut self, reader: Reader) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Copy with write capability through the named mutator
    pub fn with_writer(mut self, writer: Writer, method: impl Into<String>) -> Self {
        self.writer = Some(writer);
        self.write_method = Some(method.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> &TypeRef {
        &self.declared_type
    }

    pub fn can_read(&self) -> bool {
        self.reader.is_some()
    }

    pub fn can_write(&self) -> bool {
        self.writer.is_some()
    }

    pub fn reader(&self) -> Option<&Reader> {
        self.reader.as_ref()
    }

    pub fn writer(&self) -> Option<&Writer> {
        self.writer.as_ref()
    }

    /// Name of the mutator backing the write capability
    pub fn write_method(&self) -> Option<&str> {
        self.write_method.as_deref()
    }

    /// Read the property from `bean`
    pub fn read(&self, bean: &dyn Bean) -> Result<Value> {
        match &self.reader {
            Some(reader) => reader(bean),
            None => Err(CoreError::PropertyNotReadable {
                type_name: bean.bean_type().name().to_string(),
                property: self.name.clone(),
            }),
        }
    }

    /// Write the property on `bean`
    pub fn write(&self, bean: &mut dyn Bean, value: Value) -> Result<()> {
        match &self.writer {
            Some(writer) => writer(bean, value),
            None => Err(CoreError::PropertyNotWritable {
                type_name: bean.bean_type().name().to_string(),
                property: self.name.clone(),
            }),
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("can_read", &self.can_read())
            .field("can_write", &self.can_write())
            .field("write_method", &self.write_method)
            .finish()
    }
}

/// Declared return type of a method
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnType {
    Void,
    /// Returns the declaring type (fluent style)
    SelfType,
    Type(TypeRef),
}

/// A declared method
#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<TypeRef>,
    pub returns: ReturnType,
    /// Invokes a single-argument method
    pub invoker: Option<Writer>,
}

impl MethodDescriptor {
    /// Single-argument method with an invoker
    pub fn unary(name: impl Into<String>, param: TypeRef, returns: ReturnType, invoker: Writer) -> Self {
        Self {
            name: name.into(),
            params: vec![param],
            returns,
            invoker: Some(invoker),
        }
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish()
    }
}

/// Runtime description of a bean type
#[derive(Clone)]
pub struct BeanClass {
    pub bean_type: BeanType,
    pub parent: Option<BeanType>,
    pub is_abstract: bool,
    pub properties: Vec<PropertyDescriptor>,
    pub methods: Vec<MethodDescriptor>,
    pub constructor: Option<Constructor>,
}

impl BeanClass {
    /// Start describing a class
    pub fn builder(bean_type: BeanType) -> BeanClassBuilder {
        BeanClassBuilder {
            class: BeanClass {
                bean_type,
                parent: None,
                is_abstract: false,
                properties: Vec::new(),
                methods: Vec::new(),
                constructor: None,
            },
        }
    }

    /// Start describing a map-backed class defined at runtime
    pub fn dynamic(name: impl Into<Arc<str>>) -> DynamicClassBuilder {
        let bean_type = BeanType::named(name);
        let ctor_type = bean_type.clone();
        DynamicClassBuilder {
            builder: BeanClass::builder(bean_type).constructor(Arc::new(move || {
                Box::new(DynamicBean::new(ctor_type.clone())) as Box<dyn Bean>
            })),
        }
    }

    /// The universal root class
    pub fn root() -> Self {
        BeanClass::builder(BeanType::root()).build()
    }

    /// Declared property by name
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name() == name)
    }
}

impl fmt::Debug for BeanClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanClass")
            .field("bean_type", &self.bean_type)
            .field("parent", &self.parent)
            .field("is_abstract", &self.is_abstract)
            .field("properties", &self.properties)
            .field("methods", &self.methods)
            .field("constructible", &self.constructor.is_some())
            .finish()
    }
}

/// Builder for [`BeanClass`]
pub struct BeanClassBuilder {
    class: BeanClass,
}

impl BeanClassBuilder {
    pub fn extends(mut self, parent: BeanType) -> Self {
        self.class.parent = Some(parent);
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.class.is_abstract = true;
        self
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.class.properties.push(property);
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.class.methods.push(method);
        self
    }

    pub fn constructor(mut self, constructor: Constructor) -> Self {
        self.class.constructor = Some(constructor);
        self
    }

    pub fn build(self) -> BeanClass {
        self.class
    }
}

/// Builder for map-backed classes
pub struct DynamicClassBuilder {
    builder: BeanClassBuilder,
}

impl DynamicClassBuilder {
    /// Readable and writable property with a conventional `set_<name>`
    pub fn property(mut self, name: &str, declared_type: TypeRef) -> Self {
        let writer = map_writer(name, declared_type.clone());
        let descriptor = PropertyDescriptor::new(name, declared_type.clone())
            .with_reader(map_reader(name, declared_type.clone()))
            .with_writer(writer.clone(), setter_name(name));
        let method = MethodDescriptor::unary(setter_name(name), declared_type, ReturnType::Void, writer);
        self.builder = self.builder.property(descriptor).method(method);
        self
    }

    /// Property with a getter only
    pub fn read_only(mut self, name: &str, declared_type: TypeRef) -> Self {
        let descriptor = PropertyDescriptor::new(name, declared_type.clone())
            .with_reader(map_reader(name, declared_type));
        self.builder = self.builder.property(descriptor);
        self
    }

    /// Property with a setter only
    pub fn write_only(mut self, name: &str, declared_type: TypeRef) -> Self {
        let writer = map_writer(name, declared_type.clone());
        let descriptor = PropertyDescriptor::new(name, declared_type.clone()).with_writer(writer.clone(), setter_name(name));
        let method = MethodDescriptor::unary(setter_name(name), declared_type, ReturnType::Void, writer);
        self.builder = self.builder.property(descriptor).method(method);
        self
    }

    /// Getter plus a self-returning `set_<name>` method that is not a
    /// conventional setter
    pub fn fluent_setter(mut self, name: &str, declared_type: TypeRef) -> Self {
        let descriptor = PropertyDescriptor::new(name, declared_type.clone())
            .with_reader(map_reader(name, declared_type.clone()));
        let method = MethodDescriptor::unary(
            setter_name(name),
            declared_type.clone(),
            ReturnType::SelfType,
            map_writer(name, declared_type),
        );
        self.builder = self.builder.property(descriptor).method(method);
        self
    }

    /// Declared method only, with no backing property
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.builder = self.builder.method(method);
        self
    }

    pub fn extends(mut self, parent: BeanType) -> Self {
        self.builder = self.builder.extends(parent);
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.builder = self.builder.abstract_class();
        self
    }

    pub fn build(self) -> BeanClass {
        self.builder.build()
    }
}

fn setter_name(property: &str) -> String {
    format!("set_{}", property)
}

fn map_reader(name: &str, declared_type: TypeRef) -> Reader {
    let name = name.to_string();
    Arc::new(move |bean: &dyn Bean| -> Result<Value> {
        let bean = downcast_bean::<DynamicBean>(bean)?;
        Ok(bean
            .get(&name)
            .cloned()
            .unwrap_or_else(|| declared_type.default_value()))
    })
}

fn map_writer(name: &str, declared_type: TypeRef) -> Writer {
    let name = name.to_string();
    Arc::new(move |bean: &mut dyn Bean, value: Value| -> Result<()> {
        let value = if value.is_null() {
            declared_type.default_value()
        } else {
            value
        };
        let storable = matches!(value, Value::Bean(_)) || declared_type.accepts_value(&value);
        if !storable {
            return Err(CoreError::type_mismatch(declared_type.to_string(), value.type_name()));
        }
        downcast_bean_mut::<DynamicBean>(bean)?.set(name.clone(), value);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;

    #[test]
    fn test_dynamic_class_access() {
        let class = BeanClass::dynamic("Account")
            .property("id", TypeRef::primitive(ScalarKind::Long))
            .read_only("created", TypeRef::String)
            .build();
        let ctor = class.constructor.clone().unwrap();
        let mut bean = ctor();

        let id = class.property("id").unwrap();
        assert_eq!(id.read(bean.as_ref()).unwrap(), Value::Long(0));
        id.write(bean.as_mut(), Value::Long(42)).unwrap();
        assert_eq!(id.read(bean.as_ref()).unwrap(), Value::Long(42));
        assert_eq!(id.write_method(), Some("set_id"));

        let created = class.property("created").unwrap();
        assert!(created.can_read());
        assert!(matches!(
            created.write(bean.as_mut(), Value::from("x")),
            Err(CoreError::PropertyNotWritable { .. })
        ));
    }

    #[test]
    fn test_dynamic_writer_checks_type() {
        let class = BeanClass::dynamic("Account")
            .property("id", TypeRef::primitive(ScalarKind::Long))
            .build();
        let mut bean = (class.constructor.clone().unwrap())();
        let id = class.property("id").unwrap();

        assert!(matches!(
            id.write(bean.as_mut(), Value::from("nope")),
            Err(CoreError::TypeMismatch { .. })
        ));
        id.write(bean.as_mut(), Value::Null).unwrap();
        assert_eq!(id.read(bean.as_ref()).unwrap(), Value::Long(0));
    }

    #[test]
    fn test_fluent_setter_is_method_only() {
        let class = BeanClass::dynamic("Fluent")
            .fluent_setter("name", TypeRef::String)
            .build();
        let name = class.property("name").unwrap();
        assert!(name.can_read());
        assert!(!name.can_write());
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].returns, ReturnType::SelfType);
    }
}
