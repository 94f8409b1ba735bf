//! Declarative bean definitions

/// Declare a struct as a bean.
///
/// Every field becomes a readable and writable property plus a declared
/// `set_<field>` method. Field types must implement [`Reflect`](crate::Reflect);
/// the struct must derive `Clone` and `Default`.
///
/// ```
/// replica_core::bean! {
///     #[derive(Debug, Clone, Default, PartialEq)]
///     pub struct Point {
///         pub x: i32,
///         pub y: i32,
///     }
/// }
/// ```
#[macro_export]
macro_rules! bean {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($(#[$fmeta])* $fvis $field: $fty),*
        }

        impl $crate::Bean for $name {
            fn bean_type(&self) -> $crate::BeanType {
                <Self as $crate::BeanDescribe>::class_type()
            }

            fn snapshot(&self) -> ::std::vec::Vec<(::std::string::String, $crate::Value)> {
                #[allow(unused_mut)]
                let mut fields: ::std::vec::Vec<(::std::string::String, $crate::Value)> = ::std::vec![
                    $((::std::string::String::from(stringify!($field)), $crate::Reflect::to_value(&self.$field))),*
                ];
                fields.sort_by(|a, b| a.0.cmp(&b.0));
                fields
            }

            fn clone_bean(&self) -> ::std::boxed::Box<dyn $crate::Bean> {
                ::std::boxed::Box::new(::core::clone::Clone::clone(self))
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::core::any::Any> {
                self
            }
        }

        impl $crate::BeanDescribe for $name {
            fn describe() -> $crate::BeanClass {
                #[allow(unused_mut)]
                let mut builder = $crate::BeanClass::builder(<Self as $crate::BeanDescribe>::class_type())
                    .constructor(::std::sync::Arc::new(|| {
                        ::std::boxed::Box::new(<Self as ::core::default::Default>::default())
                            as ::std::boxed::Box<dyn $crate::Bean>
                    }));
                $(
                    let reader: $crate::Reader = ::std::sync::Arc::new(
                        |bean: &dyn $crate::Bean| -> $crate::Result<$crate::Value> {
                            let this = $crate::downcast_bean::<Self>(bean)?;
                            Ok($crate::Reflect::to_value(&this.$field))
                        },
                    );
                    let writer: $crate::Writer = ::std::sync::Arc::new(
                        |bean: &mut dyn $crate::Bean, value: $crate::Value| -> $crate::Result<()> {
                            let this = $crate::downcast_bean_mut::<Self>(bean)?;
                            this.$field = <$fty as $crate::Reflect>::from_value(value)?;
                            Ok(())
                        },
                    );
                    builder = builder
                        .property(
                            $crate::PropertyDescriptor::new(
                                stringify!($field),
                                <$fty as $crate::Reflect>::type_ref(),
                            )
                            .with_reader(reader)
                            .with_writer(writer.clone(), concat!("set_", stringify!($field))),
                        )
                        .method($crate::MethodDescriptor::unary(
                            concat!("set_", stringify!($field)),
                            <$fty as $crate::Reflect>::type_ref(),
                            $crate::ReturnType::Void,
                            writer,
                        ));
                )*
                builder.build()
            }

            fn register_dependencies(_registry: &$crate::TypeRegistry) -> $crate::Result<()> {
                $(<$fty as $crate::Reflect>::register_types(_registry)?;)*
                Ok(())
            }
        }

        impl $crate::Reflect for $name {
            fn type_ref() -> $crate::TypeRef {
                $crate::TypeRef::Bean(<Self as $crate::BeanDescribe>::class_type())
            }

            fn to_value(&self) -> $crate::Value {
                $crate::Value::bean(::core::clone::Clone::clone(self))
            }

            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                match value {
                    $crate::Value::Null => Ok(<Self as ::core::default::Default>::default()),
                    $crate::Value::Bean(bean) => bean.downcast::<Self>().map_err(|found| {
                        $crate::CoreError::type_mismatch(stringify!($name), found.name())
                    }),
                    other => Err($crate::CoreError::type_mismatch(stringify!($name), other.type_name())),
                }
            }

            fn register_types(registry: &$crate::TypeRegistry) -> $crate::Result<()> {
                registry.register::<Self>().map(|_| ())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{Bean, BeanDescribe, InstanceFactory, Reflect, TypeIntrospector, TypeRegistry, TypeRef, Value};

    crate::bean! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Leaf {
            value: i32,
        }
    }

    crate::bean! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Node {
            name: String,
            leaf: Option<Leaf>,
            next: Option<Box<Node>>,
        }
    }

    #[test]
    fn test_macro_describes_fields() {
        let class = Node::describe();
        let names: Vec<_> = class.properties.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["name", "leaf", "next"]);
        assert_eq!(class.methods[0].name, "set_name");
        assert_eq!(
            class.property("leaf").unwrap().declared_type(),
            &TypeRef::Bean(Leaf::class_type())
        );
    }

    #[test]
    fn test_registration_follows_fields() {
        let registry = TypeRegistry::new();
        registry.register::<Node>().unwrap();
        assert!(registry.contains(&Leaf::class_type()));
        assert!(registry.contains(&Node::class_type()));
    }

    #[test]
    fn test_property_access_through_descriptors() {
        let registry = TypeRegistry::new();
        registry.register::<Node>().unwrap();
        let mut node = registry.new_instance(&Node::class_type()).unwrap();

        let setters = registry.writable_properties(&Node::class_type()).unwrap();
        let leaf = setters.iter().find(|p| p.name() == "leaf").unwrap();
        leaf.write(node.as_mut(), Leaf { value: 3 }.to_value()).unwrap();

        let node = node.downcast_ref::<Node>().unwrap();
        assert_eq!(node.leaf, Some(Leaf { value: 3 }));
        assert_eq!(
            node.snapshot()[0],
            ("leaf".to_string(), Value::bean(Leaf { value: 3 }))
        );
    }
}
