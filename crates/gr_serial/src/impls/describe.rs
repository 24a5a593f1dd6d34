//! The `describe_struct!` macro.

/// Implements [`Payload`](crate::Payload) and [`Describe`](crate::Describe)
/// for a plain named-field struct.
///
/// The listed fields become the struct's declared layout, in order; every
/// field type must implement [`Describe`](crate::Describe) itself. The
/// fallback synthesizer uses the layout to copy, serialize and deserialize
/// the struct field by field whenever no custom strategy is registered.
///
/// # Examples
///
/// ```
/// use gr_serial::Serializer;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct GrainPing {
///     sender: String,
///     sequence: u64,
/// }
///
/// gr_serial::describe_struct!(GrainPing {
///     sender: String,
///     sequence: u64,
/// });
///
/// let engine = Serializer::new();
/// let ping = GrainPing { sender: "silo-1".into(), sequence: 9 };
/// assert_eq!(engine.round_trip(&ping)?, ping);
/// # Ok::<(), gr_serial::SerialError>(())
/// ```
#[macro_export]
macro_rules! describe_struct {
    ($name:ident { $($field:ident : $fty:ty),+ $(,)? }) => {
        impl $crate::Payload for $name {
            fn type_key(&self) -> $crate::TypeKey {
                <Self as $crate::Describe>::static_key()
            }

            fn as_any(&self) -> &dyn $crate::__macro_exports::Any {
                self
            }

            fn into_any(
                self: $crate::__macro_exports::Box<Self>,
            ) -> $crate::__macro_exports::Box<dyn $crate::__macro_exports::Any> {
                self
            }

            fn into_any_arc(
                self: $crate::__macro_exports::Arc<Self>,
            ) -> $crate::__macro_exports::Arc<dyn $crate::__macro_exports::Any + Send + Sync> {
                self
            }
        }

        impl $crate::Describe for $name {
            fn static_key() -> $crate::TypeKey {
                $crate::TypeKey::closed::<Self>(
                    ::core::concat!(::core::module_path!(), "::", ::core::stringify!($name)),
                    ::core::option::Option::None,
                )
            }

            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::new(
                    Self::static_key(),
                    $crate::Layout::Struct {
                        fields: $crate::__macro_exports::Vec::from([$(
                            $crate::FieldDescriptor::new(
                                ::core::stringify!($field),
                                <$fty as $crate::Describe>::static_key,
                                {
                                    fn get(owner: &dyn $crate::Payload) -> &dyn $crate::Payload {
                                        match owner.downcast_ref::<$name>() {
                                            ::core::option::Option::Some(owner) => &owner.$field,
                                            ::core::option::Option::None => ::core::panic!(
                                                "field accessor of `{}` invoked on `{}`",
                                                ::core::stringify!($name),
                                                $crate::Payload::type_key(owner).path()
                                            ),
                                        }
                                    }
                                    get
                                },
                            )
                        ),+]),
                        build: {
                            fn build(
                                values: $crate::__macro_exports::Vec<
                                    $crate::__macro_exports::Box<dyn $crate::Payload>,
                                >,
                            ) -> $crate::__macro_exports::Box<dyn $crate::Payload> {
                                let mut values = values.into_iter();
                                let built = $name {
                                    $($field: {
                                        let value = match values.next() {
                                            ::core::option::Option::Some(value) => value,
                                            ::core::option::Option::None => ::core::panic!(
                                                "`{}` rebuilt from a wrong field count",
                                                ::core::stringify!($name)
                                            ),
                                        };
                                        match value.take::<$fty>() {
                                            ::core::result::Result::Ok(value) => value,
                                            ::core::result::Result::Err(other) => ::core::panic!(
                                                "field `{}` of `{}` rebuilt from a `{}`",
                                                ::core::stringify!($field),
                                                ::core::stringify!($name),
                                                $crate::Payload::type_key(&*other).path()
                                            ),
                                        }
                                    }),+
                                };
                                if values.next().is_some() {
                                    ::core::panic!(
                                        "`{}` rebuilt from a wrong field count",
                                        ::core::stringify!($name)
                                    );
                                }
                                $crate::__macro_exports::Box::new(built)
                            }
                            build
                        },
                    },
                )
            }

            fn register_dependencies(registry: &mut $crate::SerializerRegistry) {
                $(registry.register::<$fty>();)+
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec;

    use crate::descriptor::{Describe, Layout};
    use crate::key::TypeKey;
    use crate::payload::Payload;

    #[derive(Clone, Debug, PartialEq)]
    struct Ping {
        sender: String,
        sequence: u64,
    }
    crate::describe_struct!(Ping {
        sender: String,
        sequence: u64,
    });

    #[test]
    fn layout_lists_fields_in_declaration_order() {
        let descriptor = Ping::descriptor();
        let Layout::Struct { fields, .. } = descriptor.layout() else {
            panic!("struct layout expected");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name(), "sender");
        assert_eq!(fields[1].name(), "sequence");
        assert!(fields[0].key().same_type(&TypeKey::of::<String>()));
        assert!(fields[1].key().same_type(&TypeKey::of::<u64>()));
    }

    #[test]
    fn accessors_and_build_are_inverses() {
        let descriptor = Ping::descriptor();
        let Layout::Struct { fields, build } = descriptor.layout() else {
            panic!("struct layout expected");
        };

        let ping = Ping {
            sender: String::from("silo-1"),
            sequence: 9,
        };
        let values: vec::Vec<Box<dyn Payload>> = fields
            .iter()
            .map(|field| match field.get(&ping).primitive_clone() {
                Some(value) => value,
                None => panic!("primitive field expected"),
            })
            .collect();

        let rebuilt = build(values);
        assert_eq!(rebuilt.take::<Ping>().unwrap(), ping);
    }

    #[test]
    fn key_path_includes_the_module() {
        let key = Ping::static_key();
        assert!(key.path().ends_with("::Ping"));
        assert!(key.is_closed());
    }
}
