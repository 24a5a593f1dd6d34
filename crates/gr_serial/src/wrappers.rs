//! Framework wrapper families.
//!
//! Distributed call plumbing wraps user payloads in a small set of generic
//! envelope types: task results, observer and observable notification
//! arguments, stream items and stream handles. Each wrapper family is a
//! generic definition; every closed instantiation shares the family path, so
//! one family-level registration (or the built-in synthesized strategy)
//! serves them all.

use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::any::Any;
use core::marker::PhantomData;

use crate::descriptor::{Describe, FieldDescriptor, Layout, TypeDescriptor};
use crate::key::TypeKey;
use crate::payload::Payload;
use crate::registry::SerializerRegistry;

// -----------------------------------------------------------------------------
// Family paths

/// Family path of [`TaskResult`].
pub const TASK_RESULT_FAMILY: &str = "gr_serial::wrappers::TaskResult";
/// Family path of [`ObserverArg`].
pub const OBSERVER_ARG_FAMILY: &str = "gr_serial::wrappers::ObserverArg";
/// Family path of [`ObservableArg`].
pub const OBSERVABLE_ARG_FAMILY: &str = "gr_serial::wrappers::ObservableArg";
/// Family path of [`StreamArg`].
pub const STREAM_ARG_FAMILY: &str = "gr_serial::wrappers::StreamArg";
/// Family path of [`StreamHandle`].
pub const STREAM_HANDLE_FAMILY: &str = "gr_serial::wrappers::StreamHandle";

/// Returns `true` if `family` names one of the built-in wrapper families.
pub fn is_wrapper_family(family: &str) -> bool {
    matches!(
        family,
        TASK_RESULT_FAMILY
            | OBSERVER_ARG_FAMILY
            | OBSERVABLE_ARG_FAMILY
            | STREAM_ARG_FAMILY
            | STREAM_HANDLE_FAMILY
    )
}

// -----------------------------------------------------------------------------
// Single-payload wrappers

macro_rules! payload_wrapper {
    ($(#[$meta:meta])* $name:ident, $family:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct $name<T> {
            value: T,
        }

        impl<T> $name<T> {
            /// Wraps a payload.
            #[inline]
            pub fn new(value: T) -> Self {
                Self { value }
            }

            /// Borrows the wrapped payload.
            #[inline]
            pub fn value(&self) -> &T {
                &self.value
            }

            /// Unwraps the payload.
            #[inline]
            pub fn into_inner(self) -> T {
                self.value
            }
        }

        impl<T: Describe> Payload for $name<T> {
            fn type_key(&self) -> TypeKey {
                <Self as Describe>::static_key()
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }

            fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
                self
            }
        }

        impl<T: Describe> Describe for $name<T> {
            fn static_key() -> TypeKey {
                TypeKey::closed::<Self>(
                    format!("{}<{}>", $family, T::static_key().path()),
                    Some($family),
                )
            }

            fn descriptor() -> TypeDescriptor {
                fn key_of<U: Describe>() -> TypeKey {
                    U::static_key()
                }

                fn get_value<U: Describe>(owner: &dyn Payload) -> &dyn Payload {
                    match owner.downcast_ref::<$name<U>>() {
                        Some(wrapper) => &wrapper.value,
                        None => panic!(
                            "`{}` field accessor invoked on `{}`",
                            $family,
                            owner.type_key().path()
                        ),
                    }
                }

                fn build<U: Describe>(mut values: Vec<Box<dyn Payload>>) -> Box<dyn Payload> {
                    let value = match values.pop() {
                        Some(value) if values.is_empty() => value,
                        _ => panic!("`{}` rebuilt from a wrong field count", $family),
                    };
                    match value.take::<U>() {
                        Ok(value) => Box::new($name::new(value)),
                        Err(other) => panic!(
                            "`{}` rebuilt from a value of type `{}`",
                            $family,
                            other.type_key().path()
                        ),
                    }
                }

                TypeDescriptor::new(
                    Self::static_key(),
                    Layout::Struct {
                        fields: vec![FieldDescriptor::new("value", key_of::<T>, get_value::<T>)],
                        build: build::<T>,
                    },
                )
            }

            fn register_dependencies(registry: &mut SerializerRegistry) {
                registry.register::<T>();
            }
        }
    };
}

payload_wrapper! {
    /// The result of a completed remote task, carried back to the caller.
    TaskResult, TASK_RESULT_FAMILY
}

payload_wrapper! {
    /// A notification argument delivered to a remote observer.
    ObserverArg, OBSERVER_ARG_FAMILY
}

payload_wrapper! {
    /// A notification argument published through an observable.
    ObservableArg, OBSERVABLE_ARG_FAMILY
}

payload_wrapper! {
    /// One item flowing through a typed stream.
    StreamArg, STREAM_ARG_FAMILY
}

// -----------------------------------------------------------------------------
// StreamHandle

/// A typed reference to a stream: identity and resume position, no payload.
///
/// The type parameter only pins the item type of the stream the handle
/// refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamHandle<T> {
    stream_id: u64,
    sequence: u64,
    marker: PhantomData<fn() -> T>,
}

impl<T> StreamHandle<T> {
    /// Creates a handle for a stream at a resume position.
    #[inline]
    pub fn new(stream_id: u64, sequence: u64) -> Self {
        Self {
            stream_id,
            sequence,
            marker: PhantomData,
        }
    }

    /// Returns the stream identity.
    #[inline]
    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    /// Returns the resume position.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl<T: Describe> Payload for StreamHandle<T> {
    fn type_key(&self) -> TypeKey {
        <Self as Describe>::static_key()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<T: Describe> Describe for StreamHandle<T> {
    fn static_key() -> TypeKey {
        TypeKey::closed::<Self>(
            format!("{}<{}>", STREAM_HANDLE_FAMILY, T::static_key().path()),
            Some(STREAM_HANDLE_FAMILY),
        )
    }

    fn descriptor() -> TypeDescriptor {
        fn u64_key() -> TypeKey {
            <u64 as Describe>::static_key()
        }

        fn get_stream_id<U: Describe>(owner: &dyn Payload) -> &dyn Payload {
            match owner.downcast_ref::<StreamHandle<U>>() {
                Some(handle) => &handle.stream_id,
                None => panic!(
                    "`{}` field accessor invoked on `{}`",
                    STREAM_HANDLE_FAMILY,
                    owner.type_key().path()
                ),
            }
        }

        fn get_sequence<U: Describe>(owner: &dyn Payload) -> &dyn Payload {
            match owner.downcast_ref::<StreamHandle<U>>() {
                Some(handle) => &handle.sequence,
                None => panic!(
                    "`{}` field accessor invoked on `{}`",
                    STREAM_HANDLE_FAMILY,
                    owner.type_key().path()
                ),
            }
        }

        fn build<U: Describe>(values: Vec<Box<dyn Payload>>) -> Box<dyn Payload> {
            let mut values = values.into_iter();
            let (Some(stream_id), Some(sequence), None) =
                (values.next(), values.next(), values.next())
            else {
                panic!("`{STREAM_HANDLE_FAMILY}` rebuilt from a wrong field count");
            };
            match (stream_id.take::<u64>(), sequence.take::<u64>()) {
                (Ok(stream_id), Ok(sequence)) => {
                    Box::new(StreamHandle::<U>::new(stream_id, sequence))
                }
                _ => panic!("`{STREAM_HANDLE_FAMILY}` rebuilt from mistyped fields"),
            }
        }

        TypeDescriptor::new(
            Self::static_key(),
            Layout::Struct {
                fields: vec![
                    FieldDescriptor::new("stream_id", u64_key, get_stream_id::<T>),
                    FieldDescriptor::new("sequence", u64_key, get_sequence::<T>),
                ],
                build: build::<T>,
            },
        )
    }

    fn register_dependencies(registry: &mut SerializerRegistry) {
        registry.register::<u64>();
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    #[test]
    fn closed_keys_carry_the_family_path() {
        let key = TypeKey::of::<TaskResult<String>>();
        assert_eq!(key.family(), Some(TASK_RESULT_FAMILY));
        assert!(key.path().starts_with(TASK_RESULT_FAMILY));
        assert!(key.is_closed());

        let other = TypeKey::of::<TaskResult<i32>>();
        assert_ne!(key, other);
        assert_eq!(key.family(), other.family());
    }

    #[test]
    fn wrapper_families_are_recognized() {
        assert!(is_wrapper_family(TASK_RESULT_FAMILY));
        assert!(is_wrapper_family(OBSERVER_ARG_FAMILY));
        assert!(is_wrapper_family(OBSERVABLE_ARG_FAMILY));
        assert!(is_wrapper_family(STREAM_ARG_FAMILY));
        assert!(is_wrapper_family(STREAM_HANDLE_FAMILY));
        assert!(!is_wrapper_family("gr_serial::wrappers::Unrelated"));
    }

    #[test]
    fn wrapper_descriptor_exposes_its_field() {
        let descriptor = <ObserverArg<i32> as Describe>::descriptor();
        let Layout::Struct { fields, build } = descriptor.layout() else {
            panic!("wrapper layout must be structural");
        };
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name(), "value");
        assert!(fields[0].key().same_type(&TypeKey::of::<i32>()));

        let wrapped = ObserverArg::new(7_i32);
        let field = fields[0].get(&wrapped);
        assert_eq!(field.downcast_ref::<i32>(), Some(&7));

        let rebuilt = build(vec![Box::new(7_i32)]);
        assert_eq!(
            rebuilt.take::<ObserverArg<i32>>().unwrap(),
            ObserverArg::new(7)
        );
    }

    #[test]
    fn stream_handle_decomposes_into_identity_and_position() {
        let descriptor = <StreamHandle<String> as Describe>::descriptor();
        let Layout::Struct { fields, build } = descriptor.layout() else {
            panic!("stream handle layout must be structural");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name(), "stream_id");
        assert_eq!(fields[1].name(), "sequence");

        let rebuilt = build(vec![Box::new(11_u64), Box::new(42_u64)]);
        let handle = rebuilt.take::<StreamHandle<String>>().unwrap();
        assert_eq!(handle.stream_id(), 11);
        assert_eq!(handle.sequence(), 42);
    }
}
