//! Aliased shared references.

use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;
use core::ops::Deref;

use crate::context::{CopyContext, DeserializeContext, SerializeContext};
use crate::descriptor::{DelegateCodec, Describe, Layout, TypeDescriptor};
use crate::error::SerialError;
use crate::key::TypeKey;
use crate::payload::Payload;
use crate::registry::SerializerRegistry;

/// Family path of [`Shared`].
pub const SHARED_FAMILY: &str = "gr_serial::Shared";

/// A shared, immutable reference to a payload, with aliasing preserved
/// through deep copy.
///
/// When one allocation is reachable through several `Shared` handles inside
/// a copied graph, the copy contains one new allocation reachable through
/// the same number of handles: the copy of the graph aliases exactly where
/// the source did. Serialization has no such identity: each handle writes
/// its target value, and deserialization produces independent allocations.
pub struct Shared<T>(Arc<T>);

impl<T> Shared<T> {
    /// Wraps a value into a fresh shared allocation.
    #[inline]
    pub fn new(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrows the shared value.
    #[inline]
    pub fn get(&self) -> &T {
        &self.0
    }

    /// Returns `true` if both handles point at the same allocation.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl<T> Clone for Shared<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&self.0).finish()
    }
}

impl<T: PartialEq> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || *self.0 == *other.0
    }
}

impl<T: Eq> Eq for Shared<T> {}

impl<T: Describe> Payload for Shared<T> {
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

impl<T: Describe> Describe for Shared<T> {
    fn static_key() -> TypeKey {
        TypeKey::closed::<Self>(
            format!("{}<{}>", SHARED_FAMILY, T::static_key().path()),
            Some(SHARED_FAMILY),
        )
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            Self::static_key(),
            Layout::Delegate(DelegateCodec {
                copy: copy::<T>,
                write: write::<T>,
                read: read::<T>,
            }),
        )
    }

    fn register_dependencies(registry: &mut SerializerRegistry) {
        registry.register::<T>();
    }
}

fn downcast<T: Describe>(value: &dyn Payload) -> &Shared<T> {
    match value.downcast_ref::<Shared<T>>() {
        Some(shared) => shared,
        None => panic!(
            "shared reference codec invoked on `{}`",
            value.type_key().path()
        ),
    }
}

fn copy<T: Describe>(
    value: &dyn Payload,
    ctx: &mut CopyContext<'_>,
) -> Result<Box<dyn Payload>, SerialError> {
    let shared = downcast::<T>(value);
    let source = Arc::as_ptr(&shared.0) as usize;

    // Second encounter of the same allocation within this copy: alias the
    // copy already produced instead of copying again.
    if let Some(existing) = ctx.tracked(source) {
        return match existing.into_any_arc().downcast::<T>() {
            Ok(inner) => Ok(Box::new(Shared(inner))),
            Err(_) => panic!(
                "copy tracked for `{}` has a different type",
                T::static_key().path()
            ),
        };
    }

    let inner = ctx.copy(&*shared.0)?;
    let inner = match inner.take::<T>() {
        Ok(inner) => Arc::new(inner),
        Err(other) => panic!(
            "copy of `{}` produced a value of type `{}`",
            T::static_key().path(),
            other.type_key().path()
        ),
    };
    ctx.track(source, Arc::clone(&inner) as Arc<dyn Payload>);
    Ok(Box::new(Shared(inner)))
}

fn write<T: Describe>(
    value: &dyn Payload,
    ctx: &mut SerializeContext<'_>,
) -> Result<(), SerialError> {
    let shared = downcast::<T>(value);
    ctx.serialize(&*shared.0, Some(&T::static_key()))
}

fn read<T: Describe>(ctx: &mut DeserializeContext<'_>) -> Result<Box<dyn Payload>, SerialError> {
    let inner = ctx.deserialize(Some(&T::static_key()))?;
    match inner.take::<T>() {
        Ok(inner) => Ok(Box::new(Shared::new(inner))),
        Err(other) => panic!(
            "deserialization of `{}` produced a value of type `{}`",
            T::static_key().path(),
            other.type_key().path()
        ),
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::{SHARED_FAMILY, Shared};
    use crate::key::TypeKey;

    #[test]
    fn handles_share_one_allocation() {
        let a = Shared::new(String::from("grain"));
        let b = a.clone();
        assert!(Shared::ptr_eq(&a, &b));
        assert_eq!(a.as_str(), "grain");

        let c = Shared::new(String::from("grain"));
        assert!(!Shared::ptr_eq(&a, &c));
        assert_eq!(a, c);
    }

    #[test]
    fn key_carries_the_shared_family() {
        let key = TypeKey::of::<Shared<String>>();
        assert_eq!(key.family(), Some(SHARED_FAMILY));
        assert_ne!(key, TypeKey::of::<Shared<i32>>());
    }
}
