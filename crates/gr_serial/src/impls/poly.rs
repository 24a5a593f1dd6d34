//! Dynamically typed payload slots.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use crate::context::{CopyContext, DeserializeContext, SerializeContext};
use crate::descriptor::{DelegateCodec, Describe, Layout, TypeDescriptor};
use crate::error::SerialError;
use crate::key::TypeKey;
use crate::payload::Payload;

/// A payload slot whose concrete type is only known at runtime.
///
/// A `Poly` field always serializes with a full type tag, so the reader can
/// reconstruct the value without any declared type in scope. The inner
/// type's descriptor must be registered on the deserializing side, or
/// decoding fails with an unknown type tag.
pub struct Poly(Box<dyn Payload>);

impl Poly {
    /// Wraps a concrete payload.
    #[inline]
    pub fn new(value: impl Payload) -> Self {
        Self(Box::new(value))
    }

    /// Wraps an already boxed payload.
    #[inline]
    pub fn from_box(value: Box<dyn Payload>) -> Self {
        Self(value)
    }

    /// Borrows the inner payload.
    #[inline]
    pub fn get(&self) -> &dyn Payload {
        self.0.as_ref()
    }

    /// Unwraps the inner payload.
    #[inline]
    pub fn into_inner(self) -> Box<dyn Payload> {
        self.0
    }
}

impl fmt::Debug for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Poly").field(&self.0).finish()
    }
}

impl Payload for Poly {
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

impl Describe for Poly {
    fn static_key() -> TypeKey {
        TypeKey::closed::<Self>("gr_serial::Poly", None)
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            Self::static_key(),
            Layout::Delegate(DelegateCodec { copy, write, read }),
        )
    }
}

fn downcast(value: &dyn Payload) -> &Poly {
    match value.downcast_ref::<Poly>() {
        Some(poly) => poly,
        None => panic!(
            "dynamic payload codec invoked on `{}`",
            value.type_key().path()
        ),
    }
}

fn copy(value: &dyn Payload, ctx: &mut CopyContext<'_>) -> Result<Box<dyn Payload>, SerialError> {
    let inner = ctx.copy(downcast(value).get())?;
    Ok(Box::new(Poly::from_box(inner)))
}

fn write(value: &dyn Payload, ctx: &mut SerializeContext<'_>) -> Result<(), SerialError> {
    // No expected type: the inner value always writes its tag.
    ctx.serialize(downcast(value).get(), None)
}

fn read(ctx: &mut DeserializeContext<'_>) -> Result<Box<dyn Payload>, SerialError> {
    let inner = ctx.deserialize(None)?;
    Ok(Box::new(Poly::from_box(inner)))
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::Poly;

    #[test]
    fn inner_payload_stays_downcastable() {
        let poly = Poly::new(String::from("grain"));
        assert_eq!(
            poly.get().downcast_ref::<String>().map(String::as_str),
            Some("grain")
        );
        assert!(poly.get().downcast_ref::<i32>().is_none());

        let inner = poly.into_inner();
        assert_eq!(inner.take::<String>().unwrap(), "grain");
    }
}
