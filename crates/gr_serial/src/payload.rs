use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use crate::key::TypeKey;

// -----------------------------------------------------------------------------
// Payload

/// The object trait of the serialization layer.
///
/// Every value that flows through the dispatch engine, whether a whole grain
/// message or a single nested field, is handled as a `dyn Payload`. The trait
/// only exposes identity and casting; structure comes from the type's
/// [`Describe`](crate::Describe) implementation, and behavior from the
/// strategy resolved through the registry.
///
/// Note that [`Any::type_id`] on a `Box<dyn Payload>` returns the container's
/// type ID; use [`Payload::type_key`] for the inner value's identity.
pub trait Payload: Any + Send + Sync {
    /// Returns the canonical [`TypeKey`] of this value's concrete type.
    fn type_key(&self) -> TypeKey;

    /// Casts to [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Consumes the box, casting to [`Any`].
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Converts a shared handle, casting to [`Any`].
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// For value-semantics primitives, returns a boxed clone.
    ///
    /// The dispatch engine copies such values directly, with no strategy
    /// lookup. Composite types return `None`.
    #[inline]
    fn primitive_clone(&self) -> Option<Box<dyn Payload>> {
        None
    }
}

// -----------------------------------------------------------------------------
// dyn Payload

impl dyn Payload {
    /// Returns `true` if the underlying value is of type `T`.
    #[inline]
    pub fn is<T: Payload>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcasts to a concrete type by reference.
    #[inline]
    pub fn downcast_ref<T: Payload>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Takes the concrete value out of the box, returning the original box
    /// unchanged if the type does not match.
    pub fn take<T: Payload>(self: Box<Self>) -> Result<T, Box<dyn Payload>> {
        if self.is::<T>() {
            match self.into_any().downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(_) => unreachable!(),
            }
        } else {
            Err(self)
        }
    }
}

impl core::fmt::Debug for dyn Payload {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Payload({})", self.type_key())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use super::Payload;

    #[test]
    fn take_preserves_the_box_on_mismatch() {
        let boxed: Box<dyn Payload> = Box::new(5_i32);
        let boxed = boxed.take::<u32>().unwrap_err();
        assert_eq!(boxed.take::<i32>().unwrap(), 5);
    }

    #[test]
    fn downcast_ref_checks_inner_type() {
        let boxed: Box<dyn Payload> = Box::new(String::from("grain"));
        assert!(boxed.is::<String>());
        assert_eq!(
            boxed.downcast_ref::<String>().map(String::as_str),
            Some("grain")
        );
        assert!(boxed.downcast_ref::<i32>().is_none());
    }
}
