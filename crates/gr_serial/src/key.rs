use alloc::borrow::Cow;
use core::any::TypeId;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::descriptor::Describe;
use crate::error::SerialError;

// -----------------------------------------------------------------------------
// TypeKey

/// Canonical lookup identity of a payload type.
///
/// A *closed* key identifies one concrete runtime type: it carries the
/// [`TypeId`], the type path used for wire discriminators, and, for generic
/// instantiations, the path of the generic definition ("family") shared by
/// every instantiation.
///
/// A *definition* key carries only the family path. It matches any closed key
/// of the same family during registry lookup, but it is not a concrete type:
/// dispatching on one fails with [`SerialError::InvalidType`].
///
/// Two closed keys are equal iff they denote the identical closed type.
///
/// # Examples
///
/// ```
/// use gr_serial::TypeKey;
/// use gr_serial::wrappers::{TaskResult, TASK_RESULT_FAMILY};
///
/// let closed = TypeKey::of::<TaskResult<i32>>();
/// assert_eq!(closed.family(), Some(TASK_RESULT_FAMILY));
///
/// let definition = TypeKey::definition(TASK_RESULT_FAMILY);
/// assert!(definition.type_id().is_none());
/// ```
#[derive(Clone, Debug)]
pub struct TypeKey {
    kind: KeyKind,
}

#[derive(Clone, Debug)]
enum KeyKind {
    Closed {
        id: TypeId,
        path: Cow<'static, str>,
        family: Option<&'static str>,
    },
    Definition { family: &'static str },
}

impl TypeKey {
    /// Returns the key of a [`Describe`] type.
    #[inline]
    pub fn of<T: Describe>() -> Self {
        T::static_key()
    }

    /// Creates a closed key for the concrete type `T`.
    #[inline]
    pub fn closed<T: 'static>(
        path: impl Into<Cow<'static, str>>,
        family: Option<&'static str>,
    ) -> Self {
        Self {
            kind: KeyKind::Closed {
                id: TypeId::of::<T>(),
                path: path.into(),
                family,
            },
        }
    }

    /// Creates a definition-only key for a generic family.
    #[inline]
    pub const fn definition(family: &'static str) -> Self {
        Self {
            kind: KeyKind::Definition { family },
        }
    }

    /// Returns the [`TypeId`] of a closed key, or `None` for a
    /// definition-only key.
    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        match &self.kind {
            KeyKind::Closed { id, .. } => Some(*id),
            KeyKind::Definition { .. } => None,
        }
    }

    /// Returns the [`TypeId`], failing with [`SerialError::InvalidType`]
    /// for a definition-only key.
    pub fn id(&self) -> Result<TypeId, SerialError> {
        self.type_id().ok_or_else(|| SerialError::InvalidType {
            path: self.path().to_owned().into(),
        })
    }

    /// Returns the type path of a closed key, or the family path of a
    /// definition key.
    #[inline]
    pub fn path(&self) -> &str {
        match &self.kind {
            KeyKind::Closed { path, .. } => path,
            KeyKind::Definition { family } => family,
        }
    }

    /// Returns the generic-definition path shared by all instantiations of
    /// this key's family, if any.
    #[inline]
    pub fn family(&self) -> Option<&'static str> {
        match &self.kind {
            KeyKind::Closed { family, .. } => *family,
            KeyKind::Definition { family } => Some(family),
        }
    }

    /// Returns `true` if this key denotes one concrete type.
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self.kind, KeyKind::Closed { .. })
    }

    /// Returns `true` if both keys are closed and denote the identical type.
    #[inline]
    pub fn same_type(&self, other: &TypeKey) -> bool {
        match (self.type_id(), other.type_id()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (KeyKind::Closed { id: a, .. }, KeyKind::Closed { id: b, .. }) => a == b,
            (KeyKind::Definition { family: a }, KeyKind::Definition { family: b }) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.kind {
            KeyKind::Closed { id, .. } => {
                state.write_u8(0);
                id.hash(state);
            }
            KeyKind::Definition { family } => {
                state.write_u8(1);
                family.hash(state);
            }
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::TypeKey;
    use crate::error::SerialError;

    #[test]
    fn closed_keys_compare_by_type_id() {
        let a = TypeKey::closed::<i32>("i32", None);
        let b = TypeKey::closed::<i32>("renamed", None);
        let c = TypeKey::closed::<i64>("i64", None);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.same_type(&b));
    }

    #[test]
    fn definition_key_is_not_concrete() {
        let key = TypeKey::definition("demo::Wrapper");
        assert!(!key.is_closed());
        assert!(matches!(key.id(), Err(SerialError::InvalidType { .. })));

        let closed = TypeKey::closed::<u8>("demo::Wrapper<u8>", Some("demo::Wrapper"));
        assert!(!key.same_type(&closed));
        assert_eq!(key.family(), closed.family());
    }
}
