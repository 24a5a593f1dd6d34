use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::TypeId;

use gr_utils::TypeIdMap;
use gr_utils::hash::HashMap;

use crate::descriptor::{Describe, TypeDescriptor};
use crate::error::SerialError;
use crate::key::TypeKey;
use crate::strategy::{CopyHandle, DeserializeHandle, SerializeHandle};
use crate::strategy::{Strategy, StrategyOp, StrategyOrigin};

// -----------------------------------------------------------------------------
// SerializerRegistry

/// The central store of type descriptors and copy/serialize/deserialize
/// strategies.
///
/// The registry holds three kinds of state:
///
/// - a descriptor table, filled through [`register`](Self::register) and
///   consulted by the fallback synthesizer and by discriminator resolution
///   (the path index maps wire type tags back to descriptors);
/// - exact-key strategy entries, holding explicit-user handles and the
///   synthesized handles that fill their gaps;
/// - generic-definition ("family") strategy entries, where one registration
///   serves every closed instantiation of a generic type.
///
/// Lookup is exact-match-wins per operation slot: a closed-type entry
/// shadows a family entry for the slots it fills, and the family entry
/// covers the rest.
///
/// The registry itself is a plain single-threaded store; concurrent dispatch
/// shares it through [`Serializer`](crate::Serializer).
///
/// # Example
///
/// ```
/// use gr_serial::{SerializerRegistry, TypeKey};
///
/// let registry = SerializerRegistry::new();
/// // Primitive descriptors are pre-registered.
/// assert!(registry.contains_key(&TypeKey::of::<i32>()));
/// assert!(registry.contains_key(&TypeKey::of::<String>()));
/// ```
pub struct SerializerRegistry {
    descriptors: TypeIdMap<Arc<TypeDescriptor>>,
    path_to_id: HashMap<String, TypeId>,
    entries: TypeIdMap<Strategy>,
    family_entries: HashMap<&'static str, Strategy>,
}

impl Default for SerializerRegistry {
    /// See [`SerializerRegistry::new`] .
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

// Explicit slot installers share one shape; the slot field and the op tag
// are the only differences.
macro_rules! set_explicit_fn {
    ($fn_name:ident, $slot:ident, $handle:ty, $op:expr) => {
        pub(crate) fn $fn_name(
            &mut self,
            key: &TypeKey,
            handle: $handle,
        ) -> Result<(), SerialError> {
            let id = key.id()?;
            let entry = self.entries.get_or_insert(id, Strategy::new);
            match &entry.$slot {
                Some((_, StrategyOrigin::ExplicitUser)) => {
                    Err(SerialError::DuplicateRegistration {
                        path: key.path().to_owned().into(),
                        op: $op,
                    })
                }
                // Explicit registration may replace a slot an earlier
                // lookup filled by synthesis.
                _ => {
                    entry.$slot = Some((handle, StrategyOrigin::ExplicitUser));
                    Ok(())
                }
            }
        }
    };
}

impl SerializerRegistry {
    /// Creates an empty [`SerializerRegistry`].
    #[inline]
    pub const fn empty() -> Self {
        Self {
            descriptors: TypeIdMap::new(),
            path_to_id: HashMap::with_hasher(gr_utils::hash::FixedHashState),
            entries: TypeIdMap::new(),
            family_entries: HashMap::with_hasher(gr_utils::hash::FixedHashState),
        }
    }

    /// Creates a registry with default descriptors for primitive types.
    ///
    /// - `()` `bool` `char`
    /// - `i8 - i128` `isize`
    /// - `u8 - u128` `usize`
    /// - `f32` `f64`
    /// - `String`
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<()>();
        registry.register::<bool>();
        registry.register::<char>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<u128>();
        registry.register::<usize>();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<i128>();
        registry.register::<isize>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<String>();
        registry
    }

    // -------------------------------------------------------------------------
    // Descriptors

    /// Registers the descriptor of `T` if it has not been registered yet.
    ///
    /// This recursively registers the descriptors of `T`'s field types as
    /// specified by [`Describe::register_dependencies`], so dispatch can
    /// resolve every nested type reachable from `T`. Neither `T` nor its
    /// dependencies are registered more than once.
    pub fn register<T: Describe>(&mut self) {
        let key = T::static_key();
        let id = match key.type_id() {
            Some(id) => id,
            None => panic!("`{}` describes itself with a definition-only key", key.path()),
        };
        let inserted = self.descriptors.try_insert(id, || {
            let descriptor = Arc::new(T::descriptor());
            self.path_to_id
                .insert(descriptor.key().path().to_owned(), id);
            descriptor
        });
        if inserted {
            T::register_dependencies(self);
        }
    }

    /// Whether a descriptor is registered for the given key.
    #[inline]
    pub fn contains_key(&self, key: &TypeKey) -> bool {
        match key.type_id() {
            Some(id) => self.descriptors.contains(&id),
            None => false,
        }
    }

    /// Returns the descriptor registered for the given [`TypeId`].
    #[inline]
    pub fn descriptor(&self, type_id: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.descriptors.get(&type_id).cloned()
    }

    /// Returns the descriptor whose type path matches a wire discriminator.
    pub fn descriptor_by_path(&self, path: &str) -> Option<Arc<TypeDescriptor>> {
        match self.path_to_id.get(path) {
            Some(id) => self.descriptor(*id),
            None => None,
        }
    }

    // -------------------------------------------------------------------------
    // Strategies

    /// Resolves the strategy view for a key: the exact-key entry overlaid
    /// on the family entry, slot by slot, exact slots winning.
    pub(crate) fn lookup(&self, key: &TypeKey) -> Option<Strategy> {
        let exact = key.type_id().and_then(|id| self.entries.get(&id));
        let family = key.family().and_then(|f| self.family_entries.get(f));
        match (exact, family) {
            (None, None) => None,
            (Some(entry), None) => Some(entry.clone()),
            (None, Some(entry)) => Some(entry.clone()),
            (Some(exact), Some(family)) => Some(Strategy {
                copy: exact.copy.clone().or_else(|| family.copy.clone()),
                serialize: exact.serialize.clone().or_else(|| family.serialize.clone()),
                deserialize: exact
                    .deserialize
                    .clone()
                    .or_else(|| family.deserialize.clone()),
            }),
        }
    }

    set_explicit_fn!(set_explicit_copy, copy, CopyHandle, StrategyOp::Copy);
    set_explicit_fn!(
        set_explicit_serialize,
        serialize,
        SerializeHandle,
        StrategyOp::Serialize
    );
    set_explicit_fn!(
        set_explicit_deserialize,
        deserialize,
        DeserializeHandle,
        StrategyOp::Deserialize
    );

    /// Installs an explicit strategy for a whole generic-definition family.
    ///
    /// Each filled slot of `strategy` collides with the matching slot of an
    /// existing registration for the same family; a collision fails with
    /// [`SerialError::DuplicateRegistration`] and leaves the existing
    /// registration fully intact.
    pub fn register_family(
        &mut self,
        family: &'static str,
        strategy: Strategy,
    ) -> Result<(), SerialError> {
        let entry = self.family_entries.entry(family).or_default();
        let collision = if strategy.has_copy() && entry.has_copy() {
            Some(StrategyOp::Copy)
        } else if strategy.has_serialize() && entry.has_serialize() {
            Some(StrategyOp::Serialize)
        } else if strategy.has_deserialize() && entry.has_deserialize() {
            Some(StrategyOp::Deserialize)
        } else {
            None
        };
        if let Some(op) = collision {
            return Err(SerialError::DuplicateRegistration {
                path: family.into(),
                op,
            });
        }
        if let Some(slot) = strategy.copy {
            entry.copy = Some(slot);
        }
        if let Some(slot) = strategy.serialize {
            entry.serialize = Some(slot);
        }
        if let Some(slot) = strategy.deserialize {
            entry.deserialize = Some(slot);
        }
        Ok(())
    }

    /// Merges a synthesized strategy into the exact-key entry, filling only
    /// the slots no existing registration (exact or family) covers.
    ///
    /// Idempotent: concurrent synthesis of the same key converges to one
    /// stored entry, the first writer of each slot winning.
    pub(crate) fn merge_synthesized(&mut self, key: &TypeKey, synthesized: Strategy) {
        let Some(id) = key.type_id() else {
            return;
        };
        let covered = self.lookup(key).unwrap_or_default();
        let entry = self.entries.get_or_insert(id, Strategy::new);
        if !covered.has_copy() {
            entry.copy = entry.copy.take().or(synthesized.copy);
        }
        if !covered.has_serialize() {
            entry.serialize = entry.serialize.take().or(synthesized.serialize);
        }
        if !covered.has_deserialize() {
            entry.deserialize = entry.deserialize.take().or(synthesized.deserialize);
        }
    }

    // -------------------------------------------------------------------------
    // Auto registration

    /// Registers every payload type submitted with
    /// [`submit_payload!`](crate::submit_payload).
    ///
    /// Repeated calls are cheap and will not insert duplicates. Returns
    /// `true` when the `auto_register` feature is enabled; without it this
    /// method does nothing and returns `false`.
    #[cfg(feature = "auto_register")]
    pub fn auto_register(&mut self) -> bool {
        for submitted in inventory::iter::<PayloadRegistration> {
            (submitted.register)(self);
        }
        true
    }

    /// See the `auto_register` feature documentation.
    #[cfg(not(feature = "auto_register"))]
    #[inline(always)]
    pub fn auto_register(&mut self) -> bool {
        false
    }
}

// -----------------------------------------------------------------------------
// PayloadRegistration

/// A link-time payload type submission, collected by
/// [`SerializerRegistry::auto_register`].
#[cfg(feature = "auto_register")]
pub struct PayloadRegistration {
    pub register: fn(&mut SerializerRegistry),
}

#[cfg(feature = "auto_register")]
inventory::collect!(PayloadRegistration);

/// Submits a payload type for registration through
/// [`SerializerRegistry::auto_register`].
///
/// # Examples
///
/// ```ignore
/// gr_serial::describe_struct!(GrainPing { sequence: u64 });
/// gr_serial::submit_payload!(GrainPing);
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! submit_payload {
    ($ty:ty) => {
        $crate::inventory::submit! {
            $crate::PayloadRegistration {
                register: |registry| registry.register::<$ty>(),
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::SerializerRegistry;
    use crate::error::SerialError;
    use crate::key::TypeKey;
    use crate::strategy::{Strategy, StrategyOp, StrategyOrigin};

    fn noop_copy_strategy() -> Strategy {
        Strategy::new().with_copy(Arc::new(|value, _ctx| {
            value.primitive_clone().ok_or(SerialError::UnsupportedType {
                path: "noop".into(),
            })
        }))
    }

    #[test]
    fn explicit_copy_collision_keeps_first() {
        let mut registry = SerializerRegistry::new();
        let key = TypeKey::of::<i32>();
        let first = noop_copy_strategy().copy.unwrap().0;
        let second = noop_copy_strategy().copy.unwrap().0;

        registry.set_explicit_copy(&key, first.clone()).unwrap();
        let err = registry.set_explicit_copy(&key, second).unwrap_err();
        assert!(matches!(
            err,
            SerialError::DuplicateRegistration {
                op: StrategyOp::Copy,
                ..
            }
        ));

        let entry = registry.lookup(&key).unwrap();
        let (stored, origin) = entry.copy.unwrap();
        assert!(Arc::ptr_eq(&stored, &first));
        assert_eq!(origin, StrategyOrigin::ExplicitUser);
    }

    #[test]
    fn synthesis_never_overwrites_explicit_slots() {
        let mut registry = SerializerRegistry::new();
        let key = TypeKey::of::<i32>();
        let explicit = noop_copy_strategy().copy.unwrap().0;
        registry.set_explicit_copy(&key, explicit.clone()).unwrap();

        let synthesized = noop_copy_strategy();
        registry.merge_synthesized(&key, synthesized);

        let entry = registry.lookup(&key).unwrap();
        let (stored, origin) = entry.copy.unwrap();
        assert!(Arc::ptr_eq(&stored, &explicit));
        assert_eq!(origin, StrategyOrigin::ExplicitUser);
    }

    #[test]
    fn family_registration_collides_per_slot() {
        let mut registry = SerializerRegistry::new();
        registry
            .register_family("demo::Wrapper", noop_copy_strategy())
            .unwrap();
        let err = registry
            .register_family("demo::Wrapper", noop_copy_strategy())
            .unwrap_err();
        assert!(matches!(
            err,
            SerialError::DuplicateRegistration {
                op: StrategyOp::Copy,
                ..
            }
        ));

        let key = TypeKey::closed::<u8>("demo::Wrapper<u8>", Some("demo::Wrapper"));
        assert!(registry.lookup(&key).unwrap().has_copy());
    }

    #[test]
    fn path_index_resolves_registered_descriptors() {
        let registry = SerializerRegistry::new();
        let descriptor = registry.descriptor_by_path("i32").unwrap();
        assert!(descriptor.key().same_type(&TypeKey::of::<i32>()));
        assert!(registry.descriptor_by_path("demo::Missing").is_none());
    }
}
