use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::sync::Arc;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::context::{CopyContext, DeserializeContext, SerializeContext};
use crate::descriptor::Describe;
use crate::error::{SerialError, StreamFormatError};
use crate::key::TypeKey;
use crate::payload::Payload;
use crate::registry::SerializerRegistry;
use crate::strategy::{CopyHandle, DeserializeHandle, SerializeHandle};
use crate::strategy::{Strategy, StrategyOp};
use crate::stream::{BufferReader, BufferWriter, PayloadReader, PayloadWriter};
use crate::synthesize;

// -----------------------------------------------------------------------------
// Wire markers

/// The value's runtime type equals the expected type; no tag follows.
const TAG_SAME: u8 = 0;
/// A length-prefixed type path follows, naming the value's runtime type.
const TAG_TYPED: u8 = 1;

// -----------------------------------------------------------------------------
// Serializer

/// The dispatch engine: resolves which copy/serialize/deserialize strategy
/// applies to a value and invokes it over deep object graphs.
///
/// `Serializer` is a cheap clone-shared handle over one
/// [`SerializerRegistry`]. Dispatch may run concurrently from many call
/// sites; the registry is read-locked for resolution only, never across a
/// strategy invocation, and synthesized strategies are computed outside the
/// lock and merged first-writer-wins.
///
/// Resolution order per operation: explicit closed-type entry, explicit
/// family entry, synthesized entry; on a full miss the fallback synthesizer
/// builds a strategy from the type's descriptor, registers it and dispatch
/// retries (now guaranteed to hit).
///
/// # Example
///
/// ```
/// use gr_serial::Serializer;
///
/// let engine = Serializer::new();
/// let copy = engine.deep_copy(&42_i32)?;
/// assert_eq!(copy, 42);
/// # Ok::<(), gr_serial::SerialError>(())
/// ```
#[derive(Clone, Default)]
pub struct Serializer {
    registry: Arc<RwLock<SerializerRegistry>>,
}

impl Serializer {
    /// Creates an engine over a fresh registry with primitive descriptors
    /// pre-registered.
    pub fn new() -> Self {
        Self::from_registry(SerializerRegistry::new())
    }

    /// Creates an engine over an existing registry.
    pub fn from_registry(registry: SerializerRegistry) -> Self {
        Self {
            registry: Arc::new(RwLock::new(registry)),
        }
    }

    /// Takes a read lock on the underlying [`SerializerRegistry`].
    pub fn read(&self) -> RwLockReadGuard<'_, SerializerRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the underlying [`SerializerRegistry`].
    pub fn write(&self) -> RwLockWriteGuard<'_, SerializerRegistry> {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Registration

    /// Registers the descriptor of `T` (and its field types) in the
    /// underlying registry.
    pub fn register_type<T: Describe>(&self) {
        self.write().register::<T>();
    }

    /// Registers a custom deep-copy strategy for `T`.
    ///
    /// The copier runs exactly once per logical value copied; dispatch never
    /// falls back to structural copy for `T` afterwards. Registering a
    /// second copier for `T` fails with
    /// [`SerialError::DuplicateRegistration`] and leaves the first intact.
    pub fn register_copier<T, F>(&self, copier: F) -> Result<(), SerialError>
    where
        T: Describe,
        F: Fn(&T, &mut CopyContext<'_>) -> Result<T, SerialError> + Send + Sync + 'static,
    {
        let handle: CopyHandle = Arc::new(move |value, ctx| {
            let value = strategy_input::<T>(value, StrategyOp::Copy);
            copier(value, ctx).map(|copy| Box::new(copy) as Box<dyn Payload>)
        });
        let mut registry = self.write();
        registry.register::<T>();
        registry.set_explicit_copy(&T::static_key(), handle)
    }

    /// Registers a custom serialize strategy for `T`.
    ///
    /// The serializer receives the per-operation context and the key the
    /// discriminator was written for, and writes through
    /// [`SerializeContext::writer`].
    pub fn register_serializer<T, F>(&self, serializer: F) -> Result<(), SerialError>
    where
        T: Describe,
        F: Fn(&T, &mut SerializeContext<'_>, &TypeKey) -> Result<(), SerialError>
            + Send
            + Sync
            + 'static,
    {
        let handle: SerializeHandle = Arc::new(move |value, ctx, expected| {
            let value = strategy_input::<T>(value, StrategyOp::Serialize);
            serializer(value, ctx, expected)
        });
        let mut registry = self.write();
        registry.register::<T>();
        registry.set_explicit_serialize(&T::static_key(), handle)
    }

    /// Registers a custom deserialize strategy for `T`, reading back exactly
    /// what the matching serializer wrote.
    pub fn register_deserializer<T, F>(&self, deserializer: F) -> Result<(), SerialError>
    where
        T: Describe,
        F: Fn(&TypeKey, &mut DeserializeContext<'_>) -> Result<T, SerialError>
            + Send
            + Sync
            + 'static,
    {
        let handle: DeserializeHandle = Arc::new(move |key, ctx| {
            deserializer(key, ctx).map(|value| Box::new(value) as Box<dyn Payload>)
        });
        let mut registry = self.write();
        registry.register::<T>();
        registry.set_explicit_deserialize(&T::static_key(), handle)
    }

    /// Installs an explicit strategy for a whole generic-definition family.
    ///
    /// See [`SerializerRegistry::register_family`].
    pub fn register_family(
        &self,
        family: &'static str,
        strategy: Strategy,
    ) -> Result<(), SerialError> {
        self.write().register_family(family, strategy)
    }

    // -------------------------------------------------------------------------
    // Resolution

    /// Returns the strategy that applies to `T`, synthesizing one if
    /// necessary, without invoking it.
    ///
    /// Returns `None` when no strategy exists and none can be synthesized
    /// (the type is opaque and carries no explicit registration).
    pub fn get_strategy_for<T: Describe>(&self) -> Option<Strategy> {
        self.register_type::<T>();
        self.strategy_of(&T::static_key())
    }

    /// Key-level variant of [`get_strategy_for`](Self::get_strategy_for).
    ///
    /// The key's descriptor must already be registered for synthesis to
    /// succeed.
    pub fn strategy_of(&self, key: &TypeKey) -> Option<Strategy> {
        let existing = self.read().lookup(key);
        if let Some(strategy) = &existing {
            if strategy.has_copy() && strategy.has_serialize() && strategy.has_deserialize() {
                return existing;
            }
        }
        match self.synthesize_into(key) {
            Ok(()) => self.read().lookup(key),
            // A partial explicit registration still counts as "a strategy
            // exists"; an empty result does not.
            Err(_) => existing.filter(|strategy| !strategy.is_empty()),
        }
    }

    /// Synthesizes a strategy for `key` from its descriptor and merges it
    /// into the registry, filling only uncovered slots.
    fn synthesize_into(&self, key: &TypeKey) -> Result<(), SerialError> {
        let id = key.id()?;
        let descriptor =
            self.read()
                .descriptor(id)
                .ok_or_else(|| SerialError::UnsupportedType {
                    path: key.path().to_owned().into(),
                })?;
        // Computed outside the lock: two racing synthesizers may both build
        // a strategy, but structural synthesis is deterministic and the
        // merge below lets only one writer win per slot.
        let strategy = synthesize::synthesize(&descriptor)?;
        self.write().merge_synthesized(key, strategy);
        Ok(())
    }

    fn resolve_copy(&self, key: &TypeKey) -> Result<CopyHandle, SerialError> {
        if let Some(strategy) = self.read().lookup(key) {
            if let Some((handle, _)) = strategy.copy {
                return Ok(handle);
            }
        }
        self.synthesize_into(key)?;
        match self.read().lookup(key).and_then(|strategy| strategy.copy) {
            Some((handle, _)) => Ok(handle),
            None => Err(SerialError::UnsupportedType {
                path: key.path().to_owned().into(),
            }),
        }
    }

    fn resolve_serialize(&self, key: &TypeKey) -> Result<SerializeHandle, SerialError> {
        if let Some(strategy) = self.read().lookup(key) {
            if let Some((handle, _)) = strategy.serialize {
                return Ok(handle);
            }
        }
        self.synthesize_into(key)?;
        match self
            .read()
            .lookup(key)
            .and_then(|strategy| strategy.serialize)
        {
            Some((handle, _)) => Ok(handle),
            None => Err(SerialError::UnsupportedType {
                path: key.path().to_owned().into(),
            }),
        }
    }

    fn resolve_deserialize(&self, key: &TypeKey) -> Result<DeserializeHandle, SerialError> {
        if let Some(strategy) = self.read().lookup(key) {
            if let Some((handle, _)) = strategy.deserialize {
                return Ok(handle);
            }
        }
        self.synthesize_into(key)?;
        match self
            .read()
            .lookup(key)
            .and_then(|strategy| strategy.deserialize)
        {
            Some((handle, _)) => Ok(handle),
            None => Err(SerialError::UnsupportedType {
                path: key.path().to_owned().into(),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Copy

    /// Deep-copies a value: the result shares no mutable state with the
    /// source, except where aliasing is intentionally preserved through
    /// shared references.
    pub fn deep_copy<T: Describe>(&self, value: &T) -> Result<T, SerialError> {
        self.register_type::<T>();
        let mut ctx = CopyContext::new(self);
        let copy = self.copy_value(value, &mut ctx)?;
        match copy.take::<T>() {
            Ok(copy) => Ok(copy),
            Err(other) => panic!(
                "copy strategy for `{}` produced a value of type `{}`",
                T::static_key().path(),
                other.type_key().path()
            ),
        }
    }

    /// Type-erased deep copy. The value's type (and its field types) must
    /// already be registered.
    pub fn deep_copy_dyn(&self, value: &dyn Payload) -> Result<Box<dyn Payload>, SerialError> {
        let mut ctx = CopyContext::new(self);
        self.copy_value(value, &mut ctx)
    }

    pub(crate) fn copy_value(
        &self,
        value: &dyn Payload,
        ctx: &mut CopyContext<'_>,
    ) -> Result<Box<dyn Payload>, SerialError> {
        // Value-semantics primitives copy directly, with no strategy lookup.
        if let Some(clone) = value.primitive_clone() {
            return Ok(clone);
        }
        let key = value.type_key();
        let handle = self.resolve_copy(&key)?;
        handle(value, ctx)
    }

    // -------------------------------------------------------------------------
    // Serialize / deserialize

    /// Serializes a value to a byte stream, always writing a type tag for
    /// the root value.
    pub fn serialize_to_stream(
        &self,
        value: &dyn Payload,
        writer: &mut dyn PayloadWriter,
    ) -> Result<(), SerialError> {
        let mut ctx = SerializeContext::new(self, writer);
        self.serialize_value(value, &mut ctx, None)
    }

    /// Deserializes the next value from a byte stream written by
    /// [`serialize_to_stream`](Self::serialize_to_stream).
    pub fn deserialize_from_stream(
        &self,
        reader: &mut dyn PayloadReader,
    ) -> Result<Box<dyn Payload>, SerialError> {
        let mut ctx = DeserializeContext::new(self, reader);
        self.deserialize_value(&mut ctx, None)
    }

    /// Serializes and immediately deserializes a value through an in-memory
    /// buffer. A diagnostic convenience, mostly for tests.
    pub fn round_trip<T: Describe>(&self, value: &T) -> Result<T, SerialError> {
        self.register_type::<T>();
        let mut writer = BufferWriter::new();
        self.serialize_to_stream(value, &mut writer)?;
        let mut reader = BufferReader::new(writer.as_bytes());
        let decoded = self.deserialize_from_stream(&mut reader)?;
        match decoded.take::<T>() {
            Ok(decoded) => Ok(decoded),
            Err(other) => panic!(
                "round trip of `{}` produced a value of type `{}`",
                T::static_key().path(),
                other.type_key().path()
            ),
        }
    }

    pub(crate) fn serialize_value(
        &self,
        value: &dyn Payload,
        ctx: &mut SerializeContext<'_>,
        expected: Option<&TypeKey>,
    ) -> Result<(), SerialError> {
        let key = value.type_key();
        match expected {
            Some(expected) if expected.same_type(&key) => ctx.writer().write_u8(TAG_SAME),
            _ => {
                ctx.writer().write_u8(TAG_TYPED);
                ctx.writer().write_str(key.path());
            }
        }
        let handle = self.resolve_serialize(&key)?;
        handle(value, ctx, &key)
    }

    pub(crate) fn deserialize_value(
        &self,
        ctx: &mut DeserializeContext<'_>,
        expected: Option<&TypeKey>,
    ) -> Result<Box<dyn Payload>, SerialError> {
        let key = match ctx.reader().read_u8()? {
            TAG_SAME => expected
                .cloned()
                .ok_or(SerialError::StreamFormat(StreamFormatError::MissingExpectedType))?,
            TAG_TYPED => {
                let path = ctx.reader().read_str()?;
                match self.read().descriptor_by_path(&path) {
                    Some(descriptor) => descriptor.key().clone(),
                    None => {
                        return Err(SerialError::StreamFormat(StreamFormatError::UnknownTypeTag(
                            path,
                        )));
                    }
                }
            }
            other => {
                return Err(SerialError::StreamFormat(StreamFormatError::InvalidMarker(
                    other,
                )));
            }
        };
        let handle = self.resolve_deserialize(&key)?;
        handle(&key, ctx)
    }
}

impl core::fmt::Debug for Serializer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Serializer").finish_non_exhaustive()
    }
}

// Custom strategies are registered per concrete type; the registry only
// pairs them with values of that type. A mismatch is an engine bug.
fn strategy_input<T: Describe>(value: &dyn Payload, op: StrategyOp) -> &T {
    match value.downcast_ref::<T>() {
        Some(value) => value,
        None => panic!(
            "custom {op} strategy for `{}` invoked with a value of type `{}`",
            T::static_key().path(),
            value.type_key().path()
        ),
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use core::any::Any;
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::Serializer;
    use crate::descriptor::{Describe, TypeDescriptor};
    use crate::error::SerialError;
    use crate::impls::{Poly, Shared};
    use crate::key::TypeKey;
    use crate::payload::Payload;
    use crate::strategy::Strategy;
    use crate::stream::{BufferReader, BufferWriter, PayloadReader, PayloadWriter};
    use crate::wrappers::{
        OBSERVER_ARG_FAMILY, ObservableArg, ObserverArg, StreamArg, StreamHandle,
        TASK_RESULT_FAMILY, TaskResult,
    };

    #[derive(Clone, Debug, PartialEq)]
    struct CopierProbe {
        number: i32,
        text: String,
    }
    crate::describe_struct!(CopierProbe {
        number: i32,
        text: String,
    });

    #[derive(Clone, Debug, PartialEq)]
    struct CodecProbe {
        number: i32,
        text: String,
    }
    crate::describe_struct!(CodecProbe {
        number: i32,
        text: String,
    });

    #[derive(Clone, Debug, PartialEq)]
    struct ArgPair {
        name: String,
        code: i32,
    }
    crate::describe_struct!(ArgPair {
        name: String,
        code: i32,
    });

    #[derive(Clone, Debug, PartialEq)]
    struct Leaf {
        id: u64,
    }
    crate::describe_struct!(Leaf { id: u64 });

    #[derive(Clone, Debug, PartialEq)]
    struct SharedPair {
        left: Shared<Leaf>,
        right: Shared<Leaf>,
    }
    crate::describe_struct!(SharedPair {
        left: Shared<Leaf>,
        right: Shared<Leaf>,
    });

    /// A type that cannot be structurally decomposed.
    #[derive(Clone, Debug)]
    struct Sealed;

    impl Payload for Sealed {
        fn type_key(&self) -> TypeKey {
            Self::static_key()
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

    impl Describe for Sealed {
        fn static_key() -> TypeKey {
            TypeKey::closed::<Self>("engine::tests::Sealed", None)
        }
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::opaque(Self::static_key())
        }
    }

    #[derive(Debug)]
    struct UserBoom;

    impl core::fmt::Display for UserBoom {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.write_str("user callback failure")
        }
    }

    impl core::error::Error for UserBoom {}

    #[test]
    fn custom_copier_invoked_exactly_once() {
        let engine = Serializer::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        engine
            .register_copier::<CopierProbe, _>(move |value, _ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(CopierProbe {
                    number: value.number,
                    text: value.text.clone(),
                })
            })
            .unwrap();

        let original = CopierProbe {
            number: 5,
            text: String::from("Hello"),
        };
        let copy = engine.deep_copy(&original).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(copy, original);
    }

    #[test]
    fn custom_serializer_invoked_exactly_once_per_direction() {
        let engine = Serializer::new();
        let writes = Arc::new(AtomicUsize::new(0));
        let reads = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&writes);
        engine
            .register_serializer::<CodecProbe, _>(move |value, ctx, _expected| {
                counter.fetch_add(1, Ordering::SeqCst);
                ctx.writer().write_i32(value.number);
                ctx.writer().write_str(&value.text);
                Ok(())
            })
            .unwrap();

        let counter = Arc::clone(&reads);
        engine
            .register_deserializer::<CodecProbe, _>(move |_key, ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                let number = ctx.reader().read_i32()?;
                let text = ctx.reader().read_str()?;
                Ok(CodecProbe { number, text })
            })
            .unwrap();

        let original = CodecProbe {
            number: -3,
            text: String::from("Goodbye"),
        };

        let mut writer = BufferWriter::new();
        engine.serialize_to_stream(&original, &mut writer).unwrap();
        assert_eq!(writes.load(Ordering::SeqCst), 1);

        let mut reader = BufferReader::new(writer.as_bytes());
        let decoded = engine.deserialize_from_stream(&mut reader).unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(decoded.take::<CodecProbe>().unwrap(), original);

        assert!(engine.get_strategy_for::<CodecProbe>().is_some());
    }

    #[test]
    fn duplicate_copier_registration_keeps_first() {
        let engine = Serializer::new();
        let first_calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&first_calls);
        engine
            .register_copier::<CopierProbe, _>(move |value, _ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(value.clone())
            })
            .unwrap();

        let err = engine
            .register_copier::<CopierProbe, _>(|value, _ctx| Ok(value.clone()))
            .unwrap_err();
        assert!(matches!(err, SerialError::DuplicateRegistration { .. }));

        let original = CopierProbe {
            number: 1,
            text: String::from("first wins"),
        };
        engine.deep_copy(&original).unwrap();
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn structural_fallback_round_trips() {
        let engine = Serializer::new();
        let original = ArgPair {
            name: String::from("A"),
            code: 1,
        };
        assert_eq!(engine.round_trip(&original).unwrap(), original);
        assert_eq!(engine.deep_copy(&original).unwrap(), original);
    }

    #[test]
    fn aliasing_is_preserved_across_deep_copy() {
        let engine = Serializer::new();
        let shared = Shared::new(Leaf { id: 7 });
        let pair = SharedPair {
            left: shared.clone(),
            right: shared,
        };

        let copy = engine.deep_copy(&pair).unwrap();
        assert!(Shared::ptr_eq(&copy.left, &copy.right));
        assert!(!Shared::ptr_eq(&copy.left, &pair.left));
        assert_eq!(copy.left.id, 7);
    }

    #[test]
    fn wrapper_families_resolve_without_explicit_registration() {
        let engine = Serializer::new();
        assert!(engine.get_strategy_for::<TaskResult<ArgPair>>().is_some());
        assert!(engine.get_strategy_for::<ObserverArg<ArgPair>>().is_some());
        assert!(
            engine
                .get_strategy_for::<ObservableArg<ArgPair>>()
                .is_some()
        );
        assert!(engine.get_strategy_for::<StreamArg<ArgPair>>().is_some());
        assert!(
            engine
                .get_strategy_for::<StreamHandle<ArgPair>>()
                .is_some()
        );
    }

    #[test]
    fn observer_arg_round_trips() {
        let engine = Serializer::new();
        let original = ObserverArg::new(ArgPair {
            name: String::from("A"),
            code: 1,
        });
        assert_eq!(engine.round_trip(&original).unwrap(), original);
    }

    #[test]
    fn stream_handle_round_trips() {
        let engine = Serializer::new();
        let original = StreamHandle::<ArgPair>::new(11, 42);
        assert_eq!(engine.round_trip(&original).unwrap(), original);
    }

    #[test]
    fn opaque_type_fails_resolution() {
        let engine = Serializer::new();
        let err = engine.deep_copy(&Sealed).unwrap_err();
        assert!(matches!(err, SerialError::UnsupportedType { .. }));
        assert!(engine.get_strategy_for::<Sealed>().is_none());
    }

    #[test]
    fn polymorphic_box_round_trips_with_type_tag() {
        let engine = Serializer::new();
        let original = Poly::new(9_i64);
        let decoded = engine.round_trip(&original).unwrap();
        assert_eq!(decoded.get().downcast_ref::<i64>(), Some(&9));
    }

    #[test]
    fn family_strategy_serves_closed_instantiations() {
        let engine = Serializer::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let strategy = Strategy::new().with_copy(Arc::new(move |value, _ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            match value.downcast_ref::<TaskResult<i32>>() {
                Some(result) => Ok(Box::new(result.clone()) as Box<dyn Payload>),
                None => Err(SerialError::UnsupportedType {
                    path: value.type_key().path().to_owned().into(),
                }),
            }
        }));
        engine.register_family(TASK_RESULT_FAMILY, strategy).unwrap();

        let copy = engine.deep_copy(&TaskResult::new(5_i32)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*copy.value(), 5);
    }

    #[test]
    fn observer_family_tag_matches_closed_key() {
        let key = TypeKey::of::<ObserverArg<ArgPair>>();
        assert_eq!(key.family(), Some(OBSERVER_ARG_FAMILY));
        assert!(key.path().starts_with(OBSERVER_ARG_FAMILY));
    }

    #[test]
    fn user_callback_errors_propagate_unwrapped() {
        let engine = Serializer::new();
        engine
            .register_copier::<CodecProbe, _>(|_value, _ctx| Err(SerialError::custom(UserBoom)))
            .unwrap();

        let original = CodecProbe {
            number: 0,
            text: String::new(),
        };
        let err = engine.deep_copy(&original).unwrap_err();
        assert!(matches!(err, SerialError::Custom(_)));
    }

    #[test]
    fn unknown_type_tag_is_a_stream_error() {
        let engine = Serializer::new();
        let mut writer = BufferWriter::new();
        writer.write_u8(1); // TAG_TYPED
        writer.write_str("engine::tests::NeverRegistered");

        let mut reader = BufferReader::new(writer.as_bytes());
        let err = engine.deserialize_from_stream(&mut reader).unwrap_err();
        assert!(matches!(err, SerialError::StreamFormat(_)));
    }

    #[test]
    fn concurrent_synthesis_converges() {
        let engine = Serializer::new();
        engine.register_type::<ArgPair>();

        let threads: Vec<_> = (0..8)
            .map(|code| {
                let engine = engine.clone();
                std::thread::spawn(move || {
                    let value = ArgPair {
                        name: String::from("t"),
                        code,
                    };
                    engine.deep_copy(&value).unwrap()
                })
            })
            .collect();

        for (code, thread) in threads.into_iter().enumerate() {
            let copy = thread.join().unwrap();
            assert_eq!(copy.code, code as i32);
        }
    }
}
