use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::context::{CopyContext, DeserializeContext, SerializeContext};
use crate::error::{SerialError, StreamFormatError};
use crate::key::TypeKey;
use crate::payload::Payload;
use crate::registry::SerializerRegistry;
use crate::stream::{PayloadReader, PayloadWriter};

// -----------------------------------------------------------------------------
// Field access functions

/// Returns the declared [`TypeKey`] of a field.
pub type FieldKeyFn = fn() -> TypeKey;

/// Borrows a field out of its owner.
///
/// Implementations downcast the owner internally and panic on a mismatched
/// owner type; the registry only pairs a descriptor with values of its own
/// type, so a mismatch is an engine bug, not a user error.
pub type FieldGetFn = fn(&dyn Payload) -> &dyn Payload;

/// Rebuilds an instance from per-field values in declaration order.
///
/// Shared by structural copy and structural deserialize. Panics on a field
/// count or type mismatch for the same reason as [`FieldGetFn`].
pub type BuildFn = fn(Vec<Box<dyn Payload>>) -> Box<dyn Payload>;

// -----------------------------------------------------------------------------
// FieldDescriptor

/// One declared field of a structurally decomposable type.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: &'static str,
    key: FieldKeyFn,
    get: FieldGetFn,
}

impl FieldDescriptor {
    /// Creates a field descriptor.
    #[inline]
    pub const fn new(name: &'static str, key: FieldKeyFn, get: FieldGetFn) -> Self {
        Self { name, key, get }
    }

    /// Returns the field name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the field's declared type key.
    #[inline]
    pub fn key(&self) -> TypeKey {
        (self.key)()
    }

    /// Borrows the field's value out of `owner`.
    #[inline]
    pub fn get<'a>(&self, owner: &'a dyn Payload) -> &'a dyn Payload {
        (self.get)(owner)
    }
}

impl core::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("key", &self.key())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Codecs

/// Wire codec of a value-semantics primitive.
#[derive(Clone, Copy)]
pub struct PrimitiveCodec {
    /// Writes the value through the stream collaborator.
    pub write: fn(&dyn Payload, &mut dyn PayloadWriter),
    /// Reads the value back in the order it was written.
    pub read: fn(&mut dyn PayloadReader) -> Result<Box<dyn Payload>, StreamFormatError>,
}

/// Full operation set of a type that manages its own recursion, such as a
/// shared reference or a dynamically typed box.
///
/// The functions receive the per-operation context and recurse back into
/// the dispatch engine through it.
#[derive(Clone, Copy)]
pub struct DelegateCodec {
    pub copy: fn(&dyn Payload, &mut CopyContext<'_>) -> Result<Box<dyn Payload>, SerialError>,
    pub write: fn(&dyn Payload, &mut SerializeContext<'_>) -> Result<(), SerialError>,
    pub read: fn(&mut DeserializeContext<'_>) -> Result<Box<dyn Payload>, SerialError>,
}

// -----------------------------------------------------------------------------
// Layout

/// The structural shape the fallback synthesizer works from.
pub enum Layout {
    /// The type cannot be decomposed; synthesis fails with
    /// [`SerialError::UnsupportedType`].
    Opaque,
    /// A value-semantics primitive with a fixed wire codec.
    Primitive(PrimitiveCodec),
    /// A type providing its own copy/write/read delegates.
    Delegate(DelegateCodec),
    /// A plain struct: per-field descriptors in a stable declared order,
    /// plus a rebuild function.
    Struct {
        fields: Vec<FieldDescriptor>,
        build: BuildFn,
    },
}

// -----------------------------------------------------------------------------
// TypeDescriptor

/// Runtime description of one payload type: its key and its layout.
///
/// Descriptors enter the [`SerializerRegistry`] through
/// [`register`](SerializerRegistry::register) and are consumed by the
/// fallback synthesizer whenever no explicit strategy covers an operation.
pub struct TypeDescriptor {
    key: TypeKey,
    layout: Layout,
}

impl TypeDescriptor {
    /// Creates a descriptor from a closed key and a layout.
    #[inline]
    pub const fn new(key: TypeKey, layout: Layout) -> Self {
        Self { key, layout }
    }

    /// Creates a descriptor for a type with no accessible field layout.
    #[inline]
    pub const fn opaque(key: TypeKey) -> Self {
        Self::new(key, Layout::Opaque)
    }

    /// Returns the described type's key.
    #[inline]
    pub const fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Returns the described layout.
    #[inline]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }
}

impl core::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let layout = match &self.layout {
            Layout::Opaque => "Opaque",
            Layout::Primitive(_) => "Primitive",
            Layout::Delegate(_) => "Delegate",
            Layout::Struct { .. } => "Struct",
        };
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("layout", &layout)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Describe

/// A type which can provide its own [`TypeDescriptor`] for registration
/// into the [`SerializerRegistry`].
///
/// Plain structs usually implement this through
/// [`describe_struct!`](crate::describe_struct); primitives and framework
/// wrapper types carry built-in implementations.
///
/// `static_key` must return a closed key. `register_dependencies` registers
/// the descriptors of every field type so that recursion during dispatch
/// always finds them; it is invoked at most once per registry and type.
pub trait Describe: Payload + Sized {
    /// Returns the closed [`TypeKey`] of this type.
    fn static_key() -> TypeKey;

    /// Builds the descriptor for this type.
    fn descriptor() -> TypeDescriptor;

    /// Registers the types this type's fields need. Must not register the
    /// type itself.
    fn register_dependencies(_registry: &mut SerializerRegistry) {}
}
