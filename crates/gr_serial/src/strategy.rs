use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;

use crate::context::{CopyContext, DeserializeContext, SerializeContext};
use crate::error::SerialError;
use crate::key::TypeKey;
use crate::payload::Payload;

// -----------------------------------------------------------------------------
// Handles

/// Type-erased deep-copy handle.
///
/// Stored behind `Arc` so user closures (and any state they capture, such as
/// test counters) survive in the registry and clone cheaply into dispatch.
pub type CopyHandle = Arc<
    dyn Fn(&dyn Payload, &mut CopyContext<'_>) -> Result<Box<dyn Payload>, SerialError>
        + Send
        + Sync,
>;

/// Type-erased serialize handle. Receives the key the discriminator was
/// written for.
pub type SerializeHandle = Arc<
    dyn Fn(&dyn Payload, &mut SerializeContext<'_>, &TypeKey) -> Result<(), SerialError>
        + Send
        + Sync,
>;

/// Type-erased deserialize handle. Receives the key resolved from the
/// discriminator (or the expected key, for untagged values).
pub type DeserializeHandle = Arc<
    dyn Fn(&TypeKey, &mut DeserializeContext<'_>) -> Result<Box<dyn Payload>, SerialError>
        + Send
        + Sync,
>;

// -----------------------------------------------------------------------------
// StrategyOp / StrategyOrigin

/// The three operations a strategy can carry, named in errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyOp {
    Copy,
    Serialize,
    Deserialize,
}

impl fmt::Display for StrategyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Copy => "copy",
            Self::Serialize => "serialize",
            Self::Deserialize => "deserialize",
        })
    }
}

/// Where a strategy slot came from.
///
/// Explicit-user slots are never evicted or overwritten by synthesis;
/// synthesis only fills gaps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyOrigin {
    /// Registered by user code.
    ExplicitUser,
    /// Synthesized from a struct layout.
    SynthesizedStructural,
    /// Synthesized from a built-in codec (primitives, delegates, framework
    /// wrapper families).
    SynthesizedBuiltin,
}

// -----------------------------------------------------------------------------
// Strategy

/// A triple of optional copy/serialize/deserialize handles, each tagged with
/// its origin.
///
/// The three slots are independent: a type may carry a custom copier while
/// its serialize/deserialize slots are filled by synthesis, and vice versa.
#[derive(Clone, Default)]
pub struct Strategy {
    pub(crate) copy: Option<(CopyHandle, StrategyOrigin)>,
    pub(crate) serialize: Option<(SerializeHandle, StrategyOrigin)>,
    pub(crate) deserialize: Option<(DeserializeHandle, StrategyOrigin)>,
}

impl Strategy {
    /// Creates a strategy with all slots empty.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the copy slot to an explicit-user handle.
    pub fn with_copy(mut self, handle: CopyHandle) -> Self {
        self.copy = Some((handle, StrategyOrigin::ExplicitUser));
        self
    }

    /// Sets the serialize slot to an explicit-user handle.
    pub fn with_serialize(mut self, handle: SerializeHandle) -> Self {
        self.serialize = Some((handle, StrategyOrigin::ExplicitUser));
        self
    }

    /// Sets the deserialize slot to an explicit-user handle.
    pub fn with_deserialize(mut self, handle: DeserializeHandle) -> Self {
        self.deserialize = Some((handle, StrategyOrigin::ExplicitUser));
        self
    }

    /// Returns `true` if the copy slot is filled.
    #[inline]
    pub fn has_copy(&self) -> bool {
        self.copy.is_some()
    }

    /// Returns `true` if the serialize slot is filled.
    #[inline]
    pub fn has_serialize(&self) -> bool {
        self.serialize.is_some()
    }

    /// Returns `true` if the deserialize slot is filled.
    #[inline]
    pub fn has_deserialize(&self) -> bool {
        self.deserialize.is_some()
    }

    /// Returns `true` if no slot is filled.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.has_copy() && !self.has_serialize() && !self.has_deserialize()
    }

    /// Returns the origin of the given slot, if filled.
    pub fn origin(&self, op: StrategyOp) -> Option<StrategyOrigin> {
        match op {
            StrategyOp::Copy => self.copy.as_ref().map(|(_, origin)| *origin),
            StrategyOp::Serialize => self.serialize.as_ref().map(|(_, origin)| *origin),
            StrategyOp::Deserialize => self.deserialize.as_ref().map(|(_, origin)| *origin),
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("copy", &self.origin(StrategyOp::Copy))
            .field("serialize", &self.origin(StrategyOp::Serialize))
            .field("deserialize", &self.origin(StrategyOp::Deserialize))
            .finish()
    }
}
