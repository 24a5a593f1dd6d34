use alloc::boxed::Box;
use alloc::sync::Arc;

use gr_utils::hash::HashMap;

use crate::engine::Serializer;
use crate::error::SerialError;
use crate::key::TypeKey;
use crate::payload::Payload;
use crate::stream::{PayloadReader, PayloadWriter};

// -----------------------------------------------------------------------------
// CopyContext

/// Per-operation state of one top-level deep copy.
///
/// The context owns the identity map from source reference to
/// already-produced copy: if the same source is encountered twice during one
/// traversal, the second encounter yields the same copy instance, preserving
/// aliasing. A context is created at the start of a public copy call and
/// discarded at its end; nested dispatch reuses the caller's context.
pub struct CopyContext<'a> {
    engine: &'a Serializer,
    tracked: HashMap<usize, Arc<dyn Payload>>,
}

impl<'a> CopyContext<'a> {
    #[inline]
    pub(crate) fn new(engine: &'a Serializer) -> Self {
        Self {
            engine,
            tracked: HashMap::default(),
        }
    }

    /// Deep-copies a nested value through the dispatch engine, within this
    /// context.
    pub fn copy(&mut self, value: &dyn Payload) -> Result<Box<dyn Payload>, SerialError> {
        let engine = self.engine;
        engine.copy_value(value, self)
    }

    /// Returns the copy already produced for the source reference identified
    /// by `source`, if any.
    ///
    /// `source` is the address of the shared allocation being copied.
    #[inline]
    pub fn tracked(&self, source: usize) -> Option<Arc<dyn Payload>> {
        self.tracked.get(&source).cloned()
    }

    /// Records the copy produced for the source reference identified by
    /// `source`, so later encounters of the same source alias it.
    #[inline]
    pub fn track(&mut self, source: usize, copy: Arc<dyn Payload>) {
        self.tracked.insert(source, copy);
    }
}

// -----------------------------------------------------------------------------
// SerializeContext

/// Per-operation state of one top-level serialize call.
///
/// Wraps the caller's byte sink. The context adds no buffering of its own:
/// primitive writes pass straight through to the stream collaborator, in
/// order. Custom serialize strategies write their fields through
/// [`writer`](Self::writer) and recurse into nested payloads through
/// [`serialize`](Self::serialize).
pub struct SerializeContext<'a> {
    engine: &'a Serializer,
    writer: &'a mut dyn PayloadWriter,
}

impl<'a> SerializeContext<'a> {
    #[inline]
    pub(crate) fn new(engine: &'a Serializer, writer: &'a mut dyn PayloadWriter) -> Self {
        Self { engine, writer }
    }

    /// Serializes a nested value through the dispatch engine.
    ///
    /// `expected` is the declared type of the slot being written; a value
    /// whose runtime type matches it is written without a type tag. Pass
    /// `None` for slots with no declared type, which always writes the tag.
    pub fn serialize(
        &mut self,
        value: &dyn Payload,
        expected: Option<&TypeKey>,
    ) -> Result<(), SerialError> {
        let engine = self.engine;
        engine.serialize_value(value, self, expected)
    }

    /// The underlying primitive-write operations.
    #[inline]
    pub fn writer(&mut self) -> &mut dyn PayloadWriter {
        self.writer
    }
}

// -----------------------------------------------------------------------------
// DeserializeContext

/// Per-operation state of one top-level deserialize call.
///
/// The mirror of [`SerializeContext`]: primitive reads pass straight through
/// to the stream collaborator, consuming bytes in the exact order they were
/// written.
pub struct DeserializeContext<'a> {
    engine: &'a Serializer,
    reader: &'a mut dyn PayloadReader,
}

impl<'a> DeserializeContext<'a> {
    #[inline]
    pub(crate) fn new(engine: &'a Serializer, reader: &'a mut dyn PayloadReader) -> Self {
        Self { engine, reader }
    }

    /// Deserializes a nested value through the dispatch engine.
    ///
    /// `expected` resolves untagged values; see
    /// [`SerializeContext::serialize`].
    pub fn deserialize(
        &mut self,
        expected: Option<&TypeKey>,
    ) -> Result<Box<dyn Payload>, SerialError> {
        let engine = self.engine;
        engine.deserialize_value(self, expected)
    }

    /// The underlying primitive-read operations.
    #[inline]
    pub fn reader(&mut self) -> &mut dyn PayloadReader {
        self.reader
    }
}
