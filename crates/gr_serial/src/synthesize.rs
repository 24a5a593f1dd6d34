//! The fallback synthesizer.
//!
//! When dispatch finds no registered handle for an operation, the
//! synthesizer builds one from the type's descriptor: structural recursion
//! over struct layouts, fixed codecs for primitives, and pass-through for
//! delegate layouts. The engine registers the result so every later dispatch
//! of the same key hits the registry directly.

use alloc::borrow::ToOwned;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::descriptor::{Layout, TypeDescriptor};
use crate::error::SerialError;
use crate::strategy::{CopyHandle, DeserializeHandle, SerializeHandle};
use crate::strategy::{Strategy, StrategyOrigin};
use crate::wrappers;

/// Builds a full strategy (all three slots) for a described type.
///
/// Fails with [`SerialError::UnsupportedType`] for types with no accessible
/// field layout. The caller surfaces this as a resolution failure; it is
/// never absorbed.
pub(crate) fn synthesize(descriptor: &Arc<TypeDescriptor>) -> Result<Strategy, SerialError> {
    match descriptor.layout() {
        Layout::Opaque => Err(SerialError::UnsupportedType {
            path: descriptor.key().path().to_owned().into(),
        }),
        Layout::Primitive(codec) => {
            let codec = *codec;
            let copy: CopyHandle = Arc::new(|value, _ctx| match value.primitive_clone() {
                Some(clone) => Ok(clone),
                None => Err(SerialError::UnsupportedType {
                    path: value.type_key().path().to_owned().into(),
                }),
            });
            let serialize: SerializeHandle = Arc::new(move |value, ctx, _expected| {
                (codec.write)(value, ctx.writer());
                Ok(())
            });
            let deserialize: DeserializeHandle =
                Arc::new(move |_key, ctx| Ok((codec.read)(ctx.reader())?));
            Ok(tagged(copy, serialize, deserialize, StrategyOrigin::SynthesizedBuiltin))
        }
        Layout::Delegate(codec) => {
            let codec = *codec;
            let copy: CopyHandle = Arc::new(move |value, ctx| (codec.copy)(value, ctx));
            let serialize: SerializeHandle =
                Arc::new(move |value, ctx, _expected| (codec.write)(value, ctx));
            let deserialize: DeserializeHandle = Arc::new(move |_key, ctx| (codec.read)(ctx));
            Ok(tagged(copy, serialize, deserialize, StrategyOrigin::SynthesizedBuiltin))
        }
        Layout::Struct { .. } => {
            // Framework wrapper families are recognized by their
            // generic-definition identity; their strategies are built-in
            // rather than user-structural, but the recursion is the same.
            let origin = if descriptor
                .key()
                .family()
                .is_some_and(wrappers::is_wrapper_family)
            {
                StrategyOrigin::SynthesizedBuiltin
            } else {
                StrategyOrigin::SynthesizedStructural
            };

            let desc = Arc::clone(descriptor);
            let copy: CopyHandle = Arc::new(move |value, ctx| {
                let Layout::Struct { fields, build } = desc.layout() else {
                    unreachable!()
                };
                let mut values = Vec::with_capacity(fields.len());
                for field in fields {
                    values.push(ctx.copy(field.get(value))?);
                }
                Ok(build(values))
            });

            let desc = Arc::clone(descriptor);
            let serialize: SerializeHandle = Arc::new(move |value, ctx, _expected| {
                let Layout::Struct { fields, .. } = desc.layout() else {
                    unreachable!()
                };
                for field in fields {
                    ctx.serialize(field.get(value), Some(&field.key()))?;
                }
                Ok(())
            });

            let desc = Arc::clone(descriptor);
            let deserialize: DeserializeHandle = Arc::new(move |_key, ctx| {
                let Layout::Struct { fields, build } = desc.layout() else {
                    unreachable!()
                };
                let mut values = Vec::with_capacity(fields.len());
                for field in fields {
                    values.push(ctx.deserialize(Some(&field.key()))?);
                }
                Ok(build(values))
            });

            Ok(tagged(copy, serialize, deserialize, origin))
        }
    }
}

#[inline]
fn tagged(
    copy: CopyHandle,
    serialize: SerializeHandle,
    deserialize: DeserializeHandle,
    origin: StrategyOrigin,
) -> Strategy {
    Strategy {
        copy: Some((copy, origin)),
        serialize: Some((serialize, origin)),
        deserialize: Some((deserialize, origin)),
    }
}
