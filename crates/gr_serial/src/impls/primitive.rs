//! Built-in payload implementations for value-semantics primitives.
//!
//! Primitives are copied directly through [`Payload::primitive_clone`] and
//! carry fixed wire codecs; the registry pre-registers all of them, so user
//! struct fields of primitive type resolve without any setup.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;

use crate::descriptor::{Describe, Layout, PrimitiveCodec, TypeDescriptor};
use crate::error::StreamFormatError;
use crate::key::TypeKey;
use crate::payload::Payload;
use crate::stream::{PayloadReader, PayloadWriter};

macro_rules! impl_primitive {
    (
        $ty:ty, $path:literal,
        write($value:ident, $writer:ident) $write:expr,
        read($reader:ident) $read:expr
    ) => {
        impl Payload for $ty {
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

            fn primitive_clone(&self) -> Option<Box<dyn Payload>> {
                Some(Box::new(self.clone()))
            }
        }

        impl Describe for $ty {
            fn static_key() -> TypeKey {
                TypeKey::closed::<$ty>($path, None)
            }

            fn descriptor() -> TypeDescriptor {
                fn write(value: &dyn Payload, $writer: &mut dyn PayloadWriter) {
                    let $value = match value.downcast_ref::<$ty>() {
                        Some(value) => value,
                        None => panic!(
                            concat!("`", $path, "` codec invoked on `{}`"),
                            value.type_key().path()
                        ),
                    };
                    $write
                }

                fn read(
                    $reader: &mut dyn PayloadReader,
                ) -> Result<Box<dyn Payload>, StreamFormatError> {
                    let value: $ty = $read;
                    Ok(Box::new(value))
                }

                TypeDescriptor::new(
                    Self::static_key(),
                    Layout::Primitive(PrimitiveCodec { write, read }),
                )
            }
        }
    };
}

impl_primitive!(
    (), "()",
    write(value, writer) { let _ = (value, writer); },
    read(reader) { let _ = reader; }
);

impl_primitive!(
    bool, "bool",
    write(value, writer) writer.write_bool(*value),
    read(reader) reader.read_bool()?
);

// Encoded as the scalar value; decoding rejects surrogate range and
// out-of-range scalars.
impl_primitive!(
    char, "char",
    write(value, writer) writer.write_u32(*value as u32),
    read(reader) {
        let raw = reader.read_u32()?;
        match char::from_u32(raw) {
            Some(value) => value,
            None => return Err(StreamFormatError::InvalidChar(raw)),
        }
    }
);

impl_primitive!(
    u8, "u8",
    write(value, writer) writer.write_u8(*value),
    read(reader) reader.read_u8()?
);

impl_primitive!(
    u16, "u16",
    write(value, writer) writer.write_u16(*value),
    read(reader) reader.read_u16()?
);

impl_primitive!(
    u32, "u32",
    write(value, writer) writer.write_u32(*value),
    read(reader) reader.read_u32()?
);

impl_primitive!(
    u64, "u64",
    write(value, writer) writer.write_u64(*value),
    read(reader) reader.read_u64()?
);

impl_primitive!(
    u128, "u128",
    write(value, writer) writer.write_u128(*value),
    read(reader) reader.read_u128()?
);

// Fixed 8-byte encoding, independent of the host pointer width.
impl_primitive!(
    usize, "usize",
    write(value, writer) writer.write_u64(*value as u64),
    read(reader) reader.read_u64()? as usize
);

impl_primitive!(
    i8, "i8",
    write(value, writer) writer.write_i8(*value),
    read(reader) reader.read_i8()?
);

impl_primitive!(
    i16, "i16",
    write(value, writer) writer.write_i16(*value),
    read(reader) reader.read_i16()?
);

impl_primitive!(
    i32, "i32",
    write(value, writer) writer.write_i32(*value),
    read(reader) reader.read_i32()?
);

impl_primitive!(
    i64, "i64",
    write(value, writer) writer.write_i64(*value),
    read(reader) reader.read_i64()?
);

impl_primitive!(
    i128, "i128",
    write(value, writer) writer.write_i128(*value),
    read(reader) reader.read_i128()?
);

impl_primitive!(
    isize, "isize",
    write(value, writer) writer.write_i64(*value as i64),
    read(reader) reader.read_i64()? as isize
);

impl_primitive!(
    f32, "f32",
    write(value, writer) writer.write_f32(*value),
    read(reader) reader.read_f32()?
);

impl_primitive!(
    f64, "f64",
    write(value, writer) writer.write_f64(*value),
    read(reader) reader.read_f64()?
);

impl_primitive!(
    String, "String",
    write(value, writer) writer.write_str(value),
    read(reader) reader.read_str()?
);

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use crate::descriptor::{Describe, Layout};
    use crate::error::StreamFormatError;
    use crate::payload::Payload;
    use crate::stream::{BufferReader, BufferWriter};

    fn codec_round_trip<T: Describe + PartialEq + core::fmt::Debug>(value: T) {
        let descriptor = T::descriptor();
        let Layout::Primitive(codec) = descriptor.layout() else {
            panic!("primitive layout expected for `{}`", descriptor.key());
        };
        let mut writer = BufferWriter::new();
        (codec.write)(&value, &mut writer);
        let mut reader = BufferReader::new(writer.as_bytes());
        let decoded = (codec.read)(&mut reader).unwrap();
        assert_eq!(decoded.take::<T>().unwrap(), value);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn codecs_are_symmetric() {
        codec_round_trip(());
        codec_round_trip(true);
        codec_round_trip('é');
        codec_round_trip(u128::MAX);
        codec_round_trip(-7_i32);
        codec_round_trip(usize::MAX);
        codec_round_trip(0.25_f64);
        codec_round_trip(String::from("grain"));
    }

    #[test]
    fn char_decoding_rejects_surrogates() {
        let descriptor = <char as Describe>::descriptor();
        let Layout::Primitive(codec) = descriptor.layout() else {
            unreachable!()
        };
        let mut writer = BufferWriter::new();
        crate::stream::PayloadWriter::write_u32(&mut writer, 0xD800);
        let mut reader = BufferReader::new(writer.as_bytes());
        assert_eq!(
            (codec.read)(&mut reader).unwrap_err(),
            StreamFormatError::InvalidChar(0xD800)
        );
    }

    #[test]
    fn primitives_clone_without_a_strategy() {
        let value = 42_i64;
        let clone = value.primitive_clone().unwrap();
        assert_eq!(clone.take::<i64>().unwrap(), 42);
    }
}
