#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod context;
mod descriptor;
mod engine;
mod error;
mod key;
mod payload;
mod registry;
mod strategy;
mod stream;
mod synthesize;

pub mod impls;
pub mod wrappers;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use context::{CopyContext, DeserializeContext, SerializeContext};
pub use descriptor::{
    BuildFn, DelegateCodec, Describe, FieldDescriptor, FieldGetFn, FieldKeyFn, Layout,
    PrimitiveCodec, TypeDescriptor,
};
pub use engine::Serializer;
pub use error::{SerialError, StreamFormatError};
pub use impls::{Poly, Shared};
pub use key::TypeKey;
pub use payload::Payload;
#[cfg(feature = "auto_register")]
pub use registry::PayloadRegistration;
pub use registry::SerializerRegistry;
pub use strategy::{
    CopyHandle, DeserializeHandle, SerializeHandle, Strategy, StrategyOp, StrategyOrigin,
};
pub use stream::{BufferReader, BufferWriter, PayloadReader, PayloadWriter};

// Re-exported for `submit_payload!` expansions.
#[cfg(feature = "auto_register")]
pub use inventory;

#[doc(hidden)]
pub mod __macro_exports {
    pub use alloc::boxed::Box;
    pub use alloc::sync::Arc;
    pub use alloc::vec::Vec;
    pub use core::any::Any;
}
