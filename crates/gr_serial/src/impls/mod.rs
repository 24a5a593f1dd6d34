//! Built-in [`Describe`](crate::Describe) implementations: primitives,
//! shared references, dynamic payload slots and the `describe_struct!`
//! macro for user structs.

mod describe;
mod poly;
mod primitive;
mod shared;

pub use poly::Poly;
pub use shared::{SHARED_FAMILY, Shared};
