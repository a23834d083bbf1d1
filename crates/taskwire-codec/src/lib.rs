//! Composable serializer stack for taskwire task payloads.
//!
//! A [`Serializer`] is an immutable, stateless codec value built by nesting
//! variants: [`Plain`](Serializer::Plain) is the base byte codec,
//! [`Compressed`](Serializer::Compressed) wraps another serializer with a
//! deflate pass, and [`Batched`](Serializer::Batched) groups values into
//! chunks before delegating. Two serializers compare equal iff their variant
//! composition and scalar parameters match: structural, not identity,
//! equality.
//!
//! Named construction goes through a [`SerializerRegistry`] (case-insensitive
//! lookup with aliases) and the [`build`] expression parser, so a pipeline
//! like `batched(compressed(plain), 10)` can come straight from
//! configuration.

pub mod build;
pub mod error;
pub mod registry;
pub mod serializer;
pub mod value;

pub use build::build;
pub use error::{CodecError, Result};
pub use registry::{SerializerKind, SerializerRegistry};
pub use serializer::Serializer;
pub use value::Value;
