//! # Reinhardt Primitives
//!
//! The intermediate representation shared by the serialization crates.
//!
//! Conversion turns an object graph into a *primitive tree*: scalars,
//! ordered sequences and ordered mappings. Renderers turn that tree into
//! bytes; parsers produce it back from bytes.
//!
//! ## Overview
//!
//! - [`Scalar`]: protected leaf values (null, booleans, numbers, strings, dates)
//! - [`Primitive`]: a node of the tree
//! - [`Sequence`]: an ordered, possibly lazy, single-pass sequence
//! - [`PrimitiveMap`]: an ordered mapping whose entries carry [`FieldMeta`]
//! - [`SerializationError`]: the error taxonomy of the whole pipeline
//!
//! ## Lazy sequences
//!
//! Sequences produced by conversion are computed on demand. Call
//! [`Primitive::materialize`] before comparing or rendering a tree:
//!
//! ```rust
//! use reinhardt_primitives::{Primitive, Sequence};
//!
//! let lazy = Primitive::Seq(Sequence::lazy(vec![Ok(Primitive::from(1i64))].into_iter()));
//! let ready = lazy.materialize().unwrap();
//! assert_eq!(ready, Primitive::from(vec![Primitive::from(1i64)]));
//! ```

pub mod error;
pub mod map;
pub mod primitive;
pub mod scalar;
pub mod sequence;

pub use error::{
	ErrorCode, SerializationError, SerializationResult, ValidationError, ValidationErrors,
};
pub use map::{FieldMeta, PrimitiveMap};
pub use primitive::Primitive;
pub use scalar::Scalar;
pub use sequence::Sequence;
