//! Lazy, single-pass sequences of primitives.

use std::fmt;

use crate::error::{SerializationError, SerializationResult};
use crate::primitive::Primitive;

type PendingItems = Box<dyn Iterator<Item = SerializationResult<Primitive>> + Send>;

enum State {
	Ready(Vec<Primitive>),
	Pending(PendingItems),
}

/// An ordered sequence of primitives.
///
/// A sequence produced by conversion is usually *pending*: its items are
/// computed on demand, exactly once. [`Sequence::materialize`] forces every
/// item (recursively) and turns the sequence into a ready one. Renderers only
/// accept ready sequences.
pub struct Sequence {
	state: State,
}

impl Sequence {
	/// Creates a ready sequence.
	pub fn new(items: Vec<Primitive>) -> Self {
		Self {
			state: State::Ready(items),
		}
	}

	/// Creates a pending sequence backed by a one-pass iterator.
	pub fn lazy<I>(items: I) -> Self
	where
		I: Iterator<Item = SerializationResult<Primitive>> + Send + 'static,
	{
		Self {
			state: State::Pending(Box::new(items)),
		}
	}

	/// Returns true once every item has been computed.
	pub fn is_materialized(&self) -> bool {
		match &self.state {
			State::Ready(items) => items.iter().all(Primitive::is_materialized),
			State::Pending(_) => false,
		}
	}

	/// Items of a ready sequence.
	pub fn as_slice(&self) -> Option<&[Primitive]> {
		match &self.state {
			State::Ready(items) => Some(items),
			State::Pending(_) => None,
		}
	}

	/// Items of a ready sequence, or an error for a pending one.
	pub fn items(&self) -> SerializationResult<&[Primitive]> {
		self.as_slice().ok_or_else(|| {
			SerializationError::Deserialization(
				"lazy sequence must be materialized before it can be read".to_string(),
			)
		})
	}

	/// Forces every item, propagating the first conversion error.
	pub fn materialize(self) -> SerializationResult<Sequence> {
		self.into_vec().map(Sequence::new)
	}

	/// Consumes the sequence into its materialized items.
	pub fn into_vec(self) -> SerializationResult<Vec<Primitive>> {
		self.into_iter()
			.map(|item| item.and_then(Primitive::materialize))
			.collect()
	}
}

impl IntoIterator for Sequence {
	type Item = SerializationResult<Primitive>;
	type IntoIter = PendingItems;

	fn into_iter(self) -> Self::IntoIter {
		match self.state {
			State::Ready(items) => Box::new(items.into_iter().map(Ok)),
			State::Pending(items) => items,
		}
	}
}

impl From<Vec<Primitive>> for Sequence {
	fn from(items: Vec<Primitive>) -> Self {
		Sequence::new(items)
	}
}

impl PartialEq for Sequence {
	fn eq(&self, other: &Self) -> bool {
		match (self.as_slice(), other.as_slice()) {
			(Some(a), Some(b)) => a == b,
			_ => false,
		}
	}
}

impl fmt::Debug for Sequence {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.state {
			State::Ready(items) => f.debug_list().entries(items).finish(),
			State::Pending(_) => f.write_str("Sequence(<pending>)"),
		}
	}
}
