//! The primitive tree.

use serde::ser::Error as _;
use serde::{Serialize, Serializer};

use crate::error::SerializationResult;
use crate::map::PrimitiveMap;
use crate::scalar::Scalar;
use crate::sequence::Sequence;

/// A node of the intermediate representation between objects and wire bytes.
#[derive(Debug, PartialEq)]
pub enum Primitive {
	Scalar(Scalar),
	Seq(Sequence),
	Map(PrimitiveMap),
}

impl Primitive {
	pub fn null() -> Self {
		Primitive::Scalar(Scalar::Null)
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Primitive::Scalar(Scalar::Null))
	}

	pub fn as_scalar(&self) -> Option<&Scalar> {
		match self {
			Primitive::Scalar(scalar) => Some(scalar),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		self.as_scalar().and_then(Scalar::as_str)
	}

	pub fn as_map(&self) -> Option<&PrimitiveMap> {
		match self {
			Primitive::Map(map) => Some(map),
			_ => None,
		}
	}

	pub fn as_seq(&self) -> Option<&Sequence> {
		match self {
			Primitive::Seq(seq) => Some(seq),
			_ => None,
		}
	}

	/// Returns true when the tree holds no pending sequences.
	pub fn is_materialized(&self) -> bool {
		match self {
			Primitive::Scalar(_) => true,
			Primitive::Seq(seq) => seq.is_materialized(),
			Primitive::Map(map) => map.is_materialized(),
		}
	}

	/// Forces every lazy sequence in the tree.
	pub fn materialize(self) -> SerializationResult<Primitive> {
		Ok(match self {
			Primitive::Scalar(scalar) => Primitive::Scalar(scalar),
			Primitive::Seq(seq) => Primitive::Seq(seq.materialize()?),
			Primitive::Map(map) => Primitive::Map(map.materialize()?),
		})
	}
}

impl Serialize for Primitive {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Primitive::Scalar(scalar) => scalar.serialize(serializer),
			Primitive::Seq(seq) => match seq.as_slice() {
				Some(items) => serializer.collect_seq(items),
				None => Err(S::Error::custom(
					"lazy sequence must be materialized before rendering",
				)),
			},
			Primitive::Map(map) => map.serialize(serializer),
		}
	}
}

macro_rules! impl_from_scalar {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Primitive {
				fn from(value: $ty) -> Self {
					Primitive::Scalar(Scalar::from(value))
				}
			}
		)*
	};
}

impl_from_scalar!(
	bool,
	i64,
	i32,
	u32,
	f64,
	&str,
	String,
	rust_decimal::Decimal,
	chrono::NaiveDate,
	chrono::NaiveTime,
	chrono::NaiveDateTime,
	chrono::DateTime<chrono::FixedOffset>,
);

impl From<Scalar> for Primitive {
	fn from(scalar: Scalar) -> Self {
		Primitive::Scalar(scalar)
	}
}

impl From<PrimitiveMap> for Primitive {
	fn from(map: PrimitiveMap) -> Self {
		Primitive::Map(map)
	}
}

impl From<Sequence> for Primitive {
	fn from(seq: Sequence) -> Self {
		Primitive::Seq(seq)
	}
}

impl From<Vec<Primitive>> for Primitive {
	fn from(items: Vec<Primitive>) -> Self {
		Primitive::Seq(Sequence::new(items))
	}
}

impl From<serde_json::Value> for Primitive {
	fn from(value: serde_json::Value) -> Self {
		use serde_json::Value;

		match value {
			Value::Null => Primitive::null(),
			Value::Bool(b) => Primitive::from(b),
			Value::Number(n) => match n.as_i64() {
				Some(i) => Primitive::from(i),
				None => Primitive::from(n.as_f64().unwrap_or(f64::NAN)),
			},
			Value::String(s) => Primitive::from(s),
			Value::Array(items) => {
				Primitive::from(items.into_iter().map(Primitive::from).collect::<Vec<_>>())
			}
			Value::Object(fields) => Primitive::Map(
				fields
					.into_iter()
					.map(|(key, value)| (key, Primitive::from(value)))
					.collect(),
			),
		}
	}
}
