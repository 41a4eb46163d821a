//! Native values: the object side of conversion.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use reinhardt_primitives::{Primitive, Scalar, SerializationResult};

use crate::object::Object;

/// Shared handle to a composite object.
pub type ObjectRef = Arc<dyn Object>;

/// Identity of an object for cycle detection.
pub fn identity(obj: &ObjectRef) -> usize {
	Arc::as_ptr(obj) as *const () as usize
}

/// A zero-argument accessor: a computed property or a no-argument method.
#[derive(Clone)]
pub struct Accessor(Arc<dyn Fn() -> Value + Send + Sync>);

impl Accessor {
	pub fn new<F>(f: F) -> Self
	where
		F: Fn() -> Value + Send + Sync + 'static,
	{
		Self(Arc::new(f))
	}

	/// Invokes the accessor.
	pub fn call(&self) -> Value {
		(self.0)()
	}
}

impl fmt::Debug for Accessor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Accessor(..)")
	}
}

/// Direction of a related-object accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelatedKind {
	/// Reverse side of a foreign key.
	OneToMany,
	/// Either side of a many-to-many relation.
	ManyToMany,
}

/// Accessor over the objects on the far side of a relation.
#[derive(Debug, Clone)]
pub struct RelatedManager {
	kind: RelatedKind,
	objects: Vec<ObjectRef>,
}

impl RelatedManager {
	pub fn new(kind: RelatedKind, objects: Vec<ObjectRef>) -> Self {
		Self { kind, objects }
	}

	pub fn kind(&self) -> RelatedKind {
		self.kind
	}

	/// All related objects.
	pub fn all(&self) -> &[ObjectRef] {
		&self.objects
	}

	pub fn len(&self) -> usize {
		self.objects.len()
	}

	pub fn is_empty(&self) -> bool {
		self.objects.is_empty()
	}
}

/// A native value read from, or written to, an object attribute.
#[derive(Debug, Clone)]
pub enum Value {
	Scalar(Scalar),
	List(Vec<Value>),
	Map(IndexMap<String, Value>),
	Object(ObjectRef),
	Callable(Accessor),
	Related(RelatedManager),
}

impl Value {
	pub fn null() -> Self {
		Value::Scalar(Scalar::Null)
	}

	/// Wraps a concrete object.
	pub fn object<T: Object + 'static>(obj: T) -> Self {
		Value::Object(Arc::new(obj))
	}

	/// Wraps a zero-argument accessor.
	pub fn callable<F>(f: F) -> Self
	where
		F: Fn() -> Value + Send + Sync + 'static,
	{
		Value::Callable(Accessor::new(f))
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Scalar(Scalar::Null))
	}

	pub fn as_scalar(&self) -> Option<&Scalar> {
		match self {
			Value::Scalar(scalar) => Some(scalar),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		self.as_scalar().and_then(Scalar::as_str)
	}

	pub fn as_object(&self) -> Option<&ObjectRef> {
		match self {
			Value::Object(obj) => Some(obj),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[Value]> {
		match self {
			Value::List(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
		match self {
			Value::Map(map) => Some(map),
			_ => None,
		}
	}

	/// Builds a native value from a ready primitive tree.
	///
	/// Pending sequences are an error; parsers only produce ready trees.
	pub fn from_primitive(primitive: &Primitive) -> SerializationResult<Value> {
		Ok(match primitive {
			Primitive::Scalar(scalar) => Value::Scalar(scalar.clone()),
			Primitive::Seq(seq) => Value::List(
				seq.items()?
					.iter()
					.map(Value::from_primitive)
					.collect::<SerializationResult<_>>()?,
			),
			Primitive::Map(map) => Value::Map(
				map.iter()
					.map(|(key, value)| Ok((key.to_string(), Value::from_primitive(value)?)))
					.collect::<SerializationResult<_>>()?,
			),
		})
	}
}

fn same_object(a: &ObjectRef, b: &ObjectRef) -> bool {
	identity(a) == identity(b)
}

impl PartialEq for Value {
	/// Objects and accessors compare by identity.
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Scalar(a), Value::Scalar(b)) => a == b,
			(Value::List(a), Value::List(b)) => a == b,
			(Value::Map(a), Value::Map(b)) => a == b,
			(Value::Object(a), Value::Object(b)) => same_object(a, b),
			(Value::Callable(a), Value::Callable(b)) => Arc::ptr_eq(&a.0, &b.0),
			(Value::Related(a), Value::Related(b)) => {
				a.kind == b.kind
					&& a.objects.len() == b.objects.len()
					&& a.objects
						.iter()
						.zip(&b.objects)
						.all(|(x, y)| same_object(x, y))
			}
			_ => false,
		}
	}
}

macro_rules! impl_from_scalar {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Value {
				fn from(value: $ty) -> Self {
					Value::Scalar(Scalar::from(value))
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

impl From<Scalar> for Value {
	fn from(scalar: Scalar) -> Self {
		Value::Scalar(scalar)
	}
}

impl From<Vec<Value>> for Value {
	fn from(items: Vec<Value>) -> Self {
		Value::List(items)
	}
}

impl From<Vec<ObjectRef>> for Value {
	fn from(objects: Vec<ObjectRef>) -> Self {
		Value::List(objects.into_iter().map(Value::Object).collect())
	}
}

impl From<IndexMap<String, Value>> for Value {
	fn from(map: IndexMap<String, Value>) -> Self {
		Value::Map(map)
	}
}

impl From<RelatedManager> for Value {
	fn from(manager: RelatedManager) -> Self {
		Value::Related(manager)
	}
}

impl<T: Object + 'static> From<Arc<T>> for Value {
	fn from(obj: Arc<T>) -> Self {
		Value::Object(obj)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or_else(Value::null, Into::into)
	}
}
