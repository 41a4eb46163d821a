//! The host object contract.
//!
//! Serializers never look inside Rust structs directly. Anything that can be
//! serialized implements [`Object`], which exposes named attributes as
//! [`Value`]s in declaration order. Model-like objects additionally report
//! their [`ModelMeta`] and primary/natural keys through the provided hooks.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use reinhardt_primitives::{Scalar, SerializationError, SerializationResult};

use crate::model::ModelMeta;
use crate::value::{ObjectRef, Value};

/// A composite object that serializers can traverse.
pub trait Object: Send + Sync + fmt::Debug {
	/// Name of the concrete type, used in error messages.
	fn type_name(&self) -> &str;

	/// Reads an attribute. `None` means the object has no such attribute.
	fn attribute(&self, name: &str) -> Option<Value>;

	/// Public attribute names in declaration order.
	///
	/// Computed properties and methods are reachable through
	/// [`Object::attribute`] but are not listed here.
	fn attribute_names(&self) -> Vec<String>;

	/// Text used when the object is rendered as a flat value.
	fn to_display(&self) -> String {
		format!("<{} object>", self.type_name())
	}

	/// Model metadata, for model-like objects.
	fn model_meta(&self) -> Option<Arc<ModelMeta>> {
		None
	}

	/// Primary key value.
	fn pk(&self) -> Option<Value> {
		None
	}

	/// The raw stored value of a model field, without loading relations.
	///
	/// Foreign keys yield the stored key and many-to-many fields yield their
	/// related manager. Names that are not model fields yield `None`.
	fn serializable_value(&self, name: &str) -> Option<Value> {
		let _ = name;
		None
	}

	/// Natural key parts, for types that define one.
	fn natural_key(&self) -> Option<Vec<Scalar>> {
		None
	}

	/// Assigns an attribute in place.
	fn set_attribute(&self, name: &str, value: Value) -> SerializationResult<()> {
		let _ = (name, value);
		Err(SerializationError::CapabilityMissing {
			model: self.type_name().to_string(),
			capability: "set_attribute",
		})
	}
}

/// Reads `name` from `obj`, failing with `MissingAttribute` when absent.
pub fn get_attribute(obj: &ObjectRef, name: &str) -> SerializationResult<Value> {
	obj.attribute(name)
		.ok_or_else(|| SerializationError::missing_attribute(obj.type_name(), name))
}

type DisplayFn = Arc<dyn Fn(&PlainObject) -> String + Send + Sync>;

/// A dynamic attribute bag.
///
/// Attribute names starting with `_` are private: readable, but never listed
/// by [`Object::attribute_names`].
///
/// # Examples
///
/// ```
/// use reinhardt_serializers::{Object, PlainObject};
///
/// let obj = PlainObject::new("ExampleObject")
/// 	.with("a", 1i64)
/// 	.with("b", "foo")
/// 	.with("_hidden", "other");
/// assert_eq!(obj.attribute_names(), vec!["a", "b"]);
/// ```
pub struct PlainObject {
	type_name: String,
	attrs: RwLock<IndexMap<String, Value>>,
	display: Option<DisplayFn>,
}

impl PlainObject {
	pub fn new(type_name: impl Into<String>) -> Self {
		Self {
			type_name: type_name.into(),
			attrs: RwLock::new(IndexMap::new()),
			display: None,
		}
	}

	/// Adds an attribute.
	pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.attrs.write().insert(name.into(), value.into());
		self
	}

	/// Sets the text used when the object is rendered as a flat value.
	pub fn with_display<F>(mut self, display: F) -> Self
	where
		F: Fn(&PlainObject) -> String + Send + Sync + 'static,
	{
		self.display = Some(Arc::new(display));
		self
	}

	/// Builds an object from an attribute map, as produced by reversion.
	pub fn from_attributes(type_name: impl Into<String>, attrs: IndexMap<String, Value>) -> Self {
		Self {
			type_name: type_name.into(),
			attrs: RwLock::new(attrs),
			display: None,
		}
	}

	/// Snapshot of every attribute, private ones included.
	pub fn attributes(&self) -> IndexMap<String, Value> {
		self.attrs.read().clone()
	}
}

impl fmt::Debug for PlainObject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PlainObject")
			.field("type_name", &self.type_name)
			.field("attrs", &*self.attrs.read())
			.finish()
	}
}

impl Object for PlainObject {
	fn type_name(&self) -> &str {
		&self.type_name
	}

	fn attribute(&self, name: &str) -> Option<Value> {
		self.attrs.read().get(name).cloned()
	}

	fn attribute_names(&self) -> Vec<String> {
		self.attrs
			.read()
			.keys()
			.filter(|name| !name.starts_with('_'))
			.cloned()
			.collect()
	}

	fn to_display(&self) -> String {
		match &self.display {
			Some(display) => display(self),
			None => format!("<{} object>", self.type_name),
		}
	}

	fn set_attribute(&self, name: &str, value: Value) -> SerializationResult<()> {
		self.attrs.write().insert(name.to_string(), value);
		Ok(())
	}
}
