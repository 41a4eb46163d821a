//! Results of deserialization.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use reinhardt_primitives::{SerializationError, SerializationResult};

use crate::model::ModelType;
use crate::value::{ObjectRef, Value};

/// A reverted object plus the many-to-many values held back from its
/// construction.
#[derive(Debug, Clone)]
pub struct DeserializedObject {
	/// The reverted value: a constructed object, or an attribute map for
	/// serializers without a model.
	pub object: Value,
	/// Many-to-many values keyed by field name.
	pub m2m_data: IndexMap<String, Vec<Value>>,
	class: Option<Arc<dyn ModelType>>,
}

impl DeserializedObject {
	pub fn new(object: Value) -> Self {
		Self {
			object,
			m2m_data: IndexMap::new(),
			class: None,
		}
	}

	pub(crate) fn with_class(mut self, class: Arc<dyn ModelType>) -> Self {
		self.class = Some(class);
		self
	}

	pub(crate) fn with_m2m_data(mut self, m2m_data: IndexMap<String, Vec<Value>>) -> Self {
		self.m2m_data = m2m_data;
		self
	}

	/// The model type the object was constructed from.
	pub fn class(&self) -> Option<&Arc<dyn ModelType>> {
		self.class.as_ref()
	}

	pub fn into_object(self) -> Value {
		self.object
	}

	/// Assigns the held-back many-to-many values and saves the object
	/// through its model type, returning the stored object.
	pub fn save(&self) -> SerializationResult<ObjectRef> {
		let object = self.object.as_object().ok_or_else(|| {
			SerializationError::Deserialization("only model objects can be saved".to_string())
		})?;
		for (name, values) in &self.m2m_data {
			object.set_attribute(name, Value::List(values.clone()))?;
		}
		match &self.class {
			Some(class) => class.save_object(object),
			None => Err(SerializationError::CapabilityMissing {
				model: object.type_name().to_string(),
				capability: "save",
			}),
		}
	}
}

type ResultIter = Box<dyn Iterator<Item = SerializationResult<DeserializedObject>> + Send>;

/// Objects produced by a deserialize call.
///
/// A top-level sequence reverts one entry per step; anything else yields a
/// single item.
pub struct Deserialized {
	inner: ResultIter,
}

impl Deserialized {
	pub(crate) fn new<I>(iter: I) -> Self
	where
		I: Iterator<Item = SerializationResult<DeserializedObject>> + Send + 'static,
	{
		Self {
			inner: Box::new(iter),
		}
	}

	pub(crate) fn single(result: SerializationResult<DeserializedObject>) -> Self {
		Self::new(std::iter::once(result))
	}

	/// Reverts everything, stopping at the first error.
	pub fn objects(self) -> SerializationResult<Vec<DeserializedObject>> {
		self.collect()
	}

	/// The first object.
	pub fn one(mut self) -> SerializationResult<DeserializedObject> {
		self.next().unwrap_or_else(|| {
			Err(SerializationError::Deserialization(
				"no objects in input".to_string(),
			))
		})
	}
}

impl Iterator for Deserialized {
	type Item = SerializationResult<DeserializedObject>;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next()
	}
}

impl fmt::Debug for Deserialized {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Deserialized").finish_non_exhaustive()
	}
}
