//! Model types and the label-keyed registry used during reversion.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use reinhardt_primitives::{Scalar, SerializationError, SerializationResult};

use crate::model::ModelMeta;
use crate::value::{ObjectRef, Value};

/// Lookup of instances by natural key.
pub trait NaturalKeyLookup: Send + Sync {
	fn get_by_natural_key(&self, key: &[Scalar]) -> SerializationResult<ObjectRef>;
}

/// A model class: metadata plus construction and lookup.
pub trait ModelType: Send + Sync + fmt::Debug {
	fn meta(&self) -> Arc<ModelMeta>;

	/// Builds an unsaved instance from attribute values.
	fn construct(&self, attrs: IndexMap<String, Value>) -> SerializationResult<ObjectRef>;

	/// Fetches a saved instance by primary key.
	fn get(&self, pk: &Scalar) -> Option<ObjectRef> {
		let _ = pk;
		None
	}

	/// All saved instances.
	fn objects(&self) -> Vec<ObjectRef> {
		Vec::new()
	}

	/// The natural key capability, when the model defines one.
	fn natural_key_lookup(&self) -> Option<&dyn NaturalKeyLookup> {
		None
	}

	/// Stores `obj`, returning the saved instance.
	fn save_object(&self, obj: &ObjectRef) -> SerializationResult<ObjectRef> {
		let _ = obj;
		Err(SerializationError::CapabilityMissing {
			model: self.meta().label(),
			capability: "save",
		})
	}
}

static GLOBAL_REGISTRY: Lazy<Arc<ModelRegistry>> = Lazy::new(|| Arc::new(ModelRegistry::new()));

/// Model types keyed by lowercase `app.model` label.
#[derive(Default)]
pub struct ModelRegistry {
	models: RwLock<IndexMap<String, Arc<dyn ModelType>>>,
}

impl ModelRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// The process-wide registry.
	pub fn global() -> Arc<ModelRegistry> {
		GLOBAL_REGISTRY.clone()
	}

	/// Registers a model under its metadata label, replacing any previous entry.
	pub fn register(&self, model: Arc<dyn ModelType>) {
		let label = model.meta().label();
		tracing::debug!(label = %label, "registering model");
		self.models.write().insert(label, model);
	}

	/// Case-insensitive lookup.
	pub fn get(&self, label: &str) -> Option<Arc<dyn ModelType>> {
		self.models.read().get(&label.to_lowercase()).cloned()
	}

	/// Resolves a fixture model identifier.
	pub fn get_model(&self, label: &str) -> SerializationResult<Arc<dyn ModelType>> {
		self.get(label).ok_or_else(|| {
			SerializationError::Deserialization(format!("Invalid model identifier: '{}'", label))
		})
	}

	pub fn labels(&self) -> Vec<String> {
		self.models.read().keys().cloned().collect()
	}

	pub fn clear(&self) {
		self.models.write().clear();
	}
}

impl fmt::Debug for ModelRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModelRegistry")
			.field("models", &self.labels())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::FieldDescriptor;
	use crate::object::PlainObject;
	use rstest::rstest;

	#[derive(Debug)]
	struct Bare(Arc<ModelMeta>);

	impl ModelType for Bare {
		fn meta(&self) -> Arc<ModelMeta> {
			self.0.clone()
		}

		fn construct(&self, attrs: IndexMap<String, Value>) -> SerializationResult<ObjectRef> {
			Ok(Arc::new(PlainObject::from_attributes("Bare", attrs)))
		}
	}

	#[rstest]
	fn test_lookup_is_case_insensitive() {
		let registry = ModelRegistry::new();
		let meta = ModelMeta::builder("shop", "Widget")
			.field(FieldDescriptor::char("name", 10))
			.build();
		registry.register(Arc::new(Bare(meta)));

		assert!(registry.get("shop.Widget").is_some());
		assert!(registry.get("SHOP.WIDGET").is_some());
		assert!(registry.get_model("shop.widget").unwrap().natural_key_lookup().is_none());
	}

	#[rstest]
	fn test_unknown_model_identifier() {
		let err = ModelRegistry::new().get_model("nope.nothing").unwrap_err();
		assert_eq!(
			err.to_string(),
			"Deserialization error: Invalid model identifier: 'nope.nothing'"
		);
	}
}
