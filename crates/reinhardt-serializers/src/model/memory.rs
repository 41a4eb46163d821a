//! An in-memory model backend.
//!
//! [`ModelClass`] keeps saved [`ModelInstance`]s in a vector and resolves
//! relations lazily through the [`ModelRegistry`] it was registered with.
//! Instances store values flat, keyed by column name (`owner_id`, not
//! `owner`), with inherited columns alongside the model's own.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use reinhardt_primitives::{Scalar, SerializationError, SerializationResult};

use crate::model::{
	FieldDescriptor, ModelFieldType, ModelMeta, ModelRegistry, ModelType, NaturalKeyLookup,
	Relation, ReverseRelation,
};
use crate::object::Object;
use crate::value::{ObjectRef, RelatedKind, RelatedManager, Value};

/// Primary keys read back from text formats arrive as strings.
fn scalar_matches(a: &Scalar, b: &Scalar) -> bool {
	a == b || (!a.is_null() && !b.is_null() && a.to_text() == b.to_text())
}

fn pk_of(value: &Value) -> Value {
	match value {
		Value::Object(obj) => obj.pk().unwrap_or_else(Value::null),
		other => other.clone(),
	}
}

fn related_keys(value: Value) -> Vec<Value> {
	match value {
		Value::List(items) => items.iter().map(pk_of).collect(),
		Value::Related(manager) => manager
			.all()
			.iter()
			.map(|obj| obj.pk().unwrap_or_else(Value::null))
			.collect(),
		Value::Scalar(Scalar::Null) => Vec::new(),
		other => vec![pk_of(&other)],
	}
}

/// A registered in-memory model type.
pub struct ModelClass {
	meta: Arc<ModelMeta>,
	this: Weak<ModelClass>,
	registry: Weak<ModelRegistry>,
	store: RwLock<Vec<Arc<ModelInstance>>>,
	next_pk: AtomicI64,
	natural_key: Option<Vec<String>>,
	display_field: Option<String>,
}

/// Builder for [`ModelClass`].
#[derive(Debug)]
pub struct ModelClassBuilder {
	meta: Arc<ModelMeta>,
	natural_key: Option<Vec<String>>,
	display_field: Option<String>,
}

impl ModelClassBuilder {
	/// Fields whose values form the natural key, in order.
	pub fn natural_key<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.natural_key = Some(fields.into_iter().map(Into::into).collect());
		self
	}

	/// Field whose text is used when an instance is rendered flat.
	pub fn display_field(mut self, field: impl Into<String>) -> Self {
		self.display_field = Some(field.into());
		self
	}

	/// Creates the class and registers it with `registry`.
	pub fn register(self, registry: &Arc<ModelRegistry>) -> Arc<ModelClass> {
		let class = Arc::new_cyclic(|this| ModelClass {
			meta: self.meta,
			this: this.clone(),
			registry: Arc::downgrade(registry),
			store: RwLock::new(Vec::new()),
			next_pk: AtomicI64::new(1),
			natural_key: self.natural_key,
			display_field: self.display_field,
		});
		registry.register(class.clone());
		class
	}
}

impl ModelClass {
	pub fn builder(meta: Arc<ModelMeta>) -> ModelClassBuilder {
		ModelClassBuilder {
			meta,
			natural_key: None,
			display_field: None,
		}
	}

	fn handle(&self) -> SerializationResult<Arc<ModelClass>> {
		self.this.upgrade().ok_or_else(|| {
			SerializationError::Deserialization(format!(
				"model class '{}' is no longer alive",
				self.meta.label()
			))
		})
	}

	fn registry(&self) -> Option<Arc<ModelRegistry>> {
		self.registry.upgrade()
	}

	fn default_values(&self) -> IndexMap<String, Value> {
		let mut values = IndexMap::new();
		for field in self.meta.fields() {
			let default = match field.field_type {
				ModelFieldType::Char { .. } | ModelFieldType::Text => Value::from(""),
				_ => Value::null(),
			};
			values.insert(field.attname(), default);
		}
		for field in self.meta.many_to_many() {
			values.insert(field.name.clone(), Value::List(Vec::new()));
		}
		values
	}

	/// Translates one keyword assignment into column writes.
	///
	/// Accepts `pk`, field names (relations may be given objects or keys)
	/// and column names.
	fn column_writes(&self, key: &str, value: Value) -> SerializationResult<Vec<(String, Value)>> {
		let meta = &self.meta;
		if key == "pk" {
			return Ok(meta
				.pk_chain()
				.into_iter()
				.map(|attname| (attname, value.clone()))
				.collect());
		}
		let field = meta
			.descriptor(key)
			.or_else(|| meta.descriptor_by_attname(key))
			.ok_or_else(|| {
				SerializationError::Deserialization(format!(
					"'{}' is an invalid keyword argument for {}",
					key,
					meta.object_name()
				))
			})?;
		if field.is_many_to_many() {
			return Ok(vec![(field.name.clone(), Value::List(related_keys(value)))]);
		}
		let value = if field.is_relation() {
			pk_of(&value)
		} else {
			value
		};
		let attname = field.attname();
		let chain = meta.pk_chain();
		if chain.contains(&attname) {
			Ok(chain.into_iter().map(|a| (a, value.clone())).collect())
		} else {
			Ok(vec![(attname, value)])
		}
	}

	/// Builds an unsaved instance. Unset fields take their defaults.
	pub fn instantiate(
		&self,
		attrs: IndexMap<String, Value>,
	) -> SerializationResult<Arc<ModelInstance>> {
		let mut values = self.default_values();
		for (key, value) in attrs {
			values.extend(self.column_writes(&key, value)?);
		}
		Ok(Arc::new(ModelInstance {
			class: self.handle()?,
			values: RwLock::new(values),
		}))
	}

	/// Builds and saves an instance.
	pub fn create<I, K>(&self, attrs: I) -> SerializationResult<Arc<ModelInstance>>
	where
		I: IntoIterator<Item = (K, Value)>,
		K: Into<String>,
	{
		let instance = self.instantiate(attrs.into_iter().map(|(k, v)| (k.into(), v)).collect())?;
		self.save(&instance)?;
		Ok(instance)
	}

	/// Saves an instance, assigning a primary key when it has none.
	pub fn save(&self, instance: &Arc<ModelInstance>) -> SerializationResult<()> {
		let pk = match instance.pk_scalar() {
			Scalar::Null => {
				let next = self.next_pk.fetch_add(1, Ordering::SeqCst);
				instance.set_attribute("pk", Value::from(next))?;
				Scalar::Int(next)
			}
			pk => {
				if let Scalar::Int(n) = pk {
					self.next_pk.fetch_max(n + 1, Ordering::SeqCst);
				}
				pk
			}
		};
		let mut store = self.store.write();
		match store
			.iter()
			.position(|saved| scalar_matches(&saved.pk_scalar(), &pk))
		{
			Some(index) => store[index] = instance.clone(),
			None => store.push(instance.clone()),
		}
		Ok(())
	}

	/// Saved instances in insertion order.
	pub fn all(&self) -> Vec<Arc<ModelInstance>> {
		self.store.read().clone()
	}

	/// Saved instances as object handles.
	pub fn all_objects(&self) -> Vec<ObjectRef> {
		self.store
			.read()
			.iter()
			.map(|instance| instance.clone() as ObjectRef)
			.collect()
	}

	pub fn find(&self, pk: &Scalar) -> Option<Arc<ModelInstance>> {
		self.store
			.read()
			.iter()
			.find(|saved| scalar_matches(&saved.pk_scalar(), pk))
			.cloned()
	}
}

impl fmt::Debug for ModelClass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModelClass")
			.field("label", &self.meta.label())
			.field("objects", &self.store.read().len())
			.finish()
	}
}

impl ModelType for ModelClass {
	fn meta(&self) -> Arc<ModelMeta> {
		self.meta.clone()
	}

	fn construct(&self, attrs: IndexMap<String, Value>) -> SerializationResult<ObjectRef> {
		let instance: ObjectRef = self.instantiate(attrs)?;
		Ok(instance)
	}

	fn get(&self, pk: &Scalar) -> Option<ObjectRef> {
		self.find(pk).map(|instance| instance as ObjectRef)
	}

	fn objects(&self) -> Vec<ObjectRef> {
		self.all_objects()
	}

	fn natural_key_lookup(&self) -> Option<&dyn NaturalKeyLookup> {
		self.natural_key.as_ref().map(|_| self as &dyn NaturalKeyLookup)
	}

	/// Copies the stored values of `obj` into a new saved instance.
	fn save_object(&self, obj: &ObjectRef) -> SerializationResult<ObjectRef> {
		let mut attrs = IndexMap::new();
		for field in self.meta.fields().into_iter().chain(self.meta.many_to_many()) {
			if let Some(value) = obj.serializable_value(&field.name) {
				attrs.insert(field.name.clone(), value);
			}
		}
		let instance = self.instantiate(attrs)?;
		self.save(&instance)?;
		Ok(instance)
	}
}

impl NaturalKeyLookup for ModelClass {
	fn get_by_natural_key(&self, key: &[Scalar]) -> SerializationResult<ObjectRef> {
		self.store
			.read()
			.iter()
			.find(|saved| {
				saved.natural_key().is_some_and(|parts| {
					parts.len() == key.len()
						&& parts.iter().zip(key).all(|(a, b)| scalar_matches(a, b))
				})
			})
			.map(|instance| instance.clone() as ObjectRef)
			.ok_or_else(|| {
				SerializationError::Deserialization(format!(
					"{} matching query does not exist.",
					self.meta.object_name()
				))
			})
	}
}

/// One model instance.
pub struct ModelInstance {
	class: Arc<ModelClass>,
	values: RwLock<IndexMap<String, Value>>,
}

impl ModelInstance {
	pub fn class(&self) -> &Arc<ModelClass> {
		&self.class
	}

	/// Reads a stored column.
	pub fn value(&self, attname: &str) -> Option<Value> {
		self.values.read().get(attname).cloned()
	}

	/// Snapshot of every concrete column, keyed by column name.
	pub fn concrete_values(&self) -> IndexMap<String, Value> {
		let values = self.values.read();
		self.class
			.meta
			.fields()
			.into_iter()
			.map(|field| {
				let attname = field.attname();
				let value = values.get(&attname).cloned().unwrap_or_else(Value::null);
				(attname, value)
			})
			.collect()
	}

	fn pk_scalar(&self) -> Scalar {
		let attname = self.class.meta.pk_field().attname();
		match self.values.read().get(&attname) {
			Some(Value::Scalar(scalar)) => scalar.clone(),
			_ => Scalar::Null,
		}
	}

	fn resolve(&self, relation: &Relation, key: &Value) -> Option<ObjectRef> {
		let key = key.as_scalar().filter(|key| !key.is_null())?;
		self.class.registry()?.get(&relation.to)?.get(key)
	}

	fn many_related(&self, field: &FieldDescriptor) -> RelatedManager {
		let keys = self.value(&field.name).unwrap_or_else(|| Value::List(Vec::new()));
		let objects = match (&field.relation, keys) {
			(Some(relation), Value::List(keys)) => keys
				.iter()
				.filter_map(|key| self.resolve(relation, key))
				.collect(),
			_ => Vec::new(),
		};
		RelatedManager::new(RelatedKind::ManyToMany, objects)
	}

	fn reverse_related(&self, reverse: &ReverseRelation) -> Value {
		let pk = self.pk_scalar();
		let related = self
			.class
			.registry()
			.and_then(|registry| registry.get(&reverse.model))
			.map(|model| model.objects())
			.unwrap_or_default();
		let mut matching = related.into_iter().filter(|obj| {
			!pk.is_null()
				&& obj
					.serializable_value(&reverse.field)
					.as_ref()
					.and_then(Value::as_scalar)
					.is_some_and(|key| scalar_matches(key, &pk))
		});
		if reverse.unique {
			matching.next().map_or_else(Value::null, Value::Object)
		} else {
			Value::Related(RelatedManager::new(
				RelatedKind::OneToMany,
				matching.collect(),
			))
		}
	}
}

impl fmt::Debug for ModelInstance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct(self.class.meta.object_name())
			.field("values", &*self.values.read())
			.finish()
	}
}

impl Object for ModelInstance {
	fn type_name(&self) -> &str {
		self.class.meta.object_name()
	}

	fn attribute(&self, name: &str) -> Option<Value> {
		let meta = &self.class.meta;
		if name == "pk" {
			return self.pk();
		}
		if let Some(field) = meta.descriptor(name) {
			if field.is_many_to_many() {
				return Some(Value::Related(self.many_related(field)));
			}
			let stored = self.value(&field.attname()).unwrap_or_else(Value::null);
			return Some(match &field.relation {
				Some(relation) => self
					.resolve(relation, &stored)
					.map_or_else(Value::null, Value::Object),
				None => stored,
			});
		}
		if meta.descriptor_by_attname(name).is_some() {
			return self.value(name);
		}
		meta.reverse_relation(name)
			.map(|reverse| self.reverse_related(reverse))
	}

	fn attribute_names(&self) -> Vec<String> {
		let meta = &self.class.meta;
		meta.fields()
			.into_iter()
			.chain(meta.many_to_many())
			.map(|field| field.name.clone())
			.collect()
	}

	fn to_display(&self) -> String {
		match self
			.class
			.display_field
			.as_deref()
			.and_then(|field| self.value(field))
		{
			Some(Value::Scalar(scalar)) => scalar.to_text(),
			_ => format!("{} object", self.class.meta.object_name()),
		}
	}

	fn model_meta(&self) -> Option<Arc<ModelMeta>> {
		Some(self.class.meta.clone())
	}

	fn pk(&self) -> Option<Value> {
		Some(Value::Scalar(self.pk_scalar()))
	}

	fn serializable_value(&self, name: &str) -> Option<Value> {
		if name == "pk" {
			return self.pk();
		}
		let field = self.class.meta.descriptor(name)?;
		if field.is_many_to_many() {
			return Some(Value::Related(self.many_related(field)));
		}
		Some(self.value(&field.attname()).unwrap_or_else(Value::null))
	}

	fn natural_key(&self) -> Option<Vec<Scalar>> {
		let fields = self.class.natural_key.as_ref()?;
		let values = self.values.read();
		Some(
			fields
				.iter()
				.map(|field| match values.get(field) {
					Some(Value::Scalar(scalar)) => scalar.clone(),
					_ => Scalar::Null,
				})
				.collect(),
		)
	}

	fn set_attribute(&self, name: &str, value: Value) -> SerializationResult<()> {
		let writes = self.class.column_writes(name, value)?;
		self.values.write().extend(writes);
		Ok(())
	}
}
