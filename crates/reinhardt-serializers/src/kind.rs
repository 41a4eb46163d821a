//! Schema providers: how a serializer discovers default fields and builds
//! objects back from reverted attributes.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use reinhardt_primitives::{PrimitiveMap, SerializationError, SerializationResult};

use crate::context::RevertContext;
use crate::deserialized::DeserializedObject;
use crate::field::{Field, SerializerField};
use crate::fields::field_for_descriptor;
use crate::model::{FieldDescriptor, ModelMeta, ModelType};
use crate::options::Nested;
use crate::related::RelatedFieldKind;
use crate::serializer::Serializer;
use crate::value::{ObjectRef, Value};

/// Fields keyed by declared name, in output order.
pub type FieldSet = IndexMap<String, Arc<dyn SerializerField>>;

/// What fields are being resolved for.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
	/// An object being converted.
	Object(&'a ObjectRef),
	/// A model type being reverted into.
	Model(&'a Arc<dyn ModelType>),
	/// Nothing known, e.g. reverting with a plain serializer.
	Unbound,
}

impl Subject<'_> {
	pub fn meta(&self) -> Option<Arc<ModelMeta>> {
		match self {
			Subject::Object(obj) => obj.model_meta(),
			Subject::Model(model) => Some(model.meta()),
			Subject::Unbound => None,
		}
	}
}

/// The policy half of a serializer.
///
/// A [`Serializer`] owns declared fields and options; its kind decides which
/// fields exist by default and what reverted attributes turn into.
pub trait SerializerKind: Send + Sync + fmt::Debug {
	/// Fields discovered for `subject` under the `nested` budget.
	fn default_fields(
		&self,
		serializer: &Serializer,
		subject: Subject<'_>,
		nested: Nested,
	) -> SerializationResult<FieldSet> {
		let _ = (serializer, subject, nested);
		Ok(FieldSet::new())
	}

	/// Field created for an allow-listed name nothing else provides.
	fn field_for_name(
		&self,
		serializer: &Serializer,
		subject: Subject<'_>,
		name: &str,
		nested: Nested,
	) -> Arc<dyn SerializerField> {
		let _ = (serializer, subject, name, nested);
		Arc::new(Field::new())
	}

	/// Model type that `data` reverts into.
	fn revert_class(
		&self,
		data: &PrimitiveMap,
		ctx: &RevertContext,
	) -> SerializationResult<Option<Arc<dyn ModelType>>> {
		let _ = (data, ctx);
		Ok(None)
	}

	/// Builds the result from reverted attributes.
	fn revert_object(
		&self,
		attrs: IndexMap<String, Value>,
		class: Option<&Arc<dyn ModelType>>,
	) -> SerializationResult<DeserializedObject> {
		match class {
			Some(class) => Ok(DeserializedObject::new(Value::Object(class.construct(attrs)?))
				.with_class(class.clone())),
			None => Ok(DeserializedObject::new(Value::Map(attrs))),
		}
	}
}

/// Declared fields only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Declared;

impl SerializerKind for Declared {}

/// Default fields are the object's public attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectAttributes;

impl SerializerKind for ObjectAttributes {
	fn default_fields(
		&self,
		serializer: &Serializer,
		subject: Subject<'_>,
		nested: Nested,
	) -> SerializationResult<FieldSet> {
		let Subject::Object(obj) = subject else {
			return Ok(FieldSet::new());
		};
		Ok(obj
			.attribute_names()
			.into_iter()
			.map(|name| {
				let field: Arc<dyn SerializerField> = if nested.is_nested() {
					Arc::new(serializer.spawn())
				} else {
					Arc::new(Field::new())
				};
				(name, field)
			})
			.collect())
	}

	fn revert_object(
		&self,
		_attrs: IndexMap<String, Value>,
		_class: Option<&Arc<dyn ModelType>>,
	) -> SerializationResult<DeserializedObject> {
		Err(SerializationError::CapabilityMissing {
			model: "ObjectSerializer".to_string(),
			capability: "deserialization",
		})
	}
}

/// Groups of model fields a [`ModelFields`] serializer emits by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFieldSet {
	/// The primary key, following parent links to the original one.
	Pk,
	/// Every serializable concrete field, inherited ones included.
	Fields,
	/// Serializable concrete fields declared on the model itself.
	LocalFields,
	/// Many-to-many fields with auto-created through tables.
	ManyToMany,
}

fn field_descriptors(meta: &ModelMeta, sets: &[ModelFieldSet]) -> Vec<FieldDescriptor> {
	let mut descriptors = Vec::new();
	for set in sets {
		match set {
			ModelFieldSet::Pk => descriptors.push(meta.root_pk().clone()),
			ModelFieldSet::Fields => descriptors.extend(
				meta.fields()
					.into_iter()
					.filter(|field| field.serialize)
					.cloned(),
			),
			ModelFieldSet::LocalFields => descriptors.extend(
				meta.local_fields()
					.iter()
					.filter(|field| field.serialize)
					.cloned(),
			),
			ModelFieldSet::ManyToMany => descriptors.extend(
				meta.many_to_many()
					.into_iter()
					.filter(|field| {
						field.serialize
							&& field
								.relation
								.as_ref()
								.is_some_and(|relation| relation.through_auto_created)
					})
					.cloned(),
			),
		}
	}
	descriptors
}

/// Splits many-to-many values off and constructs the model.
fn construct_model(
	mut attrs: IndexMap<String, Value>,
	class: Option<&Arc<dyn ModelType>>,
) -> SerializationResult<DeserializedObject> {
	let class = class.ok_or_else(|| {
		SerializationError::Deserialization("no model to deserialize into".to_string())
	})?;
	let mut m2m_data = IndexMap::new();
	for field in class.meta().many_to_many() {
		if let Some(value) = attrs.shift_remove(&field.name) {
			let values = match value {
				Value::List(items) => items,
				Value::Scalar(scalar) if scalar.is_null() => Vec::new(),
				other => vec![other],
			};
			m2m_data.insert(field.name.clone(), values);
		}
	}
	let object = class.construct(attrs)?;
	Ok(DeserializedObject::new(Value::Object(object))
		.with_class(class.clone())
		.with_m2m_data(m2m_data))
}

/// Default fields come from model metadata.
#[derive(Debug, Clone)]
pub struct ModelFields {
	model: Option<Arc<dyn ModelType>>,
	field_sets: Vec<ModelFieldSet>,
	related: RelatedFieldKind,
}

impl ModelFields {
	/// Model fields of whatever object is converted. Reversion needs a model.
	pub fn new(model: Option<Arc<dyn ModelType>>) -> Self {
		Self {
			model,
			field_sets: vec![
				ModelFieldSet::Pk,
				ModelFieldSet::Fields,
				ModelFieldSet::ManyToMany,
			],
			related: RelatedFieldKind::default(),
		}
	}

	pub fn with_field_sets(mut self, field_sets: impl Into<Vec<ModelFieldSet>>) -> Self {
		self.field_sets = field_sets.into();
		self
	}

	pub fn with_related(mut self, related: RelatedFieldKind) -> Self {
		self.related = related;
		self
	}

	fn meta_for(&self, subject: Subject<'_>) -> Option<Arc<ModelMeta>> {
		subject
			.meta()
			.or_else(|| self.model.as_ref().map(|model| model.meta()))
	}

	fn relation_field(&self, serializer: &Serializer, nested: Nested) -> Arc<dyn SerializerField> {
		if nested.is_nested() {
			Arc::new(serializer.spawn())
		} else {
			self.related.build()
		}
	}
}

impl SerializerKind for ModelFields {
	fn default_fields(
		&self,
		serializer: &Serializer,
		subject: Subject<'_>,
		nested: Nested,
	) -> SerializationResult<FieldSet> {
		let Some(meta) = self.meta_for(subject) else {
			return Ok(FieldSet::new());
		};
		let mut fields = FieldSet::new();
		for descriptor in field_descriptors(&meta, &self.field_sets) {
			let field = if descriptor.is_relation() && !descriptor.primary_key {
				self.relation_field(serializer, nested)
			} else {
				Arc::new(Field::new())
			};
			fields.entry(descriptor.name).or_insert(field);
		}
		Ok(fields)
	}

	fn field_for_name(
		&self,
		serializer: &Serializer,
		subject: Subject<'_>,
		name: &str,
		nested: Nested,
	) -> Arc<dyn SerializerField> {
		let Some(meta) = self.meta_for(subject) else {
			return Arc::new(Field::new());
		};
		match meta.descriptor(name) {
			Some(descriptor) if descriptor.is_relation() => self.relation_field(serializer, nested),
			Some(descriptor) => field_for_descriptor(descriptor),
			None if meta.reverse_relation(name).is_some() => {
				self.relation_field(serializer, nested)
			}
			None => Arc::new(Field::new()),
		}
	}

	fn revert_class(
		&self,
		_data: &PrimitiveMap,
		ctx: &RevertContext,
	) -> SerializationResult<Option<Arc<dyn ModelType>>> {
		if let Some(relation) = ctx.descriptor().and_then(|d| d.relation.as_ref()) {
			return Ok(Some(ctx.registry().get_model(&relation.to)?));
		}
		Ok(self.model.clone())
	}

	fn revert_object(
		&self,
		attrs: IndexMap<String, Value>,
		class: Option<&Arc<dyn ModelType>>,
	) -> SerializationResult<DeserializedObject> {
		construct_model(attrs, class)
	}
}

/// The dumpdata envelope: `pk`, `model` and the nested `fields` map.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureEnvelope;

impl SerializerKind for FixtureEnvelope {
	fn revert_class(
		&self,
		data: &PrimitiveMap,
		ctx: &RevertContext,
	) -> SerializationResult<Option<Arc<dyn ModelType>>> {
		let label = data.get("model").and_then(|model| model.as_str()).ok_or_else(|| {
			SerializationError::Deserialization("fixture entry has no model identifier".to_string())
		})?;
		tracing::debug!(model = %label, "resolving fixture model");
		ctx.registry().get_model(label).map(Some)
	}

	fn revert_object(
		&self,
		attrs: IndexMap<String, Value>,
		class: Option<&Arc<dyn ModelType>>,
	) -> SerializationResult<DeserializedObject> {
		construct_model(attrs, class)
	}
}

/// The `fields` map of a dumpdata entry.
///
/// Only the model's own fields are emitted, so a child model in a
/// multi-table hierarchy leaves its parent's columns to the parent's entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureFields;

impl FixtureFields {
	/// Nested relations expand to a bare fields map of the related object,
	/// without a `pk`/`model` envelope of their own.
	fn field_for(
		serializer: &Serializer,
		descriptor: &FieldDescriptor,
		nested: Nested,
	) -> Arc<dyn SerializerField> {
		if !descriptor.is_relation() {
			field_for_descriptor(descriptor)
		} else if nested.is_nested() {
			Arc::new(serializer.spawn())
		} else {
			RelatedFieldKind::PrimaryKeyOrNaturalKey.build()
		}
	}
}

impl SerializerKind for FixtureFields {
	fn default_fields(
		&self,
		serializer: &Serializer,
		subject: Subject<'_>,
		nested: Nested,
	) -> SerializationResult<FieldSet> {
		let Some(meta) = subject.meta() else {
			return Ok(FieldSet::new());
		};
		Ok(
			field_descriptors(&meta, &[ModelFieldSet::LocalFields, ModelFieldSet::ManyToMany])
				.iter()
				.map(|descriptor| {
					(descriptor.name.clone(), Self::field_for(serializer, descriptor, nested))
				})
				.collect(),
		)
	}

	fn field_for_name(
		&self,
		serializer: &Serializer,
		subject: Subject<'_>,
		name: &str,
		nested: Nested,
	) -> Arc<dyn SerializerField> {
		match subject.meta().as_deref().and_then(|meta| meta.descriptor(name)) {
			Some(descriptor) => Self::field_for(serializer, descriptor, nested),
			None => Arc::new(Field::new()),
		}
	}

	fn revert_object(
		&self,
		attrs: IndexMap<String, Value>,
		_class: Option<&Arc<dyn ModelType>>,
	) -> SerializationResult<DeserializedObject> {
		Ok(DeserializedObject::new(Value::Map(attrs)))
	}
}
