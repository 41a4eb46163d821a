//! Relation fields: primary key and natural key representations.
//!
//! A relation converts either to the related object's primary key (the
//! stored surrogate, read without loading the related object when the owner
//! offers [`Object::serializable_value`]) or to its natural key. The
//! `PrimaryKeyOrNaturalKey` variant picks between the two on every call from
//! the `use_natural_keys` flag of the traversal.
//!
//! [`Object::serializable_value`]: crate::Object::serializable_value

use std::sync::Arc;

use indexmap::IndexMap;
use reinhardt_primitives::{
	Primitive, PrimitiveMap, Scalar, SerializationError, SerializationResult,
};

use crate::context::{ConvertContext, RevertContext};
use crate::field::{FieldCore, SerializerField, convert_plain};
use crate::fields::{coerce_for_type, key_type};
use crate::model::{FieldDescriptor, ModelFieldType, ModelType};
use crate::object::get_attribute;
use crate::value::{ObjectRef, Value};

/// Which representation a model relation serializes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelatedFieldKind {
	#[default]
	PrimaryKey,
	NaturalKey,
	PrimaryKeyOrNaturalKey,
}

impl RelatedFieldKind {
	/// A fresh field of this kind.
	pub fn build(self) -> Arc<dyn SerializerField> {
		match self {
			RelatedFieldKind::PrimaryKey => Arc::new(PrimaryKeyRelatedField::new()),
			RelatedFieldKind::NaturalKey => Arc::new(NaturalKeyRelatedField::new()),
			RelatedFieldKind::PrimaryKeyOrNaturalKey => {
				Arc::new(PrimaryKeyOrNaturalKeyRelatedField::new())
			}
		}
	}
}

fn relation_attributes(descriptor: Option<&FieldDescriptor>) -> Vec<(String, String)> {
	descriptor
		.and_then(|d| d.relation.as_ref())
		.map(|relation| {
			vec![
				("rel".to_string(), relation.rel_name().to_string()),
				("to".to_string(), relation.to.clone()),
			]
		})
		.unwrap_or_default()
}

fn pk_of(obj: &ObjectRef) -> SerializationResult<Primitive> {
	convert_plain(obj.pk().unwrap_or_else(Value::null))
}

/// Maps related objects in `value` to their primary keys.
fn primary_keys(value: Value) -> SerializationResult<Primitive> {
	match value {
		Value::Object(obj) => pk_of(&obj),
		Value::Related(manager) => Ok(Primitive::from(
			manager
				.all()
				.iter()
				.map(pk_of)
				.collect::<SerializationResult<Vec<_>>>()?,
		)),
		Value::List(items) => Ok(Primitive::from(
			items
				.into_iter()
				.map(primary_keys)
				.collect::<SerializationResult<Vec<_>>>()?,
		)),
		other => convert_plain(other),
	}
}

fn natural_key_of(obj: &ObjectRef) -> SerializationResult<Primitive> {
	match obj.natural_key() {
		Some(parts) => Ok(Primitive::from(
			parts.into_iter().map(Primitive::from).collect::<Vec<_>>(),
		)),
		None => match obj.pk() {
			Some(pk) if !pk.is_null() => convert_plain(pk),
			_ => Ok(Primitive::from(obj.to_display())),
		},
	}
}

/// Maps related objects in `value` to their natural keys.
fn natural_keys(value: Value) -> SerializationResult<Primitive> {
	match value {
		Value::Object(obj) => natural_key_of(&obj),
		Value::Related(manager) => Ok(Primitive::from(
			manager
				.all()
				.iter()
				.map(natural_key_of)
				.collect::<SerializationResult<Vec<_>>>()?,
		)),
		Value::List(items) => Ok(Primitive::from(
			items
				.into_iter()
				.map(natural_keys)
				.collect::<SerializationResult<Vec<_>>>()?,
		)),
		other => convert_plain(other),
	}
}

fn convert_primary_key(obj: &ObjectRef, name: &str) -> SerializationResult<Primitive> {
	let value = match obj.serializable_value(name) {
		Some(value) => value,
		None => get_attribute(obj, name)?,
	};
	primary_keys(value)
}

fn convert_natural_key(obj: &ObjectRef, name: &str) -> SerializationResult<Primitive> {
	natural_keys(get_attribute(obj, name)?)
}

fn is_many(descriptor: Option<&FieldDescriptor>, value: &Primitive) -> bool {
	match descriptor {
		Some(descriptor) => descriptor.is_many_to_many(),
		None => matches!(value, Primitive::Seq(_)),
	}
}

/// Column the single-valued relation `name` is stored under.
fn target_key(descriptor: Option<&FieldDescriptor>, name: &str) -> String {
	descriptor.map_or_else(|| format!("{}_id", name), FieldDescriptor::attname)
}

fn sequence_items(value: &Primitive) -> SerializationResult<Vec<&Primitive>> {
	match value {
		Primitive::Seq(seq) => Ok(seq.items()?.iter().collect()),
		Primitive::Scalar(Scalar::Null) => Ok(Vec::new()),
		single => Ok(vec![single]),
	}
}

fn revert_primary_key(
	data: &PrimitiveMap,
	name: &str,
	into: &mut IndexMap<String, Value>,
	ctx: &RevertContext,
) -> SerializationResult<()> {
	let Some(value) = data.get(name) else {
		return Ok(());
	};
	let descriptor = ctx.descriptor();
	let key_type = descriptor.map_or(ModelFieldType::Integer, |d| key_type(d, ctx));
	if is_many(descriptor, value) {
		let keys = sequence_items(value)?
			.into_iter()
			.map(|item| coerce_for_type(&key_type, item, ctx.settings()))
			.collect::<SerializationResult<Vec<_>>>()?;
		into.insert(name.to_string(), Value::List(keys));
	} else {
		let key = coerce_for_type(&key_type, value, ctx.settings())?;
		into.insert(target_key(descriptor, name), key);
	}
	Ok(())
}

fn related_model(ctx: &RevertContext, name: &str) -> SerializationResult<Arc<dyn ModelType>> {
	let relation = ctx
		.descriptor()
		.and_then(|d| d.relation.as_ref())
		.ok_or_else(|| {
			SerializationError::Deserialization(format!(
				"natural key field '{}' is not bound to a model relation",
				name
			))
		})?;
	ctx.registry().get_model(&relation.to)
}

/// Resolves one natural key (or plain key) to the related primary key.
fn resolve_natural(
	model: &Arc<dyn ModelType>,
	value: &Primitive,
	ctx: &RevertContext,
) -> SerializationResult<Value> {
	let Primitive::Seq(parts) = value else {
		let key_type = model.meta().root_pk().field_type.clone();
		return coerce_for_type(&key_type, value, ctx.settings());
	};
	let lookup = model
		.natural_key_lookup()
		.ok_or_else(|| SerializationError::CapabilityMissing {
			model: model.meta().label(),
			capability: "get_by_natural_key",
		})?;
	let key = parts
		.items()?
		.iter()
		.map(|part| {
			part.as_scalar().cloned().ok_or_else(|| {
				SerializationError::Deserialization(
					"natural key parts must be scalar values".to_string(),
				)
			})
		})
		.collect::<SerializationResult<Vec<_>>>()?;
	let obj = lookup.get_by_natural_key(&key)?;
	Ok(obj.pk().unwrap_or_else(Value::null))
}

fn revert_natural_key(
	data: &PrimitiveMap,
	name: &str,
	into: &mut IndexMap<String, Value>,
	ctx: &RevertContext,
) -> SerializationResult<()> {
	let Some(value) = data.get(name) else {
		return Ok(());
	};
	let model = related_model(ctx, name)?;
	let descriptor = ctx.descriptor();
	if is_many(descriptor, value) {
		let keys = sequence_items(value)?
			.into_iter()
			.map(|item| resolve_natural(&model, item, ctx))
			.collect::<SerializationResult<Vec<_>>>()?;
		into.insert(name.to_string(), Value::List(keys));
	} else if value.is_null() {
		into.insert(target_key(descriptor, name), Value::null());
	} else {
		into.insert(target_key(descriptor, name), resolve_natural(&model, value, ctx)?);
	}
	Ok(())
}

/// True when `value` holds natural keys rather than primary keys.
fn is_natural_shaped(descriptor: Option<&FieldDescriptor>, value: &Primitive) -> bool {
	let Primitive::Seq(seq) = value else {
		return false;
	};
	if descriptor.is_some_and(FieldDescriptor::is_many_to_many) {
		seq.as_slice()
			.is_some_and(|items| items.iter().any(|item| matches!(item, Primitive::Seq(_))))
	} else {
		true
	}
}

/// Serializes a relation to the related primary key(s).
#[derive(Debug, Clone, Default)]
pub struct PrimaryKeyRelatedField {
	core: FieldCore,
}

impl PrimaryKeyRelatedField {
	pub fn new() -> Self {
		Self::default()
	}
}

impl SerializerField for PrimaryKeyRelatedField {
	fn core(&self) -> &FieldCore {
		&self.core
	}

	fn convert_field(
		&self,
		obj: &ObjectRef,
		name: &str,
		_ctx: &ConvertContext,
	) -> SerializationResult<Primitive> {
		convert_primary_key(obj, name)
	}

	fn convert(&self, value: Value, _ctx: &ConvertContext) -> SerializationResult<Primitive> {
		primary_keys(value)
	}

	fn revert_field(
		&self,
		data: &PrimitiveMap,
		name: &str,
		into: &mut IndexMap<String, Value>,
		ctx: &RevertContext,
	) -> SerializationResult<()> {
		revert_primary_key(data, name, into, ctx)
	}

	fn revert(&self, value: &Primitive, ctx: &RevertContext) -> SerializationResult<Value> {
		let key_type = ctx
			.descriptor()
			.map_or(ModelFieldType::Integer, |d| key_type(d, ctx));
		coerce_for_type(&key_type, value, ctx.settings())
	}

	fn attributes(&self, descriptor: Option<&FieldDescriptor>) -> Vec<(String, String)> {
		relation_attributes(descriptor)
	}
}

/// Serializes a relation to the related natural key(s).
///
/// Objects without a natural key fall back to their primary key, then to
/// their display text.
#[derive(Debug, Clone, Default)]
pub struct NaturalKeyRelatedField {
	core: FieldCore,
}

impl NaturalKeyRelatedField {
	pub fn new() -> Self {
		Self::default()
	}
}

impl SerializerField for NaturalKeyRelatedField {
	fn core(&self) -> &FieldCore {
		&self.core
	}

	fn convert_field(
		&self,
		obj: &ObjectRef,
		name: &str,
		_ctx: &ConvertContext,
	) -> SerializationResult<Primitive> {
		convert_natural_key(obj, name)
	}

	fn convert(&self, value: Value, _ctx: &ConvertContext) -> SerializationResult<Primitive> {
		natural_keys(value)
	}

	fn revert_field(
		&self,
		data: &PrimitiveMap,
		name: &str,
		into: &mut IndexMap<String, Value>,
		ctx: &RevertContext,
	) -> SerializationResult<()> {
		revert_natural_key(data, name, into, ctx)
	}

	fn attributes(&self, descriptor: Option<&FieldDescriptor>) -> Vec<(String, String)> {
		relation_attributes(descriptor)
	}

	fn is_natural_key(&self, _ctx: &ConvertContext) -> bool {
		true
	}
}

/// Primary key or natural key, chosen per call from
/// [`ConvertContext::use_natural_keys`].
///
/// Reversion takes the natural key path whenever the data holds natural
/// keys, whatever the flag was when it was written.
#[derive(Debug, Clone, Default)]
pub struct PrimaryKeyOrNaturalKeyRelatedField {
	core: FieldCore,
}

impl PrimaryKeyOrNaturalKeyRelatedField {
	pub fn new() -> Self {
		Self::default()
	}
}

impl SerializerField for PrimaryKeyOrNaturalKeyRelatedField {
	fn core(&self) -> &FieldCore {
		&self.core
	}

	fn convert_field(
		&self,
		obj: &ObjectRef,
		name: &str,
		ctx: &ConvertContext,
	) -> SerializationResult<Primitive> {
		if ctx.use_natural_keys() {
			convert_natural_key(obj, name)
		} else {
			convert_primary_key(obj, name)
		}
	}

	fn convert(&self, value: Value, ctx: &ConvertContext) -> SerializationResult<Primitive> {
		if ctx.use_natural_keys() {
			natural_keys(value)
		} else {
			primary_keys(value)
		}
	}

	fn revert_field(
		&self,
		data: &PrimitiveMap,
		name: &str,
		into: &mut IndexMap<String, Value>,
		ctx: &RevertContext,
	) -> SerializationResult<()> {
		match data.get(name) {
			Some(value) if is_natural_shaped(ctx.descriptor(), value) => {
				revert_natural_key(data, name, into, ctx)
			}
			_ => revert_primary_key(data, name, into, ctx),
		}
	}

	fn attributes(&self, descriptor: Option<&FieldDescriptor>) -> Vec<(String, String)> {
		relation_attributes(descriptor)
	}

	fn is_natural_key(&self, ctx: &ConvertContext) -> bool {
		ctx.use_natural_keys()
	}
}
