//! Composite serializers.
//!
//! A [`Serializer`] converts composite objects into ordered primitive maps and
//! reverts such maps back into objects. It is also a [`SerializerField`], so
//! serializers nest inside each other to describe related objects.
//!
//! Declared serializers are immutable templates. Every top-level call works
//! on a shallow per-call copy carrying that call's option overrides, and all
//! traversal state lives in the [`ConvertContext`]/[`RevertContext`] threaded
//! through the call.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use indexmap::IndexMap;
use reinhardt_formats::{PASSTHROUGH_FORMAT, ParserRegistry, RendererRegistry};
use reinhardt_primitives::{
	FieldMeta, Primitive, PrimitiveMap, Sequence, SerializationError, SerializationResult,
	ValidationErrors,
};

use crate::api::{Input, Serialized};
use crate::context::{ConvertContext, RevertContext};
use crate::deserialized::{Deserialized, DeserializedObject};
use crate::field::{Field, FieldCore, SerializerField};
use crate::fields::ModelNameField;
use crate::kind::{
	Declared, FieldSet, FixtureEnvelope, FixtureFields, ModelFields, ObjectAttributes, Subject,
	SerializerKind,
};
use crate::model::{FieldDescriptor, ModelType};
use crate::object::get_attribute;
use crate::options::{DeserializeOptions, Nested, SerializeOptions};
use crate::value::{ObjectRef, Value};

/// Custom object factory: `(attributes, instance being updated)`.
pub type RestoreFn = Arc<
	dyn Fn(IndexMap<String, Value>, Option<ObjectRef>) -> SerializationResult<Value> + Send + Sync,
>;

#[derive(Debug, Clone)]
struct SerializerOptions {
	format: Option<String>,
	nested: Option<Nested>,
	fields: Option<Vec<String>>,
	exclude: Option<Vec<String>>,
	include_default_fields: bool,
	is_root: bool,
	renderers: Arc<RendererRegistry>,
	parsers: Arc<ParserRegistry>,
}

impl Default for SerializerOptions {
	fn default() -> Self {
		Self {
			format: None,
			nested: None,
			fields: None,
			exclude: None,
			include_default_fields: true,
			is_root: false,
			renderers: Arc::new(RendererRegistry::default()),
			parsers: Arc::new(ParserRegistry::default()),
		}
	}
}

/// A composite serializer.
///
/// # Examples
///
/// ```
/// use reinhardt_serializers::{Field, ObjectSerializer, PlainObject, SerializeOptions, Value};
///
/// let serializer = ObjectSerializer::builder()
/// 	.field("b", Field::new())
/// 	.field("a", Field::new())
/// 	.include_default_fields(false)
/// 	.build();
/// let obj = Value::object(PlainObject::new("Pair").with("a", 1i64).with("b", 2i64));
/// let json = serializer
/// 	.serialize(obj, Some("json"), &SerializeOptions::new())
/// 	.unwrap();
/// assert_eq!(json.as_str(), Some(r#"{"b": 2, "a": 1}"#));
/// ```
#[derive(Clone)]
pub struct Serializer {
	core: FieldCore,
	fields: Arc<FieldSet>,
	options: Arc<SerializerOptions>,
	kind: Arc<dyn SerializerKind>,
	restore: Option<RestoreFn>,
	template: Option<Arc<Serializer>>,
}

impl Serializer {
	pub fn builder() -> SerializerBuilder {
		SerializerBuilder::new()
	}

	/// Declared fields in declaration order.
	pub fn declared_fields(&self) -> &FieldSet {
		&self.fields
	}

	pub fn kind(&self) -> &Arc<dyn SerializerKind> {
		&self.kind
	}

	/// Whether this serializer describes its owner object rather than one of
	/// the owner's attributes.
	pub fn is_root(&self) -> bool {
		self.options.is_root
	}

	/// Format used when a call names none.
	pub fn format(&self) -> Option<&str> {
		self.options.format.as_deref()
	}

	pub fn nested(&self) -> Option<Nested> {
		self.options.nested
	}

	pub fn renderers(&self) -> &RendererRegistry {
		&self.options.renderers
	}

	pub fn parsers(&self) -> &ParserRegistry {
		&self.options.parsers
	}

	/// A fresh, unlabelled, non-root instance built from the declared
	/// options, used for nested default fields.
	pub fn spawn(&self) -> Serializer {
		let template = self.template.as_deref().unwrap_or(self);
		let mut options = (*template.options).clone();
		options.is_root = false;
		Serializer {
			core: FieldCore::new(),
			fields: template.fields.clone(),
			options: Arc::new(options),
			kind: template.kind.clone(),
			restore: template.restore.clone(),
			template: None,
		}
	}

	fn with_overrides(&self, call: &SerializeOptions) -> Serializer {
		let mut options = (*self.options).clone();
		if let Some(fields) = &call.fields {
			options.fields = Some(fields.clone());
		}
		if let Some(exclude) = &call.exclude {
			options.exclude = Some(exclude.clone());
		}
		if let Some(nested) = call.nested {
			options.nested = Some(nested);
		}
		Serializer {
			options: Arc::new(options),
			template: Some(self.template.clone().unwrap_or_else(|| Arc::new(self.clone()))),
			..self.clone()
		}
	}

	/// The per-call copy. `fields`, `exclude` and `nested` go to the root
	/// child when there is one, and to this serializer otherwise.
	pub(crate) fn for_call(&self, call: &SerializeOptions) -> Serializer {
		let mut copy = Serializer {
			template: Some(Arc::new(self.clone())),
			..self.clone()
		};
		if call.fields.is_none() && call.exclude.is_none() && call.nested.is_none() {
			return copy;
		}
		let root_child = self.fields.iter().find_map(|(name, field)| {
			field
				.as_serializer()
				.filter(|child| child.is_root())
				.map(|child| (name.clone(), child.with_overrides(call)))
		});
		match root_child {
			Some((name, child)) => {
				let mut fields = (*self.fields).clone();
				fields.insert(name, Arc::new(child));
				copy.fields = Arc::new(fields);
				copy
			}
			None => copy.with_overrides(call),
		}
	}

	fn child_budget(&self, parent: Nested) -> Nested {
		if self.options.is_root {
			self.options.nested.unwrap_or(parent)
		} else {
			parent.descend()
		}
	}

	fn format_name<'a>(&'a self, format: Option<&'a str>) -> Option<&'a str> {
		format.or(self.options.format.as_deref())
	}

	/// Declared fields, then defaults, then the allow-list and deny-list.
	pub(crate) fn resolve_fields(
		&self,
		subject: Subject<'_>,
		nested: Nested,
	) -> SerializationResult<FieldSet> {
		let mut fields = (*self.fields).clone();
		if self.options.include_default_fields {
			for (name, field) in self.kind.default_fields(self, subject, nested)? {
				fields.entry(name).or_insert(field);
			}
		}
		if let Some(allow) = self.options.fields.as_deref().filter(|names| !names.is_empty()) {
			let mut picked = FieldSet::new();
			for name in allow {
				let field = match fields.get(name) {
					Some(field) => field.clone(),
					None => self.kind.field_for_name(self, subject, name, nested),
				};
				picked.insert(name.clone(), field);
			}
			fields = picked;
		}
		if let Some(exclude) = &self.options.exclude {
			for name in exclude {
				fields.shift_remove(name);
			}
		}
		Ok(fields)
	}

	/// Converts `obj` into a primitive tree without rendering it.
	pub fn convert(
		&self,
		obj: impl Into<Value>,
		options: &SerializeOptions,
	) -> SerializationResult<Primitive> {
		let serializer = self.for_call(options);
		let ctx = ConvertContext::new(options.use_natural_keys, options.resolved_settings())
			.with_nested(serializer.options.nested.unwrap_or_default());
		serializer.convert_in(obj.into(), &ctx)
	}

	pub(crate) fn convert_in(
		&self,
		value: Value,
		ctx: &ConvertContext,
	) -> SerializationResult<Primitive> {
		match value {
			Value::Scalar(scalar) => Ok(Primitive::Scalar(scalar)),
			Value::Callable(accessor) => self.convert_in(accessor.call(), ctx),
			Value::Map(map) => Ok(Primitive::Map(
				map.into_iter()
					.map(|(key, value)| Ok((key, self.convert_in(value, ctx)?)))
					.collect::<SerializationResult<PrimitiveMap>>()?,
			)),
			Value::List(items) => Ok(self.convert_lazily(items, ctx)),
			Value::Related(manager) => Ok(self.convert_lazily(
				manager.all().iter().cloned().map(Value::Object).collect(),
				ctx,
			)),
			Value::Object(obj) => self.convert_object(&obj, ctx),
		}
	}

	fn convert_lazily(&self, items: Vec<Value>, ctx: &ConvertContext) -> Primitive {
		let serializer = self.clone();
		let ctx = ctx.clone();
		Primitive::Seq(Sequence::lazy(
			items
				.into_iter()
				.map(move |item| serializer.convert_in(item, &ctx)),
		))
	}

	fn convert_object(&self, obj: &ObjectRef, ctx: &ConvertContext) -> SerializationResult<Primitive> {
		if !self.options.is_root
			&& ctx.contains(obj)
			&& let Some((owner, name)) = ctx.owner()
		{
			tracing::trace!(field = name, object = obj.type_name(), "re-entered object, converting flat");
			return self.convert_flat(owner, name, ctx);
		}
		let ctx = ctx.clone().push(obj);
		let fields = self.resolve_fields(Subject::Object(obj), ctx.nested())?;
		let meta = obj.model_meta();
		let mut out = PrimitiveMap::new();
		for (name, field) in &fields {
			let descriptor = meta.as_deref().and_then(|meta| meta.descriptor(name)).cloned();
			let child = ctx.clone().with_owner(obj, name).with_descriptor(descriptor);
			let value = field.convert_field(obj, name, &child)?;
			let field_meta = FieldMeta::new(field.core().creation_order())
				.with_attributes(field.attributes(child.descriptor()))
				.with_natural_key(field.is_natural_key(&child));
			out.insert_with_meta(field.core().label().unwrap_or(name.as_str()), value, field_meta);
		}
		Ok(Primitive::Map(out))
	}

	/// Converts the owner's attribute through its non-nested field.
	fn convert_flat(
		&self,
		owner: &ObjectRef,
		name: &str,
		ctx: &ConvertContext,
	) -> SerializationResult<Primitive> {
		let fields = self.resolve_fields(Subject::Object(owner), Nested::Flat)?;
		let field: Arc<dyn SerializerField> = match fields.get(name) {
			Some(field) if field.as_serializer().is_none() => field.clone(),
			_ => Arc::new(Field::new()),
		};
		field.convert_field(owner, name, &ctx.clone().with_nested(Nested::Flat))
	}

	/// Converts and renders `obj`.
	///
	/// With no format (or `python`) the primitive tree is returned as is.
	pub fn serialize(
		&self,
		obj: impl Into<Value>,
		format: Option<&str>,
		options: &SerializeOptions,
	) -> SerializationResult<Serialized> {
		let data = self.convert(obj, options)?;
		match self.format_name(format) {
			None | Some(PASSTHROUGH_FORMAT) => Ok(Serialized::Primitive(data)),
			Some(format) => {
				let renderer = self.options.renderers.get(format)?;
				let data = data.materialize()?;
				Ok(Serialized::Rendered(
					renderer.render_to_string(&data, &options.render_options())?,
				))
			}
		}
	}

	/// Converts `obj` and renders it straight into `out`.
	pub fn serialize_to_writer(
		&self,
		obj: impl Into<Value>,
		format: Option<&str>,
		options: &SerializeOptions,
		out: &mut dyn Write,
	) -> SerializationResult<()> {
		let format = match self.format_name(format) {
			None | Some(PASSTHROUGH_FORMAT) => {
				return Err(SerializationError::Render(
					"a primitive tree cannot be written to a stream".to_string(),
				));
			}
			Some(format) => format,
		};
		let renderer = self.options.renderers.get(format)?;
		let data = self.convert(obj, options)?.materialize()?;
		renderer.render(&data, out, &options.render_options())
	}

	/// Parses `input` and reverts it.
	///
	/// A top-level sequence reverts lazily, one entry per iteration step.
	pub fn deserialize(
		&self,
		input: impl Into<Input>,
		format: Option<&str>,
		options: &DeserializeOptions,
	) -> SerializationResult<Deserialized> {
		let data = match input.into() {
			Input::Primitive(data) => data,
			Input::Text(text) => self.parse(text.as_bytes(), format)?,
			Input::Bytes(bytes) => self.parse(&bytes, format)?,
		};
		let ctx = RevertContext::new(options.resolved_settings(), options.resolved_registry())
			.with_collect_errors(options.collect_errors)
			.with_nested(self.options.nested.unwrap_or_default())
			.with_instance(options.instance.clone());
		Ok(self.revert_top(data, ctx))
	}

	/// Reverts one entry collecting every field error.
	///
	/// Field errors come back together as [`SerializationError::Invalid`]; a
	/// validation error not tied to a field is reported under
	/// `non_field_errors`. Every other error is returned unchanged.
	pub fn validate(
		&self,
		input: impl Into<Input>,
		format: Option<&str>,
		options: &DeserializeOptions,
	) -> SerializationResult<Value> {
		let options = options.clone().with_collect_errors(true);
		match self
			.deserialize(input, format, &options)
			.and_then(Deserialized::one)
		{
			Ok(restored) => Ok(restored.object),
			Err(SerializationError::Validation(error)) => {
				let mut errors = ValidationErrors::new();
				errors.add("non_field_errors", error);
				Err(SerializationError::Invalid(errors))
			}
			Err(other) => Err(other),
		}
	}

	fn parse(&self, input: &[u8], format: Option<&str>) -> SerializationResult<Primitive> {
		match self.format_name(format) {
			Some(format) if format != PASSTHROUGH_FORMAT => {
				self.options.parsers.get(format)?.parse(input)
			}
			_ => Err(SerializationError::Parse(
				"text input needs a format to be parsed".to_string(),
			)),
		}
	}

	fn revert_top(&self, data: Primitive, ctx: RevertContext) -> Deserialized {
		match data {
			Primitive::Seq(seq) => {
				let serializer = self.clone();
				Deserialized::new(seq.into_iter().map(move |item| {
					let item = item.and_then(Primitive::materialize)?;
					serializer.revert_value(&item, &ctx)
				}))
			}
			other => Deserialized::single(
				other
					.materialize()
					.and_then(|data| self.revert_value(&data, &ctx)),
			),
		}
	}

	fn revert_value(&self, data: &Primitive, ctx: &RevertContext) -> SerializationResult<DeserializedObject> {
		match data {
			Primitive::Map(map) => self.revert_entry(map, ctx),
			other => Ok(DeserializedObject::new(self.revert_in(other, ctx)?)),
		}
	}

	pub(crate) fn revert_in(&self, data: &Primitive, ctx: &RevertContext) -> SerializationResult<Value> {
		match data {
			Primitive::Scalar(scalar) => Ok(Value::Scalar(scalar.clone())),
			Primitive::Seq(seq) => seq
				.items()?
				.iter()
				.map(|item| self.revert_in(item, ctx))
				.collect::<SerializationResult<Vec<_>>>()
				.map(Value::List),
			Primitive::Map(map) => Ok(self.revert_entry(map, ctx)?.object),
		}
	}

	fn revert_entry(
		&self,
		data: &PrimitiveMap,
		ctx: &RevertContext,
	) -> SerializationResult<DeserializedObject> {
		// A root child's type discriminator lives on the enclosing entry.
		let class = if self.options.is_root {
			ctx.parent_class().cloned()
		} else {
			self.kind.revert_class(data, ctx)?
		};
		let subject = class.as_ref().map_or(Subject::Unbound, Subject::Model);
		let fields = self.resolve_fields(subject, ctx.nested())?;
		let meta = class.as_ref().map(|class| class.meta());

		let mut attrs = IndexMap::new();
		let mut errors = ValidationErrors::new();
		for (name, field) in &fields {
			let descriptor: Option<FieldDescriptor> =
				meta.as_deref().and_then(|meta| meta.descriptor(name)).cloned();
			let child = ctx
				.clone()
				.with_parent_class(class.clone())
				.with_descriptor(descriptor)
				.with_instance(None);
			let Err(err) = field.revert_field(data, name, &mut attrs, &child) else {
				continue;
			};
			if !ctx.collect_errors() {
				return Err(err);
			}
			match err {
				SerializationError::Validation(error) => errors.add(name.as_str(), error),
				SerializationError::Invalid(nested) => {
					let prefix = match field.as_serializer() {
						Some(child) if child.is_root() => "",
						_ => name.as_str(),
					};
					errors.merge(prefix, nested);
				}
				other => return Err(other),
			}
		}
		if !errors.is_empty() {
			return Err(SerializationError::Invalid(errors));
		}
		self.restore(attrs, class.as_ref(), ctx)
	}

	fn restore(
		&self,
		attrs: IndexMap<String, Value>,
		class: Option<&Arc<dyn ModelType>>,
		ctx: &RevertContext,
	) -> SerializationResult<DeserializedObject> {
		if let Some(restore) = &self.restore {
			return Ok(DeserializedObject::new(restore(attrs, ctx.instance().cloned())?));
		}
		if let Some(instance) = ctx.instance() {
			for (name, value) in attrs {
				instance.set_attribute(&name, value)?;
			}
			let restored = DeserializedObject::new(Value::Object(instance.clone()));
			return Ok(match class {
				Some(class) => restored.with_class(class.clone()),
				None => restored,
			});
		}
		self.kind.revert_object(attrs, class)
	}
}

impl fmt::Debug for Serializer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Serializer")
			.field("label", &self.core.label())
			.field("kind", &self.kind)
			.field("fields", &self.fields.keys().collect::<Vec<_>>())
			.field("options", &self.options)
			.finish()
	}
}

impl SerializerField for Serializer {
	fn core(&self) -> &FieldCore {
		&self.core
	}

	fn convert_field(
		&self,
		obj: &ObjectRef,
		name: &str,
		ctx: &ConvertContext,
	) -> SerializationResult<Primitive> {
		let ctx = ctx.clone().with_nested(self.child_budget(ctx.nested()));
		if self.options.is_root {
			return self.convert_in(Value::Object(obj.clone()), &ctx);
		}
		self.convert_in(get_attribute(obj, name)?, &ctx)
	}

	fn convert(&self, value: Value, ctx: &ConvertContext) -> SerializationResult<Primitive> {
		self.convert_in(value, ctx)
	}

	fn revert_field(
		&self,
		data: &PrimitiveMap,
		name: &str,
		into: &mut IndexMap<String, Value>,
		ctx: &RevertContext,
	) -> SerializationResult<()> {
		let Some(value) = data.get(name) else {
			return Ok(());
		};
		let ctx = ctx.clone().with_nested(self.child_budget(ctx.nested()));
		match self.revert_in(value, &ctx)? {
			Value::Map(attrs) if self.options.is_root => into.extend(attrs),
			reverted => {
				into.insert(name.to_string(), reverted);
			}
		}
		Ok(())
	}

	fn revert(&self, value: &Primitive, ctx: &RevertContext) -> SerializationResult<Value> {
		self.revert_in(value, ctx)
	}

	fn as_serializer(&self) -> Option<&Serializer> {
		Some(self)
	}
}

/// Builder for [`Serializer`].
pub struct SerializerBuilder {
	core: FieldCore,
	declared: Vec<(String, Arc<dyn SerializerField>)>,
	inherited: FieldSet,
	options: SerializerOptions,
	kind: Arc<dyn SerializerKind>,
	restore: Option<RestoreFn>,
}

impl SerializerBuilder {
	fn new() -> Self {
		Self {
			core: FieldCore::new(),
			declared: Vec::new(),
			inherited: FieldSet::new(),
			options: SerializerOptions::default(),
			kind: Arc::new(Declared),
			restore: None,
		}
	}

	/// Declares a field. Declared fields are ordered by creation, not by
	/// the order of these calls.
	pub fn field<F>(mut self, name: impl Into<String>, field: F) -> Self
	where
		F: SerializerField + 'static,
	{
		self.declared.push((name.into(), Arc::new(field)));
		self
	}

	/// Takes over the declared fields of `base`, ahead of this builder's own.
	pub fn inherit(mut self, base: &Serializer) -> Self {
		for (name, field) in base.declared_fields() {
			self.inherited.insert(name.clone(), field.clone());
		}
		self
	}

	/// Output key used when this serializer is a field.
	pub fn label(mut self, label: impl Into<String>) -> Self {
		self.core = self.core.with_label(label);
		self
	}

	pub fn nested(mut self, nested: impl Into<Nested>) -> Self {
		self.options.nested = Some(nested.into());
		self
	}

	pub fn fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.options.fields = Some(fields.into_iter().map(Into::into).collect());
		self
	}

	pub fn exclude<I, S>(mut self, exclude: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.options.exclude = Some(exclude.into_iter().map(Into::into).collect());
		self
	}

	pub fn include_default_fields(mut self, include: bool) -> Self {
		self.options.include_default_fields = include;
		self
	}

	pub fn is_root(mut self, is_root: bool) -> Self {
		self.options.is_root = is_root;
		self
	}

	pub fn format(mut self, format: impl Into<String>) -> Self {
		self.options.format = Some(format.into());
		self
	}

	pub fn renderers(mut self, renderers: RendererRegistry) -> Self {
		self.options.renderers = Arc::new(renderers);
		self
	}

	pub fn parsers(mut self, parsers: ParserRegistry) -> Self {
		self.options.parsers = Arc::new(parsers);
		self
	}

	pub fn kind(mut self, kind: Arc<dyn SerializerKind>) -> Self {
		self.kind = kind;
		self
	}

	/// Replaces object construction during reversion.
	pub fn restore_with<F>(mut self, restore: F) -> Self
	where
		F: Fn(IndexMap<String, Value>, Option<ObjectRef>) -> SerializationResult<Value>
			+ Send
			+ Sync
			+ 'static,
	{
		self.restore = Some(Arc::new(restore));
		self
	}

	pub fn build(self) -> Serializer {
		let mut declared = self.declared;
		declared.sort_by_key(|(_, field)| field.core().creation_order());
		let mut fields = self.inherited;
		fields.extend(declared);
		Serializer {
			core: self.core,
			fields: Arc::new(fields),
			options: Arc::new(self.options),
			kind: self.kind,
			restore: self.restore,
			template: None,
		}
	}
}

/// Serializers over plain objects: every public attribute is a field.
pub struct ObjectSerializer;

#[allow(clippy::new_ret_no_self)]
impl ObjectSerializer {
	pub fn new() -> Serializer {
		Self::builder().build()
	}

	pub fn builder() -> SerializerBuilder {
		Serializer::builder().kind(Arc::new(ObjectAttributes))
	}
}

/// Serializers over model instances.
pub struct ModelSerializer;

impl ModelSerializer {
	/// Fields come from the metadata of whatever model is converted.
	pub fn builder() -> SerializerBuilder {
		Self::with_kind(ModelFields::new(None))
	}

	/// Bound to `model`, which reversion constructs.
	pub fn for_model(model: Arc<dyn ModelType>) -> SerializerBuilder {
		Self::with_kind(ModelFields::new(Some(model)))
	}

	/// Bound to a configured [`ModelFields`] policy.
	pub fn with_kind(kind: ModelFields) -> SerializerBuilder {
		Serializer::builder().kind(Arc::new(kind))
	}
}

/// Serializers producing Django `dumpdata` fixtures:
/// `{"pk": .., "model": "app.model", "fields": {..}}` per object.
pub struct FixtureSerializer;

#[allow(clippy::new_ret_no_self)]
impl FixtureSerializer {
	pub fn new() -> Serializer {
		Self::builder().build()
	}

	/// Bound to one of the fixture formats.
	pub fn with_format(format: &str) -> Serializer {
		Self::builder().format(format).build()
	}

	pub fn builder() -> SerializerBuilder {
		Serializer::builder()
			.field("pk", Field::new())
			.field("model", ModelNameField::new())
			.field(
				"fields",
				Serializer::builder()
					.kind(Arc::new(FixtureFields))
					.is_root(true)
					.build(),
			)
			.include_default_fields(false)
			.kind(Arc::new(FixtureEnvelope))
			.renderers(RendererRegistry::dumpdata())
			.parsers(ParserRegistry::dumpdata())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::object::{Object, PlainObject};
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn pair() -> Value {
		Value::object(PlainObject::new("Pair").with("a", 1i64).with("b", "foo"))
	}

	fn convert(serializer: &Serializer, obj: Value, options: &SerializeOptions) -> Primitive {
		serializer.convert(obj, options).unwrap().materialize().unwrap()
	}

	#[rstest]
	fn test_declared_fields_follow_creation_order(pair: Value) {
		let a = Field::new();
		let b = Field::new();
		let serializer = Serializer::builder().field("b", b).field("a", a).build();
		let keys: Vec<_> = serializer.declared_fields().keys().cloned().collect();
		assert_eq!(keys, vec!["a", "b"]);
		assert_eq!(
			convert(&serializer, pair, &SerializeOptions::new()),
			Primitive::from(json!({"a": 1, "b": "foo"}))
		);
	}

	#[rstest]
	fn test_inherited_fields_come_first() {
		let base = Serializer::builder().field("z", Field::new()).build();
		let child = Serializer::builder().field("a", Field::new()).inherit(&base).build();
		let keys: Vec<_> = child.declared_fields().keys().cloned().collect();
		assert_eq!(keys, vec!["z", "a"]);
	}

	#[rstest]
	fn test_call_overrides_do_not_touch_the_template(pair: Value) {
		let serializer = ObjectSerializer::new();
		let reordered = convert(
			&serializer,
			pair.clone(),
			&SerializeOptions::new().with_fields(["b", "a"]),
		);
		assert_eq!(
			reordered.as_map().unwrap().keys().collect::<Vec<_>>(),
			vec!["b", "a"]
		);
		assert_eq!(
			convert(&serializer, pair, &SerializeOptions::new()),
			Primitive::from(json!({"a": 1, "b": "foo"}))
		);
	}

	#[rstest]
	fn test_labels_replace_output_keys(pair: Value) {
		let serializer = ObjectSerializer::builder()
			.field("a", Field::label("first"))
			.build();
		assert_eq!(
			convert(&serializer, pair, &SerializeOptions::new()),
			Primitive::from(json!({"first": 1, "b": "foo"}))
		);
	}

	#[rstest]
	fn test_allow_list_creates_missing_fields() {
		let obj = Value::object(PlainObject::new("Pair").with("_hidden", "x"));
		let serializer = ObjectSerializer::builder().fields(["_hidden"]).build();
		assert_eq!(
			convert(&serializer, obj, &SerializeOptions::new()),
			Primitive::from(json!({"_hidden": "x"}))
		);
	}

	#[rstest]
	fn test_cycle_falls_back_to_flat_value() {
		let x = Arc::new(PlainObject::new("Node").with("name", "x").with_display(|_| "x".to_string()));
		let y = Arc::new(
			PlainObject::new("Node")
				.with("name", "y")
				.with("ref", x.clone()),
		);
		x.set_attribute("ref", Value::from(y)).unwrap();

		let data = convert(
			&ObjectSerializer::new(),
			Value::from(x),
			&SerializeOptions::new().with_nested(true),
		);
		assert_eq!(
			data,
			Primitive::from(json!({"name": "x", "ref": {"name": "y", "ref": "x"}}))
		);
	}

	#[rstest]
	fn test_depth_budget_collapses_to_display_text() {
		let leaf = Arc::new(PlainObject::new("Node").with("name", "leaf").with_display(|_| "leaf".to_string()));
		let middle = Arc::new(
			PlainObject::new("Node")
				.with("name", "middle")
				.with("child", leaf)
				.with_display(|_| "middle".to_string()),
		);
		let top = Value::object(PlainObject::new("Node").with("name", "top").with("child", middle));

		let data = convert(
			&ObjectSerializer::new(),
			top,
			&SerializeOptions::new().with_nested(1u32),
		);
		assert_eq!(
			data,
			Primitive::from(json!({"name": "top", "child": {"name": "middle", "child": "leaf"}}))
		);
	}

	#[rstest]
	fn test_revert_is_sparse_for_plain_serializers() {
		let serializer = Serializer::builder()
			.field("a", Field::new())
			.field("b", Field::new())
			.build();
		let restored = serializer
			.deserialize(Primitive::from(json!({"a": 1})), None, &DeserializeOptions::new())
			.unwrap()
			.one()
			.unwrap();
		let map = restored.object.as_map().unwrap();
		assert_eq!(map.get("a"), Some(&Value::from(1i64)));
		assert!(!map.contains_key("b"));
	}

	#[rstest]
	fn test_restore_closure_receives_instance() {
		let target: ObjectRef = Arc::new(PlainObject::new("Pair").with("a", 0i64));
		let serializer = Serializer::builder()
			.field("a", Field::new())
			.restore_with(|attrs, instance| {
				let instance = instance.ok_or_else(|| {
					SerializationError::Deserialization("no instance".to_string())
				})?;
				for (name, value) in attrs {
					instance.set_attribute(&name, value)?;
				}
				Ok(Value::Object(instance))
			})
			.build();
		let restored = serializer
			.deserialize(
				Primitive::from(json!({"a": 5})),
				None,
				&DeserializeOptions::new().with_instance(target.clone()),
			)
			.unwrap()
			.one()
			.unwrap();
		assert_eq!(restored.object, Value::Object(target.clone()));
		assert_eq!(target.attribute("a"), Some(Value::from(5i64)));
	}

	#[rstest]
	fn test_text_input_without_format_is_rejected() {
		let err = Serializer::builder()
			.build()
			.deserialize("{}", None, &DeserializeOptions::new())
			.unwrap_err();
		assert!(matches!(err, SerializationError::Parse(_)));
	}
}
