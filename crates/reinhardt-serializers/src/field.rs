//! The field contract and the plain [`Field`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use reinhardt_primitives::{Primitive, PrimitiveMap, Sequence, SerializationResult};

use crate::context::{ConvertContext, RevertContext};
use crate::fields::coerce_for_descriptor;
use crate::model::FieldDescriptor;
use crate::object::get_attribute;
use crate::serializer::Serializer;
use crate::value::{ObjectRef, Value};

/// Process-wide declaration counter. Never reset.
static CREATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// State every field carries: its output label and declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCore {
	label: Option<String>,
	creation_order: u64,
}

impl FieldCore {
	/// Takes the next creation index.
	pub fn new() -> Self {
		Self {
			label: None,
			creation_order: CREATION_COUNTER.fetch_add(1, Ordering::Relaxed),
		}
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	/// Output key overriding the declared field name.
	pub fn label(&self) -> Option<&str> {
		self.label.as_deref()
	}

	pub fn creation_order(&self) -> u64 {
		self.creation_order
	}
}

impl Default for FieldCore {
	fn default() -> Self {
		Self::new()
	}
}

/// A named conversion unit between one attribute and one primitive.
///
/// Fields hold no per-call state. The owning object, nesting budget and
/// per-call flags arrive through the [`ConvertContext`] and
/// [`RevertContext`] passed to every method.
pub trait SerializerField: Send + Sync + fmt::Debug {
	fn core(&self) -> &FieldCore;

	/// Reads `name` off `obj` and converts it.
	fn convert_field(
		&self,
		obj: &ObjectRef,
		name: &str,
		ctx: &ConvertContext,
	) -> SerializationResult<Primitive> {
		self.convert(get_attribute(obj, name)?, ctx)
	}

	/// Converts an attribute value into its primitive form.
	fn convert(&self, value: Value, ctx: &ConvertContext) -> SerializationResult<Primitive> {
		let _ = ctx;
		convert_plain(value)
	}

	/// Reverts `data[name]` into `into`. Absent keys leave `into` untouched.
	fn revert_field(
		&self,
		data: &PrimitiveMap,
		name: &str,
		into: &mut IndexMap<String, Value>,
		ctx: &RevertContext,
	) -> SerializationResult<()> {
		if let Some(value) = data.get(name) {
			into.insert(name.to_string(), self.revert(value, ctx)?);
		}
		Ok(())
	}

	/// Reverts one primitive into a native value.
	fn revert(&self, value: &Primitive, ctx: &RevertContext) -> SerializationResult<Value> {
		let _ = ctx;
		Value::from_primitive(value)
	}

	/// Structural hints for format adapters, e.g. `type` or `rel`/`to`.
	fn attributes(&self, descriptor: Option<&FieldDescriptor>) -> Vec<(String, String)> {
		let _ = descriptor;
		Vec::new()
	}

	/// Whether the value produced under `ctx` is a natural key.
	fn is_natural_key(&self, ctx: &ConvertContext) -> bool {
		let _ = ctx;
		false
	}

	/// The composite view of this field, for serializers used as fields.
	fn as_serializer(&self) -> Option<&Serializer> {
		None
	}
}

/// Default conversion of a native value.
///
/// Scalars pass through, accessors are invoked, mappings convert per value,
/// lists and related managers become lazy sequences, and any other object is
/// rendered through its display text.
pub fn convert_plain(value: Value) -> SerializationResult<Primitive> {
	Ok(match value {
		Value::Scalar(scalar) => Primitive::Scalar(scalar),
		Value::Callable(accessor) => return convert_plain(accessor.call()),
		Value::Map(map) => Primitive::Map(
			map.into_iter()
				.map(|(key, value)| Ok((key, convert_plain(value)?)))
				.collect::<SerializationResult<PrimitiveMap>>()?,
		),
		Value::List(items) => Primitive::Seq(Sequence::lazy(items.into_iter().map(convert_plain))),
		Value::Related(manager) => Primitive::Seq(Sequence::lazy(
			manager
				.all()
				.to_vec()
				.into_iter()
				.map(|obj| convert_plain(Value::Object(obj))),
		)),
		Value::Object(obj) => Primitive::from(obj.to_display()),
	})
}

type ConvertFn = Arc<dyn Fn(Value) -> SerializationResult<Primitive> + Send + Sync>;

/// The plain field.
///
/// Converts with [`convert_plain`] unless a custom conversion is given.
/// Reversion is the identity, except that a field matching a model field
/// (`pk`, say) applies that model field's coercion.
#[derive(Clone, Default)]
pub struct Field {
	core: FieldCore,
	convert: Option<ConvertFn>,
}

impl Field {
	pub fn new() -> Self {
		Self::default()
	}

	/// A field whose output key is `label`.
	pub fn label(label: impl Into<String>) -> Self {
		Self {
			core: FieldCore::new().with_label(label),
			convert: None,
		}
	}

	/// Replaces the default conversion.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_primitives::Primitive;
	/// use reinhardt_serializers::{Field, Value};
	///
	/// let upper = Field::new().with_convert(|value: Value| {
	/// 	Ok(Primitive::from(value.as_str().unwrap_or_default().to_uppercase()))
	/// });
	/// # let _ = upper;
	/// ```
	pub fn with_convert<F>(mut self, convert: F) -> Self
	where
		F: Fn(Value) -> SerializationResult<Primitive> + Send + Sync + 'static,
	{
		self.convert = Some(Arc::new(convert));
		self
	}
}

impl fmt::Debug for Field {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Field")
			.field("core", &self.core)
			.field("custom_convert", &self.convert.is_some())
			.finish()
	}
}

impl SerializerField for Field {
	fn core(&self) -> &FieldCore {
		&self.core
	}

	fn convert(&self, value: Value, _ctx: &ConvertContext) -> SerializationResult<Primitive> {
		match &self.convert {
			Some(convert) => convert(value),
			None => convert_plain(value),
		}
	}

	fn revert(&self, value: &Primitive, ctx: &RevertContext) -> SerializationResult<Value> {
		match ctx.descriptor() {
			Some(descriptor) => coerce_for_descriptor(descriptor, value, ctx),
			None => Value::from_primitive(value),
		}
	}
}
