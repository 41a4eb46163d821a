//! # Reinhardt Serializers
//!
//! Declarative serializers that convert composite objects into primitive
//! trees and render them through the format adapters of `reinhardt-formats`,
//! and that parse and revert such trees back into objects.
//!
//! ## Overview
//!
//! Serialization runs in two stages. A [`Serializer`] first converts objects
//! into a [`Primitive`](reinhardt_primitives::Primitive) tree, then a
//! renderer writes the tree out as JSON, YAML, XML, CSV or HTML.
//! Deserialization parses input into a tree and reverts it field by field.
//!
//! - [`ObjectSerializer`] serializes any [`Object`] by its public attributes.
//! - [`ModelSerializer`] serializes model instances by their [`ModelMeta`],
//!   with relations as primary keys, natural keys or nested objects.
//! - [`FixtureSerializer`] reads and writes Django `dumpdata` fixtures.
//!
//! Per-call behaviour is controlled by [`SerializeOptions`] and
//! [`DeserializeOptions`]; process-wide timezone handling by [`Settings`].
//!
//! ## Example
//!
//! ```
//! use reinhardt_serializers::{CharField, Field, Serializer, SerializeOptions, PlainObject, Value};
//!
//! let serializer = Serializer::builder()
//! 	.field("title", CharField::new())
//! 	.field("author", Field::label("by"))
//! 	.build();
//! let post = Value::object(PlainObject::new("Post").with("title", "Hello").with("author", "Ann"));
//! let json = serializer
//! 	.serialize(post, Some("json"), &SerializeOptions::new())
//! 	.unwrap();
//! assert_eq!(json.as_str(), Some(r#"{"title": "Hello", "by": "Ann"}"#));
//! ```

pub mod api;
pub mod context;
pub mod deserialized;
pub mod field;
pub mod fields;
pub mod kind;
pub mod model;
pub mod object;
pub mod options;
pub mod related;
pub mod serializer;
pub mod settings;
pub mod value;

pub use api::{
	Input, Serialized, deserialize, deserialize_file, serialize, serialize_to_file,
	serialize_to_writer,
};
pub use context::{ConvertContext, RevertContext};
pub use deserialized::{Deserialized, DeserializedObject};
pub use field::{Field, FieldCore, SerializerField, convert_plain};
pub use fields::{
	BooleanField, CharField, DateField, DateTimeField, DecimalField, FloatField, IntegerField,
	ModelField, ModelNameField, coerce_boolean, coerce_date, coerce_datetime, coerce_decimal,
	coerce_float, coerce_integer, coerce_text, field_for_descriptor,
};
pub use kind::{
	Declared, FieldSet, FixtureEnvelope, FixtureFields, ModelFieldSet, ModelFields,
	ObjectAttributes, SerializerKind, Subject,
};
pub use model::{
	FieldDescriptor, ModelClass, ModelClassBuilder, ModelFieldType, ModelInstance, ModelMeta,
	ModelMetaBuilder, ModelRegistry, ModelType, NaturalKeyLookup, Relation, RelationKind,
	ReverseRelation,
};
pub use object::{Object, PlainObject, get_attribute};
pub use options::{DeserializeOptions, Nested, SerializeOptions};
pub use related::{
	NaturalKeyRelatedField, PrimaryKeyOrNaturalKeyRelatedField, PrimaryKeyRelatedField,
	RelatedFieldKind,
};
pub use serializer::{
	FixtureSerializer, ModelSerializer, ObjectSerializer, RestoreFn, Serializer, SerializerBuilder,
};
pub use settings::{Settings, SettingsError, configure, current};
pub use value::{Accessor, ObjectRef, RelatedKind, RelatedManager, Value, identity};

pub use reinhardt_formats::{Format, ParserRegistry, RenderOptions, RendererRegistry};
pub use reinhardt_primitives::{
	ErrorCode, FieldMeta, Primitive, PrimitiveMap, Scalar, Sequence, SerializationError,
	SerializationResult, ValidationError, ValidationErrors,
};
