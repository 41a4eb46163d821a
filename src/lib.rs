//! # Reinhardt Serialization
//!
//! Declarative serializers for Rust objects and models, inspired by Django's
//! serialization framework.
//!
//! This crate is a facade over the serialization crates of the workspace:
//!
//! - [`primitives`] - the primitive tree every serializer converts into, and
//!   the shared error types
//! - [`formats`] - renderers and parsers for JSON, YAML, XML, dumpdata XML,
//!   CSV and HTML
//! - [`serializers`] - object, model and fixture serializers
//!
//! ## Feature Flags
//!
//! - `yaml` (default) - YAML rendering and parsing via `serde_yaml`
//!
//! ## Quick Example
//!
//! ```rust
//! use reinhardt_serialization::prelude::*;
//!
//! let registry = std::sync::Arc::new(ModelRegistry::new());
//! let entries = ModelClass::builder(
//! 	ModelMeta::builder("races", "RaceEntry")
//! 		.field(FieldDescriptor::char("name", 100))
//! 		.field(FieldDescriptor::positive_integer("runner_number"))
//! 		.build(),
//! )
//! .register(&registry);
//! entries
//! 	.create([("name", Value::from("John doe")), ("runner_number", Value::from(6014i64))])
//! 	.unwrap();
//!
//! let fixture = serialize(
//! 	"json",
//! 	entries.all_objects(),
//! 	&FixtureSerializer::new(),
//! 	&SerializeOptions::new(),
//! )
//! .unwrap();
//! assert_eq!(
//! 	fixture.as_str(),
//! 	Some(r#"[{"pk": 1, "model": "races.raceentry", "fields": {"name": "John doe", "runner_number": 6014}}]"#)
//! );
//! ```

pub use reinhardt_formats as formats;
pub use reinhardt_primitives as primitives;
pub use reinhardt_serializers as serializers;

pub use reinhardt_serializers::{
	DeserializeOptions, FixtureSerializer, ModelSerializer, ObjectSerializer, SerializationError,
	SerializationResult, SerializeOptions, Serializer, deserialize, deserialize_file, serialize,
	serialize_to_file, serialize_to_writer,
};

/// Re-exports for the common case.
pub mod prelude {
	// Serializers
	pub use reinhardt_serializers::{
		FixtureSerializer, ModelSerializer, ObjectSerializer, Serializer, SerializerBuilder,
	};

	// Fields
	pub use reinhardt_serializers::{
		BooleanField, CharField, DateField, DateTimeField, DecimalField, Field, FloatField,
		IntegerField, NaturalKeyRelatedField, PrimaryKeyOrNaturalKeyRelatedField,
		PrimaryKeyRelatedField, SerializerField,
	};

	// Objects and models
	pub use reinhardt_serializers::{
		FieldDescriptor, ModelClass, ModelMeta, ModelRegistry, ModelType, Object, ObjectRef,
		PlainObject, ReverseRelation, Value,
	};

	// Calls
	pub use reinhardt_serializers::{
		DeserializeOptions, Deserialized, DeserializedObject, Nested, SerializeOptions, Settings,
		deserialize, deserialize_file, serialize, serialize_to_file, serialize_to_writer,
	};

	// Errors
	pub use reinhardt_serializers::{
		SerializationError, SerializationResult, ValidationError, ValidationErrors,
	};
}
