//! Model metadata, model types and an in-memory model implementation.

pub mod memory;
pub mod meta;
pub mod registry;

pub use memory::{ModelClass, ModelClassBuilder, ModelInstance};
pub use meta::{
	FieldDescriptor, ModelFieldType, ModelMeta, ModelMetaBuilder, Relation, RelationKind,
	ReverseRelation,
};
pub use registry::{ModelRegistry, ModelType, NaturalKeyLookup};
