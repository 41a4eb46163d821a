//! Model metadata: the field, relation and inheritance layout of a model.

use std::sync::Arc;

/// Storage type of a model field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelFieldType {
	Auto,
	Boolean,
	Char { max_length: Option<usize> },
	Text,
	Date,
	DateTime,
	Integer,
	PositiveInteger,
	Decimal,
	Float,
	ForeignKey,
	OneToOne,
	ManyToMany,
}

impl ModelFieldType {
	/// The field class name written to dumpdata XML `type` attributes.
	pub fn internal_type(&self) -> &'static str {
		match self {
			ModelFieldType::Auto => "AutoField",
			ModelFieldType::Boolean => "BooleanField",
			ModelFieldType::Char { .. } => "CharField",
			ModelFieldType::Text => "TextField",
			ModelFieldType::Date => "DateField",
			ModelFieldType::DateTime => "DateTimeField",
			ModelFieldType::Integer => "IntegerField",
			ModelFieldType::PositiveInteger => "PositiveIntegerField",
			ModelFieldType::Decimal => "DecimalField",
			ModelFieldType::Float => "FloatField",
			ModelFieldType::ForeignKey => "ForeignKey",
			ModelFieldType::OneToOne => "OneToOneField",
			ModelFieldType::ManyToMany => "ManyToManyField",
		}
	}
}

/// Direction and cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
	ManyToOne,
	OneToOne,
	ManyToMany,
	OneToMany,
}

/// The far side of a relation field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
	pub kind: RelationKind,
	/// Label (`app.model`) of the related model.
	pub to: String,
	/// False for many-to-many relations declared with an explicit through model.
	pub through_auto_created: bool,
}

impl Relation {
	pub fn new(kind: RelationKind, to: impl Into<String>) -> Self {
		Self {
			kind,
			to: to.into().to_lowercase(),
			through_auto_created: true,
		}
	}

	/// The relation class name written to dumpdata XML `rel` attributes.
	pub fn rel_name(&self) -> &'static str {
		match self.kind {
			RelationKind::ManyToOne | RelationKind::OneToMany => "ManyToOneRel",
			RelationKind::OneToOne => "OneToOneRel",
			RelationKind::ManyToMany => "ManyToManyRel",
		}
	}
}

/// Description of one model field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
	pub name: String,
	pub field_type: ModelFieldType,
	/// Whether the field takes part in default serialization.
	pub serialize: bool,
	pub primary_key: bool,
	/// True for the one-to-one link a child model holds to its parent.
	pub parent_link: bool,
	pub relation: Option<Relation>,
}

impl FieldDescriptor {
	pub fn new(name: impl Into<String>, field_type: ModelFieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			serialize: true,
			primary_key: false,
			parent_link: false,
			relation: None,
		}
	}

	/// An auto-incrementing primary key.
	pub fn auto(name: impl Into<String>) -> Self {
		Self::new(name, ModelFieldType::Auto).primary_key()
	}

	pub fn boolean(name: impl Into<String>) -> Self {
		Self::new(name, ModelFieldType::Boolean)
	}

	pub fn char(name: impl Into<String>, max_length: usize) -> Self {
		Self::new(
			name,
			ModelFieldType::Char {
				max_length: Some(max_length),
			},
		)
	}

	pub fn text(name: impl Into<String>) -> Self {
		Self::new(name, ModelFieldType::Text)
	}

	pub fn date(name: impl Into<String>) -> Self {
		Self::new(name, ModelFieldType::Date)
	}

	pub fn datetime(name: impl Into<String>) -> Self {
		Self::new(name, ModelFieldType::DateTime)
	}

	pub fn integer(name: impl Into<String>) -> Self {
		Self::new(name, ModelFieldType::Integer)
	}

	pub fn positive_integer(name: impl Into<String>) -> Self {
		Self::new(name, ModelFieldType::PositiveInteger)
	}

	pub fn decimal(name: impl Into<String>) -> Self {
		Self::new(name, ModelFieldType::Decimal)
	}

	pub fn float(name: impl Into<String>) -> Self {
		Self::new(name, ModelFieldType::Float)
	}

	pub fn foreign_key(name: impl Into<String>, to: impl Into<String>) -> Self {
		Self::new(name, ModelFieldType::ForeignKey)
			.with_relation(Relation::new(RelationKind::ManyToOne, to))
	}

	pub fn one_to_one(name: impl Into<String>, to: impl Into<String>) -> Self {
		Self::new(name, ModelFieldType::OneToOne)
			.with_relation(Relation::new(RelationKind::OneToOne, to))
	}

	pub fn many_to_many(name: impl Into<String>, to: impl Into<String>) -> Self {
		Self::new(name, ModelFieldType::ManyToMany)
			.with_relation(Relation::new(RelationKind::ManyToMany, to))
	}

	/// Marks the field as the primary key. Primary keys are never serialized
	/// as ordinary fields.
	pub fn primary_key(mut self) -> Self {
		self.primary_key = true;
		self.serialize = false;
		self
	}

	pub fn with_serialize(mut self, serialize: bool) -> Self {
		self.serialize = serialize;
		self
	}

	pub fn with_relation(mut self, relation: Relation) -> Self {
		self.relation = Some(relation);
		self
	}

	/// Declares whether a many-to-many relation uses an auto-created through table.
	pub fn with_through(mut self, auto_created: bool) -> Self {
		if let Some(relation) = self.relation.as_mut() {
			relation.through_auto_created = auto_created;
		}
		self
	}

	/// Name of the stored column: `<name>_id` for foreign keys and one-to-one
	/// links, the field name otherwise.
	pub fn attname(&self) -> String {
		match self.field_type {
			ModelFieldType::ForeignKey | ModelFieldType::OneToOne => format!("{}_id", self.name),
			_ => self.name.clone(),
		}
	}

	pub fn is_relation(&self) -> bool {
		self.relation.is_some()
	}

	pub fn is_many_to_many(&self) -> bool {
		matches!(self.field_type, ModelFieldType::ManyToMany)
	}
}

/// A relation declared on another model that points at this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseRelation {
	/// Accessor name on this model, e.g. `vehicles`.
	pub name: String,
	/// Label of the model holding the foreign key.
	pub model: String,
	/// Name of the foreign key field on that model.
	pub field: String,
	/// True for the reverse side of a one-to-one field.
	pub unique: bool,
}

impl ReverseRelation {
	/// Reverse side of a foreign key: many related objects.
	pub fn many(name: impl Into<String>, model: impl Into<String>, field: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			model: model.into().to_lowercase(),
			field: field.into(),
			unique: false,
		}
	}

	/// Reverse side of a one-to-one field: at most one related object.
	pub fn one(name: impl Into<String>, model: impl Into<String>, field: impl Into<String>) -> Self {
		Self {
			unique: true,
			..Self::many(name, model, field)
		}
	}
}

/// Metadata for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMeta {
	app_label: String,
	object_name: String,
	local_fields: Vec<FieldDescriptor>,
	local_many_to_many: Vec<FieldDescriptor>,
	reverse: Vec<ReverseRelation>,
	parent: Option<Arc<ModelMeta>>,
}

impl ModelMeta {
	/// Starts building metadata for `app_label.ObjectName`.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_serializers::{FieldDescriptor, ModelMeta};
	///
	/// let meta = ModelMeta::builder("races", "RaceEntry")
	/// 	.field(FieldDescriptor::char("name", 100))
	/// 	.build();
	/// assert_eq!(meta.label(), "races.raceentry");
	/// assert_eq!(meta.pk_field().name, "id");
	/// ```
	pub fn builder(app_label: impl Into<String>, object_name: impl Into<String>) -> ModelMetaBuilder {
		ModelMetaBuilder {
			app_label: app_label.into(),
			object_name: object_name.into(),
			fields: Vec::new(),
			many_to_many: Vec::new(),
			reverse: Vec::new(),
			parent: None,
		}
	}

	pub fn app_label(&self) -> &str {
		&self.app_label
	}

	pub fn object_name(&self) -> &str {
		&self.object_name
	}

	/// Lowercase `app_label.modelname`.
	pub fn label(&self) -> String {
		format!("{}.{}", self.app_label, self.object_name.to_lowercase())
	}

	pub fn parent(&self) -> Option<&Arc<ModelMeta>> {
		self.parent.as_ref()
	}

	/// Fields stored on this model's own table.
	pub fn local_fields(&self) -> &[FieldDescriptor] {
		&self.local_fields
	}

	/// All concrete fields, inherited ones first.
	pub fn fields(&self) -> Vec<&FieldDescriptor> {
		let mut fields = self
			.parent
			.as_deref()
			.map(ModelMeta::fields)
			.unwrap_or_default();
		fields.extend(self.local_fields.iter());
		fields
	}

	/// All many-to-many fields, inherited ones first.
	pub fn many_to_many(&self) -> Vec<&FieldDescriptor> {
		let mut fields = self
			.parent
			.as_deref()
			.map(ModelMeta::many_to_many)
			.unwrap_or_default();
		fields.extend(self.local_many_to_many.iter());
		fields
	}

	pub fn reverse_relations(&self) -> &[ReverseRelation] {
		&self.reverse
	}

	/// This model's primary key field.
	pub fn pk_field(&self) -> &FieldDescriptor {
		self.local_fields
			.iter()
			.find(|field| field.primary_key)
			.unwrap_or(&self.local_fields[0])
	}

	/// The primary key, following parent links down to the original one.
	pub fn root_pk(&self) -> &FieldDescriptor {
		let pk = self.pk_field();
		match &self.parent {
			Some(parent) if pk.parent_link => parent.root_pk(),
			_ => pk,
		}
	}

	/// Attnames of the primary key chain, from this model to the root.
	pub fn pk_chain(&self) -> Vec<String> {
		let mut chain = vec![self.pk_field().attname()];
		if let Some(parent) = &self.parent
			&& self.pk_field().parent_link
		{
			chain.extend(parent.pk_chain());
		}
		chain
	}

	/// Looks up a concrete or many-to-many field. `pk` names the primary key.
	pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
		if name == "pk" {
			return Some(self.pk_field());
		}
		self.local_fields
			.iter()
			.chain(self.local_many_to_many.iter())
			.find(|field| field.name == name)
			.or_else(|| self.parent.as_deref().and_then(|p| p.descriptor(name)))
	}

	/// Looks up a concrete field by its stored column name.
	pub fn descriptor_by_attname(&self, attname: &str) -> Option<&FieldDescriptor> {
		self.fields()
			.into_iter()
			.find(|field| field.attname() == attname)
	}

	pub fn reverse_relation(&self, name: &str) -> Option<&ReverseRelation> {
		self.reverse
			.iter()
			.find(|rel| rel.name == name)
			.or_else(|| self.parent.as_deref().and_then(|p| p.reverse_relation(name)))
	}
}

/// Builder for [`ModelMeta`].
#[derive(Debug)]
pub struct ModelMetaBuilder {
	app_label: String,
	object_name: String,
	fields: Vec<FieldDescriptor>,
	many_to_many: Vec<FieldDescriptor>,
	reverse: Vec<ReverseRelation>,
	parent: Option<Arc<ModelMeta>>,
}

impl ModelMetaBuilder {
	/// Adds a field. Many-to-many fields are kept apart from concrete ones.
	pub fn field(mut self, field: FieldDescriptor) -> Self {
		if field.is_many_to_many() {
			self.many_to_many.push(field);
		} else {
			self.fields.push(field);
		}
		self
	}

	/// Declares a reverse accessor for a relation defined on another model.
	pub fn reverse(mut self, relation: ReverseRelation) -> Self {
		self.reverse.push(relation);
		self
	}

	/// Inherits from `parent` through a `<parent>_ptr` one-to-one link.
	pub fn parent(mut self, parent: Arc<ModelMeta>) -> Self {
		self.parent = Some(parent);
		self
	}

	/// Finishes the metadata, adding the implicit primary key when none was declared.
	pub fn build(self) -> Arc<ModelMeta> {
		let mut local_fields = self.fields;
		if !local_fields.iter().any(|field| field.primary_key) {
			let pk = match &self.parent {
				Some(parent) => {
					let mut ptr = FieldDescriptor::one_to_one(
						format!("{}_ptr", parent.object_name().to_lowercase()),
						parent.label(),
					)
					.primary_key();
					ptr.parent_link = true;
					ptr
				}
				None => FieldDescriptor::auto("id"),
			};
			local_fields.insert(0, pk);
		}
		Arc::new(ModelMeta {
			app_label: self.app_label,
			object_name: self.object_name,
			local_fields,
			local_many_to_many: self.many_to_many,
			reverse: self.reverse,
			parent: self.parent,
		})
	}
}
