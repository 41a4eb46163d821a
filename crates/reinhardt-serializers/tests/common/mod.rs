//! Shared objects and model registries for the integration tests.
//!
//! Every fixture builds its own [`ModelRegistry`] so tests never share
//! stored instances or primary key counters.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use parking_lot::RwLock;
use reinhardt_serializers::{
	FieldDescriptor, ModelClass, ModelMeta, ModelRegistry, Object, ObjectRef,
	ReverseRelation, SerializationResult, Value,
};
use rstest::fixture;

pub fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
	NaiveDate::from_ymd_opt(y, m, d)
		.and_then(|date| date.and_hms_opt(h, min, 0))
		.unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
	NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A person with computed attributes.
///
/// `full_name` and `is_child` are readable but not listed, like properties
/// and methods on a class. Extra attributes are listed after the declared
/// ones in the order they were set.
#[derive(Debug)]
pub struct Person {
	first_name: String,
	last_name: String,
	age: i64,
	extra: RwLock<IndexMap<String, Value>>,
}

impl Person {
	pub const CHILD_AGE: i64 = 16;

	pub fn new(first_name: &str, last_name: &str, age: i64) -> Self {
		Self {
			first_name: first_name.to_string(),
			last_name: last_name.to_string(),
			age,
			extra: RwLock::new(IndexMap::new()),
		}
	}

	pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
		self.extra.write().insert(name.to_string(), value.into());
		self
	}

	pub fn full_name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name)
	}
}

impl Object for Person {
	fn type_name(&self) -> &str {
		"Person"
	}

	fn attribute(&self, name: &str) -> Option<Value> {
		match name {
			"first_name" => Some(Value::from(self.first_name.as_str())),
			"last_name" => Some(Value::from(self.last_name.as_str())),
			"age" => Some(Value::from(self.age)),
			"full_name" => Some(Value::from(self.full_name())),
			"is_child" => {
				let age = self.age;
				Some(Value::callable(move || Value::from(age < Person::CHILD_AGE)))
			}
			other => self.extra.read().get(other).cloned(),
		}
	}

	fn attribute_names(&self) -> Vec<String> {
		let mut names = vec![
			"first_name".to_string(),
			"last_name".to_string(),
			"age".to_string(),
		];
		names.extend(self.extra.read().keys().cloned());
		names
	}

	fn to_display(&self) -> String {
		self.full_name()
	}

	fn set_attribute(&self, name: &str, value: Value) -> SerializationResult<()> {
		self.extra.write().insert(name.to_string(), value);
		Ok(())
	}
}

pub fn person(first_name: &str, last_name: &str, age: i64) -> Arc<Person> {
	Arc::new(Person::new(first_name, last_name, age))
}

pub fn objects<T: Object + 'static>(items: Vec<Arc<T>>) -> Value {
	Value::List(
		items
			.into_iter()
			.map(|item| Value::Object(item as ObjectRef))
			.collect(),
	)
}

fn attrs<const N: usize>(pairs: [(&str, Value); N]) -> Vec<(String, Value)> {
	pairs
		.into_iter()
		.map(|(name, value)| (name.to_string(), value))
		.collect()
}

/// Race entries: a flat model without relations.
pub struct Races {
	pub registry: Arc<ModelRegistry>,
	pub entries: Arc<ModelClass>,
}

pub fn race_entry_meta() -> Arc<ModelMeta> {
	ModelMeta::builder("races", "RaceEntry")
		.field(FieldDescriptor::char("name", 100))
		.field(FieldDescriptor::positive_integer("runner_number"))
		.field(FieldDescriptor::datetime("start_time"))
		.field(FieldDescriptor::datetime("finish_time"))
		.build()
}

pub fn race_entry_attrs() -> Vec<(String, Value)> {
	attrs([
		("name", Value::from("John doe")),
		("runner_number", Value::from(6014i64)),
		("start_time", Value::from(datetime(2012, 4, 30, 9, 0))),
		("finish_time", Value::from(datetime(2012, 4, 30, 12, 25))),
	])
}

#[fixture]
pub fn races() -> Races {
	let registry = Arc::new(ModelRegistry::new());
	let entries = ModelClass::builder(race_entry_meta()).register(&registry);
	entries.create(race_entry_attrs()).unwrap();
	Races { registry, entries }
}

/// Multi-table inheritance: `PremiumAccount` extends `Account`.
pub struct Bank {
	pub registry: Arc<ModelRegistry>,
	pub accounts: Arc<ModelClass>,
	pub premium: Arc<ModelClass>,
}

#[fixture]
pub fn bank() -> Bank {
	let registry = Arc::new(ModelRegistry::new());
	let account = ModelMeta::builder("bank", "Account")
		.field(FieldDescriptor::positive_integer("points"))
		.field(FieldDescriptor::char("company", 100))
		.build();
	let premium_meta = ModelMeta::builder("bank", "PremiumAccount")
		.parent(account.clone())
		.field(FieldDescriptor::datetime("date_upgraded"))
		.build();
	let accounts = ModelClass::builder(account).register(&registry);
	let premium = ModelClass::builder(premium_meta).register(&registry);
	premium
		.create(attrs([
			("points", Value::from(42i64)),
			("company", Value::from("Foozle Inc.")),
			("date_upgraded", Value::from(datetime(2012, 4, 30, 9, 0))),
		]))
		.unwrap();
	Bank {
		registry,
		accounts,
		premium,
	}
}

/// Natural keys: owners are keyed by name, pets by their own name.
pub struct Pets {
	pub registry: Arc<ModelRegistry>,
	pub owners: Arc<ModelClass>,
	pub pets: Arc<ModelClass>,
}

#[fixture]
pub fn pets() -> Pets {
	let registry = Arc::new(ModelRegistry::new());
	let owners = ModelClass::builder(
		ModelMeta::builder("pets", "PetOwner")
			.field(FieldDescriptor::char("first_name", 100))
			.field(FieldDescriptor::char("last_name", 100))
			.field(FieldDescriptor::date("birthdate"))
			.reverse(ReverseRelation::many("pets", "pets.Pet", "owner"))
			.build(),
	)
	.natural_key(["first_name", "last_name"])
	.register(&registry);
	let pets = ModelClass::builder(
		ModelMeta::builder("pets", "Pet")
			.field(FieldDescriptor::char("name", 100))
			.field(FieldDescriptor::foreign_key("owner", "pets.PetOwner"))
			.build(),
	)
	.natural_key(["name"])
	.register(&registry);

	let joe = owners
		.create(attrs([
			("first_name", Value::from("joe")),
			("last_name", Value::from("adams")),
			("birthdate", Value::from(date(1965, 8, 27))),
		]))
		.unwrap();
	for name in ["splash gordon", "frogger"] {
		pets.create(attrs([
			("owner", Value::Object(joe.clone())),
			("name", Value::from(name)),
		]))
		.unwrap();
	}
	Pets {
		registry,
		owners,
		pets,
	}
}

/// One-to-one: every user has one profile.
pub struct Users {
	pub registry: Arc<ModelRegistry>,
	pub users: Arc<ModelClass>,
	pub profiles: Arc<ModelClass>,
}

#[fixture]
pub fn users() -> Users {
	let registry = Arc::new(ModelRegistry::new());
	let users = ModelClass::builder(
		ModelMeta::builder("accounts", "User")
			.field(FieldDescriptor::char("email", 75))
			.reverse(ReverseRelation::one("profile", "accounts.Profile", "user"))
			.build(),
	)
	.register(&registry);
	let profiles = ModelClass::builder(
		ModelMeta::builder("accounts", "Profile")
			.field(FieldDescriptor::one_to_one("user", "accounts.User"))
			.field(FieldDescriptor::char("country_of_birth", 100))
			.field(FieldDescriptor::datetime("date_of_birth"))
			.build(),
	)
	.register(&registry);
	let user = users
		.create(attrs([("email", Value::from("joe@example.com"))]))
		.unwrap();
	profiles
		.create(attrs([
			("user", Value::Object(user)),
			("country_of_birth", Value::from("UK")),
			("date_of_birth", Value::from(datetime(1979, 4, 5, 0, 0))),
		]))
		.unwrap();
	Users {
		registry,
		users,
		profiles,
	}
}

/// Foreign keys: an owner with two vehicles.
pub struct Garage {
	pub registry: Arc<ModelRegistry>,
	pub owners: Arc<ModelClass>,
	pub vehicles: Arc<ModelClass>,
}

#[fixture]
pub fn garage() -> Garage {
	let registry = Arc::new(ModelRegistry::new());
	let owners = ModelClass::builder(
		ModelMeta::builder("garage", "Owner")
			.field(FieldDescriptor::char("email", 75))
			.reverse(ReverseRelation::many("vehicles", "garage.Vehicle", "owner"))
			.build(),
	)
	.register(&registry);
	let vehicles = ModelClass::builder(
		ModelMeta::builder("garage", "Vehicle")
			.field(FieldDescriptor::foreign_key("owner", "garage.Owner"))
			.field(FieldDescriptor::char("licence", 20))
			.field(FieldDescriptor::date("date_of_manufacture"))
			.build(),
	)
	.register(&registry);
	let tom = owners
		.create(attrs([("email", Value::from("tom@example.com"))]))
		.unwrap();
	for (licence, made) in [("DJANGO42", date(2005, 6, 6)), ("", date(1990, 8, 8))] {
		vehicles
			.create(attrs([
				("owner", Value::Object(tom.clone())),
				("licence", Value::from(licence)),
				("date_of_manufacture", Value::from(made)),
			]))
			.unwrap();
	}
	Garage {
		registry,
		owners,
		vehicles,
	}
}

/// Many-to-many: books written by several authors.
pub struct Library {
	pub registry: Arc<ModelRegistry>,
	pub authors: Arc<ModelClass>,
	pub books: Arc<ModelClass>,
}

#[fixture]
pub fn library() -> Library {
	let registry = Arc::new(ModelRegistry::new());
	let authors = ModelClass::builder(
		ModelMeta::builder("library", "Author")
			.field(FieldDescriptor::char("name", 100))
			.build(),
	)
	.register(&registry);
	let books = ModelClass::builder(
		ModelMeta::builder("library", "Book")
			.field(FieldDescriptor::many_to_many("authors", "library.Author"))
			.field(FieldDescriptor::char("title", 100))
			.field(FieldDescriptor::boolean("in_stock"))
			.build(),
	)
	.register(&registry);
	let lucy = authors
		.create(attrs([("name", Value::from("Lucy Black"))]))
		.unwrap();
	let mark = authors
		.create(attrs([("name", Value::from("Mark Green"))]))
		.unwrap();
	books
		.create(attrs([
			("title", Value::from("Cooking with gas")),
			("in_stock", Value::from(true)),
			("authors", objects(vec![lucy, mark.clone()])),
		]))
		.unwrap();
	books
		.create(attrs([
			("title", Value::from("Chimera obscura")),
			("in_stock", Value::from(false)),
			("authors", objects(vec![mark])),
		]))
		.unwrap();
	Library {
		registry,
		authors,
		books,
	}
}

/// Many-to-many through an explicit intermediate model.
pub struct Anchors {
	pub registry: Arc<ModelRegistry>,
	pub anchors: Arc<ModelClass>,
	pub holders: Arc<ModelClass>,
}

#[fixture]
pub fn anchors() -> Anchors {
	let registry = Arc::new(ModelRegistry::new());
	let anchors = ModelClass::builder(
		ModelMeta::builder("through", "Anchor")
			.field(FieldDescriptor::char("data", 30))
			.build(),
	)
	.register(&registry);
	let holders = ModelClass::builder(
		ModelMeta::builder("through", "M2MIntermediateData")
			.field(FieldDescriptor::many_to_many("data", "through.Anchor").with_through(false))
			.build(),
	)
	.register(&registry);
	let right = anchors
		.create(attrs([("data", Value::from("foobar"))]))
		.unwrap();
	holders
		.create(attrs([("data", objects(vec![right]))]))
		.unwrap();
	Anchors {
		registry,
		anchors,
		holders,
	}
}

/// Articles with an author and categories, for round trips.
pub struct Newsroom {
	pub registry: Arc<ModelRegistry>,
	pub categories: Arc<ModelClass>,
	pub authors: Arc<ModelClass>,
	pub articles: Arc<ModelClass>,
}

#[fixture]
pub fn newsroom() -> Newsroom {
	let registry = Arc::new(ModelRegistry::new());
	let categories = ModelClass::builder(
		ModelMeta::builder("news", "Category")
			.field(FieldDescriptor::char("name", 20))
			.build(),
	)
	.display_field("name")
	.register(&registry);
	let authors = ModelClass::builder(
		ModelMeta::builder("news", "ArticleAuthor")
			.field(FieldDescriptor::char("name", 20))
			.build(),
	)
	.display_field("name")
	.register(&registry);
	let articles = ModelClass::builder(
		ModelMeta::builder("news", "Article")
			.field(FieldDescriptor::foreign_key("author", "news.ArticleAuthor"))
			.field(FieldDescriptor::char("headline", 50))
			.field(FieldDescriptor::datetime("pub_date"))
			.field(FieldDescriptor::many_to_many("categories", "news.Category"))
			.build(),
	)
	.display_field("headline")
	.register(&registry);

	let category = |name: &str| {
		categories
			.create(attrs([("name", Value::from(name))]))
			.unwrap()
	};
	let sports = category("Sports");
	let music = category("Music");
	let op_ed = category("Op-Ed");
	let author = |name: &str| authors.create(attrs([("name", Value::from(name))])).unwrap();
	let joe = author("Joe");
	let jane = author("Jane");

	articles
		.create(attrs([
			("author", Value::Object(jane)),
			("headline", Value::from("Poker has no place on ESPN")),
			("pub_date", Value::from(datetime(2006, 6, 16, 11, 0))),
			("categories", objects(vec![sports, op_ed.clone()])),
		]))
		.unwrap();
	let reform_date = NaiveDate::from_ymd_opt(2006, 6, 16)
		.and_then(|date| date.and_hms_micro_opt(13, 0, 11, 345))
		.unwrap();
	articles
		.create(attrs([
			("author", Value::Object(joe)),
			("headline", Value::from("Time to reform copyright")),
			("pub_date", Value::from(reform_date)),
			("categories", objects(vec![music, op_ed])),
		]))
		.unwrap();
	Newsroom {
		registry,
		categories,
		authors,
		articles,
	}
}

/// Text primary keys: actors are keyed by name.
pub struct Cinema {
	pub registry: Arc<ModelRegistry>,
	pub actors: Arc<ModelClass>,
	pub movies: Arc<ModelClass>,
}

#[fixture]
pub fn cinema() -> Cinema {
	let registry = Arc::new(ModelRegistry::new());
	let actors = ModelClass::builder(
		ModelMeta::builder("cinema", "Actor")
			.field(FieldDescriptor::char("name", 20).primary_key())
			.build(),
	)
	.register(&registry);
	let movies = ModelClass::builder(
		ModelMeta::builder("cinema", "Movie")
			.field(FieldDescriptor::foreign_key("actor", "cinema.Actor"))
			.field(FieldDescriptor::char("title", 50))
			.field(FieldDescriptor::decimal("price"))
			.build(),
	)
	.register(&registry);
	Cinema {
		registry,
		actors,
		movies,
	}
}

pub fn model_attrs<const N: usize>(pairs: [(&str, Value); N]) -> IndexMap<String, Value> {
	attrs(pairs).into_iter().collect()
}
