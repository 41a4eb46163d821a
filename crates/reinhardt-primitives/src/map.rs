//! Ordered mappings with per-entry field metadata.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::SerializationResult;
use crate::primitive::Primitive;

/// Structural hints recorded by the field that produced a mapping entry.
///
/// Format adapters that render structure (the dumpdata XML flavour in
/// particular) read these instead of re-inspecting the object graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMeta {
	/// Declaration order of the producing field.
	pub creation_order: u64,
	/// Declared attributes such as `type`, `rel` and `to`.
	pub attributes: Vec<(String, String)>,
	/// True when the value was rendered as a natural key.
	pub natural_key: bool,
}

impl FieldMeta {
	pub fn new(creation_order: u64) -> Self {
		Self {
			creation_order,
			..Self::default()
		}
	}

	pub fn with_attributes(mut self, attributes: Vec<(String, String)>) -> Self {
		self.attributes = attributes;
		self
	}

	pub fn with_natural_key(mut self, natural_key: bool) -> Self {
		self.natural_key = natural_key;
		self
	}

	/// Looks up a declared attribute.
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}
}

#[derive(Debug)]
struct Entry {
	value: Primitive,
	meta: Option<FieldMeta>,
}

/// Insertion-ordered mapping from output key to primitive.
///
/// Equality compares keys and values only; metadata and order are ignored.
#[derive(Debug, Default)]
pub struct PrimitiveMap {
	entries: IndexMap<String, Entry>,
}

impl PrimitiveMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a value without metadata.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Primitive>) {
		self.entries.insert(
			key.into(),
			Entry {
				value: value.into(),
				meta: None,
			},
		);
	}

	/// Inserts a value together with the producing field's metadata.
	pub fn insert_with_meta(
		&mut self,
		key: impl Into<String>,
		value: impl Into<Primitive>,
		meta: FieldMeta,
	) {
		self.entries.insert(
			key.into(),
			Entry {
				value: value.into(),
				meta: Some(meta),
			},
		);
	}

	pub fn get(&self, key: &str) -> Option<&Primitive> {
		self.entries.get(key).map(|entry| &entry.value)
	}

	pub fn meta(&self, key: &str) -> Option<&FieldMeta> {
		self.entries.get(key).and_then(|entry| entry.meta.as_ref())
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	/// Removes an entry, preserving the order of the remaining ones.
	pub fn remove(&mut self, key: &str) -> Option<Primitive> {
		self.entries.shift_remove(key).map(|entry| entry.value)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Primitive)> {
		self.entries
			.iter()
			.map(|(key, entry)| (key.as_str(), &entry.value))
	}

	/// Iterates over entries together with their metadata.
	pub fn iter_with_meta(&self) -> impl Iterator<Item = (&str, &Primitive, Option<&FieldMeta>)> {
		self.entries
			.iter()
			.map(|(key, entry)| (key.as_str(), &entry.value, entry.meta.as_ref()))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn is_materialized(&self) -> bool {
		self.entries
			.values()
			.all(|entry| entry.value.is_materialized())
	}

	/// Forces every lazy sequence held by the mapping.
	pub fn materialize(self) -> SerializationResult<PrimitiveMap> {
		let mut entries = IndexMap::with_capacity(self.entries.len());
		for (key, entry) in self.entries {
			entries.insert(
				key,
				Entry {
					value: entry.value.materialize()?,
					meta: entry.meta,
				},
			);
		}
		Ok(PrimitiveMap { entries })
	}

	/// Keys in lexicographic order.
	pub fn sorted_keys(&self) -> Vec<&str> {
		let mut keys: Vec<&str> = self.keys().collect();
		keys.sort_unstable();
		keys
	}
}

impl PartialEq for PrimitiveMap {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len()
			&& self
				.iter()
				.all(|(key, value)| other.get(key).is_some_and(|theirs| theirs == value))
	}
}

impl Serialize for PrimitiveMap {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.len()))?;
		for (key, value) in self.iter() {
			map.serialize_entry(key, value)?;
		}
		map.end()
	}
}

impl FromIterator<(String, Primitive)> for PrimitiveMap {
	fn from_iter<I: IntoIterator<Item = (String, Primitive)>>(iter: I) -> Self {
		let mut map = PrimitiveMap::new();
		for (key, value) in iter {
			map.insert(key, value);
		}
		map
	}
}
