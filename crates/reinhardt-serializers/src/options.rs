//! Per-call serialize and deserialize options.

use std::sync::Arc;

use reinhardt_formats::RenderOptions;

use crate::model::ModelRegistry;
use crate::settings::{self, Settings};
use crate::value::ObjectRef;

/// How far related objects expand into nested structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nested {
	/// Related objects collapse to flat values.
	#[default]
	Flat,
	/// Related objects always expand.
	Unbounded,
	/// Related objects expand this many more levels.
	Depth(u32),
}

impl Nested {
	/// Budget one level further down.
	pub fn descend(self) -> Self {
		match self {
			Nested::Depth(depth) => Nested::Depth(depth.saturating_sub(1)),
			other => other,
		}
	}

	pub fn is_nested(self) -> bool {
		match self {
			Nested::Flat => false,
			Nested::Unbounded => true,
			Nested::Depth(depth) => depth > 0,
		}
	}
}

impl From<bool> for Nested {
	fn from(nested: bool) -> Self {
		if nested { Nested::Unbounded } else { Nested::Flat }
	}
}

impl From<u32> for Nested {
	fn from(depth: u32) -> Self {
		Nested::Depth(depth)
	}
}

/// Options for one serialize call.
#[derive(Debug, Clone, Default)]
pub struct SerializeOptions {
	/// Allow-list overriding the serializer's own, in output order.
	pub fields: Option<Vec<String>>,
	/// Deny-list overriding the serializer's own.
	pub exclude: Option<Vec<String>>,
	pub nested: Option<Nested>,
	/// Render relations as natural keys where supported.
	pub use_natural_keys: bool,
	pub indent: Option<usize>,
	pub sort_keys: bool,
	/// Settings for this call; the process-wide settings otherwise.
	pub settings: Option<Settings>,
}

impl SerializeOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_fields<I, S>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.fields = Some(fields.into_iter().map(Into::into).collect());
		self
	}

	pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.exclude = Some(exclude.into_iter().map(Into::into).collect());
		self
	}

	pub fn with_nested(mut self, nested: impl Into<Nested>) -> Self {
		self.nested = Some(nested.into());
		self
	}

	pub fn with_natural_keys(mut self, use_natural_keys: bool) -> Self {
		self.use_natural_keys = use_natural_keys;
		self
	}

	pub fn with_indent(mut self, indent: usize) -> Self {
		self.indent = Some(indent);
		self
	}

	pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
		self.sort_keys = sort_keys;
		self
	}

	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = Some(settings);
		self
	}

	pub(crate) fn render_options(&self) -> RenderOptions {
		let options = RenderOptions::new().with_sort_keys(self.sort_keys);
		match self.indent {
			Some(indent) => options.with_indent(indent),
			None => options,
		}
	}

	pub(crate) fn resolved_settings(&self) -> Arc<Settings> {
		self.settings
			.clone()
			.map_or_else(settings::current, Arc::new)
	}
}

/// Options for one deserialize call.
#[derive(Debug, Clone, Default)]
pub struct DeserializeOptions {
	pub settings: Option<Settings>,
	/// Registry resolving model labels; the global registry otherwise.
	pub registry: Option<Arc<ModelRegistry>>,
	/// Collect every field error instead of failing on the first.
	pub collect_errors: bool,
	/// Existing object to update in place.
	pub instance: Option<ObjectRef>,
}

impl DeserializeOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = Some(settings);
		self
	}

	pub fn with_registry(mut self, registry: Arc<ModelRegistry>) -> Self {
		self.registry = Some(registry);
		self
	}

	pub fn with_collect_errors(mut self, collect_errors: bool) -> Self {
		self.collect_errors = collect_errors;
		self
	}

	pub fn with_instance(mut self, instance: ObjectRef) -> Self {
		self.instance = Some(instance);
		self
	}

	pub(crate) fn resolved_settings(&self) -> Arc<Settings> {
		self.settings
			.clone()
			.map_or_else(settings::current, Arc::new)
	}

	pub(crate) fn resolved_registry(&self) -> Arc<ModelRegistry> {
		self.registry.clone().unwrap_or_else(ModelRegistry::global)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Nested::Flat, Nested::Flat)]
	#[case(Nested::Unbounded, Nested::Unbounded)]
	#[case(Nested::Depth(2), Nested::Depth(1))]
	#[case(Nested::Depth(0), Nested::Depth(0))]
	fn test_descend(#[case] nested: Nested, #[case] expected: Nested) {
		assert_eq!(nested.descend(), expected);
	}

	#[rstest]
	fn test_conversions() {
		assert_eq!(Nested::from(true), Nested::Unbounded);
		assert_eq!(Nested::from(false), Nested::Flat);
		assert!(Nested::from(1u32).is_nested());
		assert!(!Nested::Depth(0).is_nested());
	}

	#[rstest]
	fn test_render_options() {
		let options = SerializeOptions::new().with_indent(2).with_sort_keys(true);
		assert_eq!(
			options.render_options(),
			RenderOptions::new().with_indent(2).with_sort_keys(true)
		);
	}

	#[rstest]
	fn test_call_settings_override_global() {
		let settings = Settings::default().with_use_tz(true);
		let options = SerializeOptions::new().with_settings(settings.clone());
		assert_eq!(*options.resolved_settings(), settings);
	}
}
