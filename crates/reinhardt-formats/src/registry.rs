//! Format-name lookup tables for renderers and parsers.

use std::sync::Arc;

use indexmap::IndexMap;
use reinhardt_primitives::{SerializationError, SerializationResult};

use crate::csv_renderer::CsvRenderer;
use crate::dumpdata::{DumpDataXmlParser, DumpDataXmlRenderer};
use crate::html::HtmlRenderer;
use crate::json::{JsonParser, JsonRenderer};
use crate::renderer::{Parser, Renderer};
use crate::xml::XmlRenderer;
#[cfg(feature = "yaml")]
use crate::yaml::{YamlParser, YamlRenderer};

/// The format name that bypasses rendering and parsing entirely.
///
/// Serializing to `python` returns the primitive tree itself; deserializing
/// from it accepts an already parsed tree.
pub const PASSTHROUGH_FORMAT: &str = "python";

/// Format names known to the fixture registries.
pub const FIXTURE_FORMATS: &[&str] = &["json", "yaml", "xml"];

macro_rules! format_registry {
	($name:ident, $trait:ident, $what:literal) => {
		#[doc = concat!("Maps format names to ", $what, "s.")]
		#[derive(Clone)]
		pub struct $name {
			entries: IndexMap<String, Arc<dyn $trait>>,
		}

		impl $name {
			/// Creates an empty registry.
			pub fn empty() -> Self {
				Self {
					entries: IndexMap::new(),
				}
			}

			/// Registers (or replaces) the entry for `format`.
			pub fn register(&mut self, format: impl Into<String>, entry: Arc<dyn $trait>) {
				let format = format.into();
				tracing::trace!(
					kind = $what,
					format = %format,
					media_type = entry.media_type(),
					"registering format"
				);
				self.entries.insert(format, entry);
			}

			/// Builder form of [`Self::register`].
			pub fn with(mut self, format: impl Into<String>, entry: Arc<dyn $trait>) -> Self {
				self.register(format, entry);
				self
			}

			/// Looks up the entry for `format`.
			pub fn get(&self, format: &str) -> SerializationResult<Arc<dyn $trait>> {
				self.entries.get(format).cloned().ok_or_else(|| {
					tracing::debug!(
						kind = $what,
						format,
						known = ?self.entries.keys().collect::<Vec<_>>(),
						"unknown format"
					);
					SerializationError::UnknownFormat(format.to_string())
				})
			}

			pub fn contains(&self, format: &str) -> bool {
				self.entries.contains_key(format)
			}

			/// Registered format names in registration order.
			pub fn formats(&self) -> impl Iterator<Item = &str> {
				self.entries.keys().map(String::as_str)
			}
		}

		impl std::fmt::Debug for $name {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				f.debug_struct(stringify!($name))
					.field("formats", &self.entries.keys().collect::<Vec<_>>())
					.finish()
			}
		}
	};
}

format_registry!(RendererRegistry, Renderer, "renderer");
format_registry!(ParserRegistry, Parser, "parser");

impl RendererRegistry {
	/// Renderers used by fixture serializers: JSON, YAML and dumpdata XML.
	pub fn dumpdata() -> Self {
		let registry = Self::empty().with("json", Arc::new(JsonRenderer::new()));
		#[cfg(feature = "yaml")]
		let registry = registry.with("yaml", Arc::new(YamlRenderer::new()));
		registry.with("xml", Arc::new(DumpDataXmlRenderer::new()))
	}
}

impl Default for RendererRegistry {
	/// JSON, generic XML, YAML, CSV and HTML.
	fn default() -> Self {
		let registry = Self::empty()
			.with("json", Arc::new(JsonRenderer::new()))
			.with("xml", Arc::new(XmlRenderer::new()));
		#[cfg(feature = "yaml")]
		let registry = registry.with("yaml", Arc::new(YamlRenderer::new()));
		registry
			.with("csv", Arc::new(CsvRenderer::new()))
			.with("html", Arc::new(HtmlRenderer::new()))
	}
}

impl ParserRegistry {
	/// Parsers used by fixture serializers: JSON, YAML and dumpdata XML.
	pub fn dumpdata() -> Self {
		Self::default().with("xml", Arc::new(DumpDataXmlParser::new()))
	}
}

impl Default for ParserRegistry {
	/// JSON and YAML.
	fn default() -> Self {
		let registry = Self::empty().with("json", Arc::new(JsonParser::new()));
		#[cfg(feature = "yaml")]
		let registry = registry.with("yaml", Arc::new(YamlParser::new()));
		registry
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_default_renderers() {
		let registry = RendererRegistry::default();
		assert!(registry.contains("json"));
		assert!(registry.contains("csv"));
		assert!(registry.contains("html"));
		assert!(!registry.contains(PASSTHROUGH_FORMAT));
	}

	#[rstest]
	fn test_unknown_format() {
		let result = ParserRegistry::default().get("toml");
		assert!(matches!(result, Err(SerializationError::UnknownFormat(name)) if name == "toml"));
	}

	#[rstest]
	fn test_dumpdata_uses_fixture_xml() {
		let renderer = RendererRegistry::dumpdata().get("xml").unwrap();
		let output = renderer
			.render_to_string(
				&reinhardt_primitives::Primitive::from(Vec::new()),
				&Default::default(),
			)
			.unwrap();
		assert!(output.ends_with("<django-objects version=\"1.0\"></django-objects>"));
		assert!(ParserRegistry::dumpdata().contains("xml"));
		assert!(!RendererRegistry::dumpdata().contains("csv"));
	}
}
