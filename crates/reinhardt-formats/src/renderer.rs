//! Renderer and parser contracts.

use std::io::Write;

use reinhardt_primitives::{Primitive, SerializationResult};

/// Options forwarded from a serialize call to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
	/// Pretty-print with this many spaces per level, where supported.
	pub indent: Option<usize>,
	/// Emit mapping keys in sorted order, where supported.
	pub sort_keys: bool,
}

impl RenderOptions {
	/// Creates default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the indentation width.
	pub fn with_indent(mut self, indent: usize) -> Self {
		self.indent = Some(indent);
		self
	}

	/// Sets the key-sorting toggle.
	pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
		self.sort_keys = sort_keys;
		self
	}
}

/// Turns a materialized primitive tree into bytes.
///
/// Renderers receive fully materialized trees; callers force lazy sequences
/// with [`Primitive::materialize`] first.
pub trait Renderer: Send + Sync {
	/// The media type of the produced document.
	fn media_type(&self) -> &str;

	/// Writes `data` to `out`.
	fn render(
		&self,
		data: &Primitive,
		out: &mut dyn Write,
		options: &RenderOptions,
	) -> SerializationResult<()>;

	/// Renders into an owned string.
	fn render_to_string(&self, data: &Primitive, options: &RenderOptions) -> SerializationResult<String> {
		let mut buffer = Vec::new();
		self.render(data, &mut buffer, options)?;
		String::from_utf8(buffer).map_err(|e| {
			reinhardt_primitives::SerializationError::Render(format!("output is not UTF-8: {}", e))
		})
	}
}

/// Turns bytes into a primitive tree.
pub trait Parser: Send + Sync {
	/// The media type this parser accepts.
	fn media_type(&self) -> &str;

	/// Parses a complete document.
	fn parse(&self, input: &[u8]) -> SerializationResult<Primitive>;
}

/// Serializes a tree with every mapping's keys in sorted order.
pub struct SortedKeys<'a>(pub &'a Primitive);

impl serde::Serialize for SortedKeys<'_> {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		use serde::ser::{Error as _, SerializeMap};

		match self.0 {
			Primitive::Map(map) => {
				let mut out = serializer.serialize_map(Some(map.len()))?;
				for key in map.sorted_keys() {
					if let Some(value) = map.get(key) {
						out.serialize_entry(key, &SortedKeys(value))?;
					}
				}
				out.end()
			}
			Primitive::Seq(seq) => match seq.as_slice() {
				Some(items) => serializer.collect_seq(items.iter().map(SortedKeys)),
				None => Err(S::Error::custom(
					"lazy sequence must be materialized before rendering",
				)),
			},
			scalar => scalar.serialize(serializer),
		}
	}
}
